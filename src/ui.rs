use crate::app::{App, ClickResult};
use quiz_map::braille::BrailleCanvas;
use quiz_map::map::MapLayers;
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
    Frame,
};

/// Render the UI
pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),    // Map
            Constraint::Length(1), // Status bar
        ])
        .split(frame.area());

    render_map(frame, app, chunks[0]);
    render_status_bar(frame, app, chunks[1]);
}

fn render_map(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(
            format!(" {} ", app.current_label()),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ));

    let inner = block.inner(area);
    frame.render_widget(block, area);
    frame.render_widget(
        MapWidget {
            layers: app.map_renderer.render(),
        },
        inner,
    );
}

/// Braille map layers drawn back to front
struct MapWidget {
    layers: MapLayers,
}

impl MapWidget {
    fn render_layer(canvas: &BrailleCanvas, color: Color, area: Rect, buf: &mut Buffer) {
        for (row_idx, row_str) in canvas.rows().enumerate().take(area.height as usize) {
            let y = area.y + row_idx as u16;
            for (col_idx, ch) in row_str.chars().enumerate().take(area.width as usize) {
                // Empty braille cell
                if ch == '\u{2800}' {
                    continue;
                }
                let x = area.x + col_idx as u16;
                buf[(x, y)].set_char(ch).set_fg(color);
            }
        }
    }
}

impl Widget for MapWidget {
    fn render(self, area: Rect, buf: &mut Buffer) {
        Self::render_layer(&self.layers.outlines, Color::Green, area, buf);
        Self::render_layer(&self.layers.fill, Color::White, area, buf);
        Self::render_layer(&self.layers.overlay, Color::Rgb(0xf9, 0x73, 0x16), area, buf);
    }
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let dim = Style::default().fg(Color::DarkGray);
    let emphasized = app.map_renderer.highlight().is_some_and(|h| h.is_emphasized);

    let click = match app.last_click {
        Some(ClickResult::Match(code)) => Span::styled(format!("✓ {code} "), Style::default().fg(Color::Green)),
        Some(ClickResult::Mismatch(code)) => Span::styled(format!("✗ {code} "), Style::default().fg(Color::Red)),
        Some(ClickResult::Unknown) => Span::styled("? unknown ", Style::default().fg(Color::Yellow)),
        None => Span::styled("- ", dim),
    };

    let status = Line::from(vec![
        Span::styled(" View: ", dim),
        Span::styled(app.map_renderer.mode().label(), Style::default().fg(Color::Yellow)),
        Span::styled(" | ", dim),
        Span::styled(
            if emphasized { "small " } else { "" },
            Style::default().fg(Color::Rgb(0xf9, 0x73, 0x16)),
        ),
        Span::styled("Click: ", dim),
        click,
        Span::styled(format!("| {} countries ", app.country_count()), dim),
        Span::styled("| n/p:next/prev w:world c:centered s:single q:quit", dim),
    ]);

    frame.render_widget(Paragraph::new(status), area);
}

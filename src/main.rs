mod app;
mod ui;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use app::App;
use clap::Parser;
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, MouseButton, MouseEvent,
    MouseEventKind,
};
use crossterm::execute;
use quiz_map::config::{EngineConfig, DEFAULT_REFERENCE};
use quiz_map::data::{self, FeatureSet};
use quiz_map::logging::{init_logging, DEFAULT_LOG_DIR, DEFAULT_LOG_FILE};
use quiz_map::map::{MapRenderer, ViewMode};
use ratatui::DefaultTerminal;

#[derive(Parser, Debug)]
#[command(name = "quiz-map")]
#[command(about = "Browse country boundaries with small-country highlighting", long_about = None)]
struct Args {
    /// GeoJSON file with country polygons (built-in outlines when omitted)
    #[arg(long)]
    data: Option<PathBuf>,

    /// Reference country; anything smaller gets an arrow and ellipse
    #[arg(long, default_value = DEFAULT_REFERENCE)]
    reference: String,

    /// Sample every Nth vertex for the bounding ellipse
    #[arg(long, default_value = "5")]
    sample_stride: usize,

    /// Horizontal jump, as a share of the map width, that breaks a path
    #[arg(long, default_value = "0.5")]
    wrap_ratio: f64,

    /// Map padding in braille dots
    #[arg(long, default_value = "4")]
    padding: f64,

    /// Directory for the log file
    #[arg(long, default_value = DEFAULT_LOG_DIR)]
    log_dir: PathBuf,

    /// Country to highlight first (alpha-2 or alpha-3)
    #[arg(long)]
    start: Option<String>,
}

impl Args {
    fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            reference: self.reference.clone(),
            sample_stride: self.sample_stride,
            wrap_ratio: self.wrap_ratio,
            padding: self.padding,
            ..EngineConfig::default()
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Log to a file; the terminal belongs to the UI
    let _guard = init_logging(&args.log_dir, DEFAULT_LOG_FILE)
        .with_context(|| format!("failed to initialize logging in {}", args.log_dir.display()))?;

    // Load boundaries and resolve identities up front
    let features = load(&args);
    let renderer = MapRenderer::new(features, args.engine_config());

    // Initialize terminal
    let mut terminal = ratatui::init();
    terminal.clear()?;

    // Enable mouse capture
    execute!(std::io::stdout(), EnableMouseCapture)?;

    // Run the app
    let result = run(&mut terminal, renderer, args.start.as_deref());

    // Disable mouse capture and restore terminal
    let _ = execute!(std::io::stdout(), DisableMouseCapture);
    ratatui::restore();

    if let Err(e) = &result {
        tracing::error!(error = %e, "explorer exited with an error");
    }
    result
}

/// Load the requested data set, falling back to the built-in outlines
fn load(args: &Args) -> FeatureSet {
    let Some(path) = &args.data else {
        tracing::info!("no data file given, using built-in outlines");
        return data::builtin_world();
    };
    match data::load_features(path) {
        Ok(set) => set,
        // Fall back to the built-in outlines if the file is unusable
        Err(e) => {
            tracing::warn!(error = %e, "falling back to built-in outlines");
            data::builtin_world()
        }
    }
}

/// Handle mouse events for identifying countries
fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    // Left click names the country under the cursor
    if let MouseEventKind::Down(MouseButton::Left) = mouse.kind {
        app.click(mouse.column, mouse.row);
    }
}

fn run(terminal: &mut DefaultTerminal, renderer: MapRenderer, start: Option<&str>) -> Result<()> {
    let size = terminal.size()?;
    let mut app = App::new(renderer, size.width as usize, size.height as usize, start);

    // Main loop
    loop {
        // Draw
        terminal.draw(|frame| ui::render(frame, &app))?;

        // Handle events, redrawing at ~20fps when idle
        if event::poll(Duration::from_millis(50))? {
            match event::read()? {
                // Only handle key press events (not release)
                Event::Key(key) if key.kind == KeyEventKind::Press => match key.code {
                    KeyCode::Char('q') | KeyCode::Esc => app.quit(),
                    // Cycle through countries
                    KeyCode::Char('n') | KeyCode::Right => app.next_country(),
                    KeyCode::Char('p') | KeyCode::Left => app.prev_country(),
                    // View modes
                    KeyCode::Char('w') => app.set_mode(ViewMode::World),
                    KeyCode::Char('c') => app.set_mode(ViewMode::WorldCentered),
                    KeyCode::Char('s') => app.set_mode(ViewMode::Single),
                    _ => {}
                },
                Event::Mouse(mouse) => handle_mouse(&mut app, mouse),
                // Refit to the new terminal size
                Event::Resize(width, height) => app.resize(width as usize, height as usize),
                _ => {}
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}

use quiz_map::map::{CountryCode, MapRenderer, ViewMode};

/// Outcome of clicking the map
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClickResult {
    /// Clicked the highlighted country
    Match(CountryCode),
    /// Clicked another identifiable country
    Mismatch(CountryCode),
    /// Ocean, an anonymous feature, or outside the map
    Unknown,
}

/// Application state
pub struct App {
    pub map_renderer: MapRenderer,
    /// Resolvable countries in code order
    countries: Vec<(usize, CountryCode)>,
    cursor: usize,
    pub last_click: Option<ClickResult>,
    pub should_quit: bool,
}

impl App {
    /// `width` x `height` is the full terminal size
    pub fn new(mut map_renderer: MapRenderer, width: usize, height: usize, start: Option<&str>) -> Self {
        let countries = map_renderer.countries();
        let start_code = start.and_then(|raw| map_renderer.resolver().resolve_code(raw));
        let found = start_code.and_then(|code| countries.iter().position(|&(_, c)| c == code));
        if start.is_some() && found.is_none() {
            tracing::warn!(start = ?start, "start country not loaded, using the first country");
        }
        let cursor = found.unwrap_or(0);

        let (cols, rows) = map_area(width, height);
        map_renderer.resize(cols, rows);
        map_renderer.set_highlighted(countries.get(cursor).map(|&(idx, _)| idx));
        tracing::info!(countries = countries.len(), "explorer ready");

        Self {
            map_renderer,
            countries,
            cursor,
            last_click: None,
            should_quit: false,
        }
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        let (cols, rows) = map_area(width, height);
        self.map_renderer.resize(cols, rows);
    }

    /// Highlighted country, if the data set has any
    pub fn current(&self) -> Option<(usize, CountryCode)> {
        self.countries.get(self.cursor).copied()
    }

    pub fn country_count(&self) -> usize {
        self.countries.len()
    }

    pub fn next_country(&mut self) {
        if !self.countries.is_empty() {
            self.cursor = (self.cursor + 1) % self.countries.len();
            self.select_current();
        }
    }

    pub fn prev_country(&mut self) {
        if !self.countries.is_empty() {
            self.cursor = (self.cursor + self.countries.len() - 1) % self.countries.len();
            self.select_current();
        }
    }

    fn select_current(&mut self) {
        self.last_click = None;
        self.map_renderer.set_highlighted(self.current().map(|(idx, _)| idx));
    }

    pub fn set_mode(&mut self, mode: ViewMode) {
        self.map_renderer.set_mode(mode);
    }

    /// Identify the country under a terminal cell and compare it to the highlighted one
    pub fn click(&mut self, col: u16, row: u16) -> ClickResult {
        let (px, py) = cell_to_pixel(col, row);
        let clicked = self
            .map_renderer
            .hit_test(px, py)
            .and_then(|idx| self.map_renderer.identity(idx));

        let result = match (clicked, self.current()) {
            (Some(code), Some((_, expected))) if code == expected => ClickResult::Match(code),
            (Some(code), _) => ClickResult::Mismatch(code),
            (None, _) => ClickResult::Unknown,
        };
        tracing::debug!(col, row, ?result, "map click");
        self.last_click = Some(result);
        result
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    /// Label for the status bar
    pub fn current_label(&self) -> String {
        match self.current() {
            Some((idx, code)) => match self.map_renderer.features().label(idx) {
                Some(name) => format!("{code} {name}"),
                None => code.to_string(),
            },
            None => "no countries".to_string(),
        }
    }
}

/// Map area in characters: the border takes 2 columns, the border and status bar 3 rows
fn map_area(width: usize, height: usize) -> (usize, usize) {
    (width.saturating_sub(2), height.saturating_sub(3))
}

/// Dot at the center of a terminal cell inside the bordered map area
fn cell_to_pixel(col: u16, row: u16) -> (f64, f64) {
    let px = col.saturating_sub(1) as f64 * 2.0 + 1.0;
    let py = row.saturating_sub(1) as f64 * 4.0 + 2.0;
    (px, py)
}

//! Theme configuration for the TUI.
//!
//! Supports light and dark themes with automatic terminal detection.

use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::block::BorderType;

use crate::data::{ChartId, GRID_KEY, SOLAR_KEY};

/// Color and style theme for the TUI.
///
/// Use [`Theme::auto_detect()`] for automatic theme selection based on
/// terminal background, or [`Theme::dark()`]/[`Theme::light()`] explicitly.
#[derive(Debug, Clone)]
pub struct Theme {
    /// Whether this is the dark variant.
    pub dark: bool,
    /// Accent color for highlights and active elements.
    pub highlight: Color,
    /// Color for avoided CO₂.
    pub avoided: Color,
    /// Color for emitted CO₂.
    pub emitted: Color,
    /// Color for solar energy.
    pub solar: Color,
    /// Color for grid energy.
    pub grid: Color,
    /// Color for borders and separators.
    pub border: Color,
    /// Style for panel titles and labels.
    pub header: Style,
    /// Style for current values.
    pub value: Style,
    /// Border style (rounded, plain, etc.).
    pub border_type: BorderType,
}

impl Theme {
    /// Create a dark theme suitable for dark terminal backgrounds.
    pub fn dark() -> Self {
        Self {
            dark: true,
            highlight: Color::Cyan,
            avoided: Color::Green,
            emitted: Color::Red,
            solar: Color::Yellow,
            grid: Color::Blue,
            border: Color::Gray,
            header: Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            value: Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
            border_type: BorderType::Rounded,
        }
    }

    /// Create a light theme suitable for light terminal backgrounds.
    pub fn light() -> Self {
        Self {
            dark: false,
            highlight: Color::Blue,
            avoided: Color::Green,
            emitted: Color::Red,
            solar: Color::Rgb(200, 140, 0),
            grid: Color::Blue,
            border: Color::DarkGray,
            header: Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
            value: Style::default().fg(Color::Black).add_modifier(Modifier::BOLD),
            border_type: BorderType::Rounded,
        }
    }

    /// Auto-detect based on terminal background
    pub fn auto_detect() -> Self {
        match terminal_light::luma() {
            Ok(luma) if luma > 0.5 => Self::light(),
            _ => Self::dark(),
        }
    }

    /// The other variant.
    pub fn toggled(&self) -> Self {
        if self.dark {
            Self::light()
        } else {
            Self::dark()
        }
    }

    /// Bar color of a dataset, by its position in the chart.
    pub fn dataset_color(&self, chart: ChartId, key: &str, index: usize) -> Color {
        match (chart, key) {
            (ChartId::Energy, SOLAR_KEY) => self.solar,
            (ChartId::Energy, GRID_KEY) => self.grid,
            (ChartId::Co2, _) if index == 0 => self.avoided,
            (ChartId::Co2, _) => self.emitted,
            _ => self.highlight,
        }
    }
}

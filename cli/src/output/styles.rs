//! Terminal stylesheet.
//!
//! Renderers always style through a [`Styles`] value. The plain sheet is
//! all no-op styles, so disabling color needs no branching at call sites.

use owo_colors::Style;

/// One `Style` per kind of text the renderers emit.
#[derive(Default, Clone)]
pub struct Styles {
    /// `✓` markers and running instances.
    pub success: Style,
    /// `⚠` markers and pending instances.
    pub warning: Style,
    /// `✗` markers and instances in an unknown state.
    pub error: Style,
    /// `ℹ` and `→` markers.
    pub info: Style,
    /// Keys in key/value lines, terminated instances.
    pub dim: Style,
    pub bold: Style,
    pub header: Style,
}

impl Styles {
    /// Stylesheet that leaves text untouched.
    #[must_use]
    pub fn plain() -> Self {
        Self::default()
    }

    /// Stylesheet with ANSI colors.
    #[must_use]
    pub fn colored() -> Self {
        Self {
            success: Style::new().green(),
            warning: Style::new().yellow(),
            error: Style::new().red(),
            info: Style::new().blue(),
            dim: Style::new().dimmed(),
            bold: Style::new().bold(),
            header: Style::new().bold().cyan(),
        }
    }
}

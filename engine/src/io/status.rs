//! Per-run status lines printed by a test case.

use owo_colors::{OwoColorize, Style};
use supports_color::Stream;

use crate::error::ExceptionInfo;

#[derive(Debug, Clone, Copy, Default)]
pub struct Styles {
    pub is_colorized: bool,
    pub running: Style,
    pub pass: Style,
    pub fail: Style,
    pub banner: Style,
}

impl Styles {
    /// Colorized when stdout supports color.
    pub fn detect() -> Self {
        let mut styles = Styles::default();
        if supports_color::on_cached(Stream::Stdout).is_some() {
            styles.colorize();
        }
        styles
    }

    pub fn colorize(&mut self) {
        self.is_colorized = true;
        self.running = Style::new().blue();
        self.pass = Style::new().green();
        self.fail = Style::new().red();
        self.banner = Style::new().yellow();
    }
}

/// Writes the status of one run to stdout. Silent when disabled.
#[derive(Debug, Clone, Copy)]
pub struct StatusPrinter {
    pub enabled: bool,
    pub styles: Styles,
}

impl Default for StatusPrinter {
    fn default() -> Self {
        Self {
            enabled: true,
            styles: Styles::detect(),
        }
    }
}

impl StatusPrinter {
    pub fn silent() -> Self {
        Self {
            enabled: false,
            styles: Styles::default(),
        }
    }

    pub fn running(&self, name: &str) {
        self.emit(running_line(&self.styles, name));
    }

    pub fn exception(&self, exception: &ExceptionInfo) {
        self.emit(format!("{}\n", exception.render().style(self.styles.fail)));
    }

    pub fn passed(&self) {
        self.emit("Success".style(self.styles.pass).to_string());
    }

    /// Failure marker followed by the diff, when there is one.
    pub fn failed(&self, diff: Option<&str>) {
        self.emit("Failed".style(self.styles.fail).to_string());
        if let Some(diff) = diff {
            self.emit(diff.to_string());
        }
    }

    fn emit(&self, line: String) {
        if self.enabled {
            println!("{line}");
        }
    }
}

pub fn running_line(styles: &Styles, name: &str) -> String {
    format!("\tRunning test: {name} ...")
        .style(styles.running)
        .to_string()
}

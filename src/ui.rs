//! Terminal output: status labels, doctor findings and profile tables.
//!
//! Color is off with `--no-color` or `--color never`. With `--color auto`
//! anstream decides from the stream, honouring `NO_COLOR`, `CLICOLOR` and
//! `TERM=dumb`, and turning color off when stdout is not a terminal.

use anstream::println;
use anstyle::{AnsiColor, Color, Style};
use clap::ValueEnum;
use comfy_table::{Attribute, Cell, ContentArrangement, Table, presets};

use crate::mask::masked_profile;
use crate::profile::Profile;

/// When to color output
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    Always,
    #[default]
    Auto,
    Never,
}

/// What a message or a doctor finding reports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    Warn,
    Fail,
    Info,
}

impl Status {
    fn label(self) -> &'static str {
        match self {
            Status::Ok => "OK",
            Status::Warn => "WARN",
            Status::Fail => "ERROR",
            Status::Info => "INFO",
        }
    }

    fn ansi(self) -> AnsiColor {
        match self {
            Status::Ok => AnsiColor::Green,
            Status::Warn => AnsiColor::Yellow,
            Status::Fail => AnsiColor::Red,
            Status::Info => AnsiColor::Cyan,
        }
    }

    // comfy-table measures cell width itself, so table cells take its own colors.
    fn cell_color(self) -> comfy_table::Color {
        match self {
            Status::Ok => comfy_table::Color::Green,
            Status::Warn => comfy_table::Color::Yellow,
            Status::Fail => comfy_table::Color::Red,
            Status::Info => comfy_table::Color::Cyan,
        }
    }

    fn icon(self, color: bool) -> &'static str {
        match (self, color) {
            (Status::Ok, true) => "✓",
            (Status::Ok, false) => "[OK]",
            (Status::Warn, true) => "⚠",
            (Status::Warn, false) => "[!]",
            (Status::Fail, true) => "✗",
            (Status::Fail, false) => "[X]",
            (Status::Info, true) => "•",
            (Status::Info, false) => "-",
        }
    }
}

/// Resolved output settings shared by every command
#[derive(Debug, Clone)]
pub struct Ui {
    color: bool,
}

impl Default for Ui {
    fn default() -> Self {
        Self::new(ColorMode::Auto, false)
    }
}

impl Ui {
    pub fn new(mode: ColorMode, no_color: bool) -> Self {
        let color = !no_color
            && match mode {
                ColorMode::Always => true,
                ColorMode::Never => false,
                ColorMode::Auto => {
                    anstream::AutoStream::choice(&std::io::stdout()) != anstream::ColorChoice::Never
                }
            };

        let choice = if color {
            anstream::ColorChoice::Always
        } else {
            anstream::ColorChoice::Never
        };
        choice.write_global();

        Self { color }
    }

    pub fn color_enabled(&self) -> bool {
        self.color
    }

    fn style(&self, style: Style) -> Style {
        if self.color { style } else { Style::new() }
    }

    /// Print `msg` after a colored status label
    pub fn say(&self, status: Status, msg: impl AsRef<str>) {
        let label = self.style(Style::new().fg_color(Some(Color::Ansi(status.ansi()))).bold());
        println!("{label}{}{label:#} {}", status.label(), msg.as_ref());
    }

    pub fn ok(&self, msg: impl AsRef<str>) {
        self.say(Status::Ok, msg);
    }

    pub fn warn(&self, msg: impl AsRef<str>) {
        self.say(Status::Warn, msg);
    }

    pub fn info(&self, msg: impl AsRef<str>) {
        self.say(Status::Info, msg);
    }

    /// Print one indented doctor finding
    pub fn finding(&self, status: Status, msg: impl AsRef<str>) {
        println!("  {} {}", status.icon(self.color), msg.as_ref());
    }

    pub fn icon(&self, status: Status) -> &'static str {
        status.icon(self.color)
    }

    pub fn bold(&self, s: impl AsRef<str>) -> String {
        let style = self.style(Style::new().bold());
        format!("{style}{}{style:#}", s.as_ref())
    }

    /// `s` in the color of `status`
    pub fn paint(&self, status: Status, s: impl AsRef<str>) -> String {
        let style = self.style(Style::new().fg_color(Some(Color::Ansi(status.ansi()))));
        format!("{style}{}{style:#}", s.as_ref())
    }

    pub fn println(&self, msg: impl AsRef<str>) {
        println!("{}", msg.as_ref());
    }

    pub fn newline(&self) {
        println!();
    }

    pub fn section(&self, title: impl AsRef<str>) {
        println!("{}", self.bold(title));
    }

    pub fn cell(&self, content: impl Into<String>) -> Cell {
        Cell::new(content.into())
    }

    pub fn header_cell(&self, content: impl Into<String>) -> Cell {
        let cell = Cell::new(content.into());
        if self.color { cell.add_attribute(Attribute::Bold) } else { cell }
    }

    /// Cell in the color of `status`
    pub fn highlight(&self, content: impl Into<String>, status: Status) -> Cell {
        let cell = Cell::new(content.into());
        if self.color { cell.fg(status.cell_color()) } else { cell }
    }

    fn table(&self, preset: &str) -> Table {
        let mut table = Table::new();
        table.set_content_arrangement(ContentArrangement::Dynamic);
        table.load_preset(preset);
        table
    }

    /// One row per profile, keys masked, the active profile marked
    pub fn profile_table<'a>(&self, profiles: impl IntoIterator<Item = &'a Profile>) -> Table {
        let preset = if self.color {
            presets::UTF8_FULL_CONDENSED
        } else {
            presets::ASCII_MARKDOWN
        };
        let mut table = self.table(preset);
        table.set_header(
            ["", "Profile", "Project", "Region", "Zone", "Base URL", "Timeout", "Retries", "Public Key", "Private Key"]
                .map(|title| self.header_cell(title)),
        );

        for profile in profiles.into_iter().map(masked_profile) {
            let (marker, name) = if profile.active {
                (self.icon(Status::Ok), self.highlight(&profile.name, Status::Ok))
            } else {
                (" ", self.cell(&profile.name))
            };
            table.add_row(vec![
                self.cell(marker),
                name,
                self.cell(profile.project_id),
                self.cell(profile.region),
                self.cell(profile.zone),
                self.cell(profile.base_url),
                self.cell(format!("{}s", profile.timeout_sec)),
                self.cell(profile.max_retry_times.to_string()),
                self.cell(profile.public_key),
                self.cell(profile.private_key),
            ]);
        }
        table
    }

    /// Borderless two-column `label: value` table
    pub fn details(&self, rows: Vec<(&str, Cell)>) -> Table {
        let mut table = self.table(presets::NOTHING);
        for (label, value) in rows {
            table.add_row(vec![self.cell(format!("{label}:")), value]);
        }
        table
    }
}

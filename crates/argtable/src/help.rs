//! Help rendering.
//!
//! Help text is presentational only; rendering never touches parse state.

use colored::{Color, Colorize};

use crate::arg::{ArgKind, ArgSpec};
use crate::parser::ArgParser;

/// Which optional sections to include in help output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HelpOptions {
    pub description: bool,
    pub usage: bool,
    pub epilog: bool,
    /// Accepted for compatibility; arguments are always listed in
    /// declaration order.
    pub group_by_kind: bool,
}

impl HelpOptions {
    /// Every section, no grouping.
    pub fn all() -> Self {
        Self {
            description: true,
            usage: true,
            epilog: true,
            group_by_kind: false,
        }
    }
}

/// Colours used for each part of a help line. `None` leaves a part unstyled.
///
/// Escapes go through `colored`, so `NO_COLOR`, `CLICOLOR` and
/// `CLICOLOR_FORCE` are honoured.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Theme {
    pub symbol: Option<Color>,
    pub name: Option<Color>,
    pub required: Option<Color>,
    pub default: Option<Color>,
    pub colon: Option<Color>,
    pub help: Option<Color>,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            symbol: Some(Color::Green),
            name: None,
            required: Some(Color::Yellow),
            default: Some(Color::Yellow),
            colon: Some(Color::Blue),
            help: None,
        }
    }
}

impl Theme {
    /// A theme that never emits escape sequences.
    pub fn plain() -> Self {
        Self {
            symbol: None,
            name: None,
            required: None,
            default: None,
            colon: None,
            help: None,
        }
    }

    fn paint(&self, text: &str, color: Option<Color>) -> String {
        match color {
            Some(c) => text.color(c).to_string(),
            None => text.to_string(),
        }
    }
}

impl ArgParser {
    /// Render help text.
    pub fn render_help(&self, options: &HelpOptions, theme: &Theme) -> String {
        let mut out = String::new();
        if !self.program().trim().is_empty() {
            out.push_str(self.program().trim());
            out.push('\n');
        }

        if options.usage && !self.usage().trim().is_empty() {
            out.push_str(&format!("\n{}\n", self.usage().trim()));
        }

        if options.description && !self.description().trim().is_empty() {
            out.push('\n');
            out.push_str(self.description().trim_end());
            out.push('\n');
        }

        if !self.specs().is_empty() {
            let width = self
                .specs()
                .iter()
                .map(|s| s.name().chars().count())
                .max()
                .unwrap_or(0);
            out.push_str("\nArguments:\n");
            for spec in self.specs() {
                let line = match spec.kind() {
                    ArgKind::Flag => flag_line(spec, theme, width),
                    ArgKind::KeyValue => key_value_line(spec, theme, width),
                    ArgKind::Positional => positional_line(spec, width),
                };
                out.push_str("  ");
                out.push_str(line.trim_end());
                out.push('\n');
            }
        }

        if options.epilog && !self.epilog().trim().is_empty() {
            out.push('\n');
            out.push_str(self.epilog().trim_end());
            out.push('\n');
        }

        out
    }

    /// Print help to stdout with the default theme.
    pub fn print_help(
        &self,
        show_description: bool,
        show_usage: bool,
        show_epilog: bool,
        group_by_kind: bool,
    ) {
        let options = HelpOptions {
            description: show_description,
            usage: show_usage,
            epilog: show_epilog,
            group_by_kind,
        };
        print!("{}", self.render_help(&options, &Theme::default()));
    }
}

fn symbol_column(spec: &ArgSpec) -> String {
    spec.short()
        .map(|c| format!("-{c}"))
        .unwrap_or_else(|| "  ".to_string())
}

fn name_column(spec: &ArgSpec, width: usize) -> String {
    format!("--{:width$}", spec.name(), width = width)
}

// -v --verbose : Verbose output
fn flag_line(spec: &ArgSpec, theme: &Theme, width: usize) -> String {
    format!(
        "{} {} {} {}",
        theme.paint(&symbol_column(spec), theme.symbol),
        theme.paint(&name_column(spec, width), theme.name),
        theme.paint(":", theme.colon),
        theme.paint(spec.help().unwrap_or(""), theme.help),
    )
}

// -o --output : Output file [required: false, default: out.txt]
fn key_value_line(spec: &ArgSpec, theme: &Theme, width: usize) -> String {
    let mut details = format!(
        "{} {}",
        theme.paint("required:", theme.required),
        spec.required()
    );
    if let Some(default) = spec.default_value() {
        details.push_str(&format!(
            ", {} {}",
            theme.paint("default:", theme.default),
            default
        ));
    }

    let help = spec.help().map(|h| format!("{h} ")).unwrap_or_default();
    format!(
        "{} {} {} {}[{}]",
        theme.paint(&symbol_column(spec), theme.symbol),
        theme.paint(&name_column(spec, width), theme.name),
        theme.paint(":", theme.colon),
        theme.paint(&help, theme.help),
        details,
    )
}

// -i --input (required: true, [None]) = Input file
fn positional_line(spec: &ArgSpec, width: usize) -> String {
    format!(
        "{} {} (required: {}, [{}]) = {}",
        symbol_column(spec),
        name_column(spec, width),
        spec.required(),
        spec.default_value().unwrap_or("None"),
        spec.help().unwrap_or("No description"),
    )
}

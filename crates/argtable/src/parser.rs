use std::ffi::OsString;
use std::io::{self, Write};

use crate::arg::{ArgKind, ArgSpec};
use crate::error::{ParseError, ParseResult};

const HELP_NAME: &str = "help";
const HELP_SHORT: char = 'h';
const HELP_TEXT: &str = "Shows this help menu";
const FLAG_SET: &str = "true";

/// An ordered table of argument declarations.
///
/// Declaration order decides which argument wins when short symbols or names
/// collide (the first one declared), and the order of help output.
#[derive(Debug, Clone, Default)]
pub struct ArgParser {
    program: String,
    usage: String,
    description: String,
    epilog: String,
    args: Vec<ArgSpec>,
}

impl ArgParser {
    /// Create a parser. With `auto_help`, a `-h/--help` flag is declared
    /// immediately, so callers must not declare `help` or `h` themselves.
    pub fn new(
        program: impl Into<String>,
        usage: impl Into<String>,
        description: impl Into<String>,
        epilog: impl Into<String>,
        auto_help: bool,
    ) -> Self {
        let mut parser = Self {
            program: program.into(),
            usage: usage.into(),
            description: description.into(),
            epilog: epilog.into(),
            args: Vec::new(),
        };
        if auto_help {
            parser.declare_flag(HELP_SHORT, HELP_NAME, HELP_TEXT);
        }
        parser
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn usage(&self) -> &str {
        &self.usage
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn epilog(&self) -> &str {
        &self.epilog
    }

    /// All declarations, in declaration order.
    pub fn specs(&self) -> &[ArgSpec] {
        &self.args
    }

    /// The first declaration named `name`.
    pub fn spec(&self, name: &str) -> Option<&ArgSpec> {
        self.args.iter().find(|a| a.name() == name)
    }

    /// Declare a boolean switch. Flags are never required.
    pub fn declare_flag(
        &mut self,
        short: impl Into<Option<char>>,
        name: impl Into<String>,
        help: impl Into<String>,
    ) -> &mut Self {
        self.push(ArgSpec::new(
            ArgKind::Flag,
            short.into(),
            name.into(),
            false,
            0,
            None,
            help.into(),
        ))
    }

    /// Declare a named option whose value is attached with `=`.
    pub fn declare_key_value(
        &mut self,
        short: impl Into<Option<char>>,
        name: impl Into<String>,
        required: bool,
        default_value: Option<&str>,
        help: impl Into<String>,
    ) -> &mut Self {
        self.push(ArgSpec::new(
            ArgKind::KeyValue,
            short.into(),
            name.into(),
            required,
            1,
            default_value.map(str::to_string),
            help.into(),
        ))
    }

    /// Declare a positional argument, matched by its name appearing bare.
    pub fn declare_positional(
        &mut self,
        short: impl Into<Option<char>>,
        name: impl Into<String>,
        required: bool,
        arity: usize,
        default_value: Option<&str>,
        help: impl Into<String>,
    ) -> &mut Self {
        self.push(ArgSpec::new(
            ArgKind::Positional,
            short.into(),
            name.into(),
            required,
            arity,
            default_value.map(str::to_string),
            help.into(),
        ))
    }

    fn push(&mut self, spec: ArgSpec) -> &mut Self {
        tracing::trace!(name = spec.name(), kind = %spec.kind(), "declared argument");
        self.args.push(spec);
        self
    }

    /// Parse `tokens` (argv without the program name), echoing bare tokens
    /// to stdout.
    pub fn parse<I, S>(&mut self, tokens: I) -> ParseResult<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        self.parse_with_echo(tokens, &mut out)
    }

    /// Parse `tokens`, echoing bare tokens to `echo`.
    ///
    /// Token shapes:
    /// - `--name[=value]` matches by name
    /// - `-xyz[=value]` matches every symbol of the cluster; each key-value
    ///   symbol in the cluster receives the same trailing value
    /// - `name[=value]` matches by name; the `name` part is echoed
    ///
    /// Tokens that match nothing are ignored. Once all tokens are scanned,
    /// the first required argument without a value fails the parse; every
    /// other unresolved argument takes its default.
    pub fn parse_with_echo<I, S, W>(&mut self, tokens: I, echo: &mut W) -> ParseResult<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
        W: Write + ?Sized,
    {
        self.reset();

        let mut scanned = 0usize;
        for token in tokens {
            let token = token.as_ref();
            scanned += 1;

            if let Some(long) = token.strip_prefix("--") {
                let (name, value) = split_value(long);
                self.assign_by_name(name, value);
            } else if let Some(cluster) = token.strip_prefix('-') {
                let (symbols, value) = split_value(cluster);
                self.assign_by_symbols(symbols, value);
            } else {
                let (name, value) = split_value(token);
                echo.write_all(name.as_bytes())?;
                self.assign_by_name(name, value);
            }
        }
        echo.flush()?;

        tracing::debug!(program = %self.program, tokens = scanned, "argument scan finished");
        self.finish()
    }

    /// Parse `tokens`; on failure print the error to stderr and exit with
    /// status 1.
    pub fn parse_or_exit<I, S>(&mut self, tokens: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if let Err(err) = self.parse(tokens) {
            eprintln!("{err}");
            std::process::exit(1);
        }
    }

    /// [`ArgParser::parse_or_exit`] over the process arguments.
    ///
    /// Arguments that are not valid UTF-8 are converted lossily.
    pub fn parse_env(&mut self) {
        self.parse_or_exit(lossy_tokens(std::env::args_os().skip(1)));
    }

    /// Forget every value assigned by a previous parse.
    pub fn reset(&mut self) {
        self.args.iter_mut().for_each(ArgSpec::reset);
    }

    fn assign_by_name(&mut self, name: &str, value: Option<&str>) {
        let Some(spec) = self.args.iter_mut().find(|a| a.name() == name) else {
            tracing::trace!(name, "no argument matched");
            return;
        };
        match spec.kind() {
            ArgKind::Flag => spec.assign(Some(FLAG_SET.to_string())),
            ArgKind::KeyValue | ArgKind::Positional => spec.assign(value.map(str::to_string)),
        }
        tracing::trace!(name, "matched by name");
    }

    fn assign_by_symbols(&mut self, symbols: &str, value: Option<&str>) {
        for symbol in symbols.chars() {
            let Some(spec) = self
                .args
                .iter_mut()
                .find(|a| a.short() == Some(symbol) && a.kind() != ArgKind::Positional)
            else {
                tracing::trace!(%symbol, "no argument matched");
                continue;
            };
            match spec.kind() {
                ArgKind::Flag => spec.assign(Some(FLAG_SET.to_string())),
                _ => spec.assign(value.map(str::to_string)),
            }
            tracing::trace!(%symbol, name = spec.name(), "matched by symbol");
        }
    }

    fn finish(&mut self) -> ParseResult<()> {
        for spec in &mut self.args {
            if spec.value().is_some() {
                continue;
            }
            if spec.required() {
                return Err(ParseError::MissingRequired {
                    name: spec.name().to_string(),
                });
            }
            if spec.default_value().is_some() {
                tracing::debug!(name = spec.name(), "applying default value");
                spec.apply_default();
            }
        }
        Ok(())
    }

    /// Value of a positional argument (resolved, else default).
    pub fn positional(&self, name: &str) -> Option<&str> {
        self.value_of(name, ArgKind::Positional)
    }

    /// Value of a key-value argument (resolved, else default).
    pub fn key_value(&self, name: &str) -> Option<&str> {
        self.value_of(name, ArgKind::KeyValue)
    }

    /// Whether a flag was set. Unknown names and non-flags are `false`.
    pub fn flag(&self, name: &str) -> bool {
        self.spec(name)
            .is_some_and(|s| s.kind() == ArgKind::Flag && s.value().is_some())
    }

    /// Whether a token matched `name` during the last parse.
    pub fn is_explicit(&self, name: &str) -> bool {
        self.spec(name).is_some_and(ArgSpec::is_explicit)
    }

    fn value_of(&self, name: &str, kind: ArgKind) -> Option<&str> {
        let spec = self.spec(name)?;
        if spec.kind() != kind {
            return None;
        }
        spec.value().or(spec.default_value())
    }
}

fn lossy_tokens<I>(args: I) -> Vec<String>
where
    I: IntoIterator<Item = OsString>,
{
    args.into_iter()
        .map(|arg| arg.to_string_lossy().into_owned())
        .collect()
}

fn split_value(raw: &str) -> (&str, Option<&str>) {
    match raw.split_once('=') {
        Some((name, value)) => (name, Some(value)),
        None => (raw, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(parser: &mut ArgParser, tokens: &[&str]) -> (ParseResult<()>, String) {
        let mut echo = Vec::new();
        let result = parser.parse_with_echo(tokens, &mut echo);
        (result, String::from_utf8(echo).unwrap())
    }

    fn sample() -> ArgParser {
        let mut p = ArgParser::new("prog", "Usage: prog [options]", "desc", "bye", false);
        p.declare_flag('v', "verbose", "Verbose output")
            .declare_key_value('o', "output", false, Some("out.txt"), "Output file")
            .declare_key_value('l', "level", false, None, "Log level")
            .declare_positional('i', "input", false, 1, Some("in.txt"), "Input file");
        p
    }

    #[test]
    fn untouched_flags_are_false() {
        let mut p = sample();
        let (result, _) = parse(&mut p, &[]);
        result.unwrap();
        assert!(!p.flag("verbose"));
        assert!(!p.is_explicit("verbose"));
    }

    #[test]
    fn flags_set_by_long_and_short_forms_ignore_values() {
        let mut p = sample();
        parse(&mut p, &["--verbose=no"]).0.unwrap();
        assert!(p.flag("verbose"));
        assert_eq!(p.spec("verbose").and_then(|s| s.value()), Some("true"));

        let mut p = sample();
        parse(&mut p, &["-v=0"]).0.unwrap();
        assert!(p.flag("verbose"));
    }

    #[test]
    fn key_value_round_trip_and_default() {
        let mut p = sample();
        parse(&mut p, &["--output=result.txt"]).0.unwrap();
        assert_eq!(p.key_value("output"), Some("result.txt"));
        assert_eq!(p.key_value("level"), None);

        let mut p = sample();
        parse(&mut p, &[]).0.unwrap();
        assert_eq!(p.key_value("output"), Some("out.txt"));
        assert!(!p.is_explicit("output"));
    }

    #[test]
    fn value_may_contain_equals() {
        let mut p = sample();
        parse(&mut p, &["--level=a=b"]).0.unwrap();
        assert_eq!(p.key_value("level"), Some("a=b"));
    }

    #[test]
    fn bare_long_key_value_is_explicit_without_value() {
        let mut p = sample();
        parse(&mut p, &["--level"]).0.unwrap();
        assert!(p.is_explicit("level"));
        assert_eq!(p.key_value("level"), None);

        // The default still fills in once the scan is over.
        let mut p = sample();
        parse(&mut p, &["--output"]).0.unwrap();
        assert!(p.is_explicit("output"));
        assert_eq!(p.key_value("output"), Some("out.txt"));
    }

    #[test]
    fn last_token_wins() {
        let mut p = sample();
        parse(&mut p, &["--output=a", "-o=b"]).0.unwrap();
        assert_eq!(p.key_value("output"), Some("b"));
    }

    #[test]
    fn cluster_applies_value_to_every_key_value_symbol() {
        let mut p = ArgParser::new("p", "", "", "", false);
        p.declare_key_value('a', "alpha", false, None, "")
            .declare_key_value('b', "beta", false, None, "")
            .declare_flag('c', "gamma", "");
        parse(&mut p, &["-abc=X"]).0.unwrap();
        assert_eq!(p.key_value("alpha"), Some("X"));
        assert_eq!(p.key_value("beta"), Some("X"));
        assert!(p.flag("gamma"));
    }

    #[test]
    fn short_symbols_skip_positionals_and_first_declared_wins() {
        let mut p = ArgParser::new("p", "", "", "", false);
        p.declare_positional('x', "pos", false, 1, None, "")
            .declare_key_value('x', "first", false, None, "")
            .declare_key_value('x', "second", false, None, "");
        parse(&mut p, &["-x=1"]).0.unwrap();
        assert_eq!(p.positional("pos"), None);
        assert_eq!(p.key_value("first"), Some("1"));
        assert_eq!(p.key_value("second"), None);
    }

    #[test]
    fn bare_tokens_match_by_name_and_are_echoed() {
        let mut p = sample();
        let (result, echo) = parse(&mut p, &["input=data.csv", "stray", "verbose"]);
        result.unwrap();
        assert_eq!(p.positional("input"), Some("data.csv"));
        assert!(p.flag("verbose"));
        assert_eq!(echo, "inputstrayverbose");
    }

    #[test]
    fn lone_dash_matches_nothing_and_double_dash_matches_empty_name() {
        let mut p = ArgParser::new("p", "", "", "", false);
        p.declare_flag(None, "", "").declare_flag('v', "verbose", "");
        let (result, echo) = parse(&mut p, &["-"]);
        result.unwrap();
        assert_eq!(echo, "");
        assert!(!p.flag(""));
        assert!(!p.flag("verbose"));

        let (result, echo) = parse(&mut p, &["-", "--"]);
        result.unwrap();
        assert_eq!(echo, "");
        assert!(p.flag(""));
        assert!(!p.flag("verbose"));
    }

    #[cfg(unix)]
    #[test]
    fn non_utf8_arguments_are_converted_lossily() {
        use std::os::unix::ffi::OsStringExt;

        let args = vec![
            OsString::from_vec(vec![0xff]),
            OsString::from("--output=ok"),
        ];
        let tokens = lossy_tokens(args);
        assert_eq!(tokens, vec!["\u{fffd}".to_string(), "--output=ok".to_string()]);

        let mut p = sample();
        let (result, echo) = parse(&mut p, &tokens.iter().map(String::as_str).collect::<Vec<_>>());
        result.unwrap();
        assert_eq!(echo, "\u{fffd}");
        assert_eq!(p.key_value("output"), Some("ok"));
    }

    #[test]
    fn prefixed_tokens_are_not_echoed() {
        let mut p = sample();
        let (result, echo) = parse(&mut p, &["--input=x", "-v", "--unknown", "-z"]);
        result.unwrap();
        assert_eq!(echo, "");
        assert_eq!(p.positional("input"), Some("x"));
    }

    #[test]
    fn missing_required_reports_first_in_declaration_order() {
        let mut p = ArgParser::new("p", "", "", "", false);
        p.declare_key_value('n', "name", true, None, "")
            .declare_positional(None, "file", true, 1, None, "");
        let (result, _) = parse(&mut p, &[]);
        let err = result.unwrap_err();
        assert_eq!(err.missing_argument(), Some("name"));
        assert_eq!(err.to_string(), "Missing required argument: name");
    }

    #[test]
    fn required_key_value_without_value_is_missing() {
        let mut p = ArgParser::new("p", "", "", "", false);
        p.declare_key_value('n', "name", true, Some("ignored"), "");
        let (result, _) = parse(&mut p, &["--name"]);
        assert_eq!(result.unwrap_err().missing_argument(), Some("name"));
    }

    #[test]
    fn getters_check_kind() {
        let mut p = ArgParser::new("p", "", "", "", false);
        p.declare_key_value(None, "mode", false, Some("fast"), "")
            .declare_flag(None, "mode", "");
        parse(&mut p, &["--mode"]).0.unwrap();
        assert!(!p.flag("mode"));
        assert_eq!(p.key_value("mode"), Some("fast"));
        assert_eq!(p.positional("mode"), None);
        assert_eq!(p.key_value("nope"), None);
        assert!(!p.flag("nope"));
    }

    #[test]
    fn getters_are_idempotent() {
        let mut p = sample();
        parse(&mut p, &["-o=x"]).0.unwrap();
        assert_eq!(p.key_value("output"), p.key_value("output"));
        assert_eq!(p.flag("verbose"), p.flag("verbose"));
    }

    #[test]
    fn auto_help_declares_h_flag() {
        let mut p = ArgParser::new("p", "u", "d", "e", true);
        assert_eq!(p.specs().len(), 1);
        parse(&mut p, &["-h"]).0.unwrap();
        assert!(p.flag("help"));
    }

    #[test]
    fn reparse_starts_from_a_clean_table() {
        let mut p = sample();
        parse(&mut p, &["-v", "--level=debug"]).0.unwrap();
        assert!(p.flag("verbose"));
        parse(&mut p, &[]).0.unwrap();
        assert!(!p.flag("verbose"));
        assert_eq!(p.key_value("level"), None);
    }

    #[test]
    fn multi_arity_positional_resolves_first_slot() {
        let mut p = ArgParser::new("p", "", "", "", false);
        p.declare_positional(None, "files", false, 3, Some("a.txt"), "");
        parse(&mut p, &[]).0.unwrap();
        assert_eq!(p.positional("files"), Some("a.txt"));
        assert_eq!(p.spec("files").map(|s| s.raw_value().slots()), Some(3));
    }
}

use anyhow::{Context, Result, bail};
use argtable::ArgParser;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_SCHEMA_NAME: &str = "argtable.json";

/// An argument table declared as JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_version: Option<u32>,

    #[serde(default)]
    pub program: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub usage: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub epilog: String,

    /// Declare `-h/--help` before any other argument.
    #[serde(default = "default_true")]
    pub auto_help: bool,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<ArgDecl>,
}

impl Default for Schema {
    fn default() -> Self {
        Self {
            schema_version: None,
            program: String::new(),
            usage: String::new(),
            description: String::new(),
            epilog: String::new(),
            auto_help: true,
            args: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ArgKindDecl {
    Flag,
    KeyValue,
    Positional,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArgDecl {
    pub kind: ArgKindDecl,

    pub name: String,

    /// Single-character alias, e.g. `"v"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short: Option<char>,

    #[serde(default)]
    pub required: bool,

    /// Expected value count (positionals only).
    #[serde(default = "default_arity")]
    pub arity: usize,

    #[serde(
        default,
        rename = "default",
        alias = "defaultValue",
        skip_serializing_if = "Option::is_none"
    )]
    pub default_value: Option<String>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub help: String,
}

fn default_true() -> bool {
    true
}

fn default_arity() -> usize {
    1
}

impl Schema {
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            bail!("schema not found: {}", path.display());
        }
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read schema: {}", path.display()))?;
        let schema: Schema = serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse schema JSON: {}", path.display()))?;
        tracing::debug!(path = %path.display(), args = schema.args.len(), "loaded schema");
        Ok(schema)
    }

    /// Declare every argument on a fresh parser, in file order.
    pub fn build_parser(&self) -> ArgParser {
        let mut parser = ArgParser::new(
            &self.program,
            &self.usage,
            &self.description,
            &self.epilog,
            self.auto_help,
        );
        for arg in &self.args {
            match arg.kind {
                ArgKindDecl::Flag => {
                    if arg.required || arg.default_value.is_some() {
                        tracing::warn!(
                            name = %arg.name,
                            "flags cannot be required or defaulted; ignoring"
                        );
                    }
                    parser.declare_flag(arg.short, &arg.name, &arg.help);
                }
                ArgKindDecl::KeyValue => {
                    parser.declare_key_value(
                        arg.short,
                        &arg.name,
                        arg.required,
                        arg.default_value.as_deref(),
                        &arg.help,
                    );
                }
                ArgKindDecl::Positional => {
                    parser.declare_positional(
                        arg.short,
                        &arg.name,
                        arg.required,
                        arg.arity,
                        arg.default_value.as_deref(),
                        &arg.help,
                    );
                }
            }
        }
        parser
    }
}

/// Write a starter schema into `dir`.
pub fn write_default_schema(dir: &Path, program: Option<&str>, overwrite: bool) -> Result<PathBuf> {
    let dest = dir.join(DEFAULT_SCHEMA_NAME);
    if dest.exists() && !overwrite {
        bail!("{} already exists in {}", DEFAULT_SCHEMA_NAME, dir.display());
    }

    let program = program
        .map(|s| s.to_string())
        .or_else(|| guess_program_name(dir))
        .unwrap_or_else(|| "my-program".to_string());

    let schema = Schema {
        schema_version: Some(1),
        usage: format!("Usage: {program} [options] input=<FILE>"),
        description: format!("{program} does one thing well."),
        args: vec![
            ArgDecl {
                kind: ArgKindDecl::Flag,
                name: "verbose".to_string(),
                short: Some('v'),
                required: false,
                arity: 1,
                default_value: None,
                help: "Enable verbose output".to_string(),
            },
            ArgDecl {
                kind: ArgKindDecl::KeyValue,
                name: "output".to_string(),
                short: Some('o'),
                required: false,
                arity: 1,
                default_value: Some("out.txt".to_string()),
                help: "Output file".to_string(),
            },
            ArgDecl {
                kind: ArgKindDecl::Positional,
                name: "input".to_string(),
                short: None,
                required: true,
                arity: 1,
                default_value: None,
                help: "Input file".to_string(),
            },
        ],
        program,
        ..Default::default()
    };

    fs::create_dir_all(dir)
        .with_context(|| format!("failed to create directory: {}", dir.display()))?;

    let mut out = serde_json::to_string_pretty(&schema).context("failed to serialize schema")?;
    out.push('\n');

    let tmp = dest.with_extension("tmp");
    fs::write(&tmp, out.as_bytes())
        .with_context(|| format!("failed to write {}", tmp.display()))?;
    if overwrite && dest.exists() {
        fs::remove_file(&dest).with_context(|| format!("failed to remove {}", dest.display()))?;
    }
    fs::rename(&tmp, &dest)
        .with_context(|| format!("failed to move {} into place", dest.display()))?;
    Ok(dest)
}

fn guess_program_name(dir: &Path) -> Option<String> {
    let direct = dir
        .file_name()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty() && *s != "." && *s != "..");
    if let Some(name) = direct {
        return Some(name.to_string());
    }

    let cwd = std::env::current_dir().ok()?;
    cwd.file_name()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty() && *s != "." && *s != "..")
        .map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use argtable::ArgKind;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn make_temp_dir(prefix: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        let pid = std::process::id();
        let dir = std::env::temp_dir().join(format!("argtable-{prefix}-{pid}-{nanos}"));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn schema_deserializes_camel_case() {
        let json = r#"{
  "program": "greet",
  "usage": "greet [options]",
  "autoHelp": false,
  "args": [
    { "kind": "flag", "short": "v", "name": "verbose", "help": "Chatty output" },
    { "kind": "keyValue", "short": "o", "name": "output", "default": "out.txt" },
    { "kind": "positional", "name": "name", "required": true, "arity": 2 }
  ]
}"#;
        let schema: Schema = serde_json::from_str(json).unwrap();
        assert_eq!(schema.program, "greet");
        assert!(!schema.auto_help);
        assert_eq!(schema.args.len(), 3);
        assert_eq!(schema.args[0].kind, ArgKindDecl::Flag);
        assert_eq!(schema.args[0].short, Some('v'));
        assert_eq!(schema.args[1].default_value.as_deref(), Some("out.txt"));
        assert_eq!(schema.args[1].arity, 1);
        assert!(schema.args[2].required);
        assert_eq!(schema.args[2].arity, 2);
    }

    #[test]
    fn auto_help_defaults_on() {
        let schema: Schema = serde_json::from_str(r#"{ "program": "p" }"#).unwrap();
        assert!(schema.auto_help);
        let parser = schema.build_parser();
        assert_eq!(parser.specs().len(), 1);
        assert_eq!(parser.specs()[0].name(), "help");
    }

    #[test]
    fn build_parser_keeps_file_order() {
        let json = r#"{
  "program": "p",
  "autoHelp": false,
  "args": [
    { "kind": "positional", "name": "input" },
    { "kind": "keyValue", "name": "level", "defaultValue": "info" },
    { "kind": "flag", "name": "quiet", "short": "q" }
  ]
}"#;
        let schema: Schema = serde_json::from_str(json).unwrap();
        let parser = schema.build_parser();
        let kinds: Vec<ArgKind> = parser.specs().iter().map(|s| s.kind()).collect();
        assert_eq!(
            kinds,
            vec![ArgKind::Positional, ArgKind::KeyValue, ArgKind::Flag]
        );
        assert_eq!(parser.key_value("level"), Some("info"));
    }

    #[test]
    fn write_default_schema_round_trips() {
        let dir = make_temp_dir("schema-defaults");
        let dest = write_default_schema(&dir, Some("demo"), false).unwrap();
        let schema = Schema::from_file(&dest).unwrap();
        assert_eq!(schema.schema_version, Some(1));
        assert_eq!(schema.program, "demo");
        assert!(schema.auto_help);
        assert_eq!(schema.args.len(), 3);

        let err = write_default_schema(&dir, Some("demo"), false).unwrap_err();
        assert!(err.to_string().contains("already exists"));
        write_default_schema(&dir, Some("other"), true).unwrap();
        assert_eq!(Schema::from_file(&dest).unwrap().program, "other");

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn missing_schema_is_an_error() {
        let err = Schema::from_file(Path::new("/nonexistent/argtable.json")).unwrap_err();
        assert!(err.to_string().contains("schema not found"));
    }
}

use argtable::{ArgKind, ArgParser};
use indexmap::IndexMap;
use serde_json::Value;

/// Resolved values keyed by name, in declaration order.
///
/// Flags become booleans; everything else a string or `null`. When a name is
/// declared twice the first declaration wins, as it does for lookups.
pub fn resolved_json(parser: &ArgParser) -> IndexMap<String, Value> {
    let mut table = IndexMap::new();
    for spec in parser.specs() {
        let value = match spec.kind() {
            ArgKind::Flag => Value::Bool(spec.value().is_some()),
            ArgKind::KeyValue | ArgKind::Positional => spec
                .value()
                .map(|v| Value::String(v.to_string()))
                .unwrap_or(Value::Null),
        };
        table.entry(spec.name().to_string()).or_insert(value);
    }
    table
}

/// `NAME='value'` assignments suitable for `eval` in a POSIX shell.
///
/// Flags are always emitted as `1` or `0`; unresolved values are skipped.
pub fn shell_assignments(parser: &ArgParser) -> String {
    let mut out = String::new();
    for (name, value) in resolved_json(parser) {
        let rendered = match value {
            Value::Bool(set) => String::from(if set { "1" } else { "0" }),
            Value::String(s) => shell_quote(&s),
            _ => continue,
        };
        out.push_str(&format!("{}={}\n", shell_name(&name), rendered));
    }
    out
}

/// Upper-cased, non-alphanumerics replaced by `_`. Names that are empty or
/// start with a digit get a leading `_` so the line stays an assignment.
fn shell_name(name: &str) -> String {
    let mut out: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect();
    if out.is_empty() || out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert(0, '_');
    }
    out
}

fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

//! Argument declarations and their resolved values.

use std::fmt;

/// How an argument is recognised in the token stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArgKind {
    /// Boolean presence switch (`--verbose`, `-v`).
    Flag,
    /// Named option whose value is attached with `=` (`--output=out.txt`).
    KeyValue,
    /// Value matched by its declared name appearing bare (`input=a.txt`).
    Positional,
}

impl ArgKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Flag => "flag",
            Self::KeyValue => "key-value",
            Self::Positional => "positional",
        }
    }
}

impl fmt::Display for ArgKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolved value storage, shaped by the declared arity.
///
/// Only the first slot is ever written by a parse pass; the extra slots of
/// [`ArgValue::Many`] are reserved for multi-value support.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgValue {
    Single(Option<String>),
    Many(Vec<Option<String>>),
}

impl ArgValue {
    /// Empty storage for `arity` expected values.
    pub fn for_arity(arity: usize) -> Self {
        if arity > 1 {
            Self::Many(vec![None; arity])
        } else {
            Self::Single(None)
        }
    }

    /// The value in the first slot, if any.
    pub fn first(&self) -> Option<&str> {
        match self {
            Self::Single(v) => v.as_deref(),
            Self::Many(slots) => slots.first().and_then(|v| v.as_deref()),
        }
    }

    /// Number of slots (1 for [`ArgValue::Single`]).
    pub fn slots(&self) -> usize {
        match self {
            Self::Single(_) => 1,
            Self::Many(slots) => slots.len(),
        }
    }

    pub(crate) fn set(&mut self, value: Option<String>) {
        match self {
            Self::Single(slot) => *slot = value,
            Self::Many(slots) => {
                if let Some(slot) = slots.first_mut() {
                    *slot = value;
                }
            }
        }
    }

    pub(crate) fn clear(&mut self) {
        match self {
            Self::Single(slot) => *slot = None,
            Self::Many(slots) => slots.iter_mut().for_each(|s| *s = None),
        }
    }
}

/// One declared argument plus its resolved value.
#[derive(Debug, Clone)]
pub struct ArgSpec {
    name: String,
    short: Option<char>,
    kind: ArgKind,
    required: bool,
    arity: usize,
    default_value: Option<String>,
    help: Option<String>,
    value: ArgValue,
    explicit: bool,
}

impl ArgSpec {
    pub(crate) fn new(
        kind: ArgKind,
        short: Option<char>,
        name: String,
        required: bool,
        arity: usize,
        default_value: Option<String>,
        help: String,
    ) -> Self {
        Self {
            name,
            short: normalize_short(short),
            kind,
            required,
            arity,
            default_value,
            help: (!help.is_empty()).then_some(help),
            value: ArgValue::for_arity(arity),
            explicit: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn short(&self) -> Option<char> {
        self.short
    }

    pub fn kind(&self) -> ArgKind {
        self.kind
    }

    pub fn required(&self) -> bool {
        self.required
    }

    pub fn arity(&self) -> usize {
        self.arity
    }

    pub fn default_value(&self) -> Option<&str> {
        self.default_value.as_deref()
    }

    pub fn help(&self) -> Option<&str> {
        self.help.as_deref()
    }

    /// The resolved value after parsing (defaults included), if any.
    pub fn value(&self) -> Option<&str> {
        self.value.first()
    }

    pub fn raw_value(&self) -> &ArgValue {
        &self.value
    }

    /// Whether a token matched this argument during the last parse.
    ///
    /// A bare `--name` on a key-value argument is explicit even though it
    /// carries no value.
    pub fn is_explicit(&self) -> bool {
        self.explicit
    }

    pub(crate) fn assign(&mut self, value: Option<String>) {
        self.explicit = true;
        self.value.set(value);
    }

    pub(crate) fn apply_default(&mut self) {
        if let Some(default) = &self.default_value {
            self.value.set(Some(default.clone()));
        }
    }

    pub(crate) fn reset(&mut self) {
        self.explicit = false;
        self.value.clear();
    }
}

/// `'0'` and NUL both mean "no short symbol".
fn normalize_short(short: Option<char>) -> Option<char> {
    short.filter(|c| *c != '0' && *c != '\0')
}

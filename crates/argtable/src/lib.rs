//! Declarative argument tables.
//!
//! Declare flags, key-value options and positionals on an [`ArgParser`], feed
//! it the invocation tokens once, then read resolved values by name:
//!
//! ```
//! use argtable::ArgParser;
//!
//! let mut parser = ArgParser::new(
//!     "my_program",
//!     "Usage: my_program [options]",
//!     "This is a sample program.",
//!     "Epilog message",
//!     true,
//! );
//! parser
//!     .declare_positional('i', "input", true, 1, None, "Input file")
//!     .declare_key_value('o', "output", false, Some("out.txt"), "Output file")
//!     .declare_flag('v', "verbose", "Enable verbose mode");
//!
//! parser
//!     .parse_with_echo(["input=data.csv", "-v"], &mut std::io::sink())
//!     .unwrap();
//!
//! assert_eq!(parser.positional("input"), Some("data.csv"));
//! assert_eq!(parser.key_value("output"), Some("out.txt"));
//! assert!(parser.flag("verbose"));
//! assert!(!parser.flag("help"));
//! ```
//!
//! Parsing never rejects a token: anything that matches no declaration is
//! ignored. The only failure is a required argument left without a value.
//!
//! Compatibility notes:
//! - a short cluster such as `-ab=X` gives `X` to every key-value symbol in
//!   the cluster, not only the last one;
//! - [`HelpOptions::group_by_kind`] is accepted but does not regroup output.

mod arg;
mod error;
mod help;
mod parser;

pub use colored::Color;

pub use arg::{ArgKind, ArgSpec, ArgValue};
pub use error::{ParseError, ParseResult};
pub use help::{HelpOptions, Theme};
pub use parser::ArgParser;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

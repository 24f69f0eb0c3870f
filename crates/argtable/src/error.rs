use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    /// A required argument had no value once every token was scanned.
    #[error("Missing required argument: {name}")]
    MissingRequired { name: String },

    /// The echo sink rejected a bare token.
    #[error("failed to echo token: {0}")]
    Echo(#[from] std::io::Error),
}

impl ParseError {
    /// Name of the missing argument, for [`ParseError::MissingRequired`].
    pub fn missing_argument(&self) -> Option<&str> {
        match self {
            Self::MissingRequired { name } => Some(name.as_str()),
            Self::Echo(_) => None,
        }
    }
}

pub type ParseResult<T> = Result<T, ParseError>;

use std::fmt;

#[derive(Debug)]
pub enum Error {
    // The term syntax could not be parsed.
    Parse { input: String, message: String },

    // A theorem whose shape no normalizer understands.
    UnsupportedTheorem(String),

    // Trouble reading a problem file.
    Io(std::io::Error),

    // A problem file that isn't valid json for our schema.
    Json(serde_json::Error),
}

impl Error {
    pub fn parse(input: &str, message: impl Into<String>) -> Error {
        Error::Parse {
            input: input.to_string(),
            message: message.into(),
        }
    }

    pub fn error_type(&self) -> &'static str {
        match self {
            Error::Parse { .. } => "Parse",
            Error::UnsupportedTheorem(_) => "UnsupportedTheorem",
            Error::Io(_) => "Io",
            Error::Json(_) => "Json",
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Parse { input, message } => {
                write!(f, "could not parse '{}': {}", input, message)
            }
            Error::UnsupportedTheorem(s) => {
                write!(f, "no normalizer handles the theorem: {}", s)
            }
            Error::Io(e) => write!(f, "io error: {}", e),
            Error::Json(e) => write!(f, "bad problem file: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            Error::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json(err)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

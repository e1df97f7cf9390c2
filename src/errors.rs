use crate::rules::OperatorName;

/// Failure of a single backend request, classified from the transport signal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    NotConnected,
    NotFound,
    ServerError,
    ParseError(String),
    Timeout,
    Aborted,
    Other { status: Option<u16>, body: String },
}

impl FetchError {
    /// Classify a non-success HTTP status together with its response body.
    pub fn classify(status: u16, body: String) -> Self {
        match status {
            0 => FetchError::NotConnected,
            404 => FetchError::NotFound,
            500 => FetchError::ServerError,
            _ => FetchError::Other {
                status: Some(status),
                body,
            },
        }
    }
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            FetchError::NotConnected => write!(f, "Not connected.\n Verify Network."),
            FetchError::NotFound => write!(f, "Requested page not found. [404]"),
            FetchError::ServerError => write!(f, "Internal Server Error [500]."),
            FetchError::ParseError(_) => write!(f, "Requested JSON parse failed."),
            FetchError::Timeout => write!(f, "Time out error."),
            FetchError::Aborted => write!(f, "Request aborted."),
            FetchError::Other { body, .. } => write!(f, "Uncaught Error.\n{}", body),
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout
        } else if err.is_connect() {
            FetchError::NotConnected
        } else if err.is_decode() {
            FetchError::ParseError(err.to_string())
        } else if let Some(status) = err.status() {
            FetchError::classify(status.as_u16(), err.to_string())
        } else if err.is_request() || err.is_body() {
            FetchError::Aborted
        } else {
            FetchError::Other {
                status: None,
                body: err.to_string(),
            }
        }
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        FetchError::ParseError(err.to_string())
    }
}

/// Rejection raised while turning a rule tree into a query expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranslateError {
    UnsupportedOperator {
        name: String,
        suggestion: Option<&'static str>,
    },
    InvalidRange {
        field: String,
    },
}

impl TranslateError {
    pub fn unsupported_operator(name: &str) -> Self {
        TranslateError::UnsupportedOperator {
            name: name.to_string(),
            suggestion: closest_operator(name),
        }
    }
}

/// Nearest known operator name, if any is within a small edit distance.
fn closest_operator(name: &str) -> Option<&'static str> {
    OperatorName::ALL
        .iter()
        .map(|op| (op.as_str(), strsim::levenshtein(name, op.as_str())))
        .filter(|(_, distance)| *distance <= 3)
        .min_by_key(|(_, distance)| *distance)
        .map(|(candidate, _)| candidate)
}

impl std::fmt::Display for TranslateError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            TranslateError::UnsupportedOperator {
                name,
                suggestion: Some(s),
            } => write!(f, "Unsupported operator '{}' (did you mean '{}'?)", name, s),
            TranslateError::UnsupportedOperator { name, .. } => {
                write!(f, "Unsupported operator '{}'", name)
            }
            TranslateError::InvalidRange { field } => write!(
                f,
                "Range on '{}' needs a two-element value [low, high]",
                field
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    Fetch(FetchError),
    Translate(TranslateError),
    NotLoaded,
    Config(String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::Fetch(err) => write!(f, "{}", err),
            Error::Translate(err) => write!(f, "Filter error: {}", err),
            Error::NotLoaded => write!(f, "Table is not loaded yet."),
            Error::Config(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

impl From<FetchError> for Error {
    fn from(err: FetchError) -> Self {
        Error::Fetch(err)
    }
}

impl From<TranslateError> for Error {
    fn from(err: TranslateError) -> Self {
        Error::Translate(err)
    }
}

/// Error reporter: logs the human-readable message and hands it back so the
/// caller can surface it as well.
pub fn report(err: &Error) -> String {
    let msg = err.to_string();
    tracing::error!(error = ?err, "{}", msg);
    msg
}

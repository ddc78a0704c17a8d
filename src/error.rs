use std::error::Error;
use std::fmt::{self, Display, Formatter};

#[derive(Debug)]
pub struct IdentityError {
    description: String,

    pub kind: IdentityErrorKind,
    pub status: Option<u16>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IdentityErrorKind {
    Io,
    Http,
    Timeout,
    MissingUserInfo,
    InvalidCredentials,
    InvalidToken,
    MfaUnavailable,
    UnsupportedStatus,
    AppNotFound,
    SamlResponseNotFound,
}

impl IdentityError {
    pub fn new(kind: IdentityErrorKind, message: &str) -> Self {
        IdentityError {
            description: message.into(),
            kind,
            status: None,
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn from_reqwest(e: reqwest::Error) -> Self {
        let kind = match e.is_timeout() {
            true => IdentityErrorKind::Timeout,
            false => IdentityErrorKind::Http,
        };
        let status = e.status().map(|s| s.as_u16());

        IdentityError {
            description: e.to_string(),
            kind,
            status,
        }
    }

    /// The request never got an answer: timeouts, refused connections, DNS
    /// failures or a body cut off mid-read.
    pub fn is_transport(&self) -> bool {
        match self.kind {
            IdentityErrorKind::Timeout => true,
            IdentityErrorKind::Http => self.status.is_none(),
            _ => false,
        }
    }
}

impl Error for IdentityError {}

impl Display for IdentityError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self.status {
            Some(status) => write!(f, "{} (HTTP {})", self.description, status),
            None => f.write_str(&self.description),
        }
    }
}

/// Everything that can go wrong between asking the identity provider for an
/// assertion and holding temporary credentials.
#[derive(Debug)]
pub enum ExchangeError {
    /// The identity provider refused the user or the session.
    Authentication(IdentityError),

    /// `requested` is empty when the caller did not name an account.
    RoleSelection {
        requested: String,
        available: Vec<String>,
    },

    /// The federation endpoint rejected the assertion.
    Federation {
        status: u16,
        code: String,
        message: String,
    },

    Transport { message: String, is_timeout: bool },

    InvalidAssertion(String),
}

impl ExchangeError {
    pub fn role_selection(requested: &str, available: Vec<String>) -> Self {
        ExchangeError::RoleSelection {
            requested: requested.into(),
            available,
        }
    }

    pub fn transport(e: reqwest::Error) -> Self {
        ExchangeError::Transport {
            is_timeout: e.is_timeout(),
            message: e.to_string(),
        }
    }

    /// Transport failures may succeed when the caller tries again; everything
    /// else needs a change of input.
    pub fn is_retryable(&self) -> bool {
        match self {
            ExchangeError::Transport { .. } => true,
            _ => false,
        }
    }
}

impl Error for ExchangeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ExchangeError::Authentication(e) => Some(e),
            _ => None,
        }
    }
}

impl Display for ExchangeError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            ExchangeError::Authentication(e) => write!(f, "authentication failed: {}", e),
            ExchangeError::RoleSelection {
                requested,
                available,
            } => {
                let available = match available.len() {
                    0 => "none".to_string(),
                    _ => available.join(", "),
                };

                if requested.is_empty() {
                    write!(
                        f,
                        "no account given and the assertion does not contain exactly one role. Available accounts: {}",
                        available
                    )
                } else {
                    write!(
                        f,
                        "account {} does not match exactly one role. Available accounts: {}",
                        requested, available
                    )
                }
            }
            ExchangeError::Federation {
                status,
                code,
                message,
            } => write!(f, "federation endpoint rejected the assertion (HTTP {}, {}): {}", status, code, message),
            ExchangeError::Transport {
                message,
                is_timeout: true,
            } => write!(f, "request timed out: {}", message),
            ExchangeError::Transport { message, .. } => write!(f, "transport error: {}", message),
            ExchangeError::InvalidAssertion(message) => write!(f, "invalid SAML assertion: {}", message),
        }
    }
}

impl From<IdentityError> for ExchangeError {
    fn from(e: IdentityError) -> Self {
        match e.is_transport() {
            true => ExchangeError::Transport {
                is_timeout: e.kind == IdentityErrorKind::Timeout,
                message: e.to_string(),
            },
            false => ExchangeError::Authentication(e),
        }
    }
}

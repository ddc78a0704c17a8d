use std::io::{self, Write};

use crate::aws::credentials::TemporaryCredentials;
use crate::aws::AwsServiceProvider;
use crate::error::ExchangeError;
use crate::identity::IdentityProvider;
use crate::provider::ServiceProvider;
use crate::user::UserInfo;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Bash,
    Powershell,
}

impl Default for OutputFormat {
    fn default() -> Self {
        match cfg!(windows) {
            true => OutputFormat::Powershell,
            false => OutputFormat::Bash,
        }
    }
}

#[derive(Default)]
pub struct PrintOptions {
    pub org: String,
    pub user: String,
    pub account: String,
    pub no_mask: bool,
    pub password: String,
    pub format: OutputFormat,

    /// Falls back to [`AwsServiceProvider::standard`] when unset.
    pub provider: Option<Box<dyn ServiceProvider>>,
}

impl PrintOptions {
    pub fn user_info(&self) -> UserInfo {
        UserInfo {
            org: self.org.clone(),
            user: self.user.clone(),
            account: self.account.clone(),
            password: self.password.clone(),
            no_mask: self.no_mask,
        }
    }
}

#[derive(Debug)]
pub enum PrintError {
    Exchange(ExchangeError),
    Io(io::Error),
}

impl std::error::Error for PrintError {}

impl std::fmt::Display for PrintError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            PrintError::Exchange(e) => write!(f, "{}", e),
            PrintError::Io(e) => write!(f, "could not write credentials: {}", e),
        }
    }
}

impl From<ExchangeError> for PrintError {
    fn from(e: ExchangeError) -> Self {
        PrintError::Exchange(e)
    }
}

impl From<io::Error> for PrintError {
    fn from(e: io::Error) -> Self {
        PrintError::Io(e)
    }
}

/// Fetches credentials and writes them to `out` as shell exports. Nothing is
/// written unless the exchange succeeded.
pub fn print(
    idp: &dyn IdentityProvider,
    options: PrintOptions,
    out: &mut dyn Write,
) -> Result<(), PrintError> {
    let user = options.user_info();
    debug!("printing credentials for {:?}", user);

    let credentials = match options.provider {
        Some(ref provider) => provider.get_credentials(idp, &user)?,
        None => AwsServiceProvider::standard()?.get_credentials(idp, &user)?,
    };

    out.write_all(format_credentials(&credentials, options.format).as_bytes())?;
    out.flush()?;

    Ok(())
}

pub fn format_credentials(credentials: &TemporaryCredentials, format: OutputFormat) -> String {
    match format {
        OutputFormat::Bash => format_bash(credentials),
        OutputFormat::Powershell => format_powershell(credentials),
    }
}

pub fn format_bash(credentials: &TemporaryCredentials) -> String {
    format!(
        "export AWS_SESSION_TOKEN={}\nexport AWS_ACCESS_KEY_ID={}\nexport AWS_SECRET_ACCESS_KEY={}",
        quote_posix(&credentials.session_token),
        quote_posix(&credentials.access_key_id),
        quote_posix(&credentials.secret_access_key)
    )
}

pub fn format_powershell(credentials: &TemporaryCredentials) -> String {
    format!(
        "$env:AWS_SESSION_TOKEN='{}'; $env:AWS_ACCESS_KEY_ID='{}'; $env:AWS_SECRET_ACCESS_KEY='{}'",
        quote_powershell(&credentials.session_token),
        quote_powershell(&credentials.access_key_id),
        quote_powershell(&credentials.secret_access_key)
    )
}

/// Values made of base64 and ARN characters go out untouched; anything else is
/// single quoted.
fn quote_posix(value: &str) -> String {
    let safe = !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "+/=._:-".contains(c));

    match safe {
        true => value.into(),
        false => format!("'{}'", value.replace('\'', r"'\''")),
    }
}

fn quote_powershell(value: &str) -> String {
    value.replace('\'', "''")
}

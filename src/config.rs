use std::fs::File;
use std::io;
use std::io::prelude::*;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crossterm::style::Stylize;
use keyring::Entry;

use crate::print::OutputFormat;

const KEYRING_SERVICE: &str = "bmx";
const LOCAL_FILENAME: &str = "./bmx.yml";

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Config {
    pub org: Option<String>,
    pub user: Option<String>,
    pub account: Option<String>,
    pub app_link: Option<String>,
    pub sts_endpoint: Option<String>,
    pub session_duration: Option<i64>,
    pub timeout_secs: Option<u64>,
    pub output: Option<OutputFormat>,
}

impl Config {
    pub fn timeout(&self) -> Duration {
        self.timeout_secs
            .map(Duration::from_secs)
            .unwrap_or(crate::client::DEFAULT_TIMEOUT)
    }
}

fn default_filename() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".bmx.yml"))
}

fn get_filename(paths: Vec<PathBuf>) -> Option<PathBuf> {
    paths.into_iter().find(|path| path.exists())
}

pub fn parse(buf: &str) -> Result<Config, io::Error> {
    // an empty file is a valid, empty config
    if buf.trim().is_empty() {
        return Ok(Config::default());
    }

    serde_yaml::from_str::<Config>(buf).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

pub fn load_from(path: &Path) -> Result<Config, io::Error> {
    let mut f = File::open(path)?;
    let mut buf = String::new();
    f.read_to_string(&mut buf)?;

    parse(&buf).map_err(|e| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("{}: {}", path.display(), e),
        )
    })
}

/// Loads `path` when given, otherwise `./bmx.yml` or `~/.bmx.yml`, falling back
/// to an empty config when neither exists.
pub fn load_or_default(path: Option<&str>) -> Result<Config, io::Error> {
    if let Some(path) = path {
        return load_from(Path::new(path));
    }

    let mut candidates = vec![PathBuf::from(LOCAL_FILENAME)];
    if let Some(default) = default_filename() {
        candidates.push(default);
    }

    match get_filename(candidates) {
        Some(path) => {
            debug!("loading config from {}", path.display());
            load_from(&path)
        }
        None => Ok(Config::default()),
    }
}

pub fn get_password(username: &str) -> Result<String, keyring::Error> {
    Entry::new(KEYRING_SERVICE, username)?.get_password()
}

/// Asks for a value on the terminal. Passwords are read without echo unless
/// `no_mask` is set.
pub fn prompt(question: &str, secret: bool, no_mask: bool) -> Option<String> {
    eprint!("{} {}: ", "?".green(), question);
    let _ = io::stderr().flush();

    let value = match secret && !no_mask {
        true => rpassword::read_password().ok()?,
        false => {
            let mut buf = String::new();
            io::stdin().read_line(&mut buf).ok()?;
            buf
        }
    };

    let value = value.trim();
    match value.is_empty() {
        true => None,
        false => Some(value.into()),
    }
}

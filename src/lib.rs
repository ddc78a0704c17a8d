//! Exchange a SAML assertion from Okta for temporary AWS credentials.
//!
//! An [`IdentityProvider`] issues the assertion for a [`UserInfo`], a
//! [`ServiceProvider`] trades it for [`TemporaryCredentials`] and
//! [`print::print`] renders those as shell exports.

#[macro_use]
extern crate log;
#[macro_use]
extern crate serde_derive;

pub mod aws;
pub mod cli;
pub mod client;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod identity;
pub mod logging;
pub mod okta;
pub mod print;
pub mod provider;
pub mod roles;
pub mod saml;
pub mod user;

pub use aws::credentials::TemporaryCredentials;
pub use aws::AwsServiceProvider;
pub use error::{ExchangeError, IdentityError, IdentityErrorKind};
pub use identity::IdentityProvider;
pub use okta::OktaClient;
pub use provider::ServiceProvider;
pub use user::UserInfo;

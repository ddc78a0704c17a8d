use std::sync::Arc;

use chrono::prelude::*;
use reqwest::blocking::Client;
use url::Url;

pub mod credentials;
pub mod sts;
pub mod xml;

use self::credentials::TemporaryCredentials;
use self::sts::{AssumeRoleWithSamlRequest, FederationEndpoint, StsClient, DEFAULT_STS_ENDPOINT};
use crate::client;
use crate::diagnostics::{DiagnosticSink, LogSink};
use crate::error::{ExchangeError, IdentityError, IdentityErrorKind};
use crate::identity::IdentityProvider;
use crate::provider::ServiceProvider;
use crate::saml::{parse_assertion, Assertion, Role};
use crate::user::UserInfo;

pub const MIN_SESSION_DURATION: i64 = 900;
pub const MAX_SESSION_DURATION: i64 = 43200;
pub const DEFAULT_SESSION_DURATION: i64 = 3600;

/// Exchanges assertions for AWS credentials through `AssumeRoleWithSAML`.
pub struct AwsServiceProvider<F = StsClient> {
    federation: F,
    session_duration: Option<i64>,
}

impl AwsServiceProvider<StsClient> {
    /// The provider used when the caller does not pick one: the global STS
    /// endpoint, the proxy aware HTTP client and debug logging of responses.
    pub fn standard() -> Result<Self, ExchangeError> {
        let http = client::get_proxied_client_builder()
            .timeout(client::DEFAULT_TIMEOUT)
            .build()
            .map_err(ExchangeError::transport)?;
        let endpoint = Url::parse(DEFAULT_STS_ENDPOINT).map_err(|e| ExchangeError::Transport {
            message: e.to_string(),
            is_timeout: false,
        })?;

        Ok(Self::with_client(http, endpoint, Arc::new(LogSink)))
    }

    pub fn with_client(http: Client, endpoint: Url, diagnostics: Arc<dyn DiagnosticSink>) -> Self {
        AwsServiceProvider::new(StsClient::new(http, endpoint, diagnostics))
    }
}

impl<F: FederationEndpoint> AwsServiceProvider<F> {
    pub fn new(federation: F) -> Self {
        AwsServiceProvider {
            federation,
            session_duration: None,
        }
    }

    /// Requests this validity instead of the one advertised by the assertion.
    pub fn with_session_duration(mut self, seconds: Option<i64>) -> Self {
        self.session_duration = seconds;
        self
    }

    fn duration_for(&self, assertion: &Assertion) -> i64 {
        self.session_duration
            .or(assertion.session_duration)
            .unwrap_or(DEFAULT_SESSION_DURATION)
            .clamp(MIN_SESSION_DURATION, MAX_SESSION_DURATION)
    }
}

impl<F: FederationEndpoint> ServiceProvider for AwsServiceProvider<F> {
    fn get_credentials(
        &self,
        idp: &dyn IdentityProvider,
        user: &UserInfo,
    ) -> Result<TemporaryCredentials, ExchangeError> {
        trace!("get_credentials.start");
        let assertion = fetch_assertion(idp, user)?;

        trace!("get_credentials.select_role");
        let role = select_role(&assertion.roles, &user.account)?;
        let duration_seconds = self.duration_for(&assertion);
        debug!("selected role {} ({})", role.arn, role.principal_arn);

        let requested_at = Utc::now();
        let credentials = self.federation.assume_role_with_saml(&AssumeRoleWithSamlRequest {
            role_arn: &role.arn,
            principal_arn: &role.principal_arn,
            saml_assertion: assertion.encoded(),
            duration_seconds,
        })?;

        if credentials.session_token.is_empty() || credentials.access_key_id.is_empty() {
            return Err(ExchangeError::Federation {
                status: 200,
                code: "MalformedResponse".into(),
                message: "response did not contain credentials".into(),
            });
        }

        if !credentials.is_valid_at(requested_at) {
            return Err(ExchangeError::Federation {
                status: 200,
                code: "ExpiredCredentials".into(),
                message: format!("credentials expired at {}", credentials.expiration),
            });
        }

        info!(
            "obtained credentials for {} valid until {}",
            role.arn, credentials.expiration
        );
        trace!("get_credentials.ok");
        Ok(credentials)
    }
}

/// Asks the identity provider for an assertion and parses its roles. Nothing
/// is sent to the identity provider when the user is incomplete. Failures to
/// reach it come back as [`ExchangeError::Transport`].
pub fn fetch_assertion(
    idp: &dyn IdentityProvider,
    user: &UserInfo,
) -> Result<Assertion, ExchangeError> {
    if let Some(field) = user.missing_field() {
        return Err(ExchangeError::Authentication(IdentityError::new(
            IdentityErrorKind::MissingUserInfo,
            &format!("{} must not be empty", field),
        )));
    }

    trace!("fetch_assertion.get_assertion");
    let encoded = idp.get_assertion(user).map_err(|e| {
        debug!("identity provider failed: {:?}", e);
        ExchangeError::from(e)
    })?;

    parse_assertion(&encoded)
}

/// Picks the role for `account`. Without an account the assertion has to
/// contain exactly one role; with one, exactly one role may match it.
pub fn select_role<'a>(roles: &'a [Role], account: &str) -> Result<&'a Role, ExchangeError> {
    let account = account.trim();
    let available = || roles.iter().map(|r| r.arn.clone()).collect::<Vec<String>>();

    if account.is_empty() {
        return match roles {
            [role] => Ok(role),
            _ => Err(ExchangeError::role_selection(account, available())),
        };
    }

    // a full ARN is never ambiguous
    if let Some(role) = roles.iter().find(|r| r.arn == account) {
        return Ok(role);
    }

    let matching = roles.iter().filter(|r| r.matches(account)).collect::<Vec<&Role>>();
    match matching.as_slice() {
        [role] => Ok(*role),
        _ => Err(ExchangeError::role_selection(account, available())),
    }
}

use std::sync::Arc;

use reqwest::blocking::Client;
use url::Url;

mod form;
pub mod login;
pub mod mfa;

use self::login::Session;
use self::mfa::Factor;
use crate::diagnostics::DiagnosticSink;
use crate::error::{IdentityError, IdentityErrorKind};
use crate::identity::IdentityProvider;
use crate::user::UserInfo;

/// Asked for a one time code when Okta requires MFA. Returning `None` aborts
/// the login.
pub type MfaPrompt = Box<dyn Fn(&Factor) -> Option<String> + Send + Sync>;

/// Issues assertions through an Okta org's authentication API.
///
/// Every call to [`IdentityProvider::get_assertion`] logs in from scratch, so
/// the client holds no session state between calls.
pub struct OktaClient {
    client: Client,
    base_url: Option<Url>,
    app_link: Option<String>,
    mfa_prompt: Option<MfaPrompt>,
    diagnostics: Arc<dyn DiagnosticSink>,
}

impl OktaClient {
    pub fn new(client: Client, diagnostics: Arc<dyn DiagnosticSink>) -> Self {
        OktaClient {
            client,
            base_url: None,
            app_link: None,
            mfa_prompt: None,
            diagnostics,
        }
    }

    /// Talk to this URL instead of `https://{org}.okta.com`.
    pub fn with_base_url(mut self, base_url: Url) -> Self {
        self.base_url = Some(base_url);
        self
    }

    /// Skip app discovery and open this link directly.
    pub fn with_app_link(mut self, app_link: Option<String>) -> Self {
        self.app_link = app_link;
        self
    }

    pub fn with_mfa_prompt(mut self, prompt: MfaPrompt) -> Self {
        self.mfa_prompt = Some(prompt);
        self
    }

    fn base_url_for(&self, org: &str) -> Result<Url, IdentityError> {
        if let Some(ref url) = self.base_url {
            return Ok(url.clone());
        }

        Url::parse(&format!("https://{}.okta.com/", org.trim())).map_err(|e| {
            IdentityError::new(
                IdentityErrorKind::MissingUserInfo,
                &format!("'{}' is not a valid Okta org: {}", org, e),
            )
        })
    }
}

impl IdentityProvider for OktaClient {
    fn get_assertion(&self, user: &UserInfo) -> Result<String, IdentityError> {
        trace!("get_assertion.start");
        let base_url = self.base_url_for(&user.org)?;
        debug!("authenticating {} against {}", user.user, base_url);

        let session = Session {
            client: &self.client,
            base_url: &base_url,
            diagnostics: self.diagnostics.as_ref(),
        };

        let session_token =
            session.authenticate(&user.user, &user.password, self.mfa_prompt.as_ref())?;

        trace!("get_assertion.create_session");
        let mut cookie_jar = session.create_session(&session_token)?;

        let app_link = match self.app_link {
            Some(ref link) => link.clone(),
            None => session.find_aws_app_link(&cookie_jar)?,
        };

        trace!("get_assertion.get_saml_response");
        session.get_saml_response(&mut cookie_jar, &app_link)
    }
}

use cookie::{Cookie, CookieJar};
use reqwest::blocking::{Client, RequestBuilder};
use scraper::Html;
use url::Url;

use super::form::extract_saml_response;
use super::mfa::{select_factor, Factor};
use super::MfaPrompt;
use crate::diagnostics::{dump_response, DiagnosticSink};
use crate::error::{IdentityError, IdentityErrorKind};

const AWS_APP_NAME: &str = "amazon_aws";

#[derive(Deserialize, Debug)]
struct AuthnResponse {
    status: String,
    #[serde(rename = "sessionToken")]
    session_token: Option<String>,
    #[serde(rename = "stateToken")]
    state_token: Option<String>,
    #[serde(rename = "_embedded")]
    embedded: Option<AuthnEmbedded>,
}

#[derive(Deserialize, Debug)]
struct AuthnEmbedded {
    #[serde(default)]
    factors: Vec<Factor>,
}

#[derive(Deserialize, Debug)]
struct CreateSessionResponse {
    id: String,
}

#[derive(Deserialize, Debug)]
pub struct AppLink {
    pub label: String,
    #[serde(rename = "linkUrl")]
    pub link_url: String,
    #[serde(rename = "appName")]
    pub app_name: String,
}

pub struct Session<'a> {
    pub client: &'a Client,
    pub base_url: &'a Url,
    pub diagnostics: &'a dyn DiagnosticSink,
}

impl<'a> Session<'a> {
    fn url(&self, path: &str) -> Result<Url, IdentityError> {
        self.base_url
            .join(path)
            .map_err(|e| IdentityError::new(IdentityErrorKind::Io, &e.to_string()))
    }

    /// Sends the request and returns status and body, recording the response
    /// in the diagnostic sink.
    fn send(&self, request: RequestBuilder, context: &str) -> Result<(u16, String), IdentityError> {
        let res = request.send().map_err(|e| {
            error!("{}: {:?}", context, e);
            IdentityError::from_reqwest(e)
        })?;

        let status = res.status().as_u16();
        let headers = res.headers().clone();
        let body = res.text().map_err(IdentityError::from_reqwest)?;

        dump_response(self.diagnostics, context, status, &headers, &body);

        Ok((status, body))
    }

    /// Primary authentication. Returns the one time session token, verifying
    /// an MFA code first when the org requires one.
    pub fn authenticate(
        &self,
        username: &str,
        password: &str,
        mfa_prompt: Option<&MfaPrompt>,
    ) -> Result<String, IdentityError> {
        trace!("authenticate.start");
        let body = serde_json::json!({ "username": username, "password": password });

        let (status, text) = self.send(
            self.client.post(self.url("api/v1/authn")?).json(&body),
            "okta.authn",
        )?;

        if status == 401 {
            return Err(IdentityError::new(
                IdentityErrorKind::InvalidCredentials,
                "Invalid username or password",
            )
            .with_status(status));
        }
        if !(200..300).contains(&status) {
            return Err(IdentityError::new(IdentityErrorKind::Http, "Okta authentication failed")
                .with_status(status));
        }

        let resp: AuthnResponse = parse_json(&text)?;
        trace!("authenticate.status={}", resp.status);

        match resp.status.as_str() {
            "SUCCESS" => session_token(resp.session_token),
            "MFA_REQUIRED" => {
                let state_token = resp.state_token.ok_or_else(|| {
                    IdentityError::new(IdentityErrorKind::Io, "MFA required but no state token returned")
                })?;
                let factors = resp.embedded.map(|e| e.factors).unwrap_or_default();

                self.verify_factor(&state_token, &factors, mfa_prompt)
            }
            other => Err(IdentityError::new(
                IdentityErrorKind::UnsupportedStatus,
                &format!("Okta returned authentication status {}", other),
            )),
        }
    }

    fn verify_factor(
        &self,
        state_token: &str,
        factors: &[Factor],
        mfa_prompt: Option<&MfaPrompt>,
    ) -> Result<String, IdentityError> {
        trace!("verify_factor.start");
        let factor = select_factor(factors).ok_or_else(|| {
            IdentityError::new(
                IdentityErrorKind::MfaUnavailable,
                "MFA is required but none of the enrolled factors is supported",
            )
        })?;
        debug!("verifying factor {}", factor.describe());

        let verify_link = factor
            .verify_link()
            .ok_or_else(|| IdentityError::new(IdentityErrorKind::Io, "factor has no verify link"))?;

        let state_token = match factor.needs_challenge() {
            true => self.challenge_factor(verify_link, state_token)?,
            false => state_token.to_string(),
        };

        let code = mfa_prompt.and_then(|prompt| prompt(factor)).ok_or_else(|| {
            IdentityError::new(IdentityErrorKind::MfaUnavailable, "No MFA code provided")
        })?;

        let body = serde_json::json!({ "stateToken": state_token, "passCode": code.trim() });
        let (status, text) = self.send(
            self.client.post(verify_link).json(&body),
            "okta.verify_factor",
        )?;

        if !(200..300).contains(&status) {
            return Err(IdentityError::new(
                IdentityErrorKind::InvalidToken,
                "Invalid MFA code. Check that you are using the correct MFA device",
            )
            .with_status(status));
        }

        let resp: AuthnResponse = parse_json(&text)?;
        if resp.status != "SUCCESS" {
            return Err(IdentityError::new(
                IdentityErrorKind::UnsupportedStatus,
                &format!("Okta returned status {} after MFA verification", resp.status),
            ));
        }

        trace!("verify_factor.ok");
        session_token(resp.session_token)
    }

    /// Makes Okta send the code for the factor. A verify call without a pass
    /// code answers with `MFA_CHALLENGE` and a state token for the next step.
    fn challenge_factor(&self, verify_link: &str, state_token: &str) -> Result<String, IdentityError> {
        trace!("challenge_factor.start");
        let body = serde_json::json!({ "stateToken": state_token });

        let (status, text) = self.send(
            self.client.post(verify_link).json(&body),
            "okta.challenge_factor",
        )?;

        if !(200..300).contains(&status) {
            return Err(IdentityError::new(IdentityErrorKind::Http, "Okta could not send the MFA code")
                .with_status(status));
        }

        let resp: AuthnResponse = parse_json(&text)?;
        if resp.status != "MFA_CHALLENGE" {
            return Err(IdentityError::new(
                IdentityErrorKind::UnsupportedStatus,
                &format!("Okta returned status {} when sending the MFA code", resp.status),
            ));
        }

        trace!("challenge_factor.ok");
        Ok(resp.state_token.unwrap_or_else(|| state_token.to_string()))
    }

    /// Trades the session token for a session cookie.
    pub fn create_session(&self, session_token: &str) -> Result<CookieJar, IdentityError> {
        trace!("create_session.start");
        let body = serde_json::json!({ "sessionToken": session_token });

        let (status, text) = self.send(
            self.client.post(self.url("api/v1/sessions")?).json(&body),
            "okta.create_session",
        )?;

        if !(200..300).contains(&status) {
            return Err(IdentityError::new(IdentityErrorKind::Http, "Could not create Okta session")
                .with_status(status));
        }

        let resp: CreateSessionResponse = parse_json(&text)?;

        let mut cookie_jar = CookieJar::new();
        cookie_jar.add(Cookie::new("sid", resp.id));

        trace!("create_session.ok");
        Ok(cookie_jar)
    }

    /// Finds the AWS app among the user's app links.
    pub fn find_aws_app_link(&self, cookie_jar: &CookieJar) -> Result<String, IdentityError> {
        trace!("find_aws_app_link.start");
        let (status, text) = self.send(
            self.client
                .get(self.url("api/v1/users/me/appLinks")?)
                .header("Cookie", cookie_header(cookie_jar)),
            "okta.app_links",
        )?;

        if !(200..300).contains(&status) {
            return Err(IdentityError::new(IdentityErrorKind::Http, "Could not list Okta apps")
                .with_status(status));
        }

        let links: Vec<AppLink> = parse_json(&text)?;
        let aws = links
            .into_iter()
            .filter(|l| l.app_name == AWS_APP_NAME)
            .collect::<Vec<AppLink>>();

        match aws.as_slice() {
            [link] => {
                debug!("using app {} at {}", link.label, link.link_url);
                Ok(link.link_url.clone())
            }
            [] => Err(IdentityError::new(
                IdentityErrorKind::AppNotFound,
                "No AWS app is assigned to this user",
            )),
            _ => Err(IdentityError::new(
                IdentityErrorKind::AppNotFound,
                &format!(
                    "Several AWS apps are assigned to this user ({}). Set app_link in the config file",
                    aws.iter().map(|l| l.label.as_str()).collect::<Vec<&str>>().join(", ")
                ),
            )),
        }
    }

    /// Opens the app link with the session cookie and pulls the assertion out
    /// of the returned form.
    pub fn get_saml_response(
        &self,
        cookie_jar: &mut CookieJar,
        app_link: &str,
    ) -> Result<String, IdentityError> {
        trace!("get_saml_response.start");
        let res = self
            .client
            .get(app_link)
            .header("Cookie", cookie_header(cookie_jar))
            .send()
            .map_err(IdentityError::from_reqwest)?;

        store_cookies(cookie_jar, &res);

        let status = res.status().as_u16();
        let headers = res.headers().clone();
        let body = res.text().map_err(IdentityError::from_reqwest)?;
        dump_response(self.diagnostics, "okta.app_link", status, &headers, &body);

        if !(200..300).contains(&status) {
            return Err(IdentityError::new(IdentityErrorKind::Http, "Could not open the AWS app")
                .with_status(status));
        }

        let doc = Html::parse_document(&body);
        match extract_saml_response(&doc) {
            Some(saml_response) => {
                trace!("get_saml_response.ok");
                Ok(saml_response)
            }
            None => {
                trace!("get_saml_response.no_response");
                Err(IdentityError::new(
                    IdentityErrorKind::SamlResponseNotFound,
                    "Could not find SAML response. The Okta session may have expired",
                ))
            }
        }
    }
}

fn session_token(token: Option<String>) -> Result<String, IdentityError> {
    token
        .filter(|t| !t.is_empty())
        .ok_or_else(|| IdentityError::new(IdentityErrorKind::Io, "Okta did not return a session token"))
}

fn parse_json<T: serde::de::DeserializeOwned>(text: &str) -> Result<T, IdentityError> {
    serde_json::from_str(text).map_err(|e| {
        IdentityError::new(IdentityErrorKind::Io, &format!("unexpected response from Okta: {}", e))
    })
}

pub fn cookie_header(cookie_jar: &CookieJar) -> String {
    cookie_jar
        .iter()
        .map(|cookie_from_jar| format!("{}={}", cookie_from_jar.name(), cookie_from_jar.value()))
        .collect::<Vec<String>>()
        .join("; ")
}

/// Adds every `set-cookie` of the response to the jar.
fn store_cookies(cookie_jar: &mut CookieJar, res: &reqwest::blocking::Response) {
    for raw_cookie in res.headers().get_all("set-cookie").iter() {
        let raw_cookie = match raw_cookie.to_str() {
            Ok(c) => c.to_string(),
            Err(_) => continue,
        };

        match Cookie::parse(raw_cookie) {
            Ok(cookie) => cookie_jar.add(cookie),
            Err(e) => warn!("ignoring malformed cookie: {}", e),
        }
    }
}

use std::sync::Arc;

use chrono::prelude::*;
use reqwest::blocking::Client;
use url::Url;

use super::credentials::TemporaryCredentials;
use super::xml::{AssumeRoleWithSAMLResponse, Credentials, ErrorResponse};
use crate::diagnostics::{dump_response, DiagnosticSink};
use crate::error::ExchangeError;

pub const DEFAULT_STS_ENDPOINT: &str = "https://sts.amazonaws.com/";
const API_VERSION: &str = "2011-06-15";

#[derive(Debug)]
pub struct AssumeRoleWithSamlRequest<'a> {
    pub role_arn: &'a str,
    pub principal_arn: &'a str,
    pub saml_assertion: &'a str,
    pub duration_seconds: i64,
}

/// The service that trades a SAML assertion for temporary credentials.
pub trait FederationEndpoint {
    fn assume_role_with_saml(
        &self,
        request: &AssumeRoleWithSamlRequest,
    ) -> Result<TemporaryCredentials, ExchangeError>;
}

/// Calls the STS query API directly over HTTP.
pub struct StsClient {
    client: Client,
    endpoint: Url,
    diagnostics: Arc<dyn DiagnosticSink>,
}

impl StsClient {
    pub fn new(client: Client, endpoint: Url, diagnostics: Arc<dyn DiagnosticSink>) -> Self {
        StsClient {
            client,
            endpoint,
            diagnostics,
        }
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

impl FederationEndpoint for StsClient {
    fn assume_role_with_saml(
        &self,
        request: &AssumeRoleWithSamlRequest,
    ) -> Result<TemporaryCredentials, ExchangeError> {
        trace!("assume_role_with_saml.start");
        let duration = request.duration_seconds.to_string();
        let params = [
            ("Action", "AssumeRoleWithSAML"),
            ("Version", API_VERSION),
            ("RoleArn", request.role_arn),
            ("PrincipalArn", request.principal_arn),
            ("SAMLAssertion", request.saml_assertion),
            ("DurationSeconds", duration.as_str()),
        ];

        debug!(
            "assuming {} via {} for {} seconds",
            request.role_arn, self.endpoint, request.duration_seconds
        );

        trace!("assume_role_with_saml.send");
        let res = self
            .client
            .post(self.endpoint.clone())
            .header("Accept", "text/xml")
            .form(&params)
            .send()
            .map_err(|e| {
                error!("assume_role_with_saml: {:?}", e);
                ExchangeError::transport(e)
            })?;

        let status = res.status().as_u16();
        let headers = res.headers().clone();
        let body = res.text().map_err(ExchangeError::transport)?;

        dump_response(
            self.diagnostics.as_ref(),
            "sts.assume_role_with_saml",
            status,
            &headers,
            &body,
        );

        if !(200..300).contains(&status) {
            trace!("assume_role_with_saml.rejected");
            return Err(parse_error_response(status, &body));
        }

        let parsed: AssumeRoleWithSAMLResponse =
            serde_xml_rs::from_str(&body).map_err(|e| ExchangeError::Federation {
                status,
                code: "MalformedResponse".into(),
                message: e.to_string(),
            })?;

        if let Some(user) = &parsed.result.assumed_role_user {
            debug!("assumed role user {}", user.arn);
        }

        trace!("assume_role_with_saml.ok");
        normalize(status, parsed.result.credentials)
    }
}

fn normalize(status: u16, credentials: Credentials) -> Result<TemporaryCredentials, ExchangeError> {
    let expiration = DateTime::parse_from_rfc3339(credentials.expiration.trim())
        .map_err(|e| ExchangeError::Federation {
            status,
            code: "MalformedResponse".into(),
            message: format!("invalid expiration '{}': {}", credentials.expiration, e),
        })?
        .with_timezone(&Utc);

    Ok(TemporaryCredentials {
        access_key_id: credentials.access_key_id.trim().into(),
        secret_access_key: credentials.secret_access_key.trim().into(),
        session_token: credentials.session_token.trim().into(),
        expiration,
    })
}

/// Keeps the HTTP status together with the STS error code and message. Bodies
/// that are not an STS error document (proxies, load balancers) are passed on
/// as the message.
fn parse_error_response(status: u16, body: &str) -> ExchangeError {
    match serde_xml_rs::from_str::<ErrorResponse>(body) {
        Ok(res) => {
            debug!(
                "sts rejected the request: {} {} (request id {})",
                res.error.kind, res.error.code, res.request_id
            );
            ExchangeError::Federation {
                status,
                code: res.error.code,
                message: res.error.message.trim().into(),
            }
        }
        Err(_) => ExchangeError::Federation {
            status,
            code: "Unknown".into(),
            message: body.chars().take(200).collect::<String>().trim().into(),
        },
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse_error_response() {
        let body = r#"<ErrorResponse xmlns="https://sts.amazonaws.com/doc/2011-06-15/">
  <Error>
    <Type>Sender</Type>
    <Code>InvalidIdentityToken</Code>
    <Message>Specified provider doesn't exist</Message>
  </Error>
  <RequestId>c9d3d4b2</RequestId>
</ErrorResponse>"#;

        match parse_error_response(400, body) {
            ExchangeError::Federation {
                status,
                code,
                message,
            } => {
                assert_eq!(status, 400);
                assert_eq!(code, "InvalidIdentityToken");
                assert_eq!(message, "Specified provider doesn't exist");
            }
            e => panic!("unexpected error {:?}", e),
        }
    }

    #[test]
    fn test_parse_error_response_not_xml() {
        match parse_error_response(502, "Bad Gateway") {
            ExchangeError::Federation { status, code, message } => {
                assert_eq!(status, 502);
                assert_eq!(code, "Unknown");
                assert_eq!(message, "Bad Gateway");
            }
            e => panic!("unexpected error {:?}", e),
        }
    }

    #[test]
    fn test_normalize() {
        let creds = normalize(
            200,
            Credentials {
                access_key_id: "ASIAEXAMPLE".into(),
                secret_access_key: "secret".into(),
                session_token: "\n      token\n    ".into(),
                expiration: "2030-01-01T00:00:00Z".into(),
            },
        )
        .unwrap();

        assert_eq!(creds.session_token, "token");
        assert_eq!(creds.expiration, Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_normalize_rejects_bad_expiration() {
        let res = normalize(
            200,
            Credentials {
                access_key_id: "a".into(),
                secret_access_key: "b".into(),
                session_token: "c".into(),
                expiration: "tomorrow".into(),
            },
        );

        assert!(matches!(res, Err(ExchangeError::Federation { status: 200, .. })));
    }
}

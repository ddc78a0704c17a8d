#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use bmx::diagnostics::DiagnosticSink;
use bmx::{AwsServiceProvider, IdentityError, IdentityErrorKind, IdentityProvider, UserInfo};
use chrono::prelude::*;
use url::Url;

pub const DEV: &str =
    "arn:aws:iam::123456789012:role/dev,arn:aws:iam::123456789012:saml-provider/okta";
pub const PROD: &str =
    "arn:aws:iam::123456789012:role/prod,arn:aws:iam::123456789012:saml-provider/okta";

/// Builds a minimal, unsigned Okta style SAML response carrying the given
/// role values, base64 encoded the way the app page posts it.
pub fn encode_test_assertion(roles: &[&str], session_duration: Option<i64>) -> String {
    let values = roles
        .iter()
        .map(|r| {
            format!(
                r#"<saml2:AttributeValue xmlns:xs="http://www.w3.org/2001/XMLSchema" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xsi:type="xs:string">{}</saml2:AttributeValue>"#,
                r
            )
        })
        .collect::<Vec<String>>()
        .join("");

    let duration = match session_duration {
        Some(d) => format!(
            r#"<saml2:Attribute Name="https://aws.amazon.com/SAML/Attributes/SessionDuration"><saml2:AttributeValue>{}</saml2:AttributeValue></saml2:Attribute>"#,
            d
        ),
        None => String::new(),
    };

    let xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><saml2p:Response xmlns:saml2p="urn:oasis:names:tc:SAML:2.0:protocol" Destination="https://signin.aws.amazon.com/saml" ID="id1" Version="2.0"><saml2:Issuer xmlns:saml2="urn:oasis:names:tc:SAML:2.0:assertion">http://www.okta.com/exk1</saml2:Issuer><saml2p:Status><saml2p:StatusCode Value="urn:oasis:names:tc:SAML:2.0:status:Success"/></saml2p:Status><saml2:Assertion xmlns:saml2="urn:oasis:names:tc:SAML:2.0:assertion" ID="id2" Version="2.0"><saml2:Issuer>http://www.okta.com/exk1</saml2:Issuer><saml2:Subject><saml2:NameID>alice@acme.com</saml2:NameID></saml2:Subject><saml2:AttributeStatement><saml2:Attribute Name="https://aws.amazon.com/SAML/Attributes/Role" NameFormat="urn:oasis:names:tc:SAML:2.0:attrname-format:uri">{}</saml2:Attribute><saml2:Attribute Name="https://aws.amazon.com/SAML/Attributes/RoleSessionName"><saml2:AttributeValue>alice@acme.com</saml2:AttributeValue></saml2:Attribute>{}</saml2:AttributeStatement></saml2:Assertion></saml2p:Response>"#,
        values, duration
    );

    STANDARD.encode(xml)
}

/// Runs blocking client code off the async test runtime.
pub async fn run_blocking<F, T>(f: F) -> T
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await.unwrap()
}

pub fn http_client(timeout: Duration) -> reqwest::blocking::Client {
    reqwest::blocking::Client::builder()
        .timeout(timeout)
        .build()
        .unwrap()
}

pub fn aws_provider(
    uri: &str,
    timeout: Duration,
    diagnostics: Arc<dyn DiagnosticSink>,
) -> AwsServiceProvider {
    AwsServiceProvider::with_client(
        http_client(timeout),
        Url::parse(&format!("{}/", uri)).unwrap(),
        diagnostics,
    )
}

pub fn sts_success(access_key_id: &str, secret: &str, token: &str, expiration: DateTime<Utc>) -> String {
    format!(
        r#"<AssumeRoleWithSAMLResponse xmlns="https://sts.amazonaws.com/doc/2011-06-15/">
  <AssumeRoleWithSAMLResult>
    <Audience>https://signin.aws.amazon.com/saml</Audience>
    <AssumedRoleUser>
      <AssumedRoleId>AROAEXAMPLE:alice@acme.com</AssumedRoleId>
      <Arn>arn:aws:sts::123456789012:assumed-role/dev/alice@acme.com</Arn>
    </AssumedRoleUser>
    <Credentials>
      <AccessKeyId>{}</AccessKeyId>
      <SecretAccessKey>{}</SecretAccessKey>
      <SessionToken>{}</SessionToken>
      <Expiration>{}</Expiration>
    </Credentials>
    <Subject>alice@acme.com</Subject>
  </AssumeRoleWithSAMLResult>
  <ResponseMetadata>
    <RequestId>c6104cbe-af31-11e0-8154-cbc7ccf896c7</RequestId>
  </ResponseMetadata>
</AssumeRoleWithSAMLResponse>"#,
        access_key_id,
        secret,
        token,
        expiration.to_rfc3339_opts(SecondsFormat::Secs, true)
    )
}

pub fn sts_error(code: &str, message: &str) -> String {
    format!(
        r#"<ErrorResponse xmlns="https://sts.amazonaws.com/doc/2011-06-15/">
  <Error>
    <Type>Sender</Type>
    <Code>{}</Code>
    <Message>{}</Message>
  </Error>
  <RequestId>4d2a4c6e</RequestId>
</ErrorResponse>"#,
        code, message
    )
}

/// An identity provider that hands out a fixed assertion.
pub struct StaticIdp {
    pub assertion: Option<String>,
}

impl StaticIdp {
    pub fn with_roles(roles: &[&str]) -> Self {
        StaticIdp {
            assertion: Some(encode_test_assertion(roles, None)),
        }
    }

    pub fn expired_session() -> Self {
        StaticIdp { assertion: None }
    }
}

impl IdentityProvider for StaticIdp {
    fn get_assertion(&self, _user: &UserInfo) -> Result<String, IdentityError> {
        self.assertion.clone().ok_or_else(|| {
            IdentityError::new(IdentityErrorKind::InvalidCredentials, "session expired")
                .with_status(401)
        })
    }
}

pub fn alice(account: &str) -> UserInfo {
    UserInfo::new("acme", "alice", account, "p")
}

use std::str::FromStr;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use regex::Regex;

use crate::error::ExchangeError;

#[derive(Deserialize, Debug)]
#[serde(rename = "Response")]
pub struct SAMLResponse {
    #[serde(rename = "Assertion")]
    pub assertion: SAMLAssertion,
}

#[derive(Deserialize, Debug)]
pub struct SAMLAssertion {
    #[serde(rename = "AttributeStatement", default)]
    pub attribute_statement: AttributeStatement,
}

#[derive(Deserialize, Debug, Default)]
pub struct AttributeStatement {
    #[serde(rename = "Attribute", default)]
    pub attributes: Vec<Attribute>,
}

#[derive(Deserialize, Debug)]
pub struct Attribute {
    #[serde(rename = "AttributeValue", default)]
    pub values: Vec<AttributeValue>,

    #[serde(rename = "FriendlyName", default)]
    pub friendly_name: String,

    #[serde(rename = "Name", default)]
    pub name: String,
}

impl Attribute {
    /// `RoleSessionName`, `SessionDuration`, `Role`, ... regardless of whether
    /// the IdP sets the friendly name or only the full attribute URI.
    fn key(&self) -> &str {
        if !self.friendly_name.is_empty() {
            return &self.friendly_name;
        }

        self.name.rsplit('/').next().unwrap_or(&self.name)
    }

    fn first_value(&self) -> Option<&str> {
        self.values.first().map(|v| v.value.trim())
    }
}

#[derive(Deserialize, Debug)]
pub struct AttributeValue {
    #[serde(rename = "$value", default)]
    pub value: String,
}

/// Assertion is the prettified SAML Assertion. It keeps the encoded blob as it
/// was received from the identity provider, since that is what the federation
/// endpoint wants, next to the fields we actually read from it.
#[derive(Debug, Clone)]
pub struct Assertion {
    encoded: String,

    pub role_session_name: Option<String>,
    pub session_duration: Option<i64>,
    pub roles: Vec<Role>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Role {
    pub arn: String,
    pub principal_arn: String,
    pub account_id: String,
}

impl Role {
    /// Builds a role from one `Role` attribute value, which is a role ARN and a
    /// SAML provider ARN separated by a comma, in either order.
    pub fn from_attribute_value(value: &str) -> Result<Self, ExchangeError> {
        let split = value.split(',').map(|s| s.trim()).collect::<Vec<&str>>();

        if split.len() != 2 {
            return Err(ExchangeError::InvalidAssertion(format!(
                "malformed role attribute value '{}'",
                value
            )));
        }

        let (arn, principal_arn) = match split[0].contains(":saml-provider/") {
            true => (split[1], split[0]),
            false => (split[0], split[1]),
        };

        if !arn.contains(":role/") {
            return Err(ExchangeError::InvalidAssertion(format!(
                "'{}' is not a role ARN",
                arn
            )));
        }

        let account_id = arn.split(':').nth(4).unwrap_or_default();

        Ok(Role {
            arn: arn.into(),
            principal_arn: principal_arn.into(),
            account_id: account_id.into(),
        })
    }

    /// The resource part of the ARN, e.g. `role/dev`.
    pub fn resource(&self) -> &str {
        self.arn.splitn(6, ':').nth(5).unwrap_or(&self.arn)
    }

    /// An account identifier names this role if it is the full ARN, the
    /// resource part or the account number.
    pub fn matches(&self, account: &str) -> bool {
        let account = account.trim();

        account == self.arn || account == self.resource() || account == self.account_id
    }
}

impl Assertion {
    /// The blob exactly as the identity provider issued it.
    pub fn encoded(&self) -> &str {
        &self.encoded
    }

    pub fn available_accounts(&self) -> Vec<String> {
        self.roles.iter().map(|r| r.arn.clone()).collect()
    }
}

/// Removes namespace prefixes and declarations so that `saml2:Assertion`,
/// `saml:Assertion` and `Assertion` all deserialize the same way.
fn strip_namespaces(xml: &str) -> Result<String, regex::Error> {
    let declarations = Regex::new(r#"\s+xmlns(:[\w.-]+)?\s*=\s*"[^"]*""#)?;
    let element_prefixes = Regex::new(r"<(/?)[\w.-]+:")?;
    let attribute_prefixes = Regex::new(r"(\s)[\w.-]+:([\w.-]+\s*=)")?;

    let buf = declarations.replace_all(xml, "");
    let buf = element_prefixes.replace_all(&buf, "<$1");
    let buf = attribute_prefixes.replace_all(&buf, "$1$2");

    Ok(buf.into_owned())
}

pub fn parse_assertion(assertion_b64: &str) -> Result<Assertion, ExchangeError> {
    let encoded = assertion_b64
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>();

    let raw = STANDARD
        .decode(&encoded)
        .map_err(|e| ExchangeError::InvalidAssertion(format!("not valid base64: {}", e)))?;
    let buf = String::from_utf8(raw)
        .map_err(|e| ExchangeError::InvalidAssertion(format!("not valid UTF-8: {}", e)))?;

    let buf = strip_namespaces(&buf).map_err(|e| ExchangeError::InvalidAssertion(e.to_string()))?;
    trace!("parse_assertion.stripped_len={}", buf.len());

    let raw_assertion: SAMLResponse = serde_xml_rs::from_str(&buf)
        .map_err(|e| ExchangeError::InvalidAssertion(e.to_string()))?;

    let mut assertion = Assertion {
        encoded,
        role_session_name: None,
        session_duration: None,
        roles: vec![],
    };

    for attribute in &raw_assertion.assertion.attribute_statement.attributes {
        match attribute.key() {
            "RoleSessionName" => {
                assertion.role_session_name = attribute.first_value().map(|v| v.into());
            }
            "SessionDuration" => {
                if let Some(value) = attribute.first_value() {
                    let duration = i64::from_str(value).map_err(|_| {
                        ExchangeError::InvalidAssertion(format!(
                            "SessionDuration '{}' is not a number",
                            value
                        ))
                    })?;
                    assertion.session_duration = Some(duration);
                }
            }
            "Role" => {
                for value in &attribute.values {
                    if value.value.trim().is_empty() {
                        continue;
                    }
                    assertion.roles.push(Role::from_attribute_value(&value.value)?);
                }
            }
            _ => {}
        };
    }

    debug!(
        "parsed assertion with {} roles, session duration {:?}",
        assertion.roles.len(),
        assertion.session_duration
    );

    Ok(assertion)
}

/// Builds a minimal, unsigned SAML response containing the given role values.
#[cfg(test)]
pub(crate) fn encode_test_assertion(roles: &[&str], session_duration: Option<i64>) -> String {
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

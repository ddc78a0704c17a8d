//! Where HTTP response dumps go.
//!
//! Responses from the identity provider and the federation endpoint carry
//! passwords, session tokens and credentials. Every dump is redacted before it
//! reaches a sink.

use std::sync::{LazyLock, Mutex};

use regex::Regex;
use reqwest::header::HeaderMap;

const REDACTED: &str = "<redacted>";

const SECRET_HEADERS: &[&str] = &["authorization", "cookie", "set-cookie", "x-amz-security-token"];

pub trait DiagnosticSink: Send + Sync {
    fn record(&self, context: &str, dump: &str);
}

/// Sends dumps to the `log` facade at debug level.
pub struct LogSink;

impl DiagnosticSink for LogSink {
    fn record(&self, context: &str, dump: &str) {
        debug!("{}:\n{}", context, dump);
    }
}

/// Drops everything.
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn record(&self, _context: &str, _dump: &str) {}
}

/// Keeps dumps in memory so they can be inspected afterwards.
#[derive(Default)]
pub struct MemorySink {
    entries: Mutex<Vec<(String, String)>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<(String, String)> {
        match self.entries.lock() {
            Ok(entries) => entries.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl DiagnosticSink for MemorySink {
    fn record(&self, context: &str, dump: &str) {
        let mut entries = match self.entries.lock() {
            Ok(entries) => entries,
            Err(poisoned) => poisoned.into_inner(),
        };
        entries.push((context.into(), dump.into()));
    }
}

/// Patterns of secret values with their replacement. `{}` marks where the
/// placeholder goes.
const RULES: &[(&str, &str)] = &[
    // <SecretAccessKey>..</SecretAccessKey>
    (
        r"(?s)<(SecretAccessKey|SessionToken|SAMLAssertion)>.*?</(SecretAccessKey|SessionToken|SAMLAssertion)>",
        "<$1>{}</$2>",
    ),
    // "sessionToken": "..."
    (
        r#""(sessionToken|stateToken|password|passCode|id)"\s*:\s*"[^"]*""#,
        r#""$1": "{}""#,
    ),
    // SAMLAssertion=...&
    (r"(SAMLAssertion|SAMLResponse|password)=[^&\s]*", "$1={}"),
    // <input name="SAMLResponse" value="...">
    (
        r#"(name="SAMLResponse"[^>]*value=")[^"]*"|(value=")[^"]*"([^>]*name="SAMLResponse")"#,
        "$1$2{}\"$3",
    ),
];

static COMPILED_RULES: LazyLock<Result<Vec<(Regex, String)>, regex::Error>> = LazyLock::new(|| {
    RULES
        .iter()
        .map(|(pattern, replacement)| -> Result<(Regex, String), regex::Error> {
            Ok((Regex::new(pattern)?, replacement.replace("{}", REDACTED)))
        })
        .collect()
});

/// Replaces secret values in XML elements, JSON fields, form fields and HTML
/// inputs with a placeholder.
pub fn redact(body: &str) -> String {
    let rules = match COMPILED_RULES.as_ref() {
        Ok(rules) => rules,
        Err(e) => {
            error!("invalid redaction pattern: {}", e);
            return REDACTED.into();
        }
    };

    let mut out = body.to_string();
    for (re, replacement) in rules.iter() {
        out = re.replace_all(&out, replacement.as_str()).into_owned();
    }

    out
}

/// Formats status, headers and body of a response for a diagnostic sink.
pub fn dump_response(
    sink: &dyn DiagnosticSink,
    context: &str,
    status: u16,
    headers: &HeaderMap,
    body: &str,
) {
    let mut dump = format!("status={}\n", status);

    for (name, value) in headers.iter() {
        let value = match SECRET_HEADERS.contains(&name.as_str()) {
            true => REDACTED.to_string(),
            false => value.to_str().unwrap_or("<binary>").to_string(),
        };
        dump.push_str(&format!("{}={}\n", name, value));
    }

    dump.push('\n');
    dump.push_str(&redact(body));

    sink.record(context, &dump);
}

#[cfg(test)]
mod test {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn test_rules_compile_once() {
        let rules = COMPILED_RULES.as_ref().unwrap();
        assert_eq!(rules.len(), RULES.len());

        let body = r#"{"stateToken":"abc"}"#;
        assert_eq!(redact(body), redact(body));
        assert!(std::ptr::eq(rules, COMPILED_RULES.as_ref().unwrap()));
    }

    #[test]
    fn test_redact_sts_credentials() {
        let body = "<Credentials>
  <AccessKeyId>ASIAEXAMPLE</AccessKeyId>
  <SecretAccessKey>wJalrXUtnFEMI/K7MDENG</SecretAccessKey>
  <SessionToken>FwoGZXIvYXdzEBY
  aDP</SessionToken>
</Credentials>";
        let out = redact(body);

        assert!(out.contains("<AccessKeyId>ASIAEXAMPLE</AccessKeyId>"));
        assert!(out.contains("<SecretAccessKey><redacted></SecretAccessKey>"));
        assert!(out.contains("<SessionToken><redacted></SessionToken>"));
        assert!(!out.contains("wJalrXUtnFEMI"));
        assert!(!out.contains("FwoGZXIvYXdzEBY"));
    }

    #[test]
    fn test_redact_okta_json() {
        let body = r#"{"status":"SUCCESS","sessionToken": "20111abc","expiresAt":"2026-10-16"}"#;
        let out = redact(body);

        assert!(!out.contains("20111abc"));
        assert!(out.contains("\"status\":\"SUCCESS\""));
    }

    #[test]
    fn test_redact_saml_input() {
        let body = r#"<input type="hidden" name="SAMLResponse" value="PHNhbWxwOlJlc3BvbnNl"/>"#;
        let out = redact(body);

        assert!(!out.contains("PHNhbWxw"));
        assert!(out.contains("name=\"SAMLResponse\""));
    }

    #[test]
    fn test_dump_response_redacts_cookies() {
        let sink = MemorySink::new();
        let mut headers = HeaderMap::new();
        headers.insert("set-cookie", HeaderValue::from_static("sid=abc123"));
        headers.insert("content-type", HeaderValue::from_static("text/xml"));

        dump_response(&sink, "sts", 200, &headers, "<ok/>");

        let entries = sink.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].0, "sts");
        assert!(entries[0].1.contains("status=200"));
        assert!(entries[0].1.contains("content-type=text/xml"));
        assert!(entries[0].1.contains("set-cookie=<redacted>"));
        assert!(!entries[0].1.contains("abc123"));
    }
}

use std::collections::HashMap;

/// Factor types we can answer with a one time code, most preferred first.
const SUPPORTED_FACTORS: &[&str] = &["token:software:totp", "token:hotp", "token", "sms"];

#[derive(Deserialize, Debug, Clone)]
pub struct Factor {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "factorType")]
    pub factor_type: String,
    #[serde(default)]
    pub provider: String,
    #[serde(rename = "_links", default)]
    pub links: HashMap<String, Link>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct Link {
    pub href: String,
}

impl Factor {
    pub fn verify_link(&self) -> Option<&str> {
        self.links.get("verify").map(|l| l.href.as_str())
    }

    pub fn describe(&self) -> String {
        format!("{} - {}", self.provider, self.factor_type)
    }

    /// Okta only sends the code once the factor has been challenged.
    pub fn needs_challenge(&self) -> bool {
        self.factor_type == "sms"
    }
}

/// Picks the factor to verify. Authenticator codes win over SMS; push factors
/// are never picked.
pub fn select_factor(factors: &[Factor]) -> Option<&Factor> {
    for wanted in SUPPORTED_FACTORS {
        let found = factors
            .iter()
            .filter(|f| f.verify_link().is_some())
            .find(|f| f.factor_type == *wanted);

        if found.is_some() {
            return found;
        }
    }

    None
}

#[cfg(test)]
mod test {
    use super::*;

    fn factor(factor_type: &str, verify: bool) -> Factor {
        let mut links = HashMap::new();
        if verify {
            links.insert(
                "verify".to_string(),
                Link {
                    href: format!("https://acme.okta.com/api/v1/authn/factors/{}/verify", factor_type),
                },
            );
        }

        Factor {
            id: factor_type.into(),
            factor_type: factor_type.into(),
            provider: "OKTA".into(),
            links,
        }
    }

    #[test]
    fn test_prefers_totp() {
        let factors = vec![
            factor("push", true),
            factor("token:hotp", true),
            factor("token:software:totp", true),
        ];

        assert_eq!(select_factor(&factors).unwrap().factor_type, "token:software:totp");
    }

    #[test]
    fn test_skips_factors_without_verify_link() {
        let factors = vec![factor("token:software:totp", false), factor("token", true)];

        assert_eq!(select_factor(&factors).unwrap().factor_type, "token");
    }

    #[test]
    fn test_push_only() {
        assert!(select_factor(&[factor("push", true)]).is_none());
    }

    #[test]
    fn test_sms_after_code_factors() {
        let factors = vec![factor("push", true), factor("sms", true)];
        let selected = select_factor(&factors).unwrap();
        assert_eq!(selected.factor_type, "sms");
        assert!(selected.needs_challenge());

        let factors = vec![factor("sms", true), factor("token:hotp", true)];
        let selected = select_factor(&factors).unwrap();
        assert_eq!(selected.factor_type, "token:hotp");
        assert!(!selected.needs_challenge());
    }
}

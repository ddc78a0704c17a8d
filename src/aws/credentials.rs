use std::fmt;

use chrono::prelude::*;

/// Short lived credentials returned by the federation endpoint.
#[derive(Clone, PartialEq)]
pub struct TemporaryCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: String,
    pub expiration: DateTime<Utc>,
}

impl TemporaryCredentials {
    pub fn is_valid_at(&self, at: DateTime<Utc>) -> bool {
        self.expiration > at
    }

    pub fn expires_in(&self) -> chrono::Duration {
        self.expiration.signed_duration_since(Utc::now())
    }
}

impl fmt::Debug for TemporaryCredentials {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("TemporaryCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"********")
            .field("session_token", &"********")
            .field("expiration", &self.expiration)
            .finish()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn credentials(expiration: DateTime<Utc>) -> TemporaryCredentials {
        TemporaryCredentials {
            access_key_id: "ASIAEXAMPLE".into(),
            secret_access_key: "secret".into(),
            session_token: "token".into(),
            expiration,
        }
    }

    #[test]
    fn test_debug_hides_secrets() {
        let out = format!("{:?}", credentials(Utc::now()));

        assert!(out.contains("ASIAEXAMPLE"));
        assert!(!out.contains("secret\""));
        assert!(!out.contains("\"token\""));
    }

    #[test]
    fn test_is_valid_at() {
        let now = Utc::now();
        let c = credentials(now + chrono::Duration::minutes(5));

        assert!(c.is_valid_at(now));
        assert!(!c.is_valid_at(now + chrono::Duration::minutes(5)));
    }
}

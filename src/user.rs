use std::fmt;

const MASK: &str = "********";

/// Everything an identity provider needs to issue an assertion for one person,
/// plus the account (or role) the caller wants credentials for.
#[derive(Clone, Default)]
pub struct UserInfo {
    pub org: String,
    pub user: String,
    pub account: String,
    pub password: String,

    /// Echo the password while it is typed and show it in debug output.
    pub no_mask: bool,
}

impl UserInfo {
    pub fn new(org: &str, user: &str, account: &str, password: &str) -> Self {
        UserInfo {
            org: org.into(),
            user: user.into(),
            account: account.into(),
            password: password.into(),
            no_mask: false,
        }
    }

    /// Returns the name of the first required field that is empty.
    pub fn missing_field(&self) -> Option<&'static str> {
        if self.org.trim().is_empty() {
            return Some("org");
        }
        if self.user.trim().is_empty() {
            return Some("user");
        }

        None
    }
}

impl fmt::Debug for UserInfo {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let password = match self.no_mask {
            true => self.password.as_str(),
            false => MASK,
        };

        f.debug_struct("UserInfo")
            .field("org", &self.org)
            .field("user", &self.user)
            .field("account", &self.account)
            .field("password", &password)
            .field("no_mask", &self.no_mask)
            .finish()
    }
}

use crate::error::IdentityError;
use crate::user::UserInfo;

/// An identity provider that can issue a signed SAML assertion for a user.
///
/// Implementations return the assertion base64 encoded, exactly as the IdP
/// would post it to the service provider.
pub trait IdentityProvider {
    fn get_assertion(&self, user: &UserInfo) -> Result<String, IdentityError>;
}

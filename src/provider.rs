use crate::aws::credentials::TemporaryCredentials;
use crate::error::ExchangeError;
use crate::identity::IdentityProvider;
use crate::user::UserInfo;

/// A cloud provider that accepts SAML assertions in exchange for temporary
/// credentials.
pub trait ServiceProvider {
    fn get_credentials(
        &self,
        idp: &dyn IdentityProvider,
        user: &UserInfo,
    ) -> Result<TemporaryCredentials, ExchangeError>;
}

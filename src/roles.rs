use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::aws::fetch_assertion;
use crate::error::ExchangeError;
use crate::identity::IdentityProvider;
use crate::saml::Role;
use crate::user::UserInfo;

#[derive(Tabled)]
struct RoleRow<'a> {
    #[tabled(rename = "Account")]
    account_id: &'a str,
    #[tabled(rename = "Role")]
    resource: &'a str,
    #[tabled(rename = "Role ARN")]
    arn: &'a str,
    #[tabled(rename = "Principal ARN")]
    principal_arn: &'a str,
}

/// Every role the identity provider would let `user` assume.
pub fn list_roles(idp: &dyn IdentityProvider, user: &UserInfo) -> Result<Vec<Role>, ExchangeError> {
    let assertion = fetch_assertion(idp, user)?;

    Ok(assertion.roles)
}

pub fn render_table(roles: &[Role]) -> String {
    let rows = roles.iter().map(|r| RoleRow {
        account_id: &r.account_id,
        resource: r.resource(),
        arn: &r.arn,
        principal_arn: &r.principal_arn,
    });

    Table::new(rows).with(Style::sharp()).to_string()
}

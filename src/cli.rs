use clap::{Args, Parser, Subcommand};

use crate::print::OutputFormat;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Sets the level of verbosity (repeat for more)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Sets a custom config file
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<String>,

    /// Skip using the password manager (for unsupported platforms)
    #[arg(long, global = true)]
    pub skip_password_manager: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print temporary AWS credentials as shell exports
    Print(PrintArgs),

    /// List the roles your identity provider lets you assume
    Roles(LoginArgs),
}

#[derive(Args, Clone, Default)]
pub struct LoginArgs {
    /// Okta organization (the subdomain of okta.com)
    #[arg(long)]
    pub org: Option<String>,

    /// IDP Username
    #[arg(short, long)]
    pub user: Option<String>,

    /// IDP Password
    #[arg(short = 'P', long)]
    pub password: Option<String>,

    /// Show the password while typing it
    #[arg(long = "nomask")]
    pub no_mask: bool,

    /// Okta app link of the AWS app, skips app discovery
    #[arg(long)]
    pub app_link: Option<String>,

    /// MFA code, asked for when required and not given
    #[arg(short, long)]
    pub mfa: Option<String>,
}

#[derive(Args, Clone)]
pub struct PrintArgs {
    #[command(flatten)]
    pub login: LoginArgs,

    /// Account id, role name (role/dev) or role ARN to assume
    #[arg(short, long)]
    pub account: Option<String>,

    /// Shell dialect of the export statements
    #[arg(short, long, value_enum)]
    pub output: Option<OutputFormat>,

    /// Session duration in seconds
    #[arg(short = 'd', long)]
    pub duration: Option<i64>,

    /// STS endpoint to use
    #[arg(long)]
    pub sts_endpoint: Option<String>,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse_print() {
        let cli = Cli::try_parse_from([
            "bmx", "-vv", "print", "--org", "acme", "-u", "alice", "-a", "role/dev", "-o",
            "powershell", "--nomask",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Print(args) => {
                assert_eq!(args.login.org.as_deref(), Some("acme"));
                assert_eq!(args.login.user.as_deref(), Some("alice"));
                assert_eq!(args.account.as_deref(), Some("role/dev"));
                assert_eq!(args.output, Some(OutputFormat::Powershell));
                assert!(args.login.no_mask);
            }
            _ => panic!("expected print"),
        }
    }

    #[test]
    fn test_parse_roles() {
        let cli = Cli::try_parse_from(["bmx", "roles", "--org", "acme", "--skip-password-manager"])
            .unwrap();

        assert!(cli.skip_password_manager);
        assert!(matches!(cli.command, Commands::Roles(_)));
    }

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}

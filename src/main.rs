#[macro_use]
extern crate log;

use std::error::Error;
use std::io;
use std::process;
use std::sync::Arc;

use clap::Parser;
use crossterm::style::Stylize;
use reqwest::blocking::Client;
use url::Url;

use bmx::aws::sts::DEFAULT_STS_ENDPOINT;
use bmx::cli::{Cli, Commands, LoginArgs, PrintArgs};
use bmx::config::{self, Config};
use bmx::diagnostics::{DiagnosticSink, LogSink};
use bmx::okta::mfa::Factor;
use bmx::okta::OktaClient;
use bmx::print::{print, PrintOptions};
use bmx::{client, logging, roles, AwsServiceProvider, UserInfo};

fn main() {
    let cli = Cli::parse();

    if let Err(e) = logging::setup(cli.verbose) {
        eprintln!("could not set up logging: {}", e);
    }

    #[allow(deprecated)]
    openssl_probe::init_ssl_cert_env_vars();

    if let Err(e) = run(cli) {
        eprintln!("\n{}\n", e.to_string().red());
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let cfg = config::load_or_default(cli.config.as_deref())?;
    let http = client::get_proxied_client_builder()
        .timeout(cfg.timeout())
        .build()?;
    let diagnostics: Arc<dyn DiagnosticSink> = Arc::new(LogSink);

    match cli.command {
        Commands::Print(args) => {
            let user = resolve_user(&cfg, &args.login, cli.skip_password_manager)?;
            print_command(&cfg, args, user, http, diagnostics)
        }
        Commands::Roles(args) => {
            let user = resolve_user(&cfg, &args, cli.skip_password_manager)?;
            let okta = okta_client(&cfg, &args, http, diagnostics);

            let roles = roles::list_roles(&okta, &user)?;
            println!("{}", roles::render_table(&roles));
            Ok(())
        }
    }
}

fn print_command(
    cfg: &Config,
    args: PrintArgs,
    user: UserInfo,
    http: Client,
    diagnostics: Arc<dyn DiagnosticSink>,
) -> Result<(), Box<dyn Error>> {
    let endpoint = args
        .sts_endpoint
        .clone()
        .or_else(|| cfg.sts_endpoint.clone())
        .unwrap_or_else(|| DEFAULT_STS_ENDPOINT.into());
    let endpoint = Url::parse(&endpoint)?;

    let provider = AwsServiceProvider::with_client(http.clone(), endpoint, diagnostics.clone())
        .with_session_duration(args.duration.or(cfg.session_duration));
    let okta = okta_client(cfg, &args.login, http, diagnostics);

    let options = PrintOptions {
        org: user.org,
        user: user.user,
        account: args
            .account
            .or_else(|| cfg.account.clone())
            .unwrap_or_default(),
        no_mask: user.no_mask,
        password: user.password,
        format: args.output.or(cfg.output).unwrap_or_default(),
        provider: Some(Box::new(provider)),
    };

    print(&okta, options, &mut io::stdout().lock())?;
    Ok(())
}

fn okta_client(
    cfg: &Config,
    args: &LoginArgs,
    http: Client,
    diagnostics: Arc<dyn DiagnosticSink>,
) -> OktaClient {
    let mfa = args.mfa.clone();

    OktaClient::new(http, diagnostics)
        .with_app_link(args.app_link.clone().or_else(|| cfg.app_link.clone()))
        .with_mfa_prompt(Box::new(move |factor: &Factor| {
            mfa.clone().or_else(|| {
                config::prompt(&format!("MFA code ({})", factor.describe()), false, true)
            })
        }))
}

/// Flags win over the config file; whatever is still missing is asked for.
fn resolve_user(
    cfg: &Config,
    args: &LoginArgs,
    skip_password_manager: bool,
) -> Result<UserInfo, Box<dyn Error>> {
    let org = args
        .org
        .clone()
        .or_else(|| cfg.org.clone())
        .or_else(|| config::prompt("Okta organization", false, true))
        .ok_or("no Okta organization given")?;
    let user = args
        .user
        .clone()
        .or_else(|| cfg.user.clone())
        .or_else(|| config::prompt("Username", false, true))
        .ok_or("no username given")?;

    let password = match args.password {
        Some(ref p) => p.clone(),
        None => stored_password(&user, skip_password_manager)
            .or_else(|| config::prompt("Password", true, args.no_mask))
            .ok_or("no password given")?,
    };

    Ok(UserInfo {
        org,
        user,
        account: String::new(),
        password,
        no_mask: args.no_mask,
    })
}

fn stored_password(user: &str, skip_password_manager: bool) -> Option<String> {
    if skip_password_manager {
        return None;
    }

    match config::get_password(user) {
        Ok(p) => Some(p),
        Err(e) => {
            debug!("no password in keyring for {}: {}", user, e);
            None
        }
    }
}

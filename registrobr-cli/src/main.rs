//! registrobr command-line client
//!
//! Logs in, runs one command against the account's zones and logs out again,
//! whether or not the command succeeded.
//!
//! Exit codes: `0` success, `1` failure, `2` rejected one-time code.

mod args;
mod commands;
mod output;

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use dialoguer::{Input, Password};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use registrobr_core::{CoreError, ReconciliationService, ZoneRepository};
use registrobr_provider::{Credentials, OtpSource, ProviderError, Session, SessionConfig, StaticOtp};

use args::Cli;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            exit_code(&e)
        }
    }
}

/// Logs go to stderr; stdout carries command output only.
fn init_logging(verbose: bool) {
    let default = if verbose { "info" } else { "warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .without_time()
                .with_target(false),
        )
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .init();
}

fn exit_code(error: &anyhow::Error) -> ExitCode {
    let otp_failed = error.chain().any(|cause| {
        matches!(
            cause.downcast_ref::<CoreError>(),
            Some(CoreError::Provider(ProviderError::OtpFailed { .. }))
        ) || matches!(
            cause.downcast_ref::<ProviderError>(),
            Some(ProviderError::OtpFailed { .. })
        )
    });
    if otp_failed {
        ExitCode::from(2)
    } else {
        ExitCode::FAILURE
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = SessionConfig::default()
        .with_base_url(cli.base_url)
        .with_api_generation(cli.api.into());
    let session = Session::new(&config)?;
    let mut svc = ReconciliationService::new(ZoneRepository::new(session));

    let password = match cli.password {
        Some(password) => password,
        None => Password::new().with_prompt("Password").interact()?,
    };
    let credentials = Credentials::new(cli.user, password);

    let prompt_otp = || -> Option<String> {
        Input::<String>::new()
            .with_prompt("OTP")
            .interact_text()
            .ok()
    };
    let otp: Box<dyn OtpSource> = match cli.otp {
        Some(code) => Box::new(StaticOtp(Some(code))),
        None => Box::new(prompt_otp),
    };

    svc.repository_mut()
        .login(&credentials, otp.as_ref())
        .await?;
    tracing::info!("logged in");

    let result = commands::execute(&mut svc, cli.command, cli.json).await;

    if let Err(e) = svc.repository_mut().logout().await {
        tracing::warn!("logout failed: {e}");
    }
    result
}

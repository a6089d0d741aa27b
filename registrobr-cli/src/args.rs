//! Command-line argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};

use registrobr_provider::{ApiGeneration, DEFAULT_BASE_URL, RecordType};

/// Manage DNS zones hosted on registro.br
///
/// Logs in with your account, runs one command and logs out again.
#[derive(Parser, Debug)]
#[command(name = "registrobr")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Account user (CPF/CNPJ, handle or e-mail)
    #[arg(short, long, env = "REGISTROBR_USER")]
    pub user: String,

    /// Account password (prompted when absent)
    #[arg(short, long, env = "REGISTROBR_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// One-time code, used only if the account requires it (prompted when absent)
    #[arg(long, env = "REGISTROBR_OTP", hide_env_values = true)]
    pub otp: Option<String>,

    /// Registrar base URL
    #[arg(long, env = "REGISTROBR_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Anti-forgery scheme of the login page
    #[arg(long, value_enum, default_value_t = Generation::RequestToken)]
    pub api: Generation,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,

    /// Increase verbosity
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the account's domains
    Domains,

    /// Show the records of a domain
    ZoneInfo {
        /// Domain name (e.g., example.com.br)
        domain: String,
    },

    /// Add one record and save
    AddRecord {
        /// Domain name (e.g., example.com.br)
        domain: String,

        /// Record type: A, AAAA, CNAME, TXT, MX or TLSA
        #[arg(value_parser = parse_record_type)]
        record_type: RecordType,

        /// Owner name relative to the zone ("" for the apex)
        ownername: String,

        /// Value, laid out as the registrar expects
        /// (e.g., "10 mail.example.com.br" for MX, "3 1 1 <hex>" for TLSA)
        value: String,

        /// Show what would be submitted without saving
        #[arg(long)]
        dry_run: bool,
    },

    /// Delete the record at INDEX (as shown by zone-info) and save
    DeleteRecord {
        /// Domain name (e.g., example.com.br)
        domain: String,

        /// Record index
        index: usize,

        /// Show what would be submitted without saving
        #[arg(long)]
        dry_run: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Generation {
    /// `request-token` element, `Request-Token` header
    RequestToken,
    /// `XSRF-TOKEN` cookie, `X-XSRF-TOKEN` header
    Xsrf,
}

impl From<Generation> for ApiGeneration {
    fn from(value: Generation) -> Self {
        match value {
            Generation::RequestToken => Self::RequestToken,
            Generation::Xsrf => Self::Xsrf,
        }
    }
}

fn parse_record_type(s: &str) -> Result<RecordType, String> {
    s.parse().map_err(|e: registrobr_provider::ProviderError| e.to_string())
}

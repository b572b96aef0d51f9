//! Command-line arguments.
//!
//! Every session setting can also come from a `TOLLGATE_*` environment
//! variable.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tollgate_domain::{HttpMethod, SessionConfig};

/// Bearer-session client.
#[derive(Debug, Parser)]
#[command(name = "tollgate", version, about)]
pub struct Cli {
    #[command(flatten)]
    pub session: SessionArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Where the backend lives and how sessions behave.
#[derive(Debug, Args)]
pub struct SessionArgs {
    /// Base URL request paths are appended to.
    #[arg(long, env = "TOLLGATE_BASE_URL", default_value = "http://localhost:8000")]
    pub base_url: String,

    /// Path of the token refresh endpoint.
    #[arg(long, env = "TOLLGATE_REFRESH_PATH", default_value = "/auth/refresh")]
    pub refresh_path: String,

    /// Prefix of authentication endpoints.
    #[arg(long, env = "TOLLGATE_AUTH_PREFIX", default_value = "/auth")]
    pub auth_prefix: String,

    /// Comma-separated path prefixes that use the admin token.
    #[arg(
        long,
        env = "TOLLGATE_ADMIN_PREFIXES",
        value_delimiter = ',',
        default_value = "/admin"
    )]
    pub admin_prefixes: Vec<String>,

    /// Where an ended regular session is sent.
    #[arg(long, env = "TOLLGATE_SIGN_IN_PATH", default_value = "/login")]
    pub sign_in_path: String,

    /// Where an ended admin session is sent.
    #[arg(long, env = "TOLLGATE_ADMIN_SIGN_IN_PATH", default_value = "/admin/login")]
    pub admin_sign_in_path: String,

    /// Per-request timeout in milliseconds.
    #[arg(long, env = "TOLLGATE_TIMEOUT_MS", default_value = "30000")]
    pub timeout_ms: u64,

    /// Token file; tokens are kept in memory only when unset.
    #[arg(long, env = "TOLLGATE_TOKEN_FILE")]
    pub token_file: Option<PathBuf>,
}

impl SessionArgs {
    /// Converts the arguments into a session configuration.
    #[must_use]
    pub fn into_config(self) -> SessionConfig {
        SessionConfig {
            base_url: self.base_url,
            refresh_path: self.refresh_path,
            auth_prefix: self.auth_prefix,
            admin_prefixes: self
                .admin_prefixes
                .into_iter()
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty())
                .collect(),
            sign_in_path: self.sign_in_path,
            admin_sign_in_path: self.admin_sign_in_path,
            request_timeout_ms: self.timeout_ms,
            token_file: self.token_file,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the token pair issued at sign-in.
    SignIn {
        access_token: String,
        /// Omit for a session that cannot be renewed.
        refresh_token: Option<String>,
    },
    /// Store the administrative token.
    AdminSignIn { token: String },
    /// Forget stored tokens.
    SignOut {
        /// Forget the administrative token instead of the regular pair.
        #[arg(long)]
        admin: bool,
    },
    /// Show which tokens are stored.
    Status,
    /// Send a request through the session pipeline.
    Send {
        method: HttpMethod,
        path: String,
        /// JSON request body.
        #[arg(long)]
        json: Option<String>,
    },
}

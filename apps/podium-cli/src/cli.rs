//! Command-line arguments.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use podium::prelude::*;

#[derive(Parser, Debug)]
#[command(
    name = "podium",
    version,
    about = "Talk to the Olympic Games back-office API as a signed-in administrator"
)]
pub struct Args {
    /// Base URL of the back-office API
    #[arg(long, env = "PODIUM_API_URL")]
    pub api_url: String,

    /// Storage key for the access token
    #[arg(long, env = "PODIUM_AUTH_TOKEN_KEY")]
    pub token_key: String,

    /// Storage key for the refresh token
    #[arg(long, env = "PODIUM_AUTH_REFRESH_TOKEN_KEY")]
    pub refresh_token_key: String,

    /// JSON file holding tokens and operator details between runs
    #[arg(long, env = "PODIUM_STATE_FILE", default_value = ".podium/state.json")]
    pub state_file: PathBuf,

    /// Share one token refresh between concurrent requests
    #[arg(long)]
    pub coalesce_refresh: bool,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, default_value = "warn")]
    pub log: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Sign in as an administrator
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "PODIUM_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Forget the stored session
    Logout,
    /// Print the signed-in operator
    Whoami,
    /// Print session and token state
    Status,
    /// Send a request through the authenticated client and print the JSON answer
    Request {
        /// HTTP method, e.g. GET or POST
        method: String,
        /// Endpoint relative to the API URL, e.g. /epreuves/
        endpoint: String,
        /// JSON request body
        #[arg(long)]
        body: Option<String>,
        /// Send without the bearer token (no refresh on 401)
        #[arg(long)]
        no_auth: bool,
    },
}

impl Args {
    pub fn client_config(&self) -> Result<ClientConfig, PodiumError> {
        let config = ClientConfig::new(&self.api_url, &self.token_key, &self.refresh_token_key)?
            .with_coalesced_refresh(self.coalesce_refresh);
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REQUIRED: [&str; 7] = [
        "podium",
        "--api-url",
        "https://api.test",
        "--token-key",
        "auth_token",
        "--refresh-token-key",
        "auth_refresh_token",
    ];

    fn parse(extra: &[&str]) -> Args {
        Args::try_parse_from(REQUIRED.iter().chain(extra).copied()).unwrap()
    }

    #[test]
    fn test_parse_request_command() {
        let args = parse(&["request", "POST", "/lieux/", "--body", r#"{"nom":"Bercy"}"#]);

        let Command::Request {
            method,
            endpoint,
            body,
            no_auth,
        } = args.command
        else {
            panic!("expected request command");
        };
        assert_eq!(method, "POST");
        assert_eq!(endpoint, "/lieux/");
        assert_eq!(body.as_deref(), Some(r#"{"nom":"Bercy"}"#));
        assert!(!no_auth);
    }

    #[test]
    fn test_state_file_defaults_under_dot_podium() {
        let args = parse(&["status"]);
        assert_eq!(args.state_file, PathBuf::from(".podium/state.json"));
    }

    #[test]
    fn test_client_config_rejects_bad_url() {
        let mut args = parse(&["whoami"]);
        args.api_url = "ftp://api.test".into();
        assert!(matches!(args.client_config(), Err(PodiumError::Config(_))));
    }
}

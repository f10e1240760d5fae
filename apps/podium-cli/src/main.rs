//! `podium`: the back-office API from a terminal.
//!
//! Tokens and operator details persist in a JSON state file, so a
//! `podium login` is reused by later commands until the server stops
//! honouring the refresh token.

mod cli;

use anyhow::{Context, bail};
use clap::Parser;
use podium::prelude::*;
use podium::store::jwt;
use podium::transport::Method;
use serde_json::Value;

use crate::cli::{Args, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(&args.log);

    let app = Podium::builder()
        .config(args.client_config()?)
        .storage(FileStorage::new(&args.state_file))
        .build()?;
    tracing::debug!(state_file = %args.state_file.display(), "state file");

    match args.command {
        Command::Login { email, password } => login(&app, &email, &password).await,
        Command::Logout => {
            app.session().logout();
            println!("Signed out.");
            Ok(())
        }
        Command::Whoami => whoami(&app).await,
        Command::Status => status(&app),
        Command::Request {
            method,
            endpoint,
            body,
            no_auth,
        } => request(&app, &method, &endpoint, body.as_deref(), !no_auth).await,
    }
}

async fn login(app: &Podium, email: &str, password: &str) -> anyhow::Result<()> {
    app.start().await;
    let outcome = app.session().login(email, password).await?;
    println!("Signed in as {}.", outcome.user);
    Ok(())
}

async fn whoami(app: &Podium) -> anyhow::Result<()> {
    app.start().await;
    match app.session().guard() {
        GuardDecision::Allow(user) => {
            println!("{user}");
            Ok(())
        }
        _ => bail!("not signed in, run `podium login`"),
    }
}

/// Reports what the state file holds. Read-only: no refresh is attempted
/// and nothing is cleared, so an expired session is shown as such.
fn status(app: &Podium) -> anyhow::Result<()> {
    for line in status_lines(app, jwt::now_secs()) {
        println!("{line}");
    }
    Ok(())
}

fn status_lines(app: &Podium, now: u64) -> Vec<String> {
    let tokens = app.tokens();
    let access = tokens.access_token();

    let session = match (&access, app.users().load()) {
        (None, _) => "signed out",
        (Some(token), Some(user)) if user.is_admin() && !jwt::is_expired_at(token, now) => {
            "signed in"
        }
        (Some(_), Some(user)) if user.is_admin() => "expired (next command will try a refresh)",
        (Some(_), _) => "incomplete (no administrator stored)",
    };
    let operator = app
        .users()
        .load()
        .map(|user| user.to_string())
        .unwrap_or_else(|| "-".to_string());
    let access = match access {
        Some(token) => {
            let expiry = match jwt::inspect_expiry(&token) {
                Some(exp) if now >= exp => format!("expired {}s ago", now - exp),
                Some(exp) => format!("expires in {}s", exp - now),
                None => "expiry unknown".to_string(),
            };
            format!("present ({expiry})")
        }
        None => "-".to_string(),
    };
    let refresh = if tokens.refresh_token().is_some() { "present" } else { "-" };

    vec![
        format!("session:        {session}"),
        format!("operator:       {operator}"),
        format!("access token:   {access}"),
        format!("refresh token:  {refresh}"),
        format!("api:            {}", app.config().base_url),
    ]
}

async fn request(
    app: &Podium,
    method: &str,
    endpoint: &str,
    body: Option<&str>,
    requires_auth: bool,
) -> anyhow::Result<()> {
    let method = Method::from_bytes(method.to_ascii_uppercase().as_bytes())
        .with_context(|| format!("invalid HTTP method {method:?}"))?;
    let mut options = RequestOptions::new(method);
    if let Some(body) = body {
        let json: Value = serde_json::from_str(body).context("--body is not valid JSON")?;
        options = options.json(&json)?;
    }

    if requires_auth {
        app.start().await;
    }
    let response: Value = match app.api().fetch_api(endpoint, &options, requires_auth).await {
        Ok(value) => value,
        Err(err) if err.is_session_expired() => {
            bail!("session expired, run `podium login` again")
        }
        Err(err) => return Err(err.into()),
    };

    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

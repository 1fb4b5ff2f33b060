//! Auth command implementations.

use chrono::{DateTime, Utc};
use colored::Colorize;
use serde::Serialize;
use tracing::warn;

use super::print_json;
use crate::backend::{self, AuthSession};
use crate::cli::{AuthCommands, Context};
use crate::config::{clear_session, read_session, write_session, StoredSession};
use crate::error::{Error, Result};
use crate::sync::account;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SessionOutput<'a> {
    authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    email: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    backend_url: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    expires_at: Option<DateTime<Utc>>,
}

impl<'a> SessionOutput<'a> {
    fn from_stored(stored: Option<&'a StoredSession>) -> Self {
        Self {
            authenticated: stored.is_some(),
            email: stored.map(|s| s.session.email.as_str()),
            user_id: stored.map(|s| s.session.user_id.as_str()),
            backend_url: stored.map(|s| s.backend_url.as_str()),
            expires_at: stored.and_then(|s| s.session.expires_at),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SignOutOutput {
    signed_out: bool,
}

/// Execute auth commands.
///
/// # Errors
///
/// Returns an error if no backend is configured, credentials are
/// rejected, or the session file cannot be written.
pub fn execute(command: &AuthCommands, ctx: &Context, json: bool) -> Result<()> {
    match command {
        AuthCommands::SignIn { email, password } => {
            authenticate(ctx, json, |backend| account::sign_in(backend, email, password))
        }
        AuthCommands::SignUp { email, password } => {
            authenticate(ctx, json, |backend| account::sign_up(backend, email, password))
        }
        AuthCommands::SignOut => sign_out(ctx, json),
        AuthCommands::Whoami => {
            let stored = read_session(&ctx.config.home);
            let output = SessionOutput::from_stored(stored.as_ref());
            if json {
                return print_json(&output);
            }
            match stored {
                Some(stored) => {
                    println!("Signed in as {}", stored.session.email.bold());
                    println!("  Backend: {}", stored.backend_url);
                    println!("  User:    {}", stored.session.user_id.dimmed());
                }
                None => println!("Not signed in. Using the local planner."),
            }
            Ok(())
        }
    }
}

fn authenticate<F>(ctx: &Context, json: bool, call: F) -> Result<()>
where
    F: FnOnce(&dyn backend::Backend) -> Result<AuthSession>,
{
    let url = ctx.config.backend_url.as_deref().ok_or_else(|| {
        Error::Config("No backend configured. Pass --backend-url or set OPERATOR_BACKEND_URL".into())
    })?;
    let backend = backend::open(url, ctx.config.anon_key.as_deref())?;
    let session = call(&*backend)?;

    let stored = StoredSession {
        backend_url: url.to_string(),
        session,
    };
    write_session(&ctx.config.home, &stored)?;

    if json {
        return print_json(&SessionOutput::from_stored(Some(&stored)));
    }
    println!("{} as {}", "Signed in".green(), stored.session.email.bold());
    println!("Your planner now syncs with {url}.");
    Ok(())
}

fn sign_out(ctx: &Context, json: bool) -> Result<()> {
    if let Some(stored) = read_session(&ctx.config.home) {
        let ended = backend::open(&stored.backend_url, ctx.config.anon_key.as_deref())
            .and_then(|backend| account::sign_out(&*backend, &stored.session));
        if let Err(e) = ended {
            warn!(error = %e, "Backend sign-out failed; clearing local session anyway");
        }
    }

    let signed_out = clear_session(&ctx.config.home)?;
    if json {
        return print_json(&SignOutOutput { signed_out });
    }
    if signed_out {
        println!("Signed out. Using the local planner.");
    } else {
        println!("Not signed in.");
    }
    Ok(())
}

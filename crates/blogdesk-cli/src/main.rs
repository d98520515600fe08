//! blogdesk - sign in to a blog backend from the terminal.
//!
//! A thin front end over `blogdesk-core`: it wires the services once, runs a
//! single command against them, and prints any toasts and forced redirects
//! the command produced.

use std::io;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use blogdesk_core::{AppContext, Config, LoggingNavigator, ToastKind, ToastQueue};

// ============================================================================
// Constants
// ============================================================================

/// When set, logs are also written to a daily rolling file in this directory
const ENV_LOG_DIR: &str = "BLOGDESK_LOG_DIR";

const USAGE: &str = "\
Usage: blogdesk <command> [args]

Commands:
  login [username]                 Sign in and store the session token
  logout                           Forget the stored session token
  status                           Show whether a session token is stored
  profile                          Fetch and show the signed-in profile
  register <username> <email>      Create the author account
  registration-status              Show whether registration is open
  help                             Show this message";

/// Initialize the tracing subscriber for logging.
///
/// The returned guard must stay alive for the file writer to flush.
fn init_tracing() -> Option<tracing_appender::non_blocking::WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match std::env::var(ENV_LOG_DIR) {
        Ok(dir) if !dir.is_empty() => {
            let appender = tracing_appender::rolling::daily(dir, "blogdesk.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(fmt::layer().with_ansi(false).with_writer(writer)), Some(guard))
        }
        _ => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let _log_guard = init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(command) = args.first() else {
        println!("{}", USAGE);
        return Ok(ExitCode::SUCCESS);
    };
    if command == "help" || command == "--help" || command == "-h" {
        println!("{}", USAGE);
        return Ok(ExitCode::SUCCESS);
    }

    let config = Config::load()?;
    let navigator = Arc::new(LoggingNavigator::new());
    let ctx = AppContext::from_config(config, navigator.clone())?;
    info!(base_url = %ctx.config.base_url, command = %command, "blogdesk starting");

    let result = match command.as_str() {
        "login" => login(&ctx, args.get(1).cloned()).await,
        "logout" => logout(&ctx),
        "status" => status(&ctx),
        "profile" => profile(&ctx).await,
        "register" => register(&ctx, &args[1..]).await,
        "registration-status" => registration_status(&ctx).await,
        other => {
            eprintln!("{}", USAGE);
            Err(anyhow::anyhow!("Unknown command: {}", other))
        }
    };

    // Failures are reported as toasts like everything else
    if let Err(ref e) = result {
        ctx.toasts.error(format!("{:#}", e));
    }
    print_toasts(&ctx.toasts);

    if let Some(path) = navigator.take_pending() {
        eprintln!("Session expired ({}). Run `blogdesk login` to sign in again.", path);
    }

    Ok(if result.is_ok() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Print the toasts still visible at the end of a command
fn print_toasts(toasts: &ToastQueue) {
    for toast in toasts.toasts() {
        let marker = match toast.kind {
            ToastKind::Success => "✓",
            ToastKind::Error => "✗",
            ToastKind::Info => "•",
        };
        eprintln!("{} {}", marker, toast.message);
    }
}

async fn login(ctx: &AppContext, username: Option<String>) -> Result<()> {
    let username = match username.or_else(|| ctx.config.last_username.clone()) {
        Some(name) if !name.trim().is_empty() => name.trim().to_string(),
        _ => prompt_line("Username: ")?,
    };
    let password = rpassword::prompt_password(format!("Password for {}: ", username))
        .context("Failed to read password")?;

    ctx.session
        .login(&username, &password)
        .await
        .context("Login failed")?;

    if let Err(e) = Config::remember_username(&username) {
        warn!(error = %e, "Failed to remember username");
    }

    ctx.toasts.success(format!("Signed in as {}", username));
    Ok(())
}

fn logout(ctx: &AppContext) -> Result<()> {
    let was_authenticated = ctx.session.is_authenticated();
    ctx.session.logout();
    if was_authenticated {
        ctx.toasts.success("Signed out");
    } else {
        ctx.toasts.info("No session to sign out of");
    }
    Ok(())
}

fn status(ctx: &AppContext) -> Result<()> {
    if ctx.session.is_authenticated() {
        println!("Signed in (token stored) against {}", ctx.config.base_url);
    } else {
        println!("Not signed in");
    }
    Ok(())
}

async fn profile(ctx: &AppContext) -> Result<()> {
    if !ctx.session.is_authenticated() {
        bail!("Not signed in. Run `blogdesk login` first.");
    }
    let profile = ctx
        .session
        .fetch_profile()
        .await
        .context("Failed to fetch profile")?;

    println!("{} <{}>", profile.display_name(), profile.email);
    if !profile.bio.is_empty() {
        println!("{}", profile.bio);
    }
    if let Some(created) = profile.created_at {
        println!("Member since {}", created.format("%Y-%m-%d"));
    }
    Ok(())
}

async fn register(ctx: &AppContext, args: &[String]) -> Result<()> {
    let (username, email) = match args {
        [username, email, ..] => (username.as_str(), email.as_str()),
        _ => bail!("Usage: blogdesk register <username> <email>"),
    };
    let password = rpassword::prompt_password("Choose a password: ")
        .context("Failed to read password")?;
    let confirm = rpassword::prompt_password("Repeat password: ")
        .context("Failed to read password")?;
    if password != confirm {
        bail!("Passwords do not match");
    }

    let message = ctx
        .session
        .register(username, email, &password)
        .await
        .context("Registration failed")?;
    ctx.toasts.success(message);
    ctx.toasts.info("Run `blogdesk login` to sign in");
    Ok(())
}

async fn registration_status(ctx: &AppContext) -> Result<()> {
    let status = ctx
        .session
        .registration_status()
        .await
        .context("Failed to fetch registration status")?;
    if status.registration_allowed {
        println!("Registration is open");
    } else {
        println!("Registration is closed ({} account(s))", status.user_count);
    }
    Ok(())
}

fn prompt_line(prompt: &str) -> Result<String> {
    use std::io::Write;

    eprint!("{}", prompt);
    io::stderr().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    let line = line.trim().to_string();
    if line.is_empty() {
        bail!("Username is required");
    }
    Ok(line)
}

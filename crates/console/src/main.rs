use std::io::BufRead;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::json;

use campus_auth::{AccessRequest, AuthError, Capability, LandingPolicy, Module};
use campus_console::Console;
use campus_infra::{default_session_path, FileSessionStore};
use campus_observability::LogFormat;

#[derive(Parser)]
#[command(name = "campus", version, about = "Sign in to campus modules and check access")]
struct Cli {
    /// Base URL of the campus-api server.
    #[arg(long, env = "CAMPUS_API_URL", default_value = "http://127.0.0.1:8080")]
    api_url: String,

    /// Where the session survives between invocations.
    #[arg(long, env = "CAMPUS_SESSION_FILE")]
    session_file: Option<PathBuf>,

    /// Landing module when nothing else applies.
    #[arg(long, env = "CAMPUS_FALLBACK_MODULE")]
    fallback_module: Option<Module>,

    #[arg(long, env = "CAMPUS_LOG_FORMAT", default_value = "compact")]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Sign in to a module.
    Login {
        username: String,
        module: String,
        /// Read from stdin when omitted.
        #[arg(long, env = "CAMPUS_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// End the session and revoke its token.
    Logout,
    /// Show the current session.
    Status,
    /// Change the active module.
    Switch { module: Module },
    /// Explain whether a resource may be opened.
    Check {
        #[arg(long)]
        module: Option<Module>,
        #[arg(long, default_value = "read")]
        capability: String,
        #[arg(long, default_value = "/")]
        path: String,
    },
    /// Print the module to open after startup.
    Landing,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    campus_observability::init_with(cli.log_format, "warn");

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let session_file = match cli.session_file {
        Some(path) => path,
        None => default_session_path()?,
    };
    let landing = cli.fallback_module.map(LandingPolicy::new).unwrap_or_default();
    let console = Console::connect(&cli.api_url, Arc::new(FileSessionStore::new(session_file)), landing);

    // A stale session only matters to commands that read it.
    if let Some(err) = console.start().await {
        tracing::info!(error = %err, "starting without a session");
    }

    let code = match cli.command {
        Command::Login {
            username,
            module,
            password,
        } => {
            let password = match password {
                Some(p) => p,
                None => read_password()?,
            };
            emit(console.login(&username, &password, &module).await)?
        }
        Command::Logout => print_json(&console.logout().await)?,
        Command::Status => print_json(&console.status())?,
        Command::Switch { module } => emit(console.switch(module))?,
        Command::Check {
            module,
            capability,
            path,
        } => {
            let mut request =
                AccessRequest::new(path).with_capability(Capability::new(capability.trim().to_ascii_lowercase()));
            request.module = module;
            print_json(&console.check(&request))?
        }
        Command::Landing => print_json(&json!({ "landing_module": console.landing() }))?,
    };
    Ok(code)
}

fn read_password() -> anyhow::Result<String> {
    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .context("failed to read password from stdin")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

fn emit<T: Serialize>(result: Result<T, AuthError>) -> anyhow::Result<ExitCode> {
    match result {
        Ok(value) => print_json(&value),
        Err(err) => {
            let body = json!({ "error": err.code(), "message": err.to_string() });
            println!("{}", serde_json::to_string_pretty(&body)?);
            Ok(ExitCode::FAILURE)
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<ExitCode> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(ExitCode::SUCCESS)
}

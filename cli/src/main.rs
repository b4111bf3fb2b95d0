mod api;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use reqwest::Method;
use serde_json::Value;
use storefront::{Decision, FileStorage, Locale, Requirement, Role, SessionStore, UserPatch, UserType, authorize};

use crate::api::{ApiClient, Credentials, Registration};

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(String),
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("invalid header value: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("not logged in")]
    NotLoggedIn,
    #[error("session expired; log in again at {login_path}")]
    SessionExpired { login_path: String },
    #[error("server answered {status}: {message}")]
    Rejected { status: u16, message: String },
}

#[derive(Parser, Debug)]
#[command(name = "storefront-cli", about = "Storefront session and API CLI")]
struct Cli {
    #[arg(long, env = "STOREFRONT_BASE_URL", default_value = "http://127.0.0.1:3000")]
    base_url: String,

    /// Directory holding the persisted session.
    #[arg(long, env = "STOREFRONT_STATE_DIR", default_value = ".storefront")]
    state_dir: PathBuf,

    #[arg(long, env = "STOREFRONT_LOCALE", default_value_t = Locale::Vi)]
    locale: Locale,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "STOREFRONT_PASSWORD")]
        password: String,
    },
    Register(RegisterArgs),
    Logout,
    /// Show the stored session; `--refresh` asks the server first.
    Whoami {
        #[arg(long, default_value_t = false)]
        refresh: bool,
    },
    /// Change the display name of the stored user.
    SetName { name: String },
    /// Exit 0 if the stored session satisfies every given constraint, 1 otherwise.
    Can(CanArgs),
    /// Authenticated request to an `/api` path.
    Request {
        method: Method,
        path: String,
        #[arg(long)]
        data: Option<String>,
    },
}

#[derive(Args, Debug)]
struct RegisterArgs {
    #[arg(long)]
    email: String,
    #[arg(long, env = "STOREFRONT_PASSWORD")]
    password: String,
    #[arg(long)]
    full_name: Option<String>,
    #[arg(long)]
    user_type: Option<UserType>,
    #[arg(long)]
    company_name: Option<String>,
}

#[derive(Args, Debug)]
struct CanArgs {
    #[arg(long)]
    user_type: Option<UserType>,
    #[arg(long)]
    role: Option<Role>,
    #[arg(long)]
    capability: Option<String>,
}

impl CanArgs {
    fn requirement(self) -> Requirement {
        Requirement { user_type: self.user_type, role: self.role, capability: self.capability }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode, CliError> {
    let client = ApiClient::new(&cli.base_url, cli.locale)?;
    let mut store = SessionStore::open(FileStorage::new(cli.state_dir));

    match cli.command {
        Command::Login { email, password } => {
            client.login(&mut store, &Credentials { email: &email, password: &password }).await?;
            print_session(&store)?;
        }
        Command::Register(args) => {
            let registration = Registration {
                email: &args.email,
                password: &args.password,
                full_name: args.full_name.as_deref(),
                user_type: args.user_type,
                company_name: args.company_name.as_deref(),
            };
            if let Some(message) = client.register(&mut store, &registration).await? {
                println!("{message}");
            }
            if store.is_authenticated() {
                print_session(&store)?;
            }
        }
        Command::Logout => {
            client.logout(&mut store).await;
            println!("logged out");
        }
        Command::Whoami { refresh } => {
            if refresh {
                client.refresh(&mut store).await?;
            }
            if !store.is_authenticated() {
                return Err(CliError::NotLoggedIn);
            }
            print_session(&store)?;
        }
        Command::SetName { name } => {
            if !store.is_authenticated() {
                return Err(CliError::NotLoggedIn);
            }
            store.update_user(UserPatch::full_name(name));
            print_session(&store)?;
        }
        Command::Can(args) => {
            return Ok(match authorize(store.session(), &args.requirement()) {
                Decision::Granted => {
                    println!("granted");
                    ExitCode::SUCCESS
                }
                Decision::Denied(denial) => {
                    println!("denied: {denial:?}");
                    ExitCode::from(1)
                }
            });
        }
        Command::Request { method, path, data } => {
            let body = data.as_deref().map(serde_json::from_str::<Value>).transpose()?;
            let json = client.request(&mut store, method, &api_path(&path), body.as_ref()).await?;
            print_json(&json)?;
        }
    }
    Ok(ExitCode::SUCCESS)
}

/// Relative paths are resolved under `/api`.
fn api_path(path: &str) -> String {
    let path = path.trim_start_matches('/');
    if path == "api" || path.starts_with("api/") {
        format!("/{path}")
    } else {
        format!("/api/{path}")
    }
}

fn print_session<S: storefront::SessionStorage>(store: &SessionStore<S>) -> Result<(), CliError> {
    let Some(user) = store.user() else {
        return Err(CliError::NotLoggedIn);
    };
    print_json(&serde_json::to_value(user)?)
}

fn print_json(value: &Value) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}

#[cfg(test)]
#[path = "main_test.rs"]
mod tests;

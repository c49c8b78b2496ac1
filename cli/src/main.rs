mod navigator;

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use serde_json::{Value, json};
use storefront::guard::RouteClass;
use storefront::token::{TokenKind, decode_claims};
use storefront::{ApiRequest, ClientConfig, Decision, Navigator, RegisterOutcome, RegisterRequest, Storefront};

use crate::navigator::FileNavigator;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] storefront::ConfigError),
    #[error(transparent)]
    Api(#[from] storefront::ApiError),
    #[error("invalid HTTP method: {0}")]
    InvalidMethod(String),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "storefront", about = "Storefront account session CLI")]
struct Cli {
    /// API base URL; overrides the `STOREFRONT_API_URL` default.
    #[arg(long, env = "STOREFRONT_API_URL")]
    api_url: Option<String>,

    #[arg(long, env = "STOREFRONT_TOKEN_FILE")]
    token_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Login(LoginArgs),
    Register(RegisterArgs),
    Logout,
    /// Fetch the signed-in user from the server.
    Whoami,
    /// Show local session state without touching the network.
    Status,
    /// Check a path against the route guard, following any redirect.
    Guard {
        path: String,
        /// Also move to `path` when access is allowed.
        #[arg(long, default_value_t = false)]
        navigate: bool,
    },
    /// Authenticated API request through the refresh layer.
    Api {
        method: String,
        path: String,
        #[arg(long)]
        data: Option<String>,
    },
    ForgotPassword {
        email: String,
    },
    ResetPassword {
        token: String,
        #[arg(long, env = "STOREFRONT_PASSWORD")]
        password: String,
    },
    VerifyEmail {
        token: String,
    },
    ResendVerification {
        email: String,
    },
}

#[derive(Args, Debug)]
struct LoginArgs {
    email: String,
    #[arg(long, env = "STOREFRONT_PASSWORD")]
    password: String,
    #[arg(long, default_value_t = false)]
    remember_me: bool,
}

#[derive(Args, Debug)]
struct RegisterArgs {
    email: String,
    #[arg(long, env = "STOREFRONT_PASSWORD")]
    password: String,
    #[arg(long)]
    first_name: String,
    #[arg(long)]
    last_name: String,
    #[arg(long)]
    phone: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let mut config = ClientConfig::from_env()?;
    if let Some(api_url) = &cli.api_url {
        config = config.with_api_url(api_url);
    }
    if let Some(token_file) = cli.token_file {
        config = config.with_token_file(token_file);
    }
    let navigator = Arc::new(FileNavigator::beside(&config.token_file));
    let app = Storefront::from_config(&config, navigator.clone())?;

    match cli.command {
        Command::Login(args) => run_login(&app, args).await,
        Command::Register(args) => run_register(&app, args).await,
        Command::Logout => {
            app.flows.logout().await;
            println!("signed out");
            Ok(())
        }
        Command::Whoami => {
            let user = app.flows.refresh_profile().await?;
            print_json(&serde_json::to_value(user)?)
        }
        Command::Status => run_status(&app, navigator.as_ref()),
        Command::Guard { path, navigate } => run_guard(&app, &path, navigate).await,
        Command::Api { method, path, data } => run_api(&app, &method, &path, data.as_deref()).await,
        Command::ForgotPassword { email } => {
            app.flows.forgot_password(&email).await?;
            println!("reset instructions sent to {email}");
            Ok(())
        }
        Command::ResetPassword { token, password } => {
            app.flows.reset_password(&token, &password).await?;
            println!("password updated");
            Ok(())
        }
        Command::VerifyEmail { token } => {
            app.flows.verify_email(&token).await?;
            println!("email verified");
            Ok(())
        }
        Command::ResendVerification { email } => {
            app.flows.resend_verification(&email).await?;
            println!("verification email sent to {email}");
            Ok(())
        }
    }
}

async fn run_login(app: &Storefront, args: LoginArgs) -> Result<(), CliError> {
    let user = app
        .flows
        .login(&args.email, &args.password, args.remember_me)
        .await?;
    print_json(&serde_json::to_value(user)?)
}

async fn run_register(app: &Storefront, args: RegisterArgs) -> Result<(), CliError> {
    let request = RegisterRequest {
        email: args.email,
        password: args.password,
        first_name: args.first_name,
        last_name: args.last_name,
        phone: args.phone,
    };
    match app.flows.register(&request).await? {
        RegisterOutcome::SignedIn(user) => print_json(&serde_json::to_value(user)?),
        RegisterOutcome::VerificationPending => {
            println!("check your inbox to verify {}", request.email);
            Ok(())
        }
    }
}

fn run_status(app: &Storefront, navigator: &dyn Navigator) -> Result<(), CliError> {
    let session = &app.session;
    let claims = session.access_token().as_deref().and_then(decode_claims);
    print_json(&json!({
        "authenticated": session.is_authenticated(),
        "hasRefreshToken": session.refresh_token().is_some(),
        "persistedAccessToken": session.token_store().get(TokenKind::Access).is_some(),
        "accessExpiresAt": claims.as_ref().and_then(|c| c.exp),
        "subject": claims.as_ref().and_then(|c| c.subject.clone()),
        "role": claims.and_then(|c| c.role),
        "location": navigator.current_location(),
    }))
}

async fn run_guard(app: &Storefront, path: &str, navigate: bool) -> Result<(), CliError> {
    // The role is only known after the user is loaded.
    if let Err(e) = app.flows.restore().await {
        tracing::warn!(error = %e, "could not load user; deciding on local state");
    }
    let class = app.guard.routes().classify(path);
    let decision = app.enforce(path);
    if navigate && decision == Decision::Allow {
        app.client.navigator().navigate(path);
    }
    print_json(&json!({
        "path": path,
        "class": class_name(class),
        "decision": if decision == Decision::Allow { "allow" } else { "redirect" },
        "redirectTo": decision.redirect_target(),
    }))
}

async fn run_api(app: &Storefront, method: &str, path: &str, data: Option<&str>) -> Result<(), CliError> {
    let method = reqwest::Method::from_bytes(method.to_ascii_uppercase().as_bytes())
        .map_err(|_| CliError::InvalidMethod(method.to_owned()))?;
    let mut request = ApiRequest::new(method, path);
    if let Some(raw) = data {
        request = request.with_body(serde_json::from_str::<Value>(raw)?);
    }
    let body = app.client.send(request).await?;
    print_json(&body)
}

fn class_name(class: RouteClass) -> &'static str {
    match class {
        RouteClass::Public => "public",
        RouteClass::AuthOnly => "auth-only",
        RouteClass::Protected => "protected",
        RouteClass::Admin => "admin",
    }
}

fn print_json(value: &Value) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}

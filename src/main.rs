mod config;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use config::{AuthKind, Config};
use manageiq::{
    Authenticator, BasicAuthenticator, BearerAuthenticator, Client, ClientParams,
    KeycloakAuthenticator, Method,
};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::level_filters::LevelFilter;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};

const LOG_FILE: &str = "miq.log";

/// Command line client for the ManageIQ REST API
#[derive(Parser, Debug)]
#[command(name = "miq", version, about, long_about = None)]
struct Args {
    /// ManageIQ API base URL
    #[arg(long, env = "MIQ_BASE_URL")]
    base_url: Option<String>,

    /// Skip TLS certificate verification
    #[arg(long)]
    insecure: bool,

    /// Authentication scheme
    #[arg(long, value_enum)]
    auth: Option<AuthKind>,

    /// Username (basic and keycloak)
    #[arg(short, long, env = "MIQ_USERNAME")]
    username: Option<String>,

    /// Password (basic and keycloak)
    #[arg(long, env = "MIQ_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Bearer token
    #[arg(long, env = "MIQ_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Keycloak server URL
    #[arg(long, env = "MIQ_KEYCLOAK_URL")]
    keycloak_url: Option<String>,

    /// Keycloak realm
    #[arg(long)]
    realm: Option<String>,

    /// Keycloak client id
    #[arg(long)]
    client_id: Option<String>,

    /// Keycloak client secret
    #[arg(long, env = "MIQ_CLIENT_SECRET", hide_env_values = true)]
    client_secret: Option<String>,

    /// Log level for debugging
    #[arg(long, value_enum, default_value = "off")]
    log_level: LogLevel,

    /// Save the effective connection settings (never secrets) as defaults
    #[arg(long)]
    save: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List groups, or show one group
    Groups { id: Option<String> },
    /// List service catalogs
    Catalogs,
    /// List services, or show one service
    Services {
        id: Option<String>,
        /// Query parameter passed through to the API, as key=value
        #[arg(short, long = "query", value_parser = parse_query)]
        queries: Vec<(String, String)>,
    },
    /// Check that the configured credentials are accepted
    AuthCheck,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::OFF,
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

fn parse_query(s: &str) -> std::result::Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("invalid query '{}', expected key=value", s))?;
    if key.is_empty() {
        return Err(format!("invalid query '{}', empty key", s));
    }
    Ok((key.to_string(), value.to_string()))
}

/// Log to `<config dir>/manageiq/miq.log`; stdout stays reserved for results
fn setup_logging(level: LogLevel) -> Option<WorkerGuard> {
    let filter = LevelFilter::from(level);
    if filter == LevelFilter::OFF {
        return None;
    }

    let dir = Config::dir().unwrap_or_else(|| PathBuf::from("."));
    let appender = match RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(LOG_FILE)
        .build(&dir)
    {
        Ok(appender) => appender,
        Err(e) => {
            eprintln!("Logging disabled, cannot open {:?}: {}", dir.join(LOG_FILE), e);
            return None;
        }
    };
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::fmt()
        .with_max_level(filter)
        .with_writer(writer)
        .with_ansi(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("miq {} logging at {:?}", env!("CARGO_PKG_VERSION"), level);
    Some(guard)
}

fn required(value: Option<String>, flag: &str) -> Result<String> {
    value.with_context(|| format!("{} is required for this authentication scheme", flag))
}

fn build_authenticator(args: &Args, settings: &Config) -> Result<Arc<dyn Authenticator>> {
    let base_url = settings.effective_base_url();

    let authenticator: Arc<dyn Authenticator> = match settings.effective_auth() {
        AuthKind::Basic => Arc::new(
            BasicAuthenticator::new(
                required(settings.username.clone(), "--username")?,
                required(args.password.clone(), "--password")?,
            )
            .with_base_url(base_url)
            .with_insecure(settings.insecure),
        ),
        AuthKind::Bearer => Arc::new(
            BearerAuthenticator::new(required(args.token.clone(), "--token")?).with_base_url(base_url),
        ),
        AuthKind::Keycloak => {
            let mut keycloak = KeycloakAuthenticator::new(
                required(settings.realm.clone(), "--realm")?,
                required(settings.client_id.clone(), "--client-id")?,
                required(args.client_secret.clone(), "--client-secret")?,
                required(settings.username.clone(), "--username")?,
                required(args.password.clone(), "--password")?,
            )
            .with_base_url(base_url)
            .with_insecure(settings.insecure);
            if let Some(url) = &settings.keycloak_url {
                keycloak = keycloak.with_keycloak_base_url(url.clone());
            }
            Arc::new(keycloak)
        }
    };

    authenticator
        .validate()
        .context("Invalid authentication settings")?;
    Ok(authenticator)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run(command: Command, client: &Client) -> Result<()> {
    match command {
        Command::Groups { id: None } => print_json(&client.get_groups().await?),
        Command::Groups { id: Some(id) } => print_json(&client.get_group(&id).await?),
        Command::Catalogs => print_json(&client.get_service_catalogs().await?),
        Command::Services { id, queries } => {
            let queries: Vec<(&str, &str)> = queries
                .iter()
                .map(|(k, v)| (k.as_str(), v.as_str()))
                .collect();
            match id {
                Some(id) => print_json(&client.get_service(&id, &queries).await?),
                None => print_json(&client.list_services(&queries).await?),
            }
        }
        Command::AuthCheck => {
            let mut request = client.request(Method::GET, "", &[])?.build()?;
            client
                .authenticator()
                .authenticate(&mut request)
                .await
                .context("Authentication failed")?;
            println!("Authenticated against {}", client.base_url());
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let _log_guard = setup_logging(args.log_level);

    let cli = Config {
        base_url: args.base_url.clone(),
        auth: args.auth,
        username: args.username.clone(),
        keycloak_url: args.keycloak_url.clone(),
        realm: args.realm.clone(),
        client_id: args.client_id.clone(),
        insecure: args.insecure,
    };
    let settings = Config::load().merged(&cli);

    if args.save {
        settings.save()?;
    }

    tracing::info!(
        "Using {} with {:?} authentication",
        settings.effective_base_url(),
        settings.effective_auth()
    );

    let authenticator = build_authenticator(&args, &settings)?;
    let client = Client::new(
        authenticator,
        ClientParams {
            insecure: settings.insecure,
        },
    )
    .context("Failed to create ManageIQ client")?;

    run(args.command, &client).await
}

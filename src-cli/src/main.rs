mod commands;
mod echo;
mod state;

use anyhow::Context;
use bridge_core::Role;
use clap::{Parser, Subcommand, ValueHint};
use serde_json::Value;
use state::CliState;
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::BufReader;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(
    name = "bridgectl",
    version,
    about = "Inspect and exercise facade schemas shared between process roles",
    after_help = r#"EXAMPLES
  $ bridgectl check
  $ bridgectl describe --role android
  $ bridgectl generate MobileSystemFacade > mobile_system_facade.rs
  $ echo '{"facade":"MobileSystemFacade","method":"openLink","args":["https://example.com"],"requestId":"r1"}' | bridgectl dispatch --role android
  $ bridgectl call --as web MobileSystemFacade openLink '"https://example.com"'"#,
    arg_required_else_help = true
)]
struct Cli {
    #[arg(
        long,
        help = "Config directory (default: per-user project directory)",
        value_hint = ValueHint::DirPath
    )]
    config_dir: Option<PathBuf>,
    #[arg(
        long,
        help = "Schema directory, overrides [schema].dir from the config",
        value_hint = ValueHint::DirPath
    )]
    schema_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    #[command(about = "Load and validate every schema document")]
    Check,
    #[command(about = "Print facade signatures")]
    Describe {
        #[arg(long, help = "Only facades this role sends or receives")]
        role: Option<String>,
        #[arg(help = "Single facade to describe")]
        facade: Option<String>,
    },
    #[command(about = "Print a Rust trait and the structs it uses for one facade")]
    Generate {
        facade: String,
    },
    #[command(about = "Answer NDJSON request envelopes from stdin with echo handlers")]
    Dispatch {
        #[arg(long, help = "Receiving role (default: configured role)")]
        role: Option<String>,
    },
    #[command(about = "Make one call through a loopback connection to echo handlers")]
    Call {
        #[arg(long = "as", help = "Calling role (default: configured role)")]
        sender: Option<String>,
        facade: String,
        method: String,
        #[arg(help = "Arguments as JSON values")]
        args: Vec<String>,
    },
}

fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let state = CliState::initialize(cli.config_dir.as_deref(), cli.schema_dir.as_deref())?;
    init_tracing(&state.config.logging.filter);
    if let Some(path) = &state.created_config {
        tracing::info!(path = %path.display(), "wrote default bridge config");
    }

    let registry = state.load_registry()?;

    match cli.command {
        Command::Check => {
            println!("{}", commands::check(&registry));
        }
        Command::Describe { role, facade } => {
            let role = role.map(Role::new);
            print!(
                "{}",
                commands::describe(&registry, role.as_ref(), facade.as_deref())?
            );
        }
        Command::Generate { facade } => {
            print!("{}", commands::generate(&registry, &facade)?);
        }
        Command::Dispatch { role } => {
            let role = role.map_or_else(|| state.config.role.clone(), Role::new);
            let dispatcher = commands::echo_dispatcher(
                registry,
                role,
                state.config.dispatch.max_in_flight,
            )?;
            commands::dispatch_lines(
                dispatcher,
                BufReader::new(tokio::io::stdin()),
                tokio::io::stdout(),
            )
            .await?;
        }
        Command::Call {
            sender,
            facade,
            method,
            args,
        } => {
            let sender = sender.map_or_else(|| state.config.role.clone(), Role::new);
            let args = args
                .iter()
                .map(|arg| {
                    serde_json::from_str::<Value>(arg)
                        .with_context(|| format!("argument `{arg}` is not a JSON value"))
                })
                .collect::<anyhow::Result<Vec<_>>>()?;
            let timeout = Duration::from_secs(state.config.dispatch.call_timeout_secs);
            let result = commands::call(registry, sender, &facade, &method, args, timeout).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
    }

    Ok(())
}

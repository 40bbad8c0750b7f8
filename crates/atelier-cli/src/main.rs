//! atelier — run one multi-role session from the command line.
//!
//! Usage: `atelier <requirement...>`. Reads config.yaml from the working
//! directory (defaults apply if absent) and records the session transcript
//! under the configured session directory.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use atelier_core::config::Config;
use atelier_core::environment::Environment;
use atelier_core::error::SessionError;
use atelier_core::persist::SessionLog;
use atelier_core::provider::{OpenAiGenerator, TextGenerator};
use atelier_core::team;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let requirement: Vec<String> = std::env::args().skip(1).collect();
    if requirement.is_empty() {
        eprintln!("usage: atelier <requirement>");
        std::process::exit(2);
    }
    let requirement = requirement.join(" ");

    let project_root = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let config = match Config::load_from_dir(&project_root) {
        Ok(config) => config,
        Err(e) => {
            info!("No usable config.yaml ({}), using defaults", e);
            Config {
                project_root,
                ..Config::default()
            }
        }
    };

    let session_dir = config
        .resolve_session_dir()
        .join(chrono::Local::now().format("%Y%m%d_%H%M%S").to_string());
    let log = SessionLog::create(&session_dir)?;
    info!("Recording session to {}", session_dir.display());

    let generator: Arc<dyn TextGenerator> = Arc::new(OpenAiGenerator::new(&config));
    let max_context = config.max_context_messages;
    let mut env = Environment::new(config).with_recorder(Box::new(log));
    env.add_roles(
        team::standard_team(generator)
            .into_iter()
            .map(|role| role.with_max_context(max_context)),
    );
    env.post_requirement(&requirement);

    match env.run().await {
        Ok(rounds) => {
            println!("Session settled after {} round(s).", rounds);
            for msg in env.history().all() {
                let preview: String = msg.content.chars().take(80).collect();
                println!("  {:>16} | {:<12} | {}", msg.author.as_str(), msg.produced_by, preview);
            }
            println!("Transcript: {}", session_dir.display());
            Ok(())
        }
        Err(err @ SessionError::Stalled { .. }) => {
            eprintln!("Session stalled: {}", err);
            std::process::exit(1);
        }
        Err(err) => {
            eprintln!("Session failed: {}", err);
            std::process::exit(1);
        }
    }
}

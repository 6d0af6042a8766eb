//! Symbiont CLI entry point.

use anyhow::Context as _;
use clap::Parser;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use symbiont::cli::{Cli, Commands};
use symbiont::domain::models::Config;
use symbiont::domain::ports::SourceRepairer;
use symbiont::infrastructure::config::ConfigLoader;
use symbiont::infrastructure::gemini::GeminiClient;
use symbiont::infrastructure::git::GitClient;
use symbiont::services::{
    EvolutionOrchestrator, HistoryLog, ProcessSupervisor, SnapshotStore,
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("configuration error: {err:#}");
            return ExitCode::FAILURE;
        }
    };

    init_tracing(&config);

    let result = match cli.command {
        Commands::Run => run_both(&config).await,
        Commands::Supervise => run_supervisor(&config).await,
        Commands::Evolve => run_evolution(&config).await,
        Commands::History { limit } => print_history(&config, limit).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    match &cli.config {
        Some(path) => ConfigLoader::load_from_file(path),
        None => ConfigLoader::load(),
    }
}

fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.logging.level.clone()));

    if config.logging.format == "json" {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

/// Shutdown flag flipped by Ctrl-C; both loops watch it and finish
/// their current step before exiting.
fn shutdown_channel() -> (watch::Sender<bool>, watch::Receiver<bool>) {
    let (tx, rx) = watch::channel(false);
    let interrupt_tx = tx.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received; shutting down");
            let _ = interrupt_tx.send(true);
        }
    });
    (tx, rx)
}

fn build_supervisor(
    config: &Config,
    repairer: Arc<dyn SourceRepairer>,
    shutdown: watch::Receiver<bool>,
) -> ProcessSupervisor {
    ProcessSupervisor::new(
        config.worker.clone(),
        SnapshotStore::new(&config.snapshots.dir),
        repairer,
        shutdown,
    )
}

async fn run_both(config: &Config) -> anyhow::Result<()> {
    let gemini = Arc::new(GeminiClient::from_config(&config.generator)?);
    let (tx, rx) = shutdown_channel();

    let mut supervisor = build_supervisor(config, gemini.clone(), rx.clone());
    let history = HistoryLog::load(&config.history.path).await;
    let vcs = Arc::new(GitClient::new("."));
    let mut orchestrator = EvolutionOrchestrator::new(config, ".", gemini, vcs, history, rx);

    // Either loop failing terminally drags the other one down with it.
    let supervisor_tx = tx.clone();
    let supervisor_task = tokio::spawn(async move {
        let result = supervisor.run().await;
        if result.is_err() {
            let _ = supervisor_tx.send(true);
        }
        result
    });

    let orchestrator_tx = tx.clone();
    let orchestrator_task = tokio::spawn(async move {
        let result = orchestrator.run().await;
        if result.is_err() {
            let _ = orchestrator_tx.send(true);
        }
        result
    });

    let (supervisor_result, orchestrator_result) =
        tokio::join!(supervisor_task, orchestrator_task);
    supervisor_result.context("supervisor task panicked")??;
    orchestrator_result.context("evolution task panicked")??;
    Ok(())
}

async fn run_supervisor(config: &Config) -> anyhow::Result<()> {
    let gemini = Arc::new(GeminiClient::from_config(&config.generator)?);
    let (_tx, rx) = shutdown_channel();

    let mut supervisor = build_supervisor(config, gemini, rx);
    supervisor.run().await?;
    Ok(())
}

async fn run_evolution(config: &Config) -> anyhow::Result<()> {
    let gemini = Arc::new(GeminiClient::from_config(&config.generator)?);
    let (_tx, rx) = shutdown_channel();

    let history = HistoryLog::load(&config.history.path).await;
    let vcs = Arc::new(GitClient::new("."));
    let mut orchestrator = EvolutionOrchestrator::new(config, ".", gemini, vcs, history, rx);
    orchestrator.run().await
}

async fn print_history(config: &Config, limit: usize) -> anyhow::Result<()> {
    let history = HistoryLog::load(&config.history.path).await;
    let entries = history.entries();

    if entries.is_empty() {
        println!("No iterations recorded.");
        return Ok(());
    }

    let skip = entries.len().saturating_sub(limit);
    for entry in &entries[skip..] {
        println!(
            "{:>5}  {:<28} {}",
            entry.iteration,
            entry.status.to_string(),
            entry.reason
        );
    }
    Ok(())
}

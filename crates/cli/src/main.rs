mod cli;
mod progress;

use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use vidgen_core::{
    load_config, validate_config, Config, Orchestrator, OrchestratorError, RunReport,
    SanitizedConfig,
};

use cli::{App, Commands, GenerateArgs};
use progress::LogObserver;

#[tokio::main]
async fn main() {
    let app = App::parse();
    init_logging(app.json);

    if let Err(e) = run(app).await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

/// Logs go to stderr; stdout carries only command output.
fn init_logging(json: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| "info,vidgen_core=info".into());
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

async fn run(app: App) -> Result<()> {
    let mut config = load(&app.config)?;

    match app.cmd {
        Commands::Config => {
            if let Err(e) = validate_config(&config) {
                warn!("{}", e);
            }
            print_json(&SanitizedConfig::from(&config))
        }
        Commands::Health => {
            let orchestrator = orchestrator(&config)?;
            let report = orchestrator
                .api()
                .health()
                .await
                .context("Health check failed")?;
            if app.json {
                print_json(&report)
            } else {
                println!(
                    "{} {} up {:.0}s, worker {}, {} of {} slots busy",
                    report.service,
                    report.version,
                    report.uptime,
                    if report.worker.running { "running" } else { "stopped" },
                    report.worker.current_jobs,
                    report.worker.max_concurrent_jobs
                );
                Ok(())
            }
        }
        Commands::Status { job_id } => {
            let orchestrator = orchestrator(&config)?;
            let snapshot = orchestrator
                .api()
                .status(&job_id)
                .await
                .with_context(|| format!("Failed to fetch status of job {}", job_id))?;
            if app.json {
                print_json(&snapshot)
            } else {
                println!(
                    "{}: {} ({}%){}",
                    snapshot.job_id,
                    snapshot.status,
                    snapshot.progress_pct(),
                    snapshot
                        .current_step
                        .as_deref()
                        .map(|s| format!(" {}", s))
                        .unwrap_or_default()
                );
                if let Some(error) = &snapshot.error {
                    println!("error: {}", error);
                }
                if let Some(url) = &snapshot.download_url {
                    println!("download: {}", url);
                }
                Ok(())
            }
        }
        Commands::Generate(args) => {
            if let Some(secs) = args.deadline_secs {
                config.poll.deadline_secs = secs;
            }
            let orchestrator = orchestrator(&config)?;
            let report = generate(&orchestrator, &args).await?;
            if app.json {
                print_json(&report)
            } else {
                print_report(&report);
                Ok(())
            }
        }
    }
}

fn load(path: &Path) -> Result<Config> {
    info!("Loading configuration from {:?}", path);
    load_config(path).with_context(|| format!("Failed to load config from {:?}", path))
}

fn orchestrator(config: &Config) -> Result<Orchestrator> {
    Orchestrator::from_config(config).context("Failed to set up the job client")
}

async fn generate(orchestrator: &Orchestrator, args: &GenerateArgs) -> Result<RunReport> {
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    let interrupt = tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling run");
            trigger.cancel();
        }
    });

    let result = orchestrator
        .run(
            &args.request(),
            args.output.as_deref(),
            &LogObserver::new(),
            &cancel,
        )
        .await;
    interrupt.abort();

    result.map_err(|e: OrchestratorError| {
        let kind = e.kind();
        anyhow::Error::new(e).context(format!("Run failed ({} error)", kind))
    })
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", json);
    Ok(())
}

fn print_report(report: &RunReport) {
    println!("job:      {}", report.job_id);
    println!(
        "artifact: {} ({} bytes)",
        report.artifact_path.display(),
        report.artifact_bytes
    );
    if let Some(duration) = report.duration {
        println!("duration: {:.1}s", duration);
    }
    if let Some(resolution) = &report.resolution {
        println!("size:     {}", resolution);
    }
    if let Some(expires_at) = report.expires_at {
        println!("expires:  {}", expires_at.to_rfc3339());
    }
    println!("elapsed:  {:.1}s", report.elapsed.as_secs_f64());
}

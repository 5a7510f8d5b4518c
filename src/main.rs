use anyhow::Context;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use release_cascade::cascade::{CascadeReport, RunnerConfig, run_cascade};
use release_cascade::github::{LoggingGitHubInterpreter, OctocrabClient};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,release_cascade=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = RunnerConfig::from_env().context("invalid configuration")?;
    info!(?config, "Starting release cascade");

    let client = OctocrabClient::from_token(config.token.clone(), config.cascade.repo.clone())
        .context("failed to build GitHub client")?;

    let result = if config.dry_run {
        warn!("Dry run: mutating calls are logged, not executed");
        run_cascade(&LoggingGitHubInterpreter::new(&client), &config.cascade).await
    } else {
        run_cascade(&client, &config.cascade).await
    };

    match result {
        Ok(report) => {
            log_summary(&report);
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "Release cascade failed");
            Err(e).context("release cascade halted")
        }
    }
}

fn log_summary(report: &CascadeReport) {
    if report.steps.is_empty() {
        info!(
            trigger = report.chain.trigger(),
            chain_len = report.chain.len(),
            "Nothing to cascade"
        );
        return;
    }

    for (step, outcome) in &report.steps {
        info!(head = %step.head, base = %step.base, outcome = outcome.as_str(), "Step");
    }
    info!(
        merged = report.merged().len(),
        state = %report.state,
        "Release cascade finished"
    );
}

//! Cluster Gather Scanner
//!
//! Main entry point. Collects logs and resource definitions from the cluster
//! into an output tree, scans the gathered text for leaked secrets, and
//! decodes gzip+base64 payloads embedded in it.

use kube::Client;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cluster_gather_scanner::collector::gather;
use cluster_gather_scanner::config::Config;
use cluster_gather_scanner::pipeline::{self, PipelineOutcome};

/// Exit status: ran cleanly, nothing found
const EXIT_CLEAN: i32 = 0;
/// Exit status: ran cleanly, found secrets or encoded payloads
const EXIT_FINDINGS: i32 = 1;
/// Exit status: failed to run
const EXIT_FAILURE: i32 = 2;

#[tokio::main]
async fn main() {
    init_tracing();

    let config = Config::from_env_and_args();
    info!(
        "Starting cluster gather scanner (output root {})",
        config.output_root.display()
    );

    let status = match run(&config).await {
        Ok(outcome) if outcome.is_clean() => {
            info!("Run complete, nothing found");
            EXIT_CLEAN
        }
        Ok(outcome) => {
            info!(
                "Run complete: {} secret match(es) in {} file(s), {} encoded fragment(s), {} reconstructed file(s)",
                outcome.secret_matches,
                outcome.affected_files,
                outcome.encoded_fragments,
                outcome.reconstructed_files
            );
            EXIT_FINDINGS
        }
        Err(e) => {
            error!("Run failed: {:#}", e);
            EXIT_FAILURE
        }
    };

    std::process::exit(status);
}

/// Gather (unless scanning an existing tree), then scan and decode
async fn run(config: &Config) -> anyhow::Result<PipelineOutcome> {
    if !config.scan_only {
        let client = Client::try_default().await?;
        info!("Connected to Kubernetes API server");
        gather::gather(&client, config).await?;
    }
    Ok(pipeline::run(config)?)
}

/// Initialize tracing subscriber
fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("info,cluster_gather_scanner=debug,kube=warn,hyper=warn")
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

//! Materialization of cluster state into the output tree
//!
//! Layout under the output root:
//!
//! ```text
//! namespaces/<ns>/<kind>.yaml
//! namespaces/<ns>/pods/<pod>/<container>.log
//! gather-summary.json
//! ```

use std::path::Path;

use chrono::{DateTime, Utc};
use futures::{stream, StreamExt};
use kube::{Client, ResourceExt};
use serde::Serialize;
use tracing::{info, warn};

use crate::config::Config;
use crate::Result;

use super::cluster;

/// Maximum namespaces gathered concurrently
const GATHER_CONCURRENCY: usize = 4;

/// Counts for one gather run
#[derive(Debug, Serialize)]
pub struct GatherSummary {
    pub namespaces: usize,
    pub artifacts: usize,
    pub started: DateTime<Utc>,
    pub finished: DateTime<Utc>,
}

/// Collect logs and resource definitions for every selected namespace.
///
/// A failure scoped to one namespace is a warning, not fatal to the gather;
/// only cluster-level failures (listing namespaces, unusable output root)
/// abort the run.
pub async fn gather(client: &Client, config: &Config) -> Result<GatherSummary> {
    let started = Utc::now();

    let mut names = cluster::list_namespaces(client).await?;
    if !config.namespaces.is_empty() {
        names.retain(|name| config.namespaces.contains(name));
    }
    info!(
        "Gathering {} namespace(s) into {}",
        names.len(),
        config.output_root.display()
    );

    std::fs::create_dir_all(&config.output_root)?;

    let results = stream::iter(names.iter().map(|ns| gather_namespace(client, config, ns)))
        .buffer_unordered(GATHER_CONCURRENCY)
        .collect::<Vec<_>>()
        .await;

    let mut artifacts = 0;
    for result in results {
        match result {
            Ok(count) => artifacts += count,
            Err(e) => warn!("Namespace gather failed: {}", e),
        }
    }

    let summary = GatherSummary {
        namespaces: names.len(),
        artifacts,
        started,
        finished: Utc::now(),
    };
    write_summary(&summary, &config.output_root)?;
    info!(
        "Gather complete: {} artifact(s) from {} namespace(s)",
        summary.artifacts, summary.namespaces
    );
    Ok(summary)
}

/// Gather one namespace: configured resource kinds plus every container log
async fn gather_namespace(client: &Client, config: &Config, namespace: &str) -> Result<usize> {
    let ns_dir = config.output_root.join("namespaces").join(namespace);
    let mut count = 0;

    for kind in &config.kinds {
        match cluster::kind_yaml(client, namespace, kind).await {
            Ok(Some(yaml)) => {
                if yaml.is_empty() {
                    continue;
                }
                std::fs::create_dir_all(&ns_dir)?;
                std::fs::write(ns_dir.join(format!("{}.yaml", kind)), yaml)?;
                count += 1;
            }
            Ok(None) => warn!("Unknown resource kind '{}', skipping", kind),
            Err(e) => warn!("Failed to collect {} in {}: {}", kind, namespace, e),
        }
    }

    let pods = match cluster::list_pods(client, namespace).await {
        Ok(pods) => pods,
        Err(e) => {
            warn!("{}", e);
            return Ok(count);
        }
    };

    for pod in &pods {
        let pod_name = pod.name_any();
        for container in cluster::container_names(pod) {
            match cluster::container_log(client, namespace, &pod_name, &container).await {
                Ok(log) if !log.is_empty() => {
                    let pod_dir = ns_dir.join("pods").join(&pod_name);
                    std::fs::create_dir_all(&pod_dir)?;
                    std::fs::write(pod_dir.join(format!("{}.log", container)), log)?;
                    count += 1;
                }
                Ok(_) => {}
                Err(e) => warn!("{}", e),
            }
        }
    }

    Ok(count)
}

/// Persist the gather summary alongside the artifacts
fn write_summary(summary: &GatherSummary, root: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(summary).map_err(std::io::Error::other)?;
    std::fs::write(root.join("gather-summary.json"), json)?;
    Ok(())
}

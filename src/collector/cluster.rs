//! Kubernetes API access for collection

use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{ConfigMap, Event, Namespace, Pod, Secret, Service};
use k8s_openapi::NamespaceResourceScope;
use kube::api::{Api, ListParams, LogParams};
use kube::{Client, Resource, ResourceExt};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::{Error, Result};

/// List all namespace names in the cluster, sorted
pub async fn list_namespaces(client: &Client) -> Result<Vec<String>> {
    let namespaces: Api<Namespace> = Api::all(client.clone());
    let list = namespaces
        .list(&ListParams::default())
        .await
        .map_err(|e| Error::Kube(format!("Failed to list namespaces: {}", e)))?;

    let mut names: Vec<String> = list.items.iter().map(|ns| ns.name_any()).collect();
    names.sort();
    Ok(names)
}

/// List pods in a namespace
pub async fn list_pods(client: &Client, namespace: &str) -> Result<Vec<Pod>> {
    let pods: Api<Pod> = Api::namespaced(client.clone(), namespace);
    let list = pods
        .list(&ListParams::default())
        .await
        .map_err(|e| Error::Kube(format!("Failed to list pods in {}: {}", namespace, e)))?;
    Ok(list.items)
}

/// Container names of a pod
pub fn container_names(pod: &Pod) -> Vec<String> {
    pod.spec
        .as_ref()
        .map(|spec| spec.containers.iter().map(|c| c.name.clone()).collect())
        .unwrap_or_default()
}

/// Fetch the log of one container
pub async fn container_log(
    client: &Client,
    namespace: &str,
    pod: &str,
    container: &str,
) -> Result<String> {
    let pods: Api<Pod> = Api::namespaced(client.clone(), namespace);
    let params = LogParams {
        container: Some(container.to_string()),
        ..Default::default()
    };
    pods.logs(pod, &params).await.map_err(|e| {
        Error::Kube(format!(
            "Failed to fetch logs for {}/{}/{}: {}",
            namespace, pod, container, e
        ))
    })
}

/// Dump all items of one resource kind in a namespace as `---`-separated
/// YAML documents.
///
/// The kind is a plain string; an unrecognized kind yields `None` and is the
/// caller's to report.
pub async fn kind_yaml(client: &Client, namespace: &str, kind: &str) -> Result<Option<String>> {
    match kind {
        "configmaps" => dump::<ConfigMap>(client, namespace, kind).await.map(Some),
        "secrets" => dump::<Secret>(client, namespace, kind).await.map(Some),
        "services" => dump::<Service>(client, namespace, kind).await.map(Some),
        "deployments" => dump::<Deployment>(client, namespace, kind).await.map(Some),
        "events" => dump::<Event>(client, namespace, kind).await.map(Some),
        _ => Ok(None),
    }
}

async fn dump<K>(client: &Client, namespace: &str, kind: &str) -> Result<String>
where
    K: Resource<Scope = NamespaceResourceScope>
        + Clone
        + std::fmt::Debug
        + DeserializeOwned
        + Serialize,
    <K as Resource>::DynamicType: Default,
{
    let api: Api<K> = Api::namespaced(client.clone(), namespace);
    let list = api.list(&ListParams::default()).await.map_err(|e| {
        Error::Kube(format!("Failed to list {} in {}: {}", kind, namespace, e))
    })?;

    let mut out = String::new();
    for item in &list.items {
        let doc = serde_yaml::to_string(item).map_err(|e| {
            Error::Kube(format!("Failed to serialize {} in {}: {}", kind, namespace, e))
        })?;
        out.push_str("---\n");
        out.push_str(&doc);
    }
    Ok(out)
}

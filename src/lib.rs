//! Cluster Gather Scanner
//!
//! Gathers logs and resource definitions from a Kubernetes/OpenShift cluster,
//! scans the gathered text for leaked sensitive values, and detects and
//! decodes gzip+base64-encoded payloads embedded in the gathered data.

pub mod collector;
pub mod config;
pub mod corpus;
pub mod decode;
pub mod error;
pub mod pipeline;
pub mod scan;

pub use error::{Error, Result};

//! Gateway that answers from a captured vendor response on disk.

use async_trait::async_trait;
use log::debug;
use serde_json::Value;
use std::path::{Path, PathBuf};
use waypoint_rs_ledger::VendorGateway;
use waypoint_rs_protocol::{Domain, GatewayError, RequestParams};

/// Replays one JSON response file for every request.
///
/// The file is read on each fetch, so a missing or unparsable file surfaces
/// as an upstream fault and nothing is recorded.
#[derive(Debug, Clone)]
pub struct ReplayGateway {
    domain: Domain,
    path: PathBuf,
}

impl ReplayGateway {
    pub fn new(domain: Domain, path: impl AsRef<Path>) -> Self {
        Self {
            domain,
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl VendorGateway for ReplayGateway {
    fn domain(&self) -> Domain {
        self.domain
    }

    async fn fetch(&self, params: &RequestParams) -> Result<Value, GatewayError> {
        debug!(
            "replaying captured response (domain={}, path={}, params={})",
            self.domain,
            self.path.display(),
            params.len()
        );
        let contents = tokio::fs::read_to_string(&self.path).await.map_err(|err| {
            GatewayError::Request(format!("failed to read {}: {err}", self.path.display()))
        })?;
        serde_json::from_str(&contents).map_err(|err| {
            GatewayError::Malformed(format!("{} is not JSON: {err}", self.path.display()))
        })
    }
}

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::Arc;
use waypoint_rs_ledger::VendorGateway;
use waypoint_rs_protocol::{Domain, GatewayError, RequestParams};

/// Gateway that answers every request with the same response.
#[derive(Debug, Clone)]
pub struct StubGateway {
    domain: Domain,
    response: Value,
}

impl StubGateway {
    pub fn new(domain: Domain, response: Value) -> Self {
        Self { domain, response }
    }
}

#[async_trait]
impl VendorGateway for StubGateway {
    fn domain(&self) -> Domain {
        self.domain
    }

    async fn fetch(&self, _params: &RequestParams) -> Result<Value, GatewayError> {
        Ok(self.response.clone())
    }
}

/// Gateway that always fails with the given error.
#[derive(Debug, Clone)]
pub struct FailingGateway {
    domain: Domain,
    error: GatewayError,
}

impl FailingGateway {
    pub fn new(domain: Domain, error: GatewayError) -> Self {
        Self { domain, error }
    }

    pub fn timeout(domain: Domain) -> Self {
        Self::new(domain, GatewayError::Timeout("provider did not answer".to_string()))
    }
}

#[async_trait]
impl VendorGateway for FailingGateway {
    fn domain(&self) -> Domain {
        self.domain
    }

    async fn fetch(&self, _params: &RequestParams) -> Result<Value, GatewayError> {
        Err(self.error.clone())
    }
}

/// Stub gateway that keeps the parameters of every call it receives.
#[derive(Debug, Clone)]
pub struct RecordingGateway {
    inner: StubGateway,
    seen: Arc<Mutex<Vec<RequestParams>>>,
}

impl RecordingGateway {
    pub fn new(domain: Domain, response: Value) -> (Self, Arc<Mutex<Vec<RequestParams>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                inner: StubGateway::new(domain, response),
                seen: seen.clone(),
            },
            seen,
        )
    }
}

#[async_trait]
impl VendorGateway for RecordingGateway {
    fn domain(&self) -> Domain {
        self.inner.domain
    }

    async fn fetch(&self, params: &RequestParams) -> Result<Value, GatewayError> {
        self.seen.lock().push(params.clone());
        self.inner.fetch(params).await
    }
}

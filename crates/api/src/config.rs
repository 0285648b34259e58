//! API process configuration.

use rentpoint_infra::WorkflowConfig;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// `RENTPOINT_BIND_ADDR`, default `0.0.0.0:8080`.
    pub bind_addr: String,
    pub workflow: WorkflowConfig,
}

impl ApiConfig {
    pub fn from_env() -> Self {
        Self {
            bind_addr: std::env::var("RENTPOINT_BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.into()),
            workflow: WorkflowConfig::from_env(),
        }
    }
}

// SPDX-License-Identifier: MIT

use super::{create_mcp_service, BasicClientHandler};
use crate::adk::error::AdkError;
use rmcp::service::{RoleClient, RunningService, ServiceError};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A stdio MCP server to launch
#[derive(Debug, Clone, PartialEq)]
pub struct McpServerConfig {
    pub name: String,
    pub command: String,
    pub args: Vec<String>,
}

pub type SharedService = Arc<RwLock<RunningService<RoleClient, BasicClientHandler>>>;

type ServiceMap = HashMap<String, SharedService>;

/// The connection to the server is gone, as opposed to a failed request
pub fn is_transport_error(error: &ServiceError) -> bool {
    matches!(
        error,
        ServiceError::TransportSend(_) | ServiceError::TransportClosed
    )
}

/// Owns the running MCP clients, one per server name
#[derive(Default)]
pub struct McpServiceManager {
    services: Arc<RwLock<ServiceMap>>,
}

impl McpServiceManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get_or_create_service(
        &self,
        config: &McpServerConfig,
    ) -> Result<SharedService, AdkError> {
        if let Some(service) = self.get_service(&config.name).await {
            return Ok(service);
        }

        // Hold the write lock across the spawn so concurrent callers share one process
        let mut services = self.services.write().await;
        if let Some(service) = services.get(&config.name) {
            return Ok(service.clone());
        }

        log::info!(
            "Starting MCP server '{}': {} {:?}",
            config.name,
            config.command,
            config.args
        );
        let service = create_mcp_service(&config.command, &config.args).await?;
        let service = Arc::new(RwLock::new(service));
        services.insert(config.name.clone(), service.clone());

        Ok(service)
    }

    pub async fn get_service(&self, name: &str) -> Option<SharedService> {
        self.services.read().await.get(name).cloned()
    }

    /// Forget `service` if `name` still maps to it; the next lookup starts a new server
    pub async fn evict(&self, name: &str, service: &SharedService) -> bool {
        let mut services = self.services.write().await;
        match services.get(name) {
            Some(current) if Arc::ptr_eq(current, service) => {
                services.remove(name);
                log::warn!("Lost connection to MCP server '{}', dropping it", name);
                true
            }
            _ => false,
        }
    }
}

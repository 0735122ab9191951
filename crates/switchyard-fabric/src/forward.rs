use crate::directory::AgentDescriptor;
use crate::table::ForwardCall;
use async_trait::async_trait;
use std::time::Duration;
use switchyard_core::{SwitchyardError, SwitchyardResult};
use switchyard_mcp::McpHttpClient;
use tracing::debug;

/// Delivers a payload to a remote agent and returns its response unmodified.
#[async_trait]
pub trait Forwarder: Send + Sync {
    async fn forward(
        &self,
        agent: &AgentDescriptor,
        call: &ForwardCall,
        payload: serde_json::Value,
        token: Option<&str>,
    ) -> SwitchyardResult<serde_json::Value>;
}

/// HTTP forwarder sharing one connection pool across every agent.
pub struct HttpForwarder {
    http: reqwest::Client,
}

impl HttpForwarder {
    pub fn new() -> SwitchyardResult<Self> {
        Self::with_timeout(Duration::from_secs(30))
    }

    pub fn with_timeout(timeout: Duration) -> SwitchyardResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SwitchyardError::Http(e.to_string()))?;
        Ok(Self { http })
    }

    async fn post(
        &self,
        agent: &AgentDescriptor,
        url: &str,
        payload: &serde_json::Value,
        token: Option<&str>,
    ) -> SwitchyardResult<serde_json::Value> {
        let mut builder = self.http.post(url).json(payload);
        if let Some(token) = token {
            builder = builder.bearer_auth(token);
        }
        let resp = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                SwitchyardError::Timeout(format!("POST {url}"))
            } else {
                SwitchyardError::Http(format!("POST {url}: {e}"))
            }
        })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(SwitchyardError::remote(
                status.as_u16(),
                format!("{} POST", agent.id),
            ));
        }

        let body = resp
            .bytes()
            .await
            .map_err(|e| SwitchyardError::Http(e.to_string()))?;
        if body.is_empty() {
            return Ok(serde_json::Value::Null);
        }
        Ok(serde_json::from_slice(&body)?)
    }
}

#[async_trait]
impl Forwarder for HttpForwarder {
    async fn forward(
        &self,
        agent: &AgentDescriptor,
        call: &ForwardCall,
        payload: serde_json::Value,
        token: Option<&str>,
    ) -> SwitchyardResult<serde_json::Value> {
        let endpoint = agent.endpoint.as_deref().ok_or_else(|| {
            SwitchyardError::Config(format!("Agent {} has no endpoint", agent.id))
        })?;

        match call {
            ForwardCall::Tool(name) => {
                debug!(agent = %agent.id, tool = %name, "Forwarding tool call");
                let client = McpHttpClient::with_client(endpoint, None, self.http.clone());
                let result = client.call_tool(name, payload, token).await?;
                Ok(result.into_value())
            }
            ForwardCall::Post(path) => {
                let url = format!("{}{}", endpoint.trim_end_matches('/'), path);
                debug!(agent = %agent.id, %url, "Forwarding POST");
                self.post(agent, &url, &payload, token).await
            }
        }
    }
}

use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use shared::{
    error::{ApiError, ApiException, ErrorCode},
    protocol::{ControlEvent, SubmitAck},
};
use tracing::warn;

/// Where bound actions deliver their envelopes. A trait seam so the firing
/// path can be exercised against recording or failing stand-ins.
#[async_trait]
pub trait ControlSink: Send + Sync {
    async fn submit(&self, envelope: &ControlEvent) -> Result<SubmitAck>;
}

/// Submits envelopes to a relay's control endpoint over HTTP.
pub struct HttpControlClient {
    http: Client,
    control_url: String,
}

impl HttpControlClient {
    pub fn new(server_url: impl Into<String>) -> Self {
        let server_url = server_url.into();
        Self {
            http: Client::new(),
            control_url: format!("{}/control", server_url.trim_end_matches('/')),
        }
    }
}

#[async_trait]
impl ControlSink for HttpControlClient {
    async fn submit(&self, envelope: &ControlEvent) -> Result<SubmitAck> {
        let response = self
            .http
            .post(&self.control_url)
            .json(envelope)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let exception = match response.json::<ApiError>().await {
                Ok(error) => ApiException::from(error),
                Err(_) => ApiException::new(
                    ErrorCode::Internal,
                    format!("control endpoint answered {status}"),
                ),
            };
            return Err(exception.into());
        }
        Ok(response.json().await?)
    }
}

/// Fires one envelope at the sink and reports whether it was acknowledged.
/// Failures are logged and swallowed; a dropped interaction never takes the
/// next one down with it.
pub async fn fire(sink: &dyn ControlSink, action: &str, envelope: ControlEvent) -> bool {
    match sink.submit(&envelope).await {
        Ok(ack) => ack.ok,
        Err(error) => {
            warn!(action, %error, "control submission dropped");
            false
        }
    }
}

#[cfg(test)]
#[path = "tests/producer_tests.rs"]
mod tests;

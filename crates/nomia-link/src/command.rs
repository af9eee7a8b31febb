//! HTTP command client.

use nomia_core::{Command, LinkConfig};
use tokio::task::JoinHandle;

use crate::LinkError;

/// Posts [`Command`]s to the backend's `/command` endpoint.
#[derive(Debug, Clone)]
pub struct CommandClient {
    http: reqwest::Client,
    url: String,
}

impl CommandClient {
    pub fn new(config: &LinkConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            url: config.command_url(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Post one command and wait for the reply. Any non-2xx status is an error.
    pub async fn send(&self, command: &Command) -> Result<(), LinkError> {
        let response = self.http.post(&self.url).json(command).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(LinkError::Status(status));
        }
        log::debug!("command {command} accepted ({status})");
        Ok(())
    }

    /// Fire-and-forget on the current runtime. Failures are logged, never retried.
    pub fn dispatch(&self, command: Command) -> JoinHandle<()> {
        let client = self.clone();
        tokio::spawn(async move {
            if let Err(e) = client.send(&command).await {
                log::warn!("command {command} failed: {e}");
            }
        })
    }
}

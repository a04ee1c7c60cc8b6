//! Messenger platform client
//!
//! Thin wrapper over the Graph API Send and Messenger Profile endpoints.

use std::time::Duration;
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, info, warn};
use url::Url;
use crate::config::MessengerConfig;
use crate::models::Reply;
use crate::utils::errors::{QuickyError, Result};
use super::templates::{self, SendRequest};
use super::ReplySink;

#[derive(Clone, Debug)]
pub struct MessengerClient {
    client: Client,
    graph_api_url: Url,
    access_token: String,
}

impl MessengerClient {
    /// Create a client whose requests give up after `timeout`
    pub fn new(config: &MessengerConfig, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("QuickyMessenger/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            graph_api_url: Url::parse(config.graph_api_url.trim_end_matches('/'))?,
            access_token: config.access_token.clone(),
        })
    }

    /// Deliver one rendered message
    pub async fn send_message(&self, request: &SendRequest) -> Result<()> {
        let url = self.endpoint("me/messages")?;
        debug!(recipient = %request.recipient.id, "Sending message");
        self.post(url, request).await
    }

    /// Register the Get Started button and the persistent menu
    pub async fn setup_messenger_profile(&self) -> Result<()> {
        info!("Setting up messenger profile");
        let url = self.endpoint("me/messenger_profile")?;
        self.post(url, &templates::messenger_profile()).await?;
        info!("Messenger profile set up successfully");
        Ok(())
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        let mut url = Url::parse(&format!("{}/{}", self.graph_api_url.as_str().trim_end_matches('/'), path))?;
        url.query_pairs_mut().append_pair("access_token", &self.access_token);
        Ok(url)
    }

    async fn post<T: Serialize + ?Sized>(&self, url: Url, body: &T) -> Result<()> {
        let response = self.client.post(url).json(body).send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            warn!(status = status, body = %body, "Messenger API rejected request");
            return Err(QuickyError::MessengerApi { status, body });
        }

        Ok(())
    }
}

#[async_trait]
impl ReplySink for MessengerClient {
    async fn send(&self, user_id: &str, reply: &Reply) -> Result<()> {
        self.send_message(&templates::render(user_id, reply)).await
    }
}

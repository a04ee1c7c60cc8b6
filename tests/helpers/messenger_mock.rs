//! Messenger Graph API mock server
//!
//! Wraps a wiremock server that answers the Send API and the Messenger
//! Profile API the way the real platform does.

use serde_json::{json, Value};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};
use QuickyMessenger::config::MessengerConfig;

pub const TEST_ACCESS_TOKEN: &str = "test_page_token";
pub const TEST_VERIFY_TOKEN: &str = "test_verify_token";
pub const API_VERSION: &str = "v19.0";

/// Mock Graph API server
pub struct MessengerMockServer {
    pub server: MockServer,
}

impl MessengerMockServer {
    /// Start a new mock server
    pub async fn new() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    /// Graph API base URL pointing at the mock
    pub fn graph_api_url(&self) -> String {
        format!("{}/{}", self.server.uri(), API_VERSION)
    }

    /// Messenger settings pointing at the mock
    pub fn config(&self) -> MessengerConfig {
        MessengerConfig {
            access_token: TEST_ACCESS_TOKEN.to_string(),
            verify_token: TEST_VERIFY_TOKEN.to_string(),
            graph_api_url: self.graph_api_url(),
            setup_profile: false,
        }
    }

    /// Accept every Send API call
    pub async fn mock_send_message_success(&self) {
        Mock::given(method("POST"))
            .and(path(format!("/{}/me/messages", API_VERSION)))
            .and(query_param("access_token", TEST_ACCESS_TOKEN))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "recipient_id": "1254477777772919",
                "message_id": "m_AG5Hz2Uq7tuwNEhXfYYKj8mJEM_QPpz5jdCK48PnKAjSdjfipqxqMvK8ma6AC8fplwlqLP_5cgXIbu7I3rBN0P"
            })))
            .mount(&self.server)
            .await;
    }

    /// Reject every Send API call with a Graph API error
    pub async fn mock_send_message_error(&self, status: u16) {
        Mock::given(method("POST"))
            .and(path(format!("/{}/me/messages", API_VERSION)))
            .respond_with(ResponseTemplate::new(status).set_body_json(json!({
                "error": {
                    "message": "(#100) No matching user found",
                    "type": "OAuthException",
                    "code": 100,
                    "fbtrace_id": "AbCdEfGh"
                }
            })))
            .mount(&self.server)
            .await;
    }

    /// Accept the Messenger Profile call
    pub async fn mock_messenger_profile_success(&self) {
        Mock::given(method("POST"))
            .and(path(format!("/{}/me/messenger_profile", API_VERSION)))
            .and(query_param("access_token", TEST_ACCESS_TOKEN))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "result": "success" })))
            .mount(&self.server)
            .await;
    }

    /// JSON bodies of every request received on `endpoint`
    pub async fn received_bodies(&self, endpoint: &str) -> Vec<Value> {
        let wanted = format!("/{}/{}", API_VERSION, endpoint);
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .into_iter()
            .filter(|request| request.url.path() == wanted)
            .map(|request| serde_json::from_slice(&request.body).expect("JSON request body"))
            .collect()
    }
}

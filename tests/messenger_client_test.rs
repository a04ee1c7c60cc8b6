//! Messenger client tests against a mock Graph API

mod helpers;
use helpers::*;

use std::sync::Arc;
use std::time::Duration;
use assert_matches::assert_matches;
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, ResponseTemplate};
use QuickyMessenger::handlers::ConversationHandler;
use QuickyMessenger::models::{EventKind, Reply};
use QuickyMessenger::services::{MessengerClient, ReplySink};
use QuickyMessenger::state::ConversationState;
use QuickyMessenger::{ContentRepository, ErrorKind, QuickyError};

fn client_for(mock: &MessengerMockServer) -> MessengerClient {
    MessengerClient::new(&mock.config(), Duration::from_secs(2)).expect("valid client config")
}

#[tokio::test]
async fn test_text_reply_is_posted_to_send_api() {
    let mock = MessengerMockServer::new().await;
    Mock::given(method("POST"))
        .and(path("/v19.0/me/messages"))
        .and(body_partial_json(json!({
            "recipient": { "id": "psid_alice" },
            "messaging_type": "RESPONSE",
            "message": { "text": "Storage created: *Groceries*" }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "recipient_id": "psid_alice" })))
        .expect(1)
        .mount(&mock.server)
        .await;

    let client = client_for(&mock);
    client
        .send("psid_alice", &Reply::storage_created("Groceries"))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_access_token_is_sent_as_query_parameter() {
    let mock = MessengerMockServer::new().await;
    mock.mock_send_message_success().await;

    let client = client_for(&mock);
    client.send("psid_bob", &Reply::ActionMenu).await.unwrap();

    let requests = mock.server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let token = requests[0]
        .url
        .query_pairs()
        .find(|(key, _)| key == "access_token")
        .map(|(_, value)| value.into_owned());
    assert_eq!(token.as_deref(), Some(TEST_ACCESS_TOKEN));
}

#[tokio::test]
async fn test_action_menu_renders_button_template() {
    let mock = MessengerMockServer::new().await;
    mock.mock_send_message_success().await;

    client_for(&mock).send("psid_carol", &Reply::ActionMenu).await.unwrap();

    let bodies = mock.received_bodies("me/messages").await;
    assert_eq!(bodies.len(), 1);
    let payload = &bodies[0]["message"]["attachment"]["payload"];
    assert_eq!(bodies[0]["message"]["attachment"]["type"], "template");
    assert_eq!(payload["template_type"], "button");

    let tokens: Vec<&str> = payload["buttons"]
        .as_array()
        .unwrap()
        .iter()
        .map(|button| button["payload"].as_str().unwrap())
        .collect();
    assert_eq!(tokens, vec!["SEARCH_STORAGE", "CREATE_STORAGE", "REMOVE_STORAGE"]);
}

#[tokio::test]
async fn test_long_bucket_list_renders_carousel_page() {
    let mock = MessengerMockServer::new().await;
    mock.mock_send_message_success().await;

    let reply = Reply::BucketList {
        names: numbered_bucket_names(12),
        page: 0,
    };
    client_for(&mock).send("psid_dave", &reply).await.unwrap();

    let bodies = mock.received_bodies("me/messages").await;
    let payload = &bodies[0]["message"]["attachment"]["payload"];
    assert_eq!(payload["template_type"], "generic");

    let elements = payload["elements"].as_array().unwrap();
    assert_eq!(elements.len(), 10);
    assert_eq!(elements[0]["buttons"][0]["payload"], "STORAGE_1");
    assert_eq!(elements[8]["buttons"][0]["payload"], "STORAGE_9");
    assert_eq!(elements[9]["buttons"][0]["payload"], "STORAGE_PAGE_2");
}

#[tokio::test]
async fn test_api_error_is_reported() {
    let mock = MessengerMockServer::new().await;
    mock.mock_send_message_error(400).await;

    let err = client_for(&mock)
        .send("psid_erin", &Reply::text("hello"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ReplyDeliveryFailure);
    assert_matches!(
        err,
        QuickyError::MessengerApi { status: 400, ref body } if body.contains("No matching user found")
    );
}

#[tokio::test]
async fn test_slow_api_times_out() {
    let mock = MessengerMockServer::new().await;
    Mock::given(method("POST"))
        .and(path("/v19.0/me/messages"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
        .mount(&mock.server)
        .await;

    let client = MessengerClient::new(&mock.config(), Duration::from_millis(200)).unwrap();
    let result = client.send("psid_frank", &Reply::text("hello")).await;
    assert_matches!(result, Err(QuickyError::Http(_)));
}

#[tokio::test]
async fn test_messenger_profile_setup() {
    let mock = MessengerMockServer::new().await;
    mock.mock_messenger_profile_success().await;

    client_for(&mock).setup_messenger_profile().await.unwrap();

    let bodies = mock.received_bodies("me/messenger_profile").await;
    assert_eq!(bodies.len(), 1);
    assert_eq!(bodies[0]["get_started"]["payload"], "GET_STARTED");
    assert_eq!(bodies[0]["persistent_menu"][0]["locale"], "default");
    assert_eq!(
        bodies[0]["persistent_menu"][0]["call_to_actions"]
            .as_array()
            .unwrap()
            .len(),
        3
    );
}

#[tokio::test]
async fn test_invalid_graph_url_is_a_configuration_error() {
    let mut config = MessengerMockServer::new().await.config();
    config.graph_api_url = "not a url".to_string();

    let result = MessengerClient::new(&config, Duration::from_secs(1));
    assert_eq!(result.unwrap_err().kind(), ErrorKind::Configuration);
}

#[tokio::test]
async fn test_conversation_replies_reach_the_api() {
    let mock = MessengerMockServer::new().await;
    mock.mock_send_message_success().await;

    let handler = ConversationHandler::new(
        Arc::new(FaultyRepository::new()) as Arc<dyn ContentRepository>,
        Arc::new(client_for(&mock)) as Arc<dyn ReplySink>,
        test_timeouts(),
    );

    let outcome = handler
        .handle_event("psid_gina", EventKind::Postback("GET_STARTED".to_string()))
        .await;
    assert_eq!(outcome.state, ConversationState::AwaitingAction);
    assert_eq!(outcome.error, None);

    let outcome = handler
        .handle_event("psid_gina", EventKind::Postback("SEARCH_STORAGE".to_string()))
        .await;
    assert_eq!(outcome.state, ConversationState::AwaitingAction);

    let bodies = mock.received_bodies("me/messages").await;
    assert_eq!(bodies.len(), 3);
    assert_eq!(bodies[1]["message"]["text"], "No storages found.");
    assert!(bodies.iter().all(|body| body["recipient"]["id"] == "psid_gina"));
}

#[tokio::test]
async fn test_api_failure_surfaces_in_outcome() {
    let mock = MessengerMockServer::new().await;
    mock.mock_send_message_error(500).await;

    let handler = ConversationHandler::new(
        Arc::new(FaultyRepository::new()) as Arc<dyn ContentRepository>,
        Arc::new(client_for(&mock)) as Arc<dyn ReplySink>,
        test_timeouts(),
    );

    let outcome = handler
        .handle_event("psid_hank", EventKind::Postback("GET_STARTED".to_string()))
        .await;
    assert_eq!(outcome.state, ConversationState::AwaitingAction);
    assert_eq!(outcome.error, Some(ErrorKind::ReplyDeliveryFailure));
}

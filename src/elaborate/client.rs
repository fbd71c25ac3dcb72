//! Client side of elaboration: call the relay, then cache the result on the card
//!
//! Failures never propagate past [`Elaborator::elaborate`]; they come back as
//! [`ElaborationOutcome::Failed`] carrying the fallback text so a review
//! session can carry on.

use std::sync::Arc;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::review::ReviewSession;
use crate::store::CardStore;

pub const FALLBACK_MESSAGE: &str = "Failed to get elaboration. Please try again.";

#[derive(Error, Debug)]
pub enum ElaborationError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Relay error: {status} - {message}")]
    Status { status: u16, message: String },

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

#[derive(Serialize)]
struct RelayRequest<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct RelayReply {
    elaboration: String,
}

/// HTTP client for the elaboration relay
pub struct RelayClient {
    client: Client,
    endpoint: String,
}

impl RelayClient {
    pub fn new(endpoint: String) -> Result<Self, ElaborationError> {
        if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
            return Err(ElaborationError::InvalidUrl(endpoint));
        }
        Ok(Self {
            client: Client::builder().build()?,
            endpoint,
        })
    }

    /// Send the raw front text to the relay
    pub async fn request(&self, text: &str) -> Result<String, ElaborationError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&RelayRequest { text })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ElaborationError::Status {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        let reply: RelayReply = response.json().await?;
        Ok(reply.elaboration)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElaborationOutcome {
    /// The relay answered. `saved` is false when writing it to the card failed.
    Elaborated { text: String, saved: bool },
    Failed { message: String },
}

impl ElaborationOutcome {
    /// What to show the user
    pub fn display_text(&self) -> &str {
        match self {
            Self::Elaborated { text, .. } => text,
            Self::Failed { message } => message,
        }
    }
}

pub struct Elaborator {
    relay: RelayClient,
    store: Arc<dyn CardStore>,
}

impl Elaborator {
    pub fn new(relay: RelayClient, store: Arc<dyn CardStore>) -> Self {
        Self { relay, store }
    }

    /// Elaborate on a card's front text and persist the result on the card
    pub async fn elaborate(&self, card_id: &str, front: &str) -> ElaborationOutcome {
        let text = match self.relay.request(front).await {
            Ok(text) => text,
            Err(e) => {
                log::error!("Elaboration for card {} failed: {}", card_id, e);
                return ElaborationOutcome::Failed {
                    message: FALLBACK_MESSAGE.to_string(),
                };
            }
        };

        let saved = match self.store.update_card_elaboration(card_id, &text).await {
            Ok(()) => true,
            Err(e) => {
                log::error!("Saving elaboration for card {} failed: {}", card_id, e);
                false
            }
        };
        ElaborationOutcome::Elaborated { text, saved }
    }

    /// Elaborate on the session's current card, updating the session once
    /// the result is stored. `None` for an empty session.
    pub async fn elaborate_current(&self, session: &mut ReviewSession) -> Option<ElaborationOutcome> {
        let (card_id, front) = session.current().map(|c| (c.id.clone(), c.front.clone()))?;
        let outcome = self.elaborate(&card_id, &front).await;
        if let ElaborationOutcome::Elaborated { text, saved: true } = &outcome {
            session.apply_elaboration(&card_id, text);
        }
        Some(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use axum::extract::State;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::{json, Value};
    use tempfile::TempDir;
    use tokio::net::TcpListener;

    use crate::flashcards::DraftCard;
    use crate::review::ElaborationView;
    use crate::store::LocalStore;

    /// Relay stand-in counting calls; fails for the text "fail"
    async fn start_stub_relay() -> (String, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let app = Router::new()
            .route(
                "/elaborate",
                post(|State(calls): State<Arc<AtomicUsize>>, Json(body): Json<Value>| async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    if body["text"] == "fail" {
                        return (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"error": "upstream down"})))
                            .into_response();
                    }
                    Json(json!({"elaboration": format!("About {}", body["text"].as_str().unwrap_or_default())}))
                        .into_response()
                }),
            )
            .with_state(calls.clone());
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });
        (format!("http://{}/elaborate", addr), calls)
    }

    async fn local_set(temp: &TempDir, fronts: &[&str]) -> (Arc<dyn CardStore>, String) {
        let store: Arc<dyn CardStore> = Arc::new(LocalStore::new(temp.path().to_path_buf()));
        let drafts: Vec<DraftCard> = fronts.iter().map(|f| DraftCard::new(*f, "back")).collect();
        let id = store.create_set("Science", None, &drafts).await.unwrap();
        (store, id)
    }

    #[test]
    fn test_rejects_bad_endpoint() {
        assert!(matches!(
            RelayClient::new("relay.local".to_string()),
            Err(ElaborationError::InvalidUrl(_))
        ));
    }

    #[tokio::test]
    async fn test_elaboration_is_stored_and_reused() {
        let temp = TempDir::new().unwrap();
        let (store, set_id) = local_set(&temp, &["photosynthesis", "osmosis"]).await;
        let (endpoint, calls) = start_stub_relay().await;
        let elaborator = Elaborator::new(RelayClient::new(endpoint).unwrap(), store.clone());

        let mut session = ReviewSession::new(store.list_cards(&set_id).await.unwrap());
        let outcome = elaborator.elaborate_current(&mut session).await.unwrap();

        assert_eq!(
            outcome,
            ElaborationOutcome::Elaborated {
                text: "About photosynthesis".to_string(),
                saved: true
            }
        );
        assert_eq!(session.current_elaboration(), Some(ElaborationView::Cached("About photosynthesis")));

        let cards = store.list_cards(&set_id).await.unwrap();
        assert_eq!(cards[0].elaboration.as_deref(), Some("About photosynthesis"));

        let reloaded = ReviewSession::new(cards);
        assert_eq!(reloaded.current_elaboration(), Some(ElaborationView::Cached("About photosynthesis")));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failure_returns_fallback_and_session_continues() {
        let temp = TempDir::new().unwrap();
        let (store, set_id) = local_set(&temp, &["fail", "ok"]).await;
        let (endpoint, _calls) = start_stub_relay().await;
        let elaborator = Elaborator::new(RelayClient::new(endpoint).unwrap(), store.clone());

        let mut session = ReviewSession::new(store.list_cards(&set_id).await.unwrap());
        let outcome = elaborator.elaborate_current(&mut session).await.unwrap();

        assert_eq!(outcome.display_text(), FALLBACK_MESSAGE);
        assert_eq!(session.current_elaboration(), Some(ElaborationView::NoneYet));
        assert!(session.next());
        assert_eq!(session.visible_text(), Some("ok"));
        assert!(store.list_cards(&set_id).await.unwrap()[0].elaboration.is_none());
    }

    #[tokio::test]
    async fn test_unreachable_relay_is_a_failure() {
        let temp = TempDir::new().unwrap();
        let (store, _set_id) = local_set(&temp, &["x"]).await;
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let elaborator = Elaborator::new(RelayClient::new(format!("http://{}/elaborate", addr)).unwrap(), store);
        let outcome = elaborator.elaborate("cdmissing", "x").await;
        assert!(matches!(outcome, ElaborationOutcome::Failed { .. }));
    }

    #[tokio::test]
    async fn test_empty_session_has_nothing_to_elaborate() {
        let temp = TempDir::new().unwrap();
        let (store, _set_id) = local_set(&temp, &["x"]).await;
        let (endpoint, calls) = start_stub_relay().await;
        let elaborator = Elaborator::new(RelayClient::new(endpoint).unwrap(), store);

        let mut session = ReviewSession::new(Vec::new());
        assert!(elaborator.elaborate_current(&mut session).await.is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}

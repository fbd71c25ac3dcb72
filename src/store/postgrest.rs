use reqwest::{Client, RequestBuilder, Response};
use serde_json::Value;

use async_trait::async_trait;

use super::hosted::{Filter, TableApi};
use super::StoreFailure;

/// REST client for the hosted tables (PostgREST dialect)
pub struct PostgrestClient {
    client: Client,
    base_url: String,
    api_key: String,
    access_token: Option<String>,
}

impl PostgrestClient {
    /// Create a new client for the project at `base_url`
    pub fn new(base_url: String, api_key: String, access_token: Option<String>) -> Result<Self, StoreFailure> {
        // Normalize URL - ensure no trailing slash
        let base_url = base_url.trim_end_matches('/').to_string();

        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(StoreFailure::InvalidUrl(
                "URL must start with http:// or https://".to_string(),
            ));
        }

        let client = Client::builder()
            .connect_timeout(std::time::Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            base_url,
            api_key,
            access_token,
        })
    }

    /// Build full URL for a table
    fn url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    /// Attach the project key and the caller's bearer token
    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let token = self.access_token.as_deref().unwrap_or(&self.api_key);
        request.header("apikey", &self.api_key).bearer_auth(token)
    }

    async fn check(response: Response) -> Result<Response, StoreFailure> {
        let status = response.status();
        if !status.is_success() {
            return Err(StoreFailure::Api {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }
        Ok(response)
    }
}

fn filter_param(filter: &Filter) -> (String, String) {
    (filter.column.to_string(), format!("eq.{}", filter.value))
}

#[async_trait]
impl TableApi for PostgrestClient {
    async fn insert(&self, table: &str, rows: Vec<Value>) -> Result<(), StoreFailure> {
        let response = self
            .authorize(self.client.post(self.url(table)))
            .header("Prefer", "return=minimal")
            .json(&rows)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn select(&self, table: &str, filters: &[Filter], order_by: Option<&str>) -> Result<Vec<Value>, StoreFailure> {
        let mut params: Vec<(String, String)> = vec![("select".to_string(), "*".to_string())];
        params.extend(filters.iter().map(filter_param));
        if let Some(column) = order_by {
            params.push(("order".to_string(), format!("{}.asc", column)));
        }

        let response = self
            .authorize(self.client.get(self.url(table)))
            .query(&params)
            .send()
            .await?;
        let response = Self::check(response).await?;
        Ok(response.json().await?)
    }

    async fn update(&self, table: &str, filter: &Filter, patch: Value) -> Result<(), StoreFailure> {
        let response = self
            .authorize(self.client.patch(self.url(table)))
            .query(&[filter_param(filter)])
            .header("Prefer", "return=minimal")
            .json(&patch)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn delete(&self, table: &str, filter: &Filter) -> Result<(), StoreFailure> {
        let response = self
            .authorize(self.client.delete(self.url(table)))
            .query(&[filter_param(filter)])
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use axum::extract::{Path, Query, State};
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::json;
    use tokio::net::TcpListener;

    #[derive(Default)]
    struct Seen {
        queries: Vec<HashMap<String, String>>,
        bodies: Vec<Value>,
        tokens: Vec<String>,
    }

    type Shared = Arc<Mutex<Seen>>;

    fn remember(seen: &Shared, headers: &HeaderMap, query: HashMap<String, String>, body: Option<Value>) {
        let mut seen = seen.lock().unwrap();
        let token = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        seen.tokens.push(token);
        seen.queries.push(query);
        if let Some(body) = body {
            seen.bodies.push(body);
        }
    }

    async fn start_stub() -> (String, Shared) {
        let seen: Shared = Arc::default();
        let app = Router::new()
            .route(
                "/rest/v1/{table}",
                get(
                    |State(seen): State<Shared>, Path(table): Path<String>, headers: HeaderMap, Query(q): Query<HashMap<String, String>>| async move {
                        remember(&seen, &headers, q, None);
                        if table == "broken" {
                            return (StatusCode::BAD_REQUEST, Json(json!({"message": "no such table"})));
                        }
                        (StatusCode::OK, Json(json!([{"id": "cdst1", "title": "T"}])))
                    },
                )
                .post(
                    |State(seen): State<Shared>, headers: HeaderMap, Query(q): Query<HashMap<String, String>>, Json(body): Json<Value>| async move {
                        remember(&seen, &headers, q, Some(body));
                        StatusCode::CREATED
                    },
                )
                .patch(
                    |State(seen): State<Shared>, headers: HeaderMap, Query(q): Query<HashMap<String, String>>, Json(body): Json<Value>| async move {
                        remember(&seen, &headers, q, Some(body));
                        StatusCode::NO_CONTENT
                    },
                )
                .delete(
                    |State(seen): State<Shared>, headers: HeaderMap, Query(q): Query<HashMap<String, String>>| async move {
                        remember(&seen, &headers, q, None);
                        StatusCode::NO_CONTENT
                    },
                ),
            )
            .with_state(seen.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });
        (format!("http://{}/", addr), seen)
    }

    #[test]
    fn test_rejects_non_http_url() {
        let result = PostgrestClient::new("localhost:5432".to_string(), "k".to_string(), None);
        assert!(matches!(result, Err(StoreFailure::InvalidUrl(_))));
    }

    #[tokio::test]
    async fn test_select_sends_filters_and_order() {
        let (url, seen) = start_stub().await;
        let client = PostgrestClient::new(url, "anon".to_string(), None).unwrap();

        let rows = client
            .select("cards", &[Filter::eq("cardSet", "cdst1")], Some("index"))
            .await
            .unwrap();

        assert_eq!(rows.len(), 1);
        let seen = seen.lock().unwrap();
        let query = &seen.queries[0];
        assert_eq!(query.get("cardSet").map(String::as_str), Some("eq.cdst1"));
        assert_eq!(query.get("order").map(String::as_str), Some("index.asc"));
        assert_eq!(seen.tokens[0], "Bearer anon");
    }

    #[tokio::test]
    async fn test_writes_use_access_token() {
        let (url, seen) = start_stub().await;
        let client = PostgrestClient::new(url, "anon".to_string(), Some("jwt".to_string())).unwrap();

        client.insert("cards", vec![json!({"id": "cd1"})]).await.unwrap();
        client
            .update("cards", &Filter::eq("id", "cd1"), json!({"ai": "text"}))
            .await
            .unwrap();
        client.delete("cards", &Filter::eq("id", "cd1")).await.unwrap();

        let seen = seen.lock().unwrap();
        assert!(seen.tokens.iter().all(|t| t == "Bearer jwt"));
        assert_eq!(seen.bodies[0], json!([{"id": "cd1"}]));
        assert_eq!(seen.bodies[1], json!({"ai": "text"}));
        assert_eq!(seen.queries[2].get("id").map(String::as_str), Some("eq.cd1"));
    }

    #[tokio::test]
    async fn test_error_status_is_reported() {
        let (url, _seen) = start_stub().await;
        let client = PostgrestClient::new(url, "anon".to_string(), None).unwrap();

        let err = client.select("broken", &[], None).await.unwrap_err();
        match err {
            StoreFailure::Api { status, message } => {
                assert_eq!(status, 400);
                assert!(message.contains("no such table"));
            }
            other => panic!("unexpected error: {}", other),
        }
    }
}

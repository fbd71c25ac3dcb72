use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::{Result, SessionError};

/// Identity returned by the hosted auth service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// A signed-in session, persisted between runs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    pub user: AuthUser,
}

/// Client for the hosted email/password auth service
pub struct AuthClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl AuthClient {
    pub fn new(base_url: String, api_key: String) -> Result<Self> {
        let base_url = base_url.trim_end_matches('/').to_string();
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(SessionError::InvalidUrl(
                "URL must start with http:// or https://".to_string(),
            ));
        }
        Ok(Self {
            client: Client::builder().build()?,
            base_url,
            api_key,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, path)
    }

    async fn post(&self, path: &str, email: &str, password: &str) -> Result<Value> {
        let response = self
            .client
            .post(self.url(path))
            .header("apikey", &self.api_key)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;
        let response = Self::check(response).await?;
        Ok(response.json().await?)
    }

    async fn check(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body: Value = response.json().await.unwrap_or(Value::Null);
        let message = ["error_description", "msg", "message", "error"]
            .iter()
            .find_map(|k| body.get(*k).and_then(Value::as_str))
            .unwrap_or("Authentication failed")
            .to_string();
        Err(SessionError::Rejected {
            status: status.as_u16(),
            message,
        })
    }

    /// Sign in with email and password
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession> {
        let body = self.post("token?grant_type=password", email, password).await?;
        Ok(serde_json::from_value(body)?)
    }

    /// Register a new account. Returns `None` when the service wants the
    /// address confirmed before issuing a session.
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<Option<AuthSession>> {
        let body = self.post("signup", email, password).await?;
        if body.get("access_token").and_then(Value::as_str).is_some() {
            Ok(Some(serde_json::from_value(body)?))
        } else {
            Ok(None)
        }
    }
}

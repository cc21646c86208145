use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;

use super::ProviderError;

/// Session returned by the identity provider after sign-up or sign-in.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthSession {
    pub access_token: String,
    pub user_id: Uuid,
    pub email: String,
}

/// The hosted authentication service. Passwords never touch this process's
/// storage; the provider issues the bearer tokens that `require_auth` checks.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        full_name: Option<&str>,
    ) -> Result<AuthSession, ProviderError>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, ProviderError>;
}

/// Client for a GoTrue-compatible auth API (`/auth/v1/...`).
pub struct GoTrueClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl GoTrueClient {
    pub fn new(base_url: &str, api_key: &str) -> Result<Self, ProviderError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    async fn post(&self, path: &str, body: Value) -> Result<(u16, Value), ProviderError> {
        let response = self
            .http
            .post(format!("{}{}", self.base_url, path))
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status().as_u16();
        let text = response.text().await?;
        let json = serde_json::from_str(&text).unwrap_or(Value::String(text));
        Ok((status, json))
    }
}

#[async_trait]
impl IdentityProvider for GoTrueClient {
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        full_name: Option<&str>,
    ) -> Result<AuthSession, ProviderError> {
        let (status, body) = self
            .post(
                "/auth/v1/signup",
                serde_json::json!({
                    "email": email,
                    "password": password,
                    "data": { "full_name": full_name },
                }),
            )
            .await?;

        match status {
            200..=299 => parse_session(&body),
            400 | 422 | 429 => Err(ProviderError::Rejected(error_message(&body))),
            _ => Err(ProviderError::Status {
                status,
                body: error_message(&body),
            }),
        }
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, ProviderError> {
        let (status, body) = self
            .post(
                "/auth/v1/token?grant_type=password",
                serde_json::json!({
                    "email": email,
                    "password": password,
                }),
            )
            .await?;

        match status {
            200..=299 => parse_session(&body),
            400 | 401 | 403 => Err(ProviderError::Unauthorized(error_message(&body))),
            _ => Err(ProviderError::Status {
                status,
                body: error_message(&body),
            }),
        }
    }
}

/// Accepts both `{access_token, user: {...}}` and a bare user object. The
/// latter means the account awaits email confirmation and has no session yet.
fn parse_session(body: &Value) -> Result<AuthSession, ProviderError> {
    let user = body.get("user").unwrap_or(body);

    let user_id = user["id"]
        .as_str()
        .and_then(|id| Uuid::parse_str(id).ok())
        .ok_or_else(|| ProviderError::Malformed("missing user id".into()))?;

    let access_token = body["access_token"].as_str().ok_or_else(|| {
        ProviderError::Rejected("Account created; confirm your email before signing in".into())
    })?;

    Ok(AuthSession {
        access_token: access_token.to_string(),
        user_id,
        email: user["email"].as_str().unwrap_or_default().to_string(),
    })
}

fn error_message(body: &Value) -> String {
    ["error_description", "msg", "message", "error"]
        .iter()
        .find_map(|k| body.get(*k).and_then(Value::as_str))
        .or_else(|| body.as_str())
        .unwrap_or("request rejected by auth provider")
        .to_string()
}

use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use super::{RestBackend, Surface};
use crate::backend::SignUpOutcome;
use crate::errors::{PortalError, Result};
use crate::models::auth::{AuthSession, Identity};

// 身份接口返回的会话
#[derive(Debug, Deserialize)]
struct SessionPayload {
    access_token: String,
    refresh_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    expires_at: Option<i64>,
    user: Identity,
}

impl SessionPayload {
    fn into_session(self, now: DateTime<Utc>) -> AuthSession {
        // expires_at 优先；旧版本只返回 expires_in
        let expires_at = self
            .expires_at
            .and_then(|ts| DateTime::<Utc>::from_timestamp(ts, 0))
            .unwrap_or_else(|| now + Duration::seconds(self.expires_in.unwrap_or(3600)));
        AuthSession {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at,
            user: self.user,
        }
    }
}

/// 注册在开启邮箱确认时只返回用户，否则返回完整会话
fn parse_sign_up(value: serde_json::Value, now: DateTime<Utc>) -> Result<SignUpOutcome> {
    if value.get("access_token").is_some() {
        let payload: SessionPayload = serde_json::from_value(value)?;
        let session = payload.into_session(now);
        return Ok(SignUpOutcome {
            identity: session.user.clone(),
            session: Some(session),
        });
    }
    let identity = match value.get("user") {
        Some(user) => serde_json::from_value(user.clone())?,
        None => serde_json::from_value(value)?,
    };
    Ok(SignUpOutcome {
        identity,
        session: None,
    })
}

impl RestBackend {
    async fn token_grant(&self, grant_type: &str, body: serde_json::Value) -> Result<AuthSession> {
        let request = self
            .client
            .post(self.url("/auth/v1/token"))
            .query(&[("grant_type", grant_type)])
            .json(&body);
        let response = self.authorized(request, "").send().await?;
        let payload: SessionPayload = Self::check(response, Surface::Auth).await?.json().await?;
        Ok(payload.into_session(Utc::now()))
    }

    pub(super) async fn auth_sign_up(&self, email: &str, password: &str) -> Result<SignUpOutcome> {
        let request = self
            .client
            .post(self.url("/auth/v1/signup"))
            .json(&json!({ "email": email, "password": password }));
        let response = self.authorized(request, "").send().await?;
        let value: serde_json::Value = Self::check(response, Surface::Auth).await?.json().await?;
        let outcome = parse_sign_up(value, Utc::now())?;
        debug!(
            "Signed up identity {} (session issued: {})",
            outcome.identity.id,
            outcome.session.is_some()
        );
        Ok(outcome)
    }

    pub(super) async fn auth_sign_in(&self, email: &str, password: &str) -> Result<AuthSession> {
        self.token_grant("password", json!({ "email": email, "password": password }))
            .await
    }

    pub(super) async fn auth_refresh(&self, refresh_token: &str) -> Result<AuthSession> {
        if refresh_token.is_empty() {
            return Err(PortalError::authentication("Refresh token is missing"));
        }
        self.token_grant("refresh_token", json!({ "refresh_token": refresh_token }))
            .await
    }

    pub(super) async fn auth_sign_out(&self, access_token: &str) -> Result<()> {
        let request = self.client.post(self.url("/auth/v1/logout"));
        let response = self.authorized(request, access_token).send().await?;
        Self::check(response, Surface::Auth).await?;
        Ok(())
    }

    pub(super) async fn auth_user(&self, access_token: &str) -> Result<Identity> {
        if access_token.is_empty() {
            return Err(PortalError::authentication("Access token is missing"));
        }
        let request = self.client.get(self.url("/auth/v1/user"));
        let response = self.authorized(request, access_token).send().await?;
        Ok(Self::check(response, Surface::Auth).await?.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_up_without_confirmation_returns_session() {
        let now = Utc::now();
        let value = json!({
            "access_token": "a",
            "refresh_token": "r",
            "expires_in": 3600,
            "expires_at": now.timestamp() + 3600,
            "user": { "id": "6f1c7d6e-0d7b-4bb4-9d0c-3e8f0f6a2b11", "email": "a@campus.test" }
        });
        let outcome = parse_sign_up(value, now).unwrap();
        let session = outcome.session.unwrap();
        assert_eq!(session.refresh_token, "r");
        assert_eq!(session.expires_at.timestamp(), now.timestamp() + 3600);
        assert_eq!(outcome.identity.email.as_deref(), Some("a@campus.test"));
    }

    #[test]
    fn test_sign_up_pending_confirmation_returns_identity_only() {
        let value = json!({ "id": "6f1c7d6e-0d7b-4bb4-9d0c-3e8f0f6a2b11", "email": "b@campus.test" });
        let outcome = parse_sign_up(value, Utc::now()).unwrap();
        assert!(outcome.session.is_none());
        assert_eq!(outcome.identity.email.as_deref(), Some("b@campus.test"));
    }

    #[test]
    fn test_expires_in_fallback() {
        let now = Utc::now();
        let payload: SessionPayload = serde_json::from_value(json!({
            "access_token": "a",
            "refresh_token": "r",
            "expires_in": 60,
            "user": { "id": "6f1c7d6e-0d7b-4bb4-9d0c-3e8f0f6a2b11" }
        }))
        .unwrap();
        assert_eq!(payload.into_session(now).expires_at, now + Duration::seconds(60));
    }
}

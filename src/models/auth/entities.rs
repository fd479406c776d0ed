use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

// 身份提供方返回的用户身份（区别于 profiles 表中的资料）
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/auth.ts")]
pub struct Identity {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub email_confirmed_at: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(default)]
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

// 登录会话，令牌只保存在服务端
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuthSession {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: chrono::DateTime<chrono::Utc>,
    pub user: Identity,
}

impl AuthSession {
    /// 距离过期不足 `margin` 时需要刷新
    pub fn expires_within(
        &self,
        now: chrono::DateTime<chrono::Utc>,
        margin: chrono::Duration,
    ) -> bool {
        self.expires_at - now <= margin
    }
}

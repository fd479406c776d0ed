//! 内置身份提供方使用的 HS256 令牌
//!
//! 声明格式与托管服务签发的 access token 保持一致（`aud = "authenticated"`），
//! 因此两种后端下游看到的令牌形状相同。

use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const AUTHENTICATED_AUDIENCE: &str = "authenticated";

// JWT Claims 结构体
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,        // Subject (identity ID)
    pub email: String,
    pub role: String,       // 数据库角色，固定为 authenticated
    pub aud: String,
    pub session_id: String, // 同一次登录的刷新链共享
    pub exp: usize,
    pub iat: usize,
}

impl Claims {
    pub fn identity_id(&self) -> Option<Uuid> {
        self.sub.parse().ok()
    }
}

pub struct JwtUtils {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtUtils {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    // 签发 Access Token，返回令牌和过期时间
    pub fn issue_access_token(
        &self,
        identity_id: Uuid,
        email: &str,
        session_id: &str,
        expiry: chrono::Duration,
    ) -> Result<(String, chrono::DateTime<chrono::Utc>), jsonwebtoken::errors::Error> {
        let now = chrono::Utc::now();
        let expires_at = now + expiry;

        let claims = Claims {
            sub: identity_id.to_string(),
            email: email.to_string(),
            role: AUTHENTICATED_AUDIENCE.to_string(),
            aud: AUTHENTICATED_AUDIENCE.to_string(),
            session_id: session_id.to_string(),
            exp: expires_at.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        let token = encode(&Header::default(), &claims, &self.encoding_key)?;
        Ok((token, expires_at))
    }

    // 验证 Access Token
    pub fn verify_access_token(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        let mut validation = Validation::default();
        validation.set_audience(&[AUTHENTICATED_AUDIENCE]);

        decode::<Claims>(token, &self.decoding_key, &validation).map(|data| data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_and_verify() {
        let jwt = JwtUtils::new("test-secret");
        let id = Uuid::new_v4();
        let (token, expires_at) = jwt
            .issue_access_token(id, "ada@campus.test", "s1", chrono::Duration::minutes(5))
            .unwrap();

        let claims = jwt.verify_access_token(&token).unwrap();
        assert_eq!(claims.identity_id(), Some(id));
        assert_eq!(claims.email, "ada@campus.test");
        assert!(expires_at > chrono::Utc::now());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let (token, _) = JwtUtils::new("one")
            .issue_access_token(Uuid::new_v4(), "a@b.co", "s1", chrono::Duration::minutes(5))
            .unwrap();
        assert!(JwtUtils::new("two").verify_access_token(&token).is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        let jwt = JwtUtils::new("secret");
        let (token, _) = jwt
            .issue_access_token(Uuid::new_v4(), "a@b.co", "s1", chrono::Duration::minutes(-10))
            .unwrap();
        assert!(jwt.verify_access_token(&token).is_err());
    }
}

//! 基于 HTTP 的托管后端实现
//!
//! - `/auth/v1/*`：身份接口
//! - `/rest/v1/<table>`：PostgREST 风格的表接口

mod auth;
pub mod query;
mod tables;

use reqwest::{Client, RequestBuilder, Response, StatusCode, header};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::time::Duration;
use tracing::debug;

use crate::config::BackendConfig;
use crate::errors::{PortalError, Result};

pub use query::Select;

/// 单行查询为空时 PostgREST 返回的错误码
pub const ROW_NOT_FOUND_CODE: &str = "PGRST116";

const SINGLE_OBJECT_ACCEPT: &str = "application/vnd.pgrst.object+json";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Surface {
    Auth,
    Rest,
}

pub struct RestBackend {
    client: Client,
    base_url: String,
    anon_key: String,
}

// 两类接口的错误体字段不同，统一成一个宽松结构
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: Option<serde_json::Value>,
    #[serde(default)]
    error_code: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
}

impl ErrorBody {
    fn code_str(&self) -> Option<String> {
        match &self.code {
            Some(serde_json::Value::String(s)) => Some(s.clone()),
            _ => self.error_code.clone(),
        }
    }

    fn describe(&self) -> String {
        self.message
            .clone()
            .or_else(|| self.msg.clone())
            .or_else(|| self.error_description.clone())
            .or_else(|| self.error.clone())
            .unwrap_or_else(|| "unknown error".to_string())
    }
}

impl RestBackend {
    pub fn from_config(config: &BackendConfig) -> Result<Self> {
        if config.url.is_empty() {
            return Err(PortalError::backend_config("backend.url is not configured"));
        }
        if config.anon_key.is_empty() {
            return Err(PortalError::backend_config(
                "backend.anon_key is not configured",
            ));
        }
        let client = Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()
            .map_err(|e| PortalError::backend_config(format!("Failed to build HTTP client: {e}")))?;

        debug!("RestBackend created for {}", config.url);
        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            anon_key: config.anon_key.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// 所有请求都带 apikey；无用户令牌时以 anon key 作为 Bearer
    fn authorized(&self, builder: RequestBuilder, token: &str) -> RequestBuilder {
        let bearer = if token.is_empty() {
            self.anon_key.as_str()
        } else {
            token
        };
        builder
            .header("apikey", &self.anon_key)
            .bearer_auth(bearer)
    }

    /// 非 2xx 响应转换为错误
    async fn check(response: Response, surface: Surface) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let text = response.text().await.unwrap_or_default();
        Err(Self::error_from(status, &text, surface))
    }

    /// 按状态码、错误码和接口类别映射错误
    fn error_from(status: StatusCode, text: &str, surface: Surface) -> PortalError {
        let body: ErrorBody = serde_json::from_str(text).unwrap_or_default();
        let code = body.code_str();
        let detail = body.describe();
        debug!(
            "Backend responded {} (code: {:?}): {}",
            status, code, detail
        );

        if code.as_deref() == Some(ROW_NOT_FOUND_CODE) {
            return PortalError::row_not_found(detail);
        }
        match (surface, status) {
            // 身份接口对错误凭据、已失效的 refresh token 都返回 400
            (Surface::Auth, StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY) => {
                PortalError::authentication(detail)
            }
            (_, StatusCode::UNAUTHORIZED) => PortalError::authentication(detail),
            (_, StatusCode::FORBIDDEN) => PortalError::authorization(detail),
            (Surface::Rest, StatusCode::NOT_FOUND) => PortalError::not_found(detail),
            (Surface::Rest, StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY) => {
                PortalError::validation(detail)
            }
            _ => PortalError::backend_response(format!("{status}: {detail}")),
        }
    }

    // 多行查询
    async fn fetch<T: DeserializeOwned>(&self, token: &str, select: &Select) -> Result<Vec<T>> {
        let request = self
            .client
            .get(self.url(&format!("/rest/v1/{}", select.table())))
            .query(&select.to_query());
        let response = self.authorized(request, token).send().await?;
        Ok(Self::check(response, Surface::Rest).await?.json::<Vec<T>>().await?)
    }

    // 单行查询，0 行时返回 RowNotFound
    async fn fetch_one<T: DeserializeOwned>(&self, token: &str, select: &Select) -> Result<T> {
        let request = self
            .client
            .get(self.url(&format!("/rest/v1/{}", select.table())))
            .query(&select.to_query())
            .header(header::ACCEPT, SINGLE_OBJECT_ACCEPT);
        let response = self.authorized(request, token).send().await?;
        Ok(Self::check(response, Surface::Rest).await?.json::<T>().await?)
    }

    async fn insert_one<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        token: &str,
        table: &str,
        body: &B,
    ) -> Result<T> {
        let request = self
            .client
            .post(self.url(&format!("/rest/v1/{table}")))
            .header("Prefer", "return=representation")
            .header(header::ACCEPT, SINGLE_OBJECT_ACCEPT)
            .json(body);
        let response = self.authorized(request, token).send().await?;
        Ok(Self::check(response, Surface::Rest).await?.json::<T>().await?)
    }

    async fn update_one<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        token: &str,
        target: &Select,
        body: &B,
    ) -> Result<T> {
        let request = self
            .client
            .patch(self.url(&format!("/rest/v1/{}", target.table())))
            .query(&target.filters())
            .header("Prefer", "return=representation")
            .header(header::ACCEPT, SINGLE_OBJECT_ACCEPT)
            .json(body);
        let response = self.authorized(request, token).send().await?;
        Ok(Self::check(response, Surface::Rest).await?.json::<T>().await?)
    }
}

use actix_web::HttpRequest;
use actix_web::cookie::{Cookie, SameSite};
use uuid::Uuid;

use crate::config::AppConfig;

/// 创建浏览器会话 Cookie
pub fn create_session_cookie(session_id: &str) -> Cookie<'static> {
    let config = AppConfig::get();
    Cookie::build(config.session.cookie_name.clone(), session_id.to_string())
        .path("/")
        .max_age(actix_web::cookie::time::Duration::seconds(
            config.session.idle_timeout_secs as i64,
        ))
        .same_site(SameSite::Lax)
        .http_only(true)
        .secure(config.session.secure_cookie)
        .finish()
}

/// 创建空的会话 Cookie（用于注销）
pub fn create_empty_session_cookie() -> Cookie<'static> {
    let config = AppConfig::get();
    Cookie::build(config.session.cookie_name.clone(), "")
        .path("/")
        .max_age(actix_web::cookie::time::Duration::seconds(0))
        .same_site(SameSite::Lax)
        .http_only(true)
        .secure(config.session.secure_cookie)
        .finish()
}

/// 从请求中提取会话 ID，格式不对时视为没有
pub fn extract_session_id(req: &HttpRequest) -> Option<Uuid> {
    let config = AppConfig::get();
    req.cookie(&config.session.cookie_name)
        .and_then(|cookie| cookie.value().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn test_cookie_round_trip_and_malformed_value() {
        let id = Uuid::new_v4();
        let cookie = create_session_cookie(&id.to_string());
        assert!(cookie.http_only().unwrap_or(false));

        let req = TestRequest::default().cookie(cookie).to_http_request();
        assert_eq!(extract_session_id(&req), Some(id));

        let name = AppConfig::get().session.cookie_name.clone();
        let req = TestRequest::default()
            .cookie(Cookie::new(name, "not-a-uuid"))
            .to_http_request();
        assert_eq!(extract_session_id(&req), None);

        let cleared = create_empty_session_cookie();
        assert_eq!(cleared.value(), "");
    }
}

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares::RateLimit;
use crate::models::auth::{SignInRequest, SignUpRequest};
use crate::models::profiles::UpdateProfileRequest;
use crate::services::AuthService;

// 懒加载的全局 AuthService 实例
static AUTH_SERVICE: Lazy<AuthService> = Lazy::new(AuthService::new_lazy);

pub async fn register(
    req: HttpRequest,
    sign_up: web::Json<SignUpRequest>,
) -> ActixResult<HttpResponse> {
    AUTH_SERVICE.register(sign_up.into_inner(), &req).await
}

pub async fn login(
    req: HttpRequest,
    sign_in: web::Json<SignInRequest>,
) -> ActixResult<HttpResponse> {
    AUTH_SERVICE.login(sign_in.into_inner(), &req).await
}

pub async fn logout(req: HttpRequest) -> ActixResult<HttpResponse> {
    AUTH_SERVICE.logout(&req).await
}

pub async fn session(req: HttpRequest) -> ActixResult<HttpResponse> {
    AUTH_SERVICE.session(&req).await
}

pub async fn update_profile(
    req: HttpRequest,
    update: web::Json<UpdateProfileRequest>,
) -> ActixResult<HttpResponse> {
    AUTH_SERVICE.update_profile(update.into_inner(), &req).await
}

// 配置路由
pub fn configure_auth_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/auth")
            .service(
                web::resource("/register")
                    .wrap(RateLimit::register())
                    .route(web::post().to(register)),
            )
            .service(
                web::resource("/login")
                    .wrap(RateLimit::login())
                    .route(web::post().to(login)),
            )
            .route("/logout", web::post().to(logout)),
    )
    .route("/api/v1/session", web::get().to(session));
}

// 挂在需要登录的作用域下
pub fn configure_profile_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/profile", web::patch().to(update_profile));
}

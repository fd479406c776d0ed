use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::services::DashboardService;

// 懒加载的全局 DashboardService 实例
static DASHBOARD_SERVICE: Lazy<DashboardService> = Lazy::new(DashboardService::new_lazy);

pub async fn get_shell(req: HttpRequest) -> ActixResult<HttpResponse> {
    DASHBOARD_SERVICE.shell(&req).await
}

pub async fn toggle_nav(req: HttpRequest) -> ActixResult<HttpResponse> {
    DASHBOARD_SERVICE.toggle_nav(&req).await
}

pub async fn get_dashboard(req: HttpRequest) -> ActixResult<HttpResponse> {
    DASHBOARD_SERVICE.dashboard(&req).await
}

// 配置路由
pub fn configure_dashboard_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/shell", web::get().to(get_shell))
        .route("/shell/nav/toggle", web::post().to(toggle_nav))
        .route("/dashboard", web::get().to(get_dashboard));
}

pub mod shell;
pub mod view;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

pub struct DashboardService;

impl DashboardService {
    pub fn new_lazy() -> Self {
        Self
    }

    // 外壳：导航与仪表盘种类
    pub async fn shell(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        shell::handle_get_shell(request).await
    }

    // 切换导航面板
    pub async fn toggle_nav(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        shell::handle_toggle_nav(request).await
    }

    // 按角色组装的仪表盘
    pub async fn dashboard(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        view::handle_get_dashboard(request).await
    }
}

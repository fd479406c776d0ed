use serde::Serialize;
use ts_rs::TS;

use crate::models::auth::Identity;
use crate::models::dashboard::GateView;
use crate::models::profiles::Profile;

// 会话状态响应：SPA 依据 view 决定渲染登录页还是仪表盘
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/auth.ts")]
pub struct SessionResponse {
    pub identity: Option<Identity>,
    pub profile: Option<Profile>,
    pub loading: bool,
    pub view: GateView,
}

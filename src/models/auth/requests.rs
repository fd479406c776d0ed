use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::models::profiles::UserRole;

// 注册请求（来自HTTP请求）
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/auth.ts")]
pub struct SignUpRequest {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub role: UserRole,
    #[serde(default)]
    pub student_id: Option<String>,
    #[serde(default)]
    pub employee_id: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

// 登录请求（来自HTTP请求）
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/auth.ts")]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

pub mod assignments;
pub mod auth;
pub mod campus;
pub mod common;
pub mod courses;
pub mod dashboard;
pub mod enrollments;
pub mod profiles;
pub mod submissions;

pub use common::{ApiResponse, ErrorCode};

// 程序启动时间
#[derive(Debug, Clone)]
pub struct AppStartTime {
    pub start_datetime: chrono::DateTime<chrono::Utc>,
}

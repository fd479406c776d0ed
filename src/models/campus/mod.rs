//! 仪表盘上只做展示的外围实体

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::models::profiles::UserRole;

// 考勤状态（attendance_status 枚举）
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "../frontend/src/types/generated/campus.ts")]
pub enum AttendanceStatus {
    Present,
    Absent,
    Late,
    Excused,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/campus.ts")]
pub struct Attendance {
    pub id: Uuid,
    pub course_id: Uuid,
    pub student_id: Uuid,
    pub date: chrono::NaiveDate,
    pub status: AttendanceStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/campus.ts")]
pub struct Exam {
    pub id: Uuid,
    pub course_id: Uuid,
    pub title: String,
    pub exam_date: chrono::DateTime<chrono::Utc>,
    pub max_points: i32,
}

// select=*,exams(*)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/campus.ts")]
pub struct ExamResult {
    pub id: Uuid,
    pub exam_id: Uuid,
    pub student_id: Uuid,
    pub points_earned: f64,
    #[serde(default)]
    pub grade: Option<String>,
    #[serde(default, rename = "exams")]
    pub exam: Option<Exam>,
}

// 支付方式（payment_method 枚举）
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "../frontend/src/types/generated/campus.ts")]
pub enum PaymentMethod {
    Cash,
    Card,
    BankTransfer,
    Online,
}

// 支付状态（payment_status 枚举）
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "../frontend/src/types/generated/campus.ts")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Overdue,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/campus.ts")]
pub struct Payment {
    pub id: Uuid,
    pub student_id: Uuid,
    pub amount: f64,
    #[serde(default)]
    pub payment_method: Option<PaymentMethod>,
    pub status: PaymentStatus,
    pub description: String,
    pub due_date: chrono::NaiveDate,
    #[serde(default)]
    pub paid_at: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/campus.ts")]
pub struct Announcement {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub author_id: Option<Uuid>,
    /// 为空时面向所有角色
    #[serde(default)]
    pub target_role: Option<UserRole>,
    #[serde(default)]
    pub course_id: Option<Uuid>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/campus.ts")]
pub struct Message {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub recipient_id: Uuid,
    pub subject: String,
    pub body: String,
    pub is_read: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/campus.ts")]
pub struct Department {
    pub id: Uuid,
    pub name: String,
    pub code: String,
    #[serde(default)]
    pub head_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/campus.ts")]
pub struct Schedule {
    pub id: Uuid,
    pub course_id: Uuid,
    /// 0 = 周日
    pub day_of_week: i16,
    pub start_time: chrono::NaiveTime,
    pub end_time: chrono::NaiveTime,
    #[serde(default)]
    pub room: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/campus.ts")]
pub struct CourseMaterial {
    pub id: Uuid,
    pub course_id: Uuid,
    pub title: String,
    #[serde(default)]
    pub file_url: Option<String>,
    pub material_type: String,
    pub uploaded_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/campus.ts")]
pub struct SystemSetting {
    pub key: String,
    pub value: String,
    #[serde(default)]
    pub description: Option<String>,
}

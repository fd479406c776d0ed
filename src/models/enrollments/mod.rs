use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::models::courses::Course;

// 选课记录（enrollments 表）
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/enrollment.ts")]
pub struct Enrollment {
    pub id: Uuid,
    pub student_id: Uuid,
    pub course_id: Uuid,
    pub enrollment_date: chrono::DateTime<chrono::Utc>,
    pub is_active: bool,
}

// select=*,courses(*)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/enrollment.ts")]
pub struct EnrollmentWithCourse {
    #[serde(flatten)]
    #[ts(flatten)]
    pub enrollment: Enrollment,
    #[serde(rename = "courses")]
    pub course: Option<Course>,
}

// 选课请求；不带 student_id 时为本人选课
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/enrollment.ts")]
pub struct EnrollStudentRequest {
    pub course_id: Uuid,
    #[serde(default)]
    pub student_id: Option<Uuid>,
}

// 写入 enrollments 的新行，其余列取表默认值
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewEnrollment {
    pub student_id: Uuid,
    pub course_id: Uuid,
}

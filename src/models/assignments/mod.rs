use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::models::courses::CourseSummary;

// 作业（assignments 表）
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/assignment.ts")]
pub struct Assignment {
    pub id: Uuid,
    pub course_id: Uuid,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub due_date: chrono::DateTime<chrono::Utc>,
    pub max_points: i32,
    pub is_active: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

// select=*,courses(name,code)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/assignment.ts")]
pub struct AssignmentWithCourse {
    #[serde(flatten)]
    #[ts(flatten)]
    pub assignment: Assignment,
    #[serde(rename = "courses")]
    pub course: Option<CourseSummary>,
}

// 新建作业（来自HTTP请求，也是 assignments 表的插入体）
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/assignment.ts")]
pub struct CreateAssignmentRequest {
    pub course_id: Uuid,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub due_date: chrono::DateTime<chrono::Utc>,
    pub max_points: i32,
}

/// 截止时间严格晚于 `now` 的作业，按截止时间升序
pub fn upcoming(
    assignments: &[AssignmentWithCourse],
    now: chrono::DateTime<chrono::Utc>,
) -> Vec<AssignmentWithCourse> {
    let mut upcoming: Vec<AssignmentWithCourse> = assignments
        .iter()
        .filter(|a| a.assignment.due_date > now)
        .cloned()
        .collect();
    upcoming.sort_by_key(|a| a.assignment.due_date);
    upcoming
}

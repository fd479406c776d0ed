use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

// 课程（courses 表）
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/course.ts")]
pub struct Course {
    pub id: Uuid,
    pub name: String,
    pub code: String,
    #[serde(default)]
    pub description: Option<String>,
    pub credits: i32,
    pub semester: String,
    pub academic_year: String,
    #[serde(default)]
    pub department_id: Option<Uuid>,
    #[serde(default)]
    pub instructor_id: Option<Uuid>,
    pub is_active: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

// 联表查询时嵌入的课程摘要，对应 select=*,courses(name,code)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/course.ts")]
pub struct CourseSummary {
    pub name: String,
    pub code: String,
}

impl From<&Course> for CourseSummary {
    fn from(course: &Course) -> Self {
        Self {
            name: course.name.clone(),
            code: course.code.clone(),
        }
    }
}

// 课程列表查询参数：`instructor=me` 或教师ID
#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/course.ts")]
pub struct CourseListQuery {
    #[serde(default)]
    pub instructor: Option<String>,
}

// 课程列表筛选
#[derive(Debug, Clone, Default)]
pub struct CourseFilter {
    pub instructor_id: Option<Uuid>,
    pub active_only: bool,
}

// 新建课程（来自HTTP请求，也是 courses 表的插入体）
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/course.ts")]
pub struct CreateCourseRequest {
    pub name: String,
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub credits: i32,
    pub semester: String,
    pub academic_year: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructor_id: Option<Uuid>,
}

// 课程部分更新
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/course.ts")]
pub struct UpdateCourseRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credits: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub semester: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub academic_year: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructor_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

impl UpdateCourseRequest {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.code.is_none()
            && self.description.is_none()
            && self.credits.is_none()
            && self.semester.is_none()
            && self.academic_year.is_none()
            && self.department_id.is_none()
            && self.instructor_id.is_none()
            && self.is_active.is_none()
    }
}

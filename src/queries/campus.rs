//! 外围实体的只读钩子

use uuid::Uuid;

use super::{QueryClient, QueryKey, QueryState};
use crate::models::campus::{
    Announcement, Attendance, CourseMaterial, Department, ExamResult, Message, Payment, Schedule,
    SystemSetting,
};
use crate::models::profiles::{Profile, UserRole};

/// 仪表盘展示的公告条数
pub const ANNOUNCEMENT_LIMIT: usize = 5;

impl QueryClient {
    /// 面向 `role`（及全体）的最新公告；`None` 只取面向全体的
    pub async fn announcements(&self, role: Option<UserRole>) -> QueryState<Vec<Announcement>> {
        let audience = role.map_or("all", |r| r.as_str());
        let key = QueryKey::new("announcements").with(audience);
        self.read(key, |backend, token| async move {
            backend
                .list_announcements(&token, role, ANNOUNCEMENT_LIMIT)
                .await
        })
        .await
    }

    pub async fn student_attendance(&self, student_id: Option<Uuid>) -> QueryState<Vec<Attendance>> {
        let Some(student_id) = student_id else {
            return QueryState::disabled();
        };
        let key = QueryKey::new("attendance").with(student_id);
        self.read(key, |backend, token| async move {
            backend.list_attendance(&token, student_id).await
        })
        .await
    }

    pub async fn student_payments(&self, student_id: Option<Uuid>) -> QueryState<Vec<Payment>> {
        let Some(student_id) = student_id else {
            return QueryState::disabled();
        };
        let key = QueryKey::new("payments").with(student_id);
        self.read(key, |backend, token| async move {
            backend.list_payments(&token, student_id).await
        })
        .await
    }

    pub async fn student_exam_results(
        &self,
        student_id: Option<Uuid>,
    ) -> QueryState<Vec<ExamResult>> {
        let Some(student_id) = student_id else {
            return QueryState::disabled();
        };
        let key = QueryKey::new("exam_results").with(student_id);
        self.read(key, |backend, token| async move {
            backend.list_exam_results(&token, student_id).await
        })
        .await
    }

    pub async fn departments(&self) -> QueryState<Vec<Department>> {
        self.read(QueryKey::new("departments"), |backend, token| async move {
            backend.list_departments(&token).await
        })
        .await
    }

    pub async fn profiles(&self) -> QueryState<Vec<Profile>> {
        self.read(QueryKey::new("profiles"), |backend, token| async move {
            backend.list_profiles(&token).await
        })
        .await
    }

    pub async fn system_settings(&self) -> QueryState<Vec<SystemSetting>> {
        self.read(QueryKey::new("system_settings"), |backend, token| async move {
            backend.list_system_settings(&token).await
        })
        .await
    }

    pub async fn unread_messages(&self, recipient_id: Option<Uuid>) -> QueryState<Vec<Message>> {
        let Some(recipient_id) = recipient_id else {
            return QueryState::disabled();
        };
        let key = QueryKey::new("messages").with("unread").with(recipient_id);
        self.read(key, |backend, token| async move {
            backend.list_unread_messages(&token, recipient_id).await
        })
        .await
    }

    pub async fn course_schedules(&self, course_ids: &[Uuid]) -> QueryState<Vec<Schedule>> {
        if course_ids.is_empty() {
            return QueryState::ready(Vec::new());
        }
        let ids = course_ids.to_vec();
        let key = QueryKey::new("schedules").with_ids(&ids);
        self.read(key, |backend, token| async move {
            backend.list_schedules(&token, &ids).await
        })
        .await
    }

    pub async fn course_materials(
        &self,
        course_id: Option<Uuid>,
    ) -> QueryState<Vec<CourseMaterial>> {
        let Some(course_id) = course_id else {
            return QueryState::disabled();
        };
        let key = QueryKey::new("materials").with(course_id);
        self.read(key, |backend, token| async move {
            backend.list_course_materials(&token, course_id).await
        })
        .await
    }
}

use tracing::{error, info};
use uuid::Uuid;

use super::{QueryClient, QueryKey, QueryState, not_found};
use crate::errors::Result;
use crate::models::courses::{Course, CourseFilter, CreateCourseRequest, UpdateCourseRequest};

impl QueryClient {
    /// 某教师任教的课程（含已停用）
    pub async fn instructor_courses(&self, instructor_id: Option<Uuid>) -> QueryState<Vec<Course>> {
        let Some(instructor_id) = instructor_id else {
            return QueryState::disabled();
        };
        let key = QueryKey::new("courses").with("instructor").with(instructor_id);
        self.read(key, |backend, token| async move {
            let filter = CourseFilter {
                instructor_id: Some(instructor_id),
                ..Default::default()
            };
            backend.list_courses(&token, &filter).await
        })
        .await
    }

    pub async fn all_courses(&self) -> QueryState<Vec<Course>> {
        self.read(QueryKey::new("courses").with("all"), |backend, token| async move {
            backend.list_courses(&token, &CourseFilter::default()).await
        })
        .await
    }

    /// 开放中的课程目录，按名称排序
    pub async fn active_courses(&self) -> QueryState<Vec<Course>> {
        self.read(QueryKey::new("courses").with("active"), |backend, token| async move {
            let filter = CourseFilter {
                active_only: true,
                ..Default::default()
            };
            backend.list_courses(&token, &filter).await
        })
        .await
    }

    pub async fn course(&self, course_id: Option<Uuid>) -> QueryState<Option<Course>> {
        let Some(course_id) = course_id else {
            return QueryState::disabled();
        };
        self.read_one(QueryKey::new("courses").with(course_id), |backend, token| async move {
            backend.get_course(&token, course_id).await
        })
        .await
    }

    pub async fn create_course(&self, request: &CreateCourseRequest) -> Result<Course> {
        let course = self
            .backend()
            .insert_course(self.token(), request)
            .await
            .inspect_err(|e| error!("Failed to create course {}: {}", request.code, e))?;

        info!("Course {} created: {}", course.code, course.id);
        self.invalidate(&QueryKey::new("courses")).await;
        Ok(course)
    }

    pub async fn update_course(
        &self,
        course_id: Uuid,
        update: &UpdateCourseRequest,
    ) -> Result<Course> {
        let course = self
            .backend()
            .update_course(self.token(), course_id, update)
            .await
            .map_err(not_found("Course"))
            .inspect_err(|e| error!("Failed to update course {}: {}", course_id, e))?;

        info!("Course {} updated", course_id);
        self.invalidate(&QueryKey::new("courses")).await;
        Ok(course)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::signed_in;
    use super::*;

    #[tokio::test]
    async fn test_instructor_courses_filter_by_teacher() {
        let (_, session, client) = signed_in("teacher@campus.test").await;
        let taught = client.instructor_courses(Some(session.user.id)).await;
        let all = client.all_courses().await;

        assert_eq!(taught.data.len(), 3);
        assert!(all.data.len() > taught.data.len());
        assert!(
            taught
                .data
                .iter()
                .all(|c| c.instructor_id == Some(session.user.id))
        );
    }

    #[tokio::test]
    async fn test_unknown_course_is_none() {
        let (_, _, client) = signed_in("teacher@campus.test").await;
        let state = client.course(Some(Uuid::new_v4())).await;
        assert!(!state.is_loading);
        assert!(state.data.is_none());
    }

    fn new_course() -> CreateCourseRequest {
        CreateCourseRequest {
            name: "Compilers".to_string(),
            code: "CS420".to_string(),
            description: Some("Parsing to code generation".to_string()),
            credits: 4,
            semester: "Spring".to_string(),
            academic_year: "2026-2027".to_string(),
            department_id: None,
            instructor_id: None,
        }
    }

    #[tokio::test]
    async fn test_active_courses_exclude_inactive_and_sort_by_name() {
        let (_, _, client) = signed_in("student@campus.test").await;
        let active = client.active_courses().await.data;

        let names: Vec<&str> = active.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["Intro to Programming", "Linear Algebra", "Statistics"]);
        assert!(active.iter().all(|c| c.code != "CS099"));
        assert!(client.all_courses().await.data.iter().any(|c| c.code == "CS099"));
    }

    #[tokio::test]
    async fn test_create_course_invalidates_course_lists() {
        let (backend, _, client) = signed_in("staff@campus.test").await;
        let before = client.all_courses().await.data.len();
        client.active_courses().await;

        let reads = backend.reads();
        client.all_courses().await;
        assert_eq!(backend.reads(), reads, "second read is served from cache");

        let created = client.create_course(&new_course()).await.unwrap();
        assert!(created.is_active);

        assert_eq!(client.all_courses().await.data.len(), before + 1);
        assert!(client.active_courses().await.data.iter().any(|c| c.id == created.id));
    }

    #[tokio::test]
    async fn test_update_course_invalidates_catalog_and_detail() {
        let (_, _, client) = signed_in("staff@campus.test").await;
        let intro = client
            .active_courses()
            .await
            .data
            .into_iter()
            .find(|c| c.code == "CS101")
            .unwrap();
        assert!(client.course(Some(intro.id)).await.data.is_some());

        let update = UpdateCourseRequest {
            is_active: Some(false),
            ..Default::default()
        };
        let updated = client.update_course(intro.id, &update).await.unwrap();
        assert!(!updated.is_active);

        assert!(client.active_courses().await.data.iter().all(|c| c.id != intro.id));
        let detail = client.course(Some(intro.id)).await.data.unwrap();
        assert!(!detail.is_active);

        let err = client.update_course(Uuid::new_v4(), &update).await.unwrap_err();
        assert_eq!(err.code(), "E008");
    }
}

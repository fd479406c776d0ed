pub mod auth;

pub mod dashboard;

pub mod learning;

pub mod frontend;

use actix_web::web;

use crate::middlewares::RequireSession;

pub use auth::configure_auth_routes;
pub use frontend::configure_frontend_routes;

/// 需要登录的接口共用一个 `/api/v1` 作用域
pub fn configure_portal_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .wrap(RequireSession)
            .configure(auth::configure_profile_routes)
            .configure(dashboard::configure_dashboard_routes)
            .configure(learning::configure_learning_routes),
    );
}

/// 全部路由，前端兜底路由必须最后注册
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    configure_auth_routes(cfg);
    configure_portal_routes(cfg);
    configure_frontend_routes(cfg);
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::cookie::Cookie;
    use actix_web::http::StatusCode;
    use actix_web::{App, test};
    use serde_json::{Value, json};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU8, Ordering};

    use crate::backend::Backend;
    use crate::backend::memory::{DEMO_PASSWORD, MemoryBackend};
    use crate::cache::ObjectCache;
    use crate::cache::object_cache::MokaCacheWrapper;
    use crate::config::AppConfig;
    use crate::session::SessionRegistry;
    use crate::utils::{json_error_handler, query_error_handler};

    // 每个用例一个客户端地址，避免登录限流互相影响
    static NEXT_CLIENT: AtomicU8 = AtomicU8::new(1);

    fn client_ip() -> String {
        format!("10.0.0.{}", NEXT_CLIENT.fetch_add(1, Ordering::Relaxed))
    }

    fn test_registry() -> web::Data<SessionRegistry> {
        let backend: Arc<dyn Backend> =
            Arc::new(MemoryBackend::with_demo_data("routes-test-secret").unwrap());
        web::Data::new(SessionRegistry::new(backend, &AppConfig::get().session))
    }

    macro_rules! portal_app {
        () => {
            portal_app!(test_registry())
        };
        ($registry:expr) => {{
            let cache: Arc<dyn ObjectCache> = Arc::new(MokaCacheWrapper::with_settings(1000, 60));
            test::init_service(
                App::new()
                    .app_data(web::QueryConfig::default().error_handler(query_error_handler))
                    .app_data(web::JsonConfig::default().error_handler(json_error_handler))
                    .app_data($registry)
                    .app_data(web::Data::new(cache))
                    .configure(configure_routes),
            )
            .await
        }};
    }

    fn session_cookie<B>(resp: &actix_web::dev::ServiceResponse<B>) -> Option<Cookie<'static>> {
        let name = &AppConfig::get().session.cookie_name;
        resp.response()
            .cookies()
            .find(|c| c.name() == name)
            .map(|c| c.into_owned())
    }

    macro_rules! login {
        ($app:expr, $ip:expr, $email:expr) => {{
            let req = test::TestRequest::post()
                .uri("/api/v1/auth/login")
                .insert_header(("X-Forwarded-For", $ip.as_str()))
                .set_json(json!({ "email": $email, "password": DEMO_PASSWORD }))
                .to_request();
            let resp = test::call_service(&$app, req).await;
            assert_eq!(resp.status(), StatusCode::OK);
            session_cookie(&resp).unwrap()
        }};
    }

    macro_rules! get_json {
        ($app:expr, $uri:expr, $cookie:expr) => {{
            let req = test::TestRequest::get()
                .uri($uri)
                .cookie($cookie.clone())
                .to_request();
            let resp = test::call_service(&$app, req).await;
            let status = resp.status();
            let body: Value = test::read_body_json(resp).await;
            (status, body)
        }};
    }

    #[actix_web::test]
    async fn test_register_then_session_then_dashboard() {
        let app = portal_app!();
        let ip = client_ip();

        let req = test::TestRequest::post()
            .uri("/api/v1/auth/register")
            .insert_header(("X-Forwarded-For", ip.as_str()))
            .set_json(json!({
                "email": "newcomer@campus.test",
                "password": "Newcomer2026",
                "full_name": "Nia Newcomer",
                "role": "student",
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let cookie = session_cookie(&resp).unwrap();

        let (status, body) = get_json!(app, "/api/v1/session", cookie);
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["loading"], false);
        assert_eq!(body["data"]["profile"]["full_name"], "Nia Newcomer");
        assert_eq!(body["data"]["view"]["view"], "dashboard");
        assert_eq!(body["data"]["view"]["shell"]["kind"], "student");

        let (status, body) = get_json!(app, "/api/v1/dashboard", cookie);
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["kind"], "student");
        assert_eq!(body["data"]["data"]["courses"], json!([]));
    }

    #[actix_web::test]
    async fn test_invalid_registration_is_rejected() {
        let app = portal_app!();
        let req = test::TestRequest::post()
            .uri("/api/v1/auth/register")
            .insert_header(("X-Forwarded-For", client_ip().as_str()))
            .set_json(json!({
                "email": "weak@campus.test",
                "password": "short",
                "full_name": "Weak Password",
                "role": "teacher",
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(session_cookie(&resp).is_none());
    }

    #[actix_web::test]
    async fn test_unauthenticated_requests_get_401() {
        let app = portal_app!();

        let req = test::TestRequest::get().uri("/api/v1/dashboard").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let (status, _) = get_json!(app, "/api/v1/dashboard", Cookie::new(
            AppConfig::get().session.cookie_name.clone(),
            uuid::Uuid::new_v4().to_string(),
        ));
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn test_anonymous_session_is_not_stored() {
        let registry = test_registry();
        let app = portal_app!(registry.clone());

        for _ in 0..3 {
            let req = test::TestRequest::get().uri("/api/v1/session").to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::OK);
            assert!(session_cookie(&resp).is_none());
            let body: Value = test::read_body_json(resp).await;
            assert_eq!(body["data"]["view"]["view"], "login");
            assert_eq!(body["data"]["loading"], false);
        }
        assert_eq!(registry.len().await, 0);

        // 过期的 cookie 被清除
        let stale = Cookie::new(
            AppConfig::get().session.cookie_name.clone(),
            uuid::Uuid::new_v4().to_string(),
        );
        let req = test::TestRequest::get()
            .uri("/api/v1/session")
            .cookie(stale)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(session_cookie(&resp).map(|c| c.value().to_string()), Some(String::new()));
        assert_eq!(registry.len().await, 0);

        let cookie = login!(app, client_ip(), "student@campus.test");
        let req = test::TestRequest::get()
            .uri("/api/v1/session")
            .cookie(cookie)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert!(session_cookie(&resp).is_none());
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["data"]["view"]["view"], "dashboard");
        assert_eq!(registry.len().await, 1);
    }

    #[actix_web::test]
    async fn test_wrong_password_is_401() {
        let app = portal_app!();
        let req = test::TestRequest::post()
            .uri("/api/v1/auth/login")
            .insert_header(("X-Forwarded-For", client_ip().as_str()))
            .set_json(json!({ "email": "student@campus.test", "password": "Wrong2026" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn test_logout_clears_session() {
        let app = portal_app!();
        let cookie = login!(app, client_ip(), "teacher@campus.test");

        let (status, body) = get_json!(app, "/api/v1/dashboard", cookie);
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["kind"], "teacher");

        let req = test::TestRequest::post()
            .uri("/api/v1/auth/logout")
            .cookie(cookie.clone())
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(session_cookie(&resp).unwrap().value(), "");

        let (status, _) = get_json!(app, "/api/v1/dashboard", cookie);
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn test_only_teachers_can_grade() {
        let app = portal_app!();
        let ip = client_ip();

        let student = login!(app, ip, "student@campus.test");
        let (_, body) = get_json!(app, "/api/v1/dashboard", student);
        let submission_id = body["data"]["data"]["recent_grades"][0]["id"]
            .as_str()
            .unwrap()
            .to_string();
        let uri = format!("/api/v1/submissions/{submission_id}/grade");

        let req = test::TestRequest::patch()
            .uri(&uri)
            .cookie(student)
            .set_json(json!({ "points_earned": 20.0 }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        let teacher = login!(app, ip, "teacher@campus.test");
        let req = test::TestRequest::patch()
            .uri(&uri)
            .cookie(teacher.clone())
            .set_json(json!({ "points_earned": 25.0 }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::patch()
            .uri(&uri)
            .cookie(teacher)
            .set_json(json!({ "points_earned": 19.5, "feedback": "Regraded" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["data"]["status"], "graded");
        assert_eq!(body["data"]["points_earned"], 19.5);
    }

    #[actix_web::test]
    async fn test_nav_toggle_is_per_session() {
        let app = portal_app!();
        let cookie = login!(app, client_ip(), "admin@campus.test");

        let req = test::TestRequest::post()
            .uri("/api/v1/shell/nav/toggle")
            .cookie(cookie.clone())
            .to_request();
        let resp = test::call_service(&app, req).await;
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["data"]["nav_open"], false);

        let (_, body) = get_json!(app, "/api/v1/shell", cookie);
        assert_eq!(body["data"]["nav_open"], false);
        assert_eq!(body["data"]["kind"], "admin");
        assert_eq!(body["data"]["navigation"][0]["id"], "dashboard");
    }

    #[actix_web::test]
    async fn test_course_listing_and_submission() {
        let app = portal_app!();
        let ip = client_ip();

        let teacher = login!(app, ip, "teacher@campus.test");
        let (_, body) = get_json!(app, "/api/v1/courses?instructor=me", teacher);
        assert_eq!(body["data"]["data"].as_array().map(Vec::len), Some(3));
        let (status, _) = get_json!(app, "/api/v1/courses?instructor=nobody", teacher);
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let student = login!(app, ip, "student@campus.test");
        let (_, body) = get_json!(app, "/api/v1/assignments/upcoming", student);
        let upcoming = body["data"]["data"].as_array().cloned().unwrap_or_default();
        assert_eq!(upcoming.len(), 2);

        let assignment_id = upcoming[1]["id"].clone();
        let req = test::TestRequest::post()
            .uri("/api/v1/submissions")
            .cookie(student.clone())
            .set_json(json!({ "assignment_id": assignment_id, "content": "x = A^-1 b" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["data"]["status"], "submitted");

        let (_, body) = get_json!(app, "/api/v1/enrollments", student);
        assert_eq!(body["data"]["data"].as_array().map(Vec::len), Some(2));
    }

    fn course_id(courses: &Value, code: &str) -> String {
        courses["data"]["data"]
            .as_array()
            .and_then(|all| all.iter().find(|c| c["code"] == code))
            .and_then(|c| c["id"].as_str())
            .unwrap()
            .to_string()
    }

    #[actix_web::test]
    async fn test_course_catalog_lists_active_courses_by_name() {
        let app = portal_app!();
        let student = login!(app, client_ip(), "student@campus.test");

        let (status, body) = get_json!(app, "/api/v1/courses", student);
        assert_eq!(status, StatusCode::OK);
        let names: Vec<&str> = body["data"]["data"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|c| c["name"].as_str())
            .collect();
        assert_eq!(names, ["Intro to Programming", "Linear Algebra", "Statistics"]);

        let intro = course_id(&body, "CS101");
        let (status, body) = get_json!(app, &format!("/api/v1/courses/{intro}/materials"), student);
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["data"][0]["title"], "Syllabus");
    }

    #[actix_web::test]
    async fn test_staff_manage_courses() {
        let app = portal_app!();

        let student = login!(app, client_ip(), "student@campus.test");
        let new_course = json!({
            "name": "Compilers",
            "code": "CS420",
            "credits": 4,
            "semester": "Spring",
            "academic_year": "2026-2027",
        });
        let req = test::TestRequest::post()
            .uri("/api/v1/courses")
            .cookie(student.clone())
            .set_json(&new_course)
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

        let staff = login!(app, client_ip(), "staff@campus.test");
        let req = test::TestRequest::post()
            .uri("/api/v1/courses")
            .cookie(staff.clone())
            .set_json(&new_course)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let created: Value = test::read_body_json(resp).await;
        let id = created["data"]["id"].as_str().unwrap().to_string();

        let req = test::TestRequest::post()
            .uri("/api/v1/courses")
            .cookie(staff.clone())
            .set_json(&new_course)
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::patch()
            .uri(&format!("/api/v1/courses/{id}"))
            .cookie(staff.clone())
            .set_json(json!({ "name": "Compiler Construction" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["data"]["name"], "Compiler Construction");

        let (_, body) = get_json!(app, "/api/v1/courses", staff);
        assert!(
            body["data"]["data"]
                .as_array()
                .unwrap()
                .iter()
                .any(|c| c["name"] == "Compiler Construction")
        );
    }

    #[actix_web::test]
    async fn test_teacher_creates_assignment_and_students_enroll() {
        let app = portal_app!();

        let student = login!(app, client_ip(), "student@campus.test");
        let (_, catalog) = get_json!(app, "/api/v1/courses", student);
        let intro = course_id(&catalog, "CS101");
        let statistics = course_id(&catalog, "MATH210");

        let teacher = login!(app, client_ip(), "teacher@campus.test");
        let lab = json!({
            "course_id": intro,
            "title": "Lab 3: Recursion",
            "due_date": "2099-01-01T00:00:00Z",
            "max_points": 20,
        });
        let req = test::TestRequest::post()
            .uri("/api/v1/assignments")
            .cookie(student.clone())
            .set_json(&lab)
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);
        let req = test::TestRequest::post()
            .uri("/api/v1/assignments")
            .cookie(teacher.clone())
            .set_json(&lab)
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);

        let (_, body) = get_json!(app, "/api/v1/assignments/upcoming", student);
        assert!(
            body["data"]["data"]
                .as_array()
                .unwrap()
                .iter()
                .any(|a| a["title"] == "Lab 3: Recursion")
        );

        // 教师不能替学生选课
        let (_, me) = get_json!(app, "/api/v1/session", student);
        let student_id = me["data"]["identity"]["id"].clone();
        let req = test::TestRequest::post()
            .uri("/api/v1/enrollments")
            .cookie(teacher)
            .set_json(json!({ "course_id": statistics, "student_id": student_id }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

        let req = test::TestRequest::post()
            .uri("/api/v1/enrollments")
            .cookie(student.clone())
            .set_json(json!({ "course_id": statistics }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);

        let (_, body) = get_json!(app, "/api/v1/enrollments", student);
        assert_eq!(body["data"]["data"].as_array().map(Vec::len), Some(3));
    }
}

use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::PortalError;
use crate::models::assignments::CreateAssignmentRequest;
use crate::models::auth::SignUpRequest;
use crate::models::courses::{CreateCourseRequest, UpdateCourseRequest};
use crate::models::profiles::{UpdateProfileRequest, UserRole};

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").expect("Invalid email regex")
});

static PHONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+?[0-9 ()-]{6,20}$").expect("Invalid phone regex"));

static CAMPUS_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9-]{3,32}$").expect("Invalid campus id regex"));

static COURSE_CODE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9-]{2,16}$").expect("Invalid course code regex"));

static ACADEMIC_YEAR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-\d{4}$").expect("Invalid academic year regex"));

pub fn validate_email(email: &str) -> Result<(), &'static str> {
    if !EMAIL_RE.is_match(email) {
        return Err("Email format is invalid");
    }
    Ok(())
}

/// 密码策略：至少 8 位，同时包含字母和数字
pub fn validate_password(password: &str) -> Result<(), &'static str> {
    if password.chars().count() < 8 {
        return Err("Password must be at least 8 characters long");
    }
    if !password.chars().any(|c| c.is_alphabetic()) {
        return Err("Password must contain at least one letter");
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err("Password must contain at least one digit");
    }
    Ok(())
}

pub fn validate_full_name(name: &str) -> Result<(), &'static str> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err("Full name must not be empty");
    }
    if trimmed.chars().count() > 100 {
        return Err("Full name must be at most 100 characters");
    }
    Ok(())
}

pub fn validate_phone(phone: &str) -> Result<(), &'static str> {
    if !PHONE_RE.is_match(phone) {
        return Err("Phone number format is invalid");
    }
    Ok(())
}

/// 学号/工号
pub fn validate_campus_id(id: &str) -> Result<(), &'static str> {
    if !CAMPUS_ID_RE.is_match(id) {
        return Err("Student or employee ID format is invalid");
    }
    Ok(())
}

/// 注册请求整体校验
pub fn validate_sign_up(req: &SignUpRequest) -> Result<(), PortalError> {
    validate_email(&req.email).map_err(PortalError::validation)?;
    validate_password(&req.password).map_err(PortalError::validation)?;
    validate_full_name(&req.full_name).map_err(PortalError::validation)?;
    if req.role == UserRole::Unrecognized {
        return Err(PortalError::validation("Role is not supported"));
    }
    if let Some(ref phone) = req.phone {
        validate_phone(phone).map_err(PortalError::validation)?;
    }
    for id in [&req.student_id, &req.employee_id].into_iter().flatten() {
        validate_campus_id(id).map_err(PortalError::validation)?;
    }
    Ok(())
}

/// 资料更新校验
pub fn validate_profile_update(update: &UpdateProfileRequest) -> Result<(), PortalError> {
    if update.is_empty() {
        return Err(PortalError::validation("Nothing to update"));
    }
    if let Some(ref name) = update.full_name {
        validate_full_name(name).map_err(PortalError::validation)?;
    }
    if let Some(ref phone) = update.phone {
        validate_phone(phone).map_err(PortalError::validation)?;
    }
    Ok(())
}

fn validate_course_name(name: &str) -> Result<(), &'static str> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err("Course name must not be empty");
    }
    if trimmed.chars().count() > 200 {
        return Err("Course name must be at most 200 characters");
    }
    Ok(())
}

pub fn validate_course_code(code: &str) -> Result<(), &'static str> {
    if !COURSE_CODE_RE.is_match(code) {
        return Err("Course code format is invalid");
    }
    Ok(())
}

fn validate_credits(credits: i32) -> Result<(), &'static str> {
    if !(1..=12).contains(&credits) {
        return Err("Credits must be between 1 and 12");
    }
    Ok(())
}

fn validate_semester(semester: &str) -> Result<(), &'static str> {
    if semester.trim().is_empty() {
        return Err("Semester must not be empty");
    }
    Ok(())
}

/// 学年形如 `2025-2026`
pub fn validate_academic_year(year: &str) -> Result<(), &'static str> {
    if !ACADEMIC_YEAR_RE.is_match(year) {
        return Err("Academic year must look like 2025-2026");
    }
    Ok(())
}

/// 新建课程校验
pub fn validate_new_course(req: &CreateCourseRequest) -> Result<(), PortalError> {
    validate_course_name(&req.name).map_err(PortalError::validation)?;
    validate_course_code(&req.code).map_err(PortalError::validation)?;
    validate_credits(req.credits).map_err(PortalError::validation)?;
    validate_semester(&req.semester).map_err(PortalError::validation)?;
    validate_academic_year(&req.academic_year).map_err(PortalError::validation)?;
    Ok(())
}

/// 课程更新校验，只检查携带的字段
pub fn validate_course_update(update: &UpdateCourseRequest) -> Result<(), PortalError> {
    if update.is_empty() {
        return Err(PortalError::validation("Nothing to update"));
    }
    if let Some(ref name) = update.name {
        validate_course_name(name).map_err(PortalError::validation)?;
    }
    if let Some(ref code) = update.code {
        validate_course_code(code).map_err(PortalError::validation)?;
    }
    if let Some(credits) = update.credits {
        validate_credits(credits).map_err(PortalError::validation)?;
    }
    if let Some(ref semester) = update.semester {
        validate_semester(semester).map_err(PortalError::validation)?;
    }
    if let Some(ref year) = update.academic_year {
        validate_academic_year(year).map_err(PortalError::validation)?;
    }
    Ok(())
}

pub fn validate_new_assignment(req: &CreateAssignmentRequest) -> Result<(), PortalError> {
    let title = req.title.trim();
    if title.is_empty() {
        return Err(PortalError::validation("Assignment title must not be empty"));
    }
    if title.chars().count() > 200 {
        return Err(PortalError::validation(
            "Assignment title must be at most 200 characters",
        ));
    }
    if req.max_points <= 0 {
        return Err(PortalError::validation("Max points must be positive"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sign_up() -> SignUpRequest {
        SignUpRequest {
            email: "grace@campus.test".to_string(),
            password: "Hopper1906".to_string(),
            full_name: "Grace Hopper".to_string(),
            role: UserRole::Teacher,
            student_id: None,
            employee_id: Some("EMP-0042".to_string()),
            phone: None,
        }
    }

    #[test]
    fn test_email() {
        assert!(validate_email("a.b@campus.edu").is_ok());
        assert!(validate_email("no-at-sign").is_err());
        assert!(validate_email("x@y").is_err());
    }

    #[test]
    fn test_password_policy() {
        assert!(validate_password("Hopper1906").is_ok());
        assert_eq!(
            validate_password("Ab1"),
            Err("Password must be at least 8 characters long")
        );
        assert_eq!(
            validate_password("12345678"),
            Err("Password must contain at least one letter")
        );
        assert_eq!(
            validate_password("abcdefgh"),
            Err("Password must contain at least one digit")
        );
    }

    #[test]
    fn test_sign_up_request() {
        assert!(validate_sign_up(&sign_up()).is_ok());

        let mut bad = sign_up();
        bad.role = UserRole::Unrecognized;
        assert!(validate_sign_up(&bad).is_err());

        let mut bad = sign_up();
        bad.full_name = "   ".to_string();
        assert_eq!(
            validate_sign_up(&bad),
            Err(PortalError::validation("Full name must not be empty"))
        );

        let mut bad = sign_up();
        bad.employee_id = Some("!".to_string());
        assert!(validate_sign_up(&bad).is_err());
    }

    #[test]
    fn test_empty_profile_update_rejected() {
        assert!(validate_profile_update(&UpdateProfileRequest::default()).is_err());
        let update = UpdateProfileRequest {
            phone: Some("+1 555 0100".to_string()),
            ..Default::default()
        };
        assert!(validate_profile_update(&update).is_ok());
    }

    fn new_course() -> CreateCourseRequest {
        CreateCourseRequest {
            name: "Operating Systems".to_string(),
            code: "CS310".to_string(),
            description: None,
            credits: 4,
            semester: "Fall".to_string(),
            academic_year: "2026-2027".to_string(),
            department_id: None,
            instructor_id: None,
        }
    }

    #[test]
    fn test_new_course() {
        assert!(validate_new_course(&new_course()).is_ok());

        let mut bad = new_course();
        bad.code = "CS 310".to_string();
        assert_eq!(
            validate_new_course(&bad),
            Err(PortalError::validation("Course code format is invalid"))
        );

        let mut bad = new_course();
        bad.credits = 0;
        assert!(validate_new_course(&bad).is_err());

        let mut bad = new_course();
        bad.academic_year = "2026".to_string();
        assert_eq!(
            validate_new_course(&bad),
            Err(PortalError::validation("Academic year must look like 2025-2026"))
        );
    }

    #[test]
    fn test_course_update_checks_present_fields() {
        assert_eq!(
            validate_course_update(&UpdateCourseRequest::default()),
            Err(PortalError::validation("Nothing to update"))
        );
        let deactivate = UpdateCourseRequest {
            is_active: Some(false),
            ..Default::default()
        };
        assert!(validate_course_update(&deactivate).is_ok());
        let bad = UpdateCourseRequest {
            credits: Some(40),
            ..Default::default()
        };
        assert!(validate_course_update(&bad).is_err());
    }

    #[test]
    fn test_new_assignment() {
        let mut req = CreateAssignmentRequest {
            course_id: uuid::Uuid::nil(),
            title: "Lab 3: Recursion".to_string(),
            description: None,
            due_date: chrono::Utc::now(),
            max_points: 20,
        };
        assert!(validate_new_assignment(&req).is_ok());
        req.max_points = 0;
        assert!(validate_new_assignment(&req).is_err());
        req.max_points = 10;
        req.title = " ".to_string();
        assert!(validate_new_assignment(&req).is_err());
    }
}

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use crate::models::{ApiResponse, profiles::UpdateProfileRequest};
use crate::queries::QueryKey;
use crate::services::client_from;
use crate::utils::validate::validate_profile_update;

pub async fn handle_update_profile(
    update: UpdateProfileRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    if let Err(e) = validate_profile_update(&update) {
        return Ok(ApiResponse::from_error(&e));
    }

    let (session, client) = match client_from(request).await {
        Ok(pair) => pair,
        Err(e) => return Ok(ApiResponse::from_error(&e)),
    };

    match session.provider.update_profile(&update).await {
        Ok(profile) => {
            client.invalidate(&QueryKey::new("profiles")).await;
            Ok(HttpResponse::Ok().json(ApiResponse::success(profile, "Profile updated")))
        }
        Err(e) => Ok(ApiResponse::from_error(&e)),
    }
}

use axum::{
    extract::State,
    response::{IntoResponse, Json},
    Extension,
};

use crate::{
    dto::profile_dto::{ProfileResponse, UpdateProfilePayload},
    error::{Error, Result},
    middleware::auth::AuthUser,
    models::{profile::Profile, university::University},
    services::profile_service::ProfileService,
    AppState,
};

/// Profiles created before email sync have no address; the token's is used.
async fn profile_response(
    service: &ProfileService,
    user: &AuthUser,
    mut profile: Profile,
) -> Result<ProfileResponse> {
    if profile.email.is_none() {
        profile.email = user.email.clone();
    }
    let university: Option<University> = match profile.university_id {
        Some(id) => match service.get_university(id).await {
            Ok(university) => Some(university),
            Err(Error::NotFound(_)) => None,
            Err(e) => return Err(e),
        },
        None => None,
    };
    Ok(ProfileResponse::new(profile, university))
}

#[utoipa::path(
    get,
    path = "/api/profile",
    responses(
        (status = 200, description = "Caller's profile", body = Json<ProfileResponse>),
        (status = 404, description = "Profile not found")
    )
)]
#[axum::debug_handler]
pub async fn get_profile(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<impl IntoResponse> {
    let service = ProfileService::new(state.store.scoped(&user.access_token));
    let profile = service.get_profile(user.id).await?;
    Ok(Json(profile_response(&service, &user, profile).await?))
}

#[utoipa::path(
    patch,
    path = "/api/profile",
    request_body = UpdateProfilePayload,
    responses(
        (status = 200, description = "Profile updated", body = Json<ProfileResponse>),
        (status = 400, description = "Validation error")
    )
)]
#[axum::debug_handler]
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<UpdateProfilePayload>,
) -> Result<impl IntoResponse> {
    let service = ProfileService::new(state.store.scoped(&user.access_token));
    let profile = service.update_profile(user.id, payload).await?;
    Ok(Json(profile_response(&service, &user, profile).await?))
}

#[axum::debug_handler]
pub async fn list_universities(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<impl IntoResponse> {
    let universities = ProfileService::new(state.store.scoped(&user.access_token))
        .list_universities()
        .await?;
    Ok(Json(universities))
}

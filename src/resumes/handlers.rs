use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    auth::{jwt::AuthUser, repo::User},
    error::{ApiError, ApiResult},
    forms::FormData,
    pagination::{PageParams, Paginated},
    state::AppState,
    storage::{Category, UploadRules},
};

use super::dto::{CreateResume, ResumeFilter, ResumeResponse, UpdateResume};
use super::repo;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/resumes", get(list_resumes).post(create_resume))
        .route(
            "/resumes/:id",
            get(get_resume).put(update_resume).delete(delete_resume),
        )
        .route("/resumes/:id/download", get(download_resume))
        .layer(DefaultBodyLimit::max(11 * 1024 * 1024))
}

#[instrument(skip(state, _user))]
async fn list_resumes(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(params): Query<PageParams>,
    Query(filter): Query<ResumeFilter>,
) -> ApiResult<Json<Paginated<ResumeResponse>>> {
    params.validate()?;
    let (items, total) = tokio::try_join!(
        repo::list(&state.db, &filter, params.limit, params.offset()),
        repo::count(&state.db, &filter),
    )?;
    let data = items.into_iter().map(ResumeResponse::from).collect();
    Ok(Json(Paginated::new(data, total, &params)))
}

#[instrument(skip(state, _user))]
async fn get_resume(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ResumeResponse>> {
    let resume = repo::get(&state.db, id)
        .await?
        .ok_or(ApiError::NotFound("Resume"))?;
    Ok(Json(resume.into()))
}

#[instrument(skip(state, claims, mp))]
async fn create_resume(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    mp: Multipart,
) -> ApiResult<(StatusCode, Json<ResumeResponse>)> {
    let form = FormData::from_multipart(mp).await?;
    let input = CreateResume::from_form(&form).map_err(ApiError::Validation)?;

    let file = form
        .file("resume")
        .ok_or_else(|| ApiError::BadRequest("No file uploaded".into()))?;

    // the display name carries the owner's name, so look it up first
    let user = User::find_by_id(&state.db, claims.sub)
        .await?
        .ok_or(ApiError::Unauthenticated("User not found"))?;
    let file_name = format!("{} {}", user.name, input.language);

    let staged = state
        .storage
        .stage(file.bytes.clone(), &file.content_type, &UploadRules::pdf())
        .await?;
    let file_path = state.storage.commit(staged, Category::Resumes).await?;

    let resume = repo::create(
        &state.db,
        &file_name,
        &file_path,
        &input.language,
        input.is_public,
    )
    .await?;

    info!(resume_id = %resume.id, "resume uploaded");
    Ok((StatusCode::CREATED, Json(resume.into())))
}

#[instrument(skip(state, claims, mp))]
async fn update_resume(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(id): Path<Uuid>,
    mp: Multipart,
) -> ApiResult<Json<ResumeResponse>> {
    let existing = repo::get(&state.db, id)
        .await?
        .ok_or(ApiError::NotFound("Resume"))?;

    let form = FormData::from_multipart(mp).await?;
    let input = UpdateResume::from_form(&form).map_err(ApiError::Validation)?;

    let new_path = match form.file("resume") {
        Some(file) => {
            let staged = state
                .storage
                .stage(file.bytes.clone(), &file.content_type, &UploadRules::pdf())
                .await?;
            Some(state.storage.commit(staged, Category::Resumes).await?)
        }
        None => None,
    };

    // regenerate the display name when the language changes
    let new_name = match input.language.as_deref() {
        Some(lang) if lang != existing.language => {
            let user = User::find_by_id(&state.db, claims.sub)
                .await?
                .ok_or(ApiError::Unauthenticated("User not found"))?;
            Some(format!("{} {}", user.name, lang))
        }
        _ => None,
    };

    let resume = repo::update(
        &state.db,
        id,
        &input,
        new_name.as_deref(),
        new_path.as_deref(),
    )
    .await?
    .ok_or(ApiError::NotFound("Resume"))?;

    if new_path.is_some() {
        state.storage.remove(&existing.file_path).await;
    }

    info!(resume_id = %resume.id, "resume updated");
    Ok(Json(resume.into()))
}

#[instrument(skip(state, _user))]
async fn download_resume(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let resume = repo::get(&state.db, id)
        .await?
        .ok_or(ApiError::NotFound("Resume"))?;

    let (bytes, content_type) = state.storage.open(&resume.file_path).await?;
    let disposition = format!("attachment; filename=\"{}.pdf\"", resume.file_name);
    Ok((
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    ))
}

#[instrument(skip(state, _user))]
async fn delete_resume(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let existing = repo::get(&state.db, id)
        .await?
        .ok_or(ApiError::NotFound("Resume"))?;

    state.storage.remove(&existing.file_path).await;
    if !repo::delete(&state.db, id).await? {
        return Err(ApiError::NotFound("Resume"));
    }

    info!(resume_id = %id, "resume deleted");
    Ok(StatusCode::NO_CONTENT)
}

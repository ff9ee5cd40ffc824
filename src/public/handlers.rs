use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    emails::dto::CreateEmail,
    error::{ApiError, ApiResult},
    pagination::{PageParams, Paginated},
    resumes::dto::ResumeResponse,
    skills::dto::SkillResponse,
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/public/projects", get(public_projects))
        .route("/public/skills", get(public_skills))
        .route("/public/resumes", get(public_resumes))
        .route("/public/image", get(public_image))
        .route("/public/pdf", get(public_pdf))
        .route("/public/email", post(submit_email))
}

/// Public projection of a project; the skill association stays internal.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PublicProject {
    id: Uuid,
    name: String,
    description: String,
    website_link: Option<String>,
    github_link: Option<String>,
    image_url: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    updated_at: OffsetDateTime,
}

#[instrument(skip(state))]
async fn public_projects(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> ApiResult<Json<Paginated<PublicProject>>> {
    params.validate()?;
    let (items, total) = tokio::try_join!(
        crate::projects::repo::list_public(&state.db, params.limit, params.offset()),
        crate::projects::repo::count_public(&state.db),
    )?;
    let data = items
        .into_iter()
        .map(|p| PublicProject {
            id: p.id,
            name: p.name,
            description: p.description,
            website_link: p.website_link,
            github_link: p.github_link,
            image_url: p.image_url,
            created_at: p.created_at,
            updated_at: p.updated_at,
        })
        .collect();
    Ok(Json(Paginated::new(data, total, &params)))
}

// whole-set responses: these collections stay small
#[instrument(skip(state))]
async fn public_skills(State(state): State<AppState>) -> ApiResult<Json<Vec<SkillResponse>>> {
    let skills = crate::skills::repo::list_public(&state.db).await?;
    Ok(Json(skills.into_iter().map(SkillResponse::from).collect()))
}

#[instrument(skip(state))]
async fn public_resumes(State(state): State<AppState>) -> ApiResult<Json<Vec<ResumeResponse>>> {
    let resumes = crate::resumes::repo::list_public(&state.db).await?;
    Ok(Json(resumes.into_iter().map(ResumeResponse::from).collect()))
}

#[derive(Debug, Deserialize)]
struct FileQuery {
    path: String,
}

async fn serve_file(
    state: &AppState,
    path: &str,
    accept: fn(&str) -> bool,
) -> ApiResult<impl IntoResponse> {
    let (bytes, content_type) = state.storage.open(path).await.map_err(|e| {
        warn!(path, error = %e, "public file request refused");
        ApiError::from(e)
    })?;
    if !accept(content_type) {
        warn!(path, content_type, "public file request with wrong type");
        return Err(ApiError::Forbidden);
    }
    Ok(([(header::CONTENT_TYPE, content_type)], bytes))
}

#[instrument(skip(state))]
async fn public_image(
    State(state): State<AppState>,
    Query(query): Query<FileQuery>,
) -> ApiResult<impl IntoResponse> {
    serve_file(&state, &query.path, |ct| ct.starts_with("image/")).await
}

#[instrument(skip(state))]
async fn public_pdf(
    State(state): State<AppState>,
    Query(query): Query<FileQuery>,
) -> ApiResult<impl IntoResponse> {
    serve_file(&state, &query.path, |ct| ct == "application/pdf").await
}

#[instrument(skip(state, payload))]
async fn submit_email(
    State(state): State<AppState>,
    Json(payload): Json<CreateEmail>,
) -> ApiResult<(StatusCode, Json<crate::emails::dto::EmailResponse>)> {
    let errors = payload.validate();
    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }
    let email = crate::emails::repo::create(&state.db, &payload).await?;
    info!(email_id = %email.id, "contact message received");
    Ok((StatusCode::CREATED, Json(email.into())))
}

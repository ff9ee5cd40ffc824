use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    auth::jwt::AuthUser,
    error::{ApiError, ApiResult},
    forms::{FormData, UploadedFile},
    pagination::{PageParams, Paginated},
    state::AppState,
    storage::{Category, UploadRules},
};

use super::dto::{CreateSkill, SkillResponse, UpdateSkill};
use super::repo;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/skills", get(list_skills).post(create_skill))
        .route(
            "/skills/:id",
            get(get_skill).put(update_skill).delete(delete_skill),
        )
        // two image slots per request
        .layer(DefaultBodyLimit::max(11 * 1024 * 1024))
}

async fn commit_image(
    state: &AppState,
    file: Option<&UploadedFile>,
) -> ApiResult<Option<String>> {
    match file {
        Some(file) => {
            let staged = state
                .storage
                .stage(file.bytes.clone(), &file.content_type, &UploadRules::image())
                .await?;
            Ok(Some(state.storage.commit(staged, Category::Skills).await?))
        }
        None => Ok(None),
    }
}

#[instrument(skip(state, _user))]
async fn list_skills(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(params): Query<PageParams>,
) -> ApiResult<Json<Paginated<SkillResponse>>> {
    params.validate()?;
    let (items, total) = tokio::try_join!(
        repo::list(&state.db, params.limit, params.offset()),
        repo::count(&state.db),
    )?;
    let data = items.into_iter().map(SkillResponse::from).collect();
    Ok(Json(Paginated::new(data, total, &params)))
}

#[instrument(skip(state, _user))]
async fn get_skill(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<SkillResponse>> {
    let skill = repo::get(&state.db, id)
        .await?
        .ok_or(ApiError::NotFound("Skill"))?;
    Ok(Json(skill.into()))
}

#[instrument(skip(state, _user, mp))]
async fn create_skill(
    State(state): State<AppState>,
    _user: AuthUser,
    mp: Multipart,
) -> ApiResult<(StatusCode, Json<SkillResponse>)> {
    let form = FormData::from_multipart(mp).await?;
    let input = CreateSkill::from_form(&form).map_err(ApiError::Validation)?;

    let light = commit_image(&state, form.file("lightImage")).await?;
    let dark = commit_image(&state, form.file("darkImage")).await?;

    let skill = repo::create(&state.db, &input, light.as_deref(), dark.as_deref()).await?;
    info!(skill_id = %skill.id, "skill created");
    Ok((StatusCode::CREATED, Json(skill.into())))
}

#[instrument(skip(state, _user, mp))]
async fn update_skill(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<Uuid>,
    mp: Multipart,
) -> ApiResult<Json<SkillResponse>> {
    let existing = repo::get(&state.db, id)
        .await?
        .ok_or(ApiError::NotFound("Skill"))?;

    let form = FormData::from_multipart(mp).await?;
    let input = UpdateSkill::from_form(&form).map_err(ApiError::Validation)?;

    let new_light = commit_image(&state, form.file("lightImage")).await?;
    let new_dark = commit_image(&state, form.file("darkImage")).await?;

    let skill = repo::update(&state.db, id, &input, new_light.as_deref(), new_dark.as_deref())
        .await?
        .ok_or(ApiError::NotFound("Skill"))?;

    // superseded images go away only once the row references the new ones
    if new_light.is_some() {
        if let Some(old) = existing.light_image_url.as_deref() {
            state.storage.remove(old).await;
        }
    }
    if new_dark.is_some() {
        if let Some(old) = existing.dark_image_url.as_deref() {
            state.storage.remove(old).await;
        }
    }

    info!(skill_id = %skill.id, "skill updated");
    Ok(Json(skill.into()))
}

#[instrument(skip(state, _user))]
async fn delete_skill(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let existing = repo::get(&state.db, id)
        .await?
        .ok_or(ApiError::NotFound("Skill"))?;

    for image in [
        existing.light_image_url.as_deref(),
        existing.dark_image_url.as_deref(),
    ]
    .into_iter()
    .flatten()
    {
        state.storage.remove(image).await;
    }
    if !repo::delete(&state.db, id).await? {
        return Err(ApiError::NotFound("Skill"));
    }

    info!(skill_id = %id, "skill deleted");
    Ok(StatusCode::NO_CONTENT)
}

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
    forms::FormData,
    pagination::{PageParams, Paginated},
    state::AppState,
    storage::{Category, UploadRules},
};

use super::dto::{CreateProject, ProjectResponse, UpdateProject};
use super::repo;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/projects", get(list_projects).post(create_project))
        .route(
            "/projects/:id",
            get(get_project).put(update_project).delete(delete_project),
        )
        // fields + one 5 MB image, with headroom for the multipart framing
        .layer(DefaultBodyLimit::max(6 * 1024 * 1024))
}

#[instrument(skip(state, _user))]
async fn list_projects(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(params): Query<PageParams>,
) -> ApiResult<Json<Paginated<ProjectResponse>>> {
    params.validate()?;
    let (items, total) = tokio::try_join!(
        repo::list(&state.db, params.limit, params.offset()),
        repo::count(&state.db),
    )?;

    let ids: Vec<Uuid> = items.iter().map(|p| p.id).collect();
    let pairs = repo::skill_ids_for(&state.db, &ids).await?;
    let data = items
        .into_iter()
        .map(|project| {
            let skills = pairs
                .iter()
                .filter(|(pid, _)| *pid == project.id)
                .map(|(_, sid)| *sid)
                .collect();
            ProjectResponse::from_parts(project, skills)
        })
        .collect();

    Ok(Json(Paginated::new(data, total, &params)))
}

#[instrument(skip(state, _user))]
async fn get_project(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ProjectResponse>> {
    let project = repo::get(&state.db, id)
        .await?
        .ok_or(ApiError::NotFound("Project"))?;
    let skills = repo::skill_ids_of(&state.db, id).await?;
    Ok(Json(ProjectResponse::from_parts(project, skills)))
}

#[instrument(skip(state, _user, mp))]
async fn create_project(
    State(state): State<AppState>,
    _user: AuthUser,
    mp: Multipart,
) -> ApiResult<(StatusCode, Json<ProjectResponse>)> {
    let form = FormData::from_multipart(mp).await?;
    let input = CreateProject::from_form(&form).map_err(ApiError::Validation)?;

    let image_url = match form.file("image") {
        Some(file) => {
            let staged = state
                .storage
                .stage(file.bytes.clone(), &file.content_type, &UploadRules::image())
                .await?;
            Some(state.storage.commit(staged, Category::Projects).await?)
        }
        None => None,
    };

    let project = repo::create(&state.db, &input, image_url.as_deref()).await?;

    let skills = repo::resolve_skill_ids(&state.db, &input.skills).await?;
    if !skills.is_empty() {
        repo::replace_skills(&state.db, project.id, &skills).await?;
    }

    info!(project_id = %project.id, "project created");
    Ok((
        StatusCode::CREATED,
        Json(ProjectResponse::from_parts(project, skills)),
    ))
}

#[instrument(skip(state, _user, mp))]
async fn update_project(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<Uuid>,
    mp: Multipart,
) -> ApiResult<Json<ProjectResponse>> {
    let existing = repo::get(&state.db, id)
        .await?
        .ok_or(ApiError::NotFound("Project"))?;

    let form = FormData::from_multipart(mp).await?;
    let input = UpdateProject::from_form(&form).map_err(ApiError::Validation)?;

    // Commit the replacement first; the old file goes away only after the row
    // points at the new one.
    let new_image = match form.file("image") {
        Some(file) => {
            let staged = state
                .storage
                .stage(file.bytes.clone(), &file.content_type, &UploadRules::image())
                .await?;
            Some(state.storage.commit(staged, Category::Projects).await?)
        }
        None => None,
    };

    let project = repo::update(&state.db, id, &input, new_image.as_deref())
        .await?
        .ok_or(ApiError::NotFound("Project"))?;

    if !input.skills.is_empty() {
        let resolved = repo::resolve_skill_ids(&state.db, &input.skills).await?;
        repo::replace_skills(&state.db, project.id, &resolved).await?;
    }

    if new_image.is_some() {
        if let Some(old) = existing.image_url.as_deref() {
            state.storage.remove(old).await;
        }
    }

    let skills = repo::skill_ids_of(&state.db, project.id).await?;
    info!(project_id = %project.id, "project updated");
    Ok(Json(ProjectResponse::from_parts(project, skills)))
}

#[instrument(skip(state, _user))]
async fn delete_project(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let existing = repo::get(&state.db, id)
        .await?
        .ok_or(ApiError::NotFound("Project"))?;

    if let Some(image) = existing.image_url.as_deref() {
        state.storage.remove(image).await;
    }
    if !repo::delete(&state.db, id).await? {
        return Err(ApiError::NotFound("Project"));
    }

    info!(project_id = %id, "project deleted");
    Ok(StatusCode::NO_CONTENT)
}

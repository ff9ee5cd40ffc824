use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use time::OffsetDateTime;
use tracing::instrument;
use uuid::Uuid;

use crate::{
    auth::jwt::AuthUser, error::ApiResult, resumes::dto::ResumeFilter, state::AppState,
};

const RECENT_LIMIT: i64 = 3;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DashboardKpis {
    total_projects: i64,
    total_skills: i64,
    total_resumes: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RecentProject {
    id: Uuid,
    name: String,
    description: String,
    image_url: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    created_at: OffsetDateTime,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RecentSkill {
    id: Uuid,
    name: String,
    category: String,
    light_image_url: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    created_at: OffsetDateTime,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DashboardResponse {
    kpis: DashboardKpis,
    recent_projects: Vec<RecentProject>,
    recent_skills: Vec<RecentSkill>,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/dashboard", get(dashboard))
}

#[instrument(skip(state, _user))]
async fn dashboard(
    State(state): State<AppState>,
    _user: AuthUser,
) -> ApiResult<Json<DashboardResponse>> {
    // independent read-only aggregates, issued concurrently
    let resume_filter = ResumeFilter::default();
    let (total_projects, total_skills, total_resumes, projects, skills) = tokio::try_join!(
        crate::projects::repo::count(&state.db),
        crate::skills::repo::count(&state.db),
        crate::resumes::repo::count(&state.db, &resume_filter),
        crate::projects::repo::list(&state.db, RECENT_LIMIT, 0),
        crate::skills::repo::list(&state.db, RECENT_LIMIT, 0),
    )?;

    Ok(Json(DashboardResponse {
        kpis: DashboardKpis {
            total_projects,
            total_skills,
            total_resumes,
        },
        recent_projects: projects
            .into_iter()
            .map(|p| RecentProject {
                id: p.id,
                name: p.name,
                description: p.description,
                image_url: p.image_url,
                created_at: p.created_at,
            })
            .collect(),
        recent_skills: skills
            .into_iter()
            .map(|s| RecentSkill {
                id: s.id,
                name: s.name,
                category: s.category,
                light_image_url: s.light_image_url,
                created_at: s.created_at,
            })
            .collect(),
    }))
}

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use tracing::instrument;

use crate::{
    auth::jwt::AuthUser,
    error::ApiResult,
    pagination::{PageParams, Paginated},
    state::AppState,
};

use super::dto::EmailResponse;
use super::repo;

pub fn routes() -> Router<AppState> {
    Router::new().route("/emails", get(list_emails))
}

#[instrument(skip(state, _user))]
async fn list_emails(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(params): Query<PageParams>,
) -> ApiResult<Json<Paginated<EmailResponse>>> {
    params.validate()?;
    let (items, total) = tokio::try_join!(
        repo::list(&state.db, params.limit, params.offset()),
        repo::count(&state.db),
    )?;
    let data = items.into_iter().map(EmailResponse::from).collect();
    Ok(Json(Paginated::new(data, total, &params)))
}

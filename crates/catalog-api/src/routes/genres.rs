//! Genre endpoints.

use axum::Json;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use catalog_domain::{Genre, ListQuery};

use super::{PageParams, non_empty, params};
use crate::context::ApiContext;
use crate::error::{ApiError, ApiResult};

const DEFAULT_PAGE_SIZE: u32 = 50;

pub async fn list_genres(
    State(ctx): State<ApiContext>,
    query: Result<Query<PageParams>, QueryRejection>,
) -> ApiResult<Json<Vec<Genre>>> {
    let page = params(query)?.page(DEFAULT_PAGE_SIZE)?;
    let genres = ctx.genres.list(&ListQuery::new(page)).await?;
    Ok(Json(non_empty(genres, "genre", "listing")?))
}

pub async fn genre_details(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> ApiResult<Json<Genre>> {
    ctx.genres
        .get_by_id(&id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("genre", id))
}

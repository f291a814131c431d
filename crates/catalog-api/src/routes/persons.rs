//! Person endpoints.

use axum::Json;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use catalog_domain::{ListQuery, Person};

use super::{PageParams, non_empty, params};
use crate::context::ApiContext;
use crate::error::{ApiError, ApiResult};

const DEFAULT_PAGE_SIZE: u32 = 20;

pub async fn list_persons(
    State(ctx): State<ApiContext>,
    query: Result<Query<PageParams>, QueryRejection>,
) -> ApiResult<Json<Vec<Person>>> {
    let page = params(query)?.page(DEFAULT_PAGE_SIZE)?;
    let persons = ctx.persons.list(&ListQuery::new(page)).await?;
    Ok(Json(non_empty(persons, "person", "listing")?))
}

pub async fn search_persons(
    State(ctx): State<ApiContext>,
    Path(text): Path<String>,
) -> ApiResult<Json<Vec<Person>>> {
    let persons = ctx.persons.search(&text).await?;
    Ok(Json(non_empty(persons, "person", &text)?))
}

pub async fn person_details(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> ApiResult<Json<Person>> {
    ctx.persons
        .get_by_id(&id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("person", id))
}

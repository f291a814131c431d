//! Film endpoints.

use axum::Json;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use catalog_domain::{Film, FilmShort, Filter, ListQuery, SortSpec};
use serde::Deserialize;

use super::{PageParams, non_empty, params};
use crate::context::ApiContext;
use crate::error::{ApiError, ApiResult};

const DEFAULT_SORT: &str = "-imdb_rating";
const DEFAULT_PAGE_SIZE: u32 = 20;

/// `GET /films` query parameters
#[derive(Debug, Default, Deserialize)]
pub struct FilmListParams {
    /// `field` or `-field` for descending
    pub sort: Option<String>,
    pub filter_genre: Option<String>,
    pub page_number: Option<u32>,
    pub page_size: Option<u32>,
}

impl FilmListParams {
    fn into_query(self) -> ApiResult<ListQuery> {
        let page = PageParams {
            page_number: self.page_number,
            page_size: self.page_size,
        }
        .page(DEFAULT_PAGE_SIZE)?;
        let sort = SortSpec::from_param(self.sort.as_deref().unwrap_or(DEFAULT_SORT))?;

        let mut query = ListQuery::new(page).sorted_by(sort);
        if let Some(genre_id) = self.filter_genre {
            query = query.filtered_by(Filter::new("genre.id", genre_id));
        }
        Ok(query)
    }
}

fn shorts(films: &[Film]) -> Vec<FilmShort> {
    films.iter().map(FilmShort::from).collect()
}

pub async fn list_films(
    State(ctx): State<ApiContext>,
    query: Result<Query<FilmListParams>, QueryRejection>,
) -> ApiResult<Json<Vec<FilmShort>>> {
    let query = params(query)?.into_query()?;
    let films = ctx.films.list(&query).await?;
    Ok(Json(non_empty(shorts(&films), "film", "listing")?))
}

pub async fn search_films(
    State(ctx): State<ApiContext>,
    Path(text): Path<String>,
) -> ApiResult<Json<Vec<FilmShort>>> {
    let films = ctx.films.search(&text).await?;
    Ok(Json(non_empty(shorts(&films), "film", &text)?))
}

pub async fn film_details(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> ApiResult<Json<Film>> {
    match ctx.films.get_by_id(&id).await? {
        Some(film) => Ok(Json(film)),
        None => Err(ApiError::not_found("film", id)),
    }
}

pub async fn alike_films(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<FilmShort>>> {
    let films = ctx.films.related(&id).await?;
    Ok(Json(non_empty(shorts(&films), "film", &id)?))
}

pub async fn popular_in_genre(
    State(ctx): State<ApiContext>,
    Path(genre_id): Path<String>,
) -> ApiResult<Json<Vec<FilmShort>>> {
    let films = ctx.films.popular_in_genre(&genre_id).await?;
    Ok(Json(non_empty(shorts(&films), "genre", &genre_id)?))
}

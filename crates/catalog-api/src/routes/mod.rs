//! # REST Routes
//!
//! Handlers for the `/api/v1` surface. Each one turns request parameters into
//! a service call; absent entities and empty listings become 404s.

pub mod films;
pub mod genres;
pub mod persons;

use axum::Router;
use axum::extract::Query;
use axum::extract::rejection::QueryRejection;
use axum::routing::get;
use catalog_domain::Page;
use serde::Deserialize;

use crate::context::ApiContext;
use crate::error::{ApiError, ApiResult};

/// Routes mounted under `/api/v1`
pub fn api_routes() -> Router<ApiContext> {
    Router::new()
        .route("/films", get(films::list_films))
        .route("/films/search/{query}", get(films::search_films))
        .route("/films/genre/{genre_id}", get(films::popular_in_genre))
        .route("/films/{id}", get(films::film_details))
        .route("/films/{id}/alike", get(films::alike_films))
        .route("/persons", get(persons::list_persons))
        .route("/persons/search/{query}", get(persons::search_persons))
        .route("/persons/{id}", get(persons::person_details))
        .route("/genres", get(genres::list_genres))
        .route("/genres/{id}", get(genres::genre_details))
}

/// `page_number` / `page_size` query parameters
#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub page_number: Option<u32>,
    pub page_size: Option<u32>,
}

impl PageParams {
    fn page(&self, default_size: u32) -> ApiResult<Page> {
        Ok(Page::new(
            self.page_number.unwrap_or(0),
            self.page_size.unwrap_or(default_size),
        )?)
    }
}

/// Unwrap query parameters, reporting bad ones as a JSON 400
fn params<T>(query: Result<Query<T>, QueryRejection>) -> ApiResult<T> {
    Ok(query?.0)
}

/// An empty listing is a 404
fn non_empty<T>(items: Vec<T>, entity_type: &'static str, what: &str) -> ApiResult<Vec<T>> {
    if items.is_empty() {
        Err(ApiError::not_found(entity_type, what))
    } else {
        Ok(items)
    }
}

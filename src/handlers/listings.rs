use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;

use crate::errors::AppError;
use crate::models::BusinessListing;
use crate::services::listing;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct ListingQuery {
    pub category: Option<String>,
    pub search: Option<String>,
}

// GET /api/business-listings
pub async fn list_businesses(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListingQuery>,
) -> Result<Json<Vec<BusinessListing>>, AppError> {
    let db = state.store()?;
    let listings = listing::business_listings(&*db, query.category.as_deref(), query.search.as_deref())?;
    Ok(Json(listings))
}

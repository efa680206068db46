use std::str::FromStr;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::response::Json;
use tracing::{debug, instrument};

use crate::api::error::ApiError;
use crate::application::services::{CustomerDetail, DivisionTree, SelectOption};
use crate::domain::{CustomerId, DivisionId};
use crate::infrastructure::di::ServiceContainer;

pub type AppState = Arc<ServiceContainer>;

fn parse_id<T: FromStr>(raw: &str) -> Result<T, ApiError> {
    raw.parse().map_err(|_| ApiError::BadId(raw.to_string()))
}

/// `GET /api/admin-divs/`
#[instrument(level = "debug", skip(state))]
pub async fn list_admin_divs(
    State(state): State<AppState>,
) -> Result<Json<Vec<DivisionTree>>, ApiError> {
    let tree = state.presentation.nested_tree(None)?;
    debug!("{} root divisions", tree.len());
    Ok(Json(tree))
}

/// `GET /api/admin-divs/{id}/`
#[instrument(level = "debug", skip(state))]
pub async fn get_admin_div(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<DivisionTree>>, ApiError> {
    let id: DivisionId = parse_id(&id)?;
    Ok(Json(state.presentation.nested_tree(Some(id))?))
}

/// `GET /api/admin-divs/options/`
#[instrument(level = "debug", skip(state))]
pub async fn admin_div_options(
    State(state): State<AppState>,
) -> Result<Json<Vec<SelectOption>>, ApiError> {
    Ok(Json(state.presentation.select_options()?))
}

/// `GET /api/customer/{id}/`
#[instrument(level = "debug", skip(state))]
pub async fn get_customer(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<CustomerDetail>, ApiError> {
    let id: CustomerId = parse_id(&id)?;
    Ok(Json(state.customers.detail(id)?))
}

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::{header::LOCATION, HeaderMap, HeaderValue, StatusCode},
    routing::get,
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use crate::{
    auth::extractors::AuthUser,
    error::AppError,
    recipes::{
        dto::{RecipeDetails, RecipeInput, RecipeSummary, SuccessResponse},
        services,
    },
    state::AppState,
};

pub fn recipe_routes() -> Router<AppState> {
    Router::new()
        .route("/recipes", get(list_recipes).post(create_recipe))
        .route(
            "/recipes/:id",
            get(get_recipe).put(update_recipe).delete(delete_recipe),
        )
}

/// An id that does not parse can never have been created.
fn recipe_id(path: Result<Path<Uuid>, PathRejection>) -> Result<Uuid, AppError> {
    path.map(|Path(id)| id)
        .map_err(|_| AppError::not_found("Recipe not found"))
}

#[instrument(skip(state))]
pub async fn list_recipes(
    State(state): State<AppState>,
) -> Result<Json<Vec<RecipeSummary>>, AppError> {
    services::list_public(&state.db).await.map(Json)
}

/// POST /recipes
#[instrument(skip_all, fields(user_id = %principal.id))]
pub async fn create_recipe(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    payload: Result<Json<RecipeInput>, JsonRejection>,
) -> Result<(StatusCode, HeaderMap, Json<RecipeDetails>), AppError> {
    let Json(payload) = payload?;
    let recipe = services::create(&state.db, &principal, payload).await?;

    let mut headers = HeaderMap::new();
    if let Ok(location) = HeaderValue::from_str(&format!("/api/recipes/{}", recipe.id)) {
        headers.insert(LOCATION, location);
    }

    Ok((StatusCode::CREATED, headers, Json(recipe)))
}

#[instrument(skip_all)]
pub async fn get_recipe(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<RecipeDetails>, AppError> {
    let id = recipe_id(path)?;
    services::get_detail(&state.db, id).await.map(Json)
}

#[instrument(skip_all, fields(user_id = %principal.id))]
pub async fn update_recipe(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<RecipeInput>, JsonRejection>,
) -> Result<Json<SuccessResponse>, AppError> {
    let id = recipe_id(path)?;
    let Json(payload) = payload?;
    services::update(&state.db, &principal, id, payload)
        .await
        .map(Json)
}

#[instrument(skip_all, fields(user_id = %principal.id))]
pub async fn delete_recipe(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<SuccessResponse>, AppError> {
    let id = recipe_id(path)?;
    services::delete(&state.db, &principal, id).await.map(Json)
}

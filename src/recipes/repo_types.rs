use sqlx::FromRow;
use time::OffsetDateTime;
use tracing::warn;
use uuid::Uuid;

use crate::recipes::dto::{RecipeDetails, RecipeSummary};

/// Full `recipes` row; list columns are still JSON text here.
#[derive(Debug, Clone, FromRow)]
pub struct RecipeRow {
    pub id: Uuid,
    pub title: String,
    pub ingredients: Option<String>,
    pub preparation: Option<String>,
    pub tags: String,
    pub image: Option<String>,
    pub owner_id: Uuid,
    pub created_at: OffsetDateTime,
}

/// Columns selected for the public listing.
#[derive(Debug, Clone, FromRow)]
pub struct RecipeListRow {
    pub id: Uuid,
    pub title: String,
    pub tags: String,
    pub image: Option<String>,
    pub owner_id: Uuid,
    pub created_at: OffsetDateTime,
}

pub fn encode_list(items: &[String]) -> String {
    serde_json::to_string(items).unwrap_or_else(|_| "[]".into())
}

/// NULL or unreadable stored lists come back empty.
pub fn decode_list(raw: Option<&str>, recipe_id: Uuid, column: &'static str) -> Vec<String> {
    let Some(raw) = raw else {
        return Vec::new();
    };
    match serde_json::from_str::<Option<Vec<String>>>(raw) {
        Ok(items) => items.unwrap_or_default(),
        Err(e) => {
            warn!(%recipe_id, column, error = %e, "stored list is not valid json; using empty list");
            Vec::new()
        }
    }
}

impl From<RecipeRow> for RecipeDetails {
    fn from(r: RecipeRow) -> Self {
        Self {
            ingredients: decode_list(r.ingredients.as_deref(), r.id, "ingredients"),
            preparation: decode_list(r.preparation.as_deref(), r.id, "preparation"),
            id: r.id,
            title: r.title,
            tags: r.tags,
            image: r.image,
            owner_id: r.owner_id,
            created_at: r.created_at,
        }
    }
}

impl From<RecipeListRow> for RecipeSummary {
    fn from(r: RecipeListRow) -> Self {
        Self {
            id: r.id,
            title: r.title,
            tags: r.tags,
            image: r.image,
            owner_id: r.owner_id,
            created_at: r.created_at,
        }
    }
}

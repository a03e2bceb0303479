use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// Body of create and update. Everything is optional at the wire level;
/// `RecipeFields` decides what is actually required.
#[derive(Debug, Default, Deserialize)]
pub struct RecipeInput {
    pub title: Option<String>,
    pub ingredients: Option<Vec<String>>,
    pub preparation: Option<Vec<String>>,
    pub tags: Option<String>,
    pub image: Option<String>,
}

/// Validated, storable recipe content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipeFields {
    pub title: String,
    pub ingredients: Vec<String>,
    pub preparation: Vec<String>,
    pub tags: String,
    pub image: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeDetails {
    pub id: Uuid,
    pub title: String,
    pub ingredients: Vec<String>,
    pub preparation: Vec<String>,
    pub tags: String,
    pub image: Option<String>,
    pub owner_id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Public listing entry: no ingredients or preparation.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeSummary {
    pub id: Uuid,
    pub title: String,
    pub tags: String,
    pub image: Option<String>,
    pub owner_id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    pub fn ok() -> Self {
        Self { success: true }
    }
}

use base64ct::{Base64, Encoding};
use sqlx::SqlitePool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    auth::{self, Principal},
    error::AppError,
    recipes::{
        dto::{RecipeDetails, RecipeFields, RecipeInput, RecipeSummary, SuccessResponse},
        repo,
    },
};

impl TryFrom<RecipeInput> for RecipeFields {
    type Error = AppError;

    fn try_from(input: RecipeInput) -> Result<Self, Self::Error> {
        let title = input
            .title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AppError::validation("Title is required"))?;

        let image = match input.image {
            Some(img) if !img.trim().is_empty() => {
                let img = img.trim().to_string();
                validate_image(&img)?;
                Some(img)
            }
            _ => None,
        };

        Ok(Self {
            title,
            ingredients: input.ingredients.unwrap_or_default(),
            preparation: input.preparation.unwrap_or_default(),
            tags: input.tags.unwrap_or_default(),
            image,
        })
    }
}

/// Accepts `data:image/<type>;base64,<payload>` with a well-formed payload.
fn validate_image(uri: &str) -> Result<(), AppError> {
    let invalid = || AppError::validation("Image must be a base64 data URI");

    let rest = uri.strip_prefix("data:").ok_or_else(invalid)?;
    let (meta, payload) = rest.split_once(',').ok_or_else(invalid)?;
    let mime = meta.strip_suffix(";base64").ok_or_else(invalid)?;
    if !mime.starts_with("image/") {
        return Err(invalid());
    }
    Base64::decode_vec(payload).map_err(|_| invalid())?;
    Ok(())
}

/// Existence first, then ownership.
async fn authorize(db: &SqlitePool, principal: &Principal, id: Uuid) -> Result<(), AppError> {
    let owner = repo::owner_of(db, id)
        .await?
        .ok_or_else(|| AppError::not_found("Recipe not found"))?;
    if owner != principal.id {
        warn!(recipe_id = %id, user_id = %principal.id, owner_id = %owner, "non-owner mutation rejected");
        return Err(AppError::Forbidden);
    }
    Ok(())
}

pub async fn create(
    db: &SqlitePool,
    principal: &Principal,
    input: RecipeInput,
) -> Result<RecipeDetails, AppError> {
    // Signed tokens can outlive their user.
    auth::services::me(db, principal).await?;
    let fields = RecipeFields::try_from(input)?;
    let row = repo::insert(db, principal.id, &fields).await?;
    info!(recipe_id = %row.id, user_id = %principal.id, "recipe created");
    Ok(RecipeDetails::from(row))
}

pub async fn list_public(db: &SqlitePool) -> Result<Vec<RecipeSummary>, AppError> {
    let rows = repo::list_public(db).await?;
    Ok(rows.into_iter().map(RecipeSummary::from).collect())
}

pub async fn get_detail(db: &SqlitePool, id: Uuid) -> Result<RecipeDetails, AppError> {
    repo::find(db, id)
        .await?
        .map(RecipeDetails::from)
        .ok_or_else(|| AppError::not_found("Recipe not found"))
}

pub async fn update(
    db: &SqlitePool,
    principal: &Principal,
    id: Uuid,
    input: RecipeInput,
) -> Result<SuccessResponse, AppError> {
    authorize(db, principal, id).await?;
    let fields = RecipeFields::try_from(input)?;
    if repo::update(db, id, &fields).await? == 0 {
        return Err(AppError::not_found("Recipe not found"));
    }
    info!(recipe_id = %id, user_id = %principal.id, "recipe updated");
    Ok(SuccessResponse::ok())
}

pub async fn delete(
    db: &SqlitePool,
    principal: &Principal,
    id: Uuid,
) -> Result<SuccessResponse, AppError> {
    authorize(db, principal, id).await?;
    if repo::delete(db, id).await? == 0 {
        return Err(AppError::not_found("Recipe not found"));
    }
    info!(recipe_id = %id, user_id = %principal.id, "recipe deleted");
    Ok(SuccessResponse::ok())
}

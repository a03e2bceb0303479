use sqlx::SqlitePool;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::recipes::{
    dto::RecipeFields,
    repo_types::{encode_list, RecipeListRow, RecipeRow},
};

pub async fn insert(
    db: &SqlitePool,
    owner_id: Uuid,
    fields: &RecipeFields,
) -> Result<RecipeRow, sqlx::Error> {
    sqlx::query_as::<_, RecipeRow>(
        r#"
        INSERT INTO recipes (id, title, ingredients, preparation, tags, image, owner_id, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        RETURNING id, title, ingredients, preparation, tags, image, owner_id, created_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&fields.title)
    .bind(encode_list(&fields.ingredients))
    .bind(encode_list(&fields.preparation))
    .bind(&fields.tags)
    .bind(fields.image.as_deref())
    .bind(owner_id)
    .bind(OffsetDateTime::now_utc())
    .fetch_one(db)
    .await
}

/// Newest first; rows created within the same instant fall back to insertion order.
pub async fn list_public(db: &SqlitePool) -> Result<Vec<RecipeListRow>, sqlx::Error> {
    sqlx::query_as::<_, RecipeListRow>(
        r#"
        SELECT id, title, tags, image, owner_id, created_at
        FROM recipes
        ORDER BY julianday(created_at) DESC, rowid DESC
        "#,
    )
    .fetch_all(db)
    .await
}

pub async fn find(db: &SqlitePool, id: Uuid) -> Result<Option<RecipeRow>, sqlx::Error> {
    sqlx::query_as::<_, RecipeRow>(
        r#"
        SELECT id, title, ingredients, preparation, tags, image, owner_id, created_at
        FROM recipes
        WHERE id = ?1
        "#,
    )
    .bind(id)
    .fetch_optional(db)
    .await
}

pub async fn owner_of(db: &SqlitePool, id: Uuid) -> Result<Option<Uuid>, sqlx::Error> {
    sqlx::query_scalar::<_, Uuid>("SELECT owner_id FROM recipes WHERE id = ?1")
        .bind(id)
        .fetch_optional(db)
        .await
}

/// Overwrites the mutable columns. Owner and creation time never change.
pub async fn update(db: &SqlitePool, id: Uuid, fields: &RecipeFields) -> Result<u64, sqlx::Error> {
    let res = sqlx::query(
        r#"
        UPDATE recipes
           SET title = ?1, ingredients = ?2, preparation = ?3, tags = ?4, image = ?5
         WHERE id = ?6
        "#,
    )
    .bind(&fields.title)
    .bind(encode_list(&fields.ingredients))
    .bind(encode_list(&fields.preparation))
    .bind(&fields.tags)
    .bind(fields.image.as_deref())
    .bind(id)
    .execute(db)
    .await?;
    Ok(res.rows_affected())
}

pub async fn delete(db: &SqlitePool, id: Uuid) -> Result<u64, sqlx::Error> {
    let res = sqlx::query("DELETE FROM recipes WHERE id = ?1")
        .bind(id)
        .execute(db)
        .await?;
    Ok(res.rows_affected())
}

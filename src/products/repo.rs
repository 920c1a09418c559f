use anyhow::Context;
use sqlx::PgPool;

use crate::products::repo_types::{Category, NewProduct, ProductChanges, ProductRow};

const PRODUCT_SELECT: &str = r#"
    SELECT p.id, p.name, p.price, p.quantity, p.short_description, p.full_description,
           p.image_url, p.category_id, c.name AS category_name, c.slug AS category_slug,
           p.brand, p.game_type, p.created_at, p.updated_at
      FROM products p
      LEFT JOIN categories c ON c.id = p.category_id
"#;

// ---- Products ----

pub async fn list(db: &PgPool, limit: i64, offset: i64) -> anyhow::Result<Vec<ProductRow>> {
    let rows = sqlx::query_as::<_, ProductRow>(&format!(
        "{PRODUCT_SELECT} ORDER BY p.created_at DESC, p.id DESC LIMIT $1 OFFSET $2"
    ))
    .bind(limit)
    .bind(offset)
    .fetch_all(db)
    .await
    .context("list products")?;
    Ok(rows)
}

pub async fn find_by_id(db: &PgPool, id: i32) -> anyhow::Result<Option<ProductRow>> {
    let row = sqlx::query_as::<_, ProductRow>(&format!("{PRODUCT_SELECT} WHERE p.id = $1"))
        .bind(id)
        .fetch_optional(db)
        .await
        .context("find product")?;
    Ok(row)
}

pub async fn find_latest(db: &PgPool) -> anyhow::Result<Option<ProductRow>> {
    let row = sqlx::query_as::<_, ProductRow>(&format!(
        "{PRODUCT_SELECT} ORDER BY p.created_at DESC, p.id DESC LIMIT 1"
    ))
    .fetch_optional(db)
    .await
    .context("find latest product")?;
    Ok(row)
}

pub async fn list_by_category(
    db: &PgPool,
    slug: &str,
    limit: i64,
    offset: i64,
) -> anyhow::Result<Vec<ProductRow>> {
    let rows = sqlx::query_as::<_, ProductRow>(&format!(
        "{PRODUCT_SELECT} WHERE c.slug = $1 ORDER BY p.created_at DESC, p.id DESC LIMIT $2 OFFSET $3"
    ))
    .bind(slug)
    .bind(limit)
    .bind(offset)
    .fetch_all(db)
    .await
    .context("list products by category")?;
    Ok(rows)
}

pub async fn list_by_brand(
    db: &PgPool,
    brand: &str,
    limit: i64,
    offset: i64,
) -> anyhow::Result<Vec<ProductRow>> {
    let rows = sqlx::query_as::<_, ProductRow>(&format!(
        "{PRODUCT_SELECT} WHERE LOWER(p.brand) = LOWER($1) ORDER BY p.created_at DESC, p.id DESC LIMIT $2 OFFSET $3"
    ))
    .bind(brand)
    .bind(limit)
    .bind(offset)
    .fetch_all(db)
    .await
    .context("list products by brand")?;
    Ok(rows)
}

pub async fn list_by_game_type(
    db: &PgPool,
    game_type: &str,
    limit: i64,
    offset: i64,
) -> anyhow::Result<Vec<ProductRow>> {
    let rows = sqlx::query_as::<_, ProductRow>(&format!(
        "{PRODUCT_SELECT} WHERE LOWER(p.game_type) = LOWER($1) ORDER BY p.created_at DESC, p.id DESC LIMIT $2 OFFSET $3"
    ))
    .bind(game_type)
    .bind(limit)
    .bind(offset)
    .fetch_all(db)
    .await
    .context("list products by game type")?;
    Ok(rows)
}

pub async fn create(db: &PgPool, p: &NewProduct) -> anyhow::Result<ProductRow> {
    let id: i32 = sqlx::query_scalar(
        r#"
        INSERT INTO products (name, price, quantity, short_description, full_description,
                              image_url, category_id, brand, game_type)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING id
        "#,
    )
    .bind(&p.name)
    .bind(p.price)
    .bind(p.quantity)
    .bind(&p.short_description)
    .bind(&p.full_description)
    .bind(&p.image_url)
    .bind(p.category_id)
    .bind(&p.brand)
    .bind(&p.game_type)
    .fetch_one(db)
    .await
    .context("insert product")?;

    find_by_id(db, id)
        .await?
        .context("inserted product vanished")
}

pub async fn update(
    db: &PgPool,
    id: i32,
    c: &ProductChanges,
) -> anyhow::Result<Option<ProductRow>> {
    let updated: Option<i32> = sqlx::query_scalar(
        r#"
        UPDATE products
           SET name = COALESCE($2, name),
               price = COALESCE($3, price),
               quantity = COALESCE($4, quantity),
               short_description = COALESCE($5, short_description),
               full_description = COALESCE($6, full_description),
               image_url = COALESCE($7, image_url),
               category_id = COALESCE($8, category_id),
               brand = COALESCE($9, brand),
               game_type = COALESCE($10, game_type),
               updated_at = NOW()
         WHERE id = $1
        RETURNING id
        "#,
    )
    .bind(id)
    .bind(&c.name)
    .bind(c.price)
    .bind(c.quantity)
    .bind(&c.short_description)
    .bind(&c.full_description)
    .bind(&c.image_url)
    .bind(c.category_id)
    .bind(&c.brand)
    .bind(&c.game_type)
    .fetch_optional(db)
    .await
    .context("update product")?;

    match updated {
        Some(id) => find_by_id(db, id).await,
        None => Ok(None),
    }
}

pub async fn delete(db: &PgPool, id: i32) -> anyhow::Result<bool> {
    let result = sqlx::query("DELETE FROM products WHERE id = $1")
        .bind(id)
        .execute(db)
        .await
        .context("delete product")?;
    Ok(result.rows_affected() > 0)
}

pub async fn list_brands(db: &PgPool) -> anyhow::Result<Vec<String>> {
    let rows = sqlx::query_scalar::<_, String>(
        "SELECT DISTINCT brand FROM products WHERE brand IS NOT NULL AND brand <> '' ORDER BY brand",
    )
    .fetch_all(db)
    .await
    .context("list brands")?;
    Ok(rows)
}

pub async fn list_game_types(db: &PgPool) -> anyhow::Result<Vec<String>> {
    let rows = sqlx::query_scalar::<_, String>(
        "SELECT DISTINCT game_type FROM products WHERE game_type IS NOT NULL AND game_type <> '' ORDER BY game_type",
    )
    .fetch_all(db)
    .await
    .context("list game types")?;
    Ok(rows)
}

// ---- Categories ----

pub async fn list_categories(db: &PgPool) -> anyhow::Result<Vec<Category>> {
    let rows = sqlx::query_as::<_, Category>(
        "SELECT id, name, slug, description, created_at FROM categories ORDER BY name",
    )
    .fetch_all(db)
    .await
    .context("list categories")?;
    Ok(rows)
}

pub async fn find_category_by_id(db: &PgPool, id: i32) -> anyhow::Result<Option<Category>> {
    let row = sqlx::query_as::<_, Category>(
        "SELECT id, name, slug, description, created_at FROM categories WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(db)
    .await
    .context("find category")?;
    Ok(row)
}

pub async fn find_category_by_slug(db: &PgPool, slug: &str) -> anyhow::Result<Option<Category>> {
    let row = sqlx::query_as::<_, Category>(
        "SELECT id, name, slug, description, created_at FROM categories WHERE slug = $1",
    )
    .bind(slug)
    .fetch_optional(db)
    .await
    .context("find category by slug")?;
    Ok(row)
}

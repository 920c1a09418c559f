use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    images::normalize::ImageUrls,
    products::repo_types::{Category, ProductRow},
};

pub const DEFAULT_LIMIT: i64 = 50;
pub const MAX_LIMIT: i64 = 100;

#[derive(Debug, Default, Deserialize)]
pub struct Pagination {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl Pagination {
    /// `(limit, offset)` with the limit clamped to `1..=MAX_LIMIT`.
    pub fn resolve(&self) -> (i64, i64) {
        let limit = self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
        let offset = self.offset.unwrap_or(0).max(0);
        (limit, offset)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateProductRequest {
    pub name: Option<String>,
    pub price: Option<Decimal>,
    pub quantity: Option<i32>,
    pub short_description: Option<String>,
    pub full_description: Option<String>,
    pub image_url: Option<String>,
    pub category_id: Option<i32>,
    pub brand: Option<String>,
    pub game_type: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub price: Option<Decimal>,
    pub quantity: Option<i32>,
    pub short_description: Option<String>,
    pub full_description: Option<String>,
    pub image_url: Option<String>,
    pub category_id: Option<i32>,
    pub brand: Option<String>,
    pub game_type: Option<String>,
}

/// Product as the storefront sees it; `image_url` is always absolute.
#[derive(Debug, Serialize)]
pub struct ProductView {
    pub id: i32,
    pub name: String,
    pub price: Decimal,
    pub quantity: i32,
    pub short_description: String,
    pub full_description: String,
    pub image_url: String,
    pub category_id: i32,
    pub category_name: Option<String>,
    pub category_slug: Option<String>,
    pub brand: Option<String>,
    pub game_type: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl ProductView {
    pub fn from_row(row: ProductRow, images: &ImageUrls) -> Self {
        Self {
            image_url: images.normalize(row.image_url.as_deref()),
            id: row.id,
            name: row.name,
            price: row.price,
            quantity: row.quantity,
            short_description: row.short_description,
            full_description: row.full_description,
            category_id: row.category_id,
            category_name: row.category_name,
            category_slug: row.category_slug,
            brand: row.brand,
            game_type: row.game_type,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }

    pub fn from_rows(rows: Vec<ProductRow>, images: &ImageUrls) -> Vec<Self> {
        rows.into_iter().map(|r| Self::from_row(r, images)).collect()
    }
}

#[derive(Debug, Serialize)]
pub struct ProductListResponse {
    pub products: Vec<ProductView>,
}

#[derive(Debug, Serialize)]
pub struct ProductResponse {
    pub product: ProductView,
}

#[derive(Debug, Serialize)]
pub struct SavedProductResponse {
    pub message: String,
    pub product: ProductView,
}

#[derive(Debug, Serialize)]
pub struct DeletedProductResponse {
    pub message: String,
    pub id: i32,
}

#[derive(Debug, Serialize)]
pub struct CategoryProductsResponse {
    pub category: Category,
    pub products: Vec<ProductView>,
}

#[derive(Debug, Serialize)]
pub struct BrandProductsResponse {
    pub brand: String,
    pub products: Vec<ProductView>,
}

#[derive(Debug, Serialize)]
pub struct GameTypeProductsResponse {
    #[serde(rename = "gameType")]
    pub game_type: String,
    pub products: Vec<ProductView>,
}

#[derive(Debug, Serialize)]
pub struct CategoryListResponse {
    pub categories: Vec<Category>,
}

#[derive(Debug, Serialize)]
pub struct BrandListResponse {
    pub brands: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct GameTypeListResponse {
    #[serde(rename = "gameTypes")]
    pub game_types: Vec<String>,
}

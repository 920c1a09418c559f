use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;

/// Category record in the database.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Category {
    pub id: i32,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Product joined with its category; `image_url` is the raw stored reference.
#[derive(Debug, Clone, FromRow)]
pub struct ProductRow {
    pub id: i32,
    pub name: String,
    pub price: Decimal,
    pub quantity: i32,
    pub short_description: String,
    pub full_description: String,
    pub image_url: Option<String>,
    pub category_id: i32,
    pub category_name: Option<String>,
    pub category_slug: Option<String>,
    pub brand: Option<String>,
    pub game_type: Option<String>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
    pub name: String,
    pub price: Decimal,
    pub quantity: i32,
    pub short_description: String,
    pub full_description: String,
    pub image_url: Option<String>,
    pub category_id: i32,
    pub brand: Option<String>,
    pub game_type: Option<String>,
}

/// Partial update; `None` leaves the column untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductChanges {
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

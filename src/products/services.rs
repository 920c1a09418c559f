use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::{info, warn};

use crate::{
    auth::services::required,
    error::AppError,
    products::{
        dto::{CreateProductRequest, UpdateProductRequest},
        repo,
        repo_types::{Category, NewProduct, ProductChanges, ProductRow},
    },
};

const MISSING_FIELDS: &str = "All fields are required";
const BRAND_REQUIRED: &str = "Accessories require a brand";
const GAME_TYPE_REQUIRED: &str = "Card games and singles require a game type";

/// Which optional attributes a category carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryRule {
    pub uses_brand: bool,
    pub uses_game_type: bool,
}

impl CategoryRule {
    pub fn for_category(name: &str) -> Self {
        let name = name.trim().to_lowercase();
        Self {
            uses_brand: name == "accesorios",
            uses_game_type: name == "juegos de cartas" || name == "singles",
        }
    }
}

fn check_price(price: Decimal) -> Result<Decimal, AppError> {
    let price = price.normalize();
    if price <= Decimal::ZERO {
        return Err(AppError::validation("Price must be greater than zero"));
    }
    if price.scale() > 2 {
        return Err(AppError::validation("Price cannot have more than two decimals"));
    }
    // NUMERIC(10,2) holds at most eight integer digits.
    if price >= Decimal::new(100_000_000, 0) {
        return Err(AppError::validation("Price must be below 100000000"));
    }
    Ok(price)
}

/// Category that has to be looked up before an update, when the product moves.
fn category_switch(requested: Option<i32>, current_id: i32) -> Option<i32> {
    requested.filter(|id| *id != current_id)
}

fn check_quantity(quantity: i32) -> Result<i32, AppError> {
    if quantity < 0 {
        return Err(AppError::validation("Quantity cannot be negative"));
    }
    Ok(quantity)
}

/// Validates a create request against the category it targets.
pub fn build_new_product(
    req: CreateProductRequest,
    category: &Category,
) -> Result<NewProduct, AppError> {
    let (Some(name), Some(price), Some(quantity), Some(short_description), Some(full_description)) = (
        required(req.name),
        req.price,
        req.quantity,
        required(req.short_description),
        required(req.full_description),
    ) else {
        return Err(AppError::validation(MISSING_FIELDS));
    };

    let rule = CategoryRule::for_category(&category.name);
    let brand = required(req.brand);
    let game_type = required(req.game_type);
    if rule.uses_brand && brand.is_none() {
        return Err(AppError::validation(BRAND_REQUIRED));
    }
    if rule.uses_game_type && game_type.is_none() {
        return Err(AppError::validation(GAME_TYPE_REQUIRED));
    }

    Ok(NewProduct {
        name,
        price: check_price(price)?,
        quantity: check_quantity(quantity)?,
        short_description,
        full_description,
        image_url: required(req.image_url),
        category_id: category.id,
        brand: brand.filter(|_| rule.uses_brand),
        game_type: game_type.filter(|_| rule.uses_game_type),
    })
}

/// Validates a partial update. `category_name` is the category the product
/// will belong to after the update.
pub fn build_changes(
    req: UpdateProductRequest,
    category_name: &str,
) -> Result<ProductChanges, AppError> {
    let rule = CategoryRule::for_category(category_name);

    let explicitly_blank = |v: &Option<String>| matches!(v, Some(s) if s.trim().is_empty());
    if rule.uses_brand && explicitly_blank(&req.brand) {
        return Err(AppError::validation(BRAND_REQUIRED));
    }
    if rule.uses_game_type && explicitly_blank(&req.game_type) {
        return Err(AppError::validation(GAME_TYPE_REQUIRED));
    }

    Ok(ProductChanges {
        name: required(req.name),
        price: req.price.map(check_price).transpose()?,
        quantity: req.quantity.map(check_quantity).transpose()?,
        short_description: required(req.short_description),
        full_description: required(req.full_description),
        image_url: required(req.image_url),
        category_id: req.category_id,
        brand: required(req.brand).filter(|_| rule.uses_brand),
        game_type: required(req.game_type).filter(|_| rule.uses_game_type),
    })
}

async fn existing_category(db: &PgPool, id: i32) -> Result<Category, AppError> {
    repo::find_category_by_id(db, id).await?.ok_or_else(|| {
        warn!(category_id = id, "unknown category");
        AppError::validation("Selected category does not exist")
    })
}

pub async fn create_product(
    db: &PgPool,
    req: CreateProductRequest,
) -> Result<ProductRow, AppError> {
    let Some(category_id) = req.category_id else {
        return Err(AppError::validation(MISSING_FIELDS));
    };
    let category = existing_category(db, category_id).await?;
    let new = build_new_product(req, &category)?;

    let row = repo::create(db, &new).await?;
    info!(product_id = row.id, category = %category.slug, "product created");
    Ok(row)
}

pub async fn update_product(
    db: &PgPool,
    id: i32,
    req: UpdateProductRequest,
) -> Result<ProductRow, AppError> {
    let current = repo::find_by_id(db, id)
        .await?
        .ok_or_else(|| AppError::not_found("Product not found"))?;

    let category_name = match category_switch(req.category_id, current.category_id) {
        Some(cid) => existing_category(db, cid).await?.name,
        None => current.category_name.clone().unwrap_or_default(),
    };
    let changes = build_changes(req, &category_name)?;

    let row = repo::update(db, id, &changes)
        .await?
        .ok_or_else(|| AppError::not_found("Product not found"))?;
    info!(product_id = id, "product updated");
    Ok(row)
}

pub async fn delete_product(db: &PgPool, id: i32) -> Result<(), AppError> {
    if !repo::delete(db, id).await? {
        return Err(AppError::not_found("Product not found"));
    }
    info!(product_id = id, "product deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use time::OffsetDateTime;

    use super::*;

    fn category(name: &str) -> Category {
        Category {
            id: 3,
            name: name.into(),
            slug: name.to_lowercase().replace(' ', "-"),
            description: None,
            created_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    fn create_req() -> CreateProductRequest {
        CreateProductRequest {
            name: Some("Sleeves".into()),
            price: Some(Decimal::new(599, 2)),
            quantity: Some(10),
            short_description: Some("100 sleeves".into()),
            full_description: Some("Matte sleeves, standard size".into()),
            image_url: Some("/uploads/x.png".into()),
            category_id: Some(3),
            brand: Some("Dragon Shield".into()),
            game_type: Some("Pokemon".into()),
        }
    }

    fn message(err: AppError) -> String {
        match err {
            AppError::Validation(m) => m,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn rules_follow_category_name() {
        assert!(CategoryRule::for_category("Accesorios").uses_brand);
        assert!(CategoryRule::for_category("Juegos de cartas").uses_game_type);
        assert!(CategoryRule::for_category(" singles ").uses_game_type);
        let other = CategoryRule::for_category("Figuras");
        assert!(!other.uses_brand && !other.uses_game_type);
    }

    #[test]
    fn accessories_keep_brand_and_drop_game_type() {
        let p = build_new_product(create_req(), &category("Accesorios")).unwrap();
        assert_eq!(p.brand.as_deref(), Some("Dragon Shield"));
        assert_eq!(p.game_type, None);
        assert_eq!(p.category_id, 3);
    }

    #[test]
    fn accessories_without_brand_are_rejected() {
        let req = CreateProductRequest {
            brand: Some("  ".into()),
            ..create_req()
        };
        let err = build_new_product(req, &category("Accesorios")).unwrap_err();
        assert_eq!(message(err), BRAND_REQUIRED);
    }

    #[test]
    fn singles_require_game_type() {
        let req = CreateProductRequest {
            game_type: None,
            ..create_req()
        };
        let err = build_new_product(req, &category("Singles")).unwrap_err();
        assert_eq!(message(err), GAME_TYPE_REQUIRED);
    }

    #[test]
    fn other_categories_null_both() {
        let p = build_new_product(create_req(), &category("Figuras")).unwrap();
        assert_eq!(p.brand, None);
        assert_eq!(p.game_type, None);
    }

    #[test]
    fn missing_fields_are_rejected() {
        let req = CreateProductRequest {
            full_description: None,
            ..create_req()
        };
        let err = build_new_product(req, &category("Figuras")).unwrap_err();
        assert_eq!(message(err), MISSING_FIELDS);
    }

    #[test]
    fn zero_quantity_is_allowed_but_negative_is_not() {
        let req = CreateProductRequest {
            quantity: Some(0),
            ..create_req()
        };
        assert!(build_new_product(req, &category("Figuras")).is_ok());

        let req = CreateProductRequest {
            quantity: Some(-1),
            ..create_req()
        };
        assert!(build_new_product(req, &category("Figuras")).is_err());
    }

    #[test]
    fn non_positive_price_is_rejected() {
        let req = CreateProductRequest {
            price: Some(Decimal::ZERO),
            ..create_req()
        };
        assert!(build_new_product(req, &category("Figuras")).is_err());
    }

    #[test]
    fn price_must_fit_two_decimal_column() {
        for bad in [Decimal::new(1, 3), Decimal::new(100_000_000, 0), Decimal::new(1_000_000_001, 1)] {
            let req = CreateProductRequest {
                price: Some(bad),
                ..create_req()
            };
            assert!(build_new_product(req, &category("Figuras")).is_err(), "{bad} accepted");
        }

        let req = CreateProductRequest {
            price: Some(Decimal::new(19_990, 3)),
            ..create_req()
        };
        let p = build_new_product(req, &category("Figuras")).unwrap();
        assert_eq!(p.price, Decimal::new(1999, 2));

        let req = CreateProductRequest {
            price: Some(Decimal::new(9_999_999_999, 2)),
            ..create_req()
        };
        assert!(build_new_product(req, &category("Figuras")).is_ok());
    }

    #[test]
    fn update_price_is_checked_too() {
        let req = UpdateProductRequest {
            price: Some(Decimal::new(5, 3)),
            ..Default::default()
        };
        assert!(build_changes(req, "Figuras").is_err());
    }

    #[test]
    fn category_switch_only_when_moving() {
        assert_eq!(category_switch(None, 3), None);
        assert_eq!(category_switch(Some(3), 3), None);
        assert_eq!(category_switch(Some(4), 3), Some(4));
    }

    #[test]
    fn moving_into_singles_applies_its_rules() {
        let target = category("Singles");
        let cid = category_switch(Some(target.id), 1).unwrap();
        assert_eq!(cid, target.id);

        let req = UpdateProductRequest {
            category_id: Some(cid),
            game_type: Some(" ".into()),
            ..Default::default()
        };
        let err = build_changes(req, &target.name).unwrap_err();
        assert_eq!(message(err), GAME_TYPE_REQUIRED);

        let req = UpdateProductRequest {
            category_id: Some(cid),
            brand: Some("Ultra Pro".into()),
            game_type: Some("Pokemon".into()),
            ..Default::default()
        };
        let changes = build_changes(req, &target.name).unwrap();
        assert_eq!(changes.category_id, Some(3));
        assert_eq!(changes.brand, None);
        assert_eq!(changes.game_type.as_deref(), Some("Pokemon"));
    }

    #[test]
    fn update_rejects_explicitly_blank_brand_for_accessories() {
        let req = UpdateProductRequest {
            brand: Some(String::new()),
            ..Default::default()
        };
        let err = build_changes(req, "Accesorios").unwrap_err();
        assert_eq!(message(err), BRAND_REQUIRED);
    }

    #[test]
    fn update_without_brand_keeps_existing() {
        let req = UpdateProductRequest {
            name: Some(" New name ".into()),
            ..Default::default()
        };
        let changes = build_changes(req, "Accesorios").unwrap();
        assert_eq!(changes.name.as_deref(), Some("New name"));
        assert_eq!(changes.brand, None);
    }

    #[test]
    fn update_ignores_attributes_the_category_does_not_use() {
        let req = UpdateProductRequest {
            brand: Some("Ultra Pro".into()),
            game_type: Some("Magic".into()),
            ..Default::default()
        };
        let changes = build_changes(req, "Singles").unwrap();
        assert_eq!(changes.brand, None);
        assert_eq!(changes.game_type.as_deref(), Some("Magic"));
    }
}

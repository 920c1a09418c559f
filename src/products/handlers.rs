use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{instrument, warn};

use crate::{
    auth::extractors::AdminUser,
    error::AppError,
    products::{
        dto::{
            BrandListResponse, BrandProductsResponse, CategoryListResponse,
            CategoryProductsResponse, CreateProductRequest, DeletedProductResponse,
            GameTypeListResponse, GameTypeProductsResponse, Pagination, ProductListResponse,
            ProductResponse, ProductView, SavedProductResponse, UpdateProductRequest,
        },
        repo, services,
    },
    state::AppState,
};

pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(list_products).post(create_product))
        .route("/products/categories", get(list_categories))
        .route("/products/brands", get(list_brands))
        .route("/products/game-types", get(list_game_types))
        .route("/products/category/:slug", get(products_by_category))
        .route("/products/brand/:brand", get(products_by_brand))
        .route("/products/game-type/:game_type", get(products_by_game_type))
        .route(
            "/products/:id",
            get(get_product).put(update_product).delete(delete_product),
        )
}

fn parse_id(raw: &str) -> Result<i32, AppError> {
    raw.parse::<i32>().map_err(|_| {
        warn!(id = %raw, "invalid product id");
        AppError::validation("Invalid product id")
    })
}

#[instrument(skip(state))]
pub async fn list_products(
    State(state): State<AppState>,
    Query(p): Query<Pagination>,
) -> Result<Json<ProductListResponse>, AppError> {
    let (limit, offset) = p.resolve();
    let rows = repo::list(&state.db, limit, offset).await?;
    Ok(Json(ProductListResponse {
        products: ProductView::from_rows(rows, &state.images),
    }))
}

/// GET /products/:id, where `:id` may also be `latest`.
#[instrument(skip(state))]
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ProductResponse>, AppError> {
    let row = if id == "latest" {
        repo::find_latest(&state.db).await?
    } else {
        repo::find_by_id(&state.db, parse_id(&id)?).await?
    };
    let row = row.ok_or_else(|| AppError::not_found("Product not found"))?;
    Ok(Json(ProductResponse {
        product: ProductView::from_row(row, &state.images),
    }))
}

#[instrument(skip(state))]
pub async fn products_by_category(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(p): Query<Pagination>,
) -> Result<Json<CategoryProductsResponse>, AppError> {
    let category = repo::find_category_by_slug(&state.db, &slug)
        .await?
        .ok_or_else(|| AppError::not_found("Category not found"))?;
    let (limit, offset) = p.resolve();
    let rows = repo::list_by_category(&state.db, &category.slug, limit, offset).await?;
    Ok(Json(CategoryProductsResponse {
        category,
        products: ProductView::from_rows(rows, &state.images),
    }))
}

#[instrument(skip(state))]
pub async fn products_by_brand(
    State(state): State<AppState>,
    Path(brand): Path<String>,
    Query(p): Query<Pagination>,
) -> Result<Json<BrandProductsResponse>, AppError> {
    let (limit, offset) = p.resolve();
    let rows = repo::list_by_brand(&state.db, &brand, limit, offset).await?;
    Ok(Json(BrandProductsResponse {
        brand,
        products: ProductView::from_rows(rows, &state.images),
    }))
}

#[instrument(skip(state))]
pub async fn products_by_game_type(
    State(state): State<AppState>,
    Path(game_type): Path<String>,
    Query(p): Query<Pagination>,
) -> Result<Json<GameTypeProductsResponse>, AppError> {
    let (limit, offset) = p.resolve();
    let rows = repo::list_by_game_type(&state.db, &game_type, limit, offset).await?;
    Ok(Json(GameTypeProductsResponse {
        game_type,
        products: ProductView::from_rows(rows, &state.images),
    }))
}

pub async fn list_categories(
    State(state): State<AppState>,
) -> Result<Json<CategoryListResponse>, AppError> {
    let categories = repo::list_categories(&state.db).await?;
    Ok(Json(CategoryListResponse { categories }))
}

pub async fn list_brands(
    State(state): State<AppState>,
) -> Result<Json<BrandListResponse>, AppError> {
    let brands = repo::list_brands(&state.db).await?;
    Ok(Json(BrandListResponse { brands }))
}

pub async fn list_game_types(
    State(state): State<AppState>,
) -> Result<Json<GameTypeListResponse>, AppError> {
    let game_types = repo::list_game_types(&state.db).await?;
    Ok(Json(GameTypeListResponse { game_types }))
}

#[instrument(skip(state, payload))]
pub async fn create_product(
    State(state): State<AppState>,
    _admin: AdminUser,
    Json(payload): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<SavedProductResponse>), AppError> {
    let row = services::create_product(&state.db, payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(SavedProductResponse {
            message: "Product created successfully".into(),
            product: ProductView::from_row(row, &state.images),
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn update_product(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<String>,
    Json(payload): Json<UpdateProductRequest>,
) -> Result<Json<SavedProductResponse>, AppError> {
    let row = services::update_product(&state.db, parse_id(&id)?, payload).await?;
    Ok(Json(SavedProductResponse {
        message: "Product updated successfully".into(),
        product: ProductView::from_row(row, &state.images),
    }))
}

#[instrument(skip(state))]
pub async fn delete_product(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> Result<Json<DeletedProductResponse>, AppError> {
    let id = parse_id(&id)?;
    services::delete_product(&state.db, id).await?;
    Ok(Json(DeletedProductResponse {
        message: "Product deleted successfully".into(),
        id,
    }))
}

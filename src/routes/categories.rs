use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};

use crate::{
    dto::{categories::CategoryList, products::ProductList},
    error::{AppError, AppResult},
    models::Category,
    response::ApiResponse,
    services::{category_service, product_service},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_active_categories))
        .route("/{slug}", get(get_category_by_slug))
        .route("/{slug}/products", get(category_products))
}

#[utoipa::path(
    get,
    path = "/api/categories",
    responses(
        (status = 200, description = "Active categories ordered by name", body = ApiResponse<CategoryList>)
    ),
    tag = "Categories"
)]
pub async fn list_active_categories(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<CategoryList>>> {
    let items = category_service::active_categories(&state).await?;
    Ok(Json(ApiResponse::success("Categories", CategoryList { items }, None)))
}

#[utoipa::path(
    get,
    path = "/api/categories/{slug}",
    params(("slug" = String, Path, description = "Category slug")),
    responses(
        (status = 200, description = "Category", body = ApiResponse<Category>),
        (status = 404, description = "Not Found")
    ),
    tag = "Categories"
)]
pub async fn get_category_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> AppResult<Json<ApiResponse<Category>>> {
    let category = category_service::find_by_slug(&state, &slug)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(ApiResponse::success("Category", category, None)))
}

#[utoipa::path(
    get,
    path = "/api/categories/{slug}/products",
    params(("slug" = String, Path, description = "Category slug")),
    responses(
        (status = 200, description = "Products filed under the category name or slug", body = ApiResponse<ProductList>),
        (status = 404, description = "Not Found")
    ),
    tag = "Categories"
)]
pub async fn category_products(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> AppResult<Json<ApiResponse<ProductList>>> {
    let category = category_service::find_by_slug(&state, &slug)
        .await?
        .ok_or(AppError::NotFound)?;
    let mut items = product_service::products_by_category(&state, &category.slug).await?;
    if category.name != category.slug {
        items.extend(product_service::products_by_category(&state, &category.name).await?);
    }
    Ok(Json(ApiResponse::success("Products", ProductList { items }, None)))
}

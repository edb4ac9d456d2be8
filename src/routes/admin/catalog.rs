use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch, post},
};
use uuid::Uuid;

use crate::{
    audit,
    dto::{
        categories::{
            CategoryList, CategoryStats, CreateCategoryRequest, ProductCountRequest,
            UpdateCategoryRequest,
        },
        products::{
            CreateProductRequest, InventoryAdjustRequest, ProductList, ProductStats, StockRequest,
            UpdateProductRequest,
        },
    },
    error::AppResult,
    middleware::auth::{AuthUser, ensure_staff},
    models::{Category, Product},
    response::{ApiResponse, Meta},
    routes::params::{CategoryQuery, LowStockQuery},
    services::{category_service, product_service},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/products", post(create_product))
        .route("/products/stats", get(product_stats))
        .route(
            "/products/{id}",
            patch(update_product).delete(delete_product),
        )
        .route("/products/{id}/stock", post(update_stock))
        .route("/products/{id}/restock", post(restock))
        .route("/inventory/low-stock", get(list_low_stock))
        .route("/inventory/{id}", patch(adjust_inventory))
        .route("/categories", get(list_categories).post(create_category))
        .route("/categories/stats", get(category_stats))
        .route(
            "/categories/{id}",
            get(get_category).patch(update_category).delete(delete_category),
        )
        .route("/categories/{id}/subcategories", get(list_subcategories))
        .route("/categories/{id}/toggle", post(toggle_category))
        .route("/categories/{id}/product-count", patch(update_product_count))
}

#[utoipa::path(
    post,
    path = "/api/admin/products",
    request_body = CreateProductRequest,
    responses(
        (status = 201, description = "Create product", body = ApiResponse<Product>),
        (status = 403, description = "Forbidden"),
        (status = 422, description = "Invalid fields")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn create_product(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateProductRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Product>>)> {
    ensure_staff(&user)?;
    let product = product_service::create_product(&state, payload).await?;
    audit::record(
        &state,
        Some(user.user_id),
        "product_create",
        "products",
        serde_json::json!({ "product_id": product.id }),
    )
    .await;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success("Product created", product, Some(Meta::empty()))),
    ))
}

#[utoipa::path(
    patch,
    path = "/api/admin/products/{id}",
    params(("id" = Uuid, Path, description = "Product ID")),
    request_body = UpdateProductRequest,
    responses(
        (status = 200, description = "Updated product", body = ApiResponse<Product>),
        (status = 404, description = "Product not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn update_product(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateProductRequest>,
) -> AppResult<Json<ApiResponse<Product>>> {
    ensure_staff(&user)?;
    let product = product_service::update_product(&state, id, payload).await?;
    audit::record(
        &state,
        Some(user.user_id),
        "product_update",
        "products",
        serde_json::json!({ "product_id": id }),
    )
    .await;
    Ok(Json(ApiResponse::success("Updated", product, Some(Meta::empty()))))
}

#[utoipa::path(
    delete,
    path = "/api/admin/products/{id}",
    params(("id" = Uuid, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Deleted product", body = ApiResponse<serde_json::Value>),
        (status = 404, description = "Product not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn delete_product(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    ensure_staff(&user)?;
    product_service::delete_product(&state, id).await?;
    audit::record(
        &state,
        Some(user.user_id),
        "product_delete",
        "products",
        serde_json::json!({ "product_id": id }),
    )
    .await;
    Ok(Json(ApiResponse::success(
        "Deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    )))
}

#[utoipa::path(
    post,
    path = "/api/admin/products/{id}/stock",
    params(("id" = Uuid, Path, description = "Product ID")),
    request_body = StockRequest,
    responses(
        (status = 200, description = "Quantity taken out of stock, floored at zero", body = ApiResponse<Product>),
        (status = 404, description = "Product not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn update_stock(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<StockRequest>,
) -> AppResult<Json<ApiResponse<Product>>> {
    ensure_staff(&user)?;
    let product = product_service::update_stock(&state, id, payload.quantity).await?;
    Ok(Json(ApiResponse::success("Stock updated", product, None)))
}

#[utoipa::path(
    post,
    path = "/api/admin/products/{id}/restock",
    params(("id" = Uuid, Path, description = "Product ID")),
    request_body = StockRequest,
    responses(
        (status = 200, description = "Quantity added to stock", body = ApiResponse<Product>),
        (status = 422, description = "Quantity must be positive")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn restock(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<StockRequest>,
) -> AppResult<Json<ApiResponse<Product>>> {
    ensure_staff(&user)?;
    let product = product_service::restock(&state, id, payload.quantity).await?;
    Ok(Json(ApiResponse::success("Restocked", product, None)))
}

#[utoipa::path(
    get,
    path = "/api/admin/products/stats",
    responses(
        (status = 200, description = "Catalog statistics", body = ApiResponse<ProductStats>),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn product_stats(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<ProductStats>>> {
    ensure_staff(&user)?;
    let stats = product_service::product_stats(&state).await?;
    Ok(Json(ApiResponse::success("OK", stats, None)))
}

#[utoipa::path(
    get,
    path = "/api/admin/inventory/low-stock",
    params(
        ("threshold" = Option<i32>, Query, description = "Stock threshold, default 10"),
    ),
    responses(
        (status = 200, description = "List low stock products", body = ApiResponse<ProductList>),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_low_stock(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<LowStockQuery>,
) -> AppResult<Json<ApiResponse<ProductList>>> {
    ensure_staff(&user)?;
    let items = product_service::low_stock_products(&state, query.threshold).await?;
    Ok(Json(ApiResponse::success("OK", ProductList { items }, None)))
}

#[utoipa::path(
    patch,
    path = "/api/admin/inventory/{id}",
    params(("id" = Uuid, Path, description = "Product ID")),
    request_body = InventoryAdjustRequest,
    responses(
        (status = 200, description = "Adjust inventory", body = ApiResponse<Product>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn adjust_inventory(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<InventoryAdjustRequest>,
) -> AppResult<Json<ApiResponse<Product>>> {
    ensure_staff(&user)?;
    let product = product_service::adjust_stock(&state, id, payload.delta).await?;
    audit::record(
        &state,
        Some(user.user_id),
        "inventory_adjust",
        "products",
        serde_json::json!({ "product_id": id, "delta": payload.delta }),
    )
    .await;
    Ok(Json(ApiResponse::success("Inventory adjusted", product, None)))
}

#[utoipa::path(
    get,
    path = "/api/admin/categories",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("q" = Option<String>, Query, description = "Search name, description and slug")
    ),
    responses(
        (status = 200, description = "All categories ordered by name", body = ApiResponse<CategoryList>),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_categories(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<CategoryQuery>,
) -> AppResult<Json<ApiResponse<CategoryList>>> {
    ensure_staff(&user)?;
    let page = category_service::list_categories(&state, query).await?;
    let meta = page.meta();
    Ok(Json(ApiResponse::success(
        "Categories",
        CategoryList { items: page.items },
        Some(meta),
    )))
}

#[utoipa::path(
    get,
    path = "/api/admin/categories/stats",
    responses(
        (status = 200, description = "Category statistics", body = ApiResponse<CategoryStats>),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn category_stats(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<CategoryStats>>> {
    ensure_staff(&user)?;
    let stats = category_service::category_stats(&state).await?;
    Ok(Json(ApiResponse::success("OK", stats, None)))
}

#[utoipa::path(
    get,
    path = "/api/admin/categories/{id}",
    params(("id" = Uuid, Path, description = "Category ID")),
    responses(
        (status = 200, description = "Category", body = ApiResponse<Category>),
        (status = 404, description = "Not Found")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn get_category(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Category>>> {
    ensure_staff(&user)?;
    let category = category_service::get_category(&state, id).await?;
    Ok(Json(ApiResponse::success("Category", category, None)))
}

#[utoipa::path(
    get,
    path = "/api/admin/categories/{id}/subcategories",
    params(("id" = Uuid, Path, description = "Parent category ID")),
    responses(
        (status = 200, description = "Direct children ordered by name", body = ApiResponse<CategoryList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_subcategories(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<CategoryList>>> {
    ensure_staff(&user)?;
    let items = category_service::subcategories(&state, id).await?;
    Ok(Json(ApiResponse::success("Categories", CategoryList { items }, None)))
}

#[utoipa::path(
    post,
    path = "/api/admin/categories",
    request_body = CreateCategoryRequest,
    responses(
        (status = 201, description = "Category created", body = ApiResponse<Category>),
        (status = 409, description = "Slug already in use"),
        (status = 422, description = "Invalid fields")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn create_category(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateCategoryRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Category>>)> {
    ensure_staff(&user)?;
    let category = category_service::create_category(&state, payload).await?;
    audit::record(
        &state,
        Some(user.user_id),
        "category_create",
        "categories",
        serde_json::json!({ "category_id": category.id, "slug": category.slug }),
    )
    .await;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success("Category created", category, None)),
    ))
}

#[utoipa::path(
    patch,
    path = "/api/admin/categories/{id}",
    params(("id" = Uuid, Path, description = "Category ID")),
    request_body = UpdateCategoryRequest,
    responses(
        (status = 200, description = "Category updated", body = ApiResponse<Category>),
        (status = 404, description = "Not Found"),
        (status = 409, description = "Slug already in use")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn update_category(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateCategoryRequest>,
) -> AppResult<Json<ApiResponse<Category>>> {
    ensure_staff(&user)?;
    let category = category_service::update_category(&state, id, payload).await?;
    audit::record(
        &state,
        Some(user.user_id),
        "category_update",
        "categories",
        serde_json::json!({ "category_id": id }),
    )
    .await;
    Ok(Json(ApiResponse::success("Category updated", category, None)))
}

#[utoipa::path(
    delete,
    path = "/api/admin/categories/{id}",
    params(("id" = Uuid, Path, description = "Category ID")),
    responses(
        (status = 200, description = "Category deleted", body = ApiResponse<serde_json::Value>),
        (status = 404, description = "Not Found"),
        (status = 409, description = "Category still has subcategories or products")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn delete_category(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    ensure_staff(&user)?;
    category_service::delete_category(&state, id).await?;
    audit::record(
        &state,
        Some(user.user_id),
        "category_delete",
        "categories",
        serde_json::json!({ "category_id": id }),
    )
    .await;
    Ok(Json(ApiResponse::success(
        "Deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    )))
}

#[utoipa::path(
    post,
    path = "/api/admin/categories/{id}/toggle",
    params(("id" = Uuid, Path, description = "Category ID")),
    responses(
        (status = 200, description = "Status flipped between active and inactive", body = ApiResponse<Category>),
        (status = 404, description = "Not Found")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn toggle_category(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Category>>> {
    ensure_staff(&user)?;
    let category = category_service::toggle_status(&state, id).await?;
    Ok(Json(ApiResponse::success("Category updated", category, None)))
}

#[utoipa::path(
    patch,
    path = "/api/admin/categories/{id}/product-count",
    params(("id" = Uuid, Path, description = "Category ID")),
    request_body = ProductCountRequest,
    responses(
        (status = 200, description = "Product count set", body = ApiResponse<Category>),
        (status = 422, description = "Negative count")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn update_product_count(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<ProductCountRequest>,
) -> AppResult<Json<ApiResponse<Category>>> {
    ensure_staff(&user)?;
    let category = category_service::update_product_count(&state, id, payload.count).await?;
    Ok(Json(ApiResponse::success("Category updated", category, None)))
}

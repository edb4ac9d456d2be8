use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{patch, post},
};

use crate::{
    cart::Cart,
    dto::{
        cart::{AddToCartRequest, CartView, UpdateCartItemRequest},
        coupons::CouponQuote,
    },
    error::{AppError, AppResult},
    middleware::cart_session::CartSession,
    models::Product,
    response::ApiResponse,
    services::{coupon_service, product_service},
    state::AppState,
};

#[derive(Debug, serde::Deserialize, utoipa::ToSchema)]
pub struct ApplyCouponRequest {
    pub code: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", axum::routing::get(get_cart).delete(clear_cart))
        .route("/items", post(add_to_cart))
        .route("/items/{item_id}", patch(update_cart_item).delete(remove_from_cart))
        .route("/coupon", post(quote_coupon))
}

fn check_variant(product: &Product, payload: &AddToCartRequest) -> AppResult<()> {
    if let Some(color) = &payload.selected_color {
        if !product.colors.is_empty() && !product.colors.contains(color) {
            return Err(AppError::validation("selected_color", "Color is not available"));
        }
    }
    if let Some(size) = &payload.selected_size {
        if !product.sizes.is_empty() && !product.sizes.contains(size) {
            return Err(AppError::validation("selected_size", "Size is not available"));
        }
    }
    Ok(())
}

#[utoipa::path(
    get,
    path = "/api/cart",
    params(("x-cart-id" = String, Header, description = "Cart identifier")),
    responses(
        (status = 200, description = "Cart lines with totals", body = ApiResponse<CartView>),
        (status = 400, description = "Missing or invalid cart id")
    ),
    tag = "Cart"
)]
pub async fn get_cart(
    State(state): State<AppState>,
    CartSession(cart_id): CartSession,
) -> AppResult<Json<ApiResponse<CartView>>> {
    let cart = state.carts.load(&cart_id)?;
    Ok(Json(ApiResponse::success("OK", CartView::from(cart), None)))
}

#[utoipa::path(
    post,
    path = "/api/cart/items",
    params(("x-cart-id" = String, Header, description = "Cart identifier")),
    request_body = AddToCartRequest,
    responses(
        (status = 200, description = "Line added or merged", body = ApiResponse<CartView>),
        (status = 400, description = "Bad request"),
        (status = 422, description = "Unknown color or size"),
    ),
    tag = "Cart"
)]
pub async fn add_to_cart(
    State(state): State<AppState>,
    CartSession(cart_id): CartSession,
    Json(payload): Json<AddToCartRequest>,
) -> AppResult<Json<ApiResponse<CartView>>> {
    if payload.quantity <= 0 {
        return Err(AppError::BadRequest(
            "quantity must be greater than 0".to_string(),
        ));
    }
    let product = product_service::find_product(&state, payload.product_id)
        .await?
        .ok_or_else(|| AppError::BadRequest("product not found".to_string()))?;
    if !product.in_stock {
        return Err(AppError::BadRequest("product is out of stock".to_string()));
    }
    check_variant(&product, &payload)?;

    let (cart, _) = state.carts.update(&cart_id, |cart: &mut Cart| {
        cart.add_item(
            product,
            payload.quantity,
            payload.selected_color,
            payload.selected_size,
        )
        .map(|line| line.id.clone())
    })?;
    tracing::debug!(cart_id, product_id = %payload.product_id, "cart line added");
    Ok(Json(ApiResponse::success("OK", CartView::from(cart), None)))
}

#[utoipa::path(
    patch,
    path = "/api/cart/items/{item_id}",
    params(
        ("x-cart-id" = String, Header, description = "Cart identifier"),
        ("item_id" = String, Path, description = "Cart line ID")
    ),
    request_body = UpdateCartItemRequest,
    responses(
        (status = 200, description = "Quantity set; zero or less removes the line", body = ApiResponse<CartView>),
        (status = 404, description = "Cart line not found"),
    ),
    tag = "Cart"
)]
pub async fn update_cart_item(
    State(state): State<AppState>,
    CartSession(cart_id): CartSession,
    Path(item_id): Path<String>,
    Json(payload): Json<UpdateCartItemRequest>,
) -> AppResult<Json<ApiResponse<CartView>>> {
    let (cart, found) = state
        .carts
        .update(&cart_id, |cart| cart.update_quantity(&item_id, payload.quantity))?;
    if !found {
        return Err(AppError::NotFound);
    }
    Ok(Json(ApiResponse::success("OK", CartView::from(cart), None)))
}

#[utoipa::path(
    delete,
    path = "/api/cart/items/{item_id}",
    params(
        ("x-cart-id" = String, Header, description = "Cart identifier"),
        ("item_id" = String, Path, description = "Cart line ID")
    ),
    responses(
        (status = 200, description = "Removed from cart", body = ApiResponse<CartView>),
        (status = 404, description = "Cart line not found"),
    ),
    tag = "Cart"
)]
pub async fn remove_from_cart(
    State(state): State<AppState>,
    CartSession(cart_id): CartSession,
    Path(item_id): Path<String>,
) -> AppResult<Json<ApiResponse<CartView>>> {
    let (cart, removed) = state
        .carts
        .update(&cart_id, |cart| cart.remove_item(&item_id))?;
    if !removed {
        return Err(AppError::NotFound);
    }
    Ok(Json(ApiResponse::success(
        "Removed from cart",
        CartView::from(cart),
        None,
    )))
}

#[utoipa::path(
    delete,
    path = "/api/cart",
    params(("x-cart-id" = String, Header, description = "Cart identifier")),
    responses(
        (status = 200, description = "Cart emptied", body = ApiResponse<CartView>)
    ),
    tag = "Cart"
)]
pub async fn clear_cart(
    State(state): State<AppState>,
    CartSession(cart_id): CartSession,
) -> AppResult<Json<ApiResponse<CartView>>> {
    state.carts.clear(&cart_id)?;
    Ok(Json(ApiResponse::success(
        "Cart cleared",
        CartView::from(Cart::default()),
        None,
    )))
}

#[utoipa::path(
    post,
    path = "/api/cart/coupon",
    params(("x-cart-id" = String, Header, description = "Cart identifier")),
    request_body = ApplyCouponRequest,
    responses(
        (status = 200, description = "Discount for the current cart", body = ApiResponse<CouponQuote>),
        (status = 422, description = "Coupon rejected"),
    ),
    tag = "Cart"
)]
pub async fn quote_coupon(
    State(state): State<AppState>,
    CartSession(cart_id): CartSession,
    Json(payload): Json<ApplyCouponRequest>,
) -> AppResult<Json<ApiResponse<CouponQuote>>> {
    let cart = state.carts.load(&cart_id)?;
    let quote = coupon_service::quote(&state, &payload.code, cart.total()).await?;
    Ok(Json(ApiResponse::success("Coupon applied", quote, None)))
}

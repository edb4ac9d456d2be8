use axum::Router;

use crate::state::AppState;

pub mod account;
pub mod admin;
pub mod auth;
pub mod cart;
pub mod categories;
pub mod doc;
pub mod health;
pub mod orders;
pub mod params;
pub mod products;
pub mod wishlist;

// Build the API router without binding state; it will be provided at the top level.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .nest("/products", products::router())
        .nest("/categories", categories::router())
        .nest("/auth", auth::router())
        .nest("/account", account::router())
        .nest("/cart", cart::router())
        .nest("/orders", orders::route())
        .nest("/wishlist", wishlist::router())
        .nest("/admin", admin::router())
}

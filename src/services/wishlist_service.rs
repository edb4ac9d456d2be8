use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{Product, WishlistEntry},
    query::Table,
    services::product_service,
    state::AppState,
};

async fn entries(state: &AppState, user_id: Uuid) -> AppResult<Vec<WishlistEntry>> {
    Ok(state
        .db
        .fetch_all(
            "SELECT * FROM wishlist WHERE user_id = ? ORDER BY created_at DESC",
            &[json!(user_id)],
        )
        .await?)
}

/// Wishlisted products, newest first. Entries whose product is gone are skipped.
pub async fn list_wishlist(state: &AppState, user_id: Uuid) -> AppResult<Vec<Product>> {
    let mut products = Vec::new();
    for entry in entries(state, user_id).await? {
        match product_service::find_product(state, entry.product_id).await? {
            Some(product) => products.push(product),
            None => tracing::debug!(product_id = %entry.product_id, "wishlist product missing"),
        }
    }
    Ok(products)
}

/// Adding a product twice keeps the first entry.
pub async fn add_to_wishlist(
    state: &AppState,
    user_id: Uuid,
    product_id: Uuid,
) -> AppResult<WishlistEntry> {
    product_service::get_product(state, product_id).await?;

    if let Some(existing) = entries(state, user_id)
        .await?
        .into_iter()
        .find(|entry| entry.product_id == product_id)
    {
        return Ok(existing);
    }

    let entry = WishlistEntry {
        id: Uuid::new_v4(),
        user_id,
        product_id,
        created_at: Utc::now(),
    };
    Ok(state.db.insert(Table::Wishlist, &entry).await?)
}

/// Returns whether an entry was removed.
pub async fn remove_from_wishlist(
    state: &AppState,
    user_id: Uuid,
    product_id: Uuid,
) -> AppResult<bool> {
    let mut removed = false;
    for entry in entries(state, user_id).await? {
        if entry.product_id == product_id {
            removed |= state.db.delete(Table::Wishlist, &entry.id.to_string()).await? > 0;
        }
    }
    Ok(removed)
}

use chrono::{DateTime, Utc};
use rand::Rng;
use serde_json::{Map, json};
use uuid::Uuid;

use crate::{
    dto::orders::{NewOrder, OrderStats, RevenueReport},
    error::{AppError, AppResult},
    models::{Order, OrderStatus, PaymentStatus},
    query::Table,
    response::Page,
    routes::params::{OrderListQuery, Paged},
    services::product_service,
    state::AppState,
};

const RECENT_LIMIT: usize = 10;

/// `ORD-{last 6 digits of the millisecond clock}-{6 random base36 chars}`.
pub fn generate_order_number() -> String {
    const ALPHABET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";
    let millis = Utc::now().timestamp_millis().to_string();
    let tail = &millis[millis.len().saturating_sub(6)..];
    let mut rng = rand::rng();
    let suffix: String = (0..6)
        .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())] as char)
        .collect();
    format!("ORD-{tail}-{suffix}")
}

/// Stores a pending order and takes its lines out of stock.
pub async fn create_order(state: &AppState, new_order: NewOrder) -> AppResult<Order> {
    if new_order.items.is_empty() {
        return Err(AppError::BadRequest("Order has no items".into()));
    }
    if new_order.items.iter().any(|item| item.quantity <= 0) {
        return Err(AppError::BadRequest("Order has invalid quantity".into()));
    }

    let subtotal: i64 = new_order.items.iter().map(|item| item.line_total()).sum();
    let discount = new_order.discount_amount.clamp(0, subtotal);
    let now = Utc::now();
    let order = Order {
        id: Uuid::new_v4(),
        order_number: generate_order_number(),
        user_id: new_order.user_id,
        items: new_order.items,
        status: OrderStatus::Pending,
        total_amount: subtotal - discount,
        discount_amount: discount,
        coupon_code: new_order.coupon_code,
        shipping_address: new_order.shipping_address,
        payment_method: new_order.payment_method,
        payment_status: PaymentStatus::Pending,
        notes: new_order.notes,
        cancel_reason: None,
        created_at: now,
        updated_at: now,
    };
    let order = state.db.insert(Table::Orders, &order).await?;

    for item in &order.items {
        product_service::update_stock(state, item.product.id, item.quantity).await?;
    }

    tracing::info!(
        order_id = %order.id,
        order_number = %order.order_number,
        total = order.total_amount,
        "order created"
    );
    Ok(order)
}

pub async fn all_orders(state: &AppState) -> AppResult<Vec<Order>> {
    Ok(state
        .db
        .fetch_all("SELECT * FROM orders ORDER BY created_at DESC", &[])
        .await?)
}

pub async fn get_order(state: &AppState, id: Uuid) -> AppResult<Order> {
    state
        .db
        .fetch_optional::<Order>("SELECT * FROM orders WHERE id = ?", &[json!(id)])
        .await?
        .ok_or(AppError::NotFound)
}

pub async fn get_order_by_number(state: &AppState, order_number: &str) -> AppResult<Order> {
    state
        .db
        .fetch_optional::<Order>(
            "SELECT * FROM orders WHERE order_number = ?",
            &[json!(order_number)],
        )
        .await?
        .ok_or(AppError::NotFound)
}

pub async fn orders_by_user(state: &AppState, user_id: Uuid) -> AppResult<Vec<Order>> {
    Ok(state
        .db
        .fetch_all(
            "SELECT * FROM orders WHERE user_id = ? ORDER BY created_at DESC",
            &[json!(user_id)],
        )
        .await?)
}

pub async fn orders_by_status(state: &AppState, status: OrderStatus) -> AppResult<Vec<Order>> {
    Ok(state
        .db
        .fetch_all(
            "SELECT * FROM orders WHERE status = ? ORDER BY created_at DESC",
            &[json!(status)],
        )
        .await?)
}

pub async fn recent_orders(state: &AppState, limit: Option<usize>) -> AppResult<Vec<Order>> {
    let mut orders = all_orders(state).await?;
    orders.truncate(limit.unwrap_or(RECENT_LIMIT));
    Ok(orders)
}

pub fn matches_search(order: &Order, needle: &str) -> bool {
    let needle = needle.to_lowercase();
    [
        order.order_number.as_str(),
        order.shipping_address.full_name.as_str(),
        order.shipping_address.address.as_str(),
        order.status.as_str(),
    ]
    .iter()
    .any(|text| text.to_lowercase().contains(&needle))
}

pub async fn search_orders(state: &AppState, query: &str) -> AppResult<Vec<Order>> {
    let query = query.trim();
    Ok(all_orders(state)
        .await?
        .into_iter()
        .filter(|order| matches_search(order, query))
        .collect())
}

/// Paginated listing, optionally narrowed by status and search text.
pub async fn list_orders(state: &AppState, query: OrderListQuery) -> AppResult<Page<Order>> {
    let (page, per_page, _) = query.pagination().normalize();
    let orders = match query.status {
        Some(status) => orders_by_status(state, status).await?,
        None => all_orders(state).await?,
    };
    let search = query.q.as_deref().map(str::trim).filter(|q| !q.is_empty());
    let orders = orders
        .into_iter()
        .filter(|order| search.is_none_or(|q| matches_search(order, q)))
        .collect();
    Ok(Page::from_vec(orders, page, per_page))
}

async fn write_patch(state: &AppState, id: Uuid, patch: Map<String, serde_json::Value>) -> AppResult<Order> {
    state
        .db
        .update(Table::Orders, &id.to_string(), &patch)
        .await?
        .ok_or(AppError::NotFound)
}

/// Moving to `cancelled` goes through [`cancel_order`] so stock is restored.
pub async fn update_order_status(
    state: &AppState,
    id: Uuid,
    status: OrderStatus,
) -> AppResult<Order> {
    if status == OrderStatus::Cancelled {
        return cancel_order(state, id, None).await;
    }
    let order = get_order(state, id).await?;
    if order.status == OrderStatus::Cancelled {
        return Err(AppError::Conflict("Order is already cancelled".into()));
    }

    let mut patch = Map::new();
    patch.insert("status".into(), json!(status));
    let updated = write_patch(state, id, patch).await?;
    tracing::info!(order_id = %id, from = %order.status, to = %status, "order status changed");
    Ok(updated)
}

pub async fn update_payment_status(
    state: &AppState,
    id: Uuid,
    payment_status: PaymentStatus,
) -> AppResult<Order> {
    get_order(state, id).await?;
    let mut patch = Map::new();
    patch.insert("payment_status".into(), json!(payment_status));
    write_patch(state, id, patch).await
}

/// Only pending or confirmed orders can be cancelled; their stock is restored.
pub async fn cancel_order(state: &AppState, id: Uuid, reason: Option<String>) -> AppResult<Order> {
    let order = get_order(state, id).await?;
    if !order.status.is_cancellable() {
        return Err(AppError::Conflict(format!(
            "Order cannot be cancelled in status {}",
            order.status
        )));
    }

    for item in &order.items {
        match product_service::restock(state, item.product.id, item.quantity).await {
            Ok(_) => {}
            Err(AppError::NotFound) => {
                tracing::warn!(product_id = %item.product.id, "product gone, stock not restored");
            }
            Err(err) => return Err(err),
        }
    }

    let mut patch = Map::new();
    patch.insert("status".into(), json!(OrderStatus::Cancelled));
    patch.insert("cancel_reason".into(), json!(reason));
    let cancelled = write_patch(state, id, patch).await?;
    tracing::info!(order_id = %id, "order cancelled");
    Ok(cancelled)
}

pub async fn orders_by_date_range(
    state: &AppState,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> AppResult<Vec<Order>> {
    Ok(all_orders(state)
        .await?
        .into_iter()
        .filter(|order| order.created_at >= from && order.created_at <= to)
        .collect())
}

pub async fn revenue_by_date_range(
    state: &AppState,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> AppResult<RevenueReport> {
    let orders: Vec<Order> = orders_by_date_range(state, from, to)
        .await?
        .into_iter()
        .filter(|order| order.status != OrderStatus::Cancelled)
        .collect();
    Ok(RevenueReport {
        from,
        to,
        orders: orders.len() as i64,
        revenue: orders.iter().map(|order| order.total_amount).sum(),
    })
}

pub fn summarize(orders: &[Order]) -> OrderStats {
    let mut stats = OrderStats {
        total: orders.len() as i64,
        ..OrderStats::default()
    };
    let mut completed = 0;
    for order in orders {
        match order.status {
            OrderStatus::Pending => stats.pending += 1,
            OrderStatus::Confirmed => stats.confirmed += 1,
            OrderStatus::Processing => stats.processing += 1,
            OrderStatus::Shipped => stats.shipped += 1,
            OrderStatus::Delivered => stats.delivered += 1,
            OrderStatus::Cancelled => stats.cancelled += 1,
        }
        if order.status != OrderStatus::Cancelled {
            completed += 1;
            stats.total_revenue += order.total_amount;
        }
    }
    if completed > 0 {
        stats.average_order_value = stats.total_revenue / completed;
    }
    stats
}

pub async fn order_stats(state: &AppState) -> AppResult<OrderStats> {
    Ok(summarize(&all_orders(state).await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_numbers_have_the_expected_shape() {
        let number = generate_order_number();
        let parts: Vec<&str> = number.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "ORD");
        assert_eq!(parts[1].len(), 6);
        assert!(parts[1].chars().all(|c| c.is_ascii_digit()));
        assert_eq!(parts[2].len(), 6);
        assert!(parts[2].chars().all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
    }
}

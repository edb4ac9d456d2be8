use std::collections::HashMap;

use chrono::Utc;
use uuid::Uuid;

use crate::{
    dto::orders::{CheckoutRequest, NewOrder},
    error::{AppError, AppResult, FieldErrors},
    models::{CartItem, Order, ShippingAddress},
    services::{coupon_service, order_service, product_service},
    state::AppState,
};

const MIN_PHONE_DIGITS: usize = 8;

/// Field-keyed errors for the shipping form; empty when valid.
pub fn validate_shipping(address: &ShippingAddress) -> FieldErrors {
    let mut errors = FieldErrors::new();
    for (field, value, label) in [
        ("full_name", &address.full_name, "Full name"),
        ("address", &address.address, "Address"),
        ("city", &address.city, "City"),
        ("postal_code", &address.postal_code, "Postal code"),
        ("country", &address.country, "Country"),
        ("phone", &address.phone, "Phone"),
    ] {
        if value.trim().is_empty() {
            errors.insert(field.into(), format!("{label} is required"));
        }
    }
    if !errors.contains_key("phone") {
        let digits = address.phone.chars().filter(char::is_ascii_digit).count();
        if digits < MIN_PHONE_DIGITS {
            errors.insert(
                "phone".into(),
                format!("Phone must contain at least {MIN_PHONE_DIGITS} digits"),
            );
        }
    }
    errors
}

/// Reprices every line from the catalog and checks stock per product,
/// summing variant lines of the same product.
async fn refresh_lines(state: &AppState, items: Vec<CartItem>) -> AppResult<Vec<CartItem>> {
    let mut wanted: HashMap<Uuid, i64> = HashMap::new();
    for item in &items {
        *wanted.entry(item.product.id).or_default() += i64::from(item.quantity);
    }

    let mut refreshed = Vec::with_capacity(items.len());
    for mut item in items {
        let product = product_service::find_product(state, item.product.id)
            .await?
            .ok_or_else(|| {
                AppError::BadRequest(format!("{} is no longer available", item.product.name))
            })?;
        let total = wanted.get(&product.id).copied().unwrap_or_default();
        if i64::from(product.stock) < total {
            return Err(AppError::BadRequest(format!(
                "Insufficient stock for {} ({} left)",
                product.name, product.stock
            )));
        }
        item.product = product;
        refreshed.push(item);
    }
    Ok(refreshed)
}

/// Turns the cart into a pending order, redeems the coupon and empties the cart.
pub async fn checkout(
    state: &AppState,
    cart_id: &str,
    user_id: Option<Uuid>,
    payload: CheckoutRequest,
) -> AppResult<Order> {
    let cart = state.carts.load(cart_id)?;
    if cart.is_empty() {
        return Err(AppError::BadRequest("Cart is empty".into()));
    }

    let errors = validate_shipping(&payload.shipping_address);
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    let items = refresh_lines(state, cart.items).await?;
    let subtotal: i64 = items.iter().map(CartItem::line_total).sum();

    let coupon = match payload.coupon_code.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
        Some(code) => Some(coupon_service::validate_coupon(state, code, subtotal, Utc::now()).await?),
        None => None,
    };

    let order = order_service::create_order(
        state,
        NewOrder {
            user_id,
            items,
            shipping_address: payload.shipping_address,
            payment_method: payload.payment_method,
            notes: payload.notes.filter(|n| !n.trim().is_empty()),
            discount_amount: coupon.as_ref().map_or(0, |(_, discount)| *discount),
            coupon_code: coupon.as_ref().map(|(coupon, _)| coupon.code.clone()),
        },
    )
    .await?;

    if let Some((coupon, _)) = coupon {
        coupon_service::redeem(state, coupon.id).await?;
    }
    state.carts.clear(cart_id)?;

    tracing::info!(order_id = %order.id, cart_id, "checkout completed");
    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn address() -> ShippingAddress {
        ShippingAddress {
            full_name: "Ann Lee".into(),
            address: "1 Main St".into(),
            city: "Hanoi".into(),
            postal_code: "100000".into(),
            country: "VN".into(),
            phone: "+84 912 345 678".into(),
        }
    }

    #[test]
    fn complete_form_passes() {
        assert!(validate_shipping(&address()).is_empty());
    }

    #[test]
    fn each_missing_field_is_reported() {
        let errors = validate_shipping(&ShippingAddress::default());
        for field in ["full_name", "address", "city", "postal_code", "country", "phone"] {
            assert!(errors.contains_key(field), "missing {field}");
        }
    }

    #[test]
    fn short_phone_is_rejected() {
        let mut form = address();
        form.phone = "123-4567".into();
        let errors = validate_shipping(&form);
        assert_eq!(errors.len(), 1);
        assert!(errors["phone"].contains("8 digits"));
    }
}

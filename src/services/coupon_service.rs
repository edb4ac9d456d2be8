use chrono::{DateTime, Utc};
use serde_json::{Map, Value, json};
use uuid::Uuid;

use crate::{
    dto::coupons::{CouponQuote, CreateCouponRequest, UpdateCouponRequest},
    error::{AppError, AppResult, FieldErrors},
    models::{Coupon, CouponKind, CouponStatus},
    query::Table,
    state::AppState,
};

fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

/// Percentage discounts are floored; fixed ones never exceed the subtotal.
pub fn discount_for(coupon: &Coupon, subtotal: i64) -> i64 {
    if subtotal <= 0 {
        return 0;
    }
    match coupon.kind {
        CouponKind::Percentage => subtotal * coupon.value.clamp(0, 100) / 100,
        CouponKind::Fixed => coupon.value.clamp(0, subtotal),
    }
}

/// Checks a coupon against an order subtotal at `now`, returning the discount.
pub fn check_coupon(coupon: &Coupon, subtotal: i64, now: DateTime<Utc>) -> Result<i64, String> {
    if coupon.status != CouponStatus::Active {
        return Err("Coupon is not active".into());
    }
    if coupon.starts_at.is_some_and(|starts| now < starts) {
        return Err("Coupon is not valid yet".into());
    }
    if coupon.ends_at.is_some_and(|ends| now > ends) {
        return Err("Coupon has expired".into());
    }
    if coupon.max_uses.is_some_and(|max| coupon.used_count >= max) {
        return Err("Coupon usage limit reached".into());
    }
    if subtotal < coupon.min_order {
        return Err(format!("Order must be at least {} to use this coupon", coupon.min_order));
    }
    Ok(discount_for(coupon, subtotal))
}

fn validate_terms(kind: CouponKind, value: i64, min_order: i64, max_uses: Option<i64>) -> AppResult<()> {
    let mut errors = FieldErrors::new();
    match kind {
        CouponKind::Percentage if !(1..=100).contains(&value) => {
            errors.insert("value".into(), "Percentage must be between 1 and 100".into());
        }
        CouponKind::Fixed if value <= 0 => {
            errors.insert("value".into(), "Amount must be positive".into());
        }
        _ => {}
    }
    if min_order < 0 {
        errors.insert("min_order".into(), "Minimum order must not be negative".into());
    }
    if max_uses.is_some_and(|max| max <= 0) {
        errors.insert("max_uses".into(), "Maximum uses must be positive".into());
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(errors))
    }
}

pub async fn all_coupons(state: &AppState) -> AppResult<Vec<Coupon>> {
    Ok(state
        .db
        .fetch_all("SELECT * FROM coupons ORDER BY created_at DESC", &[])
        .await?)
}

pub async fn find_by_code(state: &AppState, code: &str) -> AppResult<Option<Coupon>> {
    Ok(state
        .db
        .fetch_optional("SELECT * FROM coupons WHERE code = ?", &[json!(normalize_code(code))])
        .await?)
}

pub async fn get_coupon(state: &AppState, id: Uuid) -> AppResult<Coupon> {
    state
        .db
        .fetch_optional::<Coupon>("SELECT * FROM coupons WHERE id = ?", &[json!(id)])
        .await?
        .ok_or(AppError::NotFound)
}

pub async fn create_coupon(state: &AppState, payload: CreateCouponRequest) -> AppResult<Coupon> {
    let code = normalize_code(&payload.code);
    if code.is_empty() {
        return Err(AppError::validation("code", "Code is required"));
    }
    validate_terms(payload.kind, payload.value, payload.min_order, payload.max_uses)?;
    if find_by_code(state, &code).await?.is_some() {
        return Err(AppError::Conflict("Coupon code already exists".into()));
    }

    let now = Utc::now();
    let coupon = Coupon {
        id: Uuid::new_v4(),
        code,
        kind: payload.kind,
        value: payload.value,
        min_order: payload.min_order,
        max_uses: payload.max_uses,
        used_count: 0,
        starts_at: payload.starts_at,
        ends_at: payload.ends_at,
        status: payload.status.unwrap_or(CouponStatus::Active),
        created_at: now,
        updated_at: now,
    };
    Ok(state.db.insert(Table::Coupons, &coupon).await?)
}

pub async fn update_coupon(
    state: &AppState,
    id: Uuid,
    payload: UpdateCouponRequest,
) -> AppResult<Coupon> {
    let existing = get_coupon(state, id).await?;
    validate_terms(
        payload.kind.unwrap_or(existing.kind),
        payload.value.unwrap_or(existing.value),
        payload.min_order.unwrap_or(existing.min_order),
        payload.max_uses.or(existing.max_uses),
    )?;
    let patch = match serde_json::to_value(&payload).map_err(anyhow::Error::from)? {
        Value::Object(patch) => patch,
        _ => Map::new(),
    };
    write_patch(state, id, patch).await
}

async fn write_patch(state: &AppState, id: Uuid, patch: Map<String, Value>) -> AppResult<Coupon> {
    state
        .db
        .update(Table::Coupons, &id.to_string(), &patch)
        .await?
        .ok_or(AppError::NotFound)
}

pub async fn delete_coupon(state: &AppState, id: Uuid) -> AppResult<()> {
    if state.db.delete(Table::Coupons, &id.to_string()).await? == 0 {
        return Err(AppError::NotFound);
    }
    Ok(())
}

/// Looks up and checks a code; failures are reported against `coupon_code`.
pub async fn validate_coupon(
    state: &AppState,
    code: &str,
    subtotal: i64,
    now: DateTime<Utc>,
) -> AppResult<(Coupon, i64)> {
    let coupon = find_by_code(state, code)
        .await?
        .ok_or_else(|| AppError::validation("coupon_code", "Coupon not found"))?;
    let discount =
        check_coupon(&coupon, subtotal, now).map_err(|msg| AppError::validation("coupon_code", msg))?;
    Ok((coupon, discount))
}

pub async fn quote(state: &AppState, code: &str, subtotal: i64) -> AppResult<CouponQuote> {
    let (coupon, discount) = validate_coupon(state, code, subtotal, Utc::now()).await?;
    Ok(CouponQuote {
        code: coupon.code,
        subtotal,
        discount,
        total: subtotal - discount,
    })
}

pub async fn redeem(state: &AppState, id: Uuid) -> AppResult<Coupon> {
    let coupon = get_coupon(state, id).await?;
    let mut patch = Map::new();
    patch.insert("used_count".into(), json!(coupon.used_count + 1));
    write_patch(state, id, patch).await
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn coupon(kind: CouponKind, value: i64) -> Coupon {
        let now = Utc::now();
        Coupon {
            id: Uuid::new_v4(),
            code: "SAVE".into(),
            kind,
            value,
            min_order: 0,
            max_uses: None,
            used_count: 0,
            starts_at: None,
            ends_at: None,
            status: CouponStatus::Active,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn percentage_is_floored() {
        let c = coupon(CouponKind::Percentage, 15);
        assert_eq!(discount_for(&c, 999), 149);
        assert_eq!(discount_for(&c, 0), 0);
    }

    #[test]
    fn fixed_is_capped_at_subtotal() {
        let c = coupon(CouponKind::Fixed, 5_000);
        assert_eq!(discount_for(&c, 12_000), 5_000);
        assert_eq!(discount_for(&c, 3_000), 3_000);
    }

    #[test]
    fn window_usage_and_minimum_are_enforced() {
        let now = Utc::now();
        let mut c = coupon(CouponKind::Fixed, 100);

        c.starts_at = Some(now + Duration::days(1));
        assert!(check_coupon(&c, 1_000, now).is_err());
        c.starts_at = None;

        c.ends_at = Some(now - Duration::seconds(1));
        assert!(check_coupon(&c, 1_000, now).is_err());
        c.ends_at = None;

        c.max_uses = Some(2);
        c.used_count = 2;
        assert!(check_coupon(&c, 1_000, now).is_err());
        c.max_uses = None;

        c.min_order = 5_000;
        assert!(check_coupon(&c, 4_999, now).is_err());
        assert_eq!(check_coupon(&c, 5_000, now), Ok(100));

        c.status = CouponStatus::Inactive;
        assert!(check_coupon(&c, 5_000, now).is_err());
    }
}

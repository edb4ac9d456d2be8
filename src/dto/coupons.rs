use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{Coupon, CouponKind, CouponStatus};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateCouponRequest {
    pub code: String,
    pub kind: CouponKind,
    pub value: i64,
    #[serde(default)]
    pub min_order: i64,
    pub max_uses: Option<i64>,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    pub status: Option<CouponStatus>,
}

#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
pub struct UpdateCouponRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<CouponKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_order: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_uses: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub starts_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ends_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<CouponStatus>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ValidateCouponRequest {
    pub code: String,
    pub subtotal: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CouponQuote {
    pub code: String,
    pub subtotal: i64,
    pub discount: i64,
    pub total: i64,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct CouponList {
    #[schema(value_type = Vec<Coupon>)]
    pub items: Vec<Coupon>,
}

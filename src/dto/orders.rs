use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{CartItem, Order, OrderStatus, PaymentMethod, PaymentStatus, ShippingAddress};

/// Input of order creation, already priced.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: Option<Uuid>,
    pub items: Vec<CartItem>,
    pub shipping_address: ShippingAddress,
    pub payment_method: PaymentMethod,
    pub notes: Option<String>,
    pub discount_amount: i64,
    pub coupon_code: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CheckoutRequest {
    pub shipping_address: ShippingAddress,
    pub payment_method: PaymentMethod,
    pub notes: Option<String>,
    pub coupon_code: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateOrderStatusRequest {
    pub status: OrderStatus,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdatePaymentStatusRequest {
    pub payment_status: PaymentStatus,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CancelOrderRequest {
    pub reason: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct OrderList {
    #[schema(value_type = Vec<Order>)]
    pub items: Vec<Order>,
}

#[derive(Debug, Default, Serialize, ToSchema)]
pub struct OrderStats {
    pub total: i64,
    pub pending: i64,
    pub confirmed: i64,
    pub processing: i64,
    pub shipped: i64,
    pub delivered: i64,
    pub cancelled: i64,
    pub total_revenue: i64,
    pub average_order_value: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RevenueReport {
    pub from: chrono::DateTime<chrono::Utc>,
    pub to: chrono::DateTime<chrono::Utc>,
    pub orders: i64,
    pub revenue: i64,
}

/// Public view of an order looked up by number.
#[derive(Debug, Serialize, ToSchema)]
pub struct OrderTracking {
    pub order_number: String,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl From<Order> for OrderTracking {
    fn from(order: Order) -> Self {
        Self {
            order_number: order.order_number,
            status: order.status,
            payment_status: order.payment_status,
            created_at: order.created_at,
            updated_at: order.updated_at,
        }
    }
}

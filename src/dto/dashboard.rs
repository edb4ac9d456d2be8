use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    dto::{categories::CategoryStats, orders::OrderStats, products::ProductStats, users::UserStats},
    models::{Order, Product},
};

#[derive(Debug, Serialize, ToSchema)]
pub struct DashboardOverview {
    pub products: ProductStats,
    pub orders: OrderStats,
    pub categories: CategoryStats,
    pub users: UserStats,
    pub recent_orders: Vec<Order>,
    pub low_stock: Vec<Product>,
}

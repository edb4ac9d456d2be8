use crate::{
    dto::dashboard::DashboardOverview,
    error::AppResult,
    services::{category_service, order_service, product_service, user_service},
    state::AppState,
};

const RECENT_ORDERS: usize = 5;

pub async fn overview(state: &AppState) -> AppResult<DashboardOverview> {
    let (products, orders, categories, users) = tokio::try_join!(
        product_service::product_stats(state),
        order_service::order_stats(state),
        category_service::category_stats(state),
        user_service::user_stats(state),
    )?;
    let (recent_orders, low_stock) = tokio::try_join!(
        order_service::recent_orders(state, Some(RECENT_ORDERS)),
        product_service::low_stock_products(state, None),
    )?;

    Ok(DashboardOverview {
        products,
        orders,
        categories,
        users,
        recent_orders,
        low_stock,
    })
}

//! Back-office endpoints. Editors and admins are staff; role changes and
//! storage maintenance are admin-only.

use axum::Router;

use crate::state::AppState;

pub mod catalog;
pub mod customers;
pub mod marketing;
pub mod orders;
pub mod system;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(orders::router())
        .merge(catalog::router())
        .merge(customers::router())
        .merge(marketing::router())
        .merge(system::router())
}

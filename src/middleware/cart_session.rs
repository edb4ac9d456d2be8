use axum::extract::FromRequestParts;

use crate::error::AppError;

pub const CART_ID_HEADER: &str = "x-cart-id";

/// Cart addressed by the `x-cart-id` header.
#[derive(Debug, Clone)]
pub struct CartSession(pub String);

impl<S> FromRequestParts<S> for CartSession
where
    S: Send + Sync,
{
    type Rejection = AppError;
    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(CART_ID_HEADER)
            .ok_or_else(|| AppError::BadRequest("Missing x-cart-id header".into()))?
            .to_str()
            .map_err(|_| AppError::BadRequest("Invalid x-cart-id header".into()))?
            .trim();

        let valid = !value.is_empty()
            && value.len() <= 64
            && value
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(AppError::BadRequest("Invalid x-cart-id header".into()));
        }
        Ok(CartSession(value.to_string()))
    }
}

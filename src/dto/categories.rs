use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{Category, CategoryStatus};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateCategoryRequest {
    pub name: String,
    pub description: Option<String>,
    /// Generated from the name when empty.
    pub slug: Option<String>,
    pub parent_id: Option<Uuid>,
    pub status: Option<CategoryStatus>,
    pub image: Option<String>,
    #[serde(default)]
    pub product_count: i64,
}

#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
pub struct UpdateCategoryRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<CategoryStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ProductCountRequest {
    pub count: i64,
}

#[derive(Serialize, ToSchema)]
#[serde(transparent)]
pub struct CategoryList {
    #[schema(value_type = Vec<Category>)]
    pub items: Vec<Category>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CategoryStats {
    pub total: i64,
    pub active: i64,
    pub inactive: i64,
    pub with_products: i64,
    pub parent_categories: i64,
    pub subcategories: i64,
}

use std::collections::BTreeMap;

use chrono::Utc;
use serde_json::{Map, Value, json};
use uuid::Uuid;

use crate::{
    dto::products::{CreateProductRequest, ProductStats, UpdateProductRequest},
    error::{AppError, AppResult, FieldErrors},
    models::Product,
    query::Table,
    response::Page,
    routes::params::{Paged, ProductQuery, ProductSortBy, SortOrder},
    state::AppState,
};

pub const LOW_STOCK_THRESHOLD: i32 = 10;
const FEATURED_LIMIT: usize = 8;

pub async fn all_products(state: &AppState) -> AppResult<Vec<Product>> {
    Ok(state
        .db
        .fetch_all("SELECT * FROM products ORDER BY created_at DESC", &[])
        .await?)
}

/// Case-insensitive match over every translation of name and description, and the category.
pub fn matches_search(product: &Product, needle: &str) -> bool {
    let needle = needle.to_lowercase();
    std::iter::once(&product.name)
        .chain(product.name_translations.values())
        .chain(std::iter::once(&product.description))
        .chain(product.description_translations.values())
        .chain(std::iter::once(&product.category))
        .any(|text| text.to_lowercase().contains(&needle))
}

pub async fn list_products(state: &AppState, query: ProductQuery) -> AppResult<Page<Product>> {
    let (page, per_page, _) = query.pagination().normalize();
    let sort_by = query.sort_by.unwrap_or(ProductSortBy::CreatedAt);
    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);

    let products: Vec<Product> = match query.category.as_ref().filter(|c| !c.is_empty()) {
        Some(category) => {
            let sql = format!(
                "SELECT * FROM products WHERE category = ? ORDER BY {} {}",
                sort_by.as_sql(),
                sort_order.as_sql()
            );
            state.db.fetch_all(&sql, &[json!(category)]).await?
        }
        None => {
            let sql = format!(
                "SELECT * FROM products ORDER BY {} {}",
                sort_by.as_sql(),
                sort_order.as_sql()
            );
            state.db.fetch_all(&sql, &[]).await?
        }
    };

    let search = query.q.as_deref().map(str::trim).filter(|q| !q.is_empty());
    let filtered = products
        .into_iter()
        .filter(|p| search.is_none_or(|q| matches_search(p, q)))
        .filter(|p| query.min_price.is_none_or(|min| p.price >= min))
        .filter(|p| query.max_price.is_none_or(|max| p.price <= max))
        .collect();

    Ok(Page::from_vec(filtered, page, per_page))
}

pub async fn find_product(state: &AppState, id: Uuid) -> AppResult<Option<Product>> {
    Ok(state
        .db
        .fetch_optional("SELECT * FROM products WHERE id = ?", &[json!(id)])
        .await?)
}

pub async fn get_product(state: &AppState, id: Uuid) -> AppResult<Product> {
    find_product(state, id).await?.ok_or(AppError::NotFound)
}

pub async fn featured_products(state: &AppState) -> AppResult<Vec<Product>> {
    let mut products: Vec<Product> = state
        .db
        .fetch_all("SELECT * FROM products WHERE featured = ? ORDER BY rating DESC", &[json!(true)])
        .await?;
    products.truncate(FEATURED_LIMIT);
    Ok(products)
}

pub async fn products_by_category(state: &AppState, category: &str) -> AppResult<Vec<Product>> {
    Ok(state
        .db
        .fetch_all(
            "SELECT * FROM products WHERE category = ? ORDER BY name ASC",
            &[json!(category)],
        )
        .await?)
}

fn validate_product(name: &str, price: i64, stock: i32, category: &str) -> AppResult<()> {
    let mut errors = FieldErrors::new();
    if name.trim().is_empty() {
        errors.insert("name".into(), "Name is required".into());
    }
    if price < 0 {
        errors.insert("price".into(), "Price must not be negative".into());
    }
    if stock < 0 {
        errors.insert("stock".into(), "Stock must not be negative".into());
    }
    if category.trim().is_empty() {
        errors.insert("category".into(), "Category is required".into());
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(errors))
    }
}

pub async fn create_product(state: &AppState, payload: CreateProductRequest) -> AppResult<Product> {
    validate_product(&payload.name, payload.price, payload.stock, &payload.category)?;

    let now = Utc::now();
    let product = Product {
        id: Uuid::new_v4(),
        name: payload.name.trim().to_string(),
        name_translations: payload.name_translations,
        description: payload.description,
        description_translations: payload.description_translations,
        price: payload.price,
        original_price: payload.original_price,
        category: payload.category,
        images: payload.images,
        colors: payload.colors,
        sizes: payload.sizes,
        rating: 0.0,
        reviews: 0,
        in_stock: payload.stock > 0,
        stock: payload.stock,
        features: payload.features,
        specifications: payload.specifications,
        featured: payload.featured,
        created_at: now,
        updated_at: now,
    };
    let product = state.db.insert(Table::Products, &product).await?;
    tracing::info!(product_id = %product.id, "product created");
    Ok(product)
}

pub async fn update_product(
    state: &AppState,
    id: Uuid,
    payload: UpdateProductRequest,
) -> AppResult<Product> {
    let existing = get_product(state, id).await?;
    validate_product(
        payload.name.as_deref().unwrap_or(&existing.name),
        payload.price.unwrap_or(existing.price),
        payload.stock.unwrap_or(existing.stock),
        payload.category.as_deref().unwrap_or(&existing.category),
    )?;

    let mut patch = match serde_json::to_value(&payload).map_err(anyhow::Error::from)? {
        Value::Object(patch) => patch,
        _ => Map::new(),
    };
    if let Some(stock) = payload.stock {
        patch.insert("in_stock".into(), json!(stock > 0));
    }
    write_patch(state, id, patch).await
}

async fn write_patch(state: &AppState, id: Uuid, patch: Map<String, Value>) -> AppResult<Product> {
    state
        .db
        .update(Table::Products, &id.to_string(), &patch)
        .await?
        .ok_or(AppError::NotFound)
}

pub async fn delete_product(state: &AppState, id: Uuid) -> AppResult<()> {
    if state.db.delete(Table::Products, &id.to_string()).await? == 0 {
        return Err(AppError::NotFound);
    }
    tracing::info!(product_id = %id, "product deleted");
    Ok(())
}

async fn set_stock(state: &AppState, id: Uuid, stock: i32) -> AppResult<Product> {
    let stock = stock.max(0);
    let mut patch = Map::new();
    patch.insert("stock".into(), json!(stock));
    patch.insert("in_stock".into(), json!(stock > 0));
    write_patch(state, id, patch).await
}

/// Takes `quantity` units out of stock, never going below zero.
pub async fn update_stock(state: &AppState, id: Uuid, quantity: i32) -> AppResult<Product> {
    let product = get_product(state, id).await?;
    set_stock(state, id, product.stock.saturating_sub(quantity)).await
}

pub async fn restock(state: &AppState, id: Uuid, quantity: i32) -> AppResult<Product> {
    if quantity <= 0 {
        return Err(AppError::validation("quantity", "Quantity must be positive"));
    }
    let product = get_product(state, id).await?;
    set_stock(state, id, product.stock.saturating_add(quantity)).await
}

pub async fn adjust_stock(state: &AppState, id: Uuid, delta: i32) -> AppResult<Product> {
    match delta {
        0 => get_product(state, id).await,
        d if d > 0 => restock(state, id, d).await,
        d => update_stock(state, id, d.saturating_neg()).await,
    }
}

pub async fn low_stock_products(state: &AppState, threshold: Option<i32>) -> AppResult<Vec<Product>> {
    let threshold = threshold.unwrap_or(LOW_STOCK_THRESHOLD);
    let products: Vec<Product> = state
        .db
        .fetch_all("SELECT * FROM products ORDER BY stock ASC", &[])
        .await?;
    Ok(products
        .into_iter()
        .filter(|p| p.stock <= threshold)
        .collect())
}

pub async fn product_stats(state: &AppState) -> AppResult<ProductStats> {
    let products = all_products(state).await?;
    let total = products.len() as i64;
    let in_stock = products.iter().filter(|p| p.in_stock).count() as i64;
    let mut by_category = BTreeMap::new();
    for product in &products {
        *by_category.entry(product.category.clone()).or_insert(0) += 1;
    }
    let average_price = if total > 0 {
        products.iter().map(|p| p.price).sum::<i64>() / total
    } else {
        0
    };

    Ok(ProductStats {
        total,
        in_stock,
        out_of_stock: total - in_stock,
        low_stock: products
            .iter()
            .filter(|p| p.stock <= LOW_STOCK_THRESHOLD)
            .count() as i64,
        featured: products.iter().filter(|p| p.featured).count() as i64,
        average_price,
        by_category,
    })
}

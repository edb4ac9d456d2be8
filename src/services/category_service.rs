use chrono::Utc;
use serde_json::{Map, Value, json};
use uuid::Uuid;

use crate::{
    dto::categories::{CategoryStats, CreateCategoryRequest, UpdateCategoryRequest},
    error::{AppError, AppResult, FieldErrors},
    models::{Category, CategoryStatus},
    query::Table,
    response::Page,
    routes::params::{CategoryQuery, Paged},
    services::product_service,
    state::AppState,
};

/// Lowercase ASCII letters, digits and single hyphens.
pub fn generate_slug(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for ch in name.to_lowercase().chars() {
        match ch {
            'a'..='z' | '0'..='9' => slug.push(ch),
            ' ' | '-' | '\t' | '\n' => {
                if !slug.is_empty() && !slug.ends_with('-') {
                    slug.push('-');
                }
            }
            _ => {}
        }
    }
    slug.trim_end_matches('-').to_string()
}

pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

fn validate_category(
    name: Option<&str>,
    description: Option<&str>,
    slug: Option<&str>,
) -> AppResult<()> {
    let mut errors = FieldErrors::new();
    if let Some(name) = name {
        if name.trim().chars().count() < 2 {
            errors.insert(
                "name".into(),
                "Category name must be at least 2 characters long".into(),
            );
        }
    }
    if let Some(description) = description.filter(|d| !d.trim().is_empty()) {
        if description.trim().chars().count() < 10 {
            errors.insert(
                "description".into(),
                "Category description must be at least 10 characters long".into(),
            );
        }
    }
    if let Some(slug) = slug {
        if !is_valid_slug(slug) {
            errors.insert(
                "slug".into(),
                "Category slug can only contain lowercase letters, numbers, and hyphens".into(),
            );
        }
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(errors))
    }
}

pub async fn all_categories(state: &AppState) -> AppResult<Vec<Category>> {
    Ok(state
        .db
        .fetch_all("SELECT * FROM categories ORDER BY name ASC", &[])
        .await?)
}

pub async fn active_categories(state: &AppState) -> AppResult<Vec<Category>> {
    Ok(state
        .db
        .fetch_all(
            "SELECT * FROM categories WHERE status = 'active' ORDER BY name ASC",
            &[],
        )
        .await?)
}

pub async fn parent_categories(state: &AppState) -> AppResult<Vec<Category>> {
    Ok(state
        .db
        .fetch_all(
            "SELECT * FROM categories WHERE parent_id IS NULL ORDER BY name ASC",
            &[],
        )
        .await?)
}

pub async fn subcategories(state: &AppState, parent_id: Uuid) -> AppResult<Vec<Category>> {
    Ok(state
        .db
        .fetch_all(
            "SELECT * FROM categories WHERE parent_id = ? ORDER BY name ASC",
            &[json!(parent_id)],
        )
        .await?)
}

async fn find_by_id(state: &AppState, id: Uuid) -> AppResult<Option<Category>> {
    Ok(state
        .db
        .fetch_optional("SELECT * FROM categories WHERE id = ?", &[json!(id)])
        .await?)
}

pub async fn get_category(state: &AppState, id: Uuid) -> AppResult<Category> {
    find_by_id(state, id).await?.ok_or(AppError::NotFound)
}

pub async fn find_by_slug(state: &AppState, slug: &str) -> AppResult<Option<Category>> {
    Ok(state
        .db
        .fetch_optional("SELECT * FROM categories WHERE slug = ?", &[json!(slug)])
        .await?)
}

pub async fn search_categories(state: &AppState, query: &str) -> AppResult<Vec<Category>> {
    let needle = query.trim().to_lowercase();
    Ok(all_categories(state)
        .await?
        .into_iter()
        .filter(|category| {
            category.name.to_lowercase().contains(&needle)
                || category
                    .description
                    .as_deref()
                    .is_some_and(|d| d.to_lowercase().contains(&needle))
                || category.slug.contains(&needle)
        })
        .collect())
}

pub async fn list_categories(state: &AppState, query: CategoryQuery) -> AppResult<Page<Category>> {
    let (page, per_page, _) = query.pagination().normalize();
    let categories = match query.q.as_deref().filter(|q| !q.trim().is_empty()) {
        Some(q) => search_categories(state, q).await?,
        None => all_categories(state).await?,
    };
    Ok(Page::from_vec(categories, page, per_page))
}

pub async fn create_category(
    state: &AppState,
    payload: CreateCategoryRequest,
) -> AppResult<Category> {
    let slug = payload
        .slug
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| generate_slug(&payload.name));
    validate_category(
        Some(&payload.name),
        payload.description.as_deref(),
        Some(&slug),
    )?;

    if find_by_slug(state, &slug).await?.is_some() {
        return Err(AppError::Conflict(
            "Category with this slug already exists".into(),
        ));
    }
    if let Some(parent_id) = payload.parent_id {
        check_parent(state, None, parent_id).await?;
    }

    let now = Utc::now();
    let category = Category {
        id: Uuid::new_v4(),
        name: payload.name.trim().to_string(),
        description: payload.description,
        slug,
        parent_id: payload.parent_id,
        status: payload.status.unwrap_or(CategoryStatus::Active),
        image: payload.image,
        product_count: payload.product_count,
        created_at: now,
        updated_at: now,
    };
    Ok(state.db.insert(Table::Categories, &category).await?)
}

pub async fn update_category(
    state: &AppState,
    id: Uuid,
    mut payload: UpdateCategoryRequest,
) -> AppResult<Category> {
    get_category(state, id).await?;

    if payload.slug.as_deref().is_none_or(|s| s.trim().is_empty()) {
        payload.slug = payload.name.as_deref().map(generate_slug);
    }
    validate_category(
        payload.name.as_deref(),
        payload.description.as_deref(),
        payload.slug.as_deref(),
    )?;

    if let Some(slug) = &payload.slug {
        if let Some(existing) = find_by_slug(state, slug).await? {
            if existing.id != id {
                return Err(AppError::Conflict(
                    "Category with this slug already exists".into(),
                ));
            }
        }
    }
    if let Some(parent_id) = payload.parent_id {
        check_parent(state, Some(id), parent_id).await?;
    }

    let patch = match serde_json::to_value(&payload).map_err(anyhow::Error::from)? {
        Value::Object(patch) => patch,
        _ => Map::new(),
    };
    write_patch(state, id, patch).await
}

/// Categories nest one level: the parent must exist and be top-level, and a
/// category that already has children cannot become a child.
async fn check_parent(state: &AppState, child: Option<Uuid>, parent_id: Uuid) -> AppResult<()> {
    if child == Some(parent_id) {
        return Err(AppError::validation(
            "parent_id",
            "Category cannot be its own parent",
        ));
    }
    let parent = find_by_id(state, parent_id)
        .await?
        .ok_or_else(|| AppError::validation("parent_id", "Parent category does not exist"))?;
    if parent.parent_id.is_some() {
        return Err(AppError::validation(
            "parent_id",
            "Parent category must be a top-level category",
        ));
    }
    if let Some(child) = child {
        if !subcategories(state, child).await?.is_empty() {
            return Err(AppError::validation(
                "parent_id",
                "Category with subcategories cannot become a subcategory",
            ));
        }
    }
    Ok(())
}

async fn write_patch(state: &AppState, id: Uuid, patch: Map<String, Value>) -> AppResult<Category> {
    state
        .db
        .update(Table::Categories, &id.to_string(), &patch)
        .await?
        .ok_or(AppError::NotFound)
}

/// Refuses while subcategories or products still reference the category.
pub async fn delete_category(state: &AppState, id: Uuid) -> AppResult<()> {
    let category = get_category(state, id).await?;
    if !subcategories(state, id).await?.is_empty() {
        return Err(AppError::Conflict(
            "Cannot delete category with subcategories".into(),
        ));
    }
    let in_use = product_service::all_products(state)
        .await?
        .iter()
        .any(|p| {
            p.category.eq_ignore_ascii_case(&category.slug)
                || p.category.eq_ignore_ascii_case(&category.name)
        });
    if in_use {
        return Err(AppError::Conflict(
            "Cannot delete category with products".into(),
        ));
    }
    state.db.delete(Table::Categories, &id.to_string()).await?;
    Ok(())
}

pub async fn toggle_status(state: &AppState, id: Uuid) -> AppResult<Category> {
    let category = get_category(state, id).await?;
    let status = match category.status {
        CategoryStatus::Active => CategoryStatus::Inactive,
        CategoryStatus::Inactive => CategoryStatus::Active,
    };
    let mut patch = Map::new();
    patch.insert("status".into(), json!(status));
    write_patch(state, id, patch).await
}

pub async fn update_product_count(state: &AppState, id: Uuid, count: i64) -> AppResult<Category> {
    if count < 0 {
        return Err(AppError::validation("count", "Count must not be negative"));
    }
    let mut patch = Map::new();
    patch.insert("product_count".into(), json!(count));
    write_patch(state, id, patch).await
}

pub async fn category_stats(state: &AppState) -> AppResult<CategoryStats> {
    let categories = all_categories(state).await?;
    let count = |pred: &dyn Fn(&Category) -> bool| categories.iter().filter(|c| pred(c)).count() as i64;

    Ok(CategoryStats {
        total: categories.len() as i64,
        active: count(&|c| c.status == CategoryStatus::Active),
        inactive: count(&|c| c.status == CategoryStatus::Inactive),
        with_products: count(&|c| c.product_count > 0),
        parent_categories: count(&|c| c.parent_id.is_none()),
        subcategories: count(&|c| c.parent_id.is_some()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugs_drop_symbols_and_collapse_separators() {
        assert_eq!(generate_slug("Home & Garden"), "home-garden");
        assert_eq!(generate_slug("  Sports  --  Outdoors "), "sports-outdoors");
        assert_eq!(generate_slug("Books"), "books");
        assert_eq!(generate_slug("100% Cotton!"), "100-cotton");
        assert_eq!(generate_slug("Đồ"), "");
    }

    #[test]
    fn slug_format() {
        assert!(is_valid_slug("home-garden"));
        assert!(!is_valid_slug("Home Garden"));
        assert!(!is_valid_slug(""));
    }

    #[test]
    fn validation_reports_each_field() {
        let err = validate_category(Some("A"), Some("short"), Some("Bad Slug")).unwrap_err();
        match err {
            AppError::Validation(fields) => {
                assert!(fields.contains_key("name"));
                assert!(fields.contains_key("description"));
                assert!(fields.contains_key("slug"));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(validate_category(Some("Books"), None, Some("books")).is_ok());
    }
}

use yapee_store::{
    config::AppConfig,
    dto::{
        auth::{LoginRequest, RegisterRequest},
        categories::{CreateCategoryRequest, UpdateCategoryRequest},
        products::CreateProductRequest,
    },
    error::AppError,
    middleware::auth::decode_token,
    models::{CategoryStatus, UserRole},
    query::QueryOptions,
    routes::params::{ProductQuery, ProductSortBy, SortOrder},
    services::{auth_service, category_service, product_service, seed_service},
    state::AppState,
};

fn state() -> AppState {
    AppState::in_memory(AppConfig::with_secrets("test-storage", "test-jwt"))
}

fn category(name: &str) -> CreateCategoryRequest {
    CreateCategoryRequest {
        name: name.into(),
        description: Some("Lamps, rugs and other home goods".into()),
        slug: None,
        parent_id: None,
        status: None,
        image: None,
        product_count: 0,
    }
}

#[tokio::test]
async fn category_slugs_are_unique_and_used_categories_stay() -> anyhow::Result<()> {
    let state = state();

    let home = category_service::create_category(&state, category("Home Decor")).await?;
    assert_eq!(home.slug, "home-decor");
    assert_eq!(home.status, CategoryStatus::Active);

    let duplicate = category_service::create_category(&state, category("Home  Decor!")).await;
    assert!(matches!(duplicate, Err(AppError::Conflict(_))));

    let mut child = category("Lighting");
    child.parent_id = Some(home.id);
    let lighting = category_service::create_category(&state, child).await?;

    let blocked = category_service::delete_category(&state, home.id).await;
    assert!(matches!(blocked, Err(AppError::Conflict(_))));

    product_service::create_product(
        &state,
        CreateProductRequest {
            name: "Paper Lantern".into(),
            name_translations: Default::default(),
            description: "Soft warm light".into(),
            description_translations: Default::default(),
            price: 2_500,
            original_price: None,
            category: "lighting".into(),
            images: vec![],
            colors: vec![],
            sizes: vec![],
            stock: 4,
            features: vec![],
            specifications: Default::default(),
            featured: false,
        },
    )
    .await?;
    let in_use = category_service::delete_category(&state, lighting.id).await;
    assert!(matches!(in_use, Err(AppError::Conflict(_))));

    let toggled = category_service::toggle_status(&state, home.id).await?;
    assert_eq!(toggled.status, CategoryStatus::Inactive);
    assert!(category_service::active_categories(&state).await?.iter().all(|c| c.id != home.id));
    Ok(())
}

#[tokio::test]
async fn product_listing_filters_and_sorts() -> anyhow::Result<()> {
    let state = state();
    seed_service::seed_if_empty(&state).await?;

    let cheapest_first = product_service::list_products(
        &state,
        ProductQuery {
            sort_by: Some(ProductSortBy::Price),
            sort_order: Some(SortOrder::Asc),
            ..Default::default()
        },
    )
    .await?;
    assert_eq!(cheapest_first.total, 4);
    let prices: Vec<i64> = cheapest_first.items.iter().map(|p| p.price).collect();
    assert_eq!(prices, vec![15_900, 24_900, 29_900, 89_900]);

    let search = product_service::list_products(
        &state,
        ProductQuery {
            q: Some("WIRELESS".into()),
            ..Default::default()
        },
    )
    .await?;
    assert_eq!(search.total, 1);
    assert_eq!(search.items[0].name, "Premium Wireless Headphones");

    let band = product_service::list_products(
        &state,
        ProductQuery {
            min_price: Some(20_000),
            max_price: Some(30_000),
            per_page: Some(1),
            ..Default::default()
        },
    )
    .await?;
    assert_eq!(band.total, 2);
    assert_eq!(band.items.len(), 1);

    let featured = product_service::featured_products(&state).await?;
    assert_eq!(featured.len(), 3);
    Ok(())
}

#[tokio::test]
async fn repeated_selects_hit_the_cache_until_a_write() -> anyhow::Result<()> {
    let state = state();
    seed_service::seed_if_empty(&state).await?;
    state.db.clear_cache();

    let sql = "SELECT * FROM categories WHERE status = ?";
    let params = [serde_json::json!("active")];
    let first = state.db.query(sql, &params, QueryOptions::default()).await?;
    let second = state.db.query(sql, &params, QueryOptions::default()).await?;
    assert!(!first.from_cache);
    assert!(second.from_cache);
    assert_eq!(first.row_count, 4);

    category_service::create_category(&state, category("Garden Tools")).await?;
    let third = state.db.query(sql, &params, QueryOptions::default()).await?;
    assert!(!third.from_cache);
    assert_eq!(third.row_count, 5);
    assert!(state.db.stats().cache_hits >= 1);
    Ok(())
}

#[tokio::test]
async fn register_then_login_issues_a_customer_token() -> anyhow::Result<()> {
    let state = state();

    let user = auth_service::register(
        &state,
        RegisterRequest {
            email: "Mai@Example.com".into(),
            password: "secret123".into(),
            first_name: "Mai".into(),
            last_name: "Tran".into(),
            phone: None,
        },
    )
    .await?;
    assert_eq!(user.email, "mai@example.com");
    assert_eq!(user.role, UserRole::Customer);

    let again = auth_service::register(
        &state,
        RegisterRequest {
            email: "mai@example.com".into(),
            password: "secret123".into(),
            first_name: "Mai".into(),
            last_name: "Tran".into(),
            phone: None,
        },
    )
    .await;
    assert!(matches!(again, Err(AppError::Conflict(_))));

    let wrong = auth_service::login(
        &state,
        LoginRequest {
            email: "mai@example.com".into(),
            password: "nope-nope".into(),
        },
    )
    .await;
    assert!(matches!(wrong, Err(AppError::BadRequest(_))));

    let login = auth_service::login(
        &state,
        LoginRequest {
            email: "mai@example.com".into(),
            password: "secret123".into(),
        },
    )
    .await?;
    assert!(login.user.last_login_at.is_some());

    let claims = decode_token(&login.token, "test-jwt")?;
    assert_eq!(claims.user_id, user.id);
    assert_eq!(claims.role, UserRole::Customer);
    Ok(())
}

#[tokio::test]
async fn categories_nest_only_one_level() -> anyhow::Result<()> {
    let state = state();
    let parent_field = |result: Result<_, AppError>| match result {
        Err(AppError::Validation(fields)) => fields.contains_key("parent_id"),
        _ => false,
    };

    let home = category_service::create_category(&state, category("Home Decor")).await?;
    let mut child = category("Lighting");
    child.parent_id = Some(home.id);
    let lighting = category_service::create_category(&state, child).await?;

    let mut grandchild = category("Desk Lamps");
    grandchild.parent_id = Some(lighting.id);
    assert!(parent_field(
        category_service::create_category(&state, grandchild).await.map(|_| ())
    ));

    let mut dangling = category("Rugs");
    dangling.parent_id = Some(uuid::Uuid::new_v4());
    assert!(parent_field(
        category_service::create_category(&state, dangling).await.map(|_| ())
    ));

    let cycle = category_service::update_category(
        &state,
        home.id,
        UpdateCategoryRequest {
            parent_id: Some(lighting.id),
            ..Default::default()
        },
    )
    .await
    .map(|_| ());
    assert!(parent_field(cycle));

    let outdoor = category_service::create_category(&state, category("Outdoor")).await?;
    let with_children = category_service::update_category(
        &state,
        home.id,
        UpdateCategoryRequest {
            parent_id: Some(outdoor.id),
            ..Default::default()
        },
    )
    .await
    .map(|_| ());
    assert!(parent_field(with_children));

    let moved = category_service::update_category(
        &state,
        lighting.id,
        UpdateCategoryRequest {
            parent_id: Some(outdoor.id),
            ..Default::default()
        },
    )
    .await?;
    assert_eq!(moved.parent_id, Some(outdoor.id));
    Ok(())
}

#[tokio::test]
async fn out_of_range_pages_are_empty() -> anyhow::Result<()> {
    let state = state();
    seed_service::seed_if_empty(&state).await?;

    let page = product_service::list_products(
        &state,
        ProductQuery {
            page: Some(i64::MAX),
            per_page: Some(100),
            ..Default::default()
        },
    )
    .await?;
    assert!(page.items.is_empty());
    assert_eq!(page.total, 4);
    Ok(())
}

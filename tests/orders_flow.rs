use yapee_store::{
    config::AppConfig,
    db::{create_orm_conn, run_migrations},
    dto::{orders::CheckoutRequest, products::CreateProductRequest},
    error::AppError,
    models::{OrderStatus, PaymentMethod, Product, ShippingAddress},
    services::{checkout_service, coupon_service, order_service, product_service, seed_service},
    state::AppState,
};

fn shipping() -> ShippingAddress {
    ShippingAddress {
        full_name: "Lan Pham".into(),
        address: "12 Trang Tien".into(),
        city: "Hanoi".into(),
        postal_code: "100000".into(),
        country: "VN".into(),
        phone: "+84 912 345 678".into(),
    }
}

fn checkout_request(coupon_code: Option<&str>) -> CheckoutRequest {
    CheckoutRequest {
        shipping_address: shipping(),
        payment_method: PaymentMethod::CashOnDelivery,
        notes: Some("Leave at the door".into()),
        coupon_code: coupon_code.map(str::to_string),
    }
}

async fn seeded_state() -> anyhow::Result<AppState> {
    let state = AppState::in_memory(AppConfig::with_secrets("test-storage", "test-jwt"));
    let report = seed_service::seed_if_empty(&state).await?;
    assert_eq!(report.products, 4);
    assert!(report.admin_created);
    Ok(state)
}

async fn headphones(state: &AppState) -> anyhow::Result<Product> {
    let products = product_service::all_products(state).await?;
    Ok(products
        .into_iter()
        .find(|p| p.name == "Premium Wireless Headphones")
        .expect("seeded headphones"))
}

// Cart -> checkout with coupon -> cancel, all against in-memory tables.
#[tokio::test]
async fn checkout_applies_coupon_and_cancel_restores_stock() -> anyhow::Result<()> {
    let state = seeded_state().await?;
    let product = headphones(&state).await?;
    let starting_stock = product.stock;

    state.carts.update("guest-1", |cart| {
        cart.add_item(product.clone(), 1, Some("Black".into()), None);
        cart.add_item(product.clone(), 1, Some("Black".into()), None);
    })?;
    assert_eq!(state.carts.load("guest-1")?.items.len(), 1);

    let order =
        checkout_service::checkout(&state, "guest-1", None, checkout_request(Some("welcome10")))
            .await?;
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.items[0].quantity, 2);
    assert_eq!(order.subtotal(), 59_800);
    assert_eq!(order.discount_amount, 5_980);
    assert_eq!(order.total_amount, 53_820);
    assert_eq!(order.coupon_code.as_deref(), Some("WELCOME10"));

    assert!(state.carts.load("guest-1")?.is_empty());
    let after_checkout = product_service::get_product(&state, product.id).await?;
    assert_eq!(after_checkout.stock, starting_stock - 2);

    let coupon = coupon_service::find_by_code(&state, "WELCOME10")
        .await?
        .expect("seeded coupon");
    assert_eq!(coupon.used_count, 1);

    let tracked = order_service::get_order_by_number(&state, &order.order_number).await?;
    assert_eq!(tracked.id, order.id);

    let cancelled =
        order_service::cancel_order(&state, order.id, Some("Changed my mind".into())).await?;
    assert_eq!(cancelled.status, OrderStatus::Cancelled);
    let restored = product_service::get_product(&state, product.id).await?;
    assert_eq!(restored.stock, starting_stock);

    let again = order_service::cancel_order(&state, order.id, None).await;
    assert!(matches!(again, Err(AppError::Conflict(_))));
    Ok(())
}

#[tokio::test]
async fn checkout_rejects_empty_cart_and_bad_forms() -> anyhow::Result<()> {
    let state = seeded_state().await?;

    let empty = checkout_service::checkout(&state, "nobody", None, checkout_request(None)).await;
    assert!(matches!(empty, Err(AppError::BadRequest(_))));

    let product = headphones(&state).await?;
    state.carts.update("guest-2", |cart| {
        cart.add_item(product.clone(), 1, None, None);
    })?;

    let mut request = checkout_request(None);
    request.shipping_address.city.clear();
    match checkout_service::checkout(&state, "guest-2", None, request).await {
        Err(AppError::Validation(fields)) => assert!(fields.contains_key("city")),
        other => panic!("expected validation error, got {other:?}"),
    }

    let keyboard = product_service::all_products(&state)
        .await?
        .into_iter()
        .find(|p| p.name == "Gaming Mechanical Keyboard")
        .expect("seeded keyboard");
    state.carts.update("guest-3", |cart| {
        cart.add_item(keyboard.clone(), 1, None, None);
    })?;
    let fixed =
        checkout_service::checkout(&state, "guest-3", None, checkout_request(Some("FREESHIP")))
            .await?;
    assert_eq!(fixed.discount_amount, 1_500);
    assert_eq!(fixed.total_amount, 14_400);

    state.carts.update("guest-4", |cart| {
        cart.add_item(product.clone(), 1_000, None, None);
    })?;
    let oversold = checkout_service::checkout(&state, "guest-4", None, checkout_request(None)).await;
    assert!(matches!(oversold, Err(AppError::BadRequest(_))));
    assert_eq!(state.carts.load("guest-4")?.items.len(), 1);
    Ok(())
}

// Same flow against the Postgres records table.
#[tokio::test]
async fn checkout_flow_on_postgres() -> anyhow::Result<()> {
    // Allow skipping when no DB is configured in the environment.
    let database_url = match std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!(
                "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests."
            );
            return Ok(());
        }
    };

    let mut config = AppConfig::with_secrets("test-storage", "test-jwt");
    config.database_url = Some(database_url);
    let state = AppState::from_config(config).await?;
    let pool = state.pool.as_ref().expect("postgres pool");
    run_migrations(&create_orm_conn(pool), "./migrations").await?;

    let product = product_service::create_product(
        &state,
        CreateProductRequest {
            name: "Test Widget".into(),
            name_translations: Default::default(),
            description: "A product for testing".into(),
            description_translations: Default::default(),
            price: 1_000,
            original_price: None,
            category: "Testing".into(),
            images: vec![],
            colors: vec![],
            sizes: vec![],
            stock: 10,
            features: vec![],
            specifications: Default::default(),
            featured: false,
        },
    )
    .await?;

    let cart_id = format!("pg-{}", product.id);
    state.carts.update(&cart_id, |cart| {
        cart.add_item(product.clone(), 3, None, None);
    })?;
    let order = checkout_service::checkout(&state, &cart_id, None, checkout_request(None)).await?;
    assert_eq!(order.total_amount, 3_000);
    assert_eq!(product_service::get_product(&state, product.id).await?.stock, 7);

    order_service::cancel_order(&state, order.id, None).await?;
    assert_eq!(product_service::get_product(&state, product.id).await?.stock, 10);

    product_service::delete_product(&state, product.id).await?;
    Ok(())
}

#[tokio::test]
async fn variant_lines_of_one_product_share_its_stock() -> anyhow::Result<()> {
    let state = seeded_state().await?;
    let watch = product_service::all_products(&state)
        .await?
        .into_iter()
        .find(|p| p.name == "Smart Fitness Watch")
        .expect("seeded watch");
    let watch = product_service::update_stock(&state, watch.id, watch.stock - 3).await?;
    assert_eq!(watch.stock, 3);

    state.carts.update("variants", |cart| {
        cart.add_item(watch.clone(), 2, Some("Black".into()), Some("38mm".into()));
        cart.add_item(watch.clone(), 2, Some("Silver".into()), Some("38mm".into()));
    })?;
    assert_eq!(state.carts.load("variants")?.items.len(), 2);

    let oversold = checkout_service::checkout(&state, "variants", None, checkout_request(None)).await;
    assert!(matches!(oversold, Err(AppError::BadRequest(_))));
    assert_eq!(product_service::get_product(&state, watch.id).await?.stock, 3);
    assert_eq!(state.carts.load("variants")?.items.len(), 2);

    state.carts.update("variants", |cart| {
        let line = cart.items[1].id.clone();
        cart.update_quantity(&line, 1);
    })?;
    let order = checkout_service::checkout(&state, "variants", None, checkout_request(None)).await?;
    assert_eq!(order.items.iter().map(|i| i.quantity).sum::<i32>(), 3);
    assert_eq!(product_service::get_product(&state, watch.id).await?.stock, 0);
    Ok(())
}

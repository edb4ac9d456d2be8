use axum::{
    Json,
    extract::{Path, State},
};
use yapee_store::{
    config::AppConfig,
    dto::cart::{AddToCartRequest, UpdateCartItemRequest},
    error::AppError,
    middleware::cart_session::CartSession,
    models::Product,
    routes::cart::{
        ApplyCouponRequest, add_to_cart, clear_cart, get_cart, quote_coupon, remove_from_cart,
        update_cart_item,
    },
    services::{product_service, seed_service},
    state::AppState,
};

async fn setup() -> anyhow::Result<(AppState, Product)> {
    let state = AppState::in_memory(AppConfig::with_secrets("test-storage", "test-jwt"));
    seed_service::seed_if_empty(&state).await?;
    let watch = product_service::all_products(&state)
        .await?
        .into_iter()
        .find(|p| p.name == "Smart Fitness Watch")
        .expect("seeded watch");
    Ok((state, watch))
}

fn add(product: &Product, quantity: i32, color: &str, size: &str) -> Json<AddToCartRequest> {
    Json(AddToCartRequest {
        product_id: product.id,
        quantity,
        selected_color: Some(color.into()),
        selected_size: Some(size.into()),
    })
}

fn session(id: &str) -> CartSession {
    CartSession(id.to_string())
}

#[tokio::test]
async fn same_variant_merges_and_other_variant_adds_a_line() -> anyhow::Result<()> {
    let (state, watch) = setup().await?;

    add_to_cart(State(state.clone()), session("c1"), add(&watch, 1, "Black", "42mm")).await?;
    add_to_cart(State(state.clone()), session("c1"), add(&watch, 2, "Black", "42mm")).await?;
    let view = add_to_cart(State(state.clone()), session("c1"), add(&watch, 1, "Silver", "42mm"))
        .await?
        .0
        .data
        .expect("cart view");

    assert_eq!(view.items.len(), 2);
    assert_eq!(view.items[0].quantity, 3);
    assert_eq!(view.item_count, 4);
    assert_eq!(view.total, 4 * 24_900);
    assert_ne!(view.items[0].id, view.items[1].id);

    let other = get_cart(State(state.clone()), session("c2")).await?.0.data.expect("cart view");
    assert!(other.items.is_empty());
    Ok(())
}

#[tokio::test]
async fn quantity_updates_and_removal() -> anyhow::Result<()> {
    let (state, watch) = setup().await?;
    let view = add_to_cart(State(state.clone()), session("c1"), add(&watch, 2, "Black", "38mm"))
        .await?
        .0
        .data
        .expect("cart view");
    let line_id = view.items[0].id.clone();

    let updated = update_cart_item(
        State(state.clone()),
        session("c1"),
        Path(line_id.clone()),
        Json(UpdateCartItemRequest { quantity: 5 }),
    )
    .await?
    .0
    .data
    .expect("cart view");
    assert_eq!(updated.item_count, 5);

    let emptied = update_cart_item(
        State(state.clone()),
        session("c1"),
        Path(line_id.clone()),
        Json(UpdateCartItemRequest { quantity: 0 }),
    )
    .await?
    .0
    .data
    .expect("cart view");
    assert!(emptied.items.is_empty());

    let missing = remove_from_cart(State(state.clone()), session("c1"), Path(line_id)).await;
    assert!(matches!(missing, Err(AppError::NotFound)));
    Ok(())
}

#[tokio::test]
async fn invalid_adds_are_rejected() -> anyhow::Result<()> {
    let (state, watch) = setup().await?;

    let zero = add_to_cart(State(state.clone()), session("c1"), add(&watch, 0, "Black", "42mm")).await;
    assert!(matches!(zero, Err(AppError::BadRequest(_))));

    let color = add_to_cart(State(state.clone()), session("c1"), add(&watch, 1, "Purple", "42mm")).await;
    match color {
        Err(AppError::Validation(fields)) => assert!(fields.contains_key("selected_color")),
        other => panic!("expected validation error, got {:?}", other.map(|_| ())),
    }

    let mut unknown = add(&watch, 1, "Black", "42mm");
    unknown.product_id = uuid::Uuid::new_v4();
    let missing = add_to_cart(State(state.clone()), session("c1"), unknown).await;
    assert!(matches!(missing, Err(AppError::BadRequest(_))));

    product_service::update_stock(&state, watch.id, watch.stock).await?;
    let sold_out = add_to_cart(State(state.clone()), session("c1"), add(&watch, 1, "Black", "42mm")).await;
    assert!(matches!(sold_out, Err(AppError::BadRequest(_))));
    Ok(())
}

#[tokio::test]
async fn coupon_quote_and_clear() -> anyhow::Result<()> {
    let (state, watch) = setup().await?;
    add_to_cart(State(state.clone()), session("c1"), add(&watch, 2, "Black", "42mm")).await?;

    let quote = quote_coupon(
        State(state.clone()),
        session("c1"),
        Json(ApplyCouponRequest { code: "welcome10".into() }),
    )
    .await?
    .0
    .data
    .expect("quote");
    assert_eq!(quote.subtotal, 49_800);
    assert_eq!(quote.discount, 4_980);
    assert_eq!(quote.total, 44_820);

    let unknown = quote_coupon(
        State(state.clone()),
        session("c1"),
        Json(ApplyCouponRequest { code: "NOPE".into() }),
    )
    .await;
    assert!(matches!(unknown, Err(AppError::Validation(_))));

    clear_cart(State(state.clone()), session("c1")).await?;
    assert!(state.carts.load("c1")?.is_empty());
    Ok(())
}

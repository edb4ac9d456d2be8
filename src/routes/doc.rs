use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    cart::Cart,
    dto::{
        cart::{AddToCartRequest, CartView, UpdateCartItemRequest},
        categories::{CategoryList, CategoryStats},
        dashboard::DashboardOverview,
        orders::{CheckoutRequest, OrderList, OrderStats, OrderTracking},
        products::{ProductList, ProductStats},
        users::{UserList, UserStats},
    },
    models::{
        Address, CartItem, Category, Coupon, Order, OrderStatus, PaymentMethod, PaymentStatus,
        Product, ShippingAddress, User, UserRole, WishlistEntry,
    },
    response::{ApiResponse, Meta},
    routes::{
        account, admin, auth, cart, categories, health, orders, params, products, wishlist,
    },
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::register,
        auth::login,
        auth::me,
        account::update_profile,
        account::change_password,
        account::add_address,
        account::update_address,
        account::remove_address,
        products::list_products,
        products::featured_products,
        products::get_product,
        categories::list_active_categories,
        categories::get_category_by_slug,
        categories::category_products,
        cart::get_cart,
        cart::add_to_cart,
        cart::update_cart_item,
        cart::remove_from_cart,
        cart::clear_cart,
        cart::quote_coupon,
        orders::list_order,
        orders::checkout,
        orders::track_order,
        orders::get_order,
        orders::cancel_order,
        wishlist::list_wishlist,
        wishlist::add_to_wishlist,
        wishlist::remove_from_wishlist,
        admin::orders::list_all_orders,
        admin::orders::order_stats,
        admin::orders::revenue_report,
        admin::orders::get_order_admin,
        admin::orders::update_order_status,
        admin::orders::update_payment_status,
        admin::orders::cancel_order_admin,
        admin::catalog::create_product,
        admin::catalog::update_product,
        admin::catalog::delete_product,
        admin::catalog::update_stock,
        admin::catalog::restock,
        admin::catalog::product_stats,
        admin::catalog::list_low_stock,
        admin::catalog::adjust_inventory,
        admin::catalog::list_categories,
        admin::catalog::category_stats,
        admin::catalog::get_category,
        admin::catalog::list_subcategories,
        admin::catalog::create_category,
        admin::catalog::update_category,
        admin::catalog::delete_category,
        admin::catalog::toggle_category,
        admin::catalog::update_product_count,
        admin::customers::list_users,
        admin::customers::user_stats,
        admin::customers::recent_users,
        admin::customers::get_user,
        admin::customers::user_orders,
        admin::customers::deactivate_user,
        admin::customers::activate_user,
        admin::customers::verify_email,
        admin::customers::update_role,
        admin::marketing::list_coupons,
        admin::marketing::get_coupon,
        admin::marketing::create_coupon,
        admin::marketing::update_coupon,
        admin::marketing::delete_coupon,
        admin::marketing::validate_coupon,
        admin::system::dashboard,
        admin::system::storage_stats,
        admin::system::cleanup_storage,
        admin::system::backup_storage,
        admin::system::restore_storage,
        admin::system::database_stats,
        admin::system::database_health,
        admin::system::table_counts,
        admin::system::clear_query_cache,
        admin::system::audit_entries,
        admin::system::seed
    ),
    components(
        schemas(
            User,
            UserRole,
            Address,
            Product,
            Category,
            Cart,
            CartItem,
            Order,
            OrderStatus,
            PaymentStatus,
            PaymentMethod,
            ShippingAddress,
            Coupon,
            WishlistEntry,
            AddToCartRequest,
            UpdateCartItemRequest,
            CheckoutRequest,
            CartView,
            OrderList,
            OrderTracking,
            ProductList,
            CategoryList,
            UserList,
            ProductStats,
            OrderStats,
            CategoryStats,
            UserStats,
            DashboardOverview,
            params::Pagination,
            params::ProductQuery,
            params::OrderListQuery,
            params::CategoryQuery,
            params::UserListQuery,
            Meta,
            ApiResponse<Product>,
            ApiResponse<ProductList>,
            ApiResponse<Order>,
            ApiResponse<OrderList>,
            ApiResponse<CartView>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Authentication endpoints"),
        (name = "Account", description = "Profile, password and address book"),
        (name = "Products", description = "Product catalog"),
        (name = "Categories", description = "Storefront categories"),
        (name = "Cart", description = "Cart addressed by the x-cart-id header"),
        (name = "Orders", description = "Checkout and order history"),
        (name = "Wishlist", description = "Saved products"),
        (name = "Admin", description = "Back-office endpoints"),
        (name = "System", description = "Storage and database maintenance"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}

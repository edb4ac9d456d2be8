use std::collections::BTreeMap;

use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{Category, CategoryStatus, Coupon, CouponKind, CouponStatus, Product, Translations},
    query::Table,
    services::user_service,
    state::AppState,
};

#[derive(Debug, Default, Serialize, ToSchema)]
pub struct SeedReport {
    pub categories: usize,
    pub products: usize,
    pub coupons: usize,
    pub admin_created: bool,
}

fn translations(en: &str, vi: &str, zh: &str) -> Translations {
    [("en", en), ("vi", vi), ("zh", zh)]
        .into_iter()
        .map(|(lang, text)| (lang.to_string(), text.to_string()))
        .collect()
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

struct ProductSeed<'a> {
    name: [&'a str; 3],
    description: [&'a str; 3],
    price: i64,
    original_price: Option<i64>,
    category: &'a str,
    image: &'a str,
    colors: &'a [&'a str],
    sizes: &'a [&'a str],
    rating: f64,
    reviews: i32,
    stock: i32,
    features: &'a [&'a str],
    specifications: &'a [(&'a str, &'a str)],
    featured: bool,
}

impl ProductSeed<'_> {
    fn build(self) -> Product {
        let now = Utc::now();
        let [name, name_vi, name_zh] = self.name;
        let [description, description_vi, description_zh] = self.description;
        Product {
            id: Uuid::new_v4(),
            name: name.to_string(),
            name_translations: translations(name, name_vi, name_zh),
            description: description.to_string(),
            description_translations: translations(description, description_vi, description_zh),
            price: self.price,
            original_price: self.original_price,
            category: self.category.to_string(),
            images: vec![self.image.to_string()],
            colors: strings(self.colors),
            sizes: strings(self.sizes),
            rating: self.rating,
            reviews: self.reviews,
            in_stock: self.stock > 0,
            stock: self.stock,
            features: strings(self.features),
            specifications: self
                .specifications
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<BTreeMap<_, _>>(),
            featured: self.featured,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Starter catalog shown on a fresh install.
pub fn default_products() -> Vec<Product> {
    vec![
        ProductSeed {
            name: ["Premium Wireless Headphones", "Tai Nghe Không Dây Cao Cấp", "高级无线耳机"],
            description: [
                "Experience crystal-clear audio with our premium wireless headphones featuring active noise cancellation.",
                "Trải nghiệm âm thanh trong trẻo với tai nghe không dây cao cấp có khử tiếng ồn chủ động.",
                "体验我们配备主动降噪功能的高级无线耳机带来的清晰音质。",
            ],
            price: 29_900,
            original_price: Some(39_900),
            category: "Electronics",
            image: "https://images.pexels.com/photos/3394650/pexels-photo-3394650.jpeg?auto=compress&cs=tinysrgb&w=800",
            colors: &["Black", "White", "Blue"],
            sizes: &["One Size"],
            rating: 4.8,
            reviews: 156,
            stock: 25,
            features: &[
                "Active Noise Cancellation",
                "30-hour battery life",
                "Premium leather cushions",
                "Bluetooth 5.0 connectivity",
            ],
            specifications: &[
                ("Driver Size", "40mm"),
                ("Frequency Response", "20Hz - 20kHz"),
                ("Impedance", "32Ω"),
                ("Weight", "280g"),
                ("Connectivity", "Bluetooth 5.0, 3.5mm jack"),
            ],
            featured: true,
        }
        .build(),
        ProductSeed {
            name: ["Smart Fitness Watch", "Đồng Hồ Thể Dục Thông Minh", "智能健身手表"],
            description: [
                "Advanced fitness tracking with heart rate monitoring and GPS.",
                "Theo dõi thể dục tiên tiến với giám sát nhịp tim và GPS.",
                "先进的健身追踪，具有心率监测和GPS功能。",
            ],
            price: 24_900,
            original_price: None,
            category: "Wearables",
            image: "https://images.pexels.com/photos/393047/pexels-photo-393047.jpeg?auto=compress&cs=tinysrgb&w=800",
            colors: &["Black", "Silver", "Rose Gold"],
            sizes: &["38mm", "42mm"],
            rating: 4.6,
            reviews: 89,
            stock: 40,
            features: &[
                "Heart rate monitoring",
                "Built-in GPS",
                "Water resistant",
                "7-day battery life",
            ],
            specifications: &[
                ("Display", "1.4\" AMOLED"),
                ("Battery", "7 days"),
                ("Water Resistance", "5ATM"),
            ],
            featured: true,
        }
        .build(),
        ProductSeed {
            name: ["Professional Camera Lens", "Ống Kính Máy Ảnh Chuyên Nghiệp", "专业相机镜头"],
            description: [
                "High-performance telephoto lens for professional photography.",
                "Ống kính tele hiệu suất cao cho nhiếp ảnh chuyên nghiệp.",
                "专业摄影用高性能长焦镜头。",
            ],
            price: 89_900,
            original_price: None,
            category: "Photography",
            image: "https://images.pexels.com/photos/90946/pexels-photo-90946.jpeg?auto=compress&cs=tinysrgb&w=800",
            colors: &["Black"],
            sizes: &["70-200mm"],
            rating: 4.9,
            reviews: 67,
            stock: 8,
            features: &[
                "Image stabilization",
                "Weather sealed",
                "Ultra-low dispersion glass",
            ],
            specifications: &[
                ("Focal Length", "70-200mm"),
                ("Aperture", "f/2.8"),
                ("Weight", "1.48kg"),
            ],
            featured: false,
        }
        .build(),
        ProductSeed {
            name: ["Gaming Mechanical Keyboard", "Bàn Phím Cơ Gaming", "游戏机械键盘"],
            description: [
                "RGB mechanical keyboard with custom switches for gaming.",
                "Bàn phím cơ RGB với switch tùy chỉnh cho gaming.",
                "带有自定义轴体的RGB机械键盘，专为游戏设计。",
            ],
            price: 15_900,
            original_price: None,
            category: "Gaming",
            image: "https://images.pexels.com/photos/2115256/pexels-photo-2115256.jpeg?auto=compress&cs=tinysrgb&w=800",
            colors: &["Black", "White"],
            sizes: &["Full Size", "Compact"],
            rating: 4.7,
            reviews: 203,
            stock: 60,
            features: &[
                "Per-key RGB lighting",
                "Hot-swappable switches",
                "Aluminum frame",
            ],
            specifications: &[
                ("Switch Type", "Mechanical"),
                ("Connection", "USB-C"),
                ("Layout", "ANSI"),
            ],
            featured: true,
        }
        .build(),
    ]
}

pub fn default_categories() -> Vec<Category> {
    let now = Utc::now();
    [
        ("Electronics", "Electronic devices and gadgets", "electronics", CategoryStatus::Active, 15),
        ("Clothing", "Fashion and apparel", "clothing", CategoryStatus::Active, 25),
        ("Home & Garden", "Home improvement and garden supplies", "home-garden", CategoryStatus::Active, 12),
        ("Sports & Outdoors", "Sports equipment and outdoor gear", "sports-outdoors", CategoryStatus::Active, 8),
        ("Books", "Books and educational materials", "books", CategoryStatus::Inactive, 0),
    ]
    .into_iter()
    .map(|(name, description, slug, status, product_count)| Category {
        id: Uuid::new_v4(),
        name: name.to_string(),
        description: Some(description.to_string()),
        slug: slug.to_string(),
        parent_id: None,
        status,
        image: None,
        product_count,
        created_at: now,
        updated_at: now,
    })
    .collect()
}

pub fn default_coupons() -> Vec<Coupon> {
    let now = Utc::now();
    [
        ("WELCOME10", CouponKind::Percentage, 10, 5_000, Some(100)),
        ("FREESHIP", CouponKind::Fixed, 1_500, 10_000, Some(500)),
    ]
    .into_iter()
    .map(|(code, kind, value, min_order, max_uses)| Coupon {
        id: Uuid::new_v4(),
        code: code.to_string(),
        kind,
        value,
        min_order,
        max_uses,
        used_count: 0,
        starts_at: None,
        ends_at: None,
        status: CouponStatus::Active,
        created_at: now,
        updated_at: now,
    })
    .collect()
}

async fn seed_table<T: Serialize + serde::de::DeserializeOwned>(
    state: &AppState,
    table: Table,
    rows: Vec<T>,
) -> AppResult<usize> {
    if state.db.table_stats(table).await? > 0 {
        return Ok(0);
    }
    let count = rows.len();
    for row in rows {
        state.db.insert(table, &row).await?;
    }
    tracing::info!(%table, count, "seeded table");
    Ok(count)
}

/// Fills empty catalog tables with starter data and makes sure an admin exists.
pub async fn seed_if_empty(state: &AppState) -> AppResult<SeedReport> {
    Ok(SeedReport {
        categories: seed_table(state, Table::Categories, default_categories()).await?,
        products: seed_table(state, Table::Products, default_products()).await?,
        coupons: seed_table(state, Table::Coupons, default_coupons()).await?,
        admin_created: user_service::ensure_default_admin(state).await?,
    })
}

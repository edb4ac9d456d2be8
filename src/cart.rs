//! Shopping cart lines and their persistence.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    models::{CartItem, Product},
    storage::{LocalStorage, StorageError, now_millis},
};

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct Cart {
    pub items: Vec<CartItem>,
}

impl Cart {
    /// Adds `quantity` of a product, merging into the line with the same
    /// product, color and size.
    ///
    /// Returns `None` and leaves the cart untouched when `quantity` is zero or
    /// negative. Callers that take quantities from users validate them first;
    /// the cart route rejects them with a bad request.
    pub fn add_item(
        &mut self,
        product: Product,
        quantity: i32,
        selected_color: Option<String>,
        selected_size: Option<String>,
    ) -> Option<&CartItem> {
        if quantity <= 0 {
            return None;
        }

        let position = self.items.iter().position(|item| {
            item.product.id == product.id
                && item.selected_color == selected_color
                && item.selected_size == selected_size
        });

        let index = match position {
            Some(index) => {
                let line = &mut self.items[index];
                line.quantity = line.quantity.saturating_add(quantity);
                index
            }
            None => {
                let id = self.next_line_id(&product);
                self.items.push(CartItem {
                    id,
                    product,
                    quantity,
                    selected_color,
                    selected_size,
                });
                self.items.len() - 1
            }
        };
        self.items.get(index)
    }

    /// `{product_id}-{millis}`, bumped until unique within the cart.
    fn next_line_id(&self, product: &Product) -> String {
        let mut stamp = now_millis();
        loop {
            let id = format!("{}-{stamp}", product.id);
            if !self.items.iter().any(|item| item.id == id) {
                return id;
            }
            stamp += 1;
        }
    }

    pub fn remove_item(&mut self, item_id: &str) -> bool {
        let before = self.items.len();
        self.items.retain(|item| item.id != item_id);
        self.items.len() != before
    }

    /// Sets a line's quantity; zero or less removes the line.
    pub fn update_quantity(&mut self, item_id: &str, quantity: i32) -> bool {
        if quantity <= 0 {
            return self.remove_item(item_id);
        }
        match self.items.iter_mut().find(|item| item.id == item_id) {
            Some(item) => {
                item.quantity = quantity;
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn total(&self) -> i64 {
        self.items.iter().map(CartItem::line_total).sum()
    }

    pub fn item_count(&self) -> i64 {
        self.items.iter().map(|item| i64::from(item.quantity)).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Carts persisted in local storage under `cart:{cart_id}`.
#[derive(Clone)]
pub struct CartStore {
    storage: LocalStorage,
}

impl CartStore {
    pub fn new(storage: LocalStorage) -> Self {
        Self { storage }
    }

    fn key(cart_id: &str) -> String {
        format!("cart:{cart_id}")
    }

    pub fn load(&self, cart_id: &str) -> Result<Cart, StorageError> {
        Ok(self
            .storage
            .get_item::<Cart>(&Self::key(cart_id))?
            .unwrap_or_default())
    }

    pub fn save(&self, cart_id: &str, cart: &Cart) -> Result<(), StorageError> {
        self.storage.set_item(&Self::key(cart_id), cart)
    }

    pub fn clear(&self, cart_id: &str) -> Result<(), StorageError> {
        self.storage.remove_item(&Self::key(cart_id))
    }

    /// Loads, mutates and saves in one step.
    pub fn update<R>(
        &self,
        cart_id: &str,
        mutate: impl FnOnce(&mut Cart) -> R,
    ) -> Result<(Cart, R), StorageError> {
        let mut cart = self.load(cart_id)?;
        let outcome = mutate(&mut cart);
        self.save(cart_id, &cart)?;
        Ok((cart, outcome))
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use proptest::prelude::*;
    use uuid::Uuid;

    use super::*;
    use crate::storage::{Cipher, MemoryBackend};

    fn product(price: i64) -> Product {
        let now = Utc::now();
        Product {
            id: Uuid::new_v4(),
            name: "Linen Shirt".into(),
            name_translations: Default::default(),
            description: String::new(),
            description_translations: Default::default(),
            price,
            original_price: None,
            category: "shirts".into(),
            images: vec![],
            colors: vec!["white".into(), "black".into()],
            sizes: vec!["M".into(), "L".into()],
            rating: 0.0,
            reviews: 0,
            in_stock: true,
            stock: 10,
            features: vec![],
            specifications: Default::default(),
            featured: false,
            created_at: now,
            updated_at: now,
        }
    }

    fn white_m() -> (Option<String>, Option<String>) {
        (Some("white".into()), Some("M".into()))
    }

    #[test]
    fn same_variant_merges_into_one_line() {
        let shirt = product(1_000);
        let mut cart = Cart::default();
        let (color, size) = white_m();
        cart.add_item(shirt.clone(), 1, color.clone(), size.clone());
        cart.add_item(shirt, 2, color, size);

        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.items[0].quantity, 3);
        assert_eq!(cart.total(), 3_000);
        assert_eq!(cart.item_count(), 3);
    }

    #[test]
    fn different_variants_get_their_own_lines() {
        let shirt = product(1_000);
        let mut cart = Cart::default();
        cart.add_item(shirt.clone(), 1, Some("white".into()), Some("M".into()));
        cart.add_item(shirt.clone(), 1, Some("black".into()), Some("M".into()));
        cart.add_item(shirt, 1, Some("white".into()), Some("L".into()));

        assert_eq!(cart.items.len(), 3);
        let mut ids: Vec<_> = cart.items.iter().map(|item| item.id.clone()).collect();
        ids.dedup();
        assert_eq!(ids.len(), 3);
    }

    #[test]
    fn non_positive_quantity_removes_the_line() {
        let mut cart = Cart::default();
        let (color, size) = white_m();
        let first = cart.add_item(product(500), 2, color.clone(), size.clone()).unwrap().id.clone();
        let second = cart.add_item(product(700), 1, color, size).unwrap().id.clone();

        assert!(cart.update_quantity(&first, 0));
        assert!(cart.update_quantity(&second, -1));
        assert!(cart.is_empty());
        assert_eq!(cart.total(), 0);
    }

    #[test]
    fn zero_quantity_add_is_ignored() {
        let mut cart = Cart::default();
        assert!(cart.add_item(product(500), 0, None, None).is_none());
        assert!(cart.is_empty());
    }

    #[test]
    fn totals_follow_every_mutation() {
        let mut cart = Cart::default();
        let a = cart.add_item(product(250), 4, None, None).unwrap().id.clone();
        cart.add_item(product(1_000), 1, None, None);
        cart.update_quantity(&a, 2);
        assert_eq!(cart.total(), 1_500);
        assert_eq!(cart.item_count(), 3);
        cart.remove_item(&a);
        assert_eq!(cart.total(), 1_000);
        assert_eq!(cart.item_count(), 1);
    }

    const COLORS: [&str; 2] = ["white", "black"];
    const SIZES: [&str; 2] = ["M", "L"];

    #[derive(Debug, Clone)]
    enum Op {
        Add {
            product: usize,
            quantity: i32,
            color: Option<usize>,
            size: Option<usize>,
        },
        Update {
            line: usize,
            quantity: i32,
        },
        Remove {
            line: usize,
        },
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (
                0..3usize,
                -2..6i32,
                proptest::option::of(0..2usize),
                proptest::option::of(0..2usize),
            )
                .prop_map(|(product, quantity, color, size)| Op::Add {
                    product,
                    quantity,
                    color,
                    size,
                }),
            (0..6usize, -2..6i32).prop_map(|(line, quantity)| Op::Update { line, quantity }),
            (0..6usize).prop_map(|line| Op::Remove { line }),
        ]
    }

    type Line = ((usize, Option<usize>, Option<usize>), i32);

    proptest! {
        #[test]
        fn random_edits_keep_totals_consistent(ops in proptest::collection::vec(op(), 0..40)) {
            let products = [product(250), product(1_000), product(15_900)];
            let mut cart = Cart::default();
            let mut expected: Vec<Line> = Vec::new();

            for op in ops {
                match op {
                    Op::Add { product, quantity, color, size } => {
                        let added = cart.add_item(
                            products[product].clone(),
                            quantity,
                            color.map(|c| COLORS[c].to_string()),
                            size.map(|s| SIZES[s].to_string()),
                        );
                        prop_assert_eq!(added.is_some(), quantity > 0);
                        if quantity > 0 {
                            let key = (product, color, size);
                            match expected.iter_mut().find(|(k, _)| *k == key) {
                                Some((_, qty)) => *qty += quantity,
                                None => expected.push((key, quantity)),
                            }
                        }
                    }
                    Op::Update { line, quantity } => {
                        let id = cart.items.get(line).map_or("missing".to_string(), |item| item.id.clone());
                        prop_assert_eq!(cart.update_quantity(&id, quantity), line < expected.len());
                        if line < expected.len() {
                            if quantity <= 0 {
                                expected.remove(line);
                            } else {
                                expected[line].1 = quantity;
                            }
                        }
                    }
                    Op::Remove { line } => {
                        let id = cart.items.get(line).map_or("missing".to_string(), |item| item.id.clone());
                        prop_assert_eq!(cart.remove_item(&id), line < expected.len());
                        if line < expected.len() {
                            expected.remove(line);
                        }
                    }
                }

                prop_assert_eq!(cart.items.len(), expected.len());
                for (item, ((product, color, size), qty)) in cart.items.iter().zip(&expected) {
                    prop_assert_eq!(item.product.id, products[*product].id);
                    prop_assert_eq!(item.selected_color.as_deref(), color.map(|c| COLORS[c]));
                    prop_assert_eq!(item.selected_size.as_deref(), size.map(|s| SIZES[s]));
                    prop_assert_eq!(item.quantity, *qty);
                    prop_assert!(item.quantity > 0);
                }
                let total: i64 = expected
                    .iter()
                    .map(|((product, _, _), qty)| products[*product].price * i64::from(*qty))
                    .sum();
                let count: i64 = expected.iter().map(|(_, qty)| i64::from(*qty)).sum();
                prop_assert_eq!(cart.total(), total);
                prop_assert_eq!(cart.item_count(), count);
                prop_assert_eq!(cart.is_empty(), expected.is_empty());
            }
        }
    }

    #[test]
    fn store_keeps_carts_apart() {
        let storage = LocalStorage::new(MemoryBackend::new(), Cipher::new("test"));
        let store = CartStore::new(storage.clone());
        store
            .update("a", |cart| {
                cart.add_item(product(100), 1, None, None);
            })
            .unwrap();

        assert_eq!(store.load("a").unwrap().items.len(), 1);
        assert!(store.load("b").unwrap().is_empty());
        assert!(storage.has_item("cart:a").unwrap());

        store.clear("a").unwrap();
        assert!(store.load("a").unwrap().is_empty());
    }
}

//! Seeded in-memory stores for the demo deployment.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use super::Cart;
use super::CartItem;
use super::CartStore;
use super::InventoryStore;
use super::Order;
use super::OrderStore;
use super::PaymentMethod;
use super::PaymentType;
use super::Product;
use super::ProductStore;
use super::Review;
use super::ReviewStore;
use super::UserRecord;
use super::UserStore;
use super::Variant;
use crate::error::StoreError;

fn product(id: &str, title: &str, description: &str, variant_ids: &[&str]) -> Product {
    Product {
        id: id.to_string(),
        title: title.to_string(),
        description: Some(description.to_string()),
        media_url: Some(format!("https://images.storefront.dev/{id}.png")),
        variant_ids: variant_ids.iter().map(|v| v.to_string()).collect(),
    }
}

fn variant(
    id: &str,
    product_id: &str,
    size: Option<&str>,
    colorway: &str,
    price: f64,
    weight: f64,
) -> Variant {
    Variant {
        id: id.to_string(),
        product_id: product_id.to_string(),
        size: size.map(str::to_string),
        colorway: Some(colorway.to_string()),
        dimensions: None,
        price,
        weight: Some(weight),
    }
}

pub struct InMemoryProducts {
    products: Vec<Product>,
    variants: Vec<Variant>,
}

impl InMemoryProducts {
    pub fn seeded() -> Self {
        Self {
            products: vec![
                product(
                    "product:1",
                    "Lunar Trail Sneaker",
                    "Cushioned all-terrain runner",
                    &["variant:1", "variant:2", "variant:3"],
                ),
                product(
                    "product:2",
                    "Solstice Hoodie",
                    "Midweight fleece pullover",
                    &["variant:4", "variant:5"],
                ),
                product(
                    "product:3",
                    "Meridian Water Bottle",
                    "Insulated steel bottle",
                    &["variant:6"],
                ),
                product(
                    "product:4",
                    "Cascade Rain Jacket",
                    "Packable waterproof shell",
                    &["variant:7", "variant:8"],
                ),
                product(
                    "product:5",
                    "Atlas Backpack",
                    "30L commuter pack",
                    &["variant:9"],
                ),
            ],
            variants: vec![
                variant("variant:1", "product:1", Some("8"), "white", 600.25, 0.5),
                variant("variant:2", "product:1", Some("9"), "black", 600.25, 0.55),
                variant("variant:3", "product:1", Some("10"), "red", 650.0, 0.6),
                variant("variant:4", "product:2", Some("M"), "gray", 80.0, 0.4),
                variant("variant:5", "product:2", Some("L"), "navy", 80.0, 0.45),
                variant("variant:6", "product:3", None, "steel", 25.5, 0.3),
                variant("variant:7", "product:4", Some("M"), "yellow", 120.0, 0.7),
                variant("variant:8", "product:4", Some("L"), "yellow", 120.0, 0.75),
                variant("variant:9", "product:5", None, "olive", 140.0, 1.2),
            ],
        }
    }
}

#[async_trait]
impl ProductStore for InMemoryProducts {
    async fn product(&self, id: &str) -> Result<Option<Product>, StoreError> {
        Ok(self.products.iter().find(|p| p.id == id).cloned())
    }

    async fn variant(&self, id: &str) -> Result<Option<Variant>, StoreError> {
        Ok(self.variants.iter().find(|v| v.id == id).cloned())
    }

    async fn products(&self) -> Result<Vec<Product>, StoreError> {
        Ok(self.products.clone())
    }

    async fn variants(&self) -> Result<Vec<Variant>, StoreError> {
        Ok(self.variants.clone())
    }
}

pub struct InMemoryInventory {
    counts: HashMap<String, i64>,
}

impl InMemoryInventory {
    // variant:9 deliberately has no warehouse record
    pub fn seeded() -> Self {
        let counts = [
            ("variant:1", 12),
            ("variant:2", 3),
            ("variant:3", 0),
            ("variant:4", 25),
            ("variant:5", 11),
            ("variant:6", 40),
            ("variant:7", 0),
            ("variant:8", 6),
        ]
        .into_iter()
        .map(|(id, count)| (id.to_string(), count))
        .collect();
        Self { counts }
    }
}

#[async_trait]
impl InventoryStore for InMemoryInventory {
    async fn units_on_hand(&self, variant_id: &str) -> Result<Option<i64>, StoreError> {
        Ok(self.counts.get(variant_id).copied())
    }
}

fn review(id: &str, author: &str, body: &str, product_upc: &str, user_id: &str) -> Review {
    Review {
        id: id.to_string(),
        author: author.to_string(),
        body: body.to_string(),
        product_upc: product_upc.to_string(),
        user_id: user_id.to_string(),
    }
}

pub struct InMemoryReviews {
    reviews: Vec<Review>,
}

impl InMemoryReviews {
    pub fn seeded() -> Self {
        Self {
            reviews: vec![
                review(
                    "review:1",
                    "user1",
                    "Great sneakers, very comfortable on gravel.",
                    "product:1",
                    "user:1",
                ),
                review(
                    "review:2",
                    "user2",
                    "Runs half a size small.",
                    "product:1",
                    "user:2",
                ),
                review(
                    "review:3",
                    "user1",
                    "Warm without being bulky.",
                    "product:2",
                    "user:1",
                ),
                review(
                    "review:4",
                    "user3",
                    "Kept me dry through a week of rain.",
                    "product:4",
                    "user:3",
                ),
            ],
        }
    }
}

#[async_trait]
impl ReviewStore for InMemoryReviews {
    async fn review(&self, id: &str) -> Result<Option<Review>, StoreError> {
        Ok(self.reviews.iter().find(|r| r.id == id).cloned())
    }

    async fn reviews_for_product(&self, upc: &str) -> Result<Vec<Review>, StoreError> {
        Ok(self
            .reviews
            .iter()
            .filter(|r| r.product_upc == upc)
            .cloned()
            .collect())
    }
}

fn order(id: &str, buyer_id: &str, item_ids: &[&str]) -> Order {
    Order {
        id: id.to_string(),
        buyer_id: buyer_id.to_string(),
        item_ids: item_ids.iter().map(|v| v.to_string()).collect(),
    }
}

pub struct InMemoryOrders {
    orders: Vec<Order>,
}

impl InMemoryOrders {
    pub fn seeded() -> Self {
        Self {
            orders: vec![
                order("order:1", "user:1", &["variant:1", "variant:2"]),
                order("order:2", "user:1", &["variant:4"]),
                order("order:3", "user:2", &["variant:1"]),
                order("order:4", "user:3", &["variant:6"]),
                order("order:5", "user:3", &["variant:7", "variant:8"]),
                order("order:6", "user:3", &["variant:9"]),
            ],
        }
    }
}

#[async_trait]
impl OrderStore for InMemoryOrders {
    async fn order(&self, id: &str) -> Result<Option<Order>, StoreError> {
        Ok(self.orders.iter().find(|o| o.id == id).cloned())
    }
}

fn payment_method(id: &str, name: &str, payment_type: PaymentType) -> PaymentMethod {
    PaymentMethod {
        id: id.to_string(),
        name: name.to_string(),
        payment_type,
    }
}

pub struct InMemoryUsers {
    users: Vec<UserRecord>,
}

impl InMemoryUsers {
    pub fn seeded() -> Self {
        Self {
            users: vec![
                UserRecord {
                    id: "user:1".to_string(),
                    username: "user1".to_string(),
                    email: "user1@contoso.org".to_string(),
                    shipping_address: "123 Main St".to_string(),
                    payment_methods: vec![
                        payment_method(
                            "paymentMethod:1",
                            "User One's first credit card",
                            PaymentType::CreditCard,
                        ),
                        payment_method(
                            "paymentMethod:2",
                            "User One's second credit card",
                            PaymentType::CreditCard,
                        ),
                    ],
                    order_ids: vec!["order:1".to_string(), "order:2".to_string()],
                },
                UserRecord {
                    id: "user:2".to_string(),
                    username: "user2".to_string(),
                    email: "user2@contoso.org".to_string(),
                    shipping_address: "123 Main St".to_string(),
                    payment_methods: vec![payment_method(
                        "paymentMethod:3",
                        "User Two's first debit card",
                        PaymentType::DebitCard,
                    )],
                    order_ids: vec!["order:3".to_string()],
                },
                UserRecord {
                    id: "user:3".to_string(),
                    username: "user3".to_string(),
                    email: "user3@contoso.org".to_string(),
                    shipping_address: "123 Main St".to_string(),
                    payment_methods: vec![
                        payment_method(
                            "paymentMethod:4",
                            "User Three's first debit card",
                            PaymentType::DebitCard,
                        ),
                        payment_method(
                            "paymentMethod:5",
                            "User Three's first bank account",
                            PaymentType::BankAccount,
                        ),
                    ],
                    order_ids: vec![
                        "order:4".to_string(),
                        "order:5".to_string(),
                        "order:6".to_string(),
                    ],
                },
            ],
        }
    }
}

#[async_trait]
impl UserStore for InMemoryUsers {
    async fn user(&self, id: &str) -> Result<Option<UserRecord>, StoreError> {
        Ok(self.users.iter().find(|u| u.id == id).cloned())
    }

    async fn user_by_username(&self, username: &str) -> Result<Option<UserRecord>, StoreError> {
        Ok(self.users.iter().find(|u| u.username == username).cloned())
    }
}

/// Active cart sessions plus the checkout service's local price list.
pub struct InMemoryCarts {
    carts: RwLock<HashMap<String, Cart>>,
    prices: HashMap<String, f64>,
}

impl InMemoryCarts {
    pub fn seeded() -> Self {
        let mut carts = HashMap::new();
        carts.insert(
            "user:1".to_string(),
            Cart {
                items: vec![
                    CartItem {
                        variant_id: "variant:1".to_string(),
                        price: 600.25,
                        quantity: 1,
                    },
                    CartItem {
                        variant_id: "variant:2".to_string(),
                        price: 600.25,
                        quantity: 1,
                    },
                ],
            },
        );
        carts.insert(
            "user:2".to_string(),
            Cart {
                items: vec![CartItem {
                    variant_id: "variant:1".to_string(),
                    price: 600.25,
                    quantity: 1,
                }],
            },
        );
        let prices = [
            ("variant:1", 600.25),
            ("variant:2", 600.25),
            ("variant:3", 650.0),
            ("variant:4", 80.0),
            ("variant:5", 80.0),
            ("variant:6", 25.5),
            ("variant:7", 120.0),
            ("variant:8", 120.0),
            ("variant:9", 140.0),
        ]
        .into_iter()
        .map(|(id, price)| (id.to_string(), price))
        .collect();
        Self {
            carts: RwLock::new(carts),
            prices,
        }
    }
}

#[async_trait]
impl CartStore for InMemoryCarts {
    async fn cart(&self, user_id: &str) -> Result<Option<Cart>, StoreError> {
        Ok(self.carts.read().get(user_id).cloned())
    }

    async fn add_item(
        &self,
        user_id: &str,
        variant_id: &str,
        quantity: u32,
    ) -> Result<(), StoreError> {
        let price = self.prices.get(variant_id).copied().unwrap_or_default();
        let mut carts = self.carts.write();
        let cart = carts.entry(user_id.to_string()).or_default();
        match cart
            .items
            .iter_mut()
            .find(|item| item.variant_id == variant_id)
        {
            Some(item) => item.quantity += quantity,
            None => cart.items.push(CartItem {
                variant_id: variant_id.to_string(),
                price,
                quantity,
            }),
        }
        Ok(())
    }

    async fn remove_item(&self, user_id: &str, variant_id: &str) -> Result<bool, StoreError> {
        let mut carts = self.carts.write();
        let Some(cart) = carts.get_mut(user_id) else {
            return Ok(false);
        };
        let before = cart.items.len();
        cart.items.retain(|item| item.variant_id != variant_id);
        Ok(cart.items.len() < before)
    }

    async fn take_cart(&self, user_id: &str) -> Result<Option<Cart>, StoreError> {
        Ok(self.carts.write().remove(user_id))
    }
}

//! Data access for the subgraph services.
//!
//! Each service owns its slice of the catalog through a store trait, so the
//! in-memory demo data can be swapped for a real database without touching
//! resolver logic. Stores are async for exactly that reason, even though the
//! bundled implementations never block.

mod memory;

use async_trait::async_trait;
use serde::Deserialize;
use serde::Serialize;

pub use memory::InMemoryCarts;
pub use memory::InMemoryInventory;
pub use memory::InMemoryOrders;
pub use memory::InMemoryProducts;
pub use memory::InMemoryReviews;
pub use memory::InMemoryUsers;

use crate::error::StoreError;

/// A product as the products service stores it. `upc` is the same value as
/// `id`; variants are held as ids and expanded by the resolver.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub media_url: Option<String>,
    #[serde(skip)]
    pub variant_ids: Vec<String>,
}

/// A purchasable variant of a product.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Variant {
    pub id: String,
    #[serde(skip)]
    pub product_id: String,
    pub size: Option<String>,
    pub colorway: Option<String>,
    pub dimensions: Option<String>,
    pub price: f64,
    pub weight: Option<f64>,
}

/// A review held by the reviews service. The reviewed product is keyed by
/// upc, the reviewer by user id; both are foreign entities.
#[derive(Clone, Debug, PartialEq)]
pub struct Review {
    pub id: String,
    pub author: String,
    pub body: String,
    pub product_upc: String,
    pub user_id: String,
}

/// An order as the orders service stores it.
#[derive(Clone, Debug, PartialEq)]
pub struct Order {
    pub id: String,
    pub buyer_id: String,
    pub item_ids: Vec<String>,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentType {
    CreditCard,
    DebitCard,
    BankAccount,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PaymentMethod {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub payment_type: PaymentType,
}

/// A user record as the users service stores it.
#[derive(Clone, Debug, PartialEq)]
pub struct UserRecord {
    pub id: String,
    pub username: String,
    pub email: String,
    pub shipping_address: String,
    pub payment_methods: Vec<PaymentMethod>,
    pub order_ids: Vec<String>,
}

/// One line in a cart session. Quantity defaults to 1 on add.
#[derive(Clone, Debug, PartialEq)]
pub struct CartItem {
    pub variant_id: String,
    pub price: f64,
    pub quantity: u32,
}

/// A user's active cart session; one per user, keyed by the user id.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Cart {
    pub items: Vec<CartItem>,
}

impl Cart {
    pub fn subtotal(&self) -> f64 {
        self.items
            .iter()
            .map(|item| item.price * f64::from(item.quantity))
            .sum()
    }
}

#[async_trait]
pub trait ProductStore: Send + Sync {
    async fn product(&self, id: &str) -> Result<Option<Product>, StoreError>;
    async fn variant(&self, id: &str) -> Result<Option<Variant>, StoreError>;
    async fn products(&self) -> Result<Vec<Product>, StoreError>;
    async fn variants(&self) -> Result<Vec<Variant>, StoreError>;
}

#[async_trait]
pub trait InventoryStore: Send + Sync {
    /// Warehouse count for a variant, `None` when the warehouse has no record.
    async fn units_on_hand(&self, variant_id: &str) -> Result<Option<i64>, StoreError>;
}

#[async_trait]
pub trait ReviewStore: Send + Sync {
    async fn review(&self, id: &str) -> Result<Option<Review>, StoreError>;
    async fn reviews_for_product(&self, upc: &str) -> Result<Vec<Review>, StoreError>;
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn order(&self, id: &str) -> Result<Option<Order>, StoreError>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn user(&self, id: &str) -> Result<Option<UserRecord>, StoreError>;
    async fn user_by_username(&self, username: &str) -> Result<Option<UserRecord>, StoreError>;
}

#[async_trait]
pub trait CartStore: Send + Sync {
    async fn cart(&self, user_id: &str) -> Result<Option<Cart>, StoreError>;
    async fn add_item(
        &self,
        user_id: &str,
        variant_id: &str,
        quantity: u32,
    ) -> Result<(), StoreError>;
    /// Returns false when the variant was not in the cart.
    async fn remove_item(&self, user_id: &str, variant_id: &str) -> Result<bool, StoreError>;
    /// Empties the cart, returning what it held.
    async fn take_cart(&self, user_id: &str) -> Result<Option<Cart>, StoreError>;
}

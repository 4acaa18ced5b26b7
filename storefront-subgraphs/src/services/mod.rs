//! One resolver set per subgraph service.
//!
//! Field ownership discipline: a service only resolves the fields it extends
//! a type with, and refers to everything else through key-only stubs.

pub mod checkout;
pub mod discovery;
pub mod inventory;
pub mod orders;
pub mod products;
pub mod reviews;
pub mod shipping;
pub mod users;

pub use checkout::CheckoutService;
pub use discovery::DiscoveryService;
pub use inventory::InventoryService;
pub use orders::OrdersService;
pub use products::ProductsService;
pub use reviews::ReviewsService;
pub use shipping::ShippingService;
pub use users::UsersService;

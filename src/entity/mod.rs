pub mod cart_items;
pub mod job_applications;
pub mod jobs;
pub mod offices;
pub mod order_items;
pub mod orders;
pub mod outbox_events;
pub mod products;
pub mod reserved_ids;
pub mod shipping_addresses;
pub mod stock_notifications;
pub mod users;
pub mod verification_challenges;

pub use cart_items::Entity as CartItems;
pub use job_applications::Entity as JobApplications;
pub use jobs::Entity as Jobs;
pub use offices::Entity as Offices;
pub use order_items::Entity as OrderItems;
pub use orders::Entity as Orders;
pub use outbox_events::Entity as OutboxEvents;
pub use products::Entity as Products;
pub use reserved_ids::Entity as ReservedIds;
pub use shipping_addresses::Entity as ShippingAddresses;
pub use stock_notifications::Entity as StockNotifications;
pub use users::Entity as Users;
pub use verification_challenges::Entity as VerificationChallenges;

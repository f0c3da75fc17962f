pub mod addresses;
pub mod auth;
pub mod careers;
pub mod cart;
pub mod orders;
pub mod outbox;
pub mod products;
pub mod returns;

pub mod address_service;
pub mod admin_service;
pub mod auth_service;
pub mod career_service;
pub mod cart_service;
pub mod email;
pub mod id_service;
pub mod invoice_service;
pub mod notification_service;
pub mod order_service;
pub mod outbox_service;
pub mod product_service;
pub mod return_service;
pub mod storage;

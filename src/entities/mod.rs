pub mod order;
pub mod order_item;
pub mod session;
pub mod user;

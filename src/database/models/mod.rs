pub mod alert;
pub mod asset;
pub mod monitor;
pub mod server;
pub mod ticket;
pub mod user;

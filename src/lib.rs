pub mod auction;
pub mod bidding;
pub mod config;
pub mod database;
pub mod error;
pub mod event_store;
pub mod feed;
pub mod handlers;
pub mod identity;
pub mod lifecycle;
pub mod listing;
pub mod message_broker;
pub mod query;
pub mod scheduler;
pub mod store;

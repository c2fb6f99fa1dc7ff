pub mod api;
pub mod audit;
pub mod auth;
pub mod client;
pub mod config;
pub mod database;
pub mod error;
pub mod filter;
pub mod handlers;
pub mod middleware;
pub mod services;
pub mod storage;
pub mod testing;
pub mod types;
pub mod validation;

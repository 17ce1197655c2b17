//! clipurl - URL shortener with click analytics
//!
//! The shortening, redirect and analytics logic lives in [`services`] and
//! talks to storage only through the traits in [`store`]. Everything else
//! (HTTP routing, JWT auth, configuration, Redis) is wiring around it.

pub mod admin;
pub mod auth;
pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod middleware_impls;
pub mod models;
pub mod routes;
pub mod server;
pub mod services;
pub mod state;
pub mod store;
pub mod util;

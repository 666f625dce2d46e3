//! HTTP API: configuration, authentication middleware, guards and role routes.

pub mod app;
pub mod config;
pub mod context;
pub mod guards;
pub mod middleware;

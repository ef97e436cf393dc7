//! HTTP surface: routes, middleware, error mapping, OpenAPI docs

pub mod middleware;
pub mod openapi;
pub mod routes;
mod server;
pub mod types;

pub use server::ApiServer;

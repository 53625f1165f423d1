//! Rollcall: a small HTTP service exposing a users resource.
//!
//! The pieces are kept separate so each can be exercised without a socket:
//! `routing` holds the route table, `encoding` writes JSON payloads,
//! `controllers` registers the users resource and `http` binds and serves.

pub mod config;
pub mod controllers;
pub mod encoding;
pub mod error;
pub mod http;
pub mod middleware;
pub mod routing;

pub use error::AppError;
pub use routing::{Handler, RouteTable};

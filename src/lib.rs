pub mod app;
pub mod auth;
pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod registry;
pub mod store;
#[doc(hidden)]
pub mod testing;

pub use app::{app, AppState};

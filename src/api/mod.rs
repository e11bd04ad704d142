pub mod cache;
mod error;
mod middleware;
mod server;
pub mod services;
pub mod state;
pub mod utils;

pub use error::ApiError;
pub use server::{build_router, run};

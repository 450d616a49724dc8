//! API layer - HTTP endpoints and middleware

pub mod health;
pub mod middleware;
pub mod router;
pub mod state;
pub mod types;
pub mod v1;

#[cfg(test)]
mod test_support;

pub use router::create_router;
pub use state::AppState;

//! Conversation store backends

mod in_memory;
mod postgres;

pub use in_memory::InMemoryConversationStore;
pub use postgres::PostgresConversationStore;

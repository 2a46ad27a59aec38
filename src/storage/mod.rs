pub mod memory;
pub mod pg;
pub mod schema;

pub use memory::MemoryStore;
pub use pg::PgStore;

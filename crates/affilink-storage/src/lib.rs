pub mod memory;
pub mod mysql;
pub mod seed;

pub use affilink_core::repository::{
    CatalogRepository, ClickRepository, LinkRepository, ReadRepository, Result, Store,
};
pub use affilink_core::StorageError;
pub use memory::InMemoryRepository;
pub use mysql::MySqlRepository;

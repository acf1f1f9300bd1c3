pub mod builder;
pub mod dbs;
pub mod error;
pub mod trait_client;

pub use builder::DocumentStoreBuilder;
pub use dbs::document::{DocumentStore, StoreStatistics};
pub use error::PersistError;
pub use trait_client::PersistenceClient;

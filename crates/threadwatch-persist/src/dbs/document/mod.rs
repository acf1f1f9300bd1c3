mod statistics;
mod store;

pub use statistics::StoreStatistics;
pub use store::DocumentStore;

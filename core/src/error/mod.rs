#[allow(clippy::module_inception)]
pub mod error;
pub mod provider;
pub mod storage;

pub use error::GeoError;
pub use provider::ProviderError;
pub use storage::StorageError;

mod document;
mod model;
mod store;

pub use document::ConfigDocument;
pub use model::{Product, Value};
pub use store::{ConfigStore, CoreConfigStoreError};

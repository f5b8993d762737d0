pub mod provider;

pub use provider::{PropertyInfo, SchemaError, SchemaProvider};

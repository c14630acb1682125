//! Statema store: the registry layer of the settings stack.
//!
//! This layer turns point declarations into a live, shared settings store:
//! - `Schema`: ordered declarations, with derived settings overriding base ones
//! - `Store`: wiring of points and the key-addressed read/write surface
//! - `StoreConfig`: store-wide options (label, lock timeout)
//! - `StoreCell`: explicit one-time initialization of a process-wide store
//!
//! # Example
//!
//! ```rust
//! use statema_store::{Schema, Store};
//! use statema_point::{validate, PointDecl, Value, ValueKind};
//!
//! let schema = Schema::new()
//!     .point("count", PointDecl::new(0i64).validator(validate::kind(ValueKind::Integer)))
//!     .point("started", PointDecl::new(false).read_lock(true));
//!
//! let store = Store::new(&schema).unwrap();
//! store.set("started", true).unwrap();
//! assert_eq!(store.get("started").unwrap(), Value::Bool(true));
//! ```

mod cell;
mod config;
mod schema;
mod store;
mod typed;

pub use cell::StoreCell;
pub use config::StoreConfig;
pub use schema::{Schema, Settings};
pub use store::Store;
pub use typed::{from_value, to_value};

// Re-export point types for convenience
pub use statema_point::{Error, ErrorKind, Value};

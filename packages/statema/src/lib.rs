//! Statema: a validated, thread-safe settings registry.
//!
//! Settings are declared as named points, each with a default, a validation
//! rule, a locking policy and an optional action that can run once when the
//! store is built. The store is shared between threads by cloning its
//! handle; a write locks only the point it addresses.
//!
//! This crate re-exports both layers:
//! - `statema-point`: values, declarations, validators, actions, locks
//! - `statema-store`: schemas, the store, configuration, the global cell
//!
//! and adds [`escaping`], the opt-in helpers for suppressing named error
//! kinds at a call site.
//!
//! # Example
//!
//! ```rust
//! use statema::{validate, ErrorKind, PointDecl, Schema, Store, Value, ValueKind};
//!
//! let schema = Schema::new()
//!     .point("count", PointDecl::new(0i64).validator(validate::kind(ValueKind::Integer)))
//!     .point(
//!         "started",
//!         PointDecl::new(false)
//!             .do_action_first_time(true)
//!             .action_with(|_ctx, _old, _new| Ok(())),
//!     );
//! let store = Store::new(&schema).unwrap();
//!
//! store.set("count", 5i64).unwrap();
//! assert_eq!(store.get("count").unwrap(), Value::from(5i64));
//! assert_eq!(store.set("count", "x").unwrap_err().kind(), ErrorKind::Validation);
//! assert_eq!(store.set("missing", 1i64).unwrap_err().kind(), ErrorKind::UnknownField);
//! ```

pub mod escaping;

pub use statema_point::{
    action_with, lock, validate, validate_with, Action, BoxError, Context, Error, ErrorKind,
    Point, PointDecl, PointLock, PointState, Registry, Validate, ValidationError, Value,
    ValueKind,
};
pub use statema_store::{Schema, Settings, Store, StoreCell, StoreConfig};

//! Statema points: the field layer of the settings store.
//!
//! A point is one named configuration field:
//! - `Value`: the dynamically-typed content of a field
//! - `PointDecl`: default, validator, action and locking policy
//! - `Point`: the live field a store creates from a declaration
//! - `PointLock`: the (possibly shared) lock writes serialize on
//!
//! Points do not know about concrete stores. They reach their siblings
//! through the [`Registry`] trait, which the store layer implements.
//!
//! # Example
//!
//! ```rust
//! use statema_point::{PointDecl, Value, ValueKind, validate};
//!
//! let started = PointDecl::new(false)
//!     .validator(validate::kind(ValueKind::Bool))
//!     .do_action_first_time(true)
//!     .action_with(|_ctx, _old, _new| Ok(()));
//!
//! let point = started.instantiate(None);
//! assert_eq!(point.unlocked_get(), Value::Bool(false));
//! ```

mod action;
mod context;
mod error;
pub mod lock;
mod point;
pub mod validate;
mod value;

pub use action::{action_with, Action, FnAction};
pub use context::{Context, Registry};
pub use error::{BoxError, Error, ErrorKind, ValidationError};
pub use lock::PointLock;
pub use point::{Point, PointDecl, PointState};
pub use validate::{validate_with, FnValidator, Validate};
pub use value::{Value, ValueKind};

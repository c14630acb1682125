//! Action capability: a side effect tied to writes of a point.

use std::sync::Arc;

use crate::{BoxError, Context, Value};

/// Runs with the point's lock held, before the new value is committed.
///
/// An action may read and write sibling points through the context. Reading
/// its own point must go through [`Context::force_get`], which then yields
/// the old value.
pub trait Action: Send + Sync {
    fn run(&self, ctx: &Context<'_>, old: &Value, new: &Value) -> Result<(), BoxError>;
}

impl<T: Action + ?Sized> Action for Arc<T> {
    fn run(&self, ctx: &Context<'_>, old: &Value, new: &Value) -> Result<(), BoxError> {
        self.as_ref().run(ctx, old, new)
    }
}

impl<T: Action + ?Sized> Action for Box<T> {
    fn run(&self, ctx: &Context<'_>, old: &Value, new: &Value) -> Result<(), BoxError> {
        self.as_ref().run(ctx, old, new)
    }
}

/// An action backed by a closure. Build with [`action_with`].
pub struct FnAction<F>(F);

impl<F> Action for FnAction<F>
where
    F: Fn(&Context<'_>, &Value, &Value) -> Result<(), BoxError> + Send + Sync,
{
    fn run(&self, ctx: &Context<'_>, old: &Value, new: &Value) -> Result<(), BoxError> {
        (self.0)(ctx, old, new)
    }
}

pub fn action_with<F>(f: F) -> FnAction<F>
where
    F: Fn(&Context<'_>, &Value, &Value) -> Result<(), BoxError> + Send + Sync,
{
    FnAction(f)
}

//! Sibling access for validators and actions.

use std::sync::Arc;

use crate::{Error, Point, Value};

/// Name-addressed lookup of the points wired into one store.
///
/// Implemented by the store. Points only hold a weak reference to it, so a
/// point never keeps its store alive.
pub trait Registry: Send + Sync {
    /// Find a point by name.
    fn lookup(&self, name: &str) -> Option<Arc<Point>>;
}

/// What a validator or action sees while it runs for one point.
pub struct Context<'a> {
    point: &'a str,
    registry: Arc<dyn Registry>,
}

impl<'a> Context<'a> {
    pub fn new(point: &'a str, registry: Arc<dyn Registry>) -> Self {
        Self { point, registry }
    }

    /// Name of the point the callback runs for.
    pub fn point_name(&self) -> &str {
        self.point
    }

    pub fn contains(&self, name: &str) -> bool {
        self.registry.lookup(name).is_some()
    }

    pub fn point(&self, name: &str) -> Result<Arc<Point>, Error> {
        self.registry
            .lookup(name)
            .ok_or_else(|| Error::unknown_field(name))
    }

    /// Locked read of a sibling.
    ///
    /// Blocks if the sibling is read-locked and being written. Never call
    /// this for the current point from inside its own action when it is
    /// read-locked; use [`Context::force_get`].
    pub fn get(&self, name: &str) -> Result<Value, Error> {
        self.point(name)?.get()
    }

    /// Read that ignores any read-lock.
    ///
    /// Inside an action this returns the value from before the write, since
    /// the new value is committed only after the action succeeds.
    pub fn force_get(&self, name: &str) -> Result<Value, Error> {
        Ok(self.point(name)?.unlocked_get())
    }

    /// Write a sibling. Takes only that sibling's lock.
    pub fn set(&self, name: &str, value: impl Into<Value>) -> Result<(), Error> {
        self.point(name)?.set(value.into())
    }
}

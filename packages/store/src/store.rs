//! The settings store: owns one live point per declaration and dispatches
//! key-addressed reads and writes to them.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use statema_point::{Error, Point, Registry, Value};

use crate::config::StoreConfig;
use crate::schema::{Schema, Settings};

/// A live bag of settings, shared between threads by cloning the handle.
///
/// The point set is fixed at construction. Writes to a point take only that
/// point's lock (or the lock it shares with coupled points), so writers of
/// unrelated points never wait on each other.
///
/// # Example
///
/// ```rust
/// use statema_store::{Schema, Store};
/// use statema_point::{validate, PointDecl, Value, ValueKind};
///
/// let schema = Schema::new()
///     .point("count", PointDecl::new(0i64).validator(validate::kind(ValueKind::Integer)));
/// let store = Store::new(&schema).unwrap();
///
/// store.set("count", 5i64).unwrap();
/// assert_eq!(store.get("count").unwrap(), Value::from(5i64));
/// assert!(store.set("count", "x").is_err());
/// ```
#[derive(Clone)]
pub struct Store {
    inner: Arc<StoreInner>,
}

struct StoreInner {
    config: StoreConfig,
    entries: Vec<(String, Arc<Point>)>,
    index: HashMap<String, usize>,
    points_are_informed: AtomicBool,
}

impl Registry for StoreInner {
    fn lookup(&self, name: &str) -> Option<Arc<Point>> {
        self.index
            .get(name)
            .map(|&i| Arc::clone(&self.entries[i].1))
    }
}

impl Store {
    pub fn new(schema: &Schema) -> Result<Self, Error> {
        Self::with_config(schema, StoreConfig::default())
    }

    /// Build the store for a settings type.
    pub fn of<S: Settings>() -> Result<Self, Error> {
        Self::new(&S::schema())
    }

    /// Instantiate every declared point, wire them, then run first-time
    /// actions. An action failure aborts construction.
    pub fn with_config(schema: &Schema, config: StoreConfig) -> Result<Self, Error> {
        let lock_timeout = config.lock_timeout_duration();
        let mut entries = Vec::with_capacity(schema.len());
        let mut index = HashMap::with_capacity(schema.len());
        for (name, decl) in schema.iter() {
            if name.is_empty() {
                return Err(Error::schema(name, "point names must not be empty"));
            }
            index.insert(name.to_string(), entries.len());
            entries.push((name.to_string(), Arc::new(decl.instantiate(lock_timeout))));
        }

        let store = Store {
            inner: Arc::new(StoreInner {
                config,
                entries,
                index,
                points_are_informed: AtomicBool::new(false),
            }),
        };
        store.inform_points()?;
        Ok(store)
    }

    /// Wire every point in three passes: store reference and name, then
    /// locks, then first-time actions. Later passes rely on every point
    /// having completed the earlier ones.
    fn inform_points(&self) -> Result<(), Error> {
        if self.inner.points_are_informed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        tracing::debug!(
            "Wiring {} points of {}",
            self.inner.entries.len(),
            self.inner.config.label
        );

        let registry: Arc<dyn Registry> = self.inner.clone();
        let weak = Arc::downgrade(&registry);
        for (name, point) in &self.inner.entries {
            point.set_store_object(weak.clone())?;
            point.set_name(name.clone())?;
        }
        for (_, point) in &self.inner.entries {
            point.share_lock_object()?;
        }
        for (name, point) in &self.inner.entries {
            if point.fire_first_time_action()? {
                tracing::debug!("First-time action of '{}' done", name);
            }
        }
        Ok(())
    }

    pub fn config(&self) -> &StoreConfig {
        &self.inner.config
    }

    /// True iff `key` names a declared point.
    pub fn contains(&self, key: &str) -> bool {
        self.inner.index.contains_key(key)
    }

    fn point_ref(&self, key: &str) -> Result<&Arc<Point>, Error> {
        self.inner
            .index
            .get(key)
            .map(|&i| &self.inner.entries[i].1)
            .ok_or_else(|| Error::unknown_field(key))
    }

    /// The point object itself, as opposed to its value.
    pub fn point(&self, key: &str) -> Result<Arc<Point>, Error> {
        self.point_ref(key).map(Arc::clone)
    }

    /// Read a point, honoring its read-lock.
    pub fn get(&self, key: &str) -> Result<Value, Error> {
        self.point_ref(key)?.get()
    }

    /// Validate and write a point. Only that point's lock is taken.
    pub fn set(&self, key: &str, value: impl Into<Value>) -> Result<(), Error> {
        self.point_ref(key)?.set(value.into())
    }

    /// Read a point without its read-lock.
    ///
    /// Meant for action callbacks and diagnostics, where a locked read can
    /// deadlock against a lock the caller already holds. Ordinary code
    /// should use [`Store::get`].
    pub fn force_get(&self, key: &str) -> Result<Value, Error> {
        Ok(self.point_ref(key)?.unlocked_get())
    }

    /// Declared names, in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.inner.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.inner.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.entries.is_empty()
    }

    /// Current value of every point, read without read-locks.
    pub fn snapshot(&self) -> BTreeMap<String, Value> {
        self.inner
            .entries
            .iter()
            .map(|(name, point)| (name.clone(), point.unlocked_get()))
            .collect()
    }

    /// Human-readable listing of every point's current value.
    ///
    /// Not a stable format. Reads bypass read-locks so this is safe to call
    /// from inside an action.
    pub fn describe(&self) -> String {
        let data: Vec<String> = self
            .inner
            .entries
            .iter()
            .map(|(name, point)| format!("{} = {}", name, point.unlocked_get()))
            .collect();
        format!(
            "<{} object with data: {}>",
            self.inner.config.label,
            data.join(", ")
        )
    }
}

impl fmt::Display for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("label", &self.inner.config.label)
            .field("points", &self.snapshot())
            .finish()
    }
}

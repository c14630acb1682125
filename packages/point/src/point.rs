//! Point declarations and live points.
//!
//! A [`PointDecl`] describes a field: default, validator, action and locking
//! policy. A store turns each declaration into a fresh [`Point`] and wires it
//! (store reference, name, lock) before anyone reads or writes it.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock, Weak};
use std::time::Duration;

use parking_lot::RwLock;

use crate::action::{action_with, Action};
use crate::lock::{PointGuard, PointLock};
use crate::validate::{validate_with, Any, Validate};
use crate::{BoxError, Context, Error, Registry, ValidationError, Value};

/// Declaration of one settings field.
///
/// Cheap to clone: the validator and action are shared.
///
/// # Example
///
/// ```rust
/// use statema_point::{PointDecl, Value, ValueKind, validate};
///
/// let decl = PointDecl::new(0i64)
///     .validator(validate::kind(ValueKind::Integer))
///     .description("number of retries");
/// assert_eq!(decl.default_value(), &Value::from(0i64));
/// ```
#[derive(Clone)]
pub struct PointDecl {
    default: Value,
    validator: Arc<dyn Validate>,
    action: Option<Arc<dyn Action>>,
    read_lock: bool,
    do_action_first_time: bool,
    action_on_write: bool,
    share_lock_with: Option<String>,
    description: Option<String>,
}

impl PointDecl {
    /// A point holding `default` that accepts any value and has no action.
    pub fn new(default: impl Into<Value>) -> Self {
        Self {
            default: default.into(),
            validator: Arc::new(Any),
            action: None,
            read_lock: false,
            do_action_first_time: false,
            action_on_write: false,
            share_lock_with: None,
            description: None,
        }
    }

    pub fn validator(mut self, validator: impl Validate + 'static) -> Self {
        self.validator = Arc::new(validator);
        self
    }

    pub fn validate_with<F>(self, f: F) -> Self
    where
        F: Fn(&Context<'_>, Value) -> Result<Value, ValidationError> + Send + Sync + 'static,
    {
        self.validator(validate_with(f))
    }

    pub fn action(mut self, action: impl Action + 'static) -> Self {
        self.action = Some(Arc::new(action));
        self
    }

    pub fn action_with<F>(self, f: F) -> Self
    where
        F: Fn(&Context<'_>, &Value, &Value) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        self.action(action_with(f))
    }

    /// Make reads wait for an in-flight write on this point's lock.
    pub fn read_lock(mut self, on: bool) -> Self {
        self.read_lock = on;
        self
    }

    /// Run the action exactly once, when the store is constructed.
    pub fn do_action_first_time(mut self, on: bool) -> Self {
        self.do_action_first_time = on;
        self
    }

    /// Run the action on every `set`.
    pub fn action_on_write(mut self, on: bool) -> Self {
        self.action_on_write = on;
        self
    }

    /// Serialize on the same lock as the sibling point `name`.
    pub fn share_lock_with(mut self, name: impl Into<String>) -> Self {
        self.share_lock_with = Some(name.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn default_value(&self) -> &Value {
        &self.default
    }

    pub fn is_read_locked(&self) -> bool {
        self.read_lock
    }

    pub fn has_action(&self) -> bool {
        self.action.is_some()
    }

    pub fn get_description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn lock_partner(&self) -> Option<&str> {
        self.share_lock_with.as_deref()
    }

    /// Create an unwired point from this declaration.
    pub fn instantiate(&self, lock_timeout: Option<Duration>) -> Point {
        Point {
            value: RwLock::new(self.default.clone()),
            decl: self.clone(),
            name: OnceLock::new(),
            store: OnceLock::new(),
            lock: OnceLock::new(),
            first_action_fired: AtomicBool::new(false),
            lock_timeout,
        }
    }
}

impl fmt::Debug for PointDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PointDecl")
            .field("default", &self.default)
            .field("action", &self.action.is_some())
            .field("read_lock", &self.read_lock)
            .field("do_action_first_time", &self.do_action_first_time)
            .field("action_on_write", &self.action_on_write)
            .field("share_lock_with", &self.share_lock_with)
            .field("description", &self.description)
            .finish()
    }
}

/// Where a point is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PointState {
    /// No store or name yet.
    Unwired,
    /// Store reference and name assigned.
    Wired,
    /// Lock established; the point is readable and writable.
    LockEstablished,
    /// The first-time action has run.
    Initialized,
}

/// A live settings field owned by one store.
pub struct Point {
    decl: PointDecl,
    name: OnceLock<String>,
    store: OnceLock<Weak<dyn Registry>>,
    lock: OnceLock<Arc<PointLock>>,
    value: RwLock<Value>,
    first_action_fired: AtomicBool,
    lock_timeout: Option<Duration>,
}

const UNNAMED: &str = "<unnamed>";

impl Point {
    pub fn name(&self) -> &str {
        self.name.get().map(String::as_str).unwrap_or(UNNAMED)
    }

    pub fn decl(&self) -> &PointDecl {
        &self.decl
    }

    pub fn is_read_locked(&self) -> bool {
        self.decl.read_lock
    }

    pub fn first_action_fired(&self) -> bool {
        self.first_action_fired.load(Ordering::Acquire)
    }

    pub fn state(&self) -> PointState {
        if self.first_action_fired() {
            PointState::Initialized
        } else if self.lock.get().is_some() {
            PointState::LockEstablished
        } else if self.name.get().is_some() && self.store.get().is_some() {
            PointState::Wired
        } else {
            PointState::Unwired
        }
    }

    /// Attach the back-reference to the owning store.
    pub fn set_store_object(&self, store: Weak<dyn Registry>) -> Result<(), Error> {
        self.store
            .set(store)
            .map_err(|_| Error::schema(self.name(), "already attached to a store"))
    }

    /// Assign the registry key. Can only happen once.
    pub fn set_name(&self, name: impl Into<String>) -> Result<(), Error> {
        let name = name.into();
        self.name
            .set(name)
            .map_err(|name| Error::schema(name, "point is already named"))
    }

    /// Establish the lock this point serializes on.
    ///
    /// A point without a partner gets its own lock. A point declared with
    /// `share_lock_with` follows the chain of partners to its end and uses
    /// that point's lock, creating it if needed, so every point on the chain
    /// ends up with the same lock whatever order they are visited in.
    pub fn share_lock_object(&self) -> Result<(), Error> {
        if self.lock.get().is_some() {
            return Ok(());
        }
        let lock = match &self.decl.share_lock_with {
            None => PointLock::shared(),
            Some(partner) => self.resolve_partner_lock(partner)?,
        };
        // Another point on the chain may have initialized ours meanwhile.
        let lock = self.lock.get_or_init(|| lock);
        tracing::debug!(
            "Point '{}' lock established (shared: {})",
            self.name(),
            Arc::strong_count(lock) > 1
        );
        Ok(())
    }

    fn resolve_partner_lock(&self, partner: &str) -> Result<Arc<PointLock>, Error> {
        let registry = self.registry()?;
        let mut visited = vec![self.name().to_string()];
        let mut target = partner.to_string();
        loop {
            if visited.contains(&target) {
                return Err(Error::schema(
                    self.name(),
                    format!("lock sharing cycle through '{}'", target),
                ));
            }
            let sibling = registry.lookup(&target).ok_or_else(|| {
                Error::schema(
                    self.name(),
                    format!("cannot share a lock with unknown point '{}'", target),
                )
            })?;
            if let Some(lock) = sibling.lock.get() {
                return Ok(Arc::clone(lock));
            }
            match &sibling.decl.share_lock_with {
                None => return Ok(Arc::clone(sibling.lock.get_or_init(PointLock::shared))),
                Some(next) => {
                    visited.push(target);
                    target = next.clone();
                }
            }
        }
    }

    /// The established lock, if wiring got that far.
    pub fn lock(&self) -> Option<&Arc<PointLock>> {
        self.lock.get()
    }

    /// True if both points serialize on the same lock.
    pub fn shares_lock_with(&self, other: &Point) -> bool {
        match (self.lock.get(), other.lock.get()) {
            (Some(a), Some(b)) => crate::lock::shares_with(a, b),
            _ => false,
        }
    }

    fn registry(&self) -> Result<Arc<dyn Registry>, Error> {
        self.store
            .get()
            .and_then(Weak::upgrade)
            .ok_or_else(|| Error::Unwired {
                name: self.name().to_string(),
            })
    }

    /// Context handed to this point's validator and action.
    pub fn context(&self) -> Result<Context<'_>, Error> {
        Ok(Context::new(self.name(), self.registry()?))
    }

    fn acquire(&self) -> Result<PointGuard<'_>, Error> {
        let lock = self.lock.get().ok_or_else(|| Error::Unwired {
            name: self.name().to_string(),
        })?;
        match self.lock_timeout {
            None => Ok(lock.acquire()),
            Some(timeout) => lock.acquire_for(timeout).ok_or_else(|| Error::LockTimeout {
                name: self.name().to_string(),
                timeout,
            }),
        }
    }

    /// Current value.
    ///
    /// For a read-locked point this waits until any in-flight write on the
    /// (possibly shared) lock completes. Other points never block here.
    pub fn get(&self) -> Result<Value, Error> {
        if self.decl.read_lock {
            let _guard = self.acquire()?;
            tracing::trace!("Locked read of '{}'", self.name());
            return Ok(self.unlocked_get());
        }
        Ok(self.unlocked_get())
    }

    /// Current value, ignoring the read-lock.
    ///
    /// An escape hatch for actions and diagnostics: an action runs while its
    /// point's lock is held, and a locked read of the same point from there
    /// would deadlock.
    pub fn unlocked_get(&self) -> Value {
        self.value.read().clone()
    }

    /// Validate, then under the lock run the action (if the point acts on
    /// writes) and commit.
    ///
    /// A validation or action failure leaves the stored value unchanged.
    pub fn set(&self, value: Value) -> Result<(), Error> {
        let ctx = self.context()?;
        let value = self
            .decl
            .validator
            .validate(&ctx, value)
            .map_err(|e| Error::validation(self.name(), e))?;

        let _guard = self.acquire()?;
        if self.decl.action_on_write {
            let old = self.unlocked_get();
            self.run_action(&ctx, &old, &value)?;
        }
        tracing::trace!("Setting '{}' = {}", self.name(), value);
        *self.value.write() = value;
        Ok(())
    }

    /// Invoke the configured action, if any. Failures propagate.
    pub fn do_action(&self, old: &Value, new: &Value) -> Result<(), Error> {
        let ctx = self.context()?;
        self.run_action(&ctx, old, new)
    }

    fn run_action(&self, ctx: &Context<'_>, old: &Value, new: &Value) -> Result<(), Error> {
        match &self.decl.action {
            Some(action) => action
                .run(ctx, old, new)
                .map_err(|e| Error::action(self.name(), e)),
            None => Ok(()),
        }
    }

    /// Fire the first-time action with the current value as both ends.
    ///
    /// Returns `Ok(true)` if the action ran. At most one call per point ever
    /// runs it, even if that run fails; later `set` calls never re-check
    /// the first-time policy.
    pub fn fire_first_time_action(&self) -> Result<bool, Error> {
        if !self.decl.do_action_first_time {
            return Ok(false);
        }
        if self.first_action_fired.swap(true, Ordering::AcqRel) {
            return Ok(false);
        }
        let value = self.unlocked_get();
        tracing::debug!("Running first-time action of '{}'", self.name());
        self.do_action(&value, &value)?;
        Ok(true)
    }
}

impl fmt::Debug for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Point")
            .field("name", &self.name())
            .field("value", &self.unlocked_get())
            .field("state", &self.state())
            .field("decl", &self.decl)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate;
    use crate::ValueKind;
    use std::collections::HashMap;
    use std::sync::atomic::AtomicUsize;

    /// Minimal wiring without a store.
    struct TestRegistry {
        points: HashMap<String, Arc<Point>>,
    }

    impl Registry for TestRegistry {
        fn lookup(&self, name: &str) -> Option<Arc<Point>> {
            self.points.get(name).cloned()
        }
    }

    fn wire(decls: Vec<(&str, PointDecl)>) -> Arc<TestRegistry> {
        let points = decls
            .into_iter()
            .map(|(name, decl)| (name.to_string(), Arc::new(decl.instantiate(None))))
            .collect();
        let registry = Arc::new(TestRegistry { points });
        let dyn_registry: Arc<dyn Registry> = registry.clone();
        for (name, point) in &registry.points {
            point.set_store_object(Arc::downgrade(&dyn_registry)).unwrap();
            point.set_name(name.clone()).unwrap();
        }
        for point in registry.points.values() {
            point.share_lock_object().unwrap();
        }
        registry
    }

    #[test]
    fn lifecycle_states() {
        let registry = wire(vec![]);
        let point = PointDecl::new(false)
            .do_action_first_time(true)
            .action_with(|_, _, _| Ok(()))
            .instantiate(None);
        assert_eq!(point.state(), PointState::Unwired);
        assert_eq!(point.name(), "<unnamed>");

        let dyn_registry: Arc<dyn Registry> = registry.clone();
        point.set_store_object(Arc::downgrade(&dyn_registry)).unwrap();
        point.set_name("started").unwrap();
        assert_eq!(point.state(), PointState::Wired);

        point.share_lock_object().unwrap();
        assert_eq!(point.state(), PointState::LockEstablished);

        assert!(point.fire_first_time_action().unwrap());
        assert_eq!(point.state(), PointState::Initialized);
    }

    #[test]
    fn name_is_assigned_once() {
        let point = PointDecl::new(0i64).instantiate(None);
        point.set_name("a").unwrap();
        let err = point.set_name("b").unwrap_err();
        assert!(matches!(err, Error::Schema { .. }));
        assert_eq!(point.name(), "a");
    }

    #[test]
    fn set_before_wiring_fails() {
        let point = PointDecl::new(0i64).instantiate(None);
        let err = point.set(Value::from(1i64)).unwrap_err();
        assert!(matches!(err, Error::Unwired { .. }));
        assert_eq!(point.unlocked_get(), Value::from(0i64));
    }

    #[test]
    fn validation_failure_keeps_value() {
        let registry = wire(vec![(
            "count",
            PointDecl::new(0i64).validator(validate::kind(ValueKind::Integer)),
        )]);
        let point = registry.lookup("count").unwrap();

        point.set(Value::from(5i64)).unwrap();
        let err = point.set(Value::from("x")).unwrap_err();
        assert!(matches!(err, Error::Validation { ref name, .. } if name == "count"));
        assert_eq!(point.get().unwrap(), Value::from(5i64));
    }

    #[test]
    fn action_runs_before_commit() {
        let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let log = Arc::clone(&seen);
        let registry = wire(vec![(
            "level",
            PointDecl::new(1i64)
                .action_on_write(true)
                .action_with(move |ctx, old, new| {
                    let current = ctx.force_get(ctx.point_name())?;
                    log.lock().push((old.clone(), new.clone(), current));
                    Ok(())
                }),
        )]);
        let point = registry.lookup("level").unwrap();
        point.set(Value::from(2i64)).unwrap();

        let seen = seen.lock();
        assert_eq!(
            seen.as_slice(),
            &[(Value::from(1i64), Value::from(2i64), Value::from(1i64))]
        );
    }

    #[test]
    fn failing_action_leaves_value_unchanged() {
        let registry = wire(vec![(
            "level",
            PointDecl::new(1i64)
                .action_on_write(true)
                .action_with(|_, _, new| {
                    if new.as_i64() == Some(13) {
                        return Err("unlucky".into());
                    }
                    Ok(())
                }),
        )]);
        let point = registry.lookup("level").unwrap();

        let err = point.set(Value::from(13i64)).unwrap_err();
        assert!(matches!(err, Error::Action { .. }));
        assert_eq!(point.get().unwrap(), Value::from(1i64));
        assert!(!point.lock().unwrap().is_locked());
    }

    #[test]
    fn first_time_action_fires_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let registry = wire(vec![(
            "started",
            PointDecl::new(false)
                .do_action_first_time(true)
                .action_with(move |_, old, new| {
                    assert_eq!(old, new);
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }),
        )]);
        let point = registry.lookup("started").unwrap();

        assert!(point.fire_first_time_action().unwrap());
        assert!(!point.fire_first_time_action().unwrap());
        point.set(Value::from(true)).unwrap();
        point.set(Value::from(false)).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn lock_chain_is_shared_in_any_order() {
        let registry = wire(vec![
            ("a", PointDecl::new(0i64).share_lock_with("b")),
            ("b", PointDecl::new(0i64).share_lock_with("c")),
            ("c", PointDecl::new(0i64)),
            ("d", PointDecl::new(0i64)),
        ]);
        let a = registry.lookup("a").unwrap();
        let b = registry.lookup("b").unwrap();
        let c = registry.lookup("c").unwrap();
        let d = registry.lookup("d").unwrap();

        assert!(a.shares_lock_with(&b));
        assert!(b.shares_lock_with(&c));
        assert!(!a.shares_lock_with(&d));
    }

    #[test]
    fn lock_cycle_is_rejected() {
        let points: HashMap<String, Arc<Point>> = [
            ("a", PointDecl::new(0i64).share_lock_with("b")),
            ("b", PointDecl::new(0i64).share_lock_with("a")),
        ]
        .into_iter()
        .map(|(name, decl)| (name.to_string(), Arc::new(decl.instantiate(None))))
        .collect();
        let registry: Arc<dyn Registry> = Arc::new(TestRegistry { points });
        for name in ["a", "b"] {
            let point = registry.lookup(name).unwrap();
            point.set_store_object(Arc::downgrade(&registry)).unwrap();
            point.set_name(name).unwrap();
        }

        let err = registry.lookup("a").unwrap().share_lock_object().unwrap_err();
        assert!(matches!(err, Error::Schema { .. }));
        assert!(err.to_string().contains("cycle"));
    }

    #[test]
    fn unknown_lock_partner_is_rejected() {
        let points: HashMap<String, Arc<Point>> = [(
            "a".to_string(),
            Arc::new(PointDecl::new(0i64).share_lock_with("ghost").instantiate(None)),
        )]
        .into_iter()
        .collect();
        let registry: Arc<dyn Registry> = Arc::new(TestRegistry { points });
        let point = registry.lookup("a").unwrap();
        point.set_store_object(Arc::downgrade(&registry)).unwrap();
        point.set_name("a").unwrap();

        let err = point.share_lock_object().unwrap_err();
        assert!(err.to_string().contains("ghost"));
    }

    #[test]
    fn read_locked_get_times_out_under_write() {
        let point = Arc::new(
            PointDecl::new(0i64)
                .read_lock(true)
                .instantiate(Some(Duration::from_millis(20))),
        );
        let registry: Arc<dyn Registry> = Arc::new(TestRegistry {
            points: [("level".to_string(), Arc::clone(&point))]
                .into_iter()
                .collect(),
        });
        point.set_store_object(Arc::downgrade(&registry)).unwrap();
        point.set_name("level").unwrap();
        point.share_lock_object().unwrap();

        let _held = point.lock().unwrap().acquire();
        let reader = Arc::clone(&point);
        let result = std::thread::spawn(move || reader.get()).join().unwrap();
        assert!(matches!(result, Err(Error::LockTimeout { .. })));
        assert_eq!(point.unlocked_get(), Value::from(0i64));
    }
}

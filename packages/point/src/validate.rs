//! Validation capability and the stock validators.
//!
//! A validator receives a candidate value and either returns the value to
//! store (possibly normalized, e.g. an integer widened to a float) or a
//! [`ValidationError`]. Validators run before the point's lock is taken.

use std::sync::Arc;

use crate::{Context, ValidationError, Value, ValueKind};

/// Decides whether a candidate value may be stored in a point.
pub trait Validate: Send + Sync {
    fn validate(&self, ctx: &Context<'_>, candidate: Value) -> Result<Value, ValidationError>;
}

impl<T: Validate + ?Sized> Validate for Arc<T> {
    fn validate(&self, ctx: &Context<'_>, candidate: Value) -> Result<Value, ValidationError> {
        self.as_ref().validate(ctx, candidate)
    }
}

impl<T: Validate + ?Sized> Validate for Box<T> {
    fn validate(&self, ctx: &Context<'_>, candidate: Value) -> Result<Value, ValidationError> {
        self.as_ref().validate(ctx, candidate)
    }
}

/// A validator backed by a closure. Build with [`validate_with`].
pub struct FnValidator<F>(F);

impl<F> Validate for FnValidator<F>
where
    F: Fn(&Context<'_>, Value) -> Result<Value, ValidationError> + Send + Sync,
{
    fn validate(&self, ctx: &Context<'_>, candidate: Value) -> Result<Value, ValidationError> {
        (self.0)(ctx, candidate)
    }
}

pub fn validate_with<F>(f: F) -> FnValidator<F>
where
    F: Fn(&Context<'_>, Value) -> Result<Value, ValidationError> + Send + Sync,
{
    FnValidator(f)
}

/// Accepts every value unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct Any;

impl Validate for Any {
    fn validate(&self, _ctx: &Context<'_>, candidate: Value) -> Result<Value, ValidationError> {
        Ok(candidate)
    }
}

pub fn any() -> Any {
    Any
}

/// Accepts values of one kind. A float point also takes integers and
/// stores them widened.
#[derive(Debug, Clone, Copy)]
pub struct Kind(pub ValueKind);

impl Validate for Kind {
    fn validate(&self, _ctx: &Context<'_>, candidate: Value) -> Result<Value, ValidationError> {
        match (self.0, candidate) {
            (ValueKind::Float, Value::Integer(i)) => Ok(Value::Float(i as f64)),
            (expected, candidate) if candidate.kind() == expected => Ok(candidate),
            (expected, candidate) => Err(ValidationError::new(format!(
                "expected {}, got {}",
                expected,
                candidate.type_name()
            ))),
        }
    }
}

pub fn kind(kind: ValueKind) -> Kind {
    Kind(kind)
}

/// Accepts integers within `min..=max`.
#[derive(Debug, Clone, Copy)]
pub struct IntRange {
    pub min: i64,
    pub max: i64,
}

impl Validate for IntRange {
    fn validate(&self, _ctx: &Context<'_>, candidate: Value) -> Result<Value, ValidationError> {
        let Some(i) = candidate.as_i64() else {
            return Err(ValidationError::new(format!(
                "expected integer, got {}",
                candidate.type_name()
            )));
        };
        if i < self.min || i > self.max {
            return Err(ValidationError::new(format!(
                "{} is outside {}..={}",
                i, self.min, self.max
            )));
        }
        Ok(candidate)
    }
}

pub fn int_range(min: i64, max: i64) -> IntRange {
    IntRange { min, max }
}

/// Accepts only the listed values.
#[derive(Debug, Clone)]
pub struct OneOf(pub Vec<Value>);

impl Validate for OneOf {
    fn validate(&self, _ctx: &Context<'_>, candidate: Value) -> Result<Value, ValidationError> {
        if self.0.contains(&candidate) {
            return Ok(candidate);
        }
        let allowed: Vec<String> = self.0.iter().map(|v| v.to_string()).collect();
        Err(ValidationError::new(format!(
            "{} is not one of [{}]",
            candidate,
            allowed.join(", ")
        )))
    }
}

pub fn one_of<T: Into<Value>>(values: impl IntoIterator<Item = T>) -> OneOf {
    OneOf(values.into_iter().map(Into::into).collect())
}

/// Rejects every write once the boolean sibling `flag` is true, otherwise
/// defers to `inner`.
///
/// The flag is read without its read-lock: the validator may run inside an
/// action that already holds the flag's lock.
pub struct FrozenWhen {
    flag: String,
    inner: Arc<dyn Validate>,
}

impl Validate for FrozenWhen {
    fn validate(&self, ctx: &Context<'_>, candidate: Value) -> Result<Value, ValidationError> {
        let frozen = ctx
            .force_get(&self.flag)
            .map_err(|e| ValidationError::new(e.to_string()))?;
        if frozen.as_bool() == Some(true) {
            return Err(ValidationError::new(format!(
                "'{}' cannot change once '{}' is set",
                ctx.point_name(),
                self.flag
            )));
        }
        self.inner.validate(ctx, candidate)
    }
}

pub fn frozen_when(flag: impl Into<String>, inner: impl Validate + 'static) -> FrozenWhen {
    FrozenWhen {
        flag: flag.into(),
        inner: Arc::new(inner),
    }
}

//! Opt-in suppression of named error categories.
//!
//! The store never swallows errors itself. These helpers let a call site
//! decide that some failures (say, a failing logging hook) should be
//! ignored, and name exactly which kinds.

use std::future::Future;

use statema_point::{Action, BoxError, Context, Error, ErrorKind, Value};

/// Run `f`; errors of the listed kinds become `Ok(None)`.
///
/// ```rust
/// use statema::escaping::escaping;
/// use statema::{ErrorKind, PointDecl, Schema, Store};
///
/// let store = Store::new(&Schema::new().point("n", PointDecl::new(0i64))).unwrap();
/// let value = escaping(&[ErrorKind::UnknownField], || store.get("missing")).unwrap();
/// assert!(value.is_none());
/// ```
pub fn escaping<T, F>(kinds: &[ErrorKind], f: F) -> Result<Option<T>, Error>
where
    F: FnOnce() -> Result<T, Error>,
{
    escape(kinds, f())
}

/// [`escaping`] for futures.
pub async fn escaping_async<T, Fut>(kinds: &[ErrorKind], fut: Fut) -> Result<Option<T>, Error>
where
    Fut: Future<Output = Result<T, Error>>,
{
    escape(kinds, fut.await)
}

fn escape<T>(kinds: &[ErrorKind], result: Result<T, Error>) -> Result<Option<T>, Error> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if kinds.contains(&e.kind()) => {
            tracing::warn!("Escaped error: {}", e);
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

/// An action whose failures are logged and dropped.
pub struct Escaping<A>(pub A);

impl<A: Action> Action for Escaping<A> {
    fn run(&self, ctx: &Context<'_>, old: &Value, new: &Value) -> Result<(), BoxError> {
        if let Err(e) = self.0.run(ctx, old, new) {
            tracing::warn!("Escaped action error in '{}': {}", ctx.point_name(), e);
        }
        Ok(())
    }
}

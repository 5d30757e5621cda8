//! # Cancellable execution context.
//!
//! [`Context`] is threaded through every lifecycle hook. It bundles:
//! - an optional [`CancellationToken`] (a [`Context::background`] context has none and never ends),
//! - an optional deadline,
//! - an immutable set of typed values that hooks can read and extend.
//!
//! Deriving a context (`child`, `with_value`, `with_deadline`) never affects the parent:
//! cancelling a child leaves the parent running, while cancelling the parent ends every child.
//!
//! ## Example
//! ```rust
//! use modvisor::Context;
//!
//! #[derive(Debug, PartialEq)]
//! struct RequestId(u32);
//!
//! let root = Context::new();
//! let derived = root.with_value(RequestId(7));
//!
//! assert_eq!(derived.value::<RequestId>(), Some(&RequestId(7)));
//! assert!(root.value::<RequestId>().is_none());
//!
//! root.cancel();
//! assert!(derived.is_cancelled());
//! ```

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::ContextError;

type Values = HashMap<TypeId, Arc<dyn Any + Send + Sync>>;

/// Execution context passed to module hooks.
#[derive(Clone, Default)]
pub struct Context {
    token: Option<CancellationToken>,
    deadline: Option<Instant>,
    /// Set by the deadline timer when it (not an explicit cancel) ended the context.
    expired: Option<Arc<AtomicBool>>,
    values: Arc<Values>,
}

impl Context {
    /// A context that can never be cancelled.
    ///
    /// The controller skips its wait phase for such a context, since nothing could end it.
    pub fn background() -> Self {
        Self::default()
    }

    /// A fresh cancellable context.
    pub fn new() -> Self {
        Self::from_token(CancellationToken::new())
    }

    /// Wraps an existing token.
    pub fn from_token(token: CancellationToken) -> Self {
        Self {
            token: Some(token),
            ..Self::default()
        }
    }

    /// Returns the cancellation token, if this context can be cancelled.
    pub fn token(&self) -> Option<&CancellationToken> {
        self.token.as_ref()
    }

    /// True when something can end this context (an owner or a deadline).
    #[inline]
    pub fn is_cancellable(&self) -> bool {
        self.token.is_some()
    }

    /// Cancels this context and all contexts derived from it. No-op for a background context.
    pub fn cancel(&self) {
        if let Some(token) = &self.token {
            token.cancel();
        }
    }

    /// True once the context has been cancelled (explicitly, by a parent, or by its deadline).
    pub fn is_cancelled(&self) -> bool {
        self.token.as_ref().is_some_and(CancellationToken::is_cancelled)
    }

    /// Completes when the context is cancelled; pends forever for a background context.
    pub async fn cancelled(&self) {
        match &self.token {
            Some(token) => token.cancelled().await,
            None => std::future::pending().await,
        }
    }

    /// Why the context ended, or `None` while it is still live.
    pub fn err(&self) -> Option<ContextError> {
        if !self.is_cancelled() {
            return None;
        }
        if self.expired.as_ref().is_some_and(|e| e.load(Ordering::Acquire)) {
            Some(ContextError::DeadlineExceeded)
        } else {
            Some(ContextError::Canceled)
        }
    }

    /// The instant after which this context is cancelled automatically.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Derives a context that can be cancelled on its own without touching `self`.
    pub fn child(&self) -> Self {
        let token = match &self.token {
            Some(parent) => parent.child_token(),
            None => CancellationToken::new(),
        };
        Self {
            token: Some(token),
            deadline: self.deadline,
            expired: self.expired.clone(),
            values: Arc::clone(&self.values),
        }
    }

    /// Derives a context carrying `value`, replacing any previous value of the same type.
    ///
    /// The derived context shares `self`'s cancellation; it is not separately cancellable.
    pub fn with_value<T: Any + Send + Sync>(&self, value: T) -> Self {
        let mut values = Values::clone(&self.values);
        values.insert(TypeId::of::<T>(), Arc::new(value));
        Self {
            values: Arc::new(values),
            ..self.clone()
        }
    }

    /// Returns the value of type `T`, if one was attached.
    pub fn value<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.values
            .get(&TypeId::of::<T>())
            .and_then(|v| v.downcast_ref::<T>())
    }

    /// Derives a child context that is cancelled automatically at `at`.
    ///
    /// If `self` already ends earlier, the earlier deadline is kept.
    /// Spawns a timer task, so it must be called inside a Tokio runtime.
    pub fn with_deadline(&self, at: Instant) -> Self {
        if self.deadline.is_some_and(|d| d <= at) {
            return self.child();
        }

        let expired = Arc::new(AtomicBool::new(false));
        let mut ctx = self.child();
        ctx.deadline = Some(at);
        ctx.expired = Some(Arc::clone(&expired));

        if let Some(token) = ctx.token.clone() {
            tokio::spawn(async move {
                tokio::select! {
                    _ = tokio::time::sleep_until(at) => {
                        expired.store(true, Ordering::Release);
                        token.cancel();
                    }
                    _ = token.cancelled() => {}
                }
            });
        }
        ctx
    }

    /// Shorthand for [`with_deadline`](Self::with_deadline) at `now + timeout`.
    ///
    /// A timeout too large to represent yields a child without a deadline of its own.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        match Instant::now().checked_add(timeout) {
            Some(at) => self.with_deadline(at),
            None => self.child(),
        }
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("cancellable", &self.is_cancellable())
            .field("cancelled", &self.is_cancelled())
            .field("deadline", &self.deadline)
            .field("values", &self.values.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn background_never_ends() {
        let ctx = Context::background();
        ctx.cancel();
        assert!(!ctx.is_cancellable());
        assert!(!ctx.is_cancelled());
        assert_eq!(ctx.err(), None);
    }

    #[test]
    fn cancelling_child_keeps_parent_alive() {
        let parent = Context::new();
        let child = parent.child();

        child.cancel();
        assert!(child.is_cancelled());
        assert!(!parent.is_cancelled());

        let other = parent.child();
        parent.cancel();
        assert!(other.is_cancelled());
        assert_eq!(other.err(), Some(ContextError::Canceled));
    }

    #[test]
    fn child_of_background_is_cancellable() {
        let child = Context::background().child();
        assert!(child.is_cancellable());
        child.cancel();
        assert!(child.is_cancelled());
    }

    #[test]
    fn values_are_shadowed_not_mutated() {
        let a = Context::new().with_value(1u32);
        let b = a.with_value(2u32).with_value("name");

        assert_eq!(a.value::<u32>(), Some(&1));
        assert_eq!(b.value::<u32>(), Some(&2));
        assert_eq!(b.value::<&'static str>(), Some(&"name"));
        assert!(a.value::<&'static str>().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_reports_exceeded() {
        let ctx = Context::new().with_timeout(Duration::from_millis(50));
        assert_eq!(ctx.err(), None);

        ctx.cancelled().await;
        assert_eq!(ctx.err(), Some(ContextError::DeadlineExceeded));
    }

    #[tokio::test(start_paused = true)]
    async fn explicit_cancel_before_deadline_is_plain_cancel() {
        let ctx = Context::new().with_timeout(Duration::from_secs(10));
        ctx.cancel();
        tokio::time::sleep(Duration::from_secs(20)).await;
        assert_eq!(ctx.err(), Some(ContextError::Canceled));
    }

    #[tokio::test(start_paused = true)]
    async fn unrepresentable_timeout_never_expires() {
        let parent = Context::new();
        let ctx = parent.with_timeout(Duration::MAX);
        assert_eq!(ctx.deadline(), None);

        tokio::time::sleep(Duration::from_secs(3600)).await;
        assert!(!ctx.is_cancelled());

        parent.cancel();
        assert_eq!(ctx.err(), Some(ContextError::Canceled));
    }

    #[tokio::test(start_paused = true)]
    async fn later_deadline_keeps_earlier_one() {
        let first = Context::new().with_timeout(Duration::from_secs(1));
        let second = first.with_timeout(Duration::from_secs(60));
        assert_eq!(second.deadline(), first.deadline());

        second.cancelled().await;
        assert_eq!(second.err(), Some(ContextError::DeadlineExceeded));
    }
}

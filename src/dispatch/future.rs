//! Asynchronous cached-function wrapper.
//!
//! Same flow as the sync wrapper with exactly one suspension point per
//! miss, between lookup and store. No store lock is held across the await:
//! the lookup's critical section ends before the user future is polled,
//! and the store's begins after it resolves. Cancelling the call (dropping
//! the future) during the await stores nothing and leaves the cache
//! consistent.

use std::future::Future;
use std::marker::PhantomData;

use super::Store;
use crate::key::Args;

/// An async user function plus the store that memoizes it.
///
/// Two concurrent calls for the same missing key may both run the
/// function (double-flight); the later `set` overwrites the earlier one
/// with an equal value. Callers needing single-flight must layer their own
/// deduplication on top.
pub struct AsyncCachedFunction<F, V, S> {
    func: F,
    store: S,
    _values: PhantomData<fn() -> V>,
}

impl<F, Fut, V, S> AsyncCachedFunction<F, V, S>
where
    F: Fn(&Args) -> Fut,
    Fut: Future<Output = V>,
    S: Store<V>,
{
    pub fn new(func: F, store: S) -> Self {
        AsyncCachedFunction {
            func,
            store,
            _values: PhantomData,
        }
    }

    /// Invoke through the cache, awaiting the user function only on a
    /// miss.
    pub async fn call(&self, args: &Args) -> V {
        if let Some(value) = self.store.get(args) {
            return value;
        }
        let value = (self.func)(args).await;
        self.store.set(args, &value);
        value
    }
}

impl<F, V, S: Store<V>> AsyncCachedFunction<F, V, S> {
    /// Lookup half of [`AsyncCachedFunction::call`].
    pub fn get(&self, args: &Args) -> Option<V> {
        self.store.get(args)
    }

    /// Store half of [`AsyncCachedFunction::call`].
    pub fn set(&self, args: &Args, value: &V) {
        self.store.set(args, value)
    }

    /// Statistics snapshot of the underlying store.
    pub fn cache_info(&self) -> S::Info {
        self.store.info()
    }

    /// Drop every cached entry and reset statistics.
    pub fn cache_clear(&self) {
        self.store.clear()
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }
}

//! Synchronous cached-function wrapper.

use std::marker::PhantomData;

use super::Store;
use crate::key::Args;

/// A user function plus the store that memoizes it.
///
/// `call` is the decorated invocation; `get`/`set` expose the two halves
/// separately (the async wrapper and tests drive them directly).
pub struct CachedFunction<F, V, S> {
    func: F,
    store: S,
    _values: PhantomData<fn() -> V>,
}

impl<F, V, S> CachedFunction<F, V, S>
where
    F: Fn(&Args) -> V,
    S: Store<V>,
{
    pub fn new(func: F, store: S) -> Self {
        CachedFunction {
            func,
            store,
            _values: PhantomData,
        }
    }

    /// Invoke through the cache: return the cached value on a hit, else
    /// compute, store, and return.
    ///
    /// If the function panics nothing is stored; the store has already
    /// released its lookup lock and stays consistent.
    pub fn call(&self, args: &Args) -> V {
        if let Some(value) = self.store.get(args) {
            return value;
        }
        let value = (self.func)(args);
        self.store.set(args, &value);
        value
    }

    /// Lookup half of [`CachedFunction::call`].
    pub fn get(&self, args: &Args) -> Option<V> {
        self.store.get(args)
    }

    /// Store half of [`CachedFunction::call`].
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use crate::policy::Strategy;
    use std::sync::atomic::{AtomicU64, Ordering};

    fn adder(calls: &AtomicU64) -> impl Fn(&Args) -> i64 + '_ {
        move |args| {
            calls.fetch_add(1, Ordering::Relaxed);
            match (&args.positional()[0], &args.positional()[1]) {
                (crate::ArgValue::Int(a), crate::ArgValue::Int(b)) => a + b,
                _ => unreachable!("adder is only called with two ints"),
            }
        }
    }

    #[test]
    fn call_computes_once_per_key() {
        let calls = AtomicU64::new(0);
        let cached = CachedFunction::new(
            adder(&calls),
            MemoryStore::new(Strategy::Lru, 128, None).unwrap(),
        );

        let args = Args::new().arg(1).arg(2);
        assert_eq!(cached.call(&args), 3);
        assert_eq!(cached.call(&args), 3);
        assert_eq!(calls.load(Ordering::Relaxed), 1);

        assert_eq!(cached.call(&Args::new().arg(2).arg(3)), 5);
        assert_eq!(calls.load(Ordering::Relaxed), 2);

        let info = cached.cache_info();
        assert_eq!(info.hits, 1);
        assert_eq!(info.misses, 2);
        assert_eq!(info.current_size, 2);
    }

    #[test]
    fn get_and_set_bypass_compute() {
        let calls = AtomicU64::new(0);
        let cached = CachedFunction::new(
            adder(&calls),
            MemoryStore::new(Strategy::Lru, 128, None).unwrap(),
        );

        let args = Args::new().arg(4).arg(4);
        assert_eq!(cached.get(&args), None);
        cached.set(&args, &8);
        assert_eq!(cached.call(&args), 8);
        // Seeding through `set` means the function never ran.
        assert_eq!(calls.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn clear_forces_recompute() {
        let calls = AtomicU64::new(0);
        let cached = CachedFunction::new(
            adder(&calls),
            MemoryStore::new(Strategy::Lru, 128, None).unwrap(),
        );

        let args = Args::new().arg(1).arg(1);
        cached.call(&args);
        cached.cache_clear();
        cached.call(&args);
        assert_eq!(calls.load(Ordering::Relaxed), 2);
    }
}

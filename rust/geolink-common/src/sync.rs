//! Cross-target bounds and shared state.
//!
//! Browser builds are single threaded, so requiring `Send` of an
//! authenticator future there would rule out every `JsFuture`. Native builds
//! (backend verifiers, test harnesses) do share state across threads. The
//! traits below resolve to `Send`/`Send + Sync` natively and to nothing on
//! wasm.

pub use bounds::{ConditionalSend, ConditionalSync};

#[cfg(not(target_arch = "wasm32"))]
mod bounds {
    /// `Send` on native targets.
    pub trait ConditionalSend: Send {}
    impl<T: Send> ConditionalSend for T {}

    /// `Send + Sync` on native targets.
    pub trait ConditionalSync: Send + Sync {}
    impl<T: Send + Sync> ConditionalSync for T {}
}

#[cfg(target_arch = "wasm32")]
mod bounds {
    /// No bound in the browser.
    pub trait ConditionalSend {}
    impl<T> ConditionalSend for T {}

    /// No bound in the browser.
    pub trait ConditionalSync {}
    impl<T> ConditionalSync for T {}
}

/// Interior-mutable state that can sit behind a shared reference.
///
/// Backed by an `RwLock` natively and a `RefCell` on wasm. Used for the
/// nonce ledger and the in-memory authenticator's credential store, which
/// are handed out as `&T` but record every ceremony or consumed nonce.
///
/// ```
/// use geolink_common::SharedCell;
///
/// let used = SharedCell::new(Vec::<u32>::new());
/// used.write().push(7);
/// assert_eq!(used.read().as_slice(), &[7]);
/// ```
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Default)]
pub struct SharedCell<T>(std::sync::RwLock<T>);

#[cfg(not(target_arch = "wasm32"))]
impl<T> SharedCell<T> {
    /// Wrap `value`.
    pub fn new(value: T) -> Self {
        Self(std::sync::RwLock::new(value))
    }

    /// Shared access, blocking while a writer holds the lock.
    pub fn read(&self) -> std::sync::RwLockReadGuard<'_, T> {
        self.0.read().expect("lock poisoned")
    }

    /// Exclusive access, blocking while any other guard is alive.
    pub fn write(&self) -> std::sync::RwLockWriteGuard<'_, T> {
        self.0.write().expect("lock poisoned")
    }
}

/// See the native definition; wasm has one thread, so a `RefCell` suffices.
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Default)]
pub struct SharedCell<T>(std::cell::RefCell<T>);

#[cfg(target_arch = "wasm32")]
impl<T> SharedCell<T> {
    /// Wrap `value`.
    pub fn new(value: T) -> Self {
        Self(std::cell::RefCell::new(value))
    }

    /// Shared access.
    ///
    /// # Panics
    /// Panics if the value is currently borrowed mutably.
    pub fn read(&self) -> std::cell::Ref<'_, T> {
        self.0.borrow()
    }

    /// Exclusive access.
    ///
    /// # Panics
    /// Panics if the value is currently borrowed.
    pub fn write(&self) -> std::cell::RefMut<'_, T> {
        self.0.borrow_mut()
    }
}

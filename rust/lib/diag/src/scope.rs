//! Lifecycle scope for the error surface.
//!
//! The app shell enters an [`ErrorScope`] once at startup. Code running on
//! that thread inside the scope reaches the surface with [`use_error`].
//! Calling it with no scope entered is a wiring defect and panics.

use std::cell::RefCell;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::surface::ErrorSurface;

thread_local! {
    static SCOPES: RefCell<Vec<Arc<ErrorSurface>>> = const { RefCell::new(Vec::new()) };
}

/// Guard that makes a surface current on this thread until dropped.
///
/// Scopes nest: the innermost one wins. Not `Send`, since it is tied to the
/// thread-local stack it pushed onto.
pub struct ErrorScope {
    surface: Arc<ErrorSurface>,
    _not_send: PhantomData<*const ()>,
}

impl ErrorScope {
    pub fn enter(surface: Arc<ErrorSurface>) -> Self {
        SCOPES.with(|scopes| scopes.borrow_mut().push(surface.clone()));
        Self {
            surface,
            _not_send: PhantomData,
        }
    }

    pub fn surface(&self) -> &Arc<ErrorSurface> {
        &self.surface
    }
}

impl Drop for ErrorScope {
    fn drop(&mut self) {
        SCOPES.with(|scopes| {
            let mut scopes = scopes.borrow_mut();
            if let Some(pos) = scopes.iter().rposition(|s| Arc::ptr_eq(s, &self.surface)) {
                scopes.remove(pos);
            }
        });
    }
}

/// The innermost surface on this thread, if a scope is entered.
pub fn try_use_error() -> Option<Arc<ErrorSurface>> {
    SCOPES.with(|scopes| scopes.borrow().last().cloned())
}

/// The innermost surface on this thread.
///
/// # Panics
///
/// Panics if no [`ErrorScope`] is entered on this thread.
pub fn use_error() -> Arc<ErrorSurface> {
    match try_use_error() {
        Some(surface) => surface,
        None => panic!("use_error must be used within an ErrorScope"),
    }
}

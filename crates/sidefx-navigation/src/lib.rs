#![allow(non_snake_case)]
//! Back navigation.
//!
//! A [`BackDispatcher`] is handed to screens as a capability; the host calls
//! [`BackDispatcher::on_back_pressed`] when the user presses back. Screens
//! register [`BackCallback`]s, usually through [`BackHandler`], and the most
//! recently added enabled callback handles the press.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use smallvec::SmallVec;

use sidefx_core::{disposable_effect, on_unmount, remember, remember_updated_state};

struct CallbackInner {
    enabled: Cell<bool>,
    handler: Rc<dyn Fn()>,
    dispatchers: RefCell<SmallVec<[Weak<DispatcherState>; 1]>>,
}

/// A handler for back presses. Clones share the same registration.
#[derive(Clone)]
pub struct BackCallback {
    inner: Rc<CallbackInner>,
}

impl BackCallback {
    pub fn new(enabled: bool, handler: impl Fn() + 'static) -> Self {
        Self {
            inner: Rc::new(CallbackInner {
                enabled: Cell::new(enabled),
                handler: Rc::new(handler),
                dispatchers: RefCell::new(SmallVec::new()),
            }),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.enabled.get()
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.inner.enabled.set(enabled);
    }

    /// Detaches this callback from every dispatcher it was added to.
    pub fn remove(&self) {
        let dispatchers = std::mem::take(&mut *self.inner.dispatchers.borrow_mut());
        for state in dispatchers.iter().filter_map(Weak::upgrade) {
            state
                .callbacks
                .borrow_mut()
                .retain(|cb| !Rc::ptr_eq(&cb.inner, &self.inner));
        }
    }

    fn handle(&self) {
        (self.inner.handler)();
    }
}

#[derive(Default)]
struct DispatcherState {
    // Registration order; the last enabled entry wins.
    callbacks: RefCell<Vec<BackCallback>>,
}

/// Routes back presses to registered callbacks.
///
/// Equality is identity, so a dispatcher can key an effect.
#[derive(Clone, Default)]
pub struct BackDispatcher {
    state: Rc<DispatcherState>,
}

impl BackDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_callback(&self, callback: &BackCallback) {
        let mut callbacks = self.state.callbacks.borrow_mut();
        if callbacks.iter().any(|cb| Rc::ptr_eq(&cb.inner, &callback.inner)) {
            log::debug!("back callback already registered; moving it to the top");
            callbacks.retain(|cb| !Rc::ptr_eq(&cb.inner, &callback.inner));
        } else {
            callback
                .inner
                .dispatchers
                .borrow_mut()
                .push(Rc::downgrade(&self.state));
        }
        callbacks.push(callback.clone());
    }

    /// Invokes the most recently added enabled callback.
    /// Returns false when no callback handled the press.
    pub fn on_back_pressed(&self) -> bool {
        let target = self
            .state
            .callbacks
            .borrow()
            .iter()
            .rev()
            .find(|cb| cb.is_enabled())
            .cloned();
        match target {
            Some(cb) => {
                cb.handle();
                true
            }
            None => {
                log::trace!("back press not handled");
                false
            }
        }
    }

    pub fn has_enabled_callbacks(&self) -> bool {
        self.state.callbacks.borrow().iter().any(BackCallback::is_enabled)
    }

    pub fn callback_count(&self) -> usize {
        self.state.callbacks.borrow().len()
    }
}

impl PartialEq for BackDispatcher {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.state, &other.state)
    }
}

/// Handles back presses while this call site is in the composition.
///
/// `on_back` may change between passes without re-registering; the
/// registration follows `dispatcher` and is removed when the call site leaves.
pub fn BackHandler(dispatcher: &BackDispatcher, enabled: bool, on_back: impl Fn() + 'static) {
    let latest = remember_updated_state::<Rc<dyn Fn()>>(Rc::new(on_back));
    let callback = remember(|| BackCallback::new(enabled, move || (latest.get())()));
    callback.set_enabled(enabled);

    let callback = (*callback).clone();
    let target = dispatcher.clone();
    disposable_effect!(dispatcher.clone(), move || {
        target.add_callback(&callback);
        on_unmount(move || callback.remove())
    });
}

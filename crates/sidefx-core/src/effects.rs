use std::cell::RefCell;
use std::rc::Rc;

/// A cleanup callback that runs at most once.
#[derive(Clone)]
pub struct Dispose(Rc<RefCell<Option<Box<dyn FnOnce()>>>>);

impl Dispose {
    pub fn new(f: impl FnOnce() + 'static) -> Self {
        Self(Rc::new(RefCell::new(Some(Box::new(f)))))
    }

    pub fn noop() -> Self {
        Self(Rc::new(RefCell::new(None)))
    }

    /// Runs at most once (safe to call multiple times).
    pub fn run(&self) {
        let f = self.0.borrow_mut().take();
        if let Some(f) = f {
            f()
        }
    }

    pub fn is_pending(&self) -> bool {
        self.0.borrow().is_some()
    }
}

/// Runs the wrapped [`Dispose`] when dropped.
pub struct DisposeOnDrop(pub Dispose);

impl Drop for DisposeOnDrop {
    fn drop(&mut self) {
        self.0.run();
    }
}

/// Runs `f()` immediately and returns its `Dispose`.
///
/// The cleanup is also registered with the current scope, so it runs when
/// the owning composition is disposed.
pub fn effect<F>(f: F) -> Dispose
where
    F: FnOnce() -> Dispose + 'static,
{
    let d = f();

    if let Some(scope) = crate::scope::current_scope() {
        let d2 = d.clone();
        scope.add_disposer(move || d2.run());
    }

    d
}

/// Helper to register cleanup inside an effect.
pub fn on_unmount(f: impl FnOnce() + 'static) -> Dispose {
    Dispose::new(f)
}

use std::cell::RefCell;
use std::rc::{Rc, Weak};

thread_local! {
    static CURRENT_SCOPE: RefCell<Option<Weak<ScopeInner>>> = const { RefCell::new(None) };
}

/// Owner of teardown callbacks. Each composition has one root scope,
/// disposed together with the composition.
pub struct Scope {
    inner: Rc<ScopeInner>,
}

struct ScopeInner {
    disposers: RefCell<Vec<Box<dyn FnOnce()>>>,
    children: RefCell<Vec<Scope>>,
}

impl Scope {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(ScopeInner {
                disposers: RefCell::new(Vec::new()),
                children: RefCell::new(Vec::new()),
            }),
        }
    }

    pub fn run<R>(&self, f: impl FnOnce() -> R) -> R {
        let prev = CURRENT_SCOPE.with(|current| {
            current
                .borrow_mut()
                .replace(Rc::downgrade(&self.inner))
        });
        let result = f();
        CURRENT_SCOPE.with(|current| *current.borrow_mut() = prev);
        result
    }

    pub fn add_disposer(&self, disposer: impl FnOnce() + 'static) {
        self.inner.disposers.borrow_mut().push(Box::new(disposer));
    }

    pub fn child(&self) -> Scope {
        let child = Scope::new();
        self.inner.children.borrow_mut().push(child.clone());
        child
    }

    /// Disposes children first, then runs this scope's disposers in
    /// registration order.
    pub fn dispose(&self) {
        self.inner.dispose();
    }
}

impl ScopeInner {
    fn dispose(&self) {
        let children = std::mem::take(&mut *self.children.borrow_mut());
        for child in children {
            child.dispose();
        }

        let disposers = std::mem::take(&mut *self.disposers.borrow_mut());
        for disposer in disposers {
            disposer();
        }
    }
}

impl Default for Scope {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for Scope {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl Drop for ScopeInner {
    fn drop(&mut self) {
        self.dispose();
    }
}

pub fn current_scope() -> Option<Scope> {
    CURRENT_SCOPE.with(|current| {
        current
            .borrow()
            .as_ref()
            .and_then(|weak| weak.upgrade().map(|inner| Scope { inner }))
    })
}

use std::cell::RefCell;
use std::rc::Rc;

use smallvec::SmallVec;

use crate::reactive::{self, SignalId};

pub type SubId = usize;

type Subscriber<T> = Rc<dyn Fn(&T)>;

/// Observable value. Clones share the same cell.
pub struct Signal<T: 'static>(Rc<Inner<T>>);

struct Inner<T: 'static> {
    id: SignalId,
    value: RefCell<T>,
    subs: RefCell<SmallVec<[(SubId, Subscriber<T>); 2]>>,
    next_sub: std::cell::Cell<SubId>,
}

impl<T> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T> Signal<T> {
    pub fn new(value: T) -> Self {
        Self(Rc::new(Inner {
            id: reactive::next_signal_id(),
            value: RefCell::new(value),
            subs: RefCell::new(SmallVec::new()),
            next_sub: std::cell::Cell::new(0),
        }))
    }

    pub fn id(&self) -> SignalId {
        self.0.id
    }

    pub fn get(&self) -> T
    where
        T: Clone,
    {
        reactive::register_signal_read(self.0.id);
        self.0.value.borrow().clone()
    }

    /// Reads without registering a dependency.
    pub fn get_untracked(&self) -> T
    where
        T: Clone,
    {
        self.0.value.borrow().clone()
    }

    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        reactive::register_signal_read(self.0.id);
        f(&self.0.value.borrow())
    }

    pub fn set(&self, v: T) {
        *self.0.value.borrow_mut() = v;
        self.notify();
    }

    pub fn update<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let result = f(&mut self.0.value.borrow_mut());
        self.notify();
        result
    }

    pub fn subscribe(&self, f: impl Fn(&T) + 'static) -> SubId {
        let id = self.0.next_sub.get();
        self.0.next_sub.set(id + 1);
        self.0.subs.borrow_mut().push((id, Rc::new(f)));
        id
    }

    pub fn unsubscribe(&self, id: SubId) -> bool {
        let mut subs = self.0.subs.borrow_mut();
        let before = subs.len();
        subs.retain(|(sub, _)| *sub != id);
        subs.len() != before
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    fn notify(&self) {
        // Snapshot so subscribers may (un)subscribe while being notified.
        let subs: SmallVec<[Subscriber<T>; 2]> =
            self.0.subs.borrow().iter().map(|(_, s)| s.clone()).collect();
        for sub in subs {
            let value = self.0.value.borrow();
            sub(&value);
        }
        reactive::signal_changed(self.0.id);
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signal")
            .field("id", &self.0.id)
            .field("value", &*self.0.value.borrow())
            .finish()
    }
}

pub fn signal<T>(t: T) -> Signal<T> {
    Signal::new(t)
}

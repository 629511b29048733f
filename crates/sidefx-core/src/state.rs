use std::cell::RefCell;
use std::future::Future;
use std::rc::Rc;

use crate::coroutine::CoroutineScope;
use crate::effects::{Dispose, DisposeOnDrop};
use crate::effects_ext::launched_effect_internal;
use crate::runtime::{remember_latest, remember_with_key};
use crate::signal::{Signal, signal};

/// Read-only view of a signal.
pub struct State<T: 'static> {
    signal: Signal<T>,
}

impl<T> Clone for State<T> {
    fn clone(&self) -> Self {
        Self {
            signal: self.signal.clone(),
        }
    }
}

impl<T> State<T> {
    pub fn get(&self) -> T
    where
        T: Clone,
    {
        self.signal.get()
    }

    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.signal.with(f)
    }

    pub fn subscribe(&self, f: impl Fn(&T) + 'static) -> crate::signal::SubId {
        self.signal.subscribe(f)
    }
}

impl<T> From<Signal<T>> for State<T> {
    fn from(signal: Signal<T>) -> Self {
        Self { signal }
    }
}

/// Cell holding the value passed on the most recent pass.
///
/// Long-running tasks read it at the moment of use, so swapping the value
/// does not require restarting them.
pub struct UpdatedState<T> {
    cell: Rc<RefCell<T>>,
}

impl<T> Clone for UpdatedState<T> {
    fn clone(&self) -> Self {
        Self {
            cell: self.cell.clone(),
        }
    }
}

impl<T> UpdatedState<T> {
    pub fn get(&self) -> T
    where
        T: Clone,
    {
        self.cell.borrow().clone()
    }

    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.cell.borrow())
    }
}

pub fn remember_updated_state<T: 'static>(value: T) -> UpdatedState<T> {
    UpdatedState {
        cell: remember_latest(value),
    }
}

/// Handle given to a `produce_state` producer.
pub struct ProduceStateScope<T: 'static> {
    value: Signal<T>,
    scope: CoroutineScope,
}

impl<T> ProduceStateScope<T> {
    /// Publishes a new value. Ignored once this producer has been cancelled.
    pub fn set_value(&self, v: T) {
        if self.scope.is_active() {
            self.value.set(v);
        } else {
            log::debug!("produce_state: dropping value from a cancelled producer");
        }
    }

    pub fn value(&self) -> T
    where
        T: Clone,
    {
        self.value.get_untracked()
    }

    pub fn coroutine_scope(&self) -> &CoroutineScope {
        &self.scope
    }

    /// Suspends until the producer is cancelled, then runs `on_dispose`.
    pub async fn await_dispose(&self, on_dispose: impl FnOnce() + 'static) {
        let _guard = DisposeOnDrop(Dispose::new(on_dispose));
        std::future::pending::<()>().await;
    }
}

/// Internal implementation of [`produce_state!`](crate::produce_state).
///
/// The returned state starts at `initial`. Whenever `key` changes the state
/// is reset to `initial` during the same pass and the producer is restarted;
/// the run for the previous key is cancelled and can no longer write.
pub fn produce_state_internal<T, K, F, Fut>(
    callsite: &'static str,
    initial: T,
    key: K,
    producer: F,
) -> State<T>
where
    T: Clone + 'static,
    K: PartialEq + Clone + 'static,
    F: FnOnce(ProduceStateScope<T>) -> Fut + 'static,
    Fut: Future<Output = ()> + 'static,
{
    let value = remember_with_key(format!("produce:{callsite}:value"), || {
        signal(initial.clone())
    });
    let last_key = remember_with_key(format!("produce:{callsite}:key"), || {
        RefCell::new(None::<K>)
    });

    let restarted = last_key.borrow().as_ref().is_some_and(|k| k != &key);
    if restarted {
        value.set(initial);
    }
    *last_key.borrow_mut() = Some(key.clone());

    let holder: Signal<T> = (*value).clone();
    launched_effect_internal(callsite, key, move |scope| {
        producer(ProduceStateScope {
            value: holder,
            scope,
        })
    });

    State {
        signal: (*value).clone(),
    }
}

#[macro_export]
macro_rules! produce_state {
    ($initial:expr, $key:expr, $producer:expr) => {
        $crate::state::produce_state_internal(
            concat!(module_path!(), ":", line!(), ":", column!()),
            $initial,
            $key,
            $producer,
        )
    };
}

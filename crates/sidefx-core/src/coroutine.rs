use std::cell::{Cell, RefCell};
use std::future::Future;
use std::rc::Rc;

use crate::error::RuntimeError;
use crate::executor::{Job, RuntimeHandle};
use crate::runtime::{composition_runtime, remember};

/// Launches tasks on a runtime and cancels all of them together.
#[derive(Clone)]
pub struct CoroutineScope {
    runtime: RuntimeHandle,
    inner: Rc<ScopeState>,
}

struct ScopeState {
    active: Cell<bool>,
    jobs: RefCell<Vec<Job>>,
}

impl CoroutineScope {
    pub fn new(runtime: RuntimeHandle) -> Self {
        Self {
            runtime,
            inner: Rc::new(ScopeState {
                active: Cell::new(true),
                jobs: RefCell::new(Vec::new()),
            }),
        }
    }

    pub fn launch(&self, future: impl Future<Output = ()> + 'static) -> Result<Job, RuntimeError> {
        if !self.is_active() {
            return Err(RuntimeError::ScopeCancelled);
        }
        let job = self.runtime.spawn(future)?;
        let mut jobs = self.inner.jobs.borrow_mut();
        jobs.retain(Job::is_active);
        jobs.push(job.clone());
        Ok(job)
    }

    /// Cancels every job launched from this scope. Later launches fail.
    pub fn cancel(&self) {
        if !self.inner.active.replace(false) {
            return;
        }
        let jobs = std::mem::take(&mut *self.inner.jobs.borrow_mut());
        log::trace!("cancelling coroutine scope with {} job(s)", jobs.len());
        for job in jobs {
            job.cancel();
        }
    }

    pub fn is_active(&self) -> bool {
        self.inner.active.get()
    }

    pub fn active_jobs(&self) -> usize {
        self.inner
            .jobs
            .borrow()
            .iter()
            .filter(|j| j.is_active())
            .count()
    }

    pub fn runtime(&self) -> RuntimeHandle {
        self.runtime.clone()
    }
}

struct ScopeOwner(CoroutineScope);

impl Drop for ScopeOwner {
    fn drop(&mut self) {
        self.0.cancel();
    }
}

/// A scope tied to this call site: every job it launched is cancelled when
/// the call site leaves the composition.
pub fn remember_coroutine_scope() -> CoroutineScope {
    let runtime = composition_runtime();
    remember(|| ScopeOwner(CoroutineScope::new(runtime))).0.clone()
}

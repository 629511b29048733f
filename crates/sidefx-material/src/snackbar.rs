use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::future::poll_fn;
use std::rc::Rc;
use std::task::{Poll, Waker};
use std::time::Duration;

use futures::channel::oneshot;
use futures::future::{Either, select};

use sidefx_core::{Signal, delay, remember, signal};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SnackbarDuration {
    Short,
    Long,
    Indefinite,
}

impl SnackbarDuration {
    /// `None` for snackbars that stay until dismissed.
    pub fn timeout(self) -> Option<Duration> {
        match self {
            SnackbarDuration::Short => Some(Duration::from_secs(4)),
            SnackbarDuration::Long => Some(Duration::from_secs(10)),
            SnackbarDuration::Indefinite => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SnackbarResult {
    Dismissed,
    ActionPerformed,
}

/// What the host currently shows.
#[derive(Clone, Debug, PartialEq)]
pub struct SnackbarData {
    pub id: u64,
    pub message: String,
    pub action_label: Option<String>,
    pub duration: SnackbarDuration,
}

struct HostInner {
    current: Signal<Option<SnackbarData>>,
    reply: RefCell<Option<(u64, oneshot::Sender<SnackbarResult>)>>,
    // Callers waiting their turn, front is showing.
    queue: RefCell<VecDeque<u64>>,
    wakers: RefCell<HashMap<u64, Waker>>,
    next_id: Cell<u64>,
}

/// Shows one snackbar at a time; later requests wait in FIFO order.
#[derive(Clone)]
pub struct SnackbarHostState {
    inner: Rc<HostInner>,
}

impl Default for SnackbarHostState {
    fn default() -> Self {
        Self::new()
    }
}

impl SnackbarHostState {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(HostInner {
                current: signal(None),
                reply: RefCell::new(None),
                queue: RefCell::new(VecDeque::new()),
                wakers: RefCell::new(HashMap::new()),
                next_id: Cell::new(0),
            }),
        }
    }

    /// Shows a snackbar and suspends until it is dismissed, its action is
    /// performed or its duration runs out.
    ///
    /// Dropping the returned future takes the snackbar down (or out of the
    /// queue if it was still waiting).
    pub async fn show_snackbar(
        &self,
        message: impl Into<String>,
        action_label: Option<String>,
        duration: SnackbarDuration,
    ) -> SnackbarResult {
        let id = self.inner.next_id.get();
        self.inner.next_id.set(id + 1);
        self.inner.queue.borrow_mut().push_back(id);
        let _turn = Turn {
            inner: self.inner.clone(),
            id,
        };

        poll_fn(|cx| {
            if self.inner.queue.borrow().front() == Some(&id) {
                Poll::Ready(())
            } else {
                self.inner.wakers.borrow_mut().insert(id, cx.waker().clone());
                Poll::Pending
            }
        })
        .await;

        let (tx, rx) = oneshot::channel();
        *self.inner.reply.borrow_mut() = Some((id, tx));
        let data = SnackbarData {
            id,
            message: message.into(),
            action_label,
            duration,
        };
        log::debug!("showing snackbar {id}: {:?}", data.message);
        self.inner.current.set(Some(data));

        let result = match duration.timeout() {
            Some(timeout) => match select(rx, delay(timeout)).await {
                Either::Left((reply, _)) => reply.unwrap_or(SnackbarResult::Dismissed),
                Either::Right(_) => SnackbarResult::Dismissed,
            },
            None => rx.await.unwrap_or(SnackbarResult::Dismissed),
        };
        log::debug!("snackbar {id} finished: {result:?}");
        result
    }

    /// The snackbar being shown. Tracked, so a composition reading it updates
    /// when it changes.
    pub fn current_snackbar(&self) -> Option<SnackbarData> {
        self.inner.current.get()
    }

    pub fn dismiss(&self) {
        self.reply(SnackbarResult::Dismissed);
    }

    pub fn perform_action(&self) {
        self.reply(SnackbarResult::ActionPerformed);
    }

    /// Callers showing or waiting to show a snackbar.
    pub fn pending_count(&self) -> usize {
        self.inner.queue.borrow().len()
    }

    fn reply(&self, result: SnackbarResult) {
        let reply = self.inner.reply.borrow_mut().take();
        if let Some((_, tx)) = reply {
            let _ = tx.send(result);
        }
    }
}

/// Leaves the queue on drop and lets the next caller through.
struct Turn {
    inner: Rc<HostInner>,
    id: u64,
}

impl Drop for Turn {
    fn drop(&mut self) {
        let showing = self.inner.queue.borrow().front() == Some(&self.id);
        self.inner.queue.borrow_mut().retain(|id| *id != self.id);
        self.inner.wakers.borrow_mut().remove(&self.id);
        if !showing {
            return;
        }

        let reply = self.inner.reply.borrow_mut().take();
        drop(reply);
        let shown = self
            .inner
            .current
            .get_untracked()
            .is_some_and(|d| d.id == self.id);
        if shown {
            self.inner.current.set(None);
        }

        let next = self.inner.queue.borrow().front().copied();
        let waker = next.and_then(|id| self.inner.wakers.borrow_mut().remove(&id));
        if let Some(waker) = waker {
            waker.wake();
        }
    }
}

pub fn remember_snackbar_host_state() -> SnackbarHostState {
    (*remember(SnackbarHostState::new)).clone()
}

//! Single-threaded task executor.
//!
//! Every future spawned here runs on the thread that owns the [`Runtime`],
//! so tasks may capture `Rc`/`RefCell` state freely. Wakers are thread-safe:
//! they only push the task key onto a shared ready queue, which lets
//! background threads (see [`background`]) resume a task without touching
//! UI state.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::future::Future;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::pin::Pin;
use std::rc::{Rc, Weak};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::task::{Context, Poll, Waker};
use std::time::Duration;

use futures::task::ArcWake;
use parking_lot::{Condvar, Mutex};
use slotmap::{SlotMap, new_key_type};
use web_time::Instant;

use crate::clock::{Clock, SystemClock};
use crate::error::RuntimeError;

new_key_type! {
    pub struct TaskKey;
}

new_key_type! {
    struct TimerKey;
}

type LocalFuture = Pin<Box<dyn Future<Output = ()> + 'static>>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JobStatus {
    Active,
    Completed,
    Cancelled,
}

struct TaskEntry {
    // Taken out while the task is being polled.
    future: Option<LocalFuture>,
    status: Rc<Cell<JobStatus>>,
}

struct TimerEntry {
    deadline: Instant,
    waker: Option<Waker>,
    fired: bool,
}

#[derive(Default)]
struct ReadyQueue {
    queue: Mutex<VecDeque<TaskKey>>,
}

impl ReadyQueue {
    fn push(&self, key: TaskKey) {
        let mut queue = self.queue.lock();
        if !queue.contains(&key) {
            queue.push_back(key);
        }
    }

    fn pop(&self) -> Option<TaskKey> {
        self.queue.lock().pop_front()
    }

    fn is_empty(&self) -> bool {
        self.queue.lock().is_empty()
    }
}

struct TaskWaker {
    key: TaskKey,
    ready: Arc<ReadyQueue>,
}

impl ArcWake for TaskWaker {
    fn wake_by_ref(arc_self: &Arc<Self>) {
        arc_self.ready.push(arc_self.key);
    }
}

#[derive(Default)]
struct BackgroundCounts {
    in_flight: usize,
    finished: u64,
}

#[derive(Default)]
struct BackgroundShared {
    counts: Mutex<BackgroundCounts>,
    changed: Condvar,
}

impl BackgroundShared {
    fn start(&self) {
        self.counts.lock().in_flight += 1;
    }

    fn abandon(&self) {
        self.counts.lock().in_flight -= 1;
    }

    fn finish(&self) {
        let mut counts = self.counts.lock();
        counts.in_flight -= 1;
        counts.finished += 1;
        self.changed.notify_all();
    }
}

struct BackgroundLink {
    shared: Arc<BackgroundShared>,
    // Finished count already reported by `wait_for_background`.
    seen: Cell<u64>,
}

struct RuntimeInner {
    clock: Arc<dyn Clock>,
    tasks: RefCell<SlotMap<TaskKey, TaskEntry>>,
    ready: Arc<ReadyQueue>,
    timers: RefCell<SlotMap<TimerKey, TimerEntry>>,
    background: BackgroundLink,
}

impl RuntimeInner {
    fn spawn(&self, future: LocalFuture) -> (TaskKey, Rc<Cell<JobStatus>>) {
        let status = Rc::new(Cell::new(JobStatus::Active));
        let key = self.tasks.borrow_mut().insert(TaskEntry {
            future: Some(future),
            status: status.clone(),
        });
        self.ready.push(key);
        log::trace!("spawned task {key:?}");
        (key, status)
    }

    fn cancel_task(&self, key: TaskKey) {
        // Release the borrow before the future is dropped: its destructor may
        // cancel other tasks.
        let removed = self.tasks.borrow_mut().remove(key);
        if let Some(entry) = removed {
            entry.status.set(JobStatus::Cancelled);
            log::trace!("cancelled task {key:?}");
            drop(entry);
        }
    }

    fn poll_ready(&self) -> bool {
        let mut progressed = false;
        while let Some(key) = self.ready.pop() {
            let taken = {
                let mut tasks = self.tasks.borrow_mut();
                tasks
                    .get_mut(key)
                    .and_then(|entry| entry.future.take().map(|f| (f, entry.status.clone())))
            };
            let Some((mut future, status)) = taken else {
                continue;
            };
            progressed = true;

            let waker = futures::task::waker(Arc::new(TaskWaker {
                key,
                ready: self.ready.clone(),
            }));
            let mut cx = Context::from_waker(&waker);
            match future.as_mut().poll(&mut cx) {
                Poll::Ready(()) => {
                    let finished = self.tasks.borrow_mut().remove(key);
                    drop(finished);
                    if status.get() == JobStatus::Active {
                        status.set(JobStatus::Completed);
                    }
                    log::trace!("task {key:?} completed");
                }
                Poll::Pending => {
                    let orphan = {
                        let mut tasks = self.tasks.borrow_mut();
                        match tasks.get_mut(key) {
                            Some(entry) => {
                                entry.future = Some(future);
                                None
                            }
                            // Cancelled from inside its own poll.
                            None => Some(future),
                        }
                    };
                    drop(orphan);
                }
            }
        }
        progressed
    }

    fn register_timer(&self, deadline: Instant, waker: Waker) -> TimerKey {
        self.timers.borrow_mut().insert(TimerEntry {
            deadline,
            waker: Some(waker),
            fired: false,
        })
    }

    /// `Some(true)` once fired, `Some(false)` while pending, `None` if unknown.
    fn poll_timer(&self, key: TimerKey, waker: &Waker) -> Option<bool> {
        let mut timers = self.timers.borrow_mut();
        let entry = timers.get_mut(key)?;
        if entry.fired {
            return Some(true);
        }
        entry.waker = Some(waker.clone());
        Some(false)
    }

    fn cancel_timer(&self, key: TimerKey) {
        self.timers.borrow_mut().remove(key);
    }

    fn fire_due_timers(&self) -> bool {
        let now = self.clock.now();
        let due: Vec<Waker> = {
            let mut timers = self.timers.borrow_mut();
            timers
                .values_mut()
                .filter(|t| !t.fired && t.deadline <= now)
                .filter_map(|t| {
                    t.fired = true;
                    t.waker.take()
                })
                .collect()
        };
        let fired = !due.is_empty();
        for waker in due {
            waker.wake();
        }
        fired
    }

    fn next_deadline(&self) -> Option<Instant> {
        self.timers
            .borrow()
            .values()
            .filter(|t| !t.fired)
            .map(|t| t.deadline)
            .min()
    }
}

/// Owns the task queue, timers and the clock. Dropping it drops every task.
pub struct Runtime {
    inner: Rc<RuntimeInner>,
}

impl Runtime {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        let inner = Rc::new(RuntimeInner {
            clock,
            tasks: RefCell::new(SlotMap::with_key()),
            ready: Arc::new(ReadyQueue::default()),
            timers: RefCell::new(SlotMap::with_key()),
            background: BackgroundLink {
                shared: Arc::default(),
                seen: Cell::new(0),
            },
        });
        let runtime = Self { inner };
        let handle = runtime.handle();
        LAST_RUNTIME.with(|slot| *slot.borrow_mut() = Some(handle));
        runtime
    }

    pub fn with_system_clock() -> Self {
        Self::new(Arc::new(SystemClock))
    }

    pub fn handle(&self) -> RuntimeHandle {
        RuntimeHandle {
            inner: Rc::downgrade(&self.inner),
        }
    }

    pub fn clock(&self) -> Arc<dyn Clock> {
        self.inner.clock.clone()
    }

    pub fn now(&self) -> Instant {
        self.inner.clock.now()
    }

    pub fn spawn(&self, future: impl Future<Output = ()> + 'static) -> Job {
        let (key, status) = self.inner.spawn(Box::pin(future));
        Job {
            key,
            status,
            runtime: self.handle(),
        }
    }

    /// Fires due timers and polls ready tasks until nothing makes progress.
    /// Returns whether any task ran.
    pub fn run_until_idle(&self) -> bool {
        let handle = self.handle();
        ACTIVE_RUNTIMES.with(|stack| stack.borrow_mut().push(handle.clone()));
        LAST_RUNTIME.with(|slot| *slot.borrow_mut() = Some(handle));
        let _guard = ActiveRuntimeGuard;

        let mut ran = false;
        loop {
            let fired = self.inner.fire_due_timers();
            let polled = self.inner.poll_ready();
            ran |= polled;
            if !fired && !polled {
                break;
            }
        }
        ran
    }

    pub fn has_ready_tasks(&self) -> bool {
        !self.inner.ready.is_empty()
    }

    pub fn task_count(&self) -> usize {
        self.inner.tasks.borrow().len()
    }

    /// Earliest deadline among pending timers.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.inner.next_deadline()
    }

    pub fn background_in_flight(&self) -> usize {
        self.inner.background.shared.counts.lock().in_flight
    }

    /// Blocks until a background job finishes or `timeout` elapses.
    ///
    /// A job that finished since the previous call is reported right away,
    /// and each finish is reported once.
    pub fn wait_for_background(&self, timeout: Duration) -> BackgroundWait {
        let link = &self.inner.background;
        let seen = link.seen.get();
        let mut counts = link.shared.counts.lock();
        if counts.finished == seen {
            if counts.in_flight == 0 {
                return BackgroundWait::Idle;
            }
            let _ = link.shared.changed.wait_while_for(
                &mut counts,
                |c| c.finished == seen && c.in_flight > 0,
                timeout,
            );
        }
        if counts.finished == seen {
            return match counts.in_flight {
                0 => BackgroundWait::Idle,
                _ => BackgroundWait::TimedOut,
            };
        }
        link.seen.set(counts.finished);
        BackgroundWait::Finished
    }
}

/// Outcome of [`Runtime::wait_for_background`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BackgroundWait {
    /// Nothing was in flight.
    Idle,
    /// A job finished; its task is ready to run.
    Finished,
    TimedOut,
}

/// Weak reference to a [`Runtime`]; every operation is a no-op once the
/// runtime is gone.
#[derive(Clone)]
pub struct RuntimeHandle {
    inner: Weak<RuntimeInner>,
}

impl RuntimeHandle {
    /// A handle that never upgrades. Spawning on it fails with `RuntimeGone`.
    pub fn detached() -> Self {
        Self { inner: Weak::new() }
    }

    pub fn is_alive(&self) -> bool {
        self.inner.strong_count() > 0
    }

    pub fn now(&self) -> Option<Instant> {
        self.inner.upgrade().map(|inner| inner.clock.now())
    }

    pub fn spawn(&self, future: impl Future<Output = ()> + 'static) -> Result<Job, RuntimeError> {
        let inner = self.inner.upgrade().ok_or(RuntimeError::RuntimeGone)?;
        let (key, status) = inner.spawn(Box::pin(future));
        Ok(Job {
            key,
            status,
            runtime: self.clone(),
        })
    }

    fn cancel_task(&self, key: TaskKey) {
        if let Some(inner) = self.inner.upgrade() {
            inner.cancel_task(key);
        }
    }
}

/// Handle to a spawned task.
#[derive(Clone)]
pub struct Job {
    key: TaskKey,
    status: Rc<Cell<JobStatus>>,
    runtime: RuntimeHandle,
}

impl Job {
    pub fn status(&self) -> JobStatus {
        self.status.get()
    }

    pub fn is_active(&self) -> bool {
        self.status.get() == JobStatus::Active
    }

    pub fn is_completed(&self) -> bool {
        self.status.get() == JobStatus::Completed
    }

    pub fn is_cancelled(&self) -> bool {
        self.status.get() == JobStatus::Cancelled
    }

    /// Drops the task's future. Has no effect on finished jobs.
    pub fn cancel(&self) {
        if self.is_active() {
            self.status.set(JobStatus::Cancelled);
            self.runtime.cancel_task(self.key);
        }
    }
}

impl std::fmt::Debug for Job {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Job")
            .field("key", &self.key)
            .field("status", &self.status.get())
            .finish()
    }
}

thread_local! {
    static ACTIVE_RUNTIMES: RefCell<Vec<RuntimeHandle>> = const { RefCell::new(Vec::new()) };
    static LAST_RUNTIME: RefCell<Option<RuntimeHandle>> = const { RefCell::new(None) };
}

struct ActiveRuntimeGuard;

impl Drop for ActiveRuntimeGuard {
    fn drop(&mut self) {
        ACTIVE_RUNTIMES.with(|stack| {
            stack.borrow_mut().pop();
        });
    }
}

/// The runtime currently polling tasks, else the most recently created one.
pub fn current_runtime() -> Option<RuntimeHandle> {
    let active = ACTIVE_RUNTIMES.with(|stack| stack.borrow().last().cloned());
    active
        .or_else(|| LAST_RUNTIME.with(|slot| slot.borrow().clone()))
        .filter(RuntimeHandle::is_alive)
}

/// Current time on the active runtime's clock.
pub fn now() -> Instant {
    current_runtime()
        .and_then(|rt| rt.now())
        .unwrap_or_else(Instant::now)
}

/// Suspends the calling task for `duration` of runtime clock time.
pub fn delay(duration: Duration) -> Delay {
    Delay {
        duration,
        timer: None,
    }
}

pub struct Delay {
    duration: Duration,
    timer: Option<(Weak<RuntimeInner>, TimerKey)>,
}

impl Future for Delay {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        let this = self.get_mut();
        if let Some((runtime, key)) = &this.timer {
            let state = runtime
                .upgrade()
                .and_then(|inner| inner.poll_timer(*key, cx.waker()));
            return match state {
                Some(false) => Poll::Pending,
                _ => {
                    if let Some((runtime, key)) = this.timer.take()
                        && let Some(inner) = runtime.upgrade()
                    {
                        inner.cancel_timer(key);
                    }
                    Poll::Ready(())
                }
            };
        }

        if this.duration.is_zero() {
            return Poll::Ready(());
        }
        let Some(inner) = current_runtime().and_then(|rt| rt.inner.upgrade()) else {
            log::warn!("delay polled outside of a runtime; completing immediately");
            return Poll::Ready(());
        };
        let deadline = inner.clock.now() + this.duration;
        let key = inner.register_timer(deadline, cx.waker().clone());
        this.timer = Some((Rc::downgrade(&inner), key));
        Poll::Pending
    }
}

impl Drop for Delay {
    fn drop(&mut self) {
        if let Some((runtime, key)) = self.timer.take()
            && let Some(inner) = runtime.upgrade()
        {
            inner.cancel_timer(key);
        }
    }
}

/// Cooperative cancellation flag handed to background work.
///
/// It flips to cancelled when the awaiting future is dropped. Blocking calls
/// are not interrupted; long-running work should poll
/// [`CancelToken::is_cancelled`].
#[derive(Clone)]
pub struct CancelToken {
    active: Arc<AtomicBool>,
}

impl CancelToken {
    fn new() -> Self {
        Self {
            active: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        !self.active.load(Ordering::SeqCst)
    }

    fn cancel(&self) {
        self.active.store(false, Ordering::SeqCst);
    }
}

struct BackgroundSlot<T> {
    result: Option<Result<T, RuntimeError>>,
    waker: Option<Waker>,
}

/// Future returned by [`background`]; resolves on the runtime thread.
pub struct Background<T> {
    slot: Arc<Mutex<BackgroundSlot<T>>>,
    token: CancelToken,
    done: bool,
}

/// Runs `work` on a worker thread and resumes the awaiting task with its
/// result once it finishes.
pub fn background<T, W>(work: W) -> Background<T>
where
    T: Send + 'static,
    W: FnOnce(CancelToken) -> T + Send + 'static,
{
    let token = CancelToken::new();
    let slot = Arc::new(Mutex::new(BackgroundSlot {
        result: None,
        waker: None,
    }));

    let Some(inner) = current_runtime().and_then(|rt| rt.inner.upgrade()) else {
        slot.lock().result = Some(Err(RuntimeError::RuntimeGone));
        return Background {
            slot,
            token,
            done: false,
        };
    };

    let shared = inner.background.shared.clone();
    shared.start();

    let worker_slot = slot.clone();
    let worker_token = token.clone();
    let worker_shared = shared.clone();
    let spawned = std::thread::Builder::new()
        .name("sidefx-background".into())
        .spawn(move || {
            let outcome = catch_unwind(AssertUnwindSafe(|| work(worker_token)))
                .map_err(|payload| RuntimeError::BackgroundPanicked(panic_message(payload)));
            let waker = {
                let mut slot = worker_slot.lock();
                slot.result = Some(outcome);
                slot.waker.take()
            };
            if let Some(waker) = waker {
                waker.wake();
            }
            worker_shared.finish();
        });

    if let Err(err) = spawned {
        shared.abandon();
        log::error!("failed to spawn background worker: {err}");
        slot.lock().result = Some(Err(RuntimeError::BackgroundSpawn(err)));
    }

    Background {
        slot,
        token,
        done: false,
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    }
}

impl<T> Future for Background<T> {
    type Output = Result<T, RuntimeError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        let mut slot = this.slot.lock();
        if let Some(result) = slot.result.take() {
            this.done = true;
            return Poll::Ready(result);
        }
        slot.waker = Some(cx.waker().clone());
        Poll::Pending
    }
}

impl<T> Drop for Background<T> {
    fn drop(&mut self) {
        if !self.done {
            self.token.cancel();
        }
    }
}

//! Dependency graph between signals and the observers that read them.
//!
//! A composition pass runs under [`track`], so every `Signal::get` inside it
//! records an edge. A later write to that signal runs the observer's
//! callback, which marks the composition dirty.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet, VecDeque};
use std::rc::Rc;

pub type SignalId = usize;
pub type ObserverId = usize;

thread_local! {
    static CURRENT_OBSERVER: RefCell<Option<ObserverId>> = const { RefCell::new(None) };
    static GRAPH: RefCell<DepGraph> = RefCell::new(DepGraph::default());
}

#[derive(Default)]
struct DepGraph {
    next_observer: ObserverId,
    next_signal: SignalId,
    // signal -> observers depending on it
    edges: HashMap<SignalId, HashSet<ObserverId>>,
    // observer -> signals it read
    back: HashMap<ObserverId, HashSet<SignalId>>,
    observers: HashMap<ObserverId, Rc<dyn Fn()>>,
    running: HashSet<ObserverId>,
}

impl DepGraph {
    fn remove_all_edges_for(&mut self, obs: ObserverId) {
        if let Some(signals) = self.back.remove(&obs) {
            for s in signals {
                if let Some(set) = self.edges.get_mut(&s) {
                    set.remove(&obs);
                }
            }
        }
    }
}

pub(crate) fn next_signal_id() -> SignalId {
    GRAPH.with(|g| {
        let mut g = g.borrow_mut();
        let id = g.next_signal;
        g.next_signal += 1;
        id
    })
}

pub fn current_observer() -> Option<ObserverId> {
    CURRENT_OBSERVER.with(|co| *co.borrow())
}

pub fn register_signal_read(sig: SignalId) {
    if let Some(obs) = current_observer() {
        GRAPH.with(|g| {
            let mut g = g.borrow_mut();
            g.edges.entry(sig).or_default().insert(obs);
            g.back.entry(obs).or_default().insert(sig);
        });
    }
}

/// Notifies every observer that read `sig`.
///
/// The observer that is currently tracking is skipped: a pass writing to a
/// signal it already read does not invalidate itself.
pub fn signal_changed(sig: SignalId) {
    let tracking = current_observer();
    let mut queue: VecDeque<ObserverId> = GRAPH.with(|g| {
        g.borrow()
            .edges
            .get(&sig)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    });

    while let Some(obs) = queue.pop_front() {
        if Some(obs) == tracking {
            continue;
        }
        let callback = GRAPH.with(|g| {
            let mut g = g.borrow_mut();
            if !g.running.insert(obs) {
                return None;
            }
            // Edges are rebuilt the next time the observer tracks.
            g.remove_all_edges_for(obs);
            g.observers.get(&obs).cloned()
        });
        if let Some(callback) = callback {
            callback();
        }
        GRAPH.with(|g| {
            g.borrow_mut().running.remove(&obs);
        });
    }
}

pub fn new_observer(f: impl Fn() + 'static) -> ObserverId {
    GRAPH.with(|g| {
        let mut g = g.borrow_mut();
        let id = g.next_observer;
        g.next_observer += 1;
        g.observers.insert(id, Rc::new(f));
        id
    })
}

/// Remove an observer and all of its dependency edges.
pub fn remove_observer(id: ObserverId) {
    GRAPH.with(|g| {
        let mut g = g.borrow_mut();
        g.observers.remove(&id);
        g.remove_all_edges_for(id);
        g.running.remove(&id);
    });
}

/// Runs `f` with `obs` as the current observer, replacing its old edges.
pub fn track<R>(obs: ObserverId, f: impl FnOnce() -> R) -> R {
    GRAPH.with(|g| g.borrow_mut().remove_all_edges_for(obs));
    let prev = CURRENT_OBSERVER.with(|co| co.borrow_mut().replace(obs));
    let _restore = RestoreObserver(prev);
    f()
}

/// Runs `f` without recording any reads.
pub fn untracked<R>(f: impl FnOnce() -> R) -> R {
    let prev = CURRENT_OBSERVER.with(|co| co.borrow_mut().take());
    let _restore = RestoreObserver(prev);
    f()
}

struct RestoreObserver(Option<ObserverId>);

impl Drop for RestoreObserver {
    fn drop(&mut self) {
        CURRENT_OBSERVER.with(|co| *co.borrow_mut() = self.0);
    }
}

/// Number of signals `obs` currently depends on.
pub fn dependency_count(obs: ObserverId) -> usize {
    GRAPH.with(|g| g.borrow().back.get(&obs).map_or(0, HashSet::len))
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;
    use std::sync::Arc;
    use std::time::Duration;

    use crate::*;

    fn test_runtime() -> (TestClock, Runtime) {
        let clock = TestClock::new();
        let runtime = Runtime::new(Arc::new(clock.clone()));
        (clock, runtime)
    }

    fn text(s: impl Into<String>) -> View {
        View::new(ViewKind::Text { text: s.into() })
    }

    fn column(children: Vec<View>) -> View {
        View::new(ViewKind::Column).with_children(children)
    }

    /// Steps virtual time to each pending deadline up to `by`.
    fn advance(clock: &TestClock, runtime: &Runtime, by: Duration) {
        let target = clock.now() + by;
        runtime.run_until_idle();
        while let Some(deadline) = runtime.next_deadline() {
            if deadline > target {
                break;
            }
            clock.set(deadline);
            runtime.run_until_idle();
        }
        clock.set(target);
        runtime.run_until_idle();
    }

    #[test]
    fn test_signal_basic() {
        let sig = signal(42);
        assert_eq!(sig.get(), 42);

        sig.set(100);
        assert_eq!(sig.get(), 100);

        sig.update(|v| *v += 1);
        assert_eq!(sig.get(), 101);
    }

    #[test]
    fn test_signal_subscription() {
        let sig = signal(0);
        let seen = Rc::new(RefCell::new(Vec::new()));

        let id = sig.subscribe({
            let seen = seen.clone();
            move |v| seen.borrow_mut().push(*v)
        });
        sig.set(1);
        assert!(sig.unsubscribe(id));
        sig.set(2);

        assert_eq!(*seen.borrow(), vec![1]);
    }

    #[test]
    fn test_scope_explicit_dispose() {
        let order = Rc::new(RefCell::new(Vec::new()));
        let scope = Scope::new();
        let child = scope.child();

        scope.add_disposer({
            let order = order.clone();
            move || order.borrow_mut().push("parent")
        });
        child.add_disposer({
            let order = order.clone();
            move || order.borrow_mut().push("child")
        });

        scope.dispose();
        assert_eq!(*order.borrow(), vec!["child", "parent"]);

        scope.dispose();
        assert_eq!(order.borrow().len(), 2);
    }

    #[test]
    fn test_dispose_runs_once() {
        let count = Rc::new(Cell::new(0));
        let d = Dispose::new({
            let count = count.clone();
            move || count.set(count.get() + 1)
        });
        assert!(d.is_pending());
        d.run();
        d.run();
        assert_eq!(count.get(), 1);
        assert!(!d.is_pending());
    }

    #[test]
    fn test_untracked_reads_add_no_dependencies() {
        let tracked = signal(1);
        let hidden = signal(2);
        let hits = Rc::new(Cell::new(0));
        let obs = new_observer({
            let hits = hits.clone();
            move || hits.set(hits.get() + 1)
        });

        let sum = track(obs, || tracked.get() + untracked(|| hidden.get()));
        assert_eq!(sum, 3);
        assert_eq!(dependency_count(obs), 1);

        hidden.set(5);
        assert_eq!(hits.get(), 0);
        tracked.set(7);
        assert_eq!(hits.get(), 1);
        // Notified observers lose their edges until they track again.
        assert_eq!(dependency_count(obs), 0);

        remove_observer(obs);
    }

    #[test]
    fn test_composition_recomposes_on_read_signal() {
        let (_clock, runtime) = test_runtime();
        let source = signal(1);
        let unrelated = signal(0);

        let mut composition = Composition::new(runtime.handle(), {
            let source = source.clone();
            move || text(source.get().to_string())
        });
        composition.compose();
        assert!(!composition.is_dirty());

        unrelated.set(5);
        assert!(!composition.recompose_if_needed());

        source.set(2);
        assert!(composition.is_dirty());
        assert!(composition.recompose_if_needed());
        assert!(composition.view().is_some_and(|v| v.contains_text("2")));
        assert_eq!(composition.passes(), 2);
    }

    #[test]
    fn test_remember_keeps_value_across_passes() {
        let (_clock, runtime) = test_runtime();
        let inits = Rc::new(Cell::new(0));
        let trigger = signal(0);

        let mut composition = Composition::new(runtime.handle(), {
            let inits = inits.clone();
            let trigger = trigger.clone();
            move || {
                let _ = trigger.get();
                let counter = remember(|| {
                    inits.set(inits.get() + 1);
                    Cell::new(0)
                });
                counter.set(counter.get() + 1);
                text(counter.get().to_string())
            }
        });

        composition.compose();
        trigger.set(1);
        composition.recompose_if_needed();

        assert_eq!(inits.get(), 1);
        assert!(composition.view().is_some_and(|v| v.contains_text("2")));
    }

    #[test]
    fn test_slot_dropped_when_call_site_leaves() {
        let (_clock, runtime) = test_runtime();
        let show = signal(true);
        let dropped = Rc::new(Cell::new(false));

        struct Flag(Rc<Cell<bool>>);
        impl Drop for Flag {
            fn drop(&mut self) {
                self.0.set(true);
            }
        }

        let mut composition = Composition::new(runtime.handle(), {
            let show = show.clone();
            let dropped = dropped.clone();
            move || {
                if show.get() {
                    group("branch", || {
                        remember(|| Flag(dropped.clone()));
                    });
                }
                text("root")
            }
        });

        composition.compose();
        assert!(!dropped.get());
        show.set(false);
        composition.recompose_if_needed();
        assert!(dropped.get());
    }

    #[test]
    fn test_disposable_effect_cleanup_once_before_next_setup() {
        let (_clock, runtime) = test_runtime();
        let key = signal(1);
        let log = Rc::new(RefCell::new(Vec::<String>::new()));

        let mut composition = Composition::new(runtime.handle(), {
            let key = key.clone();
            let log = log.clone();
            move || {
                let k = key.get();
                let log = log.clone();
                disposable_effect!(k, move || {
                    log.borrow_mut().push(format!("setup {k}"));
                    let log = log.clone();
                    on_unmount(move || log.borrow_mut().push(format!("cleanup {k}")))
                });
                text(k.to_string())
            }
        });

        composition.compose();
        assert_eq!(*log.borrow(), vec!["setup 1"]);

        // Same key: nothing runs.
        composition.compose();
        assert_eq!(log.borrow().len(), 1);

        key.set(2);
        composition.recompose_if_needed();
        assert_eq!(*log.borrow(), vec!["setup 1", "cleanup 1", "setup 2"]);

        drop(composition);
        assert_eq!(
            *log.borrow(),
            vec!["setup 1", "cleanup 1", "setup 2", "cleanup 2"]
        );
    }

    #[test]
    fn test_disposable_effect_cleanup_when_branch_leaves() {
        let (_clock, runtime) = test_runtime();
        let show = signal(true);
        let cleanups = Rc::new(Cell::new(0));

        let mut composition = Composition::new(runtime.handle(), {
            let show = show.clone();
            let cleanups = cleanups.clone();
            move || {
                if show.get() {
                    let cleanups = cleanups.clone();
                    disposable_effect!((), move || {
                        on_unmount(move || cleanups.set(cleanups.get() + 1))
                    });
                }
                text("root")
            }
        });

        composition.compose();
        show.set(false);
        composition.recompose_if_needed();
        assert_eq!(cleanups.get(), 1);
        drop(composition);
        assert_eq!(cleanups.get(), 1);
    }

    #[test]
    fn test_branch_swap_runs_cleanup_before_replacement_setup() {
        let (_clock, runtime) = test_runtime();
        let branch = signal("a");
        let log = Rc::new(RefCell::new(Vec::<String>::new()));

        let mut composition = Composition::new(runtime.handle(), {
            let branch = branch.clone();
            let log = log.clone();
            move || {
                let name = branch.get();
                group(name, || {
                    let log = log.clone();
                    disposable_effect!((), move || {
                        log.borrow_mut().push(format!("setup {name}"));
                        let log = log.clone();
                        on_unmount(move || log.borrow_mut().push(format!("cleanup {name}")))
                    });
                });
                text(name)
            }
        });

        composition.compose();
        branch.set("b");
        assert!(composition.recompose_if_needed());
        assert_eq!(*log.borrow(), vec!["setup a", "cleanup a", "setup b"]);

        branch.set("a");
        composition.recompose_if_needed();
        assert_eq!(
            *log.borrow(),
            vec!["setup a", "cleanup a", "setup b", "cleanup b", "setup a"]
        );
    }

    #[test]
    fn test_launched_effect_restarts_on_key_change() {
        let (clock, runtime) = test_runtime();
        let key = signal("a");
        let finished = Rc::new(RefCell::new(Vec::new()));
        let started = Rc::new(RefCell::new(Vec::new()));

        let mut composition = Composition::new(runtime.handle(), {
            let key = key.clone();
            let finished = finished.clone();
            let started = started.clone();
            move || {
                let k = key.get();
                let finished = finished.clone();
                let started = started.clone();
                launched_effect!(k, move |_scope| async move {
                    started.borrow_mut().push(k);
                    delay(Duration::from_secs(1)).await;
                    finished.borrow_mut().push(k);
                });
                text(k)
            }
        });

        composition.compose();
        runtime.run_until_idle();
        advance(&clock, &runtime, Duration::from_millis(500));

        key.set("b");
        composition.recompose_if_needed();
        advance(&clock, &runtime, Duration::from_secs(2));

        assert_eq!(*started.borrow(), vec!["a", "b"]);
        assert_eq!(*finished.borrow(), vec!["b"]);
    }

    #[test]
    fn test_launched_effect_not_restarted_for_same_key() {
        let (_clock, runtime) = test_runtime();
        let trigger = signal(0);
        let starts = Rc::new(Cell::new(0));

        let mut composition = Composition::new(runtime.handle(), {
            let trigger = trigger.clone();
            let starts = starts.clone();
            move || {
                let _ = trigger.get();
                let starts = starts.clone();
                launched_effect!((), move |_scope| async move {
                    starts.set(starts.get() + 1);
                });
                text("x")
            }
        });

        composition.compose();
        runtime.run_until_idle();
        trigger.set(1);
        composition.recompose_if_needed();
        runtime.run_until_idle();

        assert_eq!(starts.get(), 1);
    }

    #[test]
    fn test_launched_effect_cancelled_on_dispose() {
        let (clock, runtime) = test_runtime();
        let finished = Rc::new(Cell::new(false));

        let composition = Composition::new(runtime.handle(), {
            let finished = finished.clone();
            move || {
                let finished = finished.clone();
                launched_effect!((), move |_scope| async move {
                    delay(Duration::from_secs(1)).await;
                    finished.set(true);
                });
                text("x")
            }
        });
        let mut composition = composition;
        composition.compose();
        runtime.run_until_idle();
        assert_eq!(runtime.task_count(), 1);

        composition.dispose();
        assert_eq!(runtime.task_count(), 0);
        advance(&clock, &runtime, Duration::from_secs(2));
        assert!(!finished.get());
    }

    #[test]
    fn test_coroutine_scope_cancelled_when_call_site_leaves() {
        let (clock, runtime) = test_runtime();
        let show = signal(true);
        let captured: Rc<RefCell<Option<CoroutineScope>>> = Rc::new(RefCell::new(None));

        let mut composition = Composition::new(runtime.handle(), {
            let show = show.clone();
            let captured = captured.clone();
            move || {
                if show.get() {
                    group("inner", || {
                        *captured.borrow_mut() = Some(remember_coroutine_scope());
                    });
                }
                text("x")
            }
        });
        composition.compose();

        let scope = captured.borrow().clone();
        let Some(scope) = scope else {
            panic!("scope was not captured");
        };
        let ticks = Rc::new(Cell::new(0));
        let job = scope
            .launch({
                let ticks = ticks.clone();
                async move {
                    loop {
                        delay(Duration::from_secs(1)).await;
                        ticks.set(ticks.get() + 1);
                    }
                }
            })
            .expect("launch");
        advance(&clock, &runtime, Duration::from_secs(2));
        assert_eq!(ticks.get(), 2);

        show.set(false);
        composition.recompose_if_needed();
        assert!(!scope.is_active());
        assert!(job.is_cancelled());
        advance(&clock, &runtime, Duration::from_secs(3));
        assert_eq!(ticks.get(), 2);
        assert!(matches!(
            scope.launch(async {}),
            Err(RuntimeError::ScopeCancelled)
        ));
    }

    #[test]
    fn test_coroutine_scope_is_stable_across_passes() {
        let (_clock, runtime) = test_runtime();
        let trigger = signal(0);
        let scopes = Rc::new(RefCell::new(Vec::new()));

        let mut composition = Composition::new(runtime.handle(), {
            let trigger = trigger.clone();
            let scopes = scopes.clone();
            move || {
                let _ = trigger.get();
                scopes.borrow_mut().push(remember_coroutine_scope());
                text("x")
            }
        });
        composition.compose();
        trigger.set(1);
        composition.recompose_if_needed();

        let scopes = scopes.borrow();
        assert_eq!(scopes.len(), 2);
        scopes[0].launch(async {}).expect("launch");
        assert_eq!(scopes[1].active_jobs(), 1);
    }

    #[test]
    fn test_updated_state_seen_by_running_task() {
        let (clock, runtime) = test_runtime();
        let label = signal("first");
        let seen = Rc::new(RefCell::new(None));
        let starts = Rc::new(Cell::new(0));

        let mut composition = Composition::new(runtime.handle(), {
            let label = label.clone();
            let seen = seen.clone();
            let starts = starts.clone();
            move || {
                let current = remember_updated_state(label.get());
                let seen = seen.clone();
                let starts = starts.clone();
                launched_effect!((), move |_scope| async move {
                    starts.set(starts.get() + 1);
                    delay(Duration::from_secs(5)).await;
                    *seen.borrow_mut() = Some(current.get());
                });
                text("x")
            }
        });

        composition.compose();
        advance(&clock, &runtime, Duration::from_secs(2));
        label.set("second");
        composition.recompose_if_needed();
        advance(&clock, &runtime, Duration::from_secs(5));

        assert_eq!(starts.get(), 1);
        assert_eq!(*seen.borrow(), Some("second"));
    }

    #[test]
    fn test_produce_state_initial_then_value() {
        let (clock, runtime) = test_runtime();

        let mut composition = Composition::new(runtime.handle(), || {
            let state = produce_state!(String::from("loading"), 0, |scope| async move {
                delay(Duration::from_secs(1)).await;
                scope.set_value(String::from("ok"));
            });
            text(state.get())
        });

        composition.compose();
        assert!(composition.view().is_some_and(|v| v.contains_text("loading")));
        runtime.run_until_idle();
        composition.recompose_if_needed();
        assert!(composition.view().is_some_and(|v| v.contains_text("loading")));

        advance(&clock, &runtime, Duration::from_secs(1));
        assert!(composition.recompose_if_needed());
        assert!(composition.view().is_some_and(|v| v.contains_text("ok")));
    }

    #[test]
    fn test_produce_state_resets_and_ignores_stale_producer() {
        let (clock, runtime) = test_runtime();
        let key = signal(0);

        let mut composition = Composition::new(runtime.handle(), {
            let key = key.clone();
            move || {
                let k = key.get();
                let state = produce_state!(None::<i32>, k, move |scope| async move {
                    delay(Duration::from_secs(1)).await;
                    scope.set_value(Some(k));
                    delay(Duration::from_secs(5)).await;
                    scope.set_value(Some(k + 100));
                });
                text(format!("{:?}", state.get()))
            }
        });

        composition.compose();
        advance(&clock, &runtime, Duration::from_secs(2));
        composition.recompose_if_needed();
        assert!(composition.view().is_some_and(|v| v.contains_text("Some(0)")));

        key.set(1);
        composition.recompose_if_needed();
        assert!(composition.view().is_some_and(|v| v.contains_text("None")));

        // The run for key 0 would have written Some(100) in this window.
        advance(&clock, &runtime, Duration::from_secs(5));
        composition.recompose_if_needed();
        assert!(composition.view().is_some_and(|v| v.contains_text("Some(1)")));
    }

    #[test]
    fn test_produce_state_await_dispose() {
        let (_clock, runtime) = test_runtime();
        let disposed = Rc::new(Cell::new(false));

        let composition = Composition::new(runtime.handle(), {
            let disposed = disposed.clone();
            move || {
                let disposed = disposed.clone();
                let state = produce_state!(0, (), move |scope| async move {
                    scope.set_value(1);
                    scope.await_dispose(move || disposed.set(true)).await;
                });
                text(state.get().to_string())
            }
        });
        let mut composition = composition;
        composition.compose();
        runtime.run_until_idle();
        assert!(!disposed.get());

        composition.dispose();
        assert!(disposed.get());
    }

    #[test]
    fn test_delay_uses_runtime_clock() {
        let (clock, runtime) = test_runtime();
        let done = Rc::new(Cell::new(false));
        runtime.spawn({
            let done = done.clone();
            async move {
                delay(Duration::from_millis(250)).await;
                done.set(true);
            }
        });

        runtime.run_until_idle();
        assert!(!done.get());
        assert_eq!(
            runtime.next_deadline(),
            Some(clock.now() + Duration::from_millis(250))
        );
        clock.advance(Duration::from_millis(249));
        runtime.run_until_idle();
        assert!(!done.get());
        clock.advance(Duration::from_millis(1));
        runtime.run_until_idle();
        assert!(done.get());
        assert_eq!(runtime.next_deadline(), None);
    }

    #[test]
    fn test_cancelled_job_drops_its_timer() {
        let (_clock, runtime) = test_runtime();
        let job = runtime.spawn(async {
            delay(Duration::from_secs(10)).await;
        });
        runtime.run_until_idle();
        assert!(runtime.next_deadline().is_some());

        job.cancel();
        assert!(job.is_cancelled());
        assert_eq!(runtime.next_deadline(), None);
        assert_eq!(runtime.task_count(), 0);
    }

    #[test]
    fn test_background_resumes_on_runtime_thread() {
        let (_clock, runtime) = test_runtime();
        let result = Rc::new(RefCell::new(None));
        let caller = std::thread::current().id();

        runtime.spawn({
            let result = result.clone();
            async move {
                let worker = background(|_token| std::thread::current().id()).await;
                let resumed_on = std::thread::current().id();
                *result.borrow_mut() = Some((worker, resumed_on));
            }
        });

        runtime.run_until_idle();
        while result.borrow().is_none() {
            runtime.wait_for_background(Duration::from_secs(5));
            runtime.run_until_idle();
        }

        let Some((worker, resumed_on)) = result.borrow_mut().take() else {
            panic!("no result");
        };
        let worker = worker.expect("background work");
        assert_ne!(worker, caller);
        assert_eq!(resumed_on, caller);
    }

    #[test]
    fn test_wait_for_background_distinguishes_idle_from_timeout() {
        let (_clock, runtime) = test_runtime();
        assert_eq!(
            runtime.wait_for_background(Duration::from_millis(10)),
            BackgroundWait::Idle
        );

        let (release, gate) = std::sync::mpsc::channel::<()>();
        let done = Rc::new(Cell::new(false));
        runtime.spawn({
            let done = done.clone();
            async move {
                let _ = background(move |_token| gate.recv()).await;
                done.set(true);
            }
        });
        runtime.run_until_idle();
        assert_eq!(runtime.background_in_flight(), 1);
        assert_eq!(
            runtime.wait_for_background(Duration::from_millis(10)),
            BackgroundWait::TimedOut
        );

        release.send(()).expect("worker waiting");
        assert_eq!(
            runtime.wait_for_background(Duration::from_secs(5)),
            BackgroundWait::Finished
        );
        runtime.run_until_idle();
        assert!(done.get());

        // The finished job's notice does not count as a second finish.
        assert_eq!(
            runtime.wait_for_background(Duration::from_millis(10)),
            BackgroundWait::Idle
        );
    }

    #[test]
    fn test_background_panic_is_reported() {
        let (_clock, runtime) = test_runtime();
        let outcome = Rc::new(RefCell::new(None));

        runtime.spawn({
            let outcome = outcome.clone();
            async move {
                let r = background(|_token| -> u8 { panic!("boom") }).await;
                *outcome.borrow_mut() = Some(r);
            }
        });

        runtime.run_until_idle();
        while outcome.borrow().is_none() {
            runtime.wait_for_background(Duration::from_secs(5));
            runtime.run_until_idle();
        }
        assert!(matches!(
            outcome.borrow_mut().take(),
            Some(Err(RuntimeError::BackgroundPanicked(msg))) if msg == "boom"
        ));
    }

    #[test]
    fn test_animate_reaches_target() {
        let (clock, runtime) = test_runtime();
        let frames = Rc::new(RefCell::new(Vec::new()));
        runtime.spawn({
            let frames = frames.clone();
            async move {
                animate(
                    0.0f32,
                    1.0,
                    AnimationSpec::tween(Duration::from_millis(100), Easing::Linear),
                    |v| frames.borrow_mut().push(v),
                )
                .await;
            }
        });

        advance(&clock, &runtime, Duration::from_millis(200));
        let frames = frames.borrow();
        assert_eq!(frames.first().copied(), Some(0.0));
        assert_eq!(frames.last().copied(), Some(1.0));
        assert!(frames.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_easing_endpoints() {
        for easing in [Easing::Linear, Easing::EaseIn, Easing::EaseOut, Easing::EaseInOut] {
            assert_eq!(easing.interpolate(0.0), 0.0);
            assert_eq!(easing.interpolate(1.0), 1.0);
        }
    }

    #[test]
    fn test_view_find_by_label() {
        let tree = column(vec![
            text("hello"),
            View::new(ViewKind::Icon {
                name: "menu".into(),
            })
            .semantics(Semantics::new(Role::Button).label("open drawer")),
        ]);
        assert!(tree.find_by_label("hello").is_some());
        assert!(tree.find_by_label("open drawer").is_some());
        assert!(tree.find_by_label("missing").is_none());
        assert_eq!(tree.texts(), vec!["hello".to_string()]);
    }
}

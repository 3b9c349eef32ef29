#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};
    use std::panic::{catch_unwind, AssertUnwindSafe};
    use std::rc::Rc;

    use fathom_tree::{DisplayType, LayoutDirection, Rect};

    use crate::*;

    type Log = Rc<RefCell<Vec<String>>>;

    fn new_log() -> Log {
        Rc::new(RefCell::new(Vec::new()))
    }

    fn push(log: &Log, entry: impl Into<String>) {
        log.borrow_mut().push(entry.into());
    }

    fn entries(log: &Log) -> Vec<String> {
        log.borrow().clone()
    }

    fn requeue_forever(s: Scheduler) -> Result<(), HarnessError> {
        let next = s.clone();
        s.queue_microtask(move || requeue_forever(next))
    }

    /// Handler that records `type:payload` for every delivery.
    fn recorder(log: &Log) -> EventHandler {
        let log = log.clone();
        handler(move |e: &SyntheticEvent| push(&log, format!("{}:{}", e.event_type, e.payload)))
    }

    fn ui_dispatch(h: &Harness, target: NodeRef, event_type: &str, payload: i64, options: DispatchOptions) -> u64 {
        h.run_on_ui_thread(|| h.dispatch_native_event(target, event_type, Some(PropValue::Int(payload)), options))
            .unwrap()
    }

    // --- Scheduler ---

    #[test]
    fn test_run_task_drains_nested_microtasks_fifo() {
        let scheduler = Scheduler::default();
        let log = new_log();
        let (s, l) = (scheduler.clone(), log.clone());

        scheduler
            .run_task(move || -> Result<(), HarnessError> {
                push(&l, "body");
                let (s2, l2) = (s.clone(), l.clone());
                s.queue_microtask(move || -> Result<(), HarnessError> {
                    push(&l2, "a");
                    let l3 = l2.clone();
                    s2.queue_microtask(move || push(&l3, "c"))?;
                    Ok(())
                })?;
                let l4 = l.clone();
                s.queue_microtask(move || push(&l4, "b"))?;
                Ok(())
            })
            .unwrap();

        assert_eq!(entries(&log), vec!["body", "a", "b", "c"]);
        assert_eq!(scheduler.pending_microtasks(), 0);
        assert!(!scheduler.is_active());
    }

    #[test]
    fn test_task_ids_increase() {
        let scheduler = Scheduler::default();
        assert_eq!(scheduler.run_task(|| ()).unwrap(), 1);
        assert_eq!(scheduler.run_task(|| ()).unwrap(), 2);
    }

    #[test]
    fn test_reentrant_task_from_body_is_rejected_without_running() {
        let scheduler = Scheduler::default();
        let ran = Rc::new(Cell::new(false));
        let (s, r) = (scheduler.clone(), ran.clone());

        scheduler
            .run_task(move || {
                let inner = s.run_task(move || r.set(true));
                assert!(matches!(inner, Err(HarnessError::Reentrancy { active: 1 })));
            })
            .unwrap();

        assert!(!ran.get());
    }

    #[test]
    fn test_reentrant_task_from_microtask_propagates() {
        let scheduler = Scheduler::default();
        let s = scheduler.clone();

        let err = scheduler
            .run_task(move || {
                let inner = s.clone();
                s.queue_microtask(move || inner.run_task(|| ()).map(|_| ()))
            })
            .unwrap_err();

        match &err {
            HarnessError::PropagatedBody { task, origin, .. } => {
                assert_eq!(*task, 1);
                assert_eq!(*origin, ErrorOrigin::Microtask);
            }
            other => panic!("unexpected error: {other}"),
        }
        let source = err.body_error().unwrap().downcast_ref::<HarnessError>();
        assert!(matches!(source, Some(HarnessError::Reentrancy { active: 1 })));
        assert_eq!(scheduler.phase(), TaskPhase::Idle);
    }

    #[test]
    fn test_queue_microtask_without_task() {
        let scheduler = Scheduler::default();
        let err = scheduler.queue_microtask(|| ()).unwrap_err();
        assert!(matches!(err, HarnessError::NoActiveTask(_)));
    }

    #[test]
    fn test_body_error_propagates_and_resets_state() {
        let scheduler = Scheduler::default();
        let err = scheduler
            .run_task(|| -> Result<(), BoxError> { Err("boom".into()) })
            .unwrap_err();

        assert_eq!(err.to_string(), "task body failed in task #1: boom");
        assert_eq!(err.body_error().unwrap().to_string(), "boom");
        assert_eq!(scheduler.phase(), TaskPhase::Idle);
        assert_eq!(scheduler.run_task(|| ()).unwrap(), 2);
    }

    #[test]
    fn test_microtask_error_discards_remaining_microtasks() {
        let scheduler = Scheduler::default();
        let ran = Rc::new(Cell::new(false));
        let (s, r) = (scheduler.clone(), ran.clone());

        let err = scheduler
            .run_task(move || -> Result<(), HarnessError> {
                s.queue_microtask(|| -> Result<(), BoxError> { Err("bad microtask".into()) })?;
                s.queue_microtask(move || r.set(true))?;
                Ok(())
            })
            .unwrap_err();

        assert!(matches!(
            err,
            HarnessError::PropagatedBody {
                origin: ErrorOrigin::Microtask,
                ..
            }
        ));
        assert!(!ran.get());
        assert_eq!(scheduler.pending_microtasks(), 0);
        assert!(!scheduler.is_active());
    }

    #[test]
    fn test_panicking_body_returns_scheduler_to_idle() {
        let scheduler = Scheduler::default();
        let s = scheduler.clone();

        let result = catch_unwind(AssertUnwindSafe(|| {
            scheduler.run_task(|| {
                s.queue_microtask(|| ()).unwrap();
                if s.is_active() {
                    panic!("body panicked");
                }
            })
        }));

        assert!(result.is_err());
        assert_eq!(scheduler.phase(), TaskPhase::Idle);
        assert_eq!(scheduler.pending_microtasks(), 0);
        assert!(scheduler.run_task(|| ()).is_ok());
    }

    #[test]
    fn test_microtask_limit() {
        let scheduler = Scheduler::new(HarnessConfig {
            max_microtasks_per_task: 10,
            ..HarnessConfig::default()
        });
        let s = scheduler.clone();

        let err = scheduler.run_task(move || requeue_forever(s)).unwrap_err();
        assert!(matches!(err, HarnessError::MicrotaskLimitExceeded { task: 1, limit: 10 }));
        assert_eq!(scheduler.pending_microtasks(), 0);
    }

    #[test]
    fn test_active_task_only_while_running() {
        let scheduler = Scheduler::default();
        let seen = Rc::new(Cell::new(None));
        let (s, out) = (scheduler.clone(), seen.clone());

        assert_eq!(scheduler.active_task(), None);
        scheduler.run_task(move || out.set(s.active_task())).unwrap();

        assert_eq!(seen.get(), Some(1));
        assert_eq!(scheduler.active_task(), None);
    }

    #[test]
    fn test_phases() {
        let scheduler = Scheduler::default();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let (s, p) = (scheduler.clone(), seen.clone());

        assert_eq!(scheduler.phase(), TaskPhase::Idle);
        scheduler
            .run_task(move || -> Result<(), HarnessError> {
                p.borrow_mut().push(s.phase());
                let (s2, p2) = (s.clone(), p.clone());
                s.queue_microtask(move || p2.borrow_mut().push(s2.phase()))
            })
            .unwrap();

        assert_eq!(
            *seen.borrow(),
            vec![TaskPhase::RunningBody, TaskPhase::DrainingMicrotasks]
        );
        assert_eq!(scheduler.phase(), TaskPhase::Idle);
    }

    // --- Async bodies ---

    #[test]
    fn test_yield_now_resumes_after_earlier_microtasks() {
        let scheduler = Scheduler::default();
        let log = new_log();
        let (s, l) = (scheduler.clone(), log.clone());

        scheduler
            .run_task_async(async move {
                push(&l, "start");
                let l2 = l.clone();
                s.queue_microtask(move || push(&l2, "microtask"))?;
                yield_now().await;
                push(&l, "resumed");
                Ok::<(), HarnessError>(())
            })
            .unwrap();

        assert_eq!(entries(&log), vec!["start", "microtask", "resumed"]);
    }

    #[test]
    fn test_deferred_resolved_by_microtask() {
        let scheduler = Scheduler::default();
        let out = Rc::new(Cell::new(0));
        let (s, o) = (scheduler.clone(), out.clone());
        let (resolver, value) = deferred::<i32>();

        scheduler
            .run_task_async(async move {
                s.queue_microtask(move || resolver.resolve(42))?;
                o.set(value.await);
                Ok::<(), HarnessError>(())
            })
            .unwrap();

        assert_eq!(out.get(), 42);
    }

    #[test]
    fn test_deferred_reports_resolution() {
        let (resolver, value) = deferred::<&str>();
        assert!(!value.is_resolved());
        resolver.resolve("done");
        assert!(value.is_resolved());
    }

    #[test]
    fn test_unresolved_deferred_stalls() {
        let scheduler = Scheduler::default();
        let (_resolver, value) = deferred::<()>();

        let err = scheduler.run_task_async(async move { value.await }).unwrap_err();
        assert!(matches!(err, HarnessError::Stalled(1)));
        assert_eq!(scheduler.phase(), TaskPhase::Idle);
    }

    #[test]
    fn test_async_body_error_propagates() {
        let scheduler = Scheduler::default();
        let err = scheduler
            .run_task_async(async {
                yield_now().await;
                Err::<(), BoxError>("async failure".into())
            })
            .unwrap_err();

        assert!(matches!(
            err,
            HarnessError::PropagatedBody {
                origin: ErrorOrigin::Body,
                ..
            }
        ));
    }

    #[test]
    fn test_async_task_is_exclusive() {
        let scheduler = Scheduler::default();
        let s = scheduler.clone();

        scheduler
            .run_task_async(async move {
                yield_now().await;
                assert!(matches!(s.run_task(|| ()), Err(HarnessError::Reentrancy { .. })));
            })
            .unwrap();
    }

    // --- Event simulator ---

    #[test]
    fn test_nothing_delivered_before_work_loop() {
        let h = Harness::default();
        let target = h.create_ref();
        let log = new_log();
        h.simulator().set_handler(target, "press", recorder(&log));

        ui_dispatch(&h, target, "press", 1, DispatchOptions::default());
        assert!(entries(&log).is_empty());
        assert_eq!(h.pending_event_count(), 1);

        let report = h.run_work_loop().unwrap();
        assert_eq!(report, WorkLoopReport { delivered: 1, skipped: 0 });
        assert_eq!(entries(&log), vec!["press:1"]);
        assert_eq!(h.pending_event_count(), 0);
    }

    #[test]
    fn test_distinct_events_delivered_in_order() {
        let h = Harness::default();
        let (a, b) = (h.create_ref(), h.create_ref());
        let log = new_log();
        h.simulator().set_handler(a, "press", recorder(&log));
        h.simulator().set_handler(a, "scroll", recorder(&log));
        h.simulator().set_handler(b, "press", recorder(&log));

        ui_dispatch(&h, a, "press", 1, DispatchOptions::default());
        ui_dispatch(&h, b, "press", 2, DispatchOptions::default());
        ui_dispatch(&h, a, "scroll", 3, DispatchOptions::default());

        assert_eq!(h.run_work_loop().unwrap().delivered, 3);
        assert_eq!(entries(&log), vec!["press:1", "press:2", "scroll:3"]);
    }

    #[test]
    fn test_unique_events_coalesce_to_latest_payload() {
        let h = Harness::default();
        let target = h.create_ref();
        let log = new_log();
        h.simulator().set_handler(target, "scroll", recorder(&log));

        ui_dispatch(&h, target, "scroll", 1, DispatchOptions::unique());
        ui_dispatch(&h, target, "scroll", 2, DispatchOptions::unique());
        assert_eq!(h.pending_event_count(), 1);

        h.run_work_loop().unwrap();
        assert_eq!(entries(&log), vec!["scroll:2"]);
    }

    #[test]
    fn test_non_unique_events_do_not_coalesce() {
        let h = Harness::default();
        let target = h.create_ref();
        let log = new_log();
        h.simulator().set_handler(target, "scroll", recorder(&log));

        ui_dispatch(&h, target, "scroll", 1, DispatchOptions::default());
        ui_dispatch(&h, target, "scroll", 2, DispatchOptions::default());

        assert_eq!(h.run_work_loop().unwrap().delivered, 2);
        assert_eq!(entries(&log), vec!["scroll:1", "scroll:2"]);
    }

    #[test]
    fn test_coalesced_event_moves_to_newest_position() {
        let h = Harness::default();
        let target = h.create_ref();
        let log = new_log();
        h.simulator().set_handler(target, "scroll", recorder(&log));
        h.simulator().set_handler(target, "press", recorder(&log));

        ui_dispatch(&h, target, "scroll", 1, DispatchOptions::unique());
        ui_dispatch(&h, target, "press", 2, DispatchOptions::default());
        let last = ui_dispatch(&h, target, "scroll", 3, DispatchOptions::unique());

        let pending: Vec<u64> = h.simulator().pending_events().iter().map(|e| e.sequence).collect();
        assert_eq!(pending, vec![2, last]);

        h.run_work_loop().unwrap();
        assert_eq!(entries(&log), vec!["press:2", "scroll:3"]);
    }

    #[test]
    fn test_unique_event_keeps_other_targets() {
        let h = Harness::default();
        let (a, b) = (h.create_ref(), h.create_ref());

        ui_dispatch(&h, a, "scroll", 1, DispatchOptions::unique());
        ui_dispatch(&h, b, "scroll", 2, DispatchOptions::unique());
        assert_eq!(h.pending_event_count(), 2);
    }

    #[test]
    fn test_direct_dispatch_runs_work_loop() {
        let h = Harness::default();
        let target = h.create_ref();
        let log = new_log();
        h.simulator().set_handler(target, "press", recorder(&log));

        h.dispatch_native_event(target, "press", None, DispatchOptions::default())
            .unwrap();

        assert_eq!(entries(&log), vec!["press:null"]);
        assert_eq!(h.pending_event_count(), 0);
    }

    #[test]
    fn test_dispatch_from_logic_side_is_rejected() {
        let h = Harness::default();
        let target = h.create_ref();
        let inner = h.clone();

        h.run_task(move || {
            let err = inner
                .dispatch_native_event(target, "press", None, DispatchOptions::default())
                .unwrap_err();
            assert!(matches!(err, HarnessError::InvalidCallContext(_)));

            // On the UI side the same call only enqueues.
            inner
                .run_on_ui_thread(|| inner.dispatch_native_event(target, "press", None, DispatchOptions::default()))
                .unwrap();
        })
        .unwrap();

        assert_eq!(h.pending_event_count(), 1);
    }

    #[test]
    fn test_work_loop_rejected_inside_task_or_ui_block() {
        let h = Harness::default();
        let inner = h.clone();

        h.run_task(move || {
            assert!(matches!(
                inner.run_work_loop(),
                Err(HarnessError::InvalidCallContext(_))
            ));
        })
        .unwrap();

        let result = h.run_on_ui_thread(|| h.run_work_loop());
        assert!(matches!(result, Err(HarnessError::InvalidCallContext(_))));
    }

    #[test]
    fn test_nested_ui_blocks() {
        let h = Harness::default();
        h.run_on_ui_thread(|| {
            h.run_on_ui_thread(|| assert!(h.simulator().is_on_ui_thread()));
            assert!(h.simulator().is_on_ui_thread());
        });
        assert!(!h.simulator().is_on_ui_thread());
    }

    #[test]
    fn test_handler_error_requeues_rest_of_batch() {
        let h = Harness::default();
        let target = h.create_ref();
        let log = new_log();
        let l = log.clone();
        h.simulator().set_handler(
            target,
            "press",
            handler(move |e: &SyntheticEvent| -> Result<(), BoxError> {
                if e.payload == PropValue::Int(2) {
                    return Err("rejected press".into());
                }
                push(&l, format!("press:{}", e.payload));
                Ok(())
            }),
        );

        for payload in 1..=3 {
            ui_dispatch(&h, target, "press", payload, DispatchOptions::default());
        }

        let err = h.run_work_loop().unwrap_err();
        assert!(matches!(
            err,
            HarnessError::PropagatedBody {
                origin: ErrorOrigin::Handler,
                ..
            }
        ));
        assert_eq!(entries(&log), vec!["press:1"]);
        assert_eq!(h.pending_event_count(), 1);

        h.run_work_loop().unwrap();
        assert_eq!(entries(&log), vec!["press:1", "press:3"]);
    }

    #[test]
    fn test_event_without_handler_is_skipped() {
        let h = Harness::default();
        let target = h.create_ref();

        ui_dispatch(&h, target, "press", 1, DispatchOptions::default());
        let report = h.run_work_loop().unwrap();
        assert_eq!(report, WorkLoopReport { delivered: 0, skipped: 1 });
    }

    #[test]
    fn test_events_dispatched_during_delivery_wait_for_next_pass() {
        let h = Harness::default();
        let target = h.create_ref();
        let log = new_log();
        h.simulator().set_handler(target, "echo", recorder(&log));

        let inner = h.clone();
        h.simulator().set_handler(
            target,
            "press",
            handler(move |_: &SyntheticEvent| {
                inner.run_on_ui_thread(|| {
                    inner.dispatch_native_event(target, "echo", None, DispatchOptions::default())
                })?;
                Ok::<(), HarnessError>(())
            }),
        );

        ui_dispatch(&h, target, "press", 1, DispatchOptions::default());
        assert_eq!(h.run_work_loop().unwrap().delivered, 1);
        assert!(entries(&log).is_empty());
        assert_eq!(h.pending_event_count(), 1);

        h.run_work_loop().unwrap();
        assert_eq!(entries(&log), vec!["echo:null"]);
    }

    #[test]
    fn test_handler_microtasks_drain_before_next_event() {
        let h = Harness::default();
        let target = h.create_ref();
        let log = new_log();
        let (l, s) = (log.clone(), h.scheduler().clone());
        h.simulator().set_handler(
            target,
            "press",
            handler(move |e: &SyntheticEvent| {
                let (l2, payload) = (l.clone(), e.payload.clone());
                push(&l, format!("handler:{payload}"));
                s.queue_microtask(move || push(&l2, format!("microtask:{payload}")))
            }),
        );

        ui_dispatch(&h, target, "press", 1, DispatchOptions::default());
        ui_dispatch(&h, target, "press", 2, DispatchOptions::default());
        h.run_work_loop().unwrap();

        assert_eq!(
            entries(&log),
            vec!["handler:1", "microtask:1", "handler:2", "microtask:2"]
        );
    }

    // --- Trace ---

    fn traced_scenario() -> TraceLog {
        let h = Harness::default();
        let target = h.create_ref();
        let log = new_log();
        h.simulator().set_handler(target, "scroll", recorder(&log));
        let s = h.scheduler().clone();
        h.run_task(move || s.queue_microtask(|| ())).unwrap();
        ui_dispatch(&h, target, "scroll", 1, DispatchOptions::unique());
        ui_dispatch(&h, target, "scroll", 2, DispatchOptions::unique());
        h.run_work_loop().unwrap();
        h.trace()
    }

    #[test]
    fn test_trace_is_reproducible() {
        let first = traced_scenario();
        let second = traced_scenario();
        assert_eq!(TraceLog::verify(&first, &second), TraceComparison::Identical);

        assert!(first.events().contains(&TraceEvent::EventCoalesced { replaced: 1, by: 2 }));
        assert!(first
            .events()
            .contains(&TraceEvent::EventDelivered { sequence: 2, task: 2 }));
    }

    #[test]
    fn test_trace_json_export() {
        let trace = traced_scenario();
        let json = trace.to_json().unwrap();
        assert!(json.contains("\"event\": \"event_coalesced\""));
        let restored = TraceLog::from_json(&json).unwrap();
        assert_eq!(restored, trace);
    }

    #[test]
    fn test_trace_divergence_reported() {
        let first = traced_scenario();
        let mut second = first.clone();
        second.record(TraceEvent::WorkLoopStarted { batch: 0 });
        assert!(matches!(
            TraceLog::verify(&first, &second),
            TraceComparison::Diverged { .. }
        ));
    }

    #[test]
    fn test_trace_rejects_newer_version() {
        let err = TraceLog::from_json(r#"{"version": 99, "events": []}"#).unwrap_err();
        assert!(err.contains("unsupported trace log version 99"));
    }

    #[test]
    fn test_trace_can_be_disabled() {
        let h = Harness::new(HarnessConfig {
            trace: false,
            ..HarnessConfig::default()
        });
        h.run_task(|| ()).unwrap();
        assert!(h.trace().events().is_empty());
    }

    #[test]
    fn test_clear_trace() {
        let h = Harness::default();
        h.run_task(|| ()).unwrap();
        assert!(!h.trace().events().is_empty());

        h.scheduler().clear_trace();
        assert!(h.trace().events().is_empty());
        assert_eq!(h.trace().version(), 1);
    }

    // --- Config ---

    #[test]
    fn test_config_from_json() {
        let config = HarnessConfig::from_json(r#"{"maxMicrotasksPerTask": 5}"#).unwrap();
        assert_eq!(config.max_microtasks_per_task, 5);
        assert!(config.trace);

        let root = RootConfig::from_json(r#"{"viewportWidth": 100}"#).unwrap();
        assert_eq!(root.viewport_width, 100.0);
        assert_eq!(root.viewport_height, 844.0);
        assert_eq!(root.point_scale_factor, 3.0);
    }

    #[test]
    fn test_negative_viewport_rejected() {
        let err = RootConfig::from_json(r#"{"viewportWidth": -1}"#).unwrap_err();
        assert!(matches!(err, HarnessError::Config(_)));
    }

    // --- Renderer ---

    fn render(renderer: &mut FlowRenderer, element: &Element) -> Vec<HostNode> {
        renderer
            .render(element, &RootConfig::default())
            .unwrap()
            .into_iter()
            .filter_map(|c| match c {
                HostChild::Node(n) => Some(n),
                HostChild::Text(_) => None,
            })
            .collect()
    }

    #[test]
    fn test_flow_renderer_sizes_fixed_box() {
        let el = Element::view()
            .with_prop("width", 100)
            .with_prop("height", 100)
            .with_prop("collapsable", false);
        let nodes = render(&mut FlowRenderer::default(), &el);

        assert_eq!(nodes.len(), 1);
        let node = &nodes[0];
        assert_eq!(node.prop("width"), Some(&PropValue::Float(100.0)));
        assert!(node.prop("collapsable").is_none());
        let layout = node.layout.as_ref().unwrap();
        assert_eq!(layout.frame, Rect::new(0.0, 0.0, 100.0, 100.0));
        assert_eq!(layout.point_scale_factor, 3.0);
    }

    #[test]
    fn test_flow_renderer_flattens_layout_only_views() {
        let el = Element::view()
            .with_prop("padding", 10)
            .with_child(Element::view().with_prop("backgroundColor", "red").with_prop("height", 30));
        let nodes = render(&mut FlowRenderer::default(), &el);

        assert_eq!(nodes.len(), 1);
        let inner = &nodes[0];
        assert_eq!(inner.prop("backgroundColor"), Some(&PropValue::from("red")));
        let frame = inner.layout.as_ref().unwrap().frame;
        assert_eq!((frame.x, frame.y, frame.width, frame.height), (10.0, 10.0, 370.0, 30.0));
    }

    #[test]
    fn test_flow_renderer_without_flattening_keeps_wrappers() {
        let el = Element::view()
            .with_prop("padding", 10)
            .with_child(Element::view().with_prop("backgroundColor", "red").with_prop("height", 30));
        let nodes = render(&mut FlowRenderer::without_flattening(), &el);

        assert_eq!(nodes.len(), 1);
        let outer = &nodes[0];
        assert_eq!(outer.layout.as_ref().unwrap().frame.height, 50.0);
        let inner = outer.child_nodes().next().unwrap();
        let frame = inner.layout.as_ref().unwrap().frame;
        assert_eq!((frame.x, frame.y), (10.0, 10.0));
    }

    #[test]
    fn test_flow_renderer_views_with_refs_survive() {
        let el = Element::view().with_ref(NodeRef(1));
        assert_eq!(render(&mut FlowRenderer::default(), &el).len(), 1);
    }

    #[test]
    fn test_flow_renderer_stacks_text_and_children() {
        let el = Element::view()
            .with_prop("collapsable", false)
            .with_child(Element::text("one"))
            .with_child(Element::view().with_prop("height", 15).with_prop("opacity", 0.5))
            .with_child(Element::text("two").with_prop("lineHeight", 30));
        let nodes = render(&mut FlowRenderer::default(), &el);

        let outer = &nodes[0];
        assert_eq!(outer.layout.as_ref().unwrap().frame.height, 65.0);
        let ys: Vec<f64> = outer
            .child_nodes()
            .map(|n| n.layout.as_ref().unwrap().frame.y)
            .collect();
        assert_eq!(ys, vec![0.0, 20.0, 35.0]);
        assert_eq!(outer.child_nodes().next().unwrap().text_content(), "one");
    }

    #[test]
    fn test_flow_renderer_reports_overflow() {
        let el = Element::view()
            .with_prop("height", 10)
            .with_prop("collapsable", false)
            .with_child(Element::view().with_prop("height", 30).with_prop("opacity", 1));
        let nodes = render(&mut FlowRenderer::default(), &el);

        let overflow = nodes[0].layout.as_ref().unwrap().overflow_inset;
        assert_eq!(overflow.bottom, -20.0);
        assert_eq!(overflow.right, 0.0);
    }

    #[test]
    fn test_flow_renderer_direction_and_display() {
        let el = Element::fragment([
            Element::view().with_prop("direction", "rtl").with_prop("opacity", 1),
            Element::view().with_prop("display", "none").with_child(Element::text("hidden")),
        ]);
        let nodes = render(&mut FlowRenderer::default(), &el);

        assert_eq!(nodes.len(), 2);
        let rtl = nodes[0].layout.as_ref().unwrap();
        assert_eq!(rtl.layout_direction, LayoutDirection::RightToLeft);
        let hidden = nodes[1].layout.as_ref().unwrap();
        assert_eq!(hidden.display_type, DisplayType::None);
        assert_eq!(hidden.frame.width, 0.0);
        assert!(nodes[1].children.is_empty());
    }

    #[test]
    fn test_flow_renderer_rejects_bad_dimensions() {
        let negative = Element::view().with_prop("width", -5);
        let err = FlowRenderer::default()
            .render(&negative, &RootConfig::default())
            .unwrap_err();
        assert!(matches!(err, HarnessError::Render(_)));

        let text = Element::view().with_prop("height", "tall");
        assert!(FlowRenderer::default().render(&text, &RootConfig::default()).is_err());
    }

    // --- Elements ---

    #[test]
    fn test_handler_bindings_need_refs() {
        let el = Element::view()
            .on("press", |_: &SyntheticEvent| ())
            .with_child(Element::view().with_ref(NodeRef(7)).on("press", |_: &SyntheticEvent| ()));
        let bindings = el.handler_bindings();
        assert_eq!(bindings.len(), 1);
        assert_eq!(bindings[0].0, NodeRef(7));
        assert_eq!(bindings[0].1, "press");
    }

    #[test]
    fn test_hidden_subtree_binds_no_handlers() {
        let el = Element::view()
            .with_ref(NodeRef(1))
            .with_prop("display", "none")
            .on("press", |_: &SyntheticEvent| ())
            .with_child(Element::view().with_ref(NodeRef(2)).on("press", |_: &SyntheticEvent| ()));
        assert!(el.is_hidden());

        let targets: Vec<NodeRef> = el.handler_bindings().into_iter().map(|(r, _, _)| r).collect();
        assert_eq!(targets, vec![NodeRef(1)]);
    }
}

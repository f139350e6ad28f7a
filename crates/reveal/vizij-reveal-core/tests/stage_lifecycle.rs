use vizij_reveal_core::{
    host::HostCall, Change, Config, CoreEvent, CounterConfig, CounterPhase, InstId,
    IntersectionSample, ManualHost, RevealConfig, Stage,
};

fn stage() -> Stage<ManualHost> {
    Stage::new(Config::default(), ManualHost::new())
}

fn show(stage: &mut Stage<ManualHost>, target: &str, ratio: f64) -> Vec<CoreEvent> {
    match stage.host().subscription_for(target) {
        Some(sub) => stage
            .on_intersection(sub, IntersectionSample::from_ratio(ratio))
            .events
            .clone(),
        None => Vec::new(),
    }
}

fn pump(stage: &mut Stage<ManualHost>, t: f64) -> bool {
    match stage.host_mut().next_frame() {
        Some(h) => {
            stage.on_frame(h, t);
            true
        }
        None => false,
    }
}

#[test]
fn reveal_emits_initial_state_then_visible_once() {
    let mut st = stage();
    let cfg = RevealConfig {
        delay_ms: 200,
        class_name: "project-card".into(),
        ..RevealConfig::default()
    };
    let id = st.mount_reveal(Some("card"), &cfg).unwrap();
    match &st.outputs().changes[..] {
        [Change::Reveal {
            visible,
            class_list,
            transition_delay_ms,
            ..
        }] => {
            assert!(!visible);
            assert_eq!(class_list, "reveal-item project-card");
            assert_eq!(*transition_delay_ms, 200);
        }
        other => panic!("unexpected changes {other:?}"),
    }

    let events = show(&mut st, "card", 0.3);
    assert_eq!(events, vec![CoreEvent::Revealed { inst: id }]);
    assert_eq!(st.is_visible(id), Some(true));
    assert_eq!(
        st.reveal(id).unwrap().class_list(),
        "reveal-item visible project-card"
    );

    // Subscription is gone; later records have nowhere to go.
    assert_eq!(st.host().active_subscriptions(), 0);
    assert!(show(&mut st, "card", 1.0).is_empty());
    assert_eq!(st.is_visible(id), Some(true));
}

#[test]
fn counter_runs_through_stage_and_finishes_exactly() {
    let mut st = stage();
    let cfg = CounterConfig {
        target: 250,
        duration_ms: Some(2000.0),
        suffix: "+".into(),
        ..CounterConfig::default()
    };
    let id = st.mount_counter(Some("projects"), &cfg).unwrap();
    assert_eq!(st.counter_phase(id), Some(CounterPhase::Idle));

    // Below the counter's 0.5 default threshold.
    assert!(show(&mut st, "projects", 0.3).is_empty());
    assert_eq!(
        show(&mut st, "projects", 0.75),
        vec![CoreEvent::CounterStarted {
            inst: id,
            target: 250
        }]
    );

    let mut values = vec![];
    let mut t = 1000.0;
    while pump(&mut st, t) {
        values.push(st.counter_value(id).unwrap());
        t += 16.0;
    }
    assert_eq!(values.first(), Some(&0));
    assert!(values.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(values.last(), Some(&250));
    assert_eq!(st.counter_phase(id), Some(CounterPhase::Done));
    assert_eq!(
        st.outputs().events,
        vec![CoreEvent::CounterFinished { inst: id, value: 250 }]
    );
    match &st.outputs().changes[..] {
        [Change::Counter { text, .. }] => assert_eq!(text, "250+"),
        other => panic!("unexpected changes {other:?}"),
    }
}

#[test]
fn unmount_mid_animation_stops_all_mutation() {
    let mut st = stage();
    let id = st.mount_counter(Some("c"), &CounterConfig::new(100)).unwrap();
    show(&mut st, "c", 1.0);
    pump(&mut st, 0.0);
    pump(&mut st, 100.0);
    let before = st.counter_value(id).unwrap();
    let pending = st.host().pending_frames();
    assert_eq!(pending.len(), 1);

    assert!(st.unmount(id));
    assert_eq!(st.outputs().events, vec![CoreEvent::Cancelled { inst: id }]);
    assert!(st.host().pending_frames().is_empty());
    assert!(!st.unmount(id));

    // A tick that was already in flight when the owner went away.
    let out = st.on_frame(pending[0], 200.0);
    assert!(out.is_empty());
    assert!(st.counter_value(id).is_none());
    assert!(before < 100);
}

#[test]
fn deferred_target_attaches_later() {
    let mut st = stage();
    let id = st.mount_reveal(None, &RevealConfig::default()).unwrap();
    assert_eq!(st.outputs().events, vec![CoreEvent::Deferred { inst: id }]);
    assert!(st.outputs().changes.is_empty());
    assert_eq!(st.host().active_subscriptions(), 0);

    st.host_mut().detach_target("late");
    let out = st.attach(id, "late").unwrap();
    assert_eq!(out.events, vec![CoreEvent::Deferred { inst: id }]);

    st.host_mut().attach_target("late");
    st.retry_deferred();
    assert_eq!(st.host().active_subscriptions(), 1);
    show(&mut st, "late", 1.0);
    assert_eq!(st.is_visible(id), Some(true));
}

#[test]
fn attach_unknown_instance_is_an_error() {
    let mut st = stage();
    assert!(st.attach(InstId(42), "x").is_err());
}

#[test]
fn invalid_config_is_rejected_without_mounting() {
    let mut st = stage();
    let cfg = RevealConfig {
        threshold: Some(f64::NAN),
        ..RevealConfig::default()
    };
    assert!(st.mount_reveal(Some("a"), &cfg).is_err());
    assert_eq!(st.live_instances(), 0);
    assert_eq!(st.host().active_subscriptions(), 0);
}

#[test]
fn instances_are_independent() {
    let mut st = stage();
    let a = st.mount_reveal(Some("a"), &RevealConfig::with_delay(0)).unwrap();
    let b = st.mount_reveal(Some("b"), &RevealConfig::with_delay(100)).unwrap();
    let c = st.mount_counter(Some("c"), &CounterConfig::new(10)).unwrap();
    show(&mut st, "b", 1.0);
    assert_eq!(st.is_visible(a), Some(false));
    assert_eq!(st.is_visible(b), Some(true));
    assert_eq!(st.counter_phase(c), Some(CounterPhase::Idle));
    assert_eq!(st.host().active_subscriptions(), 2);
}

#[test]
fn teardown_all_releases_everything_once() {
    let mut st = stage();
    st.mount_reveal(Some("a"), &RevealConfig::default()).unwrap();
    let c = st.mount_counter(Some("c"), &CounterConfig::new(10)).unwrap();
    show(&mut st, "c", 1.0);
    assert_eq!(st.host().active_subscriptions(), 1);
    assert_eq!(st.host().pending_frames().len(), 1);

    let events = st.teardown_all().events.clone();
    assert_eq!(events.len(), 2);
    assert!(events.contains(&CoreEvent::Cancelled { inst: c }));
    assert_eq!(st.live_instances(), 0);
    assert_eq!(st.host().active_subscriptions(), 0);
    assert!(st.host().pending_frames().is_empty());

    let cancels = st
        .host()
        .count_calls(|call| matches!(call, HostCall::CancelFrame(_)));
    st.teardown_all();
    assert_eq!(
        st.host()
            .count_calls(|call| matches!(call, HostCall::CancelFrame(_))),
        cancels
    );
}

#[test]
fn finished_instances_unmount_quietly() {
    let mut st = stage();
    let id = st.mount_reveal(Some("a"), &RevealConfig::default()).unwrap();
    show(&mut st, "a", 1.0);
    assert!(st.unmount(id));
    assert!(st.outputs().events.is_empty());
}

#[test]
fn reattaching_a_running_counter_is_not_a_deferral() {
    let mut st = stage();
    let id = st.mount_counter(Some("c"), &CounterConfig::new(100)).unwrap();
    show(&mut st, "c", 1.0);
    pump(&mut st, 0.0);
    assert_eq!(st.counter_phase(id), Some(CounterPhase::Animating));

    let out = st.attach(id, "c").unwrap();
    assert!(out.events.is_empty());
    assert_eq!(out.changes.len(), 1);
    assert_eq!(out.changes[0].inst(), id);
}

#[test]
fn observer_options_reach_the_host() {
    let mut st = stage();
    let cfg = CounterConfig {
        root_margin: Some("0px 0px -10% 0px".into()),
        ..CounterConfig::new(40)
    };
    let id = st.mount_counter(Some("stat"), &cfg).unwrap();
    assert_eq!(st.outputs().changes[0].inst(), id);

    let sub = st.host().subscription_for("stat").unwrap();
    let opts = st.host().options_for(sub).unwrap();
    assert_eq!(opts.root_margin().to_string(), "0px 0px -10% 0px");
    assert_eq!(opts.threshold(), 0.5);
    assert_eq!(
        st.host().calls(),
        &[HostCall::Observe {
            subscription: sub,
            target: "stat".into(),
            threshold: 0.5,
        }]
    );
}

#[test]
fn targets_lists_bound_instances() {
    let mut st = stage();
    st.mount_reveal(Some("a"), &RevealConfig::default()).unwrap();
    st.mount_reveal(None, &RevealConfig::default()).unwrap();
    st.mount_counter(Some("c"), &CounterConfig::new(3)).unwrap();
    let mut targets: Vec<&str> = st.targets().collect();
    targets.sort();
    assert_eq!(targets, vec!["a", "c"]);

    st.teardown_all();
    assert_eq!(st.targets().count(), 0);
}

use vizij_reveal_core::{
    host::HostCall, Config, CounterConfig, CounterPhase, Easing, InstId, IntersectionSample,
    ManualHost, RevealConfig, Stage,
};

fn counter_stage(target: i64, duration_ms: f64, threshold: f64) -> (Stage<ManualHost>, InstId) {
    let mut st = Stage::new(Config::default(), ManualHost::new());
    let cfg = CounterConfig {
        target,
        duration_ms: Some(duration_ms),
        threshold: Some(threshold),
        ..CounterConfig::default()
    };
    let id = st.mount_counter(Some("stat"), &cfg).unwrap();
    (st, id)
}

fn make_visible(st: &mut Stage<ManualHost>, target: &str) {
    let sub = st.host().subscription_for(target).unwrap();
    st.on_intersection(sub, IntersectionSample::from_ratio(1.0));
}

/// Deliver the next pending frame at `t`; `None` once nothing is scheduled.
fn tick(st: &mut Stage<ManualHost>, t: f64) -> Option<()> {
    let h = st.host_mut().next_frame()?;
    st.on_frame(h, t);
    Some(())
}

#[test]
fn scenario_100_over_1000ms() {
    let (mut st, id) = counter_stage(100, 1000.0, 0.5);
    make_visible(&mut st, "stat");

    tick(&mut st, 0.0).unwrap();
    assert_eq!(st.counter_value(id), Some(0));
    tick(&mut st, 500.0).unwrap();
    assert_eq!(st.counter_value(id), Some(96));
    tick(&mut st, 1000.0).unwrap();
    assert_eq!(st.counter_value(id), Some(100));
    assert_eq!(st.counter_phase(id), Some(CounterPhase::Done));
    assert!(tick(&mut st, 1016.0).is_none());
}

#[test]
fn lands_exactly_on_target_for_uneven_frames() {
    for (target, duration) in [(250, 2000.0), (1, 300.0), (99_999, 1234.0), (7, 16.0)] {
        let (mut st, id) = counter_stage(target, duration, 0.5);
        make_visible(&mut st, "stat");
        let mut t = 3.7;
        let mut prev = 0;
        while tick(&mut st, t).is_some() {
            let v = st.counter_value(id).unwrap();
            assert!(v >= prev, "value went backwards for target {target}");
            prev = v;
            t += 16.67;
        }
        assert_eq!(prev, target as u64);
    }
}

#[test]
fn zero_target_stays_zero_at_every_tick() {
    for duration in [0.0, 16.0, 2000.0] {
        let (mut st, id) = counter_stage(0, duration, 0.5);
        make_visible(&mut st, "stat");
        let mut t = 0.0;
        while tick(&mut st, t).is_some() {
            assert_eq!(st.counter_value(id), Some(0));
            t += 16.0;
        }
        assert_eq!(st.counter_phase(id), Some(CounterPhase::Done));
    }
}

#[test]
fn visibility_latches_for_every_threshold() {
    for threshold in [0.0, 0.1, 0.25, 0.5, 0.75, 1.0] {
        let mut st = Stage::new(Config::default(), ManualHost::new());
        let cfg = RevealConfig {
            threshold: Some(threshold),
            ..RevealConfig::default()
        };
        let id = st.mount_reveal(Some("r"), &cfg).unwrap();
        let sub = st.host().subscription_for("r").unwrap();

        if threshold > 0.0 {
            st.on_intersection(sub, IntersectionSample::from_ratio(threshold / 2.0));
            assert_eq!(st.is_visible(id), Some(false), "threshold {threshold}");
        }
        st.on_intersection(sub, IntersectionSample::new(threshold, true));
        assert_eq!(st.is_visible(id), Some(true), "threshold {threshold}");

        st.on_intersection(sub, IntersectionSample::hidden());
        assert_eq!(st.is_visible(id), Some(true));

        let observes = st
            .host()
            .count_calls(|c| matches!(c, HostCall::Observe { .. }));
        let unobserves = st
            .host()
            .count_calls(|c| matches!(c, HostCall::Unobserve(_)));
        assert_eq!((observes, unobserves), (1, 1));
    }
}

#[test]
fn counter_visibility_fires_once_and_requests_one_frame_chain() {
    let (mut st, _) = counter_stage(10, 100.0, 0.5);
    let sub = st.host().subscription_for("stat").unwrap();
    for _ in 0..3 {
        st.on_intersection(sub, IntersectionSample::from_ratio(1.0));
    }
    assert_eq!(st.host().pending_frames().len(), 1);
}

#[test]
fn configured_easing_is_used() {
    let mut st = Stage::new(Config::default(), ManualHost::new());
    let cfg = CounterConfig {
        target: 100,
        duration_ms: Some(1000.0),
        easing: Some(Easing::Linear),
        ..CounterConfig::default()
    };
    let id = st.mount_counter(Some("stat"), &cfg).unwrap();
    make_visible(&mut st, "stat");
    tick(&mut st, 0.0);
    tick(&mut st, 500.0);
    assert_eq!(st.counter_value(id), Some(50));
}

#[test]
fn stage_defaults_come_from_json_config() {
    let cfg = Config::from_json(
        r#"{ "counter": { "duration_ms": 100, "easing": "linear" },
             "reveal": { "visible_class": "is-in" } }"#,
    )
    .unwrap();
    let mut st = Stage::new(cfg, ManualHost::new());
    let r = st.mount_reveal(Some("r"), &RevealConfig::default()).unwrap();
    let c = st.mount_counter(Some("c"), &CounterConfig::new(10)).unwrap();
    make_visible(&mut st, "r");
    make_visible(&mut st, "c");
    assert_eq!(st.reveal(r).unwrap().class_list(), "reveal-item is-in");
    tick(&mut st, 0.0);
    tick(&mut st, 50.0);
    assert_eq!(st.counter_value(c), Some(5));
    assert_eq!(st.counter(c).unwrap().duration_ms(), 100.0);
}

#[test]
fn host_clock_glitches_never_lower_the_counter() {
    let (mut st, id) = counter_stage(100, 1000.0, 0.5);
    make_visible(&mut st, "stat");

    let mut values = vec![];
    for t in [100.0, 600.0, 200.0, f64::NAN] {
        tick(&mut st, t).unwrap();
        values.push(st.counter_value(id).unwrap());
    }
    assert_eq!(values, vec![0, 96, 96, 96]);
    assert_eq!(st.counter_phase(id), Some(CounterPhase::Animating));

    tick(&mut st, 1100.0).unwrap();
    assert_eq!(st.counter_value(id), Some(100));
    assert_eq!(st.counter_phase(id), Some(CounterPhase::Done));
}

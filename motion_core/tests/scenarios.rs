//! End-to-end runs of both pipelines against an in-memory sink.

use motion_core::{
    ArmCommand, ArmConfig, ArmPipeline, GestureEvent, HandFrame, MemorySink, Pipeline,
    PointerCommand, PointerConfig, PointerPipeline, PoseSample, Vector3, WireSink,
};

fn pointer_frame(vx: f32, vy: f32, grab: f32, t: i64) -> HandFrame {
    HandFrame::single(PoseSample::new(
        Vector3::new(0.0, 150.0, 0.0),
        Vector3::new(vx, vy, 0.0),
        grab,
        t,
    ))
}

#[test]
fn pointer_fifth_identical_sample_is_sent() {
    let mut p = PointerPipeline::default();
    let mut sink = MemorySink::new();

    for t in 0..4 {
        p.on_frame(&pointer_frame(150.0, 0.0, 0.0, t * 10), &mut sink);
        assert!(sink.sent.is_empty(), "frame {} leaked through", t);
    }
    p.on_frame(&pointer_frame(150.0, 0.0, 0.0, 40), &mut sink);

    assert_eq!(
        sink.sent,
        vec![PointerCommand { up: 0, down: 0, right: 0, left: 25, click: 0 }]
    );
}

#[test]
fn pointer_dead_zone_frames_do_not_advance_window() {
    let mut p = PointerPipeline::default();
    let mut sink = MemorySink::new();

    let mut t = 0;
    for _ in 0..4 {
        p.on_frame(&pointer_frame(150.0, 0.0, 0.0, t), &mut sink);
        p.on_frame(&pointer_frame(20.0, -50.0, 0.0, t + 1), &mut sink);
        t += 2;
    }
    assert!(sink.sent.is_empty());
    p.on_frame(&pointer_frame(-300.0, 250.0, 0.9, t), &mut sink);
    assert_eq!(sink.wire_strings(), vec!["41,0,50,0,1"]);
}

#[test]
fn pointer_tap_click_sequence_over_wire() {
    let mut p = PointerPipeline::new(&PointerConfig::default()).with_last_tap(-600);
    let mut sink = WireSink::new(Vec::new());

    let frame = pointer_frame(0.0, 0.0, 0.0, 0).with_gesture(GestureEvent::tap(0));
    p.on_frame(&frame, &mut sink);
    p.poll(50, &mut sink);
    p.poll(100, &mut sink);
    p.poll(150, &mut sink);

    let wire = String::from_utf8(sink.into_inner().unwrap()).unwrap();
    assert_eq!(wire, "0,0,0,0,10,0,0,0,0");
    assert_eq!(p.frame_count(), 0);
}

#[test]
fn arm_clamped_pose_sent_after_twenty_accumulated_frames() {
    let mut p = ArmPipeline::new(&ArmConfig::default());
    let mut sink = MemorySink::new();

    // grab strength 0.5 scales to 30
    let hand = PoseSample::new(
        Vector3::new(100.0, 200.0, -50.0),
        Vector3::new(1.0, 0.0, 0.0),
        0.5,
        0,
    );

    for _ in 0..20 {
        p.on_frame(&HandFrame::single(hand), &mut sink);
    }
    assert!(sink.sent.is_empty());
    assert_eq!(p.frame_count(), 20);

    p.on_frame(&HandFrame::single(hand), &mut sink);
    assert_eq!(
        sink.sent,
        vec![ArmCommand { grab: 30, base: 0, vertical: 120, front_back: 60 }]
    );
    assert_eq!(p.frame_count(), 0);
}

#[test]
fn arm_emitted_angles_stay_in_servo_ranges() {
    let mut p = ArmPipeline::new(&ArmConfig { send_threshold: 0, ..ArmConfig::default() });
    let mut sink = MemorySink::new();

    let mut t = 0i64;
    for xi in -6..=6 {
        for yi in 0..=6 {
            for zi in -4..=4 {
                let pos = Vector3::new(xi as f32 * 33.3, yi as f32 * 41.0, zi as f32 * 17.5);
                let hand = PoseSample::new(pos, Vector3::new(0.0, 2.0, 0.0), (t % 11) as f32 / 10.0, t);
                p.on_frame(&HandFrame::single(hand), &mut sink);
                t += 1;
            }
        }
    }

    assert_eq!(sink.sent.len(), t as usize);
    for cmd in &sink.sent {
        assert!((0..=180).contains(&cmd.base), "{:?}", cmd);
        assert!((30..=120).contains(&cmd.vertical), "{:?}", cmd);
        assert!((0..=60).contains(&cmd.front_back), "{:?}", cmd);
        assert!((5..=55).contains(&cmd.grab), "{:?}", cmd);
    }
}

#[test]
fn config_defaults_load_from_empty_toml() {
    let pointer: PointerConfig = toml::from_str("").unwrap();
    assert_eq!(pointer, PointerConfig::default());
    let arm: ArmConfig = toml::from_str("send_threshold = 50\n").unwrap();
    assert_eq!(arm.send_threshold, 50);
    assert_eq!(arm.x_range, [-90, 90]);
}

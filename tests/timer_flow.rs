use keyflow::TimerFlow;

#[test]
fn zero_intervals_fire_on_every_poll() {
    let mut timer = TimerFlow::new(0, 0);
    assert!(timer.should_fire(0));
    timer.mark_fired(0);
    assert!(timer.should_fire(0));
}

#[test]
fn fire_interval_spaces_evaluations() {
    let mut timer = TimerFlow::new(0, 10_000);
    assert!(timer.should_fire(1_000));
    timer.mark_fired(1_000);
    assert!(!timer.should_fire(5_000));
    assert!(!timer.should_fire(10_999));
    assert!(timer.should_fire(11_000));
    timer.mark_fired(11_000);
    assert_eq!(timer.last_fired_at_ms(), Some(11_000));
}

#[test]
fn trigger_interval_gates_the_poll() {
    let mut timer = TimerFlow::new(2_000, 0);
    assert!(timer.should_fire(0));
    timer.mark_fired(0);
    assert!(!timer.should_fire(1_999));
    assert!(timer.should_fire(2_000));
}

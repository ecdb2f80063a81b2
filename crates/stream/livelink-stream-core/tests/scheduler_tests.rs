use std::thread;
use std::time::{Duration, Instant};

use livelink_stream::{
    CancelToken, FrameClock, FrameScheduler, SchedulerState, SinkError, StepBudget, StreamError,
    Unpaced,
};

const EPS: f64 = 1e-9;

fn unpaced(fps: f64) -> FrameScheduler<Unpaced> {
    FrameScheduler::with_pacer(FrameClock::from_fps(fps).unwrap(), Unpaced)
}

#[test]
fn finite_budget_delivers_exactly_n_frames() {
    for n in [1u64, 2, 7, 100] {
        let mut sched = unpaced(24.0);
        let mut seen = Vec::new();
        let mut sink = |_: &str, t: f64, i: &u64| -> Result<(), SinkError> {
            seen.push((*i, t));
            Ok(())
        };
        let report = sched
            .run("s", |i, _| i, &mut sink, StepBudget::Finite(n), &CancelToken::new())
            .unwrap();
        assert_eq!(report.state, SchedulerState::Completed);
        assert_eq!(report.ticks, n);
        assert_eq!(seen.len() as u64, n);
        for (k, (index, _)) in seen.iter().enumerate() {
            assert_eq!(*index, k as u64);
        }
    }
}

#[test]
fn world_time_steps_by_period() {
    let mut sched = unpaced(24.0);
    let mut times = Vec::new();
    let mut sink = |_: &str, t: f64, _: &()| -> Result<(), SinkError> {
        times.push(t);
        Ok(())
    };
    let report = sched
        .run("s", |_, _| (), &mut sink, StepBudget::Finite(3), &CancelToken::new())
        .unwrap();
    let expected = [0.0, 1.0 / 24.0, 2.0 / 24.0];
    assert_eq!(times.len(), 3);
    for (got, want) in times.iter().zip(expected) {
        assert!((got - want).abs() < EPS, "{got} vs {want}");
    }
    assert!((report.world_time - 3.0 / 24.0).abs() < EPS);
    assert_eq!(sched.clock().frame_index(), 3);
}

#[test]
fn producer_sees_the_same_time_as_the_sink() {
    let mut sched = unpaced(60.0);
    let mut sink = |_: &str, t: f64, produced: &f64| -> Result<(), SinkError> {
        assert_eq!(t, *produced);
        Ok(())
    };
    sched
        .run("s", |_, t| t, &mut sink, StepBudget::Finite(10), &CancelToken::new())
        .unwrap();
}

#[test]
fn slow_sink_does_not_skew_logical_time() {
    // 2 ms period, 5 ms sink: wall time runs ahead, world_time must not.
    let mut sched = FrameScheduler::new(FrameClock::from_fps(500.0).unwrap());
    let mut times = Vec::new();
    let mut sink = |_: &str, t: f64, _: &()| -> Result<(), SinkError> {
        thread::sleep(Duration::from_millis(5));
        times.push(t);
        Ok(())
    };
    let report = sched
        .run("s", |_, _| (), &mut sink, StepBudget::Finite(4), &CancelToken::new())
        .unwrap();
    for (k, t) in times.iter().enumerate() {
        assert!((t - k as f64 * 0.002).abs() < EPS);
    }
    assert!(report.elapsed >= Duration::from_millis(20));
}

#[test]
fn real_time_pacing_spaces_ticks() {
    let mut sched = FrameScheduler::new(FrameClock::from_fps(100.0).unwrap());
    let started = Instant::now();
    let mut sink = |_: &str, _: f64, _: &()| -> Result<(), SinkError> { Ok(()) };
    let report = sched
        .run("s", |_, _| (), &mut sink, StepBudget::Finite(5), &CancelToken::new())
        .unwrap();
    // four waits of ~10 ms; the final tick is not followed by a wait
    assert!(started.elapsed() >= Duration::from_millis(35));
    assert_eq!(report.ticks, 5);
}

#[test]
fn unpaced_runs_back_to_back() {
    let mut sched = unpaced(1.0);
    let mut sink = |_: &str, _: f64, _: &()| -> Result<(), SinkError> { Ok(()) };
    let report = sched
        .run("s", |_, _| (), &mut sink, StepBudget::Finite(50), &CancelToken::new())
        .unwrap();
    assert!(report.elapsed < Duration::from_secs(5));
    assert!((report.world_time - 50.0).abs() < EPS);
}

#[test]
fn pre_cancelled_token_delivers_nothing() {
    let cancel = CancelToken::new();
    cancel.cancel();
    let mut sched = unpaced(24.0);
    let mut calls = 0;
    let mut sink = |_: &str, _: f64, _: &()| -> Result<(), SinkError> {
        calls += 1;
        Ok(())
    };
    let report = sched
        .run("s", |_, _| (), &mut sink, StepBudget::Unbounded, &cancel)
        .unwrap();
    assert_eq!(report.state, SchedulerState::Cancelled);
    assert_eq!(report.ticks, 0);
    assert_eq!(calls, 0);
}

#[test]
fn cancel_takes_effect_before_next_tick() {
    let cancel = CancelToken::new();
    let trigger = cancel.clone();
    let mut sched = unpaced(24.0);
    let mut calls = 0u64;
    let mut sink = |_: &str, _: f64, _: &()| -> Result<(), SinkError> {
        calls += 1;
        if calls == 3 {
            trigger.cancel();
        }
        Ok(())
    };
    let report = sched
        .run("s", |_, _| (), &mut sink, StepBudget::Unbounded, &cancel)
        .unwrap();
    assert_eq!(calls, 3);
    assert_eq!(report.state, SchedulerState::Cancelled);
    assert_eq!(report.ticks, 3);
    assert_eq!(sched.state(), SchedulerState::Cancelled);
}

#[test]
fn cancel_from_another_thread_stops_unbounded_run() {
    let cancel = CancelToken::new();
    let remote = cancel.clone();
    let handle = thread::spawn(move || {
        thread::sleep(Duration::from_millis(50));
        remote.cancel();
    });
    let mut sched = FrameScheduler::new(FrameClock::from_fps(200.0).unwrap());
    let mut sink = |_: &str, _: f64, _: &()| -> Result<(), SinkError> { Ok(()) };
    let report = sched
        .run("s", |_, _| (), &mut sink, StepBudget::Unbounded, &cancel)
        .unwrap();
    handle.join().unwrap();
    assert_eq!(report.state, SchedulerState::Cancelled);
    assert!(report.ticks > 0);
}

#[test]
fn sink_failure_stops_at_failing_tick() {
    let mut sched = unpaced(24.0);
    let mut indices = Vec::new();
    let mut sink = |_: &str, _: f64, i: &u64| -> Result<(), SinkError> {
        indices.push(*i);
        if *i == 4 {
            return Err(SinkError::Rejected("host went away".into()));
        }
        Ok(())
    };
    let err = sched
        .run("manny", |i, _| i, &mut sink, StepBudget::Finite(10), &CancelToken::new())
        .unwrap_err();
    assert_eq!(indices, vec![0, 1, 2, 3, 4]);
    match err {
        StreamError::SinkDelivery {
            subject,
            tick,
            source,
        } => {
            assert_eq!(subject, "manny");
            assert_eq!(tick, Some(4));
            assert_eq!(source, SinkError::Rejected("host went away".into()));
        }
        other => panic!("unexpected error {other:?}"),
    }
    assert_eq!(sched.state(), SchedulerState::Failed);
    // the failed tick did not advance the clock
    assert_eq!(sched.clock().frame_index(), 4);
}

#[test]
fn tick_over_deadline_fails_the_run() {
    let mut sched = unpaced(24.0).with_tick_deadline(Some(Duration::from_millis(5)));
    let mut sink = |_: &str, _: f64, i: &u64| -> Result<(), SinkError> {
        if *i == 1 {
            thread::sleep(Duration::from_millis(20));
        }
        Ok(())
    };
    let err = sched
        .run("s", |i, _| i, &mut sink, StepBudget::Finite(5), &CancelToken::new())
        .unwrap_err();
    assert!(matches!(
        err,
        StreamError::SinkDelivery {
            tick: Some(1),
            source: SinkError::DeadlineExceeded { .. },
            ..
        }
    ));
    assert_eq!(sched.state(), SchedulerState::Failed);
}

#[test]
fn error_message_names_subject_and_tick() {
    let mut sched = unpaced(24.0);
    let mut sink = |_: &str, _: f64, _: &()| -> Result<(), SinkError> {
        Err(SinkError::Rejected("nope".into()))
    };
    let err = sched
        .run("cube", |_, _| (), &mut sink, StepBudget::Finite(1), &CancelToken::new())
        .unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("cube"), "{msg}");
    assert!(msg.contains('0'), "{msg}");
}

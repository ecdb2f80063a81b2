//! Streams a single transform circling the origin on the X-Y plane.
//!
//! `cargo run --example circling_transform`; Ctrl-C stops it early.

mod common;

use std::f64::consts::TAU;

use livelink_stream::{Frame, Session, StreamDriver, StructureTemplate, Transform};
use livelink_test_fixtures::{streams, RecordingHost};

const CIRCLES: f64 = 30.0;
const RADIUS: f64 = 200.0;
const HEIGHT: f32 = 100.0;

fn main() -> anyhow::Result<()> {
    common::init_logging();
    let config = streams::config("circling-transform")?;
    let steps = config.step_count.unwrap_or(10_000);
    let step = TAU * CIRCLES / steps as f64;

    let mut host = RecordingHost::new();
    let report = {
        let mut session = Session::open(&mut host, "CirclingTransform")?;
        let driver = StreamDriver::new("circle", config).with_cancel(common::ctrl_c_token()?);
        driver.run_subject(
            &mut session,
            StructureTemplate::Transform { properties: vec![] },
            None,
            |_| {
                move |i: u64, _: f64| {
                    let angle = step * i as f64;
                    let x = (angle.sin() * RADIUS) as f32;
                    let y = (angle.cos() * RADIUS) as f32;
                    Frame::transform(Transform::from_translation([x, y, HEIGHT]))
                }
            },
        )?
    };

    common::summarize(&report, &host);
    Ok(())
}

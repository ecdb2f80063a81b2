//! Streams 32 property channels carrying phase-shifted sine waves.

mod common;

use std::f64::consts::TAU;

use livelink_stream::{Frame, Session, StreamDriver, StructureTemplate};
use livelink_test_fixtures::{streams, RecordingHost};

const CHANNELS: usize = 32;

fn channel_values(frame_number: u64) -> Vec<f32> {
    let offset = TAU / CHANNELS as f64 / 3.0;
    (0..CHANNELS)
        .map(|i| {
            let phase = (frame_number + (CHANNELS - i) as u64) as f64 * offset;
            ((phase.sin() + 1.0) / 2.0) as f32
        })
        .collect()
}

fn main() -> anyhow::Result<()> {
    common::init_logging();
    let config = streams::config("wave-properties")?;
    let channels = (1..=CHANNELS).map(|i| format!("Channel {i}")).collect();

    let mut host = RecordingHost::new();
    let report = {
        let mut session = Session::open(&mut host, "WaveProperties")?;
        let driver = StreamDriver::new("wave", config).with_cancel(common::ctrl_c_token()?);
        driver.run_subject(
            &mut session,
            StructureTemplate::Basic {
                properties: channels,
            },
            None,
            // frame numbers start at 1
            |_| |i: u64, _: f64| Frame::basic(channel_values(i + 1)),
        )?
    };

    common::summarize(&report, &host);
    Ok(())
}

//! Shared setup for the demo streams.

use livelink_stream::{CancelToken, RunReport};
use livelink_test_fixtures::RecordingHost;

/// `RUST_LOG` wins; otherwise progress lines at `info` are shown.
pub fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
}

/// Token that flips on Ctrl-C.
pub fn ctrl_c_token() -> anyhow::Result<CancelToken> {
    let token = CancelToken::new();
    signal_hook::flag::register(signal_hook::consts::SIGINT, token.flag())?;
    Ok(token)
}

pub fn summarize(report: &RunReport, host: &RecordingHost) {
    println!(
        "Done. {:?} after {} frames, took {:.2} seconds ({} host calls recorded).",
        report.state,
        report.ticks,
        report.elapsed.as_secs_f64(),
        host.calls.len()
    );
}

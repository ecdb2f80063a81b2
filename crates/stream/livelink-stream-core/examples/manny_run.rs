//! Loops a baked run cycle on the Manny skeleton.

mod common;

use livelink_stream::{BoneSpec, Frame, Session, StreamDriver, StructureTemplate};
use livelink_test_fixtures::{clips, streams, RecordingHost};

const LOOPS: u64 = 100;

fn main() -> anyhow::Result<()> {
    common::init_logging();
    let clip = clips::load("manny-run")?;
    let mut config = streams::config("manny-run")?;
    let frame_count = clip.frame_count(&config.root_bone);
    anyhow::ensure!(frame_count > 0, "clip has no '{}' track", config.root_bone);
    if config.step_count.is_none() {
        config.step_count = Some(frame_count as u64 * LOOPS);
    }

    let mut host = RecordingHost::new();
    let report = {
        let mut session = Session::open(&mut host, "MannyRun")?;
        let driver = StreamDriver::new("manny", config).with_cancel(common::ctrl_c_token()?);
        driver.run_subject(
            &mut session,
            StructureTemplate::Animation { properties: vec![] },
            Some(&clip.skeleton),
            |bones: &[BoneSpec]| {
                for (idx, bone) in bones.iter().enumerate() {
                    log::debug!("bone {idx} '{}' parent {}", bone.name, bone.parent_index);
                }
                let names: Vec<String> = bones.iter().map(|b| b.name.clone()).collect();
                let clip = &clip;
                move |i: u64, _: f64| {
                    let names: Vec<&str> = names.iter().map(String::as_str).collect();
                    Frame::animation(clip.pose(&names, i as usize % frame_count))
                }
            },
        )?
    };

    common::summarize(&report, &host);
    Ok(())
}

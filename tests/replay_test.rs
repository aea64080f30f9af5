//! Replaying a captured trigger-event stream through the block I/O
//! probe, the way the CLI replay command does.

use latmon_lib::core::{EngineConfig, ManualClock, MonotonicClock};
use latmon_lib::export;
use latmon_lib::probes::block_io::{BlockIoProbe, DiskInfo, KernelVersion, RawRequest};
use latmon_lib::probes::{ProbeEvent, ProbeEventKind};
use pretty_assertions::assert_eq;
use std::sync::Arc;

fn event(at_ns: u64, kind: ProbeEventKind, handle: u64, flags: u32) -> ProbeEvent {
    let disk = Some(DiskInfo { major: 8, minor: 0 });
    ProbeEvent {
        at_ns,
        kind,
        request: RawRequest {
            handle,
            cmd_flags: flags,
            rq_disk: disk,
            queue_disk: disk,
        },
    }
}

fn replay(probe: &BlockIoProbe, clock: &ManualClock, stream: &str) {
    for line in stream.lines().filter(|l| !l.trim().is_empty()) {
        let event: ProbeEvent = serde_json::from_str(line).unwrap();
        clock.advance_to(event.at_ns);
        match event.kind {
            ProbeEventKind::Insert => probe.on_insert(&event.request),
            ProbeEventKind::Issue => probe.on_issue(&event.request),
            ProbeEventKind::Complete => probe.on_complete(&event.request),
        }
    }
}

#[test]
fn replayed_stream_round_trips_through_json() {
    let events = vec![
        event(1_000, ProbeEventKind::Insert, 1, 0),
        event(2_000, ProbeEventKind::Issue, 1, 0),
        event(2_000 + 5_000, ProbeEventKind::Complete, 1, 0),
        event(10_000, ProbeEventKind::Insert, 2, 1),
        event(10_000 + 33_000, ProbeEventKind::Complete, 2, 1),
        // An end whose begin predates the capture: ignored miss.
        event(50_000, ProbeEventKind::Complete, 99, 0),
    ];
    let stream: String = events
        .iter()
        .map(|e| serde_json::to_string(e).unwrap() + "\n")
        .collect();

    let clock = Arc::new(ManualClock::new(0));
    let probe = BlockIoProbe::new(
        &EngineConfig::default(),
        Arc::clone(&clock) as Arc<dyn MonotonicClock>,
        KernelVersion(6, 1, 0),
    );

    replay(&probe, &clock, &stream);

    let snapshot = probe.snapshot();
    let groups = export::group_snapshot(&snapshot, 27);
    assert_eq!(groups.len(), 2); // read and write on the same disk

    // 5us read from the issue timestamp: slot 2.
    assert_eq!(groups[0].counts[2], 1);
    assert_eq!(groups[0].sum_us, 5);
    assert_eq!(groups[0].mean_us(), Some(5));

    // 33us write: slot 5.
    assert_eq!(groups[1].counts[5], 1);
    assert_eq!(groups[1].sum_us, 33);

    assert_eq!(probe.session().stats().unmatched_ends, 1);
}

#[test]
fn replay_clock_never_rewinds_on_disordered_input() {
    // A capture with a timestamp glitch: the complete carries an older
    // timestamp than the insert. The replay clock holds its position,
    // so the elapsed time saturates to zero instead of wrapping.
    let stream: String = [
        event(10_000, ProbeEventKind::Insert, 1, 0),
        event(4_000, ProbeEventKind::Complete, 1, 0),
    ]
    .iter()
    .map(|e| serde_json::to_string(e).unwrap() + "\n")
    .collect();

    let clock = Arc::new(ManualClock::new(0));
    let probe = BlockIoProbe::new(
        &EngineConfig::default(),
        Arc::clone(&clock) as Arc<dyn MonotonicClock>,
        KernelVersion(6, 1, 0),
    );

    replay(&probe, &clock, &stream);

    let snapshot = probe.snapshot();
    assert_eq!(snapshot.len(), 2);
    assert_eq!(snapshot[0].0.slot, 0); // count bucket 0
    assert_eq!(snapshot[1].1, 0); // sum slot unchanged
}

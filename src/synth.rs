//! Synthetic block I/O workload for the demo binary.
//!
//! A generator thread fabricates request records and fans them out to
//! worker threads over a lock-free channel. Each worker drives a begin,
//! sleeps for the fabricated service time, then drives the end, so the
//! probe measures real elapsed time on the shared system clock under
//! genuine cross-thread contention.

use crate::core::{LatmonError, Result};
use crate::probes::block_io::{BlockIoProbe, DiskInfo, RawRequest};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Synthetic workload parameters.
#[derive(Debug, Clone, Copy)]
pub struct SynthOptions {
    /// Total number of I/O operations to fabricate
    pub events: u64,
    /// Number of worker threads driving begin/end pairs
    pub workers: usize,
}

impl Default for SynthOptions {
    fn default() -> Self {
        Self {
            events: 2_000,
            workers: 4,
        }
    }
}

/// Devices the generator spreads requests across.
const SYNTH_DISKS: [DiskInfo; 3] = [
    DiskInfo { major: 8, minor: 0 },
    DiskInfo { major: 8, minor: 16 },
    DiskInfo { major: 259, minor: 0 },
];

fn fabricate(handle: u64) -> (RawRequest, u64) {
    let disk = Some(SYNTH_DISKS[fastrand::usize(..SYNTH_DISKS.len())]);
    // Reads outnumber writes roughly 2:1, with the odd flush.
    let op: u8 = match fastrand::u8(..8) {
        0..=4 => 0,
        5..=6 => 1,
        _ => 2,
    };
    let request = RawRequest {
        handle,
        cmd_flags: u32::from(op),
        rq_disk: disk,
        queue_disk: disk,
    };
    // Service time: log-uniform over ~1us..4ms so every few buckets
    // see traffic.
    let service_us = 1u64 << fastrand::u32(0..12);
    (request, service_us + fastrand::u64(..service_us))
}

/// Drive a synthetic workload through the probe and block until every
/// operation has completed.
pub fn run(probe: &Arc<BlockIoProbe>, options: SynthOptions) -> Result<()> {
    let workers = options.workers.max(1);
    let (tx, rx) = crossbeam_channel::bounded::<(RawRequest, u64)>(workers * 2);
    let next_handle = AtomicU64::new(1);

    tracing::info!(events = options.events, workers, "synthetic workload starting");

    std::thread::scope(|s| -> Result<()> {
        for _ in 0..workers {
            let rx = rx.clone();
            let probe = Arc::clone(probe);
            s.spawn(move || {
                while let Ok((request, service_us)) = rx.recv() {
                    probe.on_insert(&request);
                    std::thread::sleep(Duration::from_micros(service_us));
                    probe.on_complete(&request);
                }
            });
        }
        drop(rx);

        for _ in 0..options.events {
            let handle = next_handle.fetch_add(1, Ordering::Relaxed);
            let event = fabricate(handle);
            tx.send(event).map_err(|_| LatmonError::ChannelSend)?;
        }
        drop(tx);
        Ok(())
    })?;

    tracing::info!("synthetic workload finished");
    Ok(())
}

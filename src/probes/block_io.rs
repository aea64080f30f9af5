//! Block I/O request latency instrumentation.
//!
//! Operations are keyed by the opaque request handle, which is stable
//! from queue insert to completion and unique among concurrently
//! in-flight requests. Histograms are partitioned by device and
//! operation class, both resolved on the completion side only.

use crate::aggregate::AggregationSession;
use crate::core::{EngineConfig, HistKey, MonotonicClock};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Bits of the command flags holding the operation class.
pub const REQ_OP_BITS: u32 = 8;
/// Mask extracting the operation class from command flags.
pub const REQ_OP_MASK: u32 = (1 << REQ_OP_BITS) - 1;

/// Encode a device number from its major/minor pair.
pub fn mkdev(major: u32, minor: u32) -> u32 {
    (minor & 0xff) | (major << 8) | ((minor & !0xff) << 12)
}

/// Opaque handle identifying one in-flight block request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestRef(pub u64);

/// Major/minor pair of a backing disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiskInfo {
    /// Major device number
    pub major: u32,
    /// First minor device number
    pub minor: u32,
}

/// Raw request record handed over by the trigger source.
///
/// Which of the two disk backpointers is populated depends on the
/// monitored kernel's structure layout; the [`DiskResolver`] chosen at
/// session start knows which one to read.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RawRequest {
    /// Opaque request handle, the operation key
    pub handle: u64,
    /// Command flags; low byte is the operation class
    pub cmd_flags: u32,
    /// Disk reachable directly from the request (layouts before the
    /// `rq_disk` field was removed)
    pub rq_disk: Option<DiskInfo>,
    /// Disk reachable through the request queue backpointer (layouts
    /// after the queue gained an explicit disk field)
    pub queue_disk: Option<DiskInfo>,
}

/// Classification dimensions for block I/O histograms.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct DiskDims {
    /// Encoded device number, 0 when no disk could be resolved
    pub device: u32,
    /// Operation class (read, write, flush, discard, ...)
    pub op: u8,
}

impl DiskDims {
    /// Major device number decoded from the encoded device.
    pub fn major(&self) -> u32 {
        (self.device >> 8) & 0xfff
    }

    /// Minor device number decoded from the encoded device.
    pub fn minor(&self) -> u32 {
        (self.device & 0xff) | ((self.device >> 12) & !0xff)
    }

    /// Human-readable name of the operation class.
    pub fn op_name(&self) -> &'static str {
        match self.op {
            0 => "read",
            1 => "write",
            2 => "flush",
            3 => "discard",
            5 => "secure_erase",
            9 => "write_zeroes",
            _ => "other",
        }
    }
}

impl fmt::Display for DiskDims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{} {}", self.major(), self.minor(), self.op_name())
    }
}

/// Kernel version of the monitored subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct KernelVersion(pub u16, pub u16, pub u16);

impl std::str::FromStr for KernelVersion {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let mut parts = s.split('.');
        let mut next = |name: &str| {
            parts
                .next()
                .ok_or_else(|| format!("missing {} in kernel version '{}'", name, s))?
                .parse::<u16>()
                .map_err(|e| format!("bad {} in kernel version '{}': {}", name, s, e))
        };
        let version = KernelVersion(next("major")?, next("minor")?, next("patch")?);
        if parts.next().is_some() {
            return Err(format!("kernel version '{}' has too many components", s));
        }
        Ok(version)
    }
}

/// Strategy for reaching the disk from a raw request record.
///
/// The monitored kernel moved the disk backpointer between structure
/// revisions. The resolver is selected once at session start from the
/// kernel version and never re-probed per event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiskResolver {
    /// Read the disk field on the request itself
    RequestDisk,
    /// Follow the request queue's disk backpointer
    QueueBackpointer,
}

impl DiskResolver {
    /// The `rq_disk` field was removed from the request in 5.17.
    pub fn for_kernel(version: KernelVersion) -> Self {
        if version < KernelVersion(5, 17, 0) {
            DiskResolver::RequestDisk
        } else {
            DiskResolver::QueueBackpointer
        }
    }

    /// Encoded device number for a request, 0 when no disk is reachable.
    pub fn device(&self, request: &RawRequest) -> u32 {
        let disk = match self {
            DiskResolver::RequestDisk => request.rq_disk,
            DiskResolver::QueueBackpointer => request.queue_disk,
        };
        disk.map_or(0, |d| mkdev(d.major, d.minor))
    }
}

/// Block I/O latency probe: two begin triggers, one end trigger.
pub struct BlockIoProbe {
    session: AggregationSession<RequestRef, DiskDims>,
    resolver: DiskResolver,
}

impl BlockIoProbe {
    /// Create a probe for the given kernel version.
    pub fn new(
        config: &EngineConfig,
        clock: Arc<dyn MonotonicClock>,
        kernel: KernelVersion,
    ) -> Self {
        let resolver = DiskResolver::for_kernel(kernel);
        tracing::debug!(?resolver, ?kernel, "block_io disk resolver selected");
        Self {
            session: AggregationSession::new(config, clock),
            resolver,
        }
    }

    /// Request queued: record a begin.
    pub fn on_insert(&self, request: &RawRequest) {
        self.session.on_begin(RequestRef(request.handle));
    }

    /// Request dispatched to the driver: record a begin.
    ///
    /// For a request that was also seen at insert this overwrites the
    /// queued timestamp, so the histogram measures driver latency
    /// rather than queue-plus-driver latency.
    pub fn on_issue(&self, request: &RawRequest) {
        self.session.on_begin(RequestRef(request.handle));
    }

    /// Request finished: close the measurement.
    pub fn on_complete(&self, request: &RawRequest) {
        let dims = DiskDims {
            device: self.resolver.device(request),
            op: (request.cmd_flags & REQ_OP_MASK) as u8,
        };
        self.session.on_end(RequestRef(request.handle), dims);
    }

    /// Export the histogram contents.
    pub fn snapshot(&self) -> Vec<(HistKey<DiskDims>, u64)> {
        self.session.snapshot()
    }

    /// The underlying aggregation session.
    pub fn session(&self) -> &AggregationSession<RequestRef, DiskDims> {
        &self.session
    }
}

//! Log2-scale latency bucketing.
//!
//! Operation latencies span many orders of magnitude (microseconds to
//! multi-second stalls). Log2 bucketing gives ~2x relative resolution
//! per bucket with a small fixed bucket count, which is what lets the
//! histogram store stay bounded regardless of outlier magnitude.

/// Map a duration to its latency bucket.
///
/// Computes `floor(log2(duration_us))`, clamped to `max_slot`. A zero
/// duration maps to slot 0 by definition. Pure and total: no failure
/// mode for any input.
#[inline(always)]
pub fn latency_slot(duration_us: u64, max_slot: u16) -> u16 {
    if duration_us == 0 {
        return 0;
    }
    let raw = duration_us.ilog2();
    if raw >= u32::from(max_slot) {
        max_slot
    } else {
        raw as u16
    }
}

/// The microsecond range covered by a count bucket: `[lo, hi)`, with
/// `None` for the open upper end of the last bucket (which absorbs all
/// clamped outliers).
pub fn slot_bounds_us(slot: u16, max_slot: u16) -> (u64, Option<u64>) {
    if slot == 0 {
        return (0, Some(2));
    }
    let lo = 1u64 << slot.min(63);
    if slot >= max_slot {
        (lo, None)
    } else {
        (lo, Some(1u64 << (slot + 1).min(63)))
    }
}

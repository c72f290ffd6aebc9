//! Milestone threshold arithmetic.
//!
//! Pure functions mapping a cumulative unique-join count to a milestone
//! index. The schedule is fixed: twenty named thresholds up to 50, then an
//! open-ended rule where every even count above 50 is a milestone.
//!
//! Note the intentional asymmetry above 50: an odd count never *reaches* a
//! milestone (`milestone_just_reached` returns 0) but still *sits at* one
//! (`milestone_index_at_or_below` reports the index of the even count
//! below it). This matches the schedule as designed; do not "fix" it.

/// The fixed milestone thresholds. Indices are 1-based: reaching
/// `MILESTONE_SCHEDULE[i]` is milestone `i + 1`.
pub const MILESTONE_SCHEDULE: [u64; 20] = [
    3, 5, 7, 10, 12, 15, 17, 20, 22, 25, 27, 30, 32, 35, 37, 40, 42, 45, 47, 50,
];

/// Returns the 1-based milestone number if `count` lands exactly on a
/// milestone, or 0 if it does not.
///
/// Above 50, only even counts fire: `52 -> 21`, `54 -> 22`, and so on,
/// while odd counts return 0.
pub fn milestone_just_reached(count: u64) -> u32 {
    for (i, threshold) in MILESTONE_SCHEDULE.iter().enumerate() {
        if count == *threshold {
            return i as u32 + 1;
        }
    }
    if count > 50 && count % 2 == 0 {
        return 20 + ((count - 50) / 2) as u32;
    }
    0
}

/// Returns the 1-based index of the highest milestone at or below `count`,
/// or 0 if no milestone has been reached yet.
///
/// Above 50 the index is `20 + (count - 50) / 2` with floor division, so
/// 51 reports index 20 just like 50 does.
pub fn milestone_index_at_or_below(count: u64) -> u32 {
    let mut last = 0;
    for (i, threshold) in MILESTONE_SCHEDULE.iter().enumerate() {
        if count >= *threshold {
            last = i as u32 + 1;
        }
    }
    if count > 50 {
        last = 20 + ((count - 50) / 2) as u32;
    }
    last
}

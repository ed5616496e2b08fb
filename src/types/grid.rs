//! The weekly time grid and the pure placement predicates.
//!
//! Six days of eight periods each. Lunch sits between periods 4 and 5,
//! so no block may span both halves of a day. Saturday afternoon
//! (periods 5-8 on day 5) is reserved for year-1 labs.

use super::{AvailabilityWindow, ScheduledSlot};

pub const DAYS_PER_WEEK: u8 = 6;
pub const PERIODS_PER_DAY: u8 = 8;
/// Last period of the morning half; lunch follows it
pub const MORNING_END: u8 = 4;
/// First period of the afternoon half
pub const AFTERNOON_START: u8 = 5;
pub const SATURDAY: u8 = 5;
/// Maximum periods a section sits through on one day
pub const MAX_SECTION_PERIODS_PER_DAY: u8 = 6;
/// Maximum periods of one theory subject per section per day
pub const MAX_THEORY_PERIODS_PER_DAY: u8 = 2;
/// Total (day, period) cells in the grid
pub const TOTAL_GRID_SLOTS: usize = (DAYS_PER_WEEK as usize) * (PERIODS_PER_DAY as usize);

/// Human-readable day name
pub fn day_name(day: u8) -> &'static str {
    match day {
        0 => "Monday",
        1 => "Tuesday",
        2 => "Wednesday",
        3 => "Thursday",
        4 => "Friday",
        5 => "Saturday",
        _ => "Unknown",
    }
}

/// Check that a period range does not straddle the lunch break
pub fn lunch_safe(start: u8, end: u8) -> bool {
    end <= MORNING_END || start >= AFTERNOON_START
}

/// Check the Saturday half-day rule: afternoon slots on day 5 are legal
/// only for year-1 lab sessions
pub fn saturday_allowed(day: u8, start_period: u8, is_lab: bool, year_level: u8) -> bool {
    day != SATURDAY || start_period < AFTERNOON_START || (is_lab && year_level == 1)
}

/// Room capacity rule. Labs tolerate a 15% overflow of the section;
/// theory rooms must seat everyone.
pub fn fits_capacity(capacity: u32, student_count: u32, is_lab: bool) -> bool {
    if is_lab {
        capacity >= (student_count * 85).div_ceil(100)
    } else {
        capacity >= student_count
    }
}

/// Check whether one window covers a (day, period) cell
pub fn window_covers(window: &AvailabilityWindow, day: u8, period: u8) -> bool {
    window.covers(day, period)
}

/// Candidate lab blocks for one day as inclusive (start, end) ranges.
/// Saturday afternoon is yielded only for year-1 queries.
pub fn lab_blocks(day: u8, year_level: u8, lab_block: u8) -> Vec<(u8, u8)> {
    let mut blocks = vec![(1, lab_block)];
    let afternoon = (AFTERNOON_START, AFTERNOON_START + lab_block - 1);
    if day != SATURDAY || year_level == 1 {
        blocks.push(afternoon);
    }
    blocks
}

/// Check the structural legality of a single slot in isolation
pub fn valid_slot(slot: &ScheduledSlot) -> bool {
    slot.day < DAYS_PER_WEEK
        && slot.start_period >= 1
        && slot.start_period <= slot.end_period
        && slot.end_period <= PERIODS_PER_DAY
        && lunch_safe(slot.start_period, slot.end_period)
}

/// Check whether two slots collide in time (same day, overlapping periods)
pub fn overlaps(a: &ScheduledSlot, b: &ScheduledSlot) -> bool {
    a.day == b.day && a.start_period <= b.end_period && b.start_period <= a.end_period
}

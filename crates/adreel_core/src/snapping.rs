use crate::types::*;

/// Round a drop position to the nearest multiple of `interval`. Negative
/// positions land on zero.
pub fn snap_to_grid(position_us: TimeUs, interval_us: TimeUs) -> TimeUs {
    if interval_us.0 <= 0 {
        return position_us.max(TimeUs::ZERO);
    }
    let steps = (position_us.0 as f64 / interval_us.0 as f64).round() as i64;
    TimeUs(steps * interval_us.0).max(TimeUs::ZERO)
}

/// Final drop position: snapped unless the fine-control modifier is held,
/// and never before the timeline origin.
pub fn resolve_drop(position_us: TimeUs, interval_us: TimeUs, snap: bool) -> TimeUs {
    if snap {
        snap_to_grid(position_us, interval_us)
    } else {
        position_us.max(TimeUs::ZERO)
    }
}

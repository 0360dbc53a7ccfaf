//! Pure predicates guarding trim, split, merge and reposition.
//!
//! Each check comes in two forms: `validate_*` returns the rejection reason,
//! `is_valid_*` is the boolean the UI uses to enable or hide an action.

use crate::config::{EngineConfig, OverlapPolicy};
use crate::error::{CoreError, Result};
use crate::types::*;
use std::collections::BTreeSet;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Trim
// ---------------------------------------------------------------------------

pub fn validate_trim(clip: &Clip, range: TrimRange, config: &EngineConfig) -> Result<()> {
    let duration = clip.duration_us;
    let TrimRange {
        trim_start_us: start,
        trim_end_us: end,
    } = range;

    if start < TimeUs::ZERO || start > duration {
        return Err(CoreError::InvalidTrim(format!(
            "trim start {start} outside clip (duration {duration})"
        )));
    }
    if end < TimeUs::ZERO || end > duration {
        return Err(CoreError::InvalidTrim(format!(
            "trim end {end} outside clip (duration {duration})"
        )));
    }
    if start >= end {
        return Err(CoreError::InvalidTrim(format!(
            "trim start {start} must be before trim end {end}"
        )));
    }
    if end - start < config.min_clip_duration_us {
        return Err(CoreError::InvalidTrim(format!(
            "trimmed length {} below minimum {}",
            end - start,
            config.min_clip_duration_us
        )));
    }
    Ok(())
}

pub fn is_valid_trim(clip: &Clip, range: TrimRange, config: &EngineConfig) -> bool {
    validate_trim(clip, range, config).is_ok()
}

/// Candidate for the start handle, kept at least the minimum duration before
/// the current end.
pub fn clamp_trim_start(candidate: TimeUs, range: TrimRange, config: &EngineConfig) -> TimeUs {
    candidate
        .min(range.trim_end_us - config.min_clip_duration_us)
        .max(TimeUs::ZERO)
}

/// Candidate for the end handle, kept at least the minimum duration after the
/// current start.
pub fn clamp_trim_end(
    candidate: TimeUs,
    range: TrimRange,
    duration: TimeUs,
    config: &EngineConfig,
) -> TimeUs {
    candidate
        .max(range.trim_start_us + config.min_clip_duration_us)
        .min(duration)
}

// ---------------------------------------------------------------------------
// Split
// ---------------------------------------------------------------------------

/// `at` is relative to the clip start. Both halves must reach the minimum.
pub fn validate_split(clip: &Clip, at: TimeUs, config: &EngineConfig) -> Result<()> {
    let min = config.min_clip_duration_us;
    if at < min || clip.duration_us - at < min {
        return Err(CoreError::InvalidSplit {
            at,
            duration: clip.duration_us,
        });
    }
    Ok(())
}

pub fn is_valid_split(clip: &Clip, at: TimeUs, config: &EngineConfig) -> bool {
    validate_split(clip, at, config).is_ok()
}

// ---------------------------------------------------------------------------
// Merge
// ---------------------------------------------------------------------------

/// Check a merge selection and return the selected clips ordered by start.
///
/// Selection order does not matter. The clips must touch end-to-start within
/// the tolerance and must sit next to each other in the start-ordered list of
/// all clips, so no unselected clip lies between two selected ones.
pub fn validate_merge<'a>(
    state: &'a TimelineState,
    clip_ids: &[Uuid],
    config: &EngineConfig,
) -> Result<Vec<&'a Clip>> {
    let selected: BTreeSet<Uuid> = clip_ids.iter().copied().collect();
    if selected.len() < 2 {
        return Err(CoreError::InvalidMerge(
            "select at least two clips to merge".into(),
        ));
    }
    if let Some(missing) = selected.iter().find(|id| state.clip(**id).is_none()) {
        return Err(CoreError::ClipNotFound(*missing));
    }

    let ordered = state.clips_by_start();
    let positions: Vec<usize> = ordered
        .iter()
        .enumerate()
        .filter(|(_, c)| selected.contains(&c.id))
        .map(|(i, _)| i)
        .collect();

    for pair in positions.windows(2) {
        if pair[1] != pair[0] + 1 {
            return Err(CoreError::InvalidMerge(
                "selected clips are not consecutive on the timeline".into(),
            ));
        }
    }

    let clips: Vec<&Clip> = positions.iter().map(|&i| ordered[i]).collect();
    for pair in clips.windows(2) {
        let gap = pair[0].timeline_end_us().abs_diff(pair[1].timeline_start_us);
        if gap > config.merge_tolerance_us {
            return Err(CoreError::InvalidMerge(format!(
                "gap of {gap} between clips exceeds tolerance {}",
                config.merge_tolerance_us
            )));
        }
    }

    Ok(clips)
}

pub fn is_valid_merge(state: &TimelineState, clip_ids: &[Uuid], config: &EngineConfig) -> bool {
    validate_merge(state, clip_ids, config).is_ok()
}

// ---------------------------------------------------------------------------
// Reposition
// ---------------------------------------------------------------------------

pub fn validate_reposition(
    state: &TimelineState,
    clip_id: Uuid,
    track: usize,
    start: TimeUs,
    config: &EngineConfig,
) -> Result<()> {
    let clip = state.clip(clip_id).ok_or(CoreError::ClipNotFound(clip_id))?;
    let lanes = state.lane_count();
    if track >= lanes {
        return Err(CoreError::TrackOutOfRange { track, lanes });
    }

    if config.overlap_policy == OverlapPolicy::Reject {
        let end = start + clip.duration_us;
        let collides = state
            .clips
            .iter()
            .filter(|other| other.id != clip_id && state.track_of(other) == track)
            .any(|other| ranges_overlap(start, end, other.timeline_start_us, other.timeline_end_us()));
        if collides {
            return Err(CoreError::OverlapDetected(track));
        }
    }
    Ok(())
}

/// Half-open ranges `[start, end)` intersect.
pub fn ranges_overlap(a_start: TimeUs, a_end: TimeUs, b_start: TimeUs, b_end: TimeUs) -> bool {
    a_start < b_end && b_start < a_end
}

// ---------------------------------------------------------------------------
// Whole state
// ---------------------------------------------------------------------------

impl TimelineState {
    /// Structural checks for a state handed to the engine from outside:
    /// unique clip ids, positive durations, no negative offsets, and pending
    /// trims that fit the clip they belong to.
    pub fn check_integrity(&self) -> Result<()> {
        let mut seen = BTreeSet::new();
        for clip in &self.clips {
            if !seen.insert(clip.id) {
                return Err(CoreError::InvalidState(format!("duplicate clip id {}", clip.id)));
            }
            if clip.duration_us <= TimeUs::ZERO {
                return Err(CoreError::InvalidState(format!(
                    "clip {} has non-positive duration {}",
                    clip.id, clip.duration_us
                )));
            }
            if clip.timeline_start_us < TimeUs::ZERO || clip.source_in_us < TimeUs::ZERO {
                return Err(CoreError::InvalidState(format!(
                    "clip {} starts before zero",
                    clip.id
                )));
            }
        }
        for (id, range) in &self.trim_state {
            let clip = self
                .clip(*id)
                .ok_or_else(|| CoreError::InvalidState(format!("trim for unknown clip {id}")))?;
            if range.trim_start_us < TimeUs::ZERO
                || range.trim_start_us >= range.trim_end_us
                || range.trim_end_us > clip.duration_us
            {
                return Err(CoreError::InvalidState(format!(
                    "trim {}..{} does not fit clip {id}",
                    range.trim_start_us, range.trim_end_us
                )));
            }
        }
        Ok(())
    }

    /// `check_integrity` plus the configured minimum clip duration.
    pub fn validate(&self, config: &EngineConfig) -> Result<()> {
        self.check_integrity()?;
        if let Some(short) = self
            .clips
            .iter()
            .find(|c| c.duration_us < config.min_clip_duration_us)
        {
            return Err(CoreError::InvalidState(format!(
                "clip {} is {} long, below minimum {}",
                short.id, short.duration_us, config.min_clip_duration_us
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(s: f64) -> TimeUs {
        TimeUs::from_seconds(s)
    }

    fn clip(start_s: f64, dur_s: f64) -> Clip {
        Clip::new("a.mp4", 1, secs(start_s), secs(dur_s))
    }

    // -----------------------------------------------------------------------
    // trim
    // -----------------------------------------------------------------------

    #[test]
    fn trim_within_bounds_is_valid() {
        let cfg = EngineConfig::default();
        let c = clip(0.0, 10.0);
        assert!(is_valid_trim(&c, TrimRange::new(secs(1.0), secs(9.0)), &cfg));
        assert!(is_valid_trim(&c, TrimRange::new(secs(0.0), secs(10.0)), &cfg));
        assert!(is_valid_trim(&c, TrimRange::new(secs(2.0), secs(2.5)), &cfg));
    }

    #[test]
    fn trim_rejections() {
        let cfg = EngineConfig::default();
        let c = clip(0.0, 10.0);
        for range in [
            TrimRange::new(secs(-0.1), secs(5.0)),
            TrimRange::new(secs(1.0), secs(10.1)),
            TrimRange::new(secs(5.0), secs(5.0)),
            TrimRange::new(secs(6.0), secs(5.0)),
            TrimRange::new(secs(2.0), secs(2.4)),
        ] {
            let err = validate_trim(&c, range, &cfg).unwrap_err();
            assert!(matches!(err, CoreError::InvalidTrim(_)), "{range:?}");
            assert!(err.is_validation());
        }
    }

    #[test]
    fn end_handle_clamps_to_minimum_after_start() {
        let cfg = EngineConfig::default();
        let range = TrimRange::new(secs(2.0), secs(8.0));
        let clamped = clamp_trim_end(secs(2.2), range, secs(10.0), &cfg);
        assert_eq!(clamped, secs(2.5));
        assert_eq!(clamp_trim_end(secs(12.0), range, secs(10.0), &cfg), secs(10.0));
    }

    #[test]
    fn start_handle_clamps_to_minimum_before_end() {
        let cfg = EngineConfig::default();
        let range = TrimRange::new(secs(0.0), secs(4.0));
        assert_eq!(clamp_trim_start(secs(3.9), range, &cfg), secs(3.5));
        assert_eq!(clamp_trim_start(secs(-1.0), range, &cfg), TimeUs::ZERO);
        assert_eq!(clamp_trim_start(secs(1.0), range, &cfg), secs(1.0));
    }

    // -----------------------------------------------------------------------
    // split
    // -----------------------------------------------------------------------

    #[test]
    fn split_needs_both_halves_at_minimum() {
        let cfg = EngineConfig::default();
        let c = clip(0.0, 10.0);
        assert!(!is_valid_split(&c, secs(0.3), &cfg));
        assert!(is_valid_split(&c, secs(5.0), &cfg));
        assert!(is_valid_split(&c, secs(0.5), &cfg));
        assert!(is_valid_split(&c, secs(9.5), &cfg));
        assert!(!is_valid_split(&c, secs(9.7), &cfg));
    }

    #[test]
    fn split_at_edges_is_invalid() {
        let cfg = EngineConfig::default();
        let c = clip(3.0, 2.0);
        assert!(!is_valid_split(&c, TimeUs::ZERO, &cfg));
        assert!(!is_valid_split(&c, c.duration_us, &cfg));
        // Too short to split anywhere
        let tiny = clip(0.0, 0.8);
        assert!(!is_valid_split(&tiny, secs(0.4), &cfg));
    }

    // -----------------------------------------------------------------------
    // merge
    // -----------------------------------------------------------------------

    fn abc() -> (TimelineState, Uuid, Uuid, Uuid) {
        let a = clip(0.0, 5.0);
        let b = clip(5.0, 5.0);
        let c = clip(10.0, 5.0);
        let ids = (a.id, b.id, c.id);
        (TimelineState::new(vec![a, b, c]), ids.0, ids.1, ids.2)
    }

    #[test]
    fn adjacent_pair_merges() {
        let cfg = EngineConfig::default();
        let (state, a, b, _) = abc();
        assert!(is_valid_merge(&state, &[a, b], &cfg));
    }

    #[test]
    fn skipping_a_clip_is_rejected() {
        let cfg = EngineConfig::default();
        let (state, a, _, c) = abc();
        assert!(!is_valid_merge(&state, &[a, c], &cfg));
    }

    #[test]
    fn merge_is_order_independent() {
        let cfg = EngineConfig::default();
        let (state, a, b, c) = abc();
        assert_eq!(
            is_valid_merge(&state, &[a, b], &cfg),
            is_valid_merge(&state, &[b, a], &cfg)
        );
        assert!(is_valid_merge(&state, &[c, a, b], &cfg));
        let ordered = validate_merge(&state, &[c, b, a], &cfg).unwrap();
        let ids: Vec<Uuid> = ordered.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![a, b, c]);
    }

    #[test]
    fn merge_gap_tolerance() {
        let cfg = EngineConfig::default();
        let a = clip(0.0, 5.0);
        let near = clip(5.005, 2.0);
        let state = TimelineState::new(vec![a.clone(), near.clone()]);
        assert!(is_valid_merge(&state, &[a.id, near.id], &cfg));

        let far = clip(5.02, 2.0);
        let state = TimelineState::new(vec![a.clone(), far.clone()]);
        let err = validate_merge(&state, &[a.id, far.id], &cfg).unwrap_err();
        assert!(matches!(err, CoreError::InvalidMerge(_)));
    }

    #[test]
    fn merge_needs_two_distinct_known_clips() {
        let cfg = EngineConfig::default();
        let (state, a, _, _) = abc();
        assert!(!is_valid_merge(&state, &[a], &cfg));
        assert!(!is_valid_merge(&state, &[a, a], &cfg));
        let unknown = Uuid::new_v4();
        assert!(matches!(
            validate_merge(&state, &[a, unknown], &cfg),
            Err(CoreError::ClipNotFound(id)) if id == unknown
        ));
    }

    // -----------------------------------------------------------------------
    // reposition
    // -----------------------------------------------------------------------

    #[test]
    fn reposition_track_range() {
        let cfg = EngineConfig::default();
        let (state, a, _, _) = abc();
        // All clips on track 0: lanes are 0 and the spare 1.
        assert!(validate_reposition(&state, a, 1, secs(20.0), &cfg).is_ok());
        assert!(matches!(
            validate_reposition(&state, a, 2, secs(20.0), &cfg),
            Err(CoreError::TrackOutOfRange { track: 2, lanes: 2 })
        ));
    }

    #[test]
    fn overlap_policy_controls_drop() {
        let (state, a, _, _) = abc();
        let allow = EngineConfig::default();
        assert!(validate_reposition(&state, a, 0, secs(6.0), &allow).is_ok());

        let reject = EngineConfig {
            overlap_policy: OverlapPolicy::Reject,
            ..EngineConfig::default()
        };
        assert!(matches!(
            validate_reposition(&state, a, 0, secs(6.0), &reject),
            Err(CoreError::OverlapDetected(0))
        ));
        // Touching edges is not an overlap, and the clip never collides with itself.
        assert!(validate_reposition(&state, a, 0, secs(15.0), &reject).is_ok());
        assert!(validate_reposition(&state, a, 0, secs(0.0), &reject).is_ok());
        assert!(validate_reposition(&state, a, 1, secs(6.0), &reject).is_ok());
    }

    #[test]
    fn ranges_overlap_is_half_open() {
        assert!(ranges_overlap(secs(0.0), secs(5.0), secs(4.0), secs(6.0)));
        assert!(!ranges_overlap(secs(0.0), secs(5.0), secs(5.0), secs(6.0)));
    }

    // -----------------------------------------------------------------------
    // whole state
    // -----------------------------------------------------------------------

    #[test]
    fn state_below_minimum_duration_is_invalid() {
        let cfg = EngineConfig::default();
        let (state, _, _, _) = abc();
        assert!(state.validate(&cfg).is_ok());

        let short = TimelineState::new(vec![clip(0.0, 5.0), clip(5.0, 0.1)]);
        assert!(short.check_integrity().is_ok());
        assert!(matches!(short.validate(&cfg), Err(CoreError::InvalidState(_))));
    }

    #[test]
    fn integrity_rejects_bad_clips() {
        let a = clip(0.0, 5.0);
        let dup = TimelineState::new(vec![a.clone(), a.clone()]);
        assert!(matches!(dup.check_integrity(), Err(CoreError::InvalidState(_))));

        let mut negative = clip(0.0, 5.0);
        negative.duration_us = secs(-1.0);
        assert!(TimelineState::new(vec![negative]).check_integrity().is_err());

        let mut stray_trim = TimelineState::new(vec![a.clone()]);
        stray_trim
            .trim_state
            .insert(Uuid::new_v4(), TrimRange::new(secs(0.0), secs(1.0)));
        assert!(stray_trim.check_integrity().is_err());

        let mut long_trim = TimelineState::new(vec![a.clone()]);
        long_trim
            .trim_state
            .insert(a.id, TrimRange::new(secs(1.0), secs(6.0)));
        assert!(long_trim.check_integrity().is_err());
    }
}

//! Segment planning.
//!
//! Converts raw user timecodes plus a probed duration into the ordered list
//! of intervals a segmenter executes. The plan always carries the implicit
//! boundaries 0 and `total_duration`; interior points are the validated user
//! entries. A plan with no interior points is legal here (the whole file as
//! one interval) and rejected later by the segmenters, which treat "no valid
//! split points" as a caller error.

use tracing::warn;

use crate::error::{KirimeError, Result};
use crate::timecode::parse_timecode;

#[derive(Debug, Clone)]
pub struct SplitPlan {
    points: Vec<f64>,
    interior_count: usize,
    total_duration: f64,
}

impl SplitPlan {
    /// Build a plan from raw timecode strings.
    ///
    /// Points at or below zero are treated as the implicit start boundary and
    /// dropped silently; points at or beyond the duration are dropped with a
    /// warning. Unparseable points are errors.
    pub fn build(total_duration: f64, raw_points: &[String]) -> Result<Self> {
        if total_duration <= 0.0 {
            return Err(KirimeError::InvalidTimeRange(format!(
                "non-positive duration: {}",
                total_duration
            )));
        }

        let mut interior = Vec::new();
        let mut out_of_range = Vec::new();

        for raw in raw_points {
            let seconds = parse_timecode(raw)?;
            if seconds > 0.0 && seconds < total_duration {
                interior.push(seconds);
            } else if seconds >= total_duration {
                out_of_range.push(format!("{}({:.2}s)", raw, seconds));
            }
        }

        if !out_of_range.is_empty() {
            warn!(
                "Split points beyond duration ({:.2}s) ignored: {}",
                total_duration,
                out_of_range.join(", ")
            );
        }

        interior.sort_by(|a, b| a.partial_cmp(b).unwrap());
        interior.dedup();
        let interior_count = interior.len();

        let mut points = Vec::with_capacity(interior_count + 2);
        points.push(0.0);
        points.extend(interior);
        points.push(total_duration);

        Ok(Self {
            points,
            interior_count,
            total_duration,
        })
    }

    /// Consecutive-pair intervals covering [0, total_duration].
    pub fn intervals(&self) -> Vec<(f64, f64)> {
        self.points.windows(2).map(|w| (w[0], w[1])).collect()
    }

    /// Number of user-supplied points that survived validation.
    pub fn interior_count(&self) -> usize {
        self.interior_count
    }

    pub fn total_duration(&self) -> f64 {
        self.total_duration
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(points: &[&str]) -> Vec<String> {
        points.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_intervals_partition_duration() {
        let plan = SplitPlan::build(90.0, &raw(&["00:00:30", "00:01:00"])).unwrap();
        let intervals = plan.intervals();
        assert_eq!(intervals, vec![(0.0, 30.0), (30.0, 60.0), (60.0, 90.0)]);
        assert_eq!(intervals.first().unwrap().0, 0.0);
        assert_eq!(intervals.last().unwrap().1, 90.0);
        for pair in intervals.windows(2) {
            assert_eq!(pair[0].1, pair[1].0);
        }
    }

    #[test]
    fn test_unsorted_input_is_sorted() {
        let plan = SplitPlan::build(200.0, &raw(&["100", "50"])).unwrap();
        assert_eq!(plan.intervals(), vec![(0.0, 50.0), (50.0, 100.0), (100.0, 200.0)]);
    }

    #[test]
    fn test_duplicates_collapse() {
        let plan = SplitPlan::build(200.0, &raw(&["100", "100", "50"])).unwrap();
        assert_eq!(plan.interior_count(), 2);
        assert_eq!(plan.intervals().len(), 3);
    }

    #[test]
    fn test_out_of_range_dropped() {
        let plan = SplitPlan::build(60.0, &raw(&["10:00:00"])).unwrap();
        assert_eq!(plan.interior_count(), 0);
        assert_eq!(plan.intervals(), vec![(0.0, 60.0)]);
    }

    #[test]
    fn test_zero_and_negative_dropped_silently() {
        let plan = SplitPlan::build(60.0, &raw(&["0", "30"])).unwrap();
        assert_eq!(plan.interior_count(), 1);
    }

    #[test]
    fn test_empty_points_whole_file_interval() {
        let plan = SplitPlan::build(60.0, &[]).unwrap();
        assert_eq!(plan.interior_count(), 0);
        assert_eq!(plan.intervals(), vec![(0.0, 60.0)]);
    }

    #[test]
    fn test_unparseable_point_is_error() {
        assert!(SplitPlan::build(60.0, &raw(&["not-a-time"])).is_err());
    }

    #[test]
    fn test_non_positive_duration_is_error() {
        assert!(SplitPlan::build(0.0, &[]).is_err());
    }
}

// src/resample/grid.rs

use crate::error::ResampleError;

/// `start, start + step, ..., start + (count - 1) * step`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeGrid {
    pub start: f64,
    pub step: f64,
    pub count: usize,
}

impl TimeGrid {
    /// The longest grid starting at `start` whose last point does not pass `end`,
    /// refusing grids of more than `max_points` points.
    pub fn spanning(
        start: f64,
        end: f64,
        step: f64,
        max_points: usize,
    ) -> Result<Self, ResampleError> {
        // NaN bounds and non-positive steps fall through here as well
        if !(end > start) || !(step > 0.0) || !step.is_finite() {
            return Err(ResampleError::EmptyGrid {
                t_min: start,
                t_max: end,
            });
        }
        let too_large = ResampleError::GridTooLarge {
            t_min: start,
            t_max: end,
            limit: max_points,
        };

        let steps = ((end - start) / step).floor();
        if !steps.is_finite() || steps >= max_points as f64 {
            return Err(too_large);
        }

        let mut last = steps as usize;
        // (end - start) / step can round up onto the next integer
        while last > 0 && start + last as f64 * step > end {
            last -= 1;
        }

        let count = last.checked_add(1).ok_or(too_large)?;
        Ok(Self { start, step, count })
    }

    pub fn value(&self, idx: usize) -> f64 {
        self.start + idx as f64 * self.step
    }

    pub fn values(&self) -> Vec<f64> {
        (0..self.count).map(|i| self.value(i)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CAP: usize = 1_000_000;

    #[test]
    fn one_second_at_120_hz() {
        let grid = TimeGrid::spanning(0.0, 1.0, 1.0 / 120.0, CAP).unwrap();
        assert_eq!(grid.count, 121);
        assert_eq!(grid.value(120), 1.0);
        assert_eq!(grid.values().len(), 121);
    }

    #[test]
    fn never_passes_the_end() {
        for (end, hz) in [(0.7, 100.0), (2.5, 60.0), (3.7, 120.0), (0.3, 30.0)] {
            let step = 1.0 / hz;
            let grid = TimeGrid::spanning(0.0, end, step, CAP).unwrap();
            assert!(grid.value(grid.count - 1) <= end, "{end} @ {hz}");
            assert!(grid.value(grid.count) > end, "{end} @ {hz}");
        }
    }

    #[test]
    fn partial_last_step_is_dropped() {
        let grid = TimeGrid::spanning(1.0, 2.2, 0.5, CAP).unwrap();
        assert_eq!(grid.values(), vec![1.0, 1.5, 2.0]);
    }

    #[test]
    fn degenerate_spans_are_errors() {
        for (start, end) in [(1.0, 1.0), (2.0, 1.0), (f64::NAN, 1.0)] {
            assert!(matches!(
                TimeGrid::spanning(start, end, 0.1, CAP),
                Err(ResampleError::EmptyGrid { .. })
            ));
        }
        assert!(TimeGrid::spanning(0.0, 1.0, 0.0, CAP).is_err());
    }

    #[test]
    fn infinite_and_huge_spans_are_refused() {
        let step = 1.0 / 120.0;
        for (start, end) in [
            (0.0, f64::INFINITY),
            (f64::NEG_INFINITY, 0.0),
            (0.0, 1e30),
            (0.0, 1e9),
        ] {
            assert!(matches!(
                TimeGrid::spanning(start, end, step, CAP),
                Err(ResampleError::GridTooLarge { limit: CAP, .. })
            ));
        }
        // an unbounded cap still refuses a span that overflows usize
        assert!(TimeGrid::spanning(0.0, f64::INFINITY, step, usize::MAX).is_err());
        assert!(TimeGrid::spanning(0.0, 1e30, step, usize::MAX).is_err());
    }

    #[test]
    fn cap_is_inclusive() {
        // 0..=9 is 10 points
        assert_eq!(TimeGrid::spanning(0.0, 9.0, 1.0, 10).unwrap().count, 10);
        assert!(matches!(
            TimeGrid::spanning(0.0, 10.0, 1.0, 10),
            Err(ResampleError::GridTooLarge { limit: 10, .. })
        ));
    }
}

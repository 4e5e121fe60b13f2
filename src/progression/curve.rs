use serde::{Deserialize, Serialize};

use crate::shared::AppError;

/// Exponential level curve.
///
/// Level 1 spans `[0, base_points)`. Every following level spans the previous
/// span multiplied by `growth_factor`, floored, never less than one point.
/// With the defaults (100, 1.5) the levels start at 0, 100, 250, 475, 812, 1317.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LevelCurve {
    pub base_points: u64,
    pub growth_factor: f64,
    pub max_level: u32,
}

/// Where a point total sits on the curve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelProgress {
    pub level: u32,
    /// Share of the current level's span already earned, floored, 0..=100
    pub progress_percent: u8,
    pub points_to_next: u64,
    pub current_level_floor: u64,
    /// `None` once the maximum level is reached
    pub next_level_floor: Option<u64>,
}

impl Default for LevelCurve {
    fn default() -> Self {
        Self {
            base_points: 100,
            growth_factor: 1.5,
            max_level: 100,
        }
    }
}

impl LevelCurve {
    pub fn new(base_points: u64, growth_factor: f64, max_level: u32) -> Result<Self, AppError> {
        let curve = Self {
            base_points,
            growth_factor,
            max_level,
        };
        curve.validate()?;
        Ok(curve)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.base_points == 0 {
            return Err(AppError::InvalidInput(
                "level curve base points must be positive".to_string(),
            ));
        }
        if !self.growth_factor.is_finite() || self.growth_factor < 1.0 {
            return Err(AppError::InvalidInput(format!(
                "level curve growth factor must be a finite number >= 1, got {}",
                self.growth_factor
            )));
        }
        if self.max_level == 0 {
            return Err(AppError::InvalidInput(
                "level curve max level must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Maps a point total to its level. Runs in O(level).
    pub fn level_for(&self, total_points: u64) -> LevelProgress {
        let mut level = 1;
        let mut floor = 0u64;
        let mut span = self.base_points.max(1);

        loop {
            let next = match floor.checked_add(span) {
                Some(next) if level < self.max_level => next,
                _ => return Self::capped(level, floor),
            };

            if total_points < next {
                let earned = total_points - floor;
                let percent = (u128::from(earned) * 100 / u128::from(span)) as u8;
                return LevelProgress {
                    level,
                    progress_percent: percent,
                    points_to_next: next - total_points,
                    current_level_floor: floor,
                    next_level_floor: Some(next),
                };
            }

            floor = next;
            level += 1;
            span = self.next_span(span);
        }
    }

    /// Lowest point total that reaches `level`. Levels above the cap map to the cap.
    pub fn floor_of(&self, level: u32) -> u64 {
        let target = level.clamp(1, self.max_level);
        let mut floor = 0u64;
        let mut span = self.base_points.max(1);
        for _ in 1..target {
            floor = floor.saturating_add(span);
            span = self.next_span(span);
        }
        floor
    }

    fn next_span(&self, span: u64) -> u64 {
        // float-to-int casts saturate
        ((span as f64) * self.growth_factor).floor().max(1.0) as u64
    }

    fn capped(level: u32, floor: u64) -> LevelProgress {
        LevelProgress {
            level,
            progress_percent: 100,
            points_to_next: 0,
            current_level_floor: floor,
            next_level_floor: None,
        }
    }
}

/// Converts a signed running total to a point total. Negative totals clamp to zero.
pub fn clamp_points(total: i64) -> u64 {
    total.max(0) as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, 1, 0, 100)]
    #[case(50, 1, 50, 50)]
    #[case(99, 1, 99, 1)]
    #[case(100, 2, 0, 150)]
    #[case(175, 2, 50, 75)]
    #[case(249, 2, 99, 1)]
    #[case(250, 3, 0, 225)]
    #[case(475, 4, 0, 337)]
    #[case(812, 5, 0, 505)]
    fn default_curve_table(
        #[case] points: u64,
        #[case] level: u32,
        #[case] percent: u8,
        #[case] to_next: u64,
    ) {
        let progress = LevelCurve::default().level_for(points);
        assert_eq!(progress.level, level);
        assert_eq!(progress.progress_percent, percent);
        assert_eq!(progress.points_to_next, to_next);
    }

    #[test]
    fn level_is_monotonic_in_points() {
        let curve = LevelCurve::default();
        let mut previous = curve.level_for(0).level;
        for points in (0..20_000).step_by(7) {
            let level = curve.level_for(points).level;
            assert!(level >= previous, "level dropped at {} points", points);
            previous = level;
        }
    }

    #[test]
    fn threshold_boundaries_report_zero_progress() {
        let curve = LevelCurve::default();
        for level in 1..30 {
            let floor = curve.floor_of(level);
            let progress = curve.level_for(floor);
            assert_eq!(progress.level, level);
            assert_eq!(progress.progress_percent, 0);
            assert_eq!(progress.current_level_floor, floor);
        }
    }

    #[test]
    fn caps_at_max_level() {
        let curve = LevelCurve::new(100, 1.5, 3).unwrap();
        let progress = curve.level_for(10_000);
        assert_eq!(progress.level, 3);
        assert_eq!(progress.progress_percent, 100);
        assert_eq!(progress.points_to_next, 0);
        assert_eq!(progress.next_level_floor, None);
    }

    #[test]
    fn handles_extreme_totals_without_overflow() {
        let curve = LevelCurve::new(1, 2.0, u32::MAX).unwrap();
        let progress = curve.level_for(u64::MAX);
        assert!(progress.level > 60);
        assert!(progress.progress_percent <= 100);
    }

    #[test]
    fn flat_curve_grows_linearly() {
        let curve = LevelCurve::new(10, 1.0, 1_000).unwrap();
        assert_eq!(curve.level_for(95).level, 10);
        assert_eq!(curve.level_for(100).level, 11);
    }

    #[rstest]
    #[case(0, 1.5, 10)]
    #[case(100, 0.9, 10)]
    #[case(100, f64::NAN, 10)]
    #[case(100, 1.5, 0)]
    fn rejects_invalid_curves(#[case] base: u64, #[case] growth: f64, #[case] max_level: u32) {
        assert!(matches!(
            LevelCurve::new(base, growth, max_level),
            Err(AppError::InvalidInput(_))
        ));
    }

    #[test]
    fn negative_totals_clamp_to_zero() {
        assert_eq!(clamp_points(-40), 0);
        assert_eq!(clamp_points(0), 0);
        assert_eq!(clamp_points(120), 120);
        assert_eq!(LevelCurve::default().level_for(clamp_points(-5)).level, 1);
    }
}

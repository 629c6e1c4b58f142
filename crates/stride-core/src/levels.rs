//! Level curve for the progression engine.
//!
//! Levels start at 1 and follow a quadratic point curve: reaching level L
//! costs `(L-1)^2 * LEVEL_BASE_POINTS` total points, so every level costs
//! strictly more additional points than the one before it.
//!
//! Level is always a projection of the point total. Nothing in the engine
//! stores a level that was not computed here from points.

/// Points required to go from level 1 to level 2.
pub const LEVEL_BASE_POINTS: u64 = 100;

/// Level for a given point total. `level_for_points(0) == 1`.
pub fn level_for_points(points: u64) -> u32 {
    // Largest L with (L-1)^2 * base <= points.
    let steps = isqrt(points / LEVEL_BASE_POINTS);
    (steps as u32).saturating_add(1)
}

/// Minimum total points needed to reach a level.
///
/// Strictly increasing in level; `points_required_for(1) == 0`.
pub fn points_required_for(level: u32) -> u64 {
    let steps = u64::from(level.saturating_sub(1));
    steps * steps * LEVEL_BASE_POINTS
}

/// Points still missing until the next level.
pub fn points_to_next(points: u64) -> u64 {
    let next = level_for_points(points) + 1;
    points_required_for(next).saturating_sub(points)
}

/// Progress through the current level as a percentage (0-100).
pub fn progress_percent(points: u64) -> u8 {
    let level = level_for_points(points);
    let floor = points_required_for(level);
    let ceiling = points_required_for(level + 1);
    let span = ceiling - floor;
    if span == 0 {
        return 100;
    }
    ((points - floor) * 100 / span) as u8
}

/// Integer square root (largest s with s*s <= n).
fn isqrt(n: u64) -> u64 {
    if n < 2 {
        return n;
    }
    let mut x = n;
    let mut y = (x + 1) / 2;
    while y < x {
        x = y;
        y = (x + n / x) / 2;
    }
    x
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_points_is_level_one() {
        assert_eq!(level_for_points(0), 1);
    }

    #[test]
    fn test_thresholds_strictly_increase() {
        for level in 1..200u32 {
            assert!(
                points_required_for(level + 1) > points_required_for(level),
                "threshold not increasing at level {}",
                level
            );
        }
    }

    #[test]
    fn test_round_trip_at_every_threshold() {
        for level in 1..200u32 {
            let at = points_required_for(level);
            assert_eq!(level_for_points(at), level, "round trip failed at level {}", level);
            if at > 0 {
                assert_eq!(level_for_points(at - 1), level - 1);
            }
        }
    }

    #[test]
    fn test_level_is_monotone_in_points() {
        let mut last = 0;
        for points in (0..100_000u64).step_by(37) {
            let level = level_for_points(points);
            assert!(level >= last);
            last = level;
        }
    }

    #[test]
    fn test_curve_decelerates() {
        // Each level must cost strictly more additional points than the last.
        for level in 2..100u32 {
            let prev_span = points_required_for(level) - points_required_for(level - 1);
            let span = points_required_for(level + 1) - points_required_for(level);
            assert!(span > prev_span, "curve not super-linear at level {}", level);
        }
    }

    #[test]
    fn test_points_to_next() {
        assert_eq!(points_to_next(0), 100);
        assert_eq!(points_to_next(100), 300); // level 2 ends at 400
        assert_eq!(points_to_next(399), 1);
    }

    #[test]
    fn test_progress_percent() {
        assert_eq!(progress_percent(0), 0);
        assert_eq!(progress_percent(50), 50);
        assert_eq!(progress_percent(100), 0); // fresh into level 2
        assert_eq!(progress_percent(250), 50); // halfway through 100..400
    }

    #[test]
    fn test_isqrt_exact() {
        assert_eq!(isqrt(0), 0);
        assert_eq!(isqrt(1), 1);
        assert_eq!(isqrt(3), 1);
        assert_eq!(isqrt(4), 2);
        assert_eq!(isqrt(99), 9);
        assert_eq!(isqrt(100), 10);
        assert_eq!(isqrt(u64::MAX), 4_294_967_295);
    }
}

/// Probability (0..=1) that the side with `advantage_cp` wins.
///
/// Logistic curve `1 / (1 + 10^(-cp/400))`: exactly 0.5 at 0, symmetric,
/// saturating towards 0 and 1 for mate sentinels.
pub fn win_probability(advantage_cp: i32) -> f64 {
    1.0 / (1.0 + 10f64.powf(-(advantage_cp as f64) / 400.0))
}

/// [`win_probability`] in percentage points.
pub fn win_percent(advantage_cp: i32) -> f64 {
    100.0 * win_probability(advantage_cp)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_even_position_is_half() {
        assert_eq!(win_probability(0), 0.5);
    }

    #[test]
    fn test_symmetry() {
        for cp in [35, 100, 400, 1200] {
            let sum = win_probability(cp) + win_probability(-cp);
            assert!((sum - 1.0).abs() < 1e-12, "cp {}", cp);
        }
    }

    #[test]
    fn test_same_swing_matters_less_when_winning() {
        let near_equal = win_percent(100) - win_percent(0);
        let already_winning = win_percent(700) - win_percent(600);
        assert!(near_equal > 3.0 * already_winning);
    }

    #[test]
    fn test_mate_sentinels_saturate() {
        assert!(win_probability(9_999) > 0.999_999);
        assert!(win_probability(-9_999) < 0.000_001);
    }
}

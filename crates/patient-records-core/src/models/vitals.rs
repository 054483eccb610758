//! Derived body measurements.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Weight category derived from a BMI value.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Verdict {
    Underweight,
    Normal,
    Overweight,
    Obesity,
}

impl Verdict {
    /// Classify a BMI value. Each band includes its lower bound.
    pub fn from_bmi(bmi: f64) -> Self {
        if bmi < 18.5 {
            Verdict::Underweight
        } else if bmi < 25.0 {
            Verdict::Normal
        } else if bmi < 30.0 {
            Verdict::Overweight
        } else {
            Verdict::Obesity
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Underweight => "Underweight",
            Verdict::Normal => "Normal",
            Verdict::Overweight => "Overweight",
            Verdict::Obesity => "Obesity",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body mass index from height in centimetres and weight in kilograms,
/// rounded to two decimals.
///
/// Rounding is half away from zero on the value scaled by 100.
pub fn compute_bmi(height_cm: f64, weight_kg: f64) -> f64 {
    let height_m = height_cm / 100.0;
    round_hundredths(weight_kg / (height_m * height_m))
}

fn round_hundredths(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_compute_bmi() {
        // 75 / 1.8^2 = 23.148...
        assert_eq!(compute_bmi(180.0, 75.0), 23.15);
        assert_eq!(compute_bmi(200.0, 100.0), 25.0);
        assert_eq!(compute_bmi(160.0, 50.0), 19.53);
    }

    #[test]
    fn test_rounding_is_half_away_from_zero() {
        assert_eq!(round_hundredths(18.4951), 18.5);
        assert_eq!(round_hundredths(18.4949), 18.49);
        assert_eq!(round_hundredths(0.125), 0.13);
    }

    #[test]
    fn test_verdict_boundaries() {
        assert_eq!(Verdict::from_bmi(18.49), Verdict::Underweight);
        assert_eq!(Verdict::from_bmi(18.5), Verdict::Normal);
        assert_eq!(Verdict::from_bmi(24.999), Verdict::Normal);
        assert_eq!(Verdict::from_bmi(25.0), Verdict::Overweight);
        assert_eq!(Verdict::from_bmi(29.999), Verdict::Overweight);
        assert_eq!(Verdict::from_bmi(30.0), Verdict::Obesity);
        assert_eq!(Verdict::from_bmi(55.0), Verdict::Obesity);
    }

    #[test]
    fn test_rounded_bmi_drives_verdict() {
        // 57.0 / 1.75^2 = 18.6122... stays Normal
        let bmi = compute_bmi(175.0, 57.0);
        assert_eq!(bmi, 18.61);
        assert_eq!(Verdict::from_bmi(bmi), Verdict::Normal);
    }

    #[test]
    fn test_verdict_serializes_as_name() {
        let json = serde_json::to_string(&Verdict::Overweight).unwrap();
        assert_eq!(json, "\"Overweight\"");
        assert_eq!(Verdict::Obesity.to_string(), "Obesity");
    }

    proptest! {
        #[test]
        fn bmi_has_at_most_two_decimals(height in 50.0..250.0f64, weight in 1.0..500.0f64) {
            let bmi = compute_bmi(height, weight);
            let scaled = bmi * 100.0;
            prop_assert!((scaled - scaled.round()).abs() < 1e-6);
        }

        #[test]
        fn verdict_is_monotonic(a in 0.0..80.0f64, b in 0.0..80.0f64) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(Verdict::from_bmi(lo) as u8 <= Verdict::from_bmi(hi) as u8);
        }
    }
}

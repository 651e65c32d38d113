//! Apparent-temperature (heat index) calculation.
//!
//! Two estimates are computed in Fahrenheit:
//!   - a linear "simple" estimate, valid for mild conditions
//!   - the Rothfusz nine-term regression, valid above ≈ 80 °F
//!
//! The simple estimate decides which one is reported. Selection is made per
//! element, so a series may mix both branches.

use crate::error::{Error, Result};

/// Simple-estimate value (°F) above which the full regression is used.
pub const SIMPLE_THRESHOLD_F: f64 = 80.0;

// Rothfusz regression coefficients.
const C1: f64 = -42.379;
const C2: f64 = 2.049_015_23;
const C3: f64 = 10.143_331_27;
const C4: f64 = -0.224_755_41;
const C5: f64 = -6.837_83e-3;
const C6: f64 = -5.481_717e-2;
const C7: f64 = 1.228_74e-3;
const C8: f64 = 8.528_2e-4;
const C9: f64 = -1.99e-6;

#[inline]
pub fn celsius_to_fahrenheit(c: f64) -> f64 {
    c * 9.0 / 5.0 + 32.0
}

#[inline]
pub fn fahrenheit_to_celsius(f: f64) -> f64 {
    (f - 32.0) * 5.0 / 9.0
}

/// Linear heat-index estimate in °F.
#[inline]
pub fn simple_estimate_f(t_f: f64, rh: f64) -> f64 {
    0.5 * (t_f + 61.0 + (t_f - 68.0) * 1.2 + rh * 0.094)
}

/// Rothfusz regression in °F.
#[inline]
pub fn rothfusz_f(t_f: f64, rh: f64) -> f64 {
    let t2 = t_f * t_f;
    let rh2 = rh * rh;
    C1 + C2 * t_f
        + C3 * rh
        + C4 * t_f * rh
        + C5 * t2
        + C6 * rh2
        + C7 * t2 * rh
        + C8 * t_f * rh2
        + C9 * t2 * rh2
}

/// Heat index in °C for air temperature `temp_c` (°C) and relative humidity
/// `rh` (%).
///
/// Humidity is not clamped here; out-of-range values are passed through the
/// formulas unchanged.
pub fn heat_index(temp_c: f64, rh: f64) -> f64 {
    let t_f = celsius_to_fahrenheit(temp_c);
    let simple = simple_estimate_f(t_f, rh);
    let hi_f = if simple > SIMPLE_THRESHOLD_F {
        rothfusz_f(t_f, rh)
    } else {
        simple
    };
    fahrenheit_to_celsius(hi_f)
}

/// Elementwise [`heat_index`] over aligned temperature / humidity series.
pub fn heat_index_series(temps_c: &[f64], rhs: &[f64]) -> Result<Vec<f64>> {
    if temps_c.len() != rhs.len() {
        return Err(Error::LengthMismatch { left: temps_c.len(), right: rhs.len() });
    }
    Ok(temps_c
        .iter()
        .zip(rhs)
        .map(|(&t, &rh)| heat_index(t, rh))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    /// Temperature (°F) at which the simple estimate equals the threshold.
    fn threshold_temp_f(rh: f64) -> f64 {
        (2.0 * SIMPLE_THRESHOLD_F + 20.6 - 0.094 * rh) / 2.2
    }

    #[test]
    fn mild_conditions_use_simple_estimate() {
        // 20 °C / 50 % → T_F = 68, simple = 0.5 * (129 + 4.7) = 66.85 °F.
        let hi = heat_index(20.0, 50.0);
        assert_abs_diff_eq!(hi, fahrenheit_to_celsius(66.85), epsilon = 1e-9);
        assert_abs_diff_eq!(hi, 19.3611, epsilon = 1e-3);
    }

    #[test]
    fn hot_conditions_use_full_regression() {
        let t_f = celsius_to_fahrenheit(41.0);
        assert!(simple_estimate_f(t_f, 25.0) > SIMPLE_THRESHOLD_F);
        let hi = heat_index(41.0, 25.0);
        assert_abs_diff_eq!(hi, fahrenheit_to_celsius(rothfusz_f(t_f, 25.0)), epsilon = 1e-9);
        assert_abs_diff_eq!(hi, 42.796, epsilon = 1e-2);
    }

    /// The jump between branches at the threshold stays under 0.5 °C for
    /// humidities up to 50 %.
    #[test]
    fn continuous_at_threshold_for_dry_to_moderate_air() {
        for rh in (0..=50).map(f64::from) {
            let t_f = threshold_temp_f(rh);
            let below = fahrenheit_to_celsius(simple_estimate_f(t_f, rh));
            let above = fahrenheit_to_celsius(rothfusz_f(t_f, rh));
            assert!(
                (above - below).abs() < 0.5,
                "rh={rh}: simple={below:.3} °C full={above:.3} °C"
            );
        }
    }

    #[test]
    fn series_selects_branch_per_element() {
        let temps = [20.0, 41.0, 25.0, 38.0];
        let rhs = [50.0, 25.0, 40.0, 60.0];
        let out = heat_index_series(&temps, &rhs).unwrap();
        assert_eq!(out.len(), 4);
        for i in 0..4 {
            assert_abs_diff_eq!(out[i], heat_index(temps[i], rhs[i]), epsilon = 1e-12);
        }
    }

    #[test]
    fn series_rejects_misaligned_input() {
        let err = heat_index_series(&[30.0, 31.0], &[40.0]).unwrap_err();
        assert!(matches!(err, Error::LengthMismatch { left: 2, right: 1 }));
    }

    #[test]
    fn negative_humidity_is_not_clamped() {
        let dry = heat_index(20.0, 0.0);
        let negative = heat_index(20.0, -10.0);
        assert!(negative < dry);
    }

    #[test]
    fn conversions_round_trip() {
        for c in [-10.0, 0.0, 26.5, 45.0] {
            assert_abs_diff_eq!(fahrenheit_to_celsius(celsius_to_fahrenheit(c)), c, epsilon = 1e-12);
        }
    }
}

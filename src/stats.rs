use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Ordinary least-squares fit of `y = slope * x + intercept`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
    /// Pearson correlation coefficient.
    pub r_value: f64,
    /// Standard error of the slope estimate; 0 for two points.
    pub std_err: f64,
    /// Number of complete pairs used.
    pub n: usize,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum StatsError {
    #[error("need at least 2 complete pairs, got {0}")]
    TooFewPairs(usize),
    #[error("x values have zero variance")]
    ConstantX,
}

impl LinearFit {
    pub fn r_squared(&self) -> f64 {
        self.r_value * self.r_value
    }

    pub fn predict(&self, x: f64) -> f64 {
        self.intercept + self.slope * x
    }

    /// Two-line label: the equation and the coefficient of determination.
    pub fn equation_label(&self) -> String {
        format!("{self}\nR² = {:.2}", self.r_squared())
    }
}

impl fmt::Display for LinearFit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "y = {:.2}x + {:.2}", self.slope, self.intercept)
    }
}

/// Fit a line through `(x, y)` pairs. Callers apply pairwise deletion first.
pub fn linear_regression(pairs: &[(f64, f64)]) -> Result<LinearFit, StatsError> {
    let n = pairs.len();
    if n < 2 {
        return Err(StatsError::TooFewPairs(n));
    }
    let nf = n as f64;

    let mean_x = pairs.iter().map(|p| p.0).sum::<f64>() / nf;
    let mean_y = pairs.iter().map(|p| p.1).sum::<f64>() / nf;

    let (mut sxx, mut syy, mut sxy) = (0.0, 0.0, 0.0);
    for &(x, y) in pairs {
        let dx = x - mean_x;
        let dy = y - mean_y;
        sxx += dx * dx;
        syy += dy * dy;
        sxy += dx * dy;
    }

    // Constant means no spread beyond rounding at the scale of x itself.
    let (min_x, max_x) = pairs
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| (lo.min(p.0), hi.max(p.0)));
    let magnitude = min_x.abs().max(max_x.abs());
    if sxx == 0.0 || max_x - min_x <= 4.0 * f64::EPSILON * magnitude {
        return Err(StatsError::ConstantX);
    }

    let slope = sxy / sxx;
    let intercept = mean_y - slope * mean_x;

    // Correlation is undefined for constant y; report 0.
    let r_value = if syy == 0.0 {
        0.0
    } else {
        (sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0)
    };

    let std_err = if n > 2 {
        ((1.0 - r_value * r_value) * syy / sxx / (nf - 2.0)).max(0.0).sqrt()
    } else {
        0.0
    };

    Ok(LinearFit {
        slope,
        intercept,
        r_value,
        std_err,
        n,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_perfect_line() {
        let uy = [1.0, 2.0, 3.0, 4.0];
        let nivel = [2.0, 4.0, 6.0, 8.0];
        let pairs: Vec<(f64, f64)> = uy.iter().copied().zip(nivel.iter().copied()).collect();
        let fit = linear_regression(&pairs).unwrap();
        assert!(close(fit.slope, 2.0));
        assert!(close(fit.intercept, 0.0));
        assert!(close(fit.r_value, 1.0));
        assert!(fit.std_err < 1e-6);
        assert_eq!(fit.n, 4);
        assert_eq!(fit.equation_label(), "y = 2.00x + 0.00\nR² = 1.00");
    }

    #[test]
    fn test_noisy_negative_slope() {
        let pairs = [(0.0, 10.0), (1.0, 8.5), (2.0, 6.0), (3.0, 4.5), (4.0, 2.0)];
        let fit = linear_regression(&pairs).unwrap();
        assert!(close(fit.slope, -2.0));
        assert!(close(fit.intercept, 10.2));
        assert!(fit.r_value < -0.99);
        assert!(fit.std_err > 0.0);
        assert!(close(fit.predict(1.0), 8.2));
    }

    #[test]
    fn test_too_few_pairs() {
        assert_eq!(linear_regression(&[]), Err(StatsError::TooFewPairs(0)));
        assert_eq!(linear_regression(&[(1.0, 1.0)]), Err(StatsError::TooFewPairs(1)));
    }

    #[test]
    fn test_constant_x() {
        let pairs = [(2.0, 1.0), (2.0, 3.0), (2.0, 5.0)];
        assert_eq!(linear_regression(&pairs), Err(StatsError::ConstantX));
    }

    #[test]
    fn test_small_scale_x_still_fits() {
        let pairs = [(0.0, 1.0), (1e-8, 3.0), (2e-8, 5.0), (3e-8, 7.0)];
        let fit = linear_regression(&pairs).unwrap();
        assert!(((fit.slope - 2e8) / 2e8).abs() < 1e-9);
        assert!(close(fit.intercept, 1.0));
        assert!(close(fit.r_value, 1.0));
    }

    #[test]
    fn test_repeated_inexact_x_is_constant() {
        let pairs = [(0.1, 1.0), (0.1, 2.0), (0.1, 4.0)];
        assert_eq!(linear_regression(&pairs), Err(StatsError::ConstantX));
    }

    #[test]
    fn test_constant_y_has_zero_correlation() {
        let fit = linear_regression(&[(1.0, 3.0), (2.0, 3.0), (3.0, 3.0)]).unwrap();
        assert!(close(fit.slope, 0.0));
        assert!(close(fit.intercept, 3.0));
        assert_eq!(fit.r_value, 0.0);
    }
}

use crate::{Result, ThermalError};
use serde::{Deserialize, Serialize};

/// Piecewise linear 1D table. Values outside the measurement range are clamped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LookupTable1D {
    points: Vec<f64>,
    values: Vec<f64>,
}

impl LookupTable1D {
    pub fn new(points: Vec<f64>, values: Vec<f64>) -> Result<Self> {
        check_axis("points", &points)?;
        if values.len() != points.len() {
            return Err(ThermalError::SizeMismatch {
                what: "lookup table values",
                expected: points.len(),
                actual: values.len(),
            });
        }
        Ok(Self { points, values })
    }

    pub fn value(&self, x: f64) -> f64 {
        let (i, w) = locate(&self.points, x);
        match i {
            Some(i) => self.values[i] * (1.0 - w) + self.values[i + 1] * w,
            None => self.values[if w > 0.0 { self.values.len() - 1 } else { 0 }],
        }
    }
}

/// Bilinear 2D table over `(x1, x2)`; `values[i][j]` belongs to `(points1[i], points2[j])`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LookupTable2D {
    points1: Vec<f64>,
    points2: Vec<f64>,
    values: Vec<Vec<f64>>,
}

impl LookupTable2D {
    pub fn new(points1: Vec<f64>, points2: Vec<f64>, values: Vec<Vec<f64>>) -> Result<Self> {
        check_axis("points1", &points1)?;
        check_axis("points2", &points2)?;
        if values.len() != points1.len() {
            return Err(ThermalError::SizeMismatch {
                what: "lookup table rows",
                expected: points1.len(),
                actual: values.len(),
            });
        }
        if let Some(row) = values.iter().find(|row| row.len() != points2.len()) {
            return Err(ThermalError::SizeMismatch {
                what: "lookup table columns",
                expected: points2.len(),
                actual: row.len(),
            });
        }
        Ok(Self {
            points1,
            points2,
            values,
        })
    }

    pub fn value(&self, x1: f64, x2: f64) -> f64 {
        let (i, wi) = clamp_locate(&self.points1, x1);
        let (j, wj) = clamp_locate(&self.points2, x2);
        let at = |a: usize, b: usize| self.values[a][b];
        let i1 = (i + 1).min(self.points1.len() - 1);
        let j1 = (j + 1).min(self.points2.len() - 1);
        let lower = at(i, j) * (1.0 - wj) + at(i, j1) * wj;
        let upper = at(i1, j) * (1.0 - wj) + at(i1, j1) * wj;
        lower * (1.0 - wi) + upper * wi
    }
}

fn check_axis(name: &'static str, points: &[f64]) -> Result<()> {
    if points.is_empty() {
        return Err(ThermalError::invalid(name, "needs at least one point"));
    }
    if points.windows(2).any(|w| !(w[1] > w[0])) {
        return Err(ThermalError::invalid(name, "must be strictly increasing"));
    }
    Ok(())
}

/// Interval index and weight of `x`. `None` if `x` is outside; the weight then tells the side.
fn locate(points: &[f64], x: f64) -> (Option<usize>, f64) {
    let n = points.len();
    if x <= points[0] {
        return (None, -1.0);
    }
    if x >= points[n - 1] {
        return (None, 1.0);
    }
    let i = points.partition_point(|&p| p <= x) - 1;
    (Some(i), (x - points[i]) / (points[i + 1] - points[i]))
}

fn clamp_locate(points: &[f64], x: f64) -> (usize, f64) {
    match locate(points, x) {
        (Some(i), w) => (i, w),
        (None, w) if w > 0.0 => (points.len() - 1, 0.0),
        (None, _) => (0, 0.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_1d_interpolation_and_clamping() {
        let t = LookupTable1D::new(vec![0.0, 10.0, 20.0], vec![0.0, 100.0, 300.0]).unwrap();
        assert!((t.value(5.0) - 50.0).abs() < 1e-12);
        assert!((t.value(15.0) - 200.0).abs() < 1e-12);
        assert_eq!(t.value(-5.0), 0.0);
        assert_eq!(t.value(25.0), 300.0);
        assert_eq!(t.value(10.0), 100.0);
    }

    #[test]
    fn test_2d_interpolation() {
        let t = LookupTable2D::new(
            vec![0.0, 1.0],
            vec![0.0, 2.0],
            vec![vec![0.0, 2.0], vec![10.0, 12.0]],
        )
        .unwrap();
        assert!((t.value(0.5, 1.0) - 6.0).abs() < 1e-12);
        assert!((t.value(2.0, 5.0) - 12.0).abs() < 1e-12);
        assert!((t.value(-1.0, 1.0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_rejects_bad_axes() {
        assert!(LookupTable1D::new(vec![1.0, 1.0], vec![0.0, 0.0]).is_err());
        assert!(LookupTable1D::new(vec![0.0, 1.0], vec![0.0]).is_err());
        assert!(LookupTable2D::new(vec![0.0], vec![0.0, 1.0], vec![vec![0.0]]).is_err());
    }
}

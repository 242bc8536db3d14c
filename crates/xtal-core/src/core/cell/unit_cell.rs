use nalgebra::{Matrix3, Point3};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum CellError {
    #[error("Invalid cell edge {name} = {value} (must be a finite, positive length)")]
    InvalidLength { name: &'static str, value: f64 },
    #[error("Invalid cell angle {name} = {value} degrees (must lie strictly between 0 and 180)")]
    InvalidAngle { name: &'static str, value: f64 },
    #[error("Cell angles ({alpha}, {beta}, {gamma}) do not describe a real lattice")]
    Degenerate { alpha: f64, beta: f64, gamma: f64 },
}

/// A crystallographic unit cell with cached orthogonalization matrices.
///
/// Edges are in Angstroms and angles in degrees. The orthogonal frame places
/// `a` along X and `b` in the XY plane, the standard PDB convention. Both
/// matrices are computed once at construction and the cell is immutable
/// afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct UnitCell {
    a: f64,
    b: f64,
    c: f64,
    alpha: f64,
    beta: f64,
    gamma: f64,
    orth: Matrix3<f64>,
    frac: Matrix3<f64>,
}

impl UnitCell {
    /// Builds a unit cell from its six lattice parameters.
    ///
    /// # Errors
    ///
    /// Returns [`CellError`] if any edge is not a positive finite length, any
    /// angle is outside the open interval (0, 180), or the three angles cannot
    /// close a parallelepiped.
    pub fn new(a: f64, b: f64, c: f64, alpha: f64, beta: f64, gamma: f64) -> Result<Self, CellError> {
        for (name, value) in [("a", a), ("b", b), ("c", c)] {
            if !value.is_finite() || value <= 0.0 {
                return Err(CellError::InvalidLength { name, value });
            }
        }
        for (name, value) in [("alpha", alpha), ("beta", beta), ("gamma", gamma)] {
            if !value.is_finite() || value <= 0.0 || value >= 180.0 {
                return Err(CellError::InvalidAngle { name, value });
            }
        }

        let cos_a = alpha.to_radians().cos();
        let (sin_b, cos_b) = beta.to_radians().sin_cos();
        let (sin_g, cos_g) = gamma.to_radians().sin_cos();

        // Cosine of the reciprocal angle alpha*.
        let rca = (cos_b * cos_g - cos_a) / (sin_b * sin_g);
        let sin_rca_sq = 1.0 - rca * rca;
        if !(sin_rca_sq > f64::EPSILON) {
            return Err(CellError::Degenerate { alpha, beta, gamma });
        }
        let sin_rca = sin_rca_sq.sqrt();

        #[rustfmt::skip]
        let orth = Matrix3::new(
            a,   cos_g * b,  cos_b * c,
            0.0, sin_g * b, -sin_b * rca * c,
            0.0, 0.0,        sin_b * c * sin_rca,
        );

        #[rustfmt::skip]
        let frac = Matrix3::new(
            1.0 / a, -cos_g / (sin_g * a), -(cos_g * sin_b * rca + cos_b * sin_g) / (sin_b * sin_rca * sin_g * a),
            0.0,      1.0 / (sin_g * b),    rca / (sin_rca * sin_g * b),
            0.0,      0.0,                  1.0 / (sin_b * sin_rca * c),
        );

        Ok(Self {
            a,
            b,
            c,
            alpha,
            beta,
            gamma,
            orth,
            frac,
        })
    }

    pub fn a(&self) -> f64 {
        self.a
    }
    pub fn b(&self) -> f64 {
        self.b
    }
    pub fn c(&self) -> f64 {
        self.c
    }
    pub fn alpha(&self) -> f64 {
        self.alpha
    }
    pub fn beta(&self) -> f64 {
        self.beta
    }
    pub fn gamma(&self) -> f64 {
        self.gamma
    }

    /// Lattice parameters in the order `[a, b, c, alpha, beta, gamma]`.
    pub fn parameters(&self) -> [f64; 6] {
        [self.a, self.b, self.c, self.alpha, self.beta, self.gamma]
    }

    pub fn orthogonalization_matrix(&self) -> &Matrix3<f64> {
        &self.orth
    }

    pub fn fractionalization_matrix(&self) -> &Matrix3<f64> {
        &self.frac
    }

    /// Converts fractional coordinates to Cartesian Angstroms.
    pub fn orthogonalize(&self, frac: &Point3<f64>) -> Point3<f64> {
        Point3::from(self.orth * frac.coords)
    }

    /// Converts Cartesian Angstroms to fractional coordinates.
    pub fn fractionalize(&self, cart: &Point3<f64>) -> Point3<f64> {
        Point3::from(self.frac * cart.coords)
    }

    /// Cell volume in cubic Angstroms.
    pub fn volume(&self) -> f64 {
        self.orth.determinant()
    }
}

impl fmt::Display for UnitCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.3} {:.3} {:.3} {:.2} {:.2} {:.2}",
            self.a, self.b, self.c, self.alpha, self.beta, self.gamma
        )
    }
}

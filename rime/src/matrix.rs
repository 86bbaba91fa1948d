//! Dense matrices of scalars modulo the group order
//!
//! Threshold changes need to convert between public verification shares and
//! coefficient commitments of the master polynomial. Inverting a Vandermonde
//! matrix of participant indexes and multiplying it onto a matrix of points
//! performs that conversion in the exponent, see
//! [`threshold`](crate::threshold).

use core::fmt;

use crate::{Point, Scalar};

/// Dense row-major matrix of scalars modulo the group order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScalarMatrix {
    rows: Vec<Vec<Scalar>>,
}

impl ScalarMatrix {
    /// Constructs a matrix from its rows
    ///
    /// Returns an error if the input is empty or the rows have uneven lengths.
    pub fn from_rows(rows: Vec<Vec<Scalar>>) -> Result<Self, MatrixError> {
        let width = rows.first().map(Vec::len).ok_or(Reason::Empty)?;
        if width == 0 || rows.iter().any(|row| row.len() != width) {
            return Err(Reason::NotRectangular.into());
        }
        Ok(Self { rows })
    }

    /// Constructs the square Vandermonde matrix of the given evaluation points
    ///
    /// `V[r][c] = indices[r]^c`. The matrix is invertible iff the indices are
    /// pairwise distinct.
    pub fn vandermonde(indices: &[Scalar]) -> Result<Self, MatrixError> {
        if indices.is_empty() {
            return Err(Reason::Empty.into());
        }
        let rows = indices
            .iter()
            .map(|x| {
                let mut power = Scalar::one();
                (0..indices.len())
                    .map(|_| {
                        let entry = power;
                        power = power * x;
                        entry
                    })
                    .collect()
            })
            .collect();
        Ok(Self { rows })
    }

    /// Number of rows
    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns
    pub fn num_cols(&self) -> usize {
        self.rows[0].len()
    }

    /// Rows of the matrix
    pub fn rows(&self) -> &[Vec<Scalar>] {
        &self.rows
    }

    /// Computes the determinant by cofactor expansion along the first row
    ///
    /// Returns an error if the matrix is not square.
    pub fn determinant(&self) -> Result<Scalar, MatrixError> {
        if self.num_rows() != self.num_cols() {
            return Err(Reason::NotSquare.into());
        }
        Ok(determinant_of(&self.rows))
    }

    /// Computes the inverse via the adjugate divided by the determinant
    ///
    /// The determinant is inverted modulo the group order. Returns an error if
    /// the matrix is not square or is singular (for a Vandermonde matrix, iff
    /// some evaluation points coincide).
    pub fn inverse(&self) -> Result<Self, MatrixError> {
        let n = self.num_rows();
        if n != self.num_cols() {
            return Err(Reason::NotSquare.into());
        }
        let det_inv = self
            .determinant()?
            .invert()
            .ok_or(Reason::Singular)?;

        if n == 1 {
            return Ok(Self {
                rows: vec![vec![det_inv]],
            });
        }

        // adjugate: transposed matrix of signed minors
        let rows = (0..n)
            .map(|r| {
                (0..n)
                    .map(|c| {
                        let minor = determinant_of(&minor_of(&self.rows, c, r));
                        let sign = if (r + c) % 2 == 0 {
                            Scalar::one()
                        } else {
                            -Scalar::one()
                        };
                        sign * minor * det_inv
                    })
                    .collect()
            })
            .collect();
        Ok(Self { rows })
    }

    /// Left-multiplies this matrix onto a matrix of points
    ///
    /// `out[r][j] = sum_k self[r][k] * points[k][j]`. Returns an error if the
    /// dimensions don't line up.
    pub fn mult_point_matrix(&self, points: &[Vec<Point>]) -> Result<Vec<Vec<Point>>, MatrixError> {
        let inner = points.first().map(Vec::len).ok_or(Reason::Empty)?;
        if points.len() != self.num_cols() || points.iter().any(|row| row.len() != inner) {
            return Err(Reason::DimensionMismatch.into());
        }
        Ok(self
            .rows
            .iter()
            .map(|row| {
                (0..inner)
                    .map(|j| {
                        row.iter()
                            .zip(points)
                            .fold(Point::zero(), |acc, (coeff, point_row)| {
                                acc + point_row[j] * coeff
                            })
                    })
                    .collect()
            })
            .collect())
    }
}

/// Determinant of a square matrix given by its rows
fn determinant_of(rows: &[Vec<Scalar>]) -> Scalar {
    match rows.len() {
        1 => rows[0][0],
        2 => rows[0][0] * rows[1][1] - rows[0][1] * rows[1][0],
        n => {
            let mut det = Scalar::zero();
            let mut sign = Scalar::one();
            for c in 0..n {
                det = det + sign * rows[0][c] * determinant_of(&minor_of(rows, 0, c));
                sign = -sign;
            }
            det
        }
    }
}

/// The matrix with row `r` and column `c` removed
fn minor_of(rows: &[Vec<Scalar>], r: usize, c: usize) -> Vec<Vec<Scalar>> {
    rows.iter()
        .enumerate()
        .filter(|(i, _)| *i != r)
        .map(|(_, row)| {
            row.iter()
                .enumerate()
                .filter(|(j, _)| *j != c)
                .map(|(_, x)| *x)
                .collect()
        })
        .collect()
}

/// Matrix operation error
#[derive(Debug)]
pub struct MatrixError(Reason);

#[derive(Debug)]
enum Reason {
    Empty,
    NotRectangular,
    NotSquare,
    Singular,
    DimensionMismatch,
}

impl fmt::Display for MatrixError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Reason::Empty => f.write_str("matrix must not be empty"),
            Reason::NotRectangular => f.write_str("rows have uneven lengths"),
            Reason::NotSquare => f.write_str("operation requires a square matrix"),
            Reason::Singular => f.write_str("matrix is singular"),
            Reason::DimensionMismatch => f.write_str("matrix dimensions don't match"),
        }
    }
}

impl std::error::Error for MatrixError {}

impl From<Reason> for MatrixError {
    fn from(err: Reason) -> Self {
        Self(err)
    }
}

//! Secret polynomials, Feldman commitments and Lagrange interpolation
//!
//! Every protocol in this crate deals shares by evaluating a secret polynomial
//! at participant indexes and publishing the coefficient commitments
//! `C_k = a_k * G`. This module owns the polynomial arithmetic shared by
//! [`keygen`](crate::keygen), [`refresh`](crate::refresh),
//! [`threshold`](crate::threshold), [`repair`](crate::repair) and
//! [`dealer`](crate::dealer).

use rand_core::{CryptoRng, RngCore};

use crate::{Point, Scalar, SecretScalar, SignerIndex};

/// Secret polynomial over the scalar field, coefficients in ascending degree
/// order (constant term first)
///
/// Coefficients are zeroized on drop. The polynomial itself never leaves the
/// participant that sampled it; only evaluations and commitments do.
pub(crate) struct SecretPolynomial {
    coefficients: Vec<SecretScalar>,
}

impl SecretPolynomial {
    /// Samples `len` uniformly random coefficients
    pub fn random(len: usize, rng: &mut (impl RngCore + CryptoRng)) -> Self {
        Self {
            coefficients: (0..len).map(|_| SecretScalar::random(rng)).collect(),
        }
    }

    /// Samples a polynomial with zero constant term and `len - 1` uniformly
    /// random higher coefficients
    ///
    /// Dealing shares of such a polynomial leaves the jointly-held secret
    /// unchanged, which is what a refresh round relies on.
    pub fn random_with_zero_constant(len: usize, rng: &mut (impl RngCore + CryptoRng)) -> Self {
        let mut coefficients = Vec::with_capacity(len);
        coefficients.push(SecretScalar::new(&mut Scalar::zero()));
        coefficients.extend((0..len.saturating_sub(1)).map(|_| SecretScalar::random(rng)));
        Self { coefficients }
    }

    /// Builds a polynomial with the given constant term and `len - 1`
    /// uniformly random higher coefficients
    pub fn with_constant(
        constant: SecretScalar,
        len: usize,
        rng: &mut (impl RngCore + CryptoRng),
    ) -> Self {
        let mut coefficients = Vec::with_capacity(len);
        coefficients.push(constant);
        coefficients.extend((0..len.saturating_sub(1)).map(|_| SecretScalar::random(rng)));
        Self { coefficients }
    }

    /// Number of coefficients
    pub fn len(&self) -> usize {
        self.coefficients.len()
    }

    /// The constant term `f(0)`
    pub fn constant(&self) -> &SecretScalar {
        &self.coefficients[0]
    }

    /// Evaluates the polynomial at `x` using Horner's scheme, highest-degree
    /// coefficient first
    pub fn evaluate(&self, x: &Scalar) -> Scalar {
        self.coefficients
            .iter()
            .rev()
            .fold(Scalar::zero(), |acc, coeff| acc * x + coeff.as_ref())
    }

    /// Evaluates the polynomial at a participant index
    pub fn evaluate_at_index(&self, j: SignerIndex) -> Scalar {
        self.evaluate(&index_to_scalar(j))
    }

    /// Commitments to the coefficients: `C_k = a_k * G`
    pub fn commitments(&self) -> Vec<Point> {
        self.coefficients
            .iter()
            .map(|coeff| Point::generator() * coeff)
            .collect()
    }
}

/// Converts a participant index into a scalar
pub fn index_to_scalar(i: SignerIndex) -> Scalar {
    Scalar::from(u16::from(i))
}

/// Evaluates a committed polynomial in the exponent
///
/// Given coefficient commitments `C_k = a_k * G`, computes
/// `sum_k C_k * x^k = f(x) * G` without knowledge of `f`.
pub fn evaluate_commitments(commitments: &[Point], x: &Scalar) -> Point {
    let (_, sum) = commitments
        .iter()
        .fold((Scalar::one(), Point::zero()), |(power, sum), comm| {
            (power * x, sum + comm * power)
        });
    sum
}

/// Derives the public verification share of participant `i`
///
/// `F_i = f(i) * G` evaluated from the group's coefficient commitments; every
/// honest participant's aggregate share `s_i` satisfies `s_i * G = F_i`.
pub fn derive_verification_share(group_commitments: &[Point], i: SignerIndex) -> Point {
    evaluate_commitments(group_commitments, &index_to_scalar(i))
}

/// Computes the Lagrange coefficient of member `i` at evaluation point `x`
/// over the index set `indexes`
///
/// `lambda = prod_{j in S, j != i} (x - j) / (i - j)`. Signing uses `x = 0`
/// (reconstruction of `f(0)` in the exponent); repair uses `x` equal to the
/// index of the lost share.
///
/// Returns `None` if `indexes` contains duplicates. `i` does not have to be a
/// member of `indexes`; callers that rely on the conventional interpolation
/// meaning must ensure it is.
pub fn lagrange_coefficient(indexes: &[SignerIndex], i: SignerIndex, x: &Scalar) -> Option<Scalar> {
    let mut sorted = indexes.to_vec();
    sorted.sort_unstable();
    if sorted.windows(2).any(|pair| pair[0] == pair[1]) {
        return None;
    }

    let i_scalar = index_to_scalar(i);
    let mut num = Scalar::one();
    let mut den = Scalar::one();
    for &j in indexes {
        if j == i {
            continue;
        }
        let j_scalar = index_to_scalar(j);
        num = num * (x - j_scalar);
        den = den * (i_scalar - j_scalar);
    }

    Some(num * den.invert()?)
}

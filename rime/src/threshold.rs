//! Threshold increase and decrease
//!
//! Both operations change how many participants must cooperate to sign while
//! keeping the joint public key unchanged.
//!
//! **Increase** is a dealing round like [DKG](crate::keygen): every
//! participant deals an increment polynomial `delta(X) = X * g(X)` (no
//! constant slot, so `delta(0) = 0`), and each recipient folds the scaled
//! evaluations into its share, raising the master polynomial's degree.
//!
//! **Decrease** is local: a leaving participant reveals its share, and every
//! remaining participant projects its own share onto the unique lower-degree
//! polynomial agreeing with the revealed evaluation. The shortened commitment
//! vector is recovered by interpolating verification shares in the exponent
//! with an inverted Vandermonde matrix.

use core::fmt;

use rand_core::{CryptoRng, RngCore};

use crate::{
    keygen::{self, AggregateSharesError, CollectError, ProofOfKnowledge},
    matrix::{MatrixError, ScalarMatrix},
    participant::{InvalidParticipant, Participant},
    poly::{self, SecretPolynomial},
    Point, Scalar, SecretScalar, SignerIndex,
};

/// Round 1 broadcast of a threshold increase
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IncreasePackage {
    /// Index of the dealer
    pub sender: SignerIndex,
    /// Commitments to the increment polynomial `g`, `t' - 1` of them
    ///
    /// The dealt polynomial is `delta(X) = X * g(X)`: there is no constant
    /// slot, which is what keeps the joint key unchanged.
    pub coefficient_commitments: Vec<Point>,
    /// Proof of knowledge of the first coefficient of `g`
    pub proof_of_knowledge: ProofOfKnowledge,
}

/// Dealing state of one participant during a threshold increase
pub struct ThresholdIncrease {
    i: SignerIndex,
    old_threshold: u16,
    new_threshold: u16,
    participants: u16,
    polynomial: SecretPolynomial,
}

/// Starts a threshold increase to `new_threshold` for the given participant
///
/// Samples the increment polynomial `g` with `t' - 1` uniformly random
/// coefficients and produces the broadcast package. Requires
/// `t < t' <= n`.
pub fn init_increase(
    participant: &Participant,
    new_threshold: u16,
    rng: &mut (impl RngCore + CryptoRng),
) -> Result<(ThresholdIncrease, IncreasePackage), ThresholdError> {
    if new_threshold <= participant.threshold() {
        return Err(Reason::NotAnIncrease.into());
    }
    if new_threshold > participant.participants() {
        return Err(Reason::ThresholdOutOfRange.into());
    }

    let polynomial = SecretPolynomial::random(usize::from(new_threshold) - 1, rng);
    let proof_of_knowledge = keygen::prove_knowledge(participant.index(), polynomial.constant(), rng);
    let package = IncreasePackage {
        sender: participant.index(),
        coefficient_commitments: polynomial.commitments(),
        proof_of_knowledge,
    };
    Ok((
        ThresholdIncrease {
            i: participant.index(),
            old_threshold: participant.threshold(),
            new_threshold,
            participants: participant.participants(),
            polynomial,
        },
        package,
    ))
}

/// Verifies the proof of knowledge of an increase package
///
/// Same check as in DKG, run against the first commitment of `g`. Returns
/// `false` on a failed check.
pub fn verify_increase_package(package: &IncreasePackage) -> bool {
    let Some(first) = package.coefficient_commitments.first() else {
        return false;
    };
    keygen::verify_pok(package.sender, first, &package.proof_of_knowledge)
}

impl ThresholdIncrease {
    /// Evaluates `g` at every participant index
    ///
    /// Routing as in [`keygen::Keygen::generate_shares`]. The recipient, not
    /// the dealer, multiplies the sum of the received evaluations by its own
    /// index, turning `g(i)` into `delta(i) = i * g(i)`.
    pub fn generate_shares(&self) -> Vec<Scalar> {
        (1..=self.participants)
            .map(|j| self.polynomial.evaluate_at_index(j as SignerIndex))
            .collect()
    }

    /// Applies the threshold increase to the participant
    ///
    /// Verifies the packages and shares, updates the aggregate share to
    /// `s_i + i * sum_j g_j(i)`, and extends the group commitment vector to
    /// length `t'` (the dealt commitments enter shifted up one degree).
    pub fn finish(
        self,
        participant: &mut Participant,
        packages: &[IncreasePackage],
        received_shares: &[(SignerIndex, Scalar)],
    ) -> Result<(), ThresholdError> {
        if participant.threshold() != self.old_threshold {
            return Err(Reason::ThresholdOutOfRange.into());
        }
        let packages = keygen::collect_by_sender(self.participants, packages, |p| p.sender)
            .map_err(Reason::Collect)?;

        for package in &packages {
            if package.coefficient_commitments.len() != usize::from(self.new_threshold) - 1 {
                return Err(Reason::WrongCommitmentsLength(package.sender).into());
            }
            if !verify_increase_package(package) {
                return Err(Reason::BadProofOfKnowledge(package.sender).into());
            }
        }

        let own_share = self.polynomial.evaluate_at_index(self.i);
        let delta = keygen::aggregate_shares(
            self.i,
            self.participants,
            own_share,
            received_shares,
            |sender, share| {
                let dealer = &packages[usize::from(sender) - 1];
                keygen::verify_share(self.i, share, &dealer.coefficient_commitments)
            },
        )
        .map_err(Reason::from)?;

        // s_i + i * sum_j g_j(i); the factor i encodes delta(X) = X * g(X)
        let mut new_share =
            participant.aggregate_share().as_ref() + poly::index_to_scalar(self.i) * delta;

        let dealt = keygen::sum_commitments(
            packages.iter().map(|p| &*p.coefficient_commitments),
            usize::from(self.new_threshold) - 1,
        );
        let old = participant.group_commitments();
        let new_commitments = (0..usize::from(self.new_threshold))
            .map(|k| {
                let carried = old.get(k).copied().unwrap_or_else(Point::zero);
                match k.checked_sub(1) {
                    Some(shifted) => carried + dealt[shifted],
                    None => carried,
                }
            })
            .collect();

        participant
            .update_key_material(
                self.new_threshold,
                SecretScalar::new(&mut new_share),
                new_commitments,
            )
            .map_err(|err| Reason::InvalidKeyMaterial(err).into())
    }
}

/// Decreases the threshold by one using a share revealed by a leaving
/// participant
///
/// `revealed_share` is the aggregate share of participant `leaving`, made
/// public by it on its way out; it is checked against the leaving
/// participant's public verification share. Every remaining participant calls
/// this with the same revealed value and ends up on the same degree-reduced
/// master polynomial with threshold `t - 1`. The leaving participant's state
/// is no longer usable with the new commitments.
pub fn decrement(
    participant: &mut Participant,
    revealed_share: &Scalar,
    leaving: SignerIndex,
) -> Result<(), ThresholdError> {
    let t = participant.threshold();
    let n = participant.participants();
    if t < 2 {
        return Err(Reason::ThresholdOutOfRange.into());
    }
    if leaving == 0 || u16::from(leaving) > n {
        return Err(Reason::LeavingIndexOutOfRange.into());
    }
    if leaving == participant.index() {
        return Err(Reason::LeavingIsSelf.into());
    }
    if Point::generator() * revealed_share != participant.verification_share(leaving) {
        return Err(Reason::BadRevealedShare.into());
    }

    // project own share onto the line through (leaving, s*)
    let i = poly::index_to_scalar(participant.index());
    let j = poly::index_to_scalar(leaving);
    let denominator = (i - j).invert().ok_or(Reason::LeavingIsSelf)?;
    let quotient = (participant.aggregate_share().as_ref() - revealed_share) * denominator;
    let mut new_share = revealed_share - j * quotient;

    // the same projection in the exponent, at t - 1 fixed evaluation points,
    // then a Vandermonde inversion to get back coefficient commitments
    let eval_indexes: Vec<SignerIndex> = (1..=n)
        .map(|k| k as SignerIndex)
        .filter(|k| *k != leaving)
        .take(usize::from(t) - 1)
        .collect();
    let revealed_point = Point::generator() * revealed_share;
    let projected: Vec<Vec<Point>> = eval_indexes
        .iter()
        .map(|&k| {
            let f_k = participant.verification_share(k);
            let inv = (poly::index_to_scalar(k) - j)
                .invert()
                .ok_or(Reason::BadEvaluationIndexes)?;
            let q_k = (f_k - revealed_point) * inv;
            Ok(vec![revealed_point - q_k * j])
        })
        .collect::<Result<_, Reason>>()?;

    let scalar_indexes: Vec<Scalar> = eval_indexes
        .iter()
        .map(|&k| poly::index_to_scalar(k))
        .collect();
    let vandermonde = ScalarMatrix::vandermonde(&scalar_indexes).map_err(Reason::Matrix)?;
    let new_commitments = vandermonde
        .inverse()
        .map_err(Reason::Matrix)?
        .mult_point_matrix(&projected)
        .map_err(Reason::Matrix)?
        .into_iter()
        .flatten()
        .collect();

    participant
        .update_key_material(t - 1, SecretScalar::new(&mut new_share), new_commitments)
        .map_err(|err| Reason::InvalidKeyMaterial(err).into())
}

/// Threshold change error
#[derive(Debug)]
pub struct ThresholdError(Reason);

#[derive(Debug)]
enum Reason {
    NotAnIncrease,
    ThresholdOutOfRange,
    Collect(CollectError),
    WrongCommitmentsLength(SignerIndex),
    BadProofOfKnowledge(SignerIndex),
    BadShare(SignerIndex),
    LeavingIndexOutOfRange,
    LeavingIsSelf,
    BadRevealedShare,
    BadEvaluationIndexes,
    Matrix(MatrixError),
    InvalidKeyMaterial(InvalidParticipant),
}

impl From<AggregateSharesError> for Reason {
    fn from(err: AggregateSharesError) -> Self {
        match err {
            AggregateSharesError::Collect(err) => Reason::Collect(err),
            AggregateSharesError::BadShare(j) => Reason::BadShare(j),
        }
    }
}

impl fmt::Display for ThresholdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Reason::NotAnIncrease => {
                f.write_str("new threshold must be greater than the current one")
            }
            Reason::ThresholdOutOfRange => f.write_str("threshold out of range"),
            Reason::Collect(err) => err.fmt(f),
            Reason::WrongCommitmentsLength(j) => write!(
                f,
                "participant {j} committed to a wrong number of coefficients"
            ),
            Reason::BadProofOfKnowledge(j) => {
                write!(f, "proof of knowledge of participant {j} is invalid")
            }
            Reason::BadShare(j) => write!(
                f,
                "share from participant {j} is inconsistent with its commitments"
            ),
            Reason::LeavingIndexOutOfRange => f.write_str("leaving participant index not in 1..=n"),
            Reason::LeavingIsSelf => {
                f.write_str("a participant cannot decrement the threshold against itself")
            }
            Reason::BadRevealedShare => f.write_str(
                "revealed share is inconsistent with the leaving participant's \
                verification share",
            ),
            Reason::BadEvaluationIndexes => f.write_str("evaluation indexes are not distinct"),
            Reason::Matrix(_) => f.write_str("commitment interpolation failed"),
            Reason::InvalidKeyMaterial(_) => f.write_str("updated key material is invalid"),
        }
    }
}

impl std::error::Error for ThresholdError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.0 {
            Reason::Matrix(err) => Some(err),
            Reason::InvalidKeyMaterial(err) => Some(err),
            _ => None,
        }
    }
}

impl From<Reason> for ThresholdError {
    fn from(err: Reason) -> Self {
        Self(err)
    }
}

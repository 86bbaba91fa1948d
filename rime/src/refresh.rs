//! Proactive share refresh
//!
//! Refreshing re-randomizes every aggregate share while keeping the joint
//! public key (and the threshold) unchanged. Each participant deals a
//! polynomial with a *zero* constant term; adding everyone's evaluations onto
//! the existing shares moves all shares to a new master polynomial with the
//! same secret. Old shares become useless to an attacker who compromised
//! fewer than `t` of them before the refresh.
//!
//! The round structure is the same as in [DKG](crate::keygen): broadcast
//! [`RefreshPackage`], deal shares privately, then [`ShareRefresh::finish`]
//! applies the update to the participant in place.

use core::fmt;

use rand_core::{CryptoRng, RngCore};

use crate::{
    keygen::{self, AggregateSharesError, CollectError},
    participant::{InvalidParticipant, Participant},
    poly::SecretPolynomial,
    Point, Scalar, SecretScalar, SignerIndex,
};

/// Round 1 broadcast of a refresh: commitments to the refresh polynomial
///
/// The constant commitment must be the identity point, which everyone checks:
/// it is what guarantees the joint key is preserved.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RefreshPackage {
    /// Index of the dealer
    pub sender: SignerIndex,
    /// Commitments to the refresh polynomial, `t` of them; the first is the
    /// identity
    pub coefficient_commitments: Vec<Point>,
}

/// Dealing state of one participant during a refresh round
pub struct ShareRefresh {
    i: SignerIndex,
    threshold: u16,
    participants: u16,
    polynomial: SecretPolynomial,
}

/// Starts a refresh round for the given participant
///
/// Samples a polynomial with zero constant term and `t - 1` uniformly random
/// higher coefficients, and produces the broadcast package.
pub fn init(
    participant: &Participant,
    rng: &mut (impl RngCore + CryptoRng),
) -> (ShareRefresh, RefreshPackage) {
    let polynomial = SecretPolynomial::random_with_zero_constant(
        usize::from(participant.threshold()),
        rng,
    );
    let package = RefreshPackage {
        sender: participant.index(),
        coefficient_commitments: polynomial.commitments(),
    };
    (
        ShareRefresh {
            i: participant.index(),
            threshold: participant.threshold(),
            participants: participant.participants(),
            polynomial,
        },
        package,
    )
}

/// Checks that a refresh package commits to a zero constant term and has the
/// expected number of commitments
pub fn verify_package(package: &RefreshPackage, threshold: u16) -> bool {
    package.coefficient_commitments.len() == usize::from(threshold)
        && package
            .coefficient_commitments
            .first()
            .is_some_and(|constant| constant.is_zero())
}

impl ShareRefresh {
    /// Evaluates the refresh polynomial at every participant index
    ///
    /// Same routing as [`keygen::Keygen::generate_shares`].
    pub fn generate_shares(&self) -> Vec<Scalar> {
        (1..=self.participants)
            .map(|j| self.polynomial.evaluate_at_index(j as SignerIndex))
            .collect()
    }

    /// Applies the refresh to the participant
    ///
    /// Verifies all packages (including the zero-constant check) and shares,
    /// then adds the dealt evaluations onto the aggregate share and the dealt
    /// commitments onto the group commitments. The joint public key is
    /// checked to be unchanged.
    pub fn finish(
        self,
        participant: &mut Participant,
        packages: &[RefreshPackage],
        received_shares: &[(SignerIndex, Scalar)],
    ) -> Result<(), RefreshError> {
        let packages = keygen::collect_by_sender(self.participants, packages, |p| p.sender)
            .map_err(Reason::Collect)?;

        for package in &packages {
            if !verify_package(package, self.threshold) {
                return Err(Reason::BadPackage(package.sender).into());
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

        let mut new_share = participant.aggregate_share().as_ref() + delta;
        let mut new_commitments = keygen::sum_commitments(
            packages.iter().map(|p| &*p.coefficient_commitments),
            usize::from(self.threshold),
        );
        for (acc, old) in new_commitments.iter_mut().zip(participant.group_commitments()) {
            *acc = *acc + old;
        }

        participant
            .update_key_material(
                self.threshold,
                SecretScalar::new(&mut new_share),
                new_commitments,
            )
            .map_err(|err| Reason::InvalidKeyMaterial(err).into())
    }
}

/// Share refresh error
#[derive(Debug)]
pub struct RefreshError(Reason);

#[derive(Debug)]
enum Reason {
    Collect(CollectError),
    BadPackage(SignerIndex),
    BadShare(SignerIndex),
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

impl fmt::Display for RefreshError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Reason::Collect(err) => err.fmt(f),
            Reason::BadPackage(j) => write!(
                f,
                "refresh package of participant {j} is malformed or doesn't \
                commit to a zero constant term"
            ),
            Reason::BadShare(j) => write!(
                f,
                "refresh share from participant {j} is inconsistent with its commitments"
            ),
            Reason::InvalidKeyMaterial(_) => f.write_str("refreshed key material is invalid"),
        }
    }
}

impl std::error::Error for RefreshError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.0 {
            Reason::InvalidKeyMaterial(err) => Some(err),
            _ => None,
        }
    }
}

impl From<Reason> for RefreshError {
    fn from(err: Reason) -> Self {
        Self(err)
    }
}

//! Trusted dealer
//!
//! A trusted dealer generates every participant's share in one place. Note
//! that it creates a SPOF/T (single point of failure/trust): whoever runs it
//! sees the whole secret. It is mainly intended for tests and for importing an
//! existing key into the threshold scheme; [`reconstruct_secret`] is the
//! matching export.

use core::fmt;

use rand_core::{CryptoRng, RngCore};

use crate::{
    participant::{InvalidParticipant, Participant},
    poly::{self, SecretPolynomial},
    Point, Scalar, SecretScalar, SignerIndex,
};

/// Splits a secret into a `t`-of-`n` participant set
///
/// If `secret` is `None`, a fresh uniformly random secret is sampled. The
/// joint public key of the resulting participants is `secret * G`.
pub fn split(
    secret: Option<SecretScalar>,
    threshold: u16,
    participants: u16,
    rng: &mut (impl RngCore + CryptoRng),
) -> Result<Vec<Participant>, DealerError> {
    if participants > u16::from(SignerIndex::MAX) {
        return Err(Reason::TooManyParticipants.into());
    }
    if threshold < 2 || threshold > participants {
        return Err(Reason::ThresholdOutOfRange.into());
    }

    let secret = secret.unwrap_or_else(|| SecretScalar::random(rng));
    let polynomial = SecretPolynomial::with_constant(secret, usize::from(threshold), rng);
    let group_commitments = polynomial.commitments();

    (1..=participants)
        .map(|j| {
            let j = j as SignerIndex;
            let mut share = polynomial.evaluate_at_index(j);
            Participant::new(
                j,
                threshold,
                participants,
                SecretScalar::new(&mut share),
                group_commitments.clone(),
            )
            .map_err(|err| Reason::InvalidKeyMaterial(err).into())
        })
        .collect()
}

/// Reconstructs the jointly-held secret from at least `t` participants
///
/// This defeats the purpose of threshold custody and must only be used to
/// export a key out of the scheme (or in tests).
pub fn reconstruct_secret(shares: &[&Participant]) -> Result<SecretScalar, DealerError> {
    let first = shares.first().ok_or(Reason::NoShares)?;
    if shares.len() < usize::from(first.threshold()) {
        return Err(Reason::TooFewShares {
            threshold: first.threshold(),
            given: shares.len(),
        }
        .into());
    }
    if shares
        .iter()
        .any(|share| share.public_key() != first.public_key())
    {
        return Err(Reason::MismatchedShares.into());
    }

    let indexes: Vec<SignerIndex> = shares.iter().map(|share| share.index()).collect();
    let mut secret = Scalar::zero();
    for share in shares {
        let lambda = poly::lagrange_coefficient(&indexes, share.index(), &Scalar::zero())
            .ok_or(Reason::DuplicateIndex)?;
        secret = secret + lambda * share.aggregate_share().as_ref();
    }

    if Point::generator() * secret != *first.public_key() {
        return Err(Reason::MismatchedShares.into());
    }
    Ok(SecretScalar::new(&mut secret))
}

/// Trusted dealer error
#[derive(Debug)]
pub struct DealerError(Reason);

#[derive(Debug)]
enum Reason {
    TooManyParticipants,
    ThresholdOutOfRange,
    NoShares,
    TooFewShares { threshold: u16, given: usize },
    DuplicateIndex,
    MismatchedShares,
    InvalidKeyMaterial(InvalidParticipant),
}

impl fmt::Display for DealerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Reason::TooManyParticipants => {
                f.write_str("number of participants exceeds 255 (indexes are a single byte)")
            }
            Reason::ThresholdOutOfRange => f.write_str("threshold must be in 2..=n"),
            Reason::NoShares => f.write_str("no shares provided"),
            Reason::TooFewShares { threshold, given } => write!(
                f,
                "reconstruction requires at least {threshold} shares, {given} given"
            ),
            Reason::DuplicateIndex => f.write_str("same participant appears more than once"),
            Reason::MismatchedShares => {
                f.write_str("shares don't belong to the same jointly-held key")
            }
            Reason::InvalidKeyMaterial(_) => f.write_str("generated key material is invalid"),
        }
    }
}

impl std::error::Error for DealerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.0 {
            Reason::InvalidKeyMaterial(err) => Some(err),
            _ => None,
        }
    }
}

impl From<Reason> for DealerError {
    fn from(err: Reason) -> Self {
        Self(err)
    }
}

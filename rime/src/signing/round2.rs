//! Round 2 - Signing
//!
//! Each chosen signer computes its signature share over the message. The
//! share embeds the signer's nonces, its binding value, and its Lagrange
//! weighted aggregate share, with y-parities adjusted so the combined
//! signature verifies against x-only keys as BIP-340 requires.

use core::fmt;

use crate::{
    ciphersuite, participant::Participant, poly, NonZero, Scalar, SignerIndex,
};

use super::{
    round1::{NonceCommitments, SecretNonces},
    tweak::{tweak_public_key, KeyTweak, TweakError},
    utils,
};

/// Partial signature of one signer
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SigShare(pub Scalar);

/// Issues a partial signature on the `msg`
///
/// Inputs:
/// * The signer's long-term [`Participant`] state
/// * Secret `nonces` from [round 1](super::round1), consumed by this call
/// * `msg` to be signed
/// * The signer set: exactly `t` pairs of `(index, nonce commitments)`,
///   this signer included
/// * The optional key tweak; all signers and the aggregator must agree on it
///
/// **Never reuse nonces!** Using the same nonce pair to sign two different
/// messages leaks the secret share.
pub fn sign(
    participant: &Participant,
    nonces: SecretNonces,
    msg: &[u8],
    signers: &[(SignerIndex, NonceCommitments)],
    tweak: Option<&KeyTweak>,
) -> Result<SigShare, SigningError> {
    // --- Retrieve and validate data
    if signers.len() != usize::from(participant.threshold()) {
        return Err(Reason::WrongNumberOfSigners {
            expected: participant.threshold(),
            given: signers.len(),
        }
        .into());
    }
    let signers =
        utils::validate_signers(signers, participant.participants()).map_err(Reason::from)?;
    let own = signers
        .iter()
        .find(|(j, _)| *j == participant.index())
        .ok_or(Reason::SignerNotInList)?;
    if own.1 != nonces.public_commitments() {
        // commitments don't match provided nonces - invalid inputs
        return Err(Reason::NoncesDontMatchCommitments.into());
    }

    // --- The signing
    let binding_values = utils::compute_binding_values(msg, &signers);
    let group_commitment = utils::compute_group_commitment(&signers, &binding_values);
    let group_commitment =
        NonZero::from_point(group_commitment).ok_or(Reason::DegenerateGroupCommitment)?;

    let (effective_key, parity) = match tweak {
        Some(tweak) => {
            let tweaked = tweak_public_key(&participant.public_key(), tweak)
                .map_err(Reason::Tweak)?;
            (tweaked.key(), tweaked.parity())
        }
        None => (participant.public_key(), false),
    };
    let challenge = ciphersuite::compute_challenge(&group_commitment, &effective_key, msg);

    // the final signature carries x_only(R): if R has an odd y, every signer
    // flips its nonces so the commitment they reconstruct is -R
    let mut hiding = *nonces.hiding.as_ref();
    let mut binding = *nonces.binding.as_ref();
    if !ciphersuite::is_normalized(&group_commitment) {
        hiding = -hiding;
        binding = -binding;
    }
    drop(nonces);

    let rho = binding_values
        .iter()
        .find(|(j, _)| *j == participant.index())
        .map(|(_, rho)| *rho)
        .ok_or(Reason::DeriveBindingValue)?;

    let indexes: Vec<SignerIndex> = signers.iter().map(|(j, _)| *j).collect();
    let lambda = poly::lagrange_coefficient(&indexes, participant.index(), &Scalar::zero())
        .ok_or(Reason::DeriveLagrangeCoefficient)?;

    // the share enters negated whenever the key the verifier sees (even-y,
    // x-only) differs from the key the shares actually interpolate to
    let mut share = *participant.aggregate_share().as_ref();
    let effective_key_is_odd = !ciphersuite::is_normalized(&effective_key);
    if effective_key_is_odd != parity {
        share = -share;
    }

    Ok(SigShare(
        hiding + binding * rho + lambda * share * challenge,
    ))
}

/// Signing error
#[derive(Debug)]
pub struct SigningError(Reason);

#[derive(Debug)]
enum Reason {
    WrongNumberOfSigners { expected: u16, given: usize },
    SignerIndexOutOfRange(SignerIndex),
    SameSignerTwice(SignerIndex),
    SignerNotInList,
    NoncesDontMatchCommitments,
    DegenerateGroupCommitment,
    Tweak(TweakError),
    DeriveBindingValue,
    DeriveLagrangeCoefficient,
}

impl From<utils::SignersError> for Reason {
    fn from(err: utils::SignersError) -> Self {
        match err {
            utils::SignersError::IndexOutOfRange(j) => Reason::SignerIndexOutOfRange(j),
            utils::SignersError::SameSignerTwice(j) => Reason::SameSignerTwice(j),
        }
    }
}

impl fmt::Display for SigningError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Reason::WrongNumberOfSigners { expected, given } => write!(
                f,
                "signer set must contain exactly {expected} signers, {given} given"
            ),
            Reason::SignerIndexOutOfRange(j) => {
                write!(f, "signer index {j} not in 1..=n")
            }
            Reason::SameSignerTwice(j) => write!(
                f,
                "signer {j} appears more than once in the list of signers"
            ),
            Reason::SignerNotInList => f.write_str("signer not in the list of participants"),
            Reason::NoncesDontMatchCommitments => {
                f.write_str("nonces don't match signer commitments")
            }
            Reason::DegenerateGroupCommitment => f.write_str(
                "group commitment is the identity point; restart the session \
                with fresh nonces",
            ),
            Reason::Tweak(_) => f.write_str("derive tweaked public key"),
            Reason::DeriveBindingValue => f.write_str("retrieve own binding value"),
            Reason::DeriveLagrangeCoefficient => {
                f.write_str("derive Lagrange coefficient")
            }
        }
    }
}

impl std::error::Error for SigningError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.0 {
            Reason::Tweak(err) => Some(err),
            _ => None,
        }
    }
}

impl From<Reason> for SigningError {
    fn from(err: Reason) -> Self {
        Self(err)
    }
}

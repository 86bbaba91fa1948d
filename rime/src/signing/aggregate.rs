//! Signature shares aggregation
//!
//! An [`Aggregator`] is assembled per signing session from the joint public
//! key, the message, the signer set with its nonce commitments, and the
//! optional key tweak. It recomputes the same binding values, group
//! commitment and challenge as the signers, combines their partial
//! signatures, and outputs a 64-byte [BIP-340] signature, verifying it before
//! handing it out.
//!
//! [BIP-340]: https://github.com/bitcoin/bips/blob/master/bip-0340.mediawiki

use core::fmt;

use crate::{ciphersuite, NonZero, Point, Scalar, SignerIndex};

use super::{
    round1::NonceCommitments,
    round2::SigShare,
    tweak::{tweak_public_key, KeyTweak, TweakError, TweakedKey},
    utils,
};

/// Schnorr signature
///
/// `r` is kept in its even-y representative so that the x-only wire encoding
/// and the verification equation agree.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Signature {
    /// $R$ component of the signature
    pub r: NonZero<Point>,
    /// $z$ component of the signature
    pub z: Scalar,
}

impl Signature {
    /// Size of a serialized signature in bytes
    pub const SERIALIZED_LEN: usize = 64;

    /// Verifies the signature against a public key and a message
    ///
    /// Both `r` and the public key enter the BIP-340 equation in their even-y
    /// representatives: accepts iff `z * G == R + Y * c`.
    pub fn verify(&self, public_key: &NonZero<Point>, msg: &[u8]) -> Result<(), InvalidSignature> {
        let challenge = ciphersuite::compute_challenge(&self.r, public_key, msg);

        let lhs = Point::generator() * self.z;
        let rhs = ciphersuite::normalize(*self.r)
            + ciphersuite::normalize(**public_key) * challenge;

        if lhs == rhs {
            Ok(())
        } else {
            Err(InvalidSignature)
        }
    }

    /// Serializes the signature as `x_only(R) || z` (64 bytes)
    pub fn to_bytes(&self) -> [u8; Self::SERIALIZED_LEN] {
        let mut out = [0u8; Self::SERIALIZED_LEN];
        out[..32].copy_from_slice(&ciphersuite::serialize_x_only(&self.r));
        out[32..].copy_from_slice(self.z.to_be_bytes().as_bytes());
        out
    }

    /// Parses a signature serialized via [`Signature::to_bytes`]
    ///
    /// Returns `None` if the input is malformed.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        let r = bytes.get(..32)?;
        let z = bytes.get(32..Self::SERIALIZED_LEN)?;

        let r = ciphersuite::deserialize_x_only(r).ok()?;
        let z = Scalar::from_be_bytes(z).ok()?;

        Some(Self { r, z })
    }
}

/// Signature verification failed
#[derive(Debug)]
pub struct InvalidSignature;

impl fmt::Display for InvalidSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("invalid signature")
    }
}

impl std::error::Error for InvalidSignature {}

/// Signing session state of the coordinator
pub struct Aggregator {
    public_key: NonZero<Point>,
    participants: u16,
    message: Vec<u8>,
    signers: Vec<(SignerIndex, NonceCommitments)>,
    tweaked: Option<TweakedKey>,
}

impl Aggregator {
    /// Assembles an aggregation session
    ///
    /// `participants` is the `n` the key is shared between; `signers` is the
    /// chosen signer set with the nonce commitments each signer published for
    /// this session, its indexes distinct and in `1..=n`. If `tweak` is
    /// given, the tweaked key is derived once and the session produces a
    /// signature under it.
    pub fn new(
        public_key: NonZero<Point>,
        participants: u16,
        message: impl Into<Vec<u8>>,
        signers: &[(SignerIndex, NonceCommitments)],
        tweak: Option<&KeyTweak>,
    ) -> Result<Self, AggregateError> {
        let signers = utils::validate_signers(signers, participants).map_err(Reason::from)?;
        let tweaked = tweak
            .map(|tweak| tweak_public_key(&public_key, tweak))
            .transpose()
            .map_err(Reason::Tweak)?;
        Ok(Self {
            public_key,
            participants,
            message: message.into(),
            signers,
            tweaked,
        })
    }

    /// Message being signed in this session
    pub fn message(&self) -> &[u8] {
        &self.message
    }

    /// The key the final signature verifies against: the tweaked key if a
    /// tweak was supplied, the joint public key otherwise
    pub fn effective_public_key(&self) -> NonZero<Point> {
        match &self.tweaked {
            Some(tweaked) => tweaked.key(),
            None => self.public_key,
        }
    }

    /// Binding value of signer `i` in this session
    ///
    /// Fails if `i` is not in `1..=n` or not a member of the signer set.
    pub fn binding_value(&self, i: SignerIndex) -> Result<Scalar, AggregateError> {
        if i == 0 || u16::from(i) > self.participants {
            return Err(Reason::IndexOutOfRange(i).into());
        }
        if !self.signers.iter().any(|(j, _)| *j == i) {
            return Err(Reason::UnknownSigner(i).into());
        }
        let encoded = utils::encode_commitment_list(&self.signers);
        Ok(utils::binding_value(i, &self.message, &encoded))
    }

    /// Group commitment `R` of this session
    ///
    /// Fails if `R` is the identity point, which makes the session
    /// degenerate: it must be restarted with fresh nonces.
    pub fn group_commitment(&self) -> Result<NonZero<Point>, AggregateError> {
        let binding_values = utils::compute_binding_values(&self.message, &self.signers);
        let r = utils::compute_group_commitment(&self.signers, &binding_values);
        NonZero::from_point(r).ok_or_else(|| Reason::DegenerateGroupCommitment.into())
    }

    /// BIP-340 challenge of this session
    pub fn challenge(&self) -> Result<Scalar, AggregateError> {
        let r = self.group_commitment()?;
        Ok(ciphersuite::compute_challenge(
            &r,
            &self.effective_public_key(),
            &self.message,
        ))
    }

    /// Combines the signers' partial signatures into the final signature
    ///
    /// `shares` must come in the same order as the session's signer set (one
    /// share per signer). The aggregate tweak, if any, is folded in here. The
    /// resulting signature is verified against the effective public key
    /// before being returned; a failure means some signer contributed a bad
    /// share and the session must be aborted.
    pub fn signature(&self, shares: &[SigShare]) -> Result<Signature, AggregateError> {
        if shares.len() != self.signers.len() {
            return Err(Reason::WrongNumberOfShares {
                expected: self.signers.len(),
                given: shares.len(),
            }
            .into());
        }

        let r = self.group_commitment()?;
        let mut z: Scalar = shares.iter().map(|share| share.0).sum();
        if let Some(tweaked) = &self.tweaked {
            z = z + self.challenge()? * tweaked.tweak();
        }

        let r = NonZero::from_point(ciphersuite::normalize(*r))
            .ok_or(Reason::DegenerateGroupCommitment)?;
        let signature = Signature { r, z };
        signature
            .verify(&self.effective_public_key(), &self.message)
            .map_err(|_| Reason::InvalidSignature)?;

        Ok(signature)
    }
}

/// Aggregation error
#[derive(Debug)]
pub struct AggregateError(Reason);

#[derive(Debug)]
enum Reason {
    IndexOutOfRange(SignerIndex),
    SameSignerTwice(SignerIndex),
    UnknownSigner(SignerIndex),
    WrongNumberOfShares { expected: usize, given: usize },
    DegenerateGroupCommitment,
    Tweak(TweakError),
    InvalidSignature,
}

impl From<utils::SignersError> for Reason {
    fn from(err: utils::SignersError) -> Self {
        match err {
            utils::SignersError::IndexOutOfRange(j) => Reason::IndexOutOfRange(j),
            utils::SignersError::SameSignerTwice(j) => Reason::SameSignerTwice(j),
        }
    }
}

impl fmt::Display for AggregateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Reason::IndexOutOfRange(j) => write!(f, "signer index {j} not in 1..=n"),
            Reason::SameSignerTwice(j) => write!(
                f,
                "signer {j} appears more than once in the list of signers"
            ),
            Reason::UnknownSigner(j) => write!(f, "unknown signer {j}"),
            Reason::WrongNumberOfShares { expected, given } => write!(
                f,
                "expected {expected} signature shares, {given} given"
            ),
            Reason::DegenerateGroupCommitment => f.write_str(
                "group commitment is the identity point; restart the session \
                with fresh nonces",
            ),
            Reason::Tweak(_) => f.write_str("derive tweaked public key"),
            Reason::InvalidSignature => {
                f.write_str("combined signature is invalid; some share was corrupt")
            }
        }
    }
}

impl std::error::Error for AggregateError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.0 {
            Reason::Tweak(err) => Some(err),
            _ => None,
        }
    }
}

impl From<Reason> for AggregateError {
    fn from(err: Reason) -> Self {
        Self(err)
    }
}

//! Long-term participant state
//!
//! A [`Participant`] is what a party holds between protocols: its index, the
//! current threshold parameters, its secret aggregate share and the group's
//! coefficient commitments. The state is only constructible through
//! validation, so every held share is known to be consistent with the group
//! commitments (the Feldman check).
//!
//! A party that lost its share is represented by [`Recovering`]: the same
//! identity and public data, but no share. It can only become a
//! [`Participant`] again through the [repair protocol](crate::repair).

use core::fmt;

use crate::{poly, NonZero, Point, SecretScalar, SignerIndex};

/// A participant's long-term state after a completed key generation
///
/// The aggregate share is the participant's evaluation of the jointly-sampled
/// master polynomial; it is zeroized on drop and never serialized by this
/// crate. Embedders that persist state serialize the identity, the group
/// commitments, and the share bytes themselves, and go through
/// [`Participant::new`] on restore, which re-validates the share.
pub struct Participant {
    index: SignerIndex,
    threshold: u16,
    participants: u16,
    aggregate_share: SecretScalar,
    public_key: NonZero<Point>,
    group_commitments: Vec<Point>,
}

impl Participant {
    /// Assembles and validates a participant state
    ///
    /// Checks that the parameters are in range, that the commitment vector
    /// length matches the threshold, that the joint public key (the constant
    /// commitment) is not the identity, and that the share is consistent with
    /// the commitments: `s_i * G = sum_k C_k * i^k`.
    pub fn new(
        index: SignerIndex,
        threshold: u16,
        participants: u16,
        aggregate_share: SecretScalar,
        group_commitments: Vec<Point>,
    ) -> Result<Self, InvalidParticipant> {
        let public_key = validate_public_data(index, threshold, participants, &group_commitments)?;
        validate_share(&aggregate_share, &group_commitments, index)?;
        Ok(Self {
            index,
            threshold,
            participants,
            aggregate_share,
            public_key,
            group_commitments,
        })
    }

    /// Index of this participant, in `1..=n`
    pub fn index(&self) -> SignerIndex {
        self.index
    }

    /// Current threshold `t`: any `t` participants can sign
    pub fn threshold(&self) -> u16 {
        self.threshold
    }

    /// Number of participants `n` the key is shared between
    pub fn participants(&self) -> u16 {
        self.participants
    }

    /// The jointly-held public key
    pub fn public_key(&self) -> NonZero<Point> {
        self.public_key
    }

    /// Coefficient commitments of the master polynomial, `threshold` of them
    ///
    /// The constant commitment equals the joint public key.
    pub fn group_commitments(&self) -> &[Point] {
        &self.group_commitments
    }

    /// The secret aggregate share
    ///
    /// Exposed for embedders that persist the share; treat it accordingly.
    pub fn aggregate_share(&self) -> &SecretScalar {
        &self.aggregate_share
    }

    /// Public verification share of any participant `j`
    ///
    /// `F_j = f(j) * G`, derived from the group commitments alone.
    pub fn verification_share(&self, j: SignerIndex) -> Point {
        poly::derive_verification_share(&self.group_commitments, j)
    }

    /// Forgets the secret share, turning this state into a [`Recovering`] one
    ///
    /// Useful for tests and for decommissioning; the secret is zeroized on
    /// drop of the discarded share.
    pub fn into_recovering(self) -> Recovering {
        Recovering {
            index: self.index,
            threshold: self.threshold,
            participants: self.participants,
            public_key: self.public_key,
            group_commitments: self.group_commitments,
        }
    }

    /// Replaces the key material after a lifecycle operation
    ///
    /// Re-runs the full validation and additionally requires that the joint
    /// public key is unchanged, which every lifecycle operation must preserve.
    pub(crate) fn update_key_material(
        &mut self,
        threshold: u16,
        aggregate_share: SecretScalar,
        group_commitments: Vec<Point>,
    ) -> Result<(), InvalidParticipant> {
        let public_key =
            validate_public_data(self.index, threshold, self.participants, &group_commitments)?;
        if public_key != self.public_key {
            return Err(Reason::PublicKeyChanged.into());
        }
        validate_share(&aggregate_share, &group_commitments, self.index)?;

        self.threshold = threshold;
        self.aggregate_share = aggregate_share;
        self.group_commitments = group_commitments;
        Ok(())
    }
}

impl fmt::Debug for Participant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Participant")
            .field("index", &self.index)
            .field("threshold", &self.threshold)
            .field("participants", &self.participants)
            .field("public_key", &self.public_key)
            .finish_non_exhaustive()
    }
}

/// Identity of a participant that lost its secret share
///
/// Holds everything a [`Participant`] does except the share. The only way
/// back to a full [`Participant`] is [`crate::repair::recover`], which makes
/// the "share must be absent before repair" precondition a property of the
/// types rather than a runtime check.
#[derive(Debug, Clone)]
pub struct Recovering {
    index: SignerIndex,
    threshold: u16,
    participants: u16,
    public_key: NonZero<Point>,
    group_commitments: Vec<Point>,
}

impl Recovering {
    /// Assembles the public state of a participant whose share is lost
    pub fn new(
        index: SignerIndex,
        threshold: u16,
        participants: u16,
        group_commitments: Vec<Point>,
    ) -> Result<Self, InvalidParticipant> {
        let public_key = validate_public_data(index, threshold, participants, &group_commitments)?;
        Ok(Self {
            index,
            threshold,
            participants,
            public_key,
            group_commitments,
        })
    }

    /// Index of the participant whose share is being recovered
    pub fn index(&self) -> SignerIndex {
        self.index
    }

    /// Current threshold
    pub fn threshold(&self) -> u16 {
        self.threshold
    }

    /// Number of participants
    pub fn participants(&self) -> u16 {
        self.participants
    }

    /// The jointly-held public key
    pub fn public_key(&self) -> NonZero<Point> {
        self.public_key
    }

    /// Coefficient commitments of the master polynomial
    pub fn group_commitments(&self) -> &[Point] {
        &self.group_commitments
    }
}

fn validate_public_data(
    index: SignerIndex,
    threshold: u16,
    participants: u16,
    group_commitments: &[Point],
) -> Result<NonZero<Point>, InvalidParticipant> {
    if participants > u16::from(SignerIndex::MAX) {
        return Err(Reason::TooManyParticipants.into());
    }
    if index == 0 || u16::from(index) > participants {
        return Err(Reason::IndexOutOfRange.into());
    }
    if threshold == 0 || threshold > participants {
        return Err(Reason::ThresholdOutOfRange.into());
    }
    if group_commitments.len() != usize::from(threshold) {
        return Err(Reason::WrongCommitmentsLength.into());
    }
    NonZero::from_point(group_commitments[0]).ok_or_else(|| Reason::DegeneratePublicKey.into())
}

fn validate_share(
    share: &SecretScalar,
    group_commitments: &[Point],
    index: SignerIndex,
) -> Result<(), InvalidParticipant> {
    let expected = poly::derive_verification_share(group_commitments, index);
    if Point::generator() * share != expected {
        return Err(Reason::ShareCommitmentsMismatch.into());
    }
    Ok(())
}

/// Returned when participant state fails validation
#[derive(Debug)]
pub struct InvalidParticipant(Reason);

#[derive(Debug)]
enum Reason {
    TooManyParticipants,
    IndexOutOfRange,
    ThresholdOutOfRange,
    WrongCommitmentsLength,
    DegeneratePublicKey,
    ShareCommitmentsMismatch,
    PublicKeyChanged,
}

impl fmt::Display for InvalidParticipant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Reason::TooManyParticipants => {
                f.write_str("number of participants exceeds 255 (indexes are a single byte)")
            }
            Reason::IndexOutOfRange => f.write_str("participant index must be in 1..=n"),
            Reason::ThresholdOutOfRange => f.write_str("threshold must be in 1..=n"),
            Reason::WrongCommitmentsLength => {
                f.write_str("length of group commitments must equal the threshold")
            }
            Reason::DegeneratePublicKey => f.write_str("joint public key is the identity point"),
            Reason::ShareCommitmentsMismatch => {
                f.write_str("aggregate share is inconsistent with the group commitments")
            }
            Reason::PublicKeyChanged => {
                f.write_str("operation would have changed the joint public key")
            }
        }
    }
}

impl std::error::Error for InvalidParticipant {}

impl From<Reason> for InvalidParticipant {
    fn from(err: Reason) -> Self {
        Self(err)
    }
}

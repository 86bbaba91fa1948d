//! Repair of a lost share
//!
//! A participant that lost its share (a [`Recovering`] identity) can be made
//! whole again by any `t` of the remaining participants without anyone
//! learning anything about the shares involved. Each helper `h` splits its
//! Lagrange-weighted contribution `lambda_h * s_h` (which sum to the lost
//! share `s_i` across the committee) into `t` uniformly blinded summands,
//! publishes commitments to them, and routes one summand to each committee
//! member. Every member sums what it received into an aggregate repair share;
//! the recovering participant sums those aggregates into its share.
//!
//! Commitments make the whole exchange verifiable: each dealer's summands
//! must add up to its public verification share scaled by its Lagrange
//! coefficient, and each aggregate must match the sum of the corresponding
//! commitments.

use core::fmt;

use rand_core::{CryptoRng, RngCore};

use crate::{
    participant::{InvalidParticipant, Participant, Recovering},
    poly, Point, Scalar, SecretScalar, SignerIndex,
};

/// Broadcast of one repair helper: commitments to its blinded summands
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RepairPackage {
    /// Index of the helper
    pub sender: SignerIndex,
    /// Index of the participant being repaired
    pub lost: SignerIndex,
    /// Commitments `r_k * G` to the helper's summands, one per committee
    /// member in ascending committee order
    pub commitments: Vec<Point>,
}

/// State of one helper between dealing and aggregating repair shares
pub struct RepairHelper {
    helper: SignerIndex,
    committee: Vec<SignerIndex>,
    shares: Vec<SecretScalar>,
}

/// Starts a repair round: the helper splits its weighted share into blinded
/// summands
///
/// `committee` is the full set of `t` helpers (this participant included),
/// `lost` the index being repaired; the committee must not contain it. The
/// committee is sorted ascending; summand `k` is intended for the `k`-th
/// member of the sorted committee and must be sent to it privately via
/// [`RepairHelper::share_for`].
pub fn generate_repair_shares(
    participant: &Participant,
    committee: &[SignerIndex],
    lost: SignerIndex,
    rng: &mut (impl RngCore + CryptoRng),
) -> Result<(RepairHelper, RepairPackage), RepairError> {
    let t = usize::from(participant.threshold());
    if committee.len() != t {
        return Err(Reason::WrongCommitteeSize {
            threshold: participant.threshold(),
            given: committee.len(),
        }
        .into());
    }
    if lost == 0 || u16::from(lost) > participant.participants() {
        return Err(Reason::LostIndexOutOfRange.into());
    }

    let mut committee = committee.to_vec();
    committee.sort_unstable();
    committee.dedup();
    if committee.len() != t {
        return Err(Reason::DuplicateHelper.into());
    }
    if committee.contains(&lost) {
        return Err(Reason::LostInCommittee.into());
    }
    if committee
        .iter()
        .any(|&h| h == 0 || u16::from(h) > participant.participants())
    {
        return Err(Reason::HelperIndexOutOfRange.into());
    }
    if !committee.contains(&participant.index()) {
        return Err(Reason::HelperNotInCommittee.into());
    }

    // lambda_h * s_h, the helper's additive contribution to the lost share
    let lambda = poly::lagrange_coefficient(
        &committee,
        participant.index(),
        &poly::index_to_scalar(lost),
    )
    .ok_or(Reason::DuplicateHelper)?;
    let contribution = lambda * participant.aggregate_share().as_ref();

    // t - 1 uniform blinds; the last summand makes the telescope add up
    let mut shares: Vec<SecretScalar> = (0..t - 1).map(|_| SecretScalar::random(rng)).collect();
    let mut last = shares
        .iter()
        .fold(contribution, |acc, r| acc - r.as_ref());
    shares.push(SecretScalar::new(&mut last));

    let commitments = shares
        .iter()
        .map(|r| Point::generator() * r)
        .collect();

    Ok((
        RepairHelper {
            helper: participant.index(),
            committee,
            shares,
        },
        RepairPackage {
            sender: participant.index(),
            lost,
            commitments,
        },
    ))
}

/// Verifies a helper's repair package against its public verification share
///
/// Accepts iff the helper's summand commitments add up to
/// `F_h * lambda_h` where `F_h` is derived from the group commitments and
/// `lambda_h` is the helper's Lagrange coefficient at the lost index over the
/// committee. Returns `false` on a failed check.
pub fn verify_repair_package(
    package: &RepairPackage,
    group_commitments: &[Point],
    committee: &[SignerIndex],
) -> bool {
    let mut committee = committee.to_vec();
    committee.sort_unstable();
    if package.commitments.len() != committee.len() || !committee.contains(&package.sender) {
        return false;
    }
    let Some(lambda) = poly::lagrange_coefficient(
        &committee,
        package.sender,
        &poly::index_to_scalar(package.lost),
    ) else {
        return false;
    };
    let sum = package
        .commitments
        .iter()
        .fold(Point::zero(), |acc, comm| acc + comm);
    let verification_share = poly::derive_verification_share(group_commitments, package.sender);

    sum == verification_share * lambda
}

/// Verifies an aggregate repair share of the committee member at `recipient`
/// against all helpers' packages
///
/// Accepts iff `aggregate * G` equals the sum over helpers of the commitment
/// addressed to `recipient`. Returns `false` on a failed check or if the
/// packages don't cover the recipient.
pub fn verify_aggregate_repair_share(
    recipient: SignerIndex,
    aggregate: &Scalar,
    packages: &[RepairPackage],
    committee: &[SignerIndex],
) -> bool {
    let mut committee = committee.to_vec();
    committee.sort_unstable();
    let Some(position) = committee.iter().position(|&h| h == recipient) else {
        return false;
    };
    if packages.len() != committee.len()
        || packages
            .iter()
            .any(|p| p.commitments.len() != committee.len())
    {
        return false;
    }

    let expected = packages
        .iter()
        .fold(Point::zero(), |acc, p| acc + p.commitments[position]);
    Point::generator() * aggregate == expected
}

impl RepairHelper {
    /// The sorted repair committee
    pub fn committee(&self) -> &[SignerIndex] {
        &self.committee
    }

    /// The summand addressed to the given committee member
    ///
    /// Must be sent over a private channel. The helper's own summand is
    /// folded in by [`RepairHelper::finish`] and needs no routing.
    pub fn share_for(&self, recipient: SignerIndex) -> Result<Scalar, RepairError> {
        let position = self
            .committee
            .iter()
            .position(|&h| h == recipient)
            .ok_or(Reason::NotInCommittee(recipient))?;
        Ok(*self.shares[position].as_ref())
    }

    /// Sums the helper's own summand with the summands received from the
    /// other committee members into the aggregate repair share
    ///
    /// `received` must hold exactly one summand per other committee member,
    /// tagged with the sender's index. The aggregate is what gets sent to the
    /// recovering participant.
    pub fn finish(
        self,
        received: &[(SignerIndex, Scalar)],
    ) -> Result<Scalar, RepairError> {
        let mut seen: Vec<bool> = self.committee.iter().map(|&h| h == self.helper).collect();
        let own_position = self
            .committee
            .iter()
            .position(|&h| h == self.helper)
            .ok_or(Reason::NotInCommittee(self.helper))?;

        let mut aggregate = *self.shares[own_position].as_ref();
        for (sender, share) in received {
            let position = self
                .committee
                .iter()
                .position(|h| h == sender)
                .ok_or(Reason::NotInCommittee(*sender))?;
            if core::mem::replace(&mut seen[position], true) {
                return Err(Reason::DuplicateSummand(*sender).into());
            }
            aggregate = aggregate + share;
        }
        if let Some(position) = seen.iter().position(|seen| !seen) {
            return Err(Reason::MissingSummand(self.committee[position]).into());
        }
        Ok(aggregate)
    }
}

/// Recovers the lost share from the committee's aggregate repair shares
///
/// `aggregates` must hold one aggregate repair share per committee member.
/// Their sum is the lost aggregate share; it is validated against the group
/// commitments before a [`Participant`] is handed back.
pub fn recover(
    recovering: Recovering,
    aggregates: &[Scalar],
) -> Result<Participant, RepairError> {
    if aggregates.len() != usize::from(recovering.threshold()) {
        return Err(Reason::WrongNumberOfAggregates {
            threshold: recovering.threshold(),
            given: aggregates.len(),
        }
        .into());
    }

    let mut share: Scalar = aggregates.iter().copied().sum();
    Participant::new(
        recovering.index(),
        recovering.threshold(),
        recovering.participants(),
        SecretScalar::new(&mut share),
        recovering.group_commitments().to_vec(),
    )
    .map_err(|err| Reason::InvalidKeyMaterial(err).into())
}

/// Share repair error
#[derive(Debug)]
pub struct RepairError(Reason);

#[derive(Debug)]
enum Reason {
    WrongCommitteeSize { threshold: u16, given: usize },
    DuplicateHelper,
    LostIndexOutOfRange,
    HelperIndexOutOfRange,
    LostInCommittee,
    HelperNotInCommittee,
    NotInCommittee(SignerIndex),
    DuplicateSummand(SignerIndex),
    MissingSummand(SignerIndex),
    WrongNumberOfAggregates { threshold: u16, given: usize },
    InvalidKeyMaterial(InvalidParticipant),
}

impl fmt::Display for RepairError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Reason::WrongCommitteeSize { threshold, given } => write!(
                f,
                "repair committee must have exactly {threshold} members, {given} given"
            ),
            Reason::DuplicateHelper => f.write_str("same helper appears more than once"),
            Reason::LostIndexOutOfRange => f.write_str("lost participant index not in 1..=n"),
            Reason::HelperIndexOutOfRange => f.write_str("helper index not in 1..=n"),
            Reason::LostInCommittee => {
                f.write_str("the participant being repaired cannot be in the committee")
            }
            Reason::HelperNotInCommittee => f.write_str("helper must be a committee member"),
            Reason::NotInCommittee(j) => write!(f, "participant {j} is not in the committee"),
            Reason::DuplicateSummand(j) => {
                write!(f, "more than one repair summand from participant {j}")
            }
            Reason::MissingSummand(j) => write!(f, "missing repair summand from participant {j}"),
            Reason::WrongNumberOfAggregates { threshold, given } => write!(
                f,
                "recovery requires exactly {threshold} aggregate repair shares, {given} given"
            ),
            Reason::InvalidKeyMaterial(_) => f.write_str("recovered key material is invalid"),
        }
    }
}

impl std::error::Error for RepairError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.0 {
            Reason::InvalidKeyMaterial(err) => Some(err),
            _ => None,
        }
    }
}

impl From<Reason> for RepairError {
    fn from(err: Reason) -> Self {
        Self(err)
    }
}

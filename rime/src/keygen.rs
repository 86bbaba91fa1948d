//! Distributed Key Generation (DKG)
//!
//! Feldman-style verifiable secret sharing: each participant samples a secret
//! polynomial, broadcasts commitments to its coefficients together with a
//! Schnorr proof of knowledge of the constant term, and sends an evaluation of
//! the polynomial to every other participant over a private channel. Summing
//! the received evaluations yields the participant's long-term aggregate
//! share; summing the commitment vectors yields the group commitments and the
//! joint public key.
//!
//! The protocol has two rounds, driven by the embedder's transport:
//!
//! 1. [`Keygen::init`] → broadcast [`Round1Package`]; on receipt, check each
//!    package with [`verify_proof_of_knowledge`].
//! 2. [`Keygen::generate_shares`] → send share `j` to participant `j`
//!    privately; on receipt, check each share with [`verify_share`].
//! 3. [`Keygen::finish`] consumes the dealing state and produces the
//!    validated [`Participant`].

use core::fmt;

use rand_core::{CryptoRng, RngCore};

use crate::{
    ciphersuite,
    participant::{InvalidParticipant, Participant},
    poly::{self, SecretPolynomial},
    Point, Scalar, SecretScalar, SignerIndex,
};

/// Schnorr proof of knowledge of a committed secret
///
/// Certifies that the dealer knows the discrete logarithm of its constant
/// coefficient commitment, which prevents rogue-key style choices of the
/// contribution.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProofOfKnowledge {
    /// Nonce commitment `R = k * G`
    pub nonce_commitment: Point,
    /// Response `mu = k + a_0 * c mod q`
    pub response: Scalar,
}

/// Round 1 broadcast of the DKG: the dealer's coefficient commitments and its
/// proof of knowledge
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Round1Package {
    /// Index of the dealer
    pub sender: SignerIndex,
    /// Commitments `C_k = a_k * G` to the dealer's polynomial, `t` of them
    pub coefficient_commitments: Vec<Point>,
    /// Proof of knowledge of `a_0`
    pub proof_of_knowledge: ProofOfKnowledge,
}

/// Dealing state of one participant between DKG rounds
///
/// Holds the secret polynomial; dropped (and zeroized) when the protocol
/// finishes or is abandoned.
pub struct Keygen {
    i: SignerIndex,
    threshold: u16,
    participants: u16,
    polynomial: SecretPolynomial,
}

impl Keygen {
    /// Starts key generation for participant `i` of `n` with threshold `t`
    ///
    /// Samples a polynomial with `t` uniformly random coefficients (the
    /// constant term is this participant's contribution to the joint secret)
    /// and produces the round 1 broadcast package.
    pub fn init(
        i: SignerIndex,
        threshold: u16,
        participants: u16,
        rng: &mut (impl RngCore + CryptoRng),
    ) -> Result<(Self, Round1Package), KeygenError> {
        if participants > u16::from(SignerIndex::MAX) {
            return Err(Reason::TooManyParticipants.into());
        }
        if i == 0 || u16::from(i) > participants {
            return Err(Reason::IndexOutOfRange.into());
        }
        if threshold < 2 || threshold > participants {
            return Err(Reason::ThresholdOutOfRange.into());
        }

        let polynomial = SecretPolynomial::random(usize::from(threshold), rng);
        let coefficient_commitments = polynomial.commitments();
        let proof_of_knowledge = prove_knowledge(i, polynomial.constant(), rng);

        Ok((
            Self {
                i,
                threshold,
                participants,
                polynomial,
            },
            Round1Package {
                sender: i,
                coefficient_commitments,
                proof_of_knowledge,
            },
        ))
    }

    /// Index of this participant
    pub fn index(&self) -> SignerIndex {
        self.i
    }

    /// Evaluates the secret polynomial at every participant index
    ///
    /// Returns `n` shares; the share at position `j - 1` must be sent to
    /// participant `j` over a private channel (position `i - 1` is this
    /// participant's own share and stays local).
    pub fn generate_shares(&self) -> Vec<Scalar> {
        (1..=self.participants)
            .map(|j| self.polynomial.evaluate_at_index(j as SignerIndex))
            .collect()
    }

    /// Completes the DKG from everyone's round 1 packages and the shares
    /// addressed to this participant
    ///
    /// `packages` must contain exactly one package per participant (this
    /// participant's own included); `received_shares` exactly one share per
    /// *other* participant, tagged with the dealer's index. All proofs of
    /// knowledge and shares are (re-)verified; on success the aggregate
    /// share, the joint public key and the group commitments are derived and
    /// validated.
    pub fn finish(
        self,
        packages: &[Round1Package],
        received_shares: &[(SignerIndex, Scalar)],
    ) -> Result<Participant, KeygenError> {
        let packages = collect_by_sender(self.participants, packages, |p| p.sender)
            .map_err(Reason::Collect)?;

        for package in &packages {
            if package.coefficient_commitments.len() != usize::from(self.threshold) {
                return Err(Reason::WrongCommitmentsLength(package.sender).into());
            }
            if !verify_proof_of_knowledge(package) {
                return Err(Reason::BadProofOfKnowledge(package.sender).into());
            }
        }

        // own share plus one share from each of the other dealers
        let own_share = self.polynomial.evaluate_at_index(self.i);
        let mut aggregate = aggregate_shares(
            self.i,
            self.participants,
            own_share,
            received_shares,
            |sender, share| {
                let dealer = &packages[usize::from(sender) - 1];
                verify_share(self.i, share, &dealer.coefficient_commitments)
            },
        )
        .map_err(Reason::from)?;

        let group_commitments = sum_commitments(
            packages.iter().map(|p| &*p.coefficient_commitments),
            usize::from(self.threshold),
        );

        Participant::new(
            self.i,
            self.threshold,
            self.participants,
            SecretScalar::new(&mut aggregate),
            group_commitments,
        )
        .map_err(|err| Reason::InvalidKeyMaterial(err).into())
    }
}

/// Produces a Schnorr proof of knowledge of `secret` bound to the dealer's
/// index
pub(crate) fn prove_knowledge(
    i: SignerIndex,
    secret: &SecretScalar,
    rng: &mut (impl RngCore + CryptoRng),
) -> ProofOfKnowledge {
    let nonce = SecretScalar::random(rng);
    let nonce_commitment = Point::generator() * &nonce;
    let commitment = Point::generator() * secret;
    let challenge = ciphersuite::pok_challenge(i, &commitment, &nonce_commitment);
    ProofOfKnowledge {
        nonce_commitment,
        response: nonce.as_ref() + secret.as_ref() * challenge,
    }
}

/// Verifies the proof of knowledge of a round 1 package
///
/// Recomputes the challenge and accepts iff `mu * G == R + C_0 * c`. Returns
/// `false` on a failed check; a dealer with a bad proof must be excluded and
/// the protocol restarted.
pub fn verify_proof_of_knowledge(package: &Round1Package) -> bool {
    let Some(constant_commitment) = package.coefficient_commitments.first() else {
        return false;
    };
    verify_pok(
        package.sender,
        constant_commitment,
        &package.proof_of_knowledge,
    )
}

/// Proof-of-knowledge check against an explicit commitment
pub(crate) fn verify_pok(
    sender: SignerIndex,
    commitment: &Point,
    proof: &ProofOfKnowledge,
) -> bool {
    let challenge = ciphersuite::pok_challenge(sender, commitment, &proof.nonce_commitment);
    Point::generator() * proof.response == proof.nonce_commitment + commitment * challenge
}

/// Verifies a dealt share against the dealer's coefficient commitments
///
/// Accepts iff `share * G == sum_k C_k * i^k` where `i` is the *receiving*
/// participant's index. Returns `false` on a failed check.
pub fn verify_share(i: SignerIndex, share: &Scalar, coefficient_commitments: &[Point]) -> bool {
    Point::generator() * share
        == poly::evaluate_commitments(coefficient_commitments, &poly::index_to_scalar(i))
}

/// Sums the receiver's own share with one verified share per other dealer
///
/// `verify` is called for every received share with the dealer's index; a
/// `false` verdict aborts with the culprit.
pub(crate) fn aggregate_shares(
    i: SignerIndex,
    participants: u16,
    own_share: Scalar,
    received_shares: &[(SignerIndex, Scalar)],
    verify: impl Fn(SignerIndex, &Scalar) -> bool,
) -> Result<Scalar, AggregateSharesError> {
    let mut aggregate = own_share;
    let mut seen = vec![false; usize::from(participants)];
    seen[usize::from(i) - 1] = true;
    for (sender, share) in received_shares {
        let slot = seen
            .get_mut(usize::from(*sender).wrapping_sub(1))
            .ok_or(AggregateSharesError::Collect(CollectError::UnknownSender(
                *sender,
            )))?;
        if core::mem::replace(slot, true) {
            return Err(AggregateSharesError::Collect(CollectError::Duplicate(
                *sender,
            )));
        }
        if !verify(*sender, share) {
            return Err(AggregateSharesError::BadShare(*sender));
        }
        aggregate = aggregate + share;
    }
    if let Some(missing) = seen.iter().position(|received| !received) {
        return Err(AggregateSharesError::Collect(CollectError::Missing(
            missing as SignerIndex + 1,
        )));
    }
    Ok(aggregate)
}

/// Share aggregation failure, shared by every dealing-style protocol
#[derive(Debug)]
pub(crate) enum AggregateSharesError {
    Collect(CollectError),
    BadShare(SignerIndex),
}

impl From<AggregateSharesError> for Reason {
    fn from(err: AggregateSharesError) -> Self {
        match err {
            AggregateSharesError::Collect(err) => Reason::Collect(err),
            AggregateSharesError::BadShare(j) => Reason::BadShare(j),
        }
    }
}

/// Orders broadcast items by sender index, requiring exactly one item per
/// participant `1..=n`
pub(crate) fn collect_by_sender<T: Clone>(
    participants: u16,
    items: &[T],
    sender_of: impl Fn(&T) -> SignerIndex,
) -> Result<Vec<T>, CollectError> {
    let mut slots: Vec<Option<T>> = vec![None; usize::from(participants)];
    for item in items {
        let sender = sender_of(item);
        let slot = slots
            .get_mut(usize::from(sender).wrapping_sub(1))
            .ok_or(CollectError::UnknownSender(sender))?;
        if slot.replace(item.clone()).is_some() {
            return Err(CollectError::Duplicate(sender));
        }
    }
    slots
        .into_iter()
        .enumerate()
        .map(|(idx, slot)| slot.ok_or(CollectError::Missing(idx as SignerIndex + 1)))
        .collect()
}

/// Componentwise sum of commitment vectors
pub(crate) fn sum_commitments<'a>(
    vectors: impl Iterator<Item = &'a [Point]>,
    len: usize,
) -> Vec<Point> {
    let mut sum = vec![Point::zero(); len];
    for vector in vectors {
        for (acc, commitment) in sum.iter_mut().zip(vector) {
            *acc = *acc + commitment;
        }
    }
    sum
}

/// A round's message set was not exactly one message per participant
#[derive(Debug)]
pub(crate) enum CollectError {
    UnknownSender(SignerIndex),
    Duplicate(SignerIndex),
    Missing(SignerIndex),
}

impl fmt::Display for CollectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CollectError::UnknownSender(j) => write!(f, "message from unknown participant {j}"),
            CollectError::Duplicate(j) => {
                write!(f, "more than one message from participant {j}")
            }
            CollectError::Missing(j) => write!(f, "missing message from participant {j}"),
        }
    }
}

/// Key generation error
#[derive(Debug)]
pub struct KeygenError(Reason);

#[derive(Debug)]
pub(crate) enum Reason {
    TooManyParticipants,
    IndexOutOfRange,
    ThresholdOutOfRange,
    Collect(CollectError),
    WrongCommitmentsLength(SignerIndex),
    BadProofOfKnowledge(SignerIndex),
    BadShare(SignerIndex),
    InvalidKeyMaterial(InvalidParticipant),
}

impl fmt::Display for KeygenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Reason::TooManyParticipants => {
                f.write_str("number of participants exceeds 255 (indexes are a single byte)")
            }
            Reason::IndexOutOfRange => f.write_str("participant index must be in 1..=n"),
            Reason::ThresholdOutOfRange => f.write_str("threshold must be in 2..=n"),
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
            Reason::InvalidKeyMaterial(_) => f.write_str("derived key material is invalid"),
        }
    }
}

impl std::error::Error for KeygenError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.0 {
            Reason::InvalidKeyMaterial(err) => Some(err),
            _ => None,
        }
    }
}

impl From<Reason> for KeygenError {
    fn from(err: Reason) -> Self {
        Self(err)
    }
}

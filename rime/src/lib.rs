//! Threshold Schnorr signatures over secp256k1 based on [FROST], producing
//! [BIP-340] compliant signatures under a jointly-held public key
//!
//! Any `t` out of `n` participants can collaboratively sign a message such that
//! the resulting 64-byte signature is indistinguishable from an ordinary
//! single-key Schnorr signature verifying against the joint key.
//!
//! This crate provides:
//! * Distributed Key Generation (DKG) \
//!   Feldman-style verifiable secret sharing with Schnorr proofs of knowledge,
//!   see [mod@keygen]
//! * FROST Signing \
//!   Nonce commitment, signature share computation and aggregation, including
//!   BIP-32 / [BIP-341] taproot additive key tweaks, see [mod@signing]
//! * Share lifecycle \
//!   Proactive [share refresh](refresh), [repair](repair) of a lost share with
//!   help of a committee, and [threshold increase / decrease](threshold)
//! * [Trusted dealer](dealer) (importing a key into the threshold scheme) and
//!   [secret reconstruction](dealer::reconstruct_secret) (exporting it)
//!
//! This crate doesn't support (currently):
//! * Identifiable abort: misbehavior is detected and rejected, but only the
//!   verification entry points report a culprit index
//!
//! ## Protocol walkthrough
//!
//! The crate is transport-agnostic: every protocol is a set of plain functions
//! progressed by the embedder, which must deliver all messages of a round
//! before the next round begins, over channels that are authenticated and
//! (for shares) private.
//!
//! 1. Each participant runs [`keygen::Keygen::init`] and broadcasts the
//!    resulting [`keygen::Round1Package`].
//! 2. Each participant checks everyone's proof of knowledge via
//!    [`keygen::verify_proof_of_knowledge`], deals shares via
//!    [`keygen::Keygen::generate_shares`], and sends the `j`-th share to
//!    participant `j` over a private channel.
//! 3. Each participant calls [`keygen::Keygen::finish`] with the packages and
//!    the shares addressed to it, obtaining a long-term [`Participant`].
//! 4. To sign, `t` participants commit nonces via
//!    [`signing::round1::generate_nonces`], exchange the public commitments,
//!    produce signature shares via [`signing::round2::sign`], and anyone can
//!    assemble the final signature via [`signing::aggregate::Aggregator`].
//!
//! [FROST]: https://eprint.iacr.org/2020/852
//! [BIP-340]: https://github.com/bitcoin/bips/blob/master/bip-0340.mediawiki
//! [BIP-341]: https://github.com/bitcoin/bips/blob/master/bip-0341.mediawiki

#![forbid(unsafe_code)]
#![deny(clippy::expect_used, clippy::unwrap_used, clippy::panic)]
#![deny(missing_docs)]
#![allow(clippy::type_complexity)]

pub use generic_ec;

pub mod ciphersuite;
pub mod dealer;
pub mod keygen;
pub mod matrix;
pub mod participant;
pub mod poly;
pub mod refresh;
pub mod repair;
pub mod signing;
pub mod threshold;

pub use self::{
    participant::{Participant, Recovering},
    signing::aggregate::{Aggregator, Signature},
};

/// Index of a participant
///
/// Indexes are 1-based: valid values are `1..=255`. The index is fed into the
/// protocol hashes as a single byte, which is what caps the cohort size at 255.
pub type SignerIndex = u8;

/// Curve the protocol operates on
pub type Curve = generic_ec::curves::Secp256k1;

/// Point on [`Curve`]
pub type Point = generic_ec::Point<Curve>;
/// Scalar modulo the group order of [`Curve`]
pub type Scalar = generic_ec::Scalar<Curve>;
/// Scalar that is zeroized on drop
pub type SecretScalar = generic_ec::SecretScalar<Curve>;
/// Guaranteed non-zero (resp. non-infinity) scalar or point
pub type NonZero<T> = generic_ec::NonZero<T>;

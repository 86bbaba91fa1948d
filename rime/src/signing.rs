//! FROST Threshold Signing
//!
//! Signing is carried out manually, phase by phase, by the embedder's
//! transport. We assume presence of a Coordinator; it can be either some
//! entity in the system, or it could be implemented as some sort of consensus
//! between the signers.
//!
//! 1. Each signer commits nonces via [round1::generate_nonces] \
//!    The message doesn't need to be known at this point yet. Outputs:
//!    * [round1::SecretNonces] that must be kept secret, and
//!    * [round1::NonceCommitments] that are sent to the Coordinator.
//! 2. The Coordinator receives a request to sign a message `msg`. It chooses
//!    a set of exactly `t` signers, and forwards the signing request to each
//!    of them along with the full list of `(index, commitments)` pairs.
//! 3. Each signer retrieves the [round1::SecretNonces] matching the chosen
//!    commitments and signs via [round2::sign], consuming the nonces (they
//!    can never be used again), and sends the [round2::SigShare] back.
//! 4. The Coordinator assembles an [aggregate::Aggregator] for the session
//!    and combines the shares into a 64-byte [aggregate::Signature].
//!
//! To sign under a tweaked key (BIP-32 child derivation and/or a BIP-341
//! taproot commitment), both the signers and the Coordinator must be given
//! the same [tweak::KeyTweak].

pub mod aggregate;
pub mod round1;
pub mod round2;
pub mod tweak;
mod utils;

//! Round 1 - Nonce commitment
//!
//! Each signer samples a fresh nonce pair `(d, e)` and publishes the
//! commitments `(D, E) = (d * G, e * G)`. Commitments can be generated ahead
//! of time, before the message to be signed is known.

use rand_core::{CryptoRng, RngCore};

use crate::{Point, SecretScalar};

/// Secret nonce pair of one signing session
///
/// **Never reuse nonces!** The pair is consumed by value in
/// [`round2::sign`](crate::signing::round2::sign) and zeroized on drop;
/// holders must make sure a pair retrieved from storage can never be used
/// twice.
pub struct SecretNonces {
    /// Hiding nonce `d`
    pub(crate) hiding: SecretScalar,
    /// Binding nonce `e`
    pub(crate) binding: SecretScalar,
}

/// Public commitments to a signer's nonce pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NonceCommitments {
    /// Commitment `D = d * G` to the hiding nonce
    pub hiding: Point,
    /// Commitment `E = e * G` to the binding nonce
    pub binding: Point,
}

/// Samples a nonce pair and its public commitments
pub fn generate_nonces(rng: &mut (impl RngCore + CryptoRng)) -> (SecretNonces, NonceCommitments) {
    let nonces = SecretNonces {
        hiding: SecretScalar::random(rng),
        binding: SecretScalar::random(rng),
    };
    let commitments = nonces.public_commitments();
    (nonces, commitments)
}

impl SecretNonces {
    /// Commitments corresponding to this nonce pair
    pub fn public_commitments(&self) -> NonceCommitments {
        NonceCommitments {
            hiding: Point::generator() * &self.hiding,
            binding: Point::generator() * &self.binding,
        }
    }
}

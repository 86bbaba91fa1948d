//! Additive key tweaks
//!
//! A signing session can target a child of the jointly-held key instead of
//! the key itself: a [BIP-32]-style additive shift (derived by the embedder
//! from its derivation path) followed by a [BIP-341] taproot tweak. Both
//! scalars are supplied together as a [`KeyTweak`]; signers and the
//! aggregator derive the same [`TweakedKey`] from it and fold the aggregate
//! tweak into the final signature.
//!
//! [BIP-32]: https://github.com/bitcoin/bips/blob/master/bip-0032.mediawiki
//! [BIP-341]: https://github.com/bitcoin/bips/blob/master/bip-0341.mediawiki

use core::fmt;

use crate::{ciphersuite, NonZero, Point, Scalar};

/// Pair of additive tweaks applied to the joint public key
///
/// The tweaks always travel together: sessions either use both (a taproot
/// output derived from a child key) or neither.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct KeyTweak {
    /// BIP-32 additive shift of the child derivation
    pub bip32: Scalar,
    /// BIP-341 taproot tweak of the output key
    pub taproot: Scalar,
}

/// Result of tweaking the joint public key
#[derive(Debug, Clone, Copy)]
pub struct TweakedKey {
    key: NonZero<Point>,
    tweak: Scalar,
    parity: bool,
}

impl TweakedKey {
    /// The tweaked public key the signature verifies against
    pub fn key(&self) -> NonZero<Point> {
        self.key
    }

    /// Aggregate scalar tweak folded into the final signature
    pub fn tweak(&self) -> Scalar {
        self.tweak
    }

    /// Whether the intermediate BIP-32 child key was negated to an even y
    ///
    /// Signers consult this to decide whether their key shares enter the
    /// signature negated.
    pub fn parity(&self) -> bool {
        self.parity
    }
}

/// Derives the tweaked key from the joint public key
///
/// 1. `K1 = Y + bip32 * G`; if `K1` has an odd y coordinate, `K1` and the
///    bip32 tweak are negated and the parity flag is set.
/// 2. `K = K1 + taproot * G`; the aggregate tweak is the (possibly negated)
///    bip32 tweak plus the taproot tweak, negated once more if `K` has an odd
///    y coordinate.
///
/// Fails if either intermediate key is the identity point (it has no affine
/// representation, so no signature could verify against it); the probability
/// of that with honestly derived tweaks is negligible.
pub fn tweak_public_key(
    public_key: &NonZero<Point>,
    tweak: &KeyTweak,
) -> Result<TweakedKey, TweakError> {
    let child = **public_key + Point::generator() * tweak.bip32;
    let child = NonZero::from_point(child).ok_or(TweakError(Reason::DegenerateChildKey))?;

    let (child, bip32, parity) = if ciphersuite::is_normalized(&child) {
        (*child, tweak.bip32, false)
    } else {
        (-*child, -tweak.bip32, true)
    };

    let key = child + Point::generator() * tweak.taproot;
    let key = NonZero::from_point(key).ok_or(TweakError(Reason::DegenerateTweakedKey))?;

    let aggregate = bip32 + tweak.taproot;
    let aggregate = if ciphersuite::is_normalized(&key) {
        aggregate
    } else {
        -aggregate
    };

    Ok(TweakedKey {
        key,
        tweak: aggregate,
        parity,
    })
}

/// Key tweak derivation error
#[derive(Debug)]
pub struct TweakError(Reason);

#[derive(Debug)]
enum Reason {
    DegenerateChildKey,
    DegenerateTweakedKey,
}

impl fmt::Display for TweakError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Reason::DegenerateChildKey => {
                f.write_str("bip32-tweaked key is the identity point")
            }
            Reason::DegenerateTweakedKey => {
                f.write_str("taproot-tweaked key is the identity point")
            }
        }
    }
}

impl std::error::Error for TweakError {}

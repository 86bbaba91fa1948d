//! Hashes and point encodings fixed by the protocol
//!
//! The signing protocol outputs [BIP-340] compliant signatures, so the
//! challenge is the BIP-340 tagged hash over x-only encodings, and public keys
//! and nonce commitments travel as 33-byte compressed SEC1 points. The DKG
//! proof-of-knowledge challenge is bound to the `"FROST-BIP340"` context
//! string.
//!
//! [BIP-340]: https://github.com/bitcoin/bips/blob/master/bip-0340.mediawiki

use generic_ec::errors::InvalidPoint;
use sha2::{Digest, Sha256};

use crate::{NonZero, Point, Scalar, SignerIndex};

/// Context string for the DKG proof-of-knowledge challenge
const POK_CONTEXT: &[u8] = b"FROST-BIP340";

/// Serializes a point in compressed SEC1 form (33 bytes)
///
/// The encoding is `0x02 || x` if the y coordinate is even, `0x03 || x`
/// otherwise.
pub fn serialize_point(point: &Point) -> generic_ec::EncodedPoint<crate::Curve> {
    point.to_bytes(true)
}

/// Deserializes a point from its compressed SEC1 encoding
///
/// The y coordinate is recovered as the square root of `x^3 + 7` with the
/// parity requested by the prefix byte. Returns an error if the input has the
/// wrong length, an invalid prefix, or an `x` that is not on the curve.
pub fn deserialize_point(bytes: &[u8]) -> Result<Point, InvalidPoint> {
    Point::from_bytes(bytes)
}

/// Serializes a point in BIP-340 x-only form (32 bytes)
///
/// The encoding carries the x coordinate alone; the parity of y is discarded.
pub fn serialize_x_only(point: &NonZero<Point>) -> [u8; 32] {
    #[allow(clippy::expect_used)]
    point.to_bytes(true)[1..]
        .try_into()
        .expect("compressed non-zero point is 33 bytes")
}

/// Deserializes a BIP-340 x-only point (32 bytes)
///
/// Reconstructs the point with *even* y coordinate. Returns an error if the
/// input is not 32 bytes long or `x` is not the abscissa of a curve point.
pub fn deserialize_x_only(bytes: &[u8]) -> Result<NonZero<Point>, InvalidPoint> {
    if bytes.len() != 32 {
        return Err(InvalidPoint);
    }
    let mut buf = [0u8; 33];
    buf[0] = 2;
    buf[1..].copy_from_slice(bytes);

    let point = Point::from_bytes(&buf)?;
    NonZero::from_point(point).ok_or(InvalidPoint)
}

/// Checks whether the point is normalized in the BIP-340 sense, i.e. has an
/// even y coordinate
///
/// The identity point is considered normalized.
pub fn is_normalized(point: &Point) -> bool {
    // First byte of a compressed non-zero point is either 2 or 3. 2 means the
    // y coordinate is even.
    point.is_zero() || point.to_bytes(true)[0] == 2
}

/// Returns the even-y representative of the point
///
/// I.e. returns `point` if its y coordinate is even, `-point` otherwise.
pub fn normalize(point: Point) -> Point {
    if is_normalized(&point) {
        point
    } else {
        -point
    }
}

/// Returns the representative of the point with the smaller y coordinate
///
/// Of `point` and `-point`, returns the one whose y coordinate is below `p/2`.
/// Not used on the signing path; provided for tests and debugging.
pub fn normalize_small_y(point: Point) -> Point {
    if point.is_zero() {
        return point;
    }
    let neg = -point;
    if y_bytes(&point) <= y_bytes(&neg) {
        point
    } else {
        neg
    }
}

/// Big-endian y coordinate of a non-zero point, extracted from the
/// uncompressed SEC1 encoding `0x04 || x || y`
fn y_bytes(point: &Point) -> [u8; 32] {
    #[allow(clippy::expect_used)]
    point.to_bytes(false)[33..]
        .try_into()
        .expect("uncompressed non-zero point is 65 bytes")
}

/// Computes the BIP-340 challenge scalar
///
/// `c = H_tag("BIP0340/challenge", xonly(R) || xonly(Y) || msg) mod q` where
/// both points are serialized x-only, discarding y parity.
pub fn compute_challenge(
    group_commitment: &NonZero<Point>,
    public_key: &NonZero<Point>,
    msg: &[u8],
) -> Scalar {
    let challenge = challenge_hash()
        .chain_update(serialize_x_only(group_commitment))
        .chain_update(serialize_x_only(public_key))
        .chain_update(msg)
        .finalize();
    Scalar::from_be_bytes_mod_order(challenge)
}

/// Computes the challenge for the DKG proof of knowledge
///
/// `c = H(i || "FROST-BIP340" || sec1(C) || sec1(R)) mod q` where `C` commits
/// to the secret being proven and `R` is the prover's nonce commitment.
///
/// The reference construction treats the digest as an unreduced integer; since
/// every use of the challenge is a computation modulo the group order (and
/// `q * G` is the identity), reducing it here yields bit-identical proofs and
/// verdicts.
pub fn pok_challenge(i: SignerIndex, commitment: &Point, nonce_commitment: &Point) -> Scalar {
    let challenge = Sha256::new()
        .chain_update([i])
        .chain_update(POK_CONTEXT)
        .chain_update(serialize_point(commitment))
        .chain_update(serialize_point(nonce_commitment))
        .finalize();
    Scalar::from_be_bytes_mod_order(challenge)
}

/// SHA-256 instance preloaded with the BIP-340 challenge tag
///
/// `H_tag(m) = SHA256(SHA256(tag) || SHA256(tag) || m)`; the two constant
/// blocks are hashed once and the midstate is reused across invocations.
fn challenge_hash() -> Sha256 {
    static PRECOMPUTED: std::sync::OnceLock<Sha256> = std::sync::OnceLock::new();
    PRECOMPUTED
        .get_or_init(|| {
            let tag = Sha256::digest("BIP0340/challenge");
            Sha256::new().chain_update(tag).chain_update(tag)
        })
        .clone()
}

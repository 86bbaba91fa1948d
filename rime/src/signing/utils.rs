use sha2::{Digest, Sha256};

use crate::{ciphersuite, Point, Scalar, SignerIndex};

use super::round1::NonceCommitments;

/// Sorts the signer set ascending and rejects out-of-range or repeated
/// indexes
///
/// Indexes are 1-based; `0` and anything above `participants` fail. Both the
/// signers and the aggregator run this, so the binding-value hash sees the
/// commitment list in one canonical order.
pub fn validate_signers(
    signers: &[(SignerIndex, NonceCommitments)],
    participants: u16,
) -> Result<Vec<(SignerIndex, NonceCommitments)>, SignersError> {
    let mut list = signers.to_vec();
    list.sort_unstable_by_key(|(i, _)| *i);
    for (current, previous) in list.iter().skip(1).zip(&list) {
        if current.0 == previous.0 {
            return Err(SignersError::SameSignerTwice(current.0));
        }
    }
    if let Some(&(i, _)) = list
        .iter()
        .find(|(i, _)| *i == 0 || u16::from(*i) > participants)
    {
        return Err(SignersError::IndexOutOfRange(i));
    }
    Ok(list)
}

/// Signer set validation failure
#[derive(Debug)]
pub enum SignersError {
    IndexOutOfRange(SignerIndex),
    SameSignerTwice(SignerIndex),
}

/// Encodes the commitment list as fed into every binding-value hash:
/// `sec1(D_1) || sec1(E_1) || sec1(D_2) || ...` in list order
pub fn encode_commitment_list(commitments: &[(SignerIndex, NonceCommitments)]) -> Vec<u8> {
    let mut encoded = Vec::with_capacity(66 * commitments.len());
    for (_, comm) in commitments {
        encoded.extend_from_slice(ciphersuite::serialize_point(&comm.hiding).as_bytes());
        encoded.extend_from_slice(ciphersuite::serialize_point(&comm.binding).as_bytes());
    }
    encoded
}

/// Computes the binding value of signer `i`
///
/// `rho_i = H(i || msg || encoded_commitment_list) mod q`. The value binds
/// the signer's second nonce to the message and the whole signer set,
/// preventing Drijvers-style forgeries against concurrent sessions.
pub fn binding_value(i: SignerIndex, msg: &[u8], encoded_commitments: &[u8]) -> Scalar {
    let digest = Sha256::new()
        .chain_update([i])
        .chain_update(msg)
        .chain_update(encoded_commitments)
        .finalize();
    Scalar::from_be_bytes_mod_order(digest)
}

/// Computes the binding values of every signer in the list
pub fn compute_binding_values(
    msg: &[u8],
    commitments: &[(SignerIndex, NonceCommitments)],
) -> Vec<(SignerIndex, Scalar)> {
    let encoded = encode_commitment_list(commitments);
    commitments
        .iter()
        .map(|(i, _)| (*i, binding_value(*i, msg, &encoded)))
        .collect()
}

/// Computes the group commitment `R = sum_i (D_i + rho_i * E_i)`
///
/// Assumes that commitments and binding values come in the same order.
pub fn compute_group_commitment(
    commitments: &[(SignerIndex, NonceCommitments)],
    binding_values: &[(SignerIndex, Scalar)],
) -> Point {
    commitments
        .iter()
        .zip(binding_values)
        .map(|((i, comm), (_i, rho))| {
            debug_assert_eq!(i, _i);
            (comm, rho)
        })
        .fold(Point::zero(), |acc, (comm, rho)| {
            acc + comm.hiding + comm.binding * rho
        })
}

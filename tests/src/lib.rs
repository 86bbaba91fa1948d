//! Shared helpers for the integration suite: in-process protocol simulations
//! and an independent BIP-340 verifier.

use rand::{CryptoRng, RngCore};
use sha2::{Digest, Sha256};

use rime::{
    keygen::{self, Keygen},
    refresh,
    signing::{
        aggregate::{Aggregator, Signature},
        round1::{self, NonceCommitments},
        round2,
        tweak::KeyTweak,
    },
    threshold, Participant, Point, Scalar, SignerIndex,
};

/// Runs a full DKG between `n` simulated participants with threshold `t`
pub fn run_keygen(t: u16, n: u16, rng: &mut (impl RngCore + CryptoRng)) -> Vec<Participant> {
    let (states, packages): (Vec<_>, Vec<_>) = (1..=n)
        .map(|i| Keygen::init(i as SignerIndex, t, n, rng).expect("init keygen"))
        .unzip();

    for package in &packages {
        assert!(keygen::verify_proof_of_knowledge(package));
    }

    let all_shares: Vec<Vec<Scalar>> = states.iter().map(Keygen::generate_shares).collect();

    states
        .into_iter()
        .enumerate()
        .map(|(me, state)| {
            let received = shares_addressed_to(me, &all_shares);
            state.finish(&packages, &received).expect("finish keygen")
        })
        .collect()
}

/// Runs a refresh round between all participants, in place
pub fn run_refresh(participants: &mut [Participant], rng: &mut (impl RngCore + CryptoRng)) {
    let (states, packages): (Vec<_>, Vec<_>) = participants
        .iter()
        .map(|participant| refresh::init(participant, rng))
        .unzip();

    let all_shares: Vec<Vec<Scalar>> = states
        .iter()
        .map(refresh::ShareRefresh::generate_shares)
        .collect();

    for (me, (participant, state)) in participants.iter_mut().zip(states).enumerate() {
        let received = shares_addressed_to(me, &all_shares);
        state
            .finish(participant, &packages, &received)
            .expect("finish refresh");
    }
}

/// Runs a threshold increase to `new_threshold` between all participants
pub fn run_threshold_increase(
    participants: &mut [Participant],
    new_threshold: u16,
    rng: &mut (impl RngCore + CryptoRng),
) {
    let (states, packages): (Vec<_>, Vec<_>) = participants
        .iter()
        .map(|participant| {
            threshold::init_increase(participant, new_threshold, rng).expect("init increase")
        })
        .unzip();

    for package in &packages {
        assert!(threshold::verify_increase_package(package));
    }

    let all_shares: Vec<Vec<Scalar>> = states
        .iter()
        .map(threshold::ThresholdIncrease::generate_shares)
        .collect();

    for (me, (participant, state)) in participants.iter_mut().zip(states).enumerate() {
        let received = shares_addressed_to(me, &all_shares);
        state
            .finish(participant, &packages, &received)
            .expect("finish increase");
    }
}

/// Shares dealt to participant at position `me` (0-based) by everyone else
fn shares_addressed_to(me: usize, all_shares: &[Vec<Scalar>]) -> Vec<(SignerIndex, Scalar)> {
    all_shares
        .iter()
        .enumerate()
        .filter(|(from, _)| *from != me)
        .map(|(from, shares)| ((from + 1) as SignerIndex, shares[me]))
        .collect()
}

/// Carries out a whole signing session between the given signers
///
/// Returns the final signature together with the aggregator, so tests can
/// inspect session values such as the effective public key.
pub fn run_signing(
    signers: &[&Participant],
    msg: &[u8],
    tweak: Option<&KeyTweak>,
    rng: &mut (impl RngCore + CryptoRng),
) -> (Signature, Aggregator) {
    let sessions: Vec<_> = signers
        .iter()
        .map(|signer| {
            let (nonces, commitments) = round1::generate_nonces(rng);
            (signer, nonces, commitments)
        })
        .collect();

    let commitment_list: Vec<(SignerIndex, NonceCommitments)> = sessions
        .iter()
        .map(|(signer, _, commitments)| (signer.index(), *commitments))
        .collect();

    let shares: Vec<_> = sessions
        .into_iter()
        .map(|(signer, nonces, _)| {
            round2::sign(signer, nonces, msg, &commitment_list, tweak).expect("sign")
        })
        .collect();

    let aggregator = Aggregator::new(
        signers[0].public_key(),
        signers[0].participants(),
        msg,
        &commitment_list,
        tweak,
    )
    .expect("assemble aggregator");
    let signature = aggregator.signature(&shares).expect("aggregate");
    (signature, aggregator)
}

/// Verifies a BIP-340 signature, implemented independently from the crate
/// under test (straight from the BIP pseudocode)
pub fn verify_bip340(public_key: &[u8; 32], msg: &[u8], signature: &[u8; 64]) -> bool {
    let Ok(pk) = Point::from_bytes(&lift_x(public_key)) else {
        return false;
    };
    let r_bytes: [u8; 32] = signature[..32].try_into().expect("32 bytes");
    let Ok(z) = Scalar::from_be_bytes(&signature[32..]) else {
        return false;
    };

    let tag = Sha256::digest("BIP0340/challenge");
    let e = Scalar::from_be_bytes_mod_order(
        Sha256::new()
            .chain_update(tag)
            .chain_update(tag)
            .chain_update(r_bytes)
            .chain_update(public_key)
            .chain_update(msg)
            .finalize(),
    );

    // R = z*G - e*P must be a point with even y whose x matches the signature
    let r = Point::generator() * z - pk * e;
    if r.is_zero() {
        return false;
    }
    let encoded = r.to_bytes(true);
    encoded[0] == 2 && encoded[1..] == r_bytes
}

/// Prefixes an x-only key with the even-y SEC1 tag
fn lift_x(x: &[u8; 32]) -> [u8; 33] {
    let mut buf = [0u8; 33];
    buf[0] = 2;
    buf[1..].copy_from_slice(x);
    buf
}

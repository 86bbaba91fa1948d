use rime::{
    signing::{
        aggregate::{Aggregator, Signature},
        round1, round2,
        tweak::{self, KeyTweak},
    },
    Scalar, SecretScalar,
};
use rime_tests::{run_keygen, run_signing, verify_bip340};

#[test]
fn two_of_three_sign_and_verify() {
    let mut rng = rand_dev::DevRng::new();
    let participants = run_keygen(2, 3, &mut rng);
    let msg = b"fnord!";

    let (signature, _) = run_signing(&[&participants[0], &participants[1]], msg, None, &mut rng);

    signature
        .verify(&participants[0].public_key(), msg)
        .unwrap();

    let bytes = signature.to_bytes();
    let public_key = rime::ciphersuite::serialize_x_only(&participants[0].public_key());
    assert!(verify_bip340(&public_key, msg, &bytes));

    // round trip through the wire format
    let restored = Signature::from_bytes(&bytes).unwrap();
    assert_eq!(restored.r, signature.r);
    assert_eq!(restored.z, signature.z);
    restored.verify(&participants[0].public_key(), msg).unwrap();
}

#[test_case::case(2, 3; "t2n3")]
#[test_case::case(3, 3; "t3n3")]
#[test_case::case(3, 5; "t3n5")]
#[test_case::case(5, 5; "t5n5")]
fn every_quorum_produces_a_valid_signature(t: u16, n: u16) {
    let mut rng = rand_dev::DevRng::new();
    let participants = run_keygen(t, n, &mut rng);
    let msg = b"a message to be signed by a quorum";

    // a sliding window over the participants gives a few different quorums
    for start in 0..usize::from(n - t + 1) {
        let signers: Vec<_> = participants[start..start + usize::from(t)].iter().collect();
        let (signature, _) = run_signing(&signers, msg, None, &mut rng);

        let public_key = rime::ciphersuite::serialize_x_only(&participants[0].public_key());
        assert!(verify_bip340(&public_key, msg, &signature.to_bytes()));
    }
}

#[test]
fn binding_values_depend_on_the_nonce_commitments() {
    let mut rng = rand_dev::DevRng::new();
    let participants = run_keygen(2, 3, &mut rng);
    let msg = b"same message, same signers";

    let mut binding_values = vec![];
    for _ in 0..2 {
        let commitments: Vec<_> = [&participants[0], &participants[1]]
            .iter()
            .map(|p| (p.index(), round1::generate_nonces(&mut rng).1))
            .collect();
        let aggregator = Aggregator::new(
            participants[0].public_key(),
            participants[0].participants(),
            *msg,
            &commitments,
            None,
        )
        .unwrap();
        binding_values.push(aggregator.binding_value(1).unwrap());
    }
    assert_ne!(binding_values[0], binding_values[1]);
}

#[test]
fn signs_under_a_tweaked_key() {
    let mut rng = rand_dev::DevRng::new();
    let participants = run_keygen(2, 3, &mut rng);
    let msg = b"taproot output spend";

    let key_tweak = KeyTweak {
        bip32: *SecretScalar::random(&mut rng).as_ref(),
        taproot: *SecretScalar::random(&mut rng).as_ref(),
    };

    let (signature, aggregator) = run_signing(
        &[&participants[1], &participants[2]],
        msg,
        Some(&key_tweak),
        &mut rng,
    );

    let tweaked = tweak::tweak_public_key(&participants[0].public_key(), &key_tweak).unwrap();
    assert_eq!(tweaked.key(), aggregator.effective_public_key());

    signature.verify(&tweaked.key(), msg).unwrap();
    let tweaked_x_only = rime::ciphersuite::serialize_x_only(&tweaked.key());
    assert!(verify_bip340(&tweaked_x_only, msg, &signature.to_bytes()));

    // the untweaked key must not accept it
    assert!(signature.verify(&participants[0].public_key(), msg).is_err());
}

#[test]
fn rejects_malformed_signer_sets() {
    let mut rng = rand_dev::DevRng::new();
    let participants = run_keygen(2, 3, &mut rng);
    let msg = b"msg";

    let (_, other_commitments) = round1::generate_nonces(&mut rng);

    // wrong signer count
    let (nonces, commitments) = round1::generate_nonces(&mut rng);
    let list = vec![(participants[0].index(), commitments)];
    assert!(round2::sign(&participants[0], nonces, msg, &list, None).is_err());

    // duplicate signer
    let (nonces, commitments) = round1::generate_nonces(&mut rng);
    let list = vec![(1, commitments), (1, other_commitments)];
    assert!(round2::sign(&participants[0], nonces, msg, &list, None).is_err());

    // signer not in the list
    let (nonces, commitments) = round1::generate_nonces(&mut rng);
    let list = vec![(2, commitments), (3, other_commitments)];
    assert!(round2::sign(&participants[0], nonces, msg, &list, None).is_err());
}

#[test]
fn rejects_signer_indexes_above_n() {
    let mut rng = rand_dev::DevRng::new();
    let participants = run_keygen(2, 3, &mut rng);
    let msg = b"msg";

    // a phantom signer index beyond n is rejected before any signing math
    let (nonces, commitments) = round1::generate_nonces(&mut rng);
    let (_, phantom_commitments) = round1::generate_nonces(&mut rng);
    let list = vec![(participants[0].index(), commitments), (250, phantom_commitments)];
    assert!(round2::sign(&participants[0], nonces, msg, &list, None).is_err());

    // the aggregator refuses the same set
    assert!(Aggregator::new(
        participants[0].public_key(),
        participants[0].participants(),
        *msg,
        &list,
        None,
    )
    .is_err());

    // and an in-range session rejects out-of-range binding value queries
    let valid: Vec<_> = participants[..2]
        .iter()
        .map(|p| (p.index(), round1::generate_nonces(&mut rng).1))
        .collect();
    let aggregator = Aggregator::new(
        participants[0].public_key(),
        participants[0].participants(),
        *msg,
        &valid,
        None,
    )
    .unwrap();
    assert!(aggregator.binding_value(0).is_err());
    assert!(aggregator.binding_value(250).is_err());
    assert!(aggregator.binding_value(3).is_err()); // in range, not a signer
    assert!(aggregator.binding_value(1).is_ok());
}

#[test]
fn aggregator_rejects_corrupted_shares() {
    let mut rng = rand_dev::DevRng::new();
    let participants = run_keygen(2, 3, &mut rng);
    let msg = b"to be corrupted";

    let sessions: Vec<_> = participants[..2]
        .iter()
        .map(|p| {
            let (nonces, commitments) = round1::generate_nonces(&mut rng);
            (p, nonces, commitments)
        })
        .collect();
    let list: Vec<_> = sessions
        .iter()
        .map(|(p, _, commitments)| (p.index(), *commitments))
        .collect();

    let mut shares: Vec<_> = sessions
        .into_iter()
        .map(|(p, nonces, _)| round2::sign(p, nonces, msg, &list, None).unwrap())
        .collect();
    shares[1] = round2::SigShare(shares[1].0 + Scalar::one());

    let aggregator = Aggregator::new(
        participants[0].public_key(),
        participants[0].participants(),
        *msg,
        &list,
        None,
    )
    .unwrap();
    assert!(aggregator.signature(&shares).is_err());
}

#[test]
fn signature_wire_format_is_64_bytes() {
    let mut rng = rand_dev::DevRng::new();
    let participants = run_keygen(2, 3, &mut rng);

    let (signature, _) = run_signing(&[&participants[0], &participants[2]], b"len", None, &mut rng);
    let bytes = signature.to_bytes();
    assert_eq!(bytes.len(), 64);
    assert_eq!(
        bytes[..32],
        rime::ciphersuite::serialize_x_only(&signature.r)[..]
    );

    assert!(Signature::from_bytes(&bytes[..63]).is_none());
}

use rime::{keygen, threshold, Point, Scalar};
use rime_tests::{run_keygen, run_refresh, run_signing, run_threshold_increase, verify_bip340};

#[test]
fn refresh_preserves_the_key_and_rerandomizes_shares() {
    let mut rng = rand_dev::DevRng::new();
    let mut participants = run_keygen(2, 3, &mut rng);

    let public_key = participants[0].public_key();
    let old_commitments = participants[0].group_commitments().to_vec();
    let old_shares: Vec<Scalar> = participants
        .iter()
        .map(|p| *p.aggregate_share().as_ref())
        .collect();

    run_refresh(&mut participants, &mut rng);

    let first = &participants[0];
    assert_eq!(first.public_key(), public_key);
    assert_ne!(first.group_commitments(), &old_commitments[..]);
    for (participant, old_share) in participants.iter().zip(&old_shares) {
        assert_eq!(participant.public_key(), public_key);
        assert_eq!(participant.group_commitments(), first.group_commitments());

        // shares moved to a new polynomial; the old ones no longer verify
        assert_ne!(participant.aggregate_share().as_ref(), old_share);
        assert!(keygen::verify_share(
            participant.index(),
            participant.aggregate_share().as_ref(),
            participant.group_commitments(),
        ));
        assert!(!keygen::verify_share(
            participant.index(),
            old_share,
            participant.group_commitments(),
        ));
    }

    // and a quorum still signs under the same key
    let msg = b"signed after refresh";
    let (signature, _) = run_signing(&[&participants[1], &participants[2]], msg, None, &mut rng);
    let x_only = rime::ciphersuite::serialize_x_only(&public_key);
    assert!(verify_bip340(&x_only, msg, &signature.to_bytes()));
}

#[test]
fn threshold_increase_requires_a_larger_quorum() {
    let mut rng = rand_dev::DevRng::new();
    let mut participants = run_keygen(2, 4, &mut rng);
    let public_key = participants[0].public_key();

    run_threshold_increase(&mut participants, 3, &mut rng);

    for participant in &participants {
        assert_eq!(participant.threshold(), 3);
        assert_eq!(participant.public_key(), public_key);
        assert_eq!(participant.group_commitments().len(), 3);
        assert!(keygen::verify_share(
            participant.index(),
            participant.aggregate_share().as_ref(),
            participant.group_commitments(),
        ));
    }

    // the old quorum size is rejected, the new one signs fine
    let msg = b"signed after threshold increase";
    let (nonces, commitments) = rime::signing::round1::generate_nonces(&mut rng);
    let too_few = vec![
        (participants[0].index(), commitments),
        (
            participants[1].index(),
            rime::signing::round1::generate_nonces(&mut rng).1,
        ),
    ];
    assert!(
        rime::signing::round2::sign(&participants[0], nonces, msg, &too_few, None).is_err()
    );

    let signers: Vec<_> = participants[..3].iter().collect();
    let (signature, _) = run_signing(&signers, msg, None, &mut rng);
    let x_only = rime::ciphersuite::serialize_x_only(&public_key);
    assert!(verify_bip340(&x_only, msg, &signature.to_bytes()));
}

#[test]
fn increase_must_actually_increase() {
    let mut rng = rand_dev::DevRng::new();
    let participants = run_keygen(2, 3, &mut rng);
    assert!(threshold::init_increase(&participants[0], 2, &mut rng).is_err());
    assert!(threshold::init_increase(&participants[0], 4, &mut rng).is_err());
}

#[test]
fn threshold_decrease_with_a_revealed_share() {
    let mut rng = rand_dev::DevRng::new();
    let mut participants = run_keygen(3, 5, &mut rng);
    let public_key = participants[0].public_key();

    // participant 5 leaves, revealing its share
    let leaving = participants.pop().unwrap();
    let revealed = *leaving.aggregate_share().as_ref();

    for participant in participants.iter_mut() {
        threshold::decrement(participant, &revealed, leaving.index()).unwrap();
    }

    let first = &participants[0];
    assert_eq!(first.threshold(), 2);
    assert_eq!(first.group_commitments().len(), 2);
    for participant in &participants {
        assert_eq!(participant.public_key(), public_key);
        assert_eq!(participant.group_commitments(), first.group_commitments());
        assert!(keygen::verify_share(
            participant.index(),
            participant.aggregate_share().as_ref(),
            participant.group_commitments(),
        ));
    }

    // any two of the remaining participants can sign now
    let msg = b"signed after threshold decrease";
    let (signature, _) = run_signing(&[&participants[0], &participants[3]], msg, None, &mut rng);
    let x_only = rime::ciphersuite::serialize_x_only(&public_key);
    assert!(verify_bip340(&x_only, msg, &signature.to_bytes()));
}

#[test]
fn decrease_rejects_a_bad_revealed_share() {
    let mut rng = rand_dev::DevRng::new();
    let mut participants = run_keygen(2, 3, &mut rng);

    let leaving = participants.pop().unwrap();
    let tampered = leaving.aggregate_share().as_ref() + Scalar::one();
    let result = threshold::decrement(&mut participants[0], &tampered, leaving.index());
    assert!(result.is_err());
}

#[test]
fn refreshed_and_increased_key_still_reconstructs() {
    let mut rng = rand_dev::DevRng::new();
    let mut participants = run_keygen(2, 3, &mut rng);
    let public_key = participants[0].public_key();

    run_refresh(&mut participants, &mut rng);
    run_threshold_increase(&mut participants, 3, &mut rng);

    let shares: Vec<_> = participants.iter().collect();
    let secret = rime::dealer::reconstruct_secret(&shares).unwrap();
    assert_eq!(Point::generator() * &secret, *public_key);
}

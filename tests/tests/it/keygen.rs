use rime::{dealer, keygen, poly, Point, Scalar, SecretScalar};
use rime_tests::run_keygen;

#[test_case::case(2, 3; "t2n3")]
#[test_case::case(3, 3; "t3n3")]
#[test_case::case(3, 5; "t3n5")]
#[test_case::case(5, 5; "t5n5")]
fn keygen_agrees_on_public_data(t: u16, n: u16) {
    let mut rng = rand_dev::DevRng::new();
    let participants = run_keygen(t, n, &mut rng);

    let first = &participants[0];
    assert_eq!(first.group_commitments().len(), usize::from(t));
    for participant in &participants {
        assert_eq!(participant.public_key(), first.public_key());
        assert_eq!(participant.group_commitments(), first.group_commitments());
        assert_eq!(participant.threshold(), t);
        assert_eq!(participant.participants(), n);
    }

    // every share is consistent with the group commitments
    for participant in &participants {
        assert!(keygen::verify_share(
            participant.index(),
            participant.aggregate_share().as_ref(),
            participant.group_commitments(),
        ));
        assert_eq!(
            Point::generator() * participant.aggregate_share(),
            first.verification_share(participant.index()),
        );
    }
}

#[test]
fn any_quorum_reconstructs_the_same_secret() {
    let mut rng = rand_dev::DevRng::new();
    let participants = run_keygen(2, 3, &mut rng);
    let public_key = participants[0].public_key();

    for quorum in [&[0usize, 1][..], &[0, 2], &[1, 2], &[0, 1, 2]] {
        let shares: Vec<_> = quorum.iter().map(|&i| &participants[i]).collect();
        let secret = dealer::reconstruct_secret(&shares).unwrap();
        assert_eq!(Point::generator() * &secret, *public_key);
    }
}

#[test]
fn lagrange_interpolation_in_the_exponent() {
    let mut rng = rand_dev::DevRng::new();
    let participants = run_keygen(2, 3, &mut rng);
    let public_key = participants[0].public_key();

    for quorum in [&[1u8, 2][..], &[1, 3], &[2, 3], &[1, 2, 3]] {
        let combined: Scalar = quorum
            .iter()
            .map(|&i| {
                let lambda = poly::lagrange_coefficient(quorum, i, &Scalar::zero()).unwrap();
                lambda * participants[usize::from(i) - 1].aggregate_share().as_ref()
            })
            .sum();
        assert_eq!(Point::generator() * combined, *public_key);
    }
}

#[test]
fn proof_of_knowledge_verification_is_deterministic() {
    let mut rng = rand_dev::DevRng::new();
    let (_state, package) = keygen::Keygen::init(1, 2, 3, &mut rng).unwrap();

    assert!(keygen::verify_proof_of_knowledge(&package));
    assert!(keygen::verify_proof_of_knowledge(&package));

    let mut tampered = package;
    tampered.sender = 2;
    assert!(!keygen::verify_proof_of_knowledge(&tampered));
}

#[test]
fn inconsistent_share_is_rejected() {
    let mut rng = rand_dev::DevRng::new();
    let n = 3;

    let (states, packages): (Vec<_>, Vec<_>) = (1..=n)
        .map(|i| keygen::Keygen::init(i, 2, u16::from(n), &mut rng).unwrap())
        .unzip();
    let all_shares: Vec<Vec<Scalar>> = states.iter().map(|s| s.generate_shares()).collect();

    let state_1 = states.into_iter().next().unwrap();
    let received = vec![
        (2, all_shares[1][0] + Scalar::one()), // corrupted
        (3, all_shares[2][0]),
    ];
    let result = state_1.finish(&packages, &received);
    assert!(result.is_err());
}

#[test]
fn rejects_out_of_range_parameters() {
    let mut rng = rand_dev::DevRng::new();
    assert!(keygen::Keygen::init(0, 2, 3, &mut rng).is_err());
    assert!(keygen::Keygen::init(4, 2, 3, &mut rng).is_err());
    assert!(keygen::Keygen::init(1, 1, 3, &mut rng).is_err());
    assert!(keygen::Keygen::init(1, 4, 3, &mut rng).is_err());
}

#[test]
fn trusted_dealer_round_trips_the_secret() {
    let mut rng = rand_dev::DevRng::new();

    let secret = SecretScalar::random(&mut rng);
    let expected_key = Point::generator() * &secret;

    let participants = dealer::split(Some(secret), 3, 5, &mut rng).unwrap();
    assert_eq!(*participants[0].public_key(), expected_key);

    let quorum: Vec<_> = participants.iter().take(3).collect();
    let reconstructed = dealer::reconstruct_secret(&quorum).unwrap();
    assert_eq!(Point::generator() * &reconstructed, expected_key);

    // too few shares is an error
    let pair: Vec<_> = participants.iter().take(2).collect();
    assert!(dealer::reconstruct_secret(&pair).is_err());
}

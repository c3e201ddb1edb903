//! Round-trip, linearity, and property tests for the 3D DHT engine.

use fht3d::Dht3d;
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const EPSILON: f64 = 1e-9;

fn random_volume(len: usize, seed: u64) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..len).map(|_| rng.gen_range(-1.0..1.0)).collect()
}

/// Forward then scaled inverse must reproduce the input on a range of
/// shapes, including strongly asymmetric ones and `n3 == 2`.
#[test]
fn forward_inverse_restores_input() {
    for (n1, n2, n3) in [(2, 2, 2), (4, 8, 2), (8, 2, 16), (4, 4, 4), (16, 8, 4)] {
        let len = n1 * n2 * n3;
        let orig = random_volume(len, 0x3d3d + len as u64);
        let mut a = orig.clone();
        let mut engine = Dht3d::new(n1, n2, n3).unwrap();
        engine.forward(&mut a).unwrap();
        engine.inverse(&mut a, true).unwrap();
        for (k, (got, want)) in a.iter().zip(orig.iter()).enumerate() {
            assert!(
                (got - want).abs() <= EPSILON,
                "{n1}x{n2}x{n3} index {k}: {got} vs {want}"
            );
        }
    }
}

/// Without scaling, the DHT is self-inverse up to the factor `n1*n2*n3`.
#[test]
fn unscaled_inverse_multiplies_by_volume_size() {
    let (n1, n2, n3) = (4, 4, 8);
    let len = n1 * n2 * n3;
    let orig = random_volume(len, 7);
    let mut a = orig.clone();
    let mut engine = Dht3d::new(n1, n2, n3).unwrap();
    engine.forward(&mut a).unwrap();
    engine.inverse(&mut a, false).unwrap();
    for (got, want) in a.iter().zip(orig.iter()) {
        assert!((got - want * len as f64).abs() <= 1e-7);
    }
}

#[test]
fn zero_volume_stays_zero() {
    let mut engine = Dht3d::new(8, 8, 8).unwrap();
    let mut a = vec![0.0; 512];
    engine.forward(&mut a).unwrap();
    assert!(a.iter().all(|v| *v == 0.0));
}

/// The transform is linear: T(x + c*y) == T(x) + c*T(y).
#[test]
fn transform_is_linear() {
    let (n1, n2, n3) = (4, 8, 4);
    let len = n1 * n2 * n3;
    let x = random_volume(len, 11);
    let y = random_volume(len, 13);
    let c = 2.75;
    let mut engine = Dht3d::new(n1, n2, n3).unwrap();

    let mut combined: Vec<f64> = x.iter().zip(y.iter()).map(|(a, b)| a + c * b).collect();
    engine.forward(&mut combined).unwrap();

    let mut tx = x.clone();
    engine.forward(&mut tx).unwrap();
    let mut ty = y.clone();
    engine.forward(&mut ty).unwrap();

    for (k, got) in combined.iter().enumerate() {
        let want = tx[k] + c * ty[k];
        assert!((got - want).abs() <= 1e-8, "index {k}: {got} vs {want}");
    }
}

/// One engine can serve many transforms; results must not depend on call
/// history.
#[test]
fn engine_reuse_is_stable() {
    let mut engine = Dht3d::new(4, 4, 4).unwrap();
    let orig = random_volume(64, 23);

    let mut first = orig.clone();
    engine.forward(&mut first).unwrap();
    // A different transform in between must not disturb later results.
    let mut other = random_volume(64, 29);
    engine.forward(&mut other).unwrap();
    let mut second = orig.clone();
    engine.forward(&mut second).unwrap();

    assert_eq!(first, second);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    /// Round trip over random contents and random power-of-two shapes.
    #[test]
    fn prop_round_trip(
        e1 in 1u32..4,
        e2 in 1u32..4,
        e3 in 1u32..4,
        seed in any::<u64>(),
    ) {
        let (n1, n2, n3) = (1usize << e1, 1usize << e2, 1usize << e3);
        let orig = random_volume(n1 * n2 * n3, seed);
        let mut a = orig.clone();
        let mut engine = Dht3d::new(n1, n2, n3).unwrap();
        engine.forward(&mut a).unwrap();
        engine.inverse(&mut a, true).unwrap();
        for (got, want) in a.iter().zip(orig.iter()) {
            prop_assert!((got - want).abs() <= 1e-8);
        }
    }
}

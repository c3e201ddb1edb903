//! The flat and nested entry points must produce identical coefficients.

use fht3d::Dht3d;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn nested_from_flat(a: &[f64], n1: usize, n2: usize, n3: usize) -> Vec<Vec<Vec<f64>>> {
    (0..n1)
        .map(|i| {
            (0..n2)
                .map(|j| a[i * n2 * n3 + j * n3..i * n2 * n3 + j * n3 + n3].to_vec())
                .collect()
        })
        .collect()
}

#[test]
fn flat_and_nested_agree() {
    for (n1, n2, n3) in [(2, 2, 2), (4, 8, 2), (8, 4, 16)] {
        let len = n1 * n2 * n3;
        let mut rng = StdRng::seed_from_u64(0xf1a7);
        let mut flat: Vec<f64> = (0..len).map(|_| rng.gen_range(-1.0..1.0)).collect();
        let mut nested = nested_from_flat(&flat, n1, n2, n3);

        let mut engine = Dht3d::new(n1, n2, n3).unwrap();
        engine.forward(&mut flat).unwrap();
        engine.forward_nested(&mut nested).unwrap();

        for i in 0..n1 {
            for j in 0..n2 {
                for k in 0..n3 {
                    let f = flat[i * n2 * n3 + j * n3 + k];
                    let n = nested[i][j][k];
                    assert!(
                        (f - n).abs() <= 1e-12,
                        "{n1}x{n2}x{n3} ({i},{j},{k}): {f} vs {n}"
                    );
                }
            }
        }
    }
}

#[test]
fn nested_round_trip() {
    let (n1, n2, n3) = (4, 4, 4);
    let mut rng = StdRng::seed_from_u64(0xbeef);
    let flat: Vec<f64> = (0..n1 * n2 * n3).map(|_| rng.gen_range(-1.0..1.0)).collect();
    let orig = nested_from_flat(&flat, n1, n2, n3);
    let mut nested = orig.clone();

    let mut engine = Dht3d::new(n1, n2, n3).unwrap();
    engine.forward_nested(&mut nested).unwrap();
    engine.inverse_nested(&mut nested, true).unwrap();

    for i in 0..n1 {
        for j in 0..n2 {
            for k in 0..n3 {
                assert!((nested[i][j][k] - orig[i][j][k]).abs() <= 1e-9);
            }
        }
    }
}

// Test intent: ensures the threaded and sequential paths produce identical
// coefficients for the same volume.
#![cfg(all(feature = "parallel", feature = "std"))]

use fht3d::{set_parallel_threads, set_parallel_threshold, Dht3d};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const N: usize = 16;

#[test]
/// Run the same transform in forced-parallel and forced-sequential modes
/// and compare outputs.
fn parallel_matches_sequential() {
    let mut rng = StdRng::seed_from_u64(0x9a11e7);
    let input: Vec<f64> = (0..N * N * N).map(|_| rng.gen_range(-1.0..1.0)).collect();
    let mut out_par = input.clone();
    let mut out_seq = input;
    let mut engine = Dht3d::new(N, N, N).unwrap();

    set_parallel_threads(4);
    set_parallel_threshold(1);
    engine.forward(&mut out_par).unwrap();

    set_parallel_threshold(usize::MAX);
    engine.forward(&mut out_seq).unwrap();

    set_parallel_threshold(0);
    set_parallel_threads(0);

    for (k, (a, b)) in out_par.iter().zip(out_seq.iter()).enumerate() {
        assert!((a - b).abs() < 1e-12, "index {k}: {a} vs {b}");
    }
}

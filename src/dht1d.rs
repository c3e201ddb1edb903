//! One-dimensional Discrete Hartley Transform kernel.
//!
//! Computes `H[k] = sum_j a[j] * cas(2*pi*j*k/n)` with `cas(x) = cos(x) +
//! sin(x)` in place for power-of-two `n`, as a radix-2 decimation-in-time
//! fast Hartley transform. The DHT is its own inverse up to a factor of `n`,
//! so [`Dht1d::inverse`] runs the same butterflies and optionally divides by
//! `n`.
//!
//! Stage twiddles are not recomputed per call; they are read from the shared
//! quarter-wave table of a [`DhtTables`] handle passed in explicitly, so one
//! table set serves every axis of a multi-dimensional transform.

use crate::tables::DhtTables;

/// Errors reported by the Hartley transforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DhtError {
    /// An extent is not a power of two, or not greater than 1.
    InvalidDimension,
    /// A buffer does not match the transform geometry, or the shared tables
    /// do not cover the transform length.
    MismatchedLength,
    /// A parallel worker failed; first failure re-raised at the join barrier.
    WorkerFailure,
}

/// Length-`n` in-place DHT over a contiguous real slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dht1d {
    n: usize,
}

impl Dht1d {
    /// Creates a kernel for length `n`, which must be a power of two > 1.
    pub fn new(n: usize) -> Result<Self, DhtError> {
        if !n.is_power_of_two() || n <= 1 {
            return Err(DhtError::InvalidDimension);
        }
        Ok(Self { n })
    }

    /// Forward DHT of `a` in place. `tables` must have been built for at
    /// least this kernel's length (see [`DhtTables::ensure`]).
    pub fn forward(&self, tables: &DhtTables, a: &mut [f64]) -> Result<(), DhtError> {
        if a.len() != self.n || tables.nc() < self.n {
            return Err(DhtError::MismatchedLength);
        }
        fht(a, tables);
        Ok(())
    }

    /// Inverse DHT of `a` in place; with `scale`, divides by `n` so that
    /// `inverse(forward(x), true) == x` up to rounding.
    pub fn inverse(&self, tables: &DhtTables, a: &mut [f64], scale: bool) -> Result<(), DhtError> {
        if a.len() != self.n || tables.nc() < self.n {
            return Err(DhtError::MismatchedLength);
        }
        fht(a, tables);
        if scale {
            let r = 1.0 / self.n as f64;
            for x in a.iter_mut() {
                *x *= r;
            }
        }
        Ok(())
    }
}

/// Radix-2 fast Hartley transform. Combines two half-size transforms `E`
/// (even samples) and `O` (odd samples) per stage:
///
/// ```text
/// X[k]        = E[k] + cos(t)*O[k] + sin(t)*O[half-k],  t = 2*pi*k/len
/// X[k + half] = E[k] - cos(t)*O[k] - sin(t)*O[half-k]
/// ```
///
/// The `k` and `half-k` butterflies are processed together because each needs
/// the other's pre-update odd-half value.
fn fht(a: &mut [f64], tables: &DhtTables) {
    let n = a.len();
    bit_reverse(a);
    let mut i = 0;
    while i < n {
        let x = a[i];
        let y = a[i + 1];
        a[i] = x + y;
        a[i + 1] = x - y;
        i += 2;
    }
    let nc = tables.nc();
    let mut len = 4;
    while len <= n {
        let half = len >> 1;
        let quarter = len >> 2;
        let stride = nc / len;
        let mut b = 0;
        while b < n {
            // k = 0 and k = quarter have unit twiddles.
            let e = a[b];
            let o = a[b + half];
            a[b] = e + o;
            a[b + half] = e - o;
            let e = a[b + quarter];
            let o = a[b + half + quarter];
            a[b + quarter] = e + o;
            a[b + half + quarter] = e - o;
            for k in 1..quarter {
                let kc = half - k;
                let idx = 4 * k * stride;
                let c = tables.quarter_cos(idx);
                let s = tables.quarter_cos(nc - idx);
                let ek = a[b + k];
                let ekc = a[b + kc];
                let ok = a[b + half + k];
                let okc = a[b + half + kc];
                let t = c * ok + s * okc;
                let tc = s * ok - c * okc;
                a[b + k] = ek + t;
                a[b + half + k] = ek - t;
                a[b + kc] = ekc + tc;
                a[b + half + kc] = ekc - tc;
            }
            b += len;
        }
        len <<= 1;
    }
}

fn bit_reverse(a: &mut [f64]) {
    let n = a.len();
    let shift = usize::BITS - n.trailing_zeros();
    for i in 0..n {
        let j = i.reverse_bits() >> shift;
        if i < j {
            a.swap(i, j);
        }
    }
}

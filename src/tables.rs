//! Shared twiddle tables for the Hartley kernels.
//!
//! One [`DhtTables`] instance backs every 1D kernel an engine runs, no matter
//! which axis length it covers. The `w` array holds a quarter-wave cosine
//! table with `c[j] = cos(pi*j/(2*nc))/2` for `0 < j < nc`, starting at the
//! offset `nw`; the kernel derives every stage twiddle from this one region
//! (sines via the mirrored index `nc - j`). `nw` and `nc` record the sizes
//! built so far.
//!
//! Tables only ever grow: [`DhtTables::ensure`] rebuilds for a larger size and
//! is a no-op otherwise, so the array is safe to share read-only across
//! worker threads once built.

extern crate alloc;
use alloc::vec;
use alloc::vec::Vec;
use libm::{atan, cos, sin};

/// Grow-only twiddle tables shared by [`crate::Dht1d`] and [`crate::Dht3d`].
#[derive(Debug)]
pub struct DhtTables {
    nw: usize,
    nc: usize,
    w: Vec<f64>,
}

impl DhtTables {
    /// Allocates tables with enough capacity for transforms of length up to
    /// `max_n` (a power of two). Nothing is computed until [`ensure`] is
    /// called.
    ///
    /// Calling [`ensure`] with a size beyond `max_n` is a caller defect and
    /// panics on out-of-bounds indexing.
    ///
    /// [`ensure`]: DhtTables::ensure
    pub fn new(max_n: usize) -> Self {
        // Largest cosine region offset plus the region itself.
        let w_len = max_n + max_n / 4;
        Self {
            nw: 0,
            nc: 0,
            w: vec![0.0; w_len],
        }
    }

    /// Makes sure the tables cover transforms of length `n`. Advances the
    /// cosine region offset to `n >> 2` when `n` exceeds four times the
    /// recorded size (invalidating the region, which then moves), and
    /// rebuilds the cosine table when `n` exceeds the built cosine size.
    pub fn ensure(&mut self, n: usize) {
        if n > (self.nw << 2) {
            #[cfg(feature = "verbose-logging")]
            log::debug!("advancing cosine offset: nw {} -> {}", self.nw, n >> 2);
            self.nw = n >> 2;
            self.nc = 1;
        }
        if n > self.nc {
            #[cfg(feature = "verbose-logging")]
            log::debug!("rebuilding cosine table: nc {} -> {}", self.nc, n);
            self.makect(n);
        }
    }

    /// Cosine region offset; grows with the largest size seen.
    pub fn nw(&self) -> usize {
        self.nw
    }

    /// Built cosine table size.
    pub fn nc(&self) -> usize {
        self.nc
    }

    /// `cos(pi*idx/(2*nc))` read from the quarter-wave table, valid for
    /// `0 < idx < nc`. The sine of the same angle is `quarter_cos(nc - idx)`.
    #[inline]
    pub(crate) fn quarter_cos(&self, idx: usize) -> f64 {
        2.0 * self.w[self.nw + idx]
    }

    fn makect(&mut self, nc: usize) {
        self.nc = nc;
        if nc <= 1 {
            return;
        }
        let nch = nc >> 1;
        let delta = atan(1.0) / nch as f64;
        let startc = self.nw;
        self.w[startc] = cos(delta * nch as f64);
        self.w[startc + nch] = 0.5 * self.w[startc];
        for j in 1..nch {
            self.w[startc + j] = 0.5 * cos(delta * j as f64);
            self.w[startc + nc - j] = 0.5 * sin(delta * j as f64);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dht1d::Dht1d;

    #[test]
    fn head_slots_track_built_sizes() {
        let mut t = DhtTables::new(16);
        t.ensure(16);
        assert_eq!(t.nw(), 4);
        assert_eq!(t.nc(), 16);
    }

    #[test]
    fn ensure_is_grow_only() {
        let mut t = DhtTables::new(32);
        t.ensure(32);
        let (nw, nc) = (t.nw(), t.nc());
        t.ensure(8);
        assert_eq!((t.nw(), t.nc()), (nw, nc));
    }

    #[test]
    fn quarter_wave_values() {
        let mut t = DhtTables::new(8);
        t.ensure(8);
        // idx = nc/2 sits on the quarter-circle midpoint.
        assert!((t.quarter_cos(4) - core::f64::consts::FRAC_PI_4.cos()).abs() < 1e-15);
        // cos and sin entries mirror around nc.
        for idx in 1..8 {
            let c = t.quarter_cos(idx);
            let expect = (core::f64::consts::PI * idx as f64 / 16.0).cos();
            assert!((c - expect).abs() < 1e-15, "idx {idx}: {c} vs {expect}");
        }
    }

    #[test]
    fn kernel_reads_only_the_cosine_region() {
        let mut clean = DhtTables::new(64);
        clean.ensure(64);
        let mut poisoned = DhtTables::new(64);
        poisoned.ensure(64);
        // Slots below the cosine offset are reserved, never consumed.
        for s in poisoned.w[..poisoned.nw].iter_mut() {
            *s = f64::NAN;
        }

        let dht = Dht1d::new(64).unwrap();
        let x: Vec<f64> = (0..64).map(|i| (i as f64 * 0.31).cos() - 0.4).collect();
        let mut a = x.clone();
        let mut b = x;
        dht.forward(&clean, &mut a).unwrap();
        dht.forward(&poisoned, &mut b).unwrap();
        for (k, (p, q)) in a.iter().zip(b.iter()).enumerate() {
            assert!(q.is_finite() && p.to_bits() == q.to_bits(), "index {k}: {p} vs {q}");
        }
    }
}

//! Three-dimensional Discrete Hartley Transform engine.
//!
//! The 3D DHT is only partially separable: running the 1D kernel along each
//! axis yields a related quantity, not the transform itself. A closing
//! symmetry pass then recombines the eight mirror positions of every
//! half-index triple into the true coefficients. The engine therefore runs
//! three phases per call:
//!
//! 1. Pass A: per slice, 1D transforms along axis 3, then along axis 2 in
//!    interleaved batches of four columns gathered through scratch.
//! 2. Pass B: per row, 1D transforms along axis 1, batched the same way.
//! 3. Symmetry combination over the whole volume.
//!
//! Index and twiddle tables are built lazily, grow only, and are shared
//! read-only by every kernel call of a transform. Above a volume-size
//! threshold (and with the `parallel` feature) the outer loop of each pass is
//! split round-robin across workers, each with a private scratch region, with
//! a full join barrier between phases.

extern crate alloc;
use alloc::vec;
use alloc::vec::Vec;

use crate::dht1d::{Dht1d, DhtError};
use crate::tables::DhtTables;
use crate::volume::{FlatVol, NestedVol, Shape, Volume};

#[cfg(feature = "parallel")]
use core::sync::atomic::{AtomicUsize, Ordering};
#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Element count at and above which a transform runs multi-threaded.
#[cfg(feature = "parallel")]
const PARALLEL_BEGIN_N: usize = 65536;

#[cfg(feature = "parallel")]
static PARALLEL_THRESHOLD_OVERRIDE: AtomicUsize = AtomicUsize::new(0);
#[cfg(feature = "parallel")]
static PARALLEL_THREAD_OVERRIDE: AtomicUsize = AtomicUsize::new(0);

/// Set a custom minimum volume size (total elements) for parallel execution.
///
/// Passing `0` reverts to the `FHT3D_PAR_THRESHOLD` environment variable or
/// the built-in default.
#[cfg(feature = "parallel")]
pub fn set_parallel_threshold(threshold: usize) {
    PARALLEL_THRESHOLD_OVERRIDE.store(threshold, Ordering::Relaxed);
}

/// Override the number of worker threads. `0` reverts to the
/// `FHT3D_PAR_THREADS` environment variable or the detected CPU count.
#[cfg(feature = "parallel")]
pub fn set_parallel_threads(threads: usize) {
    PARALLEL_THREAD_OVERRIDE.store(threads, Ordering::Relaxed);
}

#[cfg(feature = "parallel")]
fn parallel_threshold() -> usize {
    static ENV: std::sync::OnceLock<usize> = std::sync::OnceLock::new();
    let over = PARALLEL_THRESHOLD_OVERRIDE.load(Ordering::Relaxed);
    if over != 0 {
        return over;
    }
    *ENV.get_or_init(|| {
        std::env::var("FHT3D_PAR_THRESHOLD")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(PARALLEL_BEGIN_N)
    })
}

#[cfg(feature = "parallel")]
fn worker_threads() -> usize {
    static ENV: std::sync::OnceLock<usize> = std::sync::OnceLock::new();
    let over = PARALLEL_THREAD_OVERRIDE.load(Ordering::Relaxed);
    if over != 0 {
        return over;
    }
    *ENV.get_or_init(|| {
        std::env::var("FHT3D_PAR_THREADS")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or_else(|| num_cpus::get().max(1))
    })
}

#[cfg(not(feature = "parallel"))]
fn worker_threads() -> usize {
    1
}

#[derive(Debug, Clone, Copy)]
enum Direction {
    Forward,
    Inverse,
}

/// In-place 3D DHT over `n1 x n2 x n3` real volumes, all extents powers of
/// two greater than 1. One engine serves one shape; tables and scratch are
/// reused and grown across calls.
///
/// Flat volumes address element `(i, j, k)` at `i*n2*n3 + j*n3 + k`.
///
/// ```
/// use fht3d::Dht3d;
///
/// let mut engine = Dht3d::new(2, 2, 2).unwrap();
/// let orig = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0];
/// let mut a = orig;
/// engine.forward(&mut a).unwrap();
/// engine.inverse(&mut a, true).unwrap();
/// for (x, y) in a.iter().zip(orig.iter()) {
///     assert!((x - y).abs() < 1e-12);
/// }
/// ```
#[derive(Debug)]
pub struct Dht3d {
    n1: usize,
    n2: usize,
    n3: usize,
    slice_stride: usize,
    row_stride: usize,
    tables: DhtTables,
    t: Vec<f64>,
    dhtn1: Dht1d,
    dhtn2: Dht1d,
    dhtn3: Dht1d,
    threads: usize,
}

impl Dht3d {
    /// Creates an engine for the given extents.
    ///
    /// Returns [`DhtError::InvalidDimension`] if any extent is not a power of
    /// two or not greater than 1.
    pub fn new(n1: usize, n2: usize, n3: usize) -> Result<Self, DhtError> {
        let dhtn1 = Dht1d::new(n1)?;
        let dhtn2 = Dht1d::new(n2)?;
        let dhtn3 = Dht1d::new(n3)?;
        let max_n = n1.max(n2).max(n3);
        let threads = worker_threads();
        Ok(Self {
            n1,
            n2,
            n3,
            slice_stride: n2 * n3,
            row_stride: n3,
            tables: DhtTables::new(max_n),
            t: vec![0.0; scratch_len(n1, n2, n3, threads)],
            dhtn1,
            dhtn2,
            dhtn3,
            threads,
        })
    }

    /// Engine extents as `(n1, n2, n3)`.
    pub fn dims(&self) -> (usize, usize, usize) {
        (self.n1, self.n2, self.n3)
    }

    /// Forward 3D DHT of a flat volume, in place.
    pub fn forward(&mut self, a: &mut [f64]) -> Result<(), DhtError> {
        self.check_flat(a)?;
        let sh = self.shape();
        let vol = FlatVol::new(a, sh);
        self.transform(vol, Direction::Forward, false)
    }

    /// Forward 3D DHT of a nested `a[i][j][k]` volume, in place.
    pub fn forward_nested(&mut self, a: &mut [Vec<Vec<f64>>]) -> Result<(), DhtError> {
        self.check_nested(a)?;
        let rows = row_table(a);
        let vol = NestedVol::new(&rows, self.n2, self.n3);
        self.transform(vol, Direction::Forward, false)
    }

    /// Inverse 3D DHT of a flat volume, in place. With `scale`, divides by
    /// `n1*n2*n3` so that a forward/inverse round trip reproduces the input.
    pub fn inverse(&mut self, a: &mut [f64], scale: bool) -> Result<(), DhtError> {
        self.check_flat(a)?;
        let sh = self.shape();
        let vol = FlatVol::new(a, sh);
        self.transform(vol, Direction::Inverse, scale)
    }

    /// Inverse 3D DHT of a nested volume, in place.
    pub fn inverse_nested(&mut self, a: &mut [Vec<Vec<f64>>], scale: bool) -> Result<(), DhtError> {
        self.check_nested(a)?;
        let rows = row_table(a);
        let vol = NestedVol::new(&rows, self.n2, self.n3);
        self.transform(vol, Direction::Inverse, scale)
    }

    fn check_flat(&self, a: &[f64]) -> Result<(), DhtError> {
        if a.len() != self.n1 * self.slice_stride {
            return Err(DhtError::MismatchedLength);
        }
        Ok(())
    }

    fn check_nested(&self, a: &[Vec<Vec<f64>>]) -> Result<(), DhtError> {
        if a.len() != self.n1 {
            return Err(DhtError::MismatchedLength);
        }
        for slice in a {
            if slice.len() != self.n2 {
                return Err(DhtError::MismatchedLength);
            }
            for row in slice {
                if row.len() != self.n3 {
                    return Err(DhtError::MismatchedLength);
                }
            }
        }
        Ok(())
    }

    fn shape(&self) -> Shape {
        Shape {
            n1: self.n1,
            n2: self.n2,
            n3: self.n3,
            slice_stride: self.slice_stride,
            row_stride: self.row_stride,
        }
    }

    /// Runs both axis passes and the symmetry combination. Tables and
    /// scratch are settled on the calling thread before any worker starts;
    /// each phase completes over the whole volume before the next begins.
    fn transform<V: Volume>(
        &mut self,
        vol: V,
        dir: Direction,
        scale: bool,
    ) -> Result<(), DhtError> {
        self.tables.ensure(self.n1.max(self.n2).max(self.n3));
        let threads = worker_threads();
        if threads != self.threads {
            let nt = scratch_len(self.n1, self.n2, self.n3, threads);
            #[cfg(feature = "verbose-logging")]
            log::debug!(
                "scratch realloc {} -> {} (threads {} -> {})",
                self.t.len(),
                nt,
                self.threads,
                threads
            );
            self.t = vec![0.0; nt];
            self.threads = threads;
        }
        let sh = self.shape();
        let (dhtn1, dhtn2, dhtn3) = (self.dhtn1, self.dhtn2, self.dhtn3);
        let tables = &self.tables;
        let t = &mut self.t[..];

        #[cfg(feature = "parallel")]
        if threads > 1 && sh.n1 * sh.n2 * sh.n3 >= parallel_threshold() {
            #[cfg(feature = "verbose-logging")]
            log::debug!("parallel dispatch across {} threads", threads);
            pass_a_parallel(sh, dhtn2, dhtn3, tables, t, vol, dir, scale, threads)?;
            pass_b_parallel(sh, dhtn1, tables, t, vol, dir, scale, threads)?;
            combine(sh, vol);
            return Ok(());
        }

        pass_a(sh, dhtn2, dhtn3, tables, t, vol, dir, scale)?;
        pass_b(sh, dhtn1, tables, t, vol, dir, scale)?;
        combine(sh, vol);
        Ok(())
    }
}

/// Scratch length: four interleaved sub-blocks of the larger outer extent,
/// one region per worker, half of it when the innermost extent is 2.
fn scratch_len(n1: usize, n2: usize, n3: usize, threads: usize) -> usize {
    let mut nt = 4 * n1.max(n2);
    if threads > 1 {
        nt *= threads;
    }
    if n3 == 2 {
        nt >>= 1;
    }
    nt
}

/// Row-major table of row buffer pointers for the nested layout, built on
/// the calling thread before any worker runs.
fn row_table(a: &mut [Vec<Vec<f64>>]) -> Vec<*mut f64> {
    let mut rows = Vec::with_capacity(a.len() * a[0].len());
    for slice in a.iter_mut() {
        for row in slice.iter_mut() {
            rows.push(row.as_mut_ptr());
        }
    }
    rows
}

#[inline]
fn apply(dht: Dht1d, tables: &DhtTables, a: &mut [f64], dir: Direction, scale: bool) -> Result<(), DhtError> {
    match dir {
        Direction::Forward => dht.forward(tables, a),
        Direction::Inverse => dht.inverse(tables, a, scale),
    }
}

#[allow(clippy::too_many_arguments)]
fn pass_a<V: Volume>(
    sh: Shape,
    dhtn2: Dht1d,
    dhtn3: Dht1d,
    tables: &DhtTables,
    t: &mut [f64],
    vol: V,
    dir: Direction,
    scale: bool,
) -> Result<(), DhtError> {
    let mut ntl = 4 * sh.n2;
    if sh.n3 == 2 {
        ntl >>= 1;
    }
    let t = &mut t[..ntl];
    for i in 0..sh.n1 {
        pass_a_slice(sh, dhtn2, dhtn3, tables, t, vol, i, dir, scale)?;
    }
    Ok(())
}

/// Pass A body for one slice: axis-3 rows in place, then axis-2 columns in
/// interleaved batches of four (one batch of two when `n3 == 2`) gathered
/// through `t`.
#[allow(clippy::too_many_arguments)]
fn pass_a_slice<V: Volume>(
    sh: Shape,
    dhtn2: Dht1d,
    dhtn3: Dht1d,
    tables: &DhtTables,
    t: &mut [f64],
    vol: V,
    i: usize,
    dir: Direction,
    scale: bool,
) -> Result<(), DhtError> {
    let n2 = sh.n2;
    let n3 = sh.n3;
    for j in 0..n2 {
        // SAFETY: the caller grants this invocation exclusive access to
        // slice `i`.
        let row = unsafe { vol.row_mut(i, j) };
        apply(dhtn3, tables, row, dir, scale)?;
    }
    if n3 > 2 {
        let mut k = 0;
        while k < n3 {
            for j in 0..n2 {
                // SAFETY: same exclusive slice access as above.
                unsafe {
                    t[j] = vol.get(i, j, k);
                    t[n2 + j] = vol.get(i, j, k + 1);
                    t[2 * n2 + j] = vol.get(i, j, k + 2);
                    t[3 * n2 + j] = vol.get(i, j, k + 3);
                }
            }
            apply(dhtn2, tables, &mut t[..n2], dir, scale)?;
            apply(dhtn2, tables, &mut t[n2..2 * n2], dir, scale)?;
            apply(dhtn2, tables, &mut t[2 * n2..3 * n2], dir, scale)?;
            apply(dhtn2, tables, &mut t[3 * n2..4 * n2], dir, scale)?;
            for j in 0..n2 {
                // SAFETY: same exclusive slice access as above.
                unsafe {
                    vol.set(i, j, k, t[j]);
                    vol.set(i, j, k + 1, t[n2 + j]);
                    vol.set(i, j, k + 2, t[2 * n2 + j]);
                    vol.set(i, j, k + 3, t[3 * n2 + j]);
                }
            }
            k += 4;
        }
    } else {
        for j in 0..n2 {
            // SAFETY: same exclusive slice access as above.
            unsafe {
                t[j] = vol.get(i, j, 0);
                t[n2 + j] = vol.get(i, j, 1);
            }
        }
        apply(dhtn2, tables, &mut t[..n2], dir, scale)?;
        apply(dhtn2, tables, &mut t[n2..2 * n2], dir, scale)?;
        for j in 0..n2 {
            // SAFETY: same exclusive slice access as above.
            unsafe {
                vol.set(i, j, 0, t[j]);
                vol.set(i, j, 1, t[n2 + j]);
            }
        }
    }
    Ok(())
}

fn pass_b<V: Volume>(
    sh: Shape,
    dhtn1: Dht1d,
    tables: &DhtTables,
    t: &mut [f64],
    vol: V,
    dir: Direction,
    scale: bool,
) -> Result<(), DhtError> {
    let mut ntl = 4 * sh.n1;
    if sh.n3 == 2 {
        ntl >>= 1;
    }
    let t = &mut t[..ntl];
    for j in 0..sh.n2 {
        pass_b_col(sh, dhtn1, tables, t, vol, j, dir, scale)?;
    }
    Ok(())
}

/// Pass B body for one axis-2 position: axis-1 columns in interleaved
/// batches of four (one batch of two when `n3 == 2`) gathered through `t`.
#[allow(clippy::too_many_arguments)]
fn pass_b_col<V: Volume>(
    sh: Shape,
    dhtn1: Dht1d,
    tables: &DhtTables,
    t: &mut [f64],
    vol: V,
    j: usize,
    dir: Direction,
    scale: bool,
) -> Result<(), DhtError> {
    let n1 = sh.n1;
    let n3 = sh.n3;
    if n3 > 2 {
        let mut k = 0;
        while k < n3 {
            for i in 0..n1 {
                // SAFETY: the caller grants this invocation exclusive access
                // to the `(_, j, _)` rows.
                unsafe {
                    t[i] = vol.get(i, j, k);
                    t[n1 + i] = vol.get(i, j, k + 1);
                    t[2 * n1 + i] = vol.get(i, j, k + 2);
                    t[3 * n1 + i] = vol.get(i, j, k + 3);
                }
            }
            apply(dhtn1, tables, &mut t[..n1], dir, scale)?;
            apply(dhtn1, tables, &mut t[n1..2 * n1], dir, scale)?;
            apply(dhtn1, tables, &mut t[2 * n1..3 * n1], dir, scale)?;
            apply(dhtn1, tables, &mut t[3 * n1..4 * n1], dir, scale)?;
            for i in 0..n1 {
                // SAFETY: same exclusive column access as above.
                unsafe {
                    vol.set(i, j, k, t[i]);
                    vol.set(i, j, k + 1, t[n1 + i]);
                    vol.set(i, j, k + 2, t[2 * n1 + i]);
                    vol.set(i, j, k + 3, t[3 * n1 + i]);
                }
            }
            k += 4;
        }
    } else {
        for i in 0..n1 {
            // SAFETY: same exclusive column access as above.
            unsafe {
                t[i] = vol.get(i, j, 0);
                t[n1 + i] = vol.get(i, j, 1);
            }
        }
        apply(dhtn1, tables, &mut t[..n1], dir, scale)?;
        apply(dhtn1, tables, &mut t[n1..2 * n1], dir, scale)?;
        for i in 0..n1 {
            // SAFETY: same exclusive column access as above.
            unsafe {
                vol.set(i, j, 0, t[i]);
                vol.set(i, j, 1, t[n1 + i]);
            }
        }
    }
    Ok(())
}

#[cfg(feature = "parallel")]
#[allow(clippy::too_many_arguments)]
fn pass_a_parallel<V: Volume>(
    sh: Shape,
    dhtn2: Dht1d,
    dhtn3: Dht1d,
    tables: &DhtTables,
    t: &mut [f64],
    vol: V,
    dir: Direction,
    scale: bool,
    threads: usize,
) -> Result<(), DhtError> {
    let workers = threads.min(sh.n1);
    let mut ntl = 4 * sh.n2;
    if sh.n3 == 2 {
        ntl >>= 1;
    }
    let chunks: Vec<(usize, &mut [f64])> =
        t.chunks_mut(ntl).take(workers).enumerate().collect();
    chunks
        .into_par_iter()
        .try_for_each(|(w, chunk)| {
            // Round-robin slice assignment; worker `w` owns slices
            // w, w+workers, ... and its private scratch chunk.
            for i in (w..sh.n1).step_by(workers) {
                pass_a_slice(sh, dhtn2, dhtn3, tables, chunk, vol, i, dir, scale)?;
            }
            Ok(())
        })
        .map_err(|_: DhtError| DhtError::WorkerFailure)
}

#[cfg(feature = "parallel")]
#[allow(clippy::too_many_arguments)]
fn pass_b_parallel<V: Volume>(
    sh: Shape,
    dhtn1: Dht1d,
    tables: &DhtTables,
    t: &mut [f64],
    vol: V,
    dir: Direction,
    scale: bool,
    threads: usize,
) -> Result<(), DhtError> {
    let workers = threads.min(sh.n2);
    let mut ntl = 4 * sh.n1;
    if sh.n3 == 2 {
        ntl >>= 1;
    }
    let chunks: Vec<(usize, &mut [f64])> =
        t.chunks_mut(ntl).take(workers).enumerate().collect();
    chunks
        .into_par_iter()
        .try_for_each(|(w, chunk)| {
            for j in (w..sh.n2).step_by(workers) {
                pass_b_col(sh, dhtn1, tables, chunk, vol, j, dir, scale)?;
            }
            Ok(())
        })
        .map_err(|_: DhtError| DhtError::WorkerFailure)
}

/// Symmetry combination: rewrites the eight mirror positions of every
/// half-index triple with fixed half-sum/half-difference formulas, finishing
/// the 3D transform. Runs exactly once per call, after both passes.
fn combine<V: Volume>(sh: Shape, vol: V) {
    let (n1, n2, n3) = (sh.n1, sh.n2, sh.n3);
    for k3 in 0..=n1 / 2 {
        let k3c = (n1 - k3) % n1;
        for k2 in 0..=n2 / 2 {
            let k2c = (n2 - k2) % n2;
            for k1 in 0..=n3 / 2 {
                let k1c = (n3 - k1) % n3;
                // SAFETY: this pass runs single-threaded with exclusive
                // access to the whole volume.
                unsafe {
                    let va = vol.get(k3, k2c, k1);
                    let vb = vol.get(k3, k2, k1c);
                    let vc = vol.get(k3c, k2, k1);
                    let vd = vol.get(k3c, k2c, k1c);
                    let ve = vol.get(k3c, k2c, k1);
                    let vf = vol.get(k3c, k2, k1c);
                    let vg = vol.get(k3, k2, k1);
                    let vh = vol.get(k3, k2c, k1c);
                    vol.set(k3, k2, k1, (va + vb + vc - vd) / 2.0);
                    vol.set(k3c, k2, k1, (ve + vf + vg - vh) / 2.0);
                    vol.set(k3, k2c, k1, (vg + vh + ve - vf) / 2.0);
                    vol.set(k3c, k2c, k1, (vc + vd + va - vb) / 2.0);
                    vol.set(k3, k2, k1c, (vh + vg + vf - ve) / 2.0);
                    vol.set(k3c, k2, k1c, (vd + vc + vb - va) / 2.0);
                    vol.set(k3, k2c, k1c, (vb + va + vd - vc) / 2.0);
                    vol.set(k3c, k2c, k1c, (vf + ve + vh - vg) / 2.0);
                }
            }
        }
    }
}

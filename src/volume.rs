//! Storage access for the 3D engine.
//!
//! The axis sweeps and the symmetry combination are written once against the
//! [`Volume`] trait; [`FlatVol`] maps it onto a flat strided buffer and
//! [`NestedVol`] onto `a[i][j][k]` nesting. Both must traverse, batch, and
//! address identically so the two layouts stay bit-compatible.

use core::marker::PhantomData;

/// Extents and strides of one engine's volume geometry.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Shape {
    pub n1: usize,
    pub n2: usize,
    pub n3: usize,
    pub slice_stride: usize,
    pub row_stride: usize,
}

/// Raw access to a caller-owned 3D volume.
///
/// Accessors are `Copy` so one value can be shared by every parallel worker;
/// in exchange, nothing here tracks aliasing. The drivers uphold the contract
/// that concurrent users touch disjoint `(i, j)` rows.
pub(crate) trait Volume: Copy + Send + Sync {
    /// Contiguous axis-3 row at `(i, j)`.
    ///
    /// # Safety
    /// `i < n1`, `j < n2`, and the caller must have exclusive access to that
    /// row for the returned lifetime.
    unsafe fn row_mut<'a>(&self, i: usize, j: usize) -> &'a mut [f64];

    /// # Safety
    /// In-bounds indices and no concurrent writer of the addressed element.
    unsafe fn get(&self, i: usize, j: usize, k: usize) -> f64;

    /// # Safety
    /// In-bounds indices and exclusive access to the addressed element.
    unsafe fn set(&self, i: usize, j: usize, k: usize, v: f64);
}

/// Flat layout: element `(i, j, k)` lives at `i*slice_stride + j*row_stride + k`.
#[derive(Clone, Copy)]
pub(crate) struct FlatVol<'a> {
    ptr: *mut f64,
    sh: Shape,
    _marker: PhantomData<&'a mut [f64]>,
}

// SAFETY: the pointer refers to a caller-owned buffer that outlives the
// accessor; disjointness of concurrent accesses is the drivers' contract.
unsafe impl Send for FlatVol<'_> {}
unsafe impl Sync for FlatVol<'_> {}

impl<'a> FlatVol<'a> {
    pub fn new(a: &'a mut [f64], sh: Shape) -> Self {
        debug_assert_eq!(a.len(), sh.n1 * sh.slice_stride);
        Self {
            ptr: a.as_mut_ptr(),
            sh,
            _marker: PhantomData,
        }
    }
}

impl Volume for FlatVol<'_> {
    #[inline]
    unsafe fn row_mut<'a>(&self, i: usize, j: usize) -> &'a mut [f64] {
        let off = i * self.sh.slice_stride + j * self.sh.row_stride;
        core::slice::from_raw_parts_mut(self.ptr.add(off), self.sh.n3)
    }

    #[inline]
    unsafe fn get(&self, i: usize, j: usize, k: usize) -> f64 {
        *self
            .ptr
            .add(i * self.sh.slice_stride + j * self.sh.row_stride + k)
    }

    #[inline]
    unsafe fn set(&self, i: usize, j: usize, k: usize, v: f64) {
        *self
            .ptr
            .add(i * self.sh.slice_stride + j * self.sh.row_stride + k) = v;
    }
}

/// Nested layout: `a[i][j][k]` over `&mut [Vec<Vec<f64>>]`.
///
/// Row buffer pointers are collected up front (on the calling thread, before
/// any worker starts) so workers never touch the `Vec` spines concurrently.
#[derive(Clone, Copy)]
pub(crate) struct NestedVol<'a> {
    rows: *const *mut f64,
    n2: usize,
    n3: usize,
    _marker: PhantomData<&'a mut [f64]>,
}

// SAFETY: the row table is read-only while shared and the row buffers are
// caller-owned; disjointness of concurrent accesses is the drivers' contract.
unsafe impl Send for NestedVol<'_> {}
unsafe impl Sync for NestedVol<'_> {}

impl<'a> NestedVol<'a> {
    /// `rows` holds one pointer per `(i, j)` row, in row-major order, and
    /// must outlive the accessor.
    pub fn new(rows: &'a [*mut f64], n2: usize, n3: usize) -> Self {
        Self {
            rows: rows.as_ptr(),
            n2,
            n3,
            _marker: PhantomData,
        }
    }
}

impl Volume for NestedVol<'_> {
    #[inline]
    unsafe fn row_mut<'b>(&self, i: usize, j: usize) -> &'b mut [f64] {
        let p = *self.rows.add(i * self.n2 + j);
        core::slice::from_raw_parts_mut(p, self.n3)
    }

    #[inline]
    unsafe fn get(&self, i: usize, j: usize, k: usize) -> f64 {
        *(*self.rows.add(i * self.n2 + j)).add(k)
    }

    #[inline]
    unsafe fn set(&self, i: usize, j: usize, k: usize, v: f64) {
        *(*self.rows.add(i * self.n2 + j)).add(k) = v;
    }
}

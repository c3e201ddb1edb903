//! # fht3d - Three-dimensional Discrete Hartley Transform for Rust
//!
//! In-place 3D DHT over real `f64` volumes with power-of-two extents.
//! Supports both flat row-major buffers and nested `Vec<Vec<Vec<f64>>>`
//! layouts through the same engine, with optional multi-threaded execution
//! for large volumes.
//!
//! ## Cargo Features
//!
//! - `std` (default): Enable standard library features
//! - `parallel`: Enable parallel processing with Rayon
//! - `verbose-logging`: Emit `log` records for table growth and dispatch
//!
//! ## Example
//!
//! ```
//! use fht3d::Dht3d;
//!
//! let mut engine = Dht3d::new(4, 4, 4).unwrap();
//! let mut volume = vec![0.0; 64];
//! volume[0] = 1.0;
//! engine.forward(&mut volume).unwrap();
//! engine.inverse(&mut volume, true).unwrap();
//! assert!((volume[0] - 1.0).abs() < 1e-12);
//! ```
//!
//! ## License
//!
//! Licensed under either of
//! - Apache License, Version 2.0 ([LICENSE-APACHE](LICENSE-APACHE) or https://www.apache.org/licenses/LICENSE-2.0)
//! - MIT license ([LICENSE-MIT](LICENSE-MIT) or https://opensource.org/licenses/MIT)
//!
//! at your option.

#![no_std]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

/// One-dimensional DHT kernel
///
/// Radix-2 in-place transform consuming the shared twiddle tables.
pub mod dht1d;

/// Three-dimensional DHT engine
///
/// Axis passes, symmetry combination, and parallel scheduling.
pub mod dht3d;

/// Shape-keyed engine cache
pub mod planner;

/// Grow-only twiddle tables
pub mod tables;

/// Layout adapters for the axis drivers
mod volume;

pub use dht1d::{Dht1d, DhtError};
pub use dht3d::Dht3d;
#[cfg(feature = "parallel")]
pub use dht3d::{set_parallel_threads, set_parallel_threshold};
pub use planner::DhtPlanner;
pub use tables::DhtTables;

//! # beam-moments
//!
//! Statistical moments of macroparticle ensembles for beam-dynamics
//! diagnostics.
//!
//! Every function is a pure reduction over read-only `&[f64]` coordinate
//! arrays (`x`, `xp`, `y`, `yp`, `z`, `dp`, ...) and returns one scalar.
//! No state survives a call, so the functions can be invoked from any
//! number of threads on shared arrays.
//!
//! ## Modules
//!
//! - [`stats`]: mean, population variance/std, and covariance by two
//!   independent algorithms (two-pass reference, one-pass Welford)
//! - [`emittance`]: rms emittance (covariance-matrix and legacy
//!   formulations, optional weights), dispersion, dispersion-corrected
//!   emittance, statistical Twiss parameters
//! - [`random`]: seeded, caller-owned RNG and sample-array builders for
//!   reproducible fixtures
//!
//! ## Feature Flags
//!
//! - `parallel`: chunked one-pass covariance on the rayon pool
//!   ([`stats::cov_one_pass_par`])
//!
//! ## Design Philosophy
//!
//! - **Numerical stability first**: compensated summation, shifted means,
//!   Welford co-moments
//! - **Redundant algorithms on purpose**: each fast path has an independent
//!   reference implementation it is tested against
//! - **Property-based testing**: invariants verified via proptest
//!
//! ```
//! use beam_moments::emittance::{dispersion, emittance};
//! use beam_moments::random::{create_rng, normal_samples};
//!
//! let mut rng = create_rng(1);
//! let x = normal_samples(10_000, 0.0, 1e-3, &mut rng).unwrap();
//! let xp = normal_samples(10_000, 0.0, 1e-4, &mut rng).unwrap();
//! let dp = normal_samples(10_000, 0.0, 1e-3, &mut rng).unwrap();
//!
//! let eps = emittance(&x, &xp, None).unwrap();
//! assert!((eps - 1e-7).abs() < 5e-9);
//! assert!(dispersion(&xp, &dp).unwrap().abs() < 5e-3);
//! ```

pub mod emittance;
pub mod random;
pub mod stats;

pub use stats::MomentError;

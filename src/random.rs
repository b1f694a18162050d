//! Seeded sample-array generation for deterministic fixtures.
//!
//! Benchmarks and tests need reproducible coordinate arrays. Instead of a
//! process-wide seed, every builder here takes a caller-owned generator, so
//! two fixtures never share mutable RNG state.
//!
//! # Reproducibility
//!
//! [`create_rng`] returns a `SmallRng` (Xoshiro256++) seeded from a `u64`.
//! The sequence is deterministic for a given seed on the same platform.

use rand::Rng;
use rand_distr::{Distribution, Normal};

/// Error type for invalid sampling parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum SamplingError {
    /// Parameters violate distribution constraints.
    InvalidParameters(String),
}

impl std::fmt::Display for SamplingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SamplingError::InvalidParameters(msg) => {
                write!(f, "invalid sampling parameters: {msg}")
            }
        }
    }
}

impl std::error::Error for SamplingError {}

/// Creates a fast, seeded random number generator.
///
/// # Examples
/// ```
/// use beam_moments::random::create_rng;
/// use rand::Rng;
/// let mut rng = create_rng(42);
/// let x: f64 = rng.random();
/// assert!(x >= 0.0 && x < 1.0);
/// ```
pub fn create_rng(seed: u64) -> rand::rngs::SmallRng {
    use rand::SeedableRng;
    rand::rngs::SmallRng::seed_from_u64(seed)
}

/// Draws `n` values from N(μ, σ).
///
/// `sigma == 0` is allowed and yields a constant array.
///
/// # Errors
/// Returns `Err` if `mu` or `sigma` is not finite, or `sigma < 0`.
///
/// # Examples
/// ```
/// use beam_moments::random::{create_rng, normal_samples};
/// let mut rng = create_rng(0);
/// let xp = normal_samples(1000, 0.0, 1e-4, &mut rng).unwrap();
/// assert_eq!(xp.len(), 1000);
/// ```
pub fn normal_samples<R: Rng>(
    n: usize,
    mu: f64,
    sigma: f64,
    rng: &mut R,
) -> Result<Vec<f64>, SamplingError> {
    if !mu.is_finite() || !sigma.is_finite() || sigma < 0.0 {
        return Err(SamplingError::InvalidParameters(format!(
            "Normal requires finite μ and σ ≥ 0, got μ={mu}, σ={sigma}"
        )));
    }
    let dist = Normal::new(mu, sigma)
        .map_err(|e| SamplingError::InvalidParameters(e.to_string()))?;
    Ok(dist.sample_iter(rng).take(n).collect())
}

/// Draws `n` values from the Laplace distribution with location `loc` and
/// scale `b`.
///
/// # Algorithm
/// Inverse CDF: for `v` uniform on `(−½, ½)`,
/// ```text
/// x = loc − b · sgn(v) · ln(1 − 2|v|)
/// ```
/// The heavy tails make it a harsher emittance fixture than a Gaussian.
///
/// # Errors
/// Returns `Err` if `loc` or `scale` is not finite, or `scale ≤ 0`.
///
/// # Examples
/// ```
/// use beam_moments::random::{create_rng, laplace_samples};
/// let mut rng = create_rng(7);
/// let z = laplace_samples(500, -2.0, 0.5, &mut rng).unwrap();
/// assert!(z.iter().all(|v| v.is_finite()));
/// ```
pub fn laplace_samples<R: Rng>(
    n: usize,
    loc: f64,
    scale: f64,
    rng: &mut R,
) -> Result<Vec<f64>, SamplingError> {
    if !loc.is_finite() || !scale.is_finite() || scale <= 0.0 {
        return Err(SamplingError::InvalidParameters(format!(
            "Laplace requires finite loc and scale > 0, got loc={loc}, scale={scale}"
        )));
    }
    let mut out = Vec::with_capacity(n);
    while out.len() < n {
        let v: f64 = rng.random::<f64>() - 0.5;
        // v = −0.5 would give ln(0)
        if v == -0.5 {
            continue;
        }
        out.push(loc - scale * v.signum() * (1.0 - 2.0 * v.abs()).ln());
    }
    Ok(out)
}

// ============================================================================
// Tests
// ============================================================================

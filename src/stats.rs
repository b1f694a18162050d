//! Mean, variance and covariance of phase-space sample arrays.
//!
//! Every function takes read-only slices, validates them up front and
//! returns a single scalar. Nothing is cached between calls.
//!
//! # Algorithms
//!
//! - **Mean**: Neumaier compensated summation of deviations from the first
//!   sample. Shifting by the first sample keeps large-offset data (e.g. a
//!   momentum array centred far from zero) well conditioned and makes the
//!   mean of a constant array exact.
//! - **Two-pass covariance**: means first, then the average product of
//!   deviations. The reference algorithm.
//! - **One-pass covariance**: Welford-style co-moment update. A single
//!   traversal, no deviation arrays.
//!   Reference: Welford (1962), "Note on a Method for Calculating
//!   Corrected Sums of Squares and Products", *Technometrics* 4(3).
//!
//! All second moments use the **population** convention (denominator `n`),
//! so that `std(a)² == cov_two_pass(a, a)` up to rounding.

use std::fmt;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Error returned by the moment functions.
#[derive(Debug, Clone, PartialEq)]
pub enum MomentError {
    /// A required sample array has zero length.
    EmptyInput,
    /// Arrays that must correspond element-wise differ in length.
    ShapeMismatch { expected: usize, found: usize },
    /// The statistic is mathematically undefined for this input.
    DegenerateInput(&'static str),
}

impl fmt::Display for MomentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MomentError::EmptyInput => write!(f, "sample array is empty"),
            MomentError::ShapeMismatch { expected, found } => {
                write!(f, "length mismatch: expected {expected}, found {found}")
            }
            MomentError::DegenerateInput(msg) => write!(f, "degenerate input: {msg}"),
        }
    }
}

impl std::error::Error for MomentError {}

/// Returns the common length of `a` and `b`.
pub(crate) fn check_pair(a: &[f64], b: &[f64]) -> Result<usize, MomentError> {
    if a.is_empty() || b.is_empty() {
        return Err(MomentError::EmptyInput);
    }
    if a.len() != b.len() {
        return Err(MomentError::ShapeMismatch {
            expected: a.len(),
            found: b.len(),
        });
    }
    Ok(a.len())
}

/// Computes the arithmetic mean.
///
/// # Algorithm
/// Neumaier summation of `xᵢ − x₀`, then `x₀ + Σ/n`. A constant array
/// returns its value exactly.
///
/// # Complexity
/// Time: O(n), Space: O(1)
///
/// # Errors
/// [`MomentError::EmptyInput`] if `data` is empty.
///
/// # Examples
/// ```
/// use beam_moments::stats::mean;
/// let v = [1.0, 2.0, 3.0, 4.0, 5.0];
/// assert!((mean(&v).unwrap() - 3.0).abs() < 1e-15);
/// assert!(mean(&[]).is_err());
/// ```
pub fn mean(data: &[f64]) -> Result<f64, MomentError> {
    if data.is_empty() {
        return Err(MomentError::EmptyInput);
    }
    Ok(shifted_mean(data))
}

/// Mean of a non-empty slice, summed relative to its first element.
pub(crate) fn shifted_mean(data: &[f64]) -> f64 {
    let pivot = data[0];
    let sum = neumaier(data.iter().map(|&x| x - pivot));
    pivot + sum / data.len() as f64
}

/// Computes the population variance (denominator `n`).
///
/// Identical to `cov_two_pass(data, data)`.
///
/// # Errors
/// [`MomentError::EmptyInput`] if `data` is empty.
///
/// # Examples
/// ```
/// use beam_moments::stats::variance;
/// let v = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
/// assert!((variance(&v).unwrap() - 4.0).abs() < 1e-12);
/// ```
pub fn variance(data: &[f64]) -> Result<f64, MomentError> {
    cov_two_pass(data, data)
}

/// Computes the population standard deviation, `sqrt(variance(data))`.
///
/// Returns `0.0` for a single sample or a constant array.
///
/// # Errors
/// [`MomentError::EmptyInput`] if `data` is empty.
///
/// # Examples
/// ```
/// use beam_moments::stats::std;
/// let v = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
/// assert!((std(&v).unwrap() - 2.0).abs() < 1e-12);
/// assert_eq!(std(&[7.5]).unwrap(), 0.0);
/// ```
pub fn std(data: &[f64]) -> Result<f64, MomentError> {
    variance(data).map(f64::sqrt)
}

/// Computes the population covariance with the direct two-pass algorithm.
///
/// # Formula
/// ```text
/// Cov(a, b) = Σ(aᵢ − ā)(bᵢ − b̄) / n
/// ```
///
/// The first pass computes both means, the second accumulates the products
/// of deviations. Passing the same slice twice yields the population
/// variance.
///
/// # Complexity
/// Time: O(n) over three traversals, Space: O(1)
///
/// # Errors
/// - [`MomentError::EmptyInput`] if either slice is empty.
/// - [`MomentError::ShapeMismatch`] if the lengths differ.
///
/// # Examples
/// ```
/// use beam_moments::stats::cov_two_pass;
/// let x = [1.0, 2.0, 3.0, 4.0, 5.0];
/// let y = [2.0, 4.0, 6.0, 8.0, 10.0];
/// assert!((cov_two_pass(&x, &y).unwrap() - 4.0).abs() < 1e-14);
/// ```
pub fn cov_two_pass(a: &[f64], b: &[f64]) -> Result<f64, MomentError> {
    let n = check_pair(a, b)?;
    let mean_a = shifted_mean(a);
    let mean_b = shifted_mean(b);
    let sum = neumaier(a.iter().zip(b).map(|(&x, &y)| (x - mean_a) * (y - mean_b)));
    Ok(sum / n as f64)
}

/// Computes the population covariance in a single traversal.
///
/// # Algorithm
/// Maintains running means `āₙ`, `b̄ₙ` and the co-moment
/// ```text
/// Cₙ = Cₙ₋₁ + (aₙ − āₙ₋₁)(bₙ − b̄ₙ)
/// ```
/// and returns `C_N / N`. No deviation arrays are materialized and each
/// input is read exactly once.
///
/// Agrees with [`cov_two_pass`] to floating-point accumulation error.
///
/// # Complexity
/// Time: O(n), Space: O(1)
///
/// # Errors
/// - [`MomentError::EmptyInput`] if either slice is empty.
/// - [`MomentError::ShapeMismatch`] if the lengths differ.
///
/// # Examples
/// ```
/// use beam_moments::stats::{cov_one_pass, cov_two_pass};
/// let x = [1.0, 2.0, 3.0, 4.0, 5.0];
/// let y = [1.5, 0.5, 4.0, 2.0, 3.5];
/// let one = cov_one_pass(&x, &y).unwrap();
/// let two = cov_two_pass(&x, &y).unwrap();
/// assert!((one - two).abs() < 1e-14);
/// ```
pub fn cov_one_pass(a: &[f64], b: &[f64]) -> Result<f64, MomentError> {
    let n = check_pair(a, b)?;
    let mut acc = CoMoment::new();
    for (&x, &y) in a.iter().zip(b) {
        acc.update(x, y);
    }
    Ok(acc.comoment / n as f64)
}

/// Number of samples per partial accumulator in [`cov_one_pass_par`].
///
/// Chunk boundaries depend only on this constant, never on the thread
/// count, so repeated calls give bit-identical results.
#[cfg(feature = "parallel")]
pub const PAR_CHUNK_LEN: usize = 1 << 16;

/// Parallel variant of [`cov_one_pass`].
///
/// Each chunk of [`PAR_CHUNK_LEN`] samples is reduced with the one-pass
/// update on the rayon pool. The partial accumulators are then combined
/// in chunk order with Chan's pairwise formula
/// ```text
/// C_AB = C_A + C_B + δa·δb·n_A·n_B / n_AB
/// ```
///
/// Reference: Chan, Golub & LeVeque (1979), "Updating Formulae and a
/// Pairwise Algorithm for Computing Sample Variances".
///
/// # Errors
/// Same as [`cov_one_pass`].
#[cfg(feature = "parallel")]
pub fn cov_one_pass_par(a: &[f64], b: &[f64]) -> Result<f64, MomentError> {
    let n = check_pair(a, b)?;
    tracing::trace!(
        len = n,
        chunks = n.div_ceil(PAR_CHUNK_LEN),
        "parallel co-moment reduction"
    );
    let partials: Vec<CoMoment> = a
        .par_chunks(PAR_CHUNK_LEN)
        .zip(b.par_chunks(PAR_CHUNK_LEN))
        .map(|(ca, cb)| {
            let mut acc = CoMoment::new();
            for (&x, &y) in ca.iter().zip(cb) {
                acc.update(x, y);
            }
            acc
        })
        .collect();
    let total = partials.into_iter().fold(CoMoment::new(), |mut acc, part| {
        acc.merge(&part);
        acc
    });
    Ok(total.comoment / n as f64)
}

// ---------------------------------------------------------------------------
// Neumaier compensated summation
// ---------------------------------------------------------------------------

/// Neumaier compensated summation for O(ε) error independent of `n`.
///
/// An improved Kahan summation that also handles an addend larger in
/// magnitude than the running sum.
///
/// Reference: Neumaier (1974), "Rundungsfehleranalyse einiger Verfahren
/// zur Summation endlicher Summen", *ZAMM* 54(1), pp. 39–51.
///
/// # Complexity
/// Time: O(n), Space: O(1)
///
/// # Examples
/// ```
/// use beam_moments::stats::kahan_sum;
/// assert_eq!(kahan_sum(&[1e16, 1.0, -1e16]), 1.0);
/// ```
pub fn kahan_sum(data: &[f64]) -> f64 {
    neumaier(data.iter().copied())
}

fn neumaier(values: impl Iterator<Item = f64>) -> f64 {
    let mut acc = CompensatedSum::new();
    for x in values {
        acc.add(x);
    }
    acc.total()
}

/// Running Neumaier sum, for loops that accumulate several sums at once.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct CompensatedSum {
    sum: f64,
    c: f64,
}

impl CompensatedSum {
    pub(crate) fn new() -> Self {
        Self { sum: 0.0, c: 0.0 }
    }

    #[inline]
    pub(crate) fn add(&mut self, x: f64) {
        let t = self.sum + x;
        if self.sum.abs() >= x.abs() {
            self.c += (self.sum - t) + x;
        } else {
            self.c += (x - t) + self.sum;
        }
        self.sum = t;
    }

    pub(crate) fn total(&self) -> f64 {
        self.sum + self.c
    }
}

// ---------------------------------------------------------------------------
// Welford co-moment accumulator
// ---------------------------------------------------------------------------

/// Running means and co-moment of a pair of sample streams.
///
/// Lives only for the duration of one covariance call.
#[derive(Debug, Clone)]
pub(crate) struct CoMoment {
    count: u64,
    mean_a: f64,
    mean_b: f64,
    comoment: f64,
}

impl CoMoment {
    pub(crate) fn new() -> Self {
        Self {
            count: 0,
            mean_a: 0.0,
            mean_b: 0.0,
            comoment: 0.0,
        }
    }

    /// Feeds one `(a, b)` pair.
    ///
    /// The `a` deviation is taken against the *previous* mean and the `b`
    /// deviation against the *updated* mean; this ordering makes the
    /// co-moment exact for `a == b` (it reduces to Welford's M₂).
    pub(crate) fn update(&mut self, a: f64, b: f64) {
        self.count += 1;
        let n = self.count as f64;
        let delta_a = a - self.mean_a;
        self.mean_a += delta_a / n;
        self.mean_b += (b - self.mean_b) / n;
        self.comoment += delta_a * (b - self.mean_b);
    }

    /// Merges another accumulator into this one (Chan's parallel formula).
    #[cfg_attr(not(any(test, feature = "parallel")), allow(dead_code))]
    pub(crate) fn merge(&mut self, other: &CoMoment) {
        if other.count == 0 {
            return;
        }
        if self.count == 0 {
            *self = other.clone();
            return;
        }
        let na = self.count as f64;
        let nb = other.count as f64;
        let total = self.count + other.count;
        let n = total as f64;
        let delta_a = other.mean_a - self.mean_a;
        let delta_b = other.mean_b - self.mean_b;

        self.mean_a += delta_a * (nb / n);
        self.mean_b += delta_b * (nb / n);
        self.comoment += other.comoment + delta_a * delta_b * (na * nb / n);
        self.count = total;
    }
}

impl Default for CoMoment {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

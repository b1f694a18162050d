//! Emittance, dispersion and Twiss parameters of a conjugate coordinate pair.
//!
//! For a position-like coordinate `u` and its divergence `up`, all
//! quantities here derive from the population second-moment matrix
//!
//! ```text
//!     ⎡ ⟨Δu²⟩     ⟨Δu·Δup⟩ ⎤
//! Σ = ⎣ ⟨Δu·Δup⟩  ⟨Δup²⟩   ⎦
//! ```
//!
//! where `Δ` denotes the deviation from the (optionally weighted) mean.
//! The rms emittance is `sqrt(det Σ)`.
//!
//! Two emittance formulations are provided and are expected to agree:
//! [`emittance`] goes through an explicit [`SecondMoments`] matrix built from
//! two-pass covariances, [`emittance_old`] is the legacy single-sweep
//! expansion from raw moments.

use crate::stats::{check_pair, cov_two_pass, CompensatedSum, MomentError};

/// Central second moments of a `(u, up)` pair.
///
/// A plain value: building one reads the samples once and keeps nothing
/// but these three numbers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SecondMoments {
    /// `⟨Δu²⟩`
    pub uu: f64,
    /// `⟨Δu·Δup⟩`
    pub uup: f64,
    /// `⟨Δup²⟩`
    pub upup: f64,
}

impl SecondMoments {
    /// Computes the population second moments of `u` and `up`.
    ///
    /// With `weights`, every average is a weighted average normalized by
    /// `Σw`; the weights do not need to sum to one.
    ///
    /// # Errors
    /// - [`MomentError::EmptyInput`] if `u` or `up` is empty.
    /// - [`MomentError::ShapeMismatch`] if `u`, `up` and `weights` differ
    ///   in length.
    /// - [`MomentError::DegenerateInput`] if a weight is negative or
    ///   non-finite, or all weights are zero.
    pub fn from_samples(
        u: &[f64],
        up: &[f64],
        weights: Option<&[f64]>,
    ) -> Result<Self, MomentError> {
        let n = check_pair(u, up)?;
        match weights {
            None => Ok(Self {
                uu: cov_two_pass(u, u)?,
                uup: cov_two_pass(u, up)?,
                upup: cov_two_pass(up, up)?,
            }),
            Some(w) => {
                let total = weight_total(w, n)?;
                let mean_u = weighted_mean(u, w, total);
                let mean_up = weighted_mean(up, w, total);
                let mut uu = CompensatedSum::new();
                let mut uup = CompensatedSum::new();
                let mut upup = CompensatedSum::new();
                for ((&x, &xp), &wi) in u.iter().zip(up).zip(w) {
                    let du = x - mean_u;
                    let dup = xp - mean_up;
                    uu.add(wi * du * du);
                    uup.add(wi * du * dup);
                    upup.add(wi * dup * dup);
                }
                Ok(Self {
                    uu: uu.total() / total,
                    uup: uup.total() / total,
                    upup: upup.total() / total,
                })
            }
        }
    }

    /// `⟨Δu²⟩⟨Δup²⟩ − ⟨Δu·Δup⟩²`. May round to a tiny negative value for
    /// fully correlated samples.
    pub fn determinant(&self) -> f64 {
        self.uu * self.upup - self.uup * self.uup
    }

    /// rms emittance, `sqrt(det)` with the determinant clamped at zero.
    pub fn emittance(&self) -> f64 {
        self.determinant().max(0.0).sqrt()
    }
}

/// Validates `weights` against the sample length and returns `Σw`.
fn weight_total(weights: &[f64], n: usize) -> Result<f64, MomentError> {
    if weights.len() != n {
        return Err(MomentError::ShapeMismatch {
            expected: n,
            found: weights.len(),
        });
    }
    if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
        tracing::debug!(len = n, "rejecting negative or non-finite weights");
        return Err(MomentError::DegenerateInput(
            "weights must be finite and non-negative",
        ));
    }
    let mut total = CompensatedSum::new();
    for &w in weights {
        total.add(w);
    }
    let total = total.total();
    if total <= 0.0 {
        tracing::debug!(len = n, "rejecting all-zero weights");
        return Err(MomentError::DegenerateInput("weights sum to zero"));
    }
    Ok(total)
}

fn weighted_mean(data: &[f64], weights: &[f64], total: f64) -> f64 {
    let pivot = data[0];
    let mut sum = CompensatedSum::new();
    for (&x, &w) in data.iter().zip(weights) {
        sum.add(w * (x - pivot));
    }
    pivot + sum.total() / total
}

/// Computes the rms emittance of a conjugate pair from its covariance matrix.
///
/// # Formula
/// ```text
/// ε = sqrt(Var(u)·Var(up) − Cov(u, up)²)
/// ```
/// with population moments, weighted when `weights` is given.
///
/// The result is never negative. `0.0` means a degenerate distribution
/// (zero spread, or `up` an exact linear function of `u`) and is not an
/// error.
///
/// # Errors
/// - [`MomentError::EmptyInput`] if `u` or `up` is empty.
/// - [`MomentError::ShapeMismatch`] on differing lengths.
/// - [`MomentError::DegenerateInput`] for invalid weights.
///
/// # Examples
/// ```
/// use beam_moments::emittance::emittance;
/// let u = [1.0, 2.0, 3.0, 4.0];
/// let up = [1.0, 3.0, 2.0, 4.0];
/// let eps = emittance(&u, &up, None).unwrap();
/// assert!((eps - 0.75).abs() < 1e-14);
///
/// // Uniform weights change nothing.
/// let w = [2.0; 4];
/// let eps_w = emittance(&u, &up, Some(&w)).unwrap();
/// assert!((eps - eps_w).abs() < 1e-14);
/// ```
pub fn emittance(u: &[f64], up: &[f64], weights: Option<&[f64]>) -> Result<f64, MomentError> {
    SecondMoments::from_samples(u, up, weights).map(|m| m.emittance())
}

/// Legacy emittance formulation.
///
/// One sweep accumulates raw first and second moments about the first
/// sample `(u₀, up₀)`; the central moments and the determinant are then
/// expanded algebraically:
/// ```text
/// ⟨Δu²⟩     = ⟨(u−u₀)²⟩ − ⟨u−u₀⟩²
/// ⟨Δup²⟩    = ⟨(up−up₀)²⟩ − ⟨up−up₀⟩²
/// ⟨Δu·Δup⟩  = ⟨(u−u₀)(up−up₀)⟩ − ⟨u−u₀⟩⟨up−up₀⟩
/// ε         = sqrt(⟨Δu²⟩⟨Δup²⟩ − ⟨Δu·Δup⟩²)
/// ```
/// All five sums are compensated. No weighting.
///
/// Agrees with [`emittance`]`(u, up, None)` to floating-point accumulation
/// error and is kept as the reference it is validated against.
///
/// # Errors
/// - [`MomentError::EmptyInput`] if `u` or `up` is empty.
/// - [`MomentError::ShapeMismatch`] on differing lengths.
///
/// # Examples
/// ```
/// use beam_moments::emittance::{emittance, emittance_old};
/// let u = [0.3, -1.2, 0.8, 2.1, -0.4];
/// let up = [0.01, 0.05, -0.02, 0.03, 0.0];
/// let new = emittance(&u, &up, None).unwrap();
/// let old = emittance_old(&u, &up).unwrap();
/// assert!((new - old).abs() < 1e-12);
/// ```
pub fn emittance_old(u: &[f64], up: &[f64]) -> Result<f64, MomentError> {
    let n = check_pair(u, up)?;
    let (u0, up0) = (u[0], up[0]);

    let mut s_u = CompensatedSum::new();
    let mut s_up = CompensatedSum::new();
    let mut s_uu = CompensatedSum::new();
    let mut s_upup = CompensatedSum::new();
    let mut s_uup = CompensatedSum::new();
    for (&x, &xp) in u.iter().zip(up) {
        let du = x - u0;
        let dup = xp - up0;
        s_u.add(du);
        s_up.add(dup);
        s_uu.add(du * du);
        s_upup.add(dup * dup);
        s_uup.add(du * dup);
    }

    let nf = n as f64;
    let m_u = s_u.total() / nf;
    let m_up = s_up.total() / nf;
    let u2 = s_uu.total() / nf - m_u * m_u;
    let up2 = s_upup.total() / nf - m_up * m_up;
    let uup = s_uup.total() / nf - m_u * m_up;

    Ok((u2 * up2 - uup * uup).max(0.0).sqrt())
}

/// Computes the dispersion-like slope of `up` against `dp`.
///
/// # Formula
/// ```text
/// D = Cov(up, dp) / Var(dp)
/// ```
/// i.e. the least-squares regression coefficient of `up` on `dp`.
///
/// # Errors
/// - [`MomentError::EmptyInput`] if either slice is empty.
/// - [`MomentError::ShapeMismatch`] on differing lengths.
/// - [`MomentError::DegenerateInput`] if `dp` has zero variance.
///
/// # Examples
/// ```
/// use beam_moments::emittance::dispersion;
/// let dp = [-2e-3, -1e-3, 0.0, 1e-3, 2e-3];
/// let xp: Vec<f64> = dp.iter().map(|d| 4.0 * d + 1e-5).collect();
/// assert!((dispersion(&xp, &dp).unwrap() - 4.0).abs() < 1e-9);
/// assert!(dispersion(&xp, &[1e-3; 5]).is_err());
/// ```
pub fn dispersion(up: &[f64], dp: &[f64]) -> Result<f64, MomentError> {
    let n = check_pair(up, dp)?;
    let var_dp = cov_two_pass(dp, dp)?;
    if var_dp == 0.0 {
        tracing::debug!(len = n, "dispersion undefined for constant dp");
        return Err(MomentError::DegenerateInput("dp has zero variance"));
    }
    Ok(cov_two_pass(up, dp)? / var_dp)
}

/// Computes the rms emittance with the linear dispersive contribution of
/// `dp` removed from every second moment.
///
/// # Formula
/// ```text
/// ⟨Δu²⟩'    = ⟨Δu²⟩    − ⟨Δu·Δdp⟩² / ⟨Δdp²⟩
/// ⟨Δup²⟩'   = ⟨Δup²⟩   − ⟨Δup·Δdp⟩² / ⟨Δdp²⟩
/// ⟨Δu·Δup⟩' = ⟨Δu·Δup⟩ − ⟨Δu·Δdp⟩⟨Δup·Δdp⟩ / ⟨Δdp²⟩
/// ```
/// and returns `sqrt(det)` of the corrected matrix. For a beam with
/// `u = u_β + D·dp`, `up = up_β + D'·dp` and betatron parts uncorrelated
/// with `dp`, this recovers the betatron emittance.
///
/// # Errors
/// - [`MomentError::EmptyInput`] if any slice is empty.
/// - [`MomentError::ShapeMismatch`] on differing lengths.
/// - [`MomentError::DegenerateInput`] if `dp` has zero variance.
pub fn emittance_dispersion_corrected(
    u: &[f64],
    up: &[f64],
    dp: &[f64],
) -> Result<f64, MomentError> {
    let n = check_pair(u, up)?;
    check_pair(u, dp)?;
    let dd = cov_two_pass(dp, dp)?;
    if dd == 0.0 {
        tracing::debug!(len = n, "dispersion correction undefined for constant dp");
        return Err(MomentError::DegenerateInput("dp has zero variance"));
    }
    let m = SecondMoments::from_samples(u, up, None)?;
    let u_dp = cov_two_pass(u, dp)?;
    let up_dp = cov_two_pass(up, dp)?;
    let corrected = SecondMoments {
        uu: m.uu - u_dp * u_dp / dd,
        uup: m.uup - u_dp * up_dp / dd,
        upup: m.upup - up_dp * up_dp / dd,
    };
    Ok(corrected.emittance())
}

fn twiss_moments(u: &[f64], up: &[f64]) -> Result<(SecondMoments, f64), MomentError> {
    let m = SecondMoments::from_samples(u, up, None)?;
    let eps = m.emittance();
    if eps == 0.0 {
        tracing::debug!(len = u.len(), "Twiss parameters undefined at zero emittance");
        return Err(MomentError::DegenerateInput("zero emittance"));
    }
    Ok((m, eps))
}

/// Statistical Twiss beta, `⟨Δu²⟩ / ε`.
///
/// # Errors
/// As [`emittance`], plus [`MomentError::DegenerateInput`] when the
/// emittance is zero.
pub fn twiss_beta(u: &[f64], up: &[f64]) -> Result<f64, MomentError> {
    twiss_moments(u, up).map(|(m, eps)| m.uu / eps)
}

/// Statistical Twiss alpha, `−⟨Δu·Δup⟩ / ε`.
///
/// # Errors
/// Same as [`twiss_beta`].
pub fn twiss_alpha(u: &[f64], up: &[f64]) -> Result<f64, MomentError> {
    twiss_moments(u, up).map(|(m, eps)| -m.uup / eps)
}

/// Statistical Twiss gamma, `⟨Δup²⟩ / ε`.
///
/// # Errors
/// Same as [`twiss_beta`].
pub fn twiss_gamma(u: &[f64], up: &[f64]) -> Result<f64, MomentError> {
    twiss_moments(u, up).map(|(m, eps)| m.upup / eps)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! Shared fixtures for the beam-moments integration tests.
//!
//! This module provides:
//! - A linear longitudinal map exposing `eta`, `circumference` and `Qs`
//! - A 6D Gaussian bunch generator parameterized by Twiss optics
//! - Moment-matched normal draws for exact-variance scenarios
//!
//! None of this is part of the library: the engine only ever sees the
//! coordinate arrays these fixtures produce.

#![allow(dead_code)]

use beam_moments::random::normal_samples;
use beam_moments::stats::{mean, std};
use rand::Rng;

// =============================================================================
// Physical constants (CODATA 2018)
// =============================================================================

/// Speed of light [m/s].
pub const C_LIGHT: f64 = 299_792_458.0;
/// Elementary charge [C].
pub const E_CHARGE: f64 = 1.602_176_634e-19;
/// Proton mass [kg].
pub const M_PROTON: f64 = 1.672_621_923_69e-27;

// =============================================================================
// Longitudinal map
// =============================================================================

/// Linear synchrotron map reduced to the parameters a bunch generator needs.
#[derive(Debug, Clone)]
pub struct LinearMap {
    /// Momentum compaction factors, lowest order first.
    pub alpha_array: Vec<f64>,
    pub circumference: f64,
    /// Synchrotron tune.
    pub qs: f64,
}

impl LinearMap {
    pub fn new(alpha_array: Vec<f64>, circumference: f64, qs: f64) -> Self {
        Self {
            alpha_array,
            circumference,
            qs,
        }
    }

    /// Slip factor `η(δ) = η₀ + η₁δ + …` with `η₀ = α₀ − 1/γ²` and
    /// `ηᵢ = αᵢ` for the higher orders.
    pub fn eta(&self, dp: f64, gamma: f64) -> f64 {
        let mut eta = 0.0;
        let mut power = 1.0;
        for (i, &alpha) in self.alpha_array.iter().enumerate() {
            let coefficient = if i == 0 { alpha - gamma.powi(-2) } else { alpha };
            eta += coefficient * power;
            power *= dp;
        }
        eta
    }

    /// Longitudinal beta function `η·C / (2π·Qs)` at the reference momentum.
    pub fn beta_z(&self, gamma: f64) -> f64 {
        self.eta(0.0, gamma) * self.circumference / (2.0 * std::f64::consts::PI * self.qs)
    }
}

// =============================================================================
// 6D Gaussian bunch
// =============================================================================

/// Phase-space coordinate arrays of one bunch.
#[derive(Debug, Clone)]
pub struct Bunch {
    pub x: Vec<f64>,
    pub xp: Vec<f64>,
    pub y: Vec<f64>,
    pub yp: Vec<f64>,
    pub z: Vec<f64>,
    pub dp: Vec<f64>,
}

impl Bunch {
    pub fn len(&self) -> usize {
        self.x.len()
    }
}

/// Matched Gaussian bunch described by Twiss parameters and normalized
/// emittances.
///
/// Transverse emittances are in [m·rad]; the longitudinal one in [eV·s].
#[derive(Debug, Clone)]
pub struct Gaussian6DTwiss {
    pub macroparticles: usize,
    pub gamma: f64,
    pub mass: f64,
    pub alpha_x: f64,
    pub beta_x: f64,
    pub epsn_x: f64,
    pub alpha_y: f64,
    pub beta_y: f64,
    pub epsn_y: f64,
    pub beta_z: f64,
    pub epsn_z: f64,
}

impl Gaussian6DTwiss {
    /// Relativistic `βγ` of the reference particle.
    pub fn beta_gamma(&self) -> f64 {
        (self.gamma * self.gamma - 1.0).sqrt()
    }

    /// Reference momentum [kg·m/s].
    pub fn p0(&self) -> f64 {
        self.beta_gamma() * self.mass * C_LIGHT
    }

    /// Geometric horizontal emittance [m·rad].
    pub fn eps_x(&self) -> f64 {
        self.epsn_x / self.beta_gamma()
    }

    /// Draws the bunch.
    ///
    /// After sampling, every transverse coordinate is projected onto the
    /// complement of `dp` so that the *sample* carries no dispersion, not
    /// just the underlying distribution. Without this, the finite-sample
    /// correlation of independent draws (≈ 1/√N) would dominate the
    /// dispersion diagnostics.
    pub fn generate<R: Rng>(&self, rng: &mut R) -> Bunch {
        let n = self.macroparticles;
        let (x, xp) = transverse(n, self.alpha_x, self.beta_x, self.eps_x(), rng);
        let (y, yp) = transverse(
            n,
            self.alpha_y,
            self.beta_y,
            self.epsn_y / self.beta_gamma(),
            rng,
        );

        let eps_z = self.epsn_z * E_CHARGE / (4.0 * std::f64::consts::PI * self.p0());
        let sigma_z = (eps_z * self.beta_z).sqrt();
        let sigma_dp = (eps_z / self.beta_z).sqrt();
        let z = normal_samples(n, 0.0, sigma_z, rng).expect("finite longitudinal sigma");
        let dp = normal_samples(n, 0.0, sigma_dp, rng).expect("finite longitudinal sigma");

        Bunch {
            x: decorrelate(&x, &dp),
            xp: decorrelate(&xp, &dp),
            y: decorrelate(&y, &dp),
            yp: decorrelate(&yp, &dp),
            z,
            dp,
        }
    }
}

fn transverse<R: Rng>(
    n: usize,
    alpha: f64,
    beta: f64,
    eps: f64,
    rng: &mut R,
) -> (Vec<f64>, Vec<f64>) {
    let u = normal_samples(n, 0.0, (eps * beta).sqrt(), rng).expect("finite emittance");
    let up_free = normal_samples(n, 0.0, (eps / beta).sqrt(), rng).expect("finite emittance");
    let up = u
        .iter()
        .zip(&up_free)
        .map(|(&u, &p)| p - alpha / beta * u)
        .collect();
    (u, up)
}

/// Removes the least-squares component of `dp` from `u`.
///
/// The slope comes from explicit sums about the sample means, so the
/// fixture does not lean on the estimators it is used to test.
fn decorrelate(u: &[f64], dp: &[f64]) -> Vec<f64> {
    let n = dp.len() as f64;
    let mean_u = u.iter().sum::<f64>() / n;
    let mean_dp = dp.iter().sum::<f64>() / n;
    let (mut s_udp, mut s_dpdp) = (0.0, 0.0);
    for (&x, &d) in u.iter().zip(dp) {
        s_udp += (x - mean_u) * (d - mean_dp);
        s_dpdp += (d - mean_dp) * (d - mean_dp);
    }
    assert!(s_dpdp > 0.0, "dp has no spread");
    let slope = s_udp / s_dpdp;
    u.iter()
        .zip(dp)
        .map(|(&x, &d)| x - slope * (d - mean_dp))
        .collect()
}

/// LHC-like proton bunch at 3.5 TeV with the requested transverse optics
/// and with the dispersion `dispx`/`dispy` added to the positions.
#[allow(clippy::too_many_arguments)]
pub fn generate_gaussian6d_bunch<R: Rng>(
    n_macroparticles: usize,
    alpha_x: f64,
    alpha_y: f64,
    beta_x: f64,
    beta_y: f64,
    dispx: f64,
    dispy: f64,
    rng: &mut R,
) -> Bunch {
    let gamma = 3730.27;
    let qs = 0.0020443;
    let circumference = 26658.883;
    let linear_map = LinearMap::new(vec![0.0003225], circumference, qs);

    let sigma_z = 0.0059958;
    let p0 = (gamma * gamma - 1.0_f64).sqrt() * M_PROTON * C_LIGHT;
    let beta_z = linear_map.beta_z(gamma);
    let epsn_z = 4.0 * std::f64::consts::PI * sigma_z * sigma_z * p0 / (beta_z * E_CHARGE);

    let mut bunch = Gaussian6DTwiss {
        macroparticles: n_macroparticles,
        gamma,
        mass: M_PROTON,
        alpha_x,
        beta_x,
        epsn_x: 3.75e-6,
        alpha_y,
        beta_y,
        epsn_y: 3.75e-6,
        beta_z,
        epsn_z,
    }
    .generate(rng);

    for i in 0..bunch.len() {
        bunch.x[i] += dispx * bunch.dp[i];
        bunch.y[i] += dispy * bunch.dp[i];
    }
    bunch
}

// =============================================================================
// Exact-moment draws
// =============================================================================

/// Normal draws rescaled so that the sample mean is `mu` and the sample
/// population standard deviation is `sigma`, up to rounding.
pub fn matched_normal<R: Rng>(n: usize, mu: f64, sigma: f64, rng: &mut R) -> Vec<f64> {
    let raw = normal_samples(n, 0.0, 1.0, rng).expect("valid parameters");
    let m = mean(&raw).expect("non-empty");
    let s = std(&raw).expect("non-empty");
    raw.iter().map(|&v| mu + sigma * (v - m) / s).collect()
}

/// `|a − b| < 0.5·10⁻ᵖˡᵃᶜᵉˢ`, the "equal to N decimal places" check.
pub fn assert_almost_equal(a: f64, b: f64, places: i32, msg: &str) {
    let tol = 0.5 * 10f64.powi(-places);
    assert!(
        (a - b).abs() < tol,
        "{msg}: {a} and {b} differ by {} (> {tol})",
        (a - b).abs()
    );
}

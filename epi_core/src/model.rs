//! Exposure-response models.
//!
//! An exposure-response model maps a pollutant concentration to a hazard
//! ratio: the relative risk of a health outcome at that concentration versus
//! zero exposure. This module provides:
//! - The [`ExposureResponse`] capability used by the incidence engine
//! - The non-linear [`Nasari`] family and its ACS calibration ([`NASARI_ACS`])
//! - The simple [`LogLinear`] and [`Linear`] sibling families
//! - [`ModelSpec`], a serializable description of any of the above

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// A model that maps concentration `z` to a hazard ratio.
pub trait ExposureResponse: Send + Sync {
    /// Hazard ratio at concentration `z`, relative to zero exposure.
    fn hr(&self, z: f64) -> f64;
}

impl<T: ExposureResponse + ?Sized> ExposureResponse for &T {
    fn hr(&self, z: f64) -> f64 {
        (**self).hr(z)
    }
}

impl<T: ExposureResponse + ?Sized> ExposureResponse for Box<T> {
    fn hr(&self, z: f64) -> f64 {
        (**self).hr(z)
    }
}

// ============================================================================
// Concentration transforms
// ============================================================================

/// Concentration transformation `F(z)` applied inside the Nasari form.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transform {
    /// `F(z) = ln(z + 1)`
    #[default]
    LogPlusOne,
    /// `F(z) = z`
    Identity,
    /// Caller-supplied transform. Cannot be written to or read from config.
    #[serde(skip)]
    Custom(fn(f64) -> f64),
}

impl Transform {
    /// Apply the transform to concentration `z`.
    #[inline]
    pub fn apply(&self, z: f64) -> f64 {
        match self {
            // Written as ln(z + 1) rather than ln_1p so calibrated reference
            // values reproduce bit-for-bit.
            Transform::LogPlusOne => (z + 1.0).ln(),
            Transform::Identity => z,
            Transform::Custom(f) => f(z),
        }
    }
}

// ============================================================================
// Nasari family
// ============================================================================

/// Non-linear exposure-response model of the Nasari et al. (2016) class:
///
/// `HR(z) = exp(γ·F(z) / (1 + exp(−(z − δ)/λ)))`
///
/// The logistic factor saturates the response at high concentration.
///
/// Nasari M, Szyszkowicz M, Chen H, et al. (2016). A Class of Non-Linear
/// Exposure-Response Models Suitable for Health Impact Assessment Applicable
/// to Large Cohort Studies of Ambient Air Pollution. Air Quality, Atmosphere,
/// and Health. DOI: 10.1007/s11869-016-0398-z.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(try_from = "NasariParams")]
pub struct Nasari {
    gamma: f64,
    delta: f64,
    lambda: f64,
    transform: Transform,
}

/// Nasari fit to the American Cancer Society Cancer Prevention II cohort,
/// all-cause mortality from fine particulate matter (PM2.5, µg/m³).
pub const NASARI_ACS: Nasari = Nasari {
    gamma: 0.0478,
    delta: 6.94,
    lambda: 3.37,
    transform: Transform::LogPlusOne,
};

impl Nasari {
    /// Build a Nasari model, rejecting parameters that cannot produce a
    /// well-defined hazard ratio.
    ///
    /// Fails with [`Error::InvalidModel`] if:
    /// - any coefficient is NaN or infinite
    /// - `lambda` is zero (it divides the logistic exponent)
    /// - the transform is undefined at zero concentration
    pub fn new(gamma: f64, delta: f64, lambda: f64, transform: Transform) -> Result<Self> {
        for (name, value) in [("gamma", gamma), ("delta", delta), ("lambda", lambda)] {
            if !value.is_finite() {
                return Err(Error::InvalidModel(format!(
                    "Nasari {} must be finite, got {}",
                    name, value
                )));
            }
        }

        if lambda == 0.0 {
            return Err(Error::InvalidModel("Nasari lambda must be non-zero".into()));
        }

        let f0 = transform.apply(0.0);
        if !f0.is_finite() {
            return Err(Error::InvalidModel(format!(
                "concentration transform is undefined at zero (F(0) = {})",
                f0
            )));
        }

        Ok(Self {
            gamma,
            delta,
            lambda,
            transform,
        })
    }

    /// The ACS CPS-II PM2.5 all-cause calibration.
    pub const fn acs() -> Self {
        NASARI_ACS
    }

    pub fn gamma(&self) -> f64 {
        self.gamma
    }

    pub fn delta(&self) -> f64 {
        self.delta
    }

    pub fn lambda(&self) -> f64 {
        self.lambda
    }

    pub fn transform(&self) -> Transform {
        self.transform
    }
}

impl ExposureResponse for Nasari {
    #[inline]
    fn hr(&self, z: f64) -> f64 {
        let logistic = 1.0 + (-(z - self.delta) / self.lambda).exp();
        (self.gamma * self.transform.apply(z) / logistic).exp()
    }
}

#[derive(Deserialize)]
struct NasariParams {
    gamma: f64,
    delta: f64,
    lambda: f64,
    #[serde(default)]
    transform: Transform,
}

impl TryFrom<NasariParams> for Nasari {
    type Error = Error;

    fn try_from(p: NasariParams) -> Result<Self> {
        Nasari::new(p.gamma, p.delta, p.lambda, p.transform)
    }
}

// ============================================================================
// Simple families
// ============================================================================

/// Log-linear model: `HR(z) = exp(β·z)`.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(try_from = "LogLinearParams")]
pub struct LogLinear {
    beta: f64,
}

impl LogLinear {
    pub fn new(beta: f64) -> Result<Self> {
        if !beta.is_finite() {
            return Err(Error::InvalidModel(format!(
                "log-linear beta must be finite, got {}",
                beta
            )));
        }
        Ok(Self { beta })
    }

    pub fn beta(&self) -> f64 {
        self.beta
    }
}

impl ExposureResponse for LogLinear {
    #[inline]
    fn hr(&self, z: f64) -> f64 {
        (self.beta * z).exp()
    }
}

#[derive(Deserialize)]
struct LogLinearParams {
    beta: f64,
}

impl TryFrom<LogLinearParams> for LogLinear {
    type Error = Error;

    fn try_from(p: LogLinearParams) -> Result<Self> {
        LogLinear::new(p.beta)
    }
}

/// Linear model: `HR(z) = 1 + slope·z`.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(try_from = "LinearParams")]
pub struct Linear {
    slope: f64,
}

impl Linear {
    pub fn new(slope: f64) -> Result<Self> {
        if !slope.is_finite() {
            return Err(Error::InvalidModel(format!(
                "linear slope must be finite, got {}",
                slope
            )));
        }
        Ok(Self { slope })
    }

    pub fn slope(&self) -> f64 {
        self.slope
    }
}

impl ExposureResponse for Linear {
    #[inline]
    fn hr(&self, z: f64) -> f64 {
        1.0 + self.slope * z
    }
}

#[derive(Deserialize)]
struct LinearParams {
    slope: f64,
}

impl TryFrom<LinearParams> for Linear {
    type Error = Error;

    fn try_from(p: LinearParams) -> Result<Self> {
        Linear::new(p.slope)
    }
}

// ============================================================================
// Configurable model description
// ============================================================================

/// Any supported exposure-response model, as written in configuration.
///
/// ```toml
/// [model]
/// kind = "nasari"
/// gamma = 0.0478
/// delta = 6.94
/// lambda = 3.37
/// transform = "log_plus_one"
/// ```
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelSpec {
    Nasari(Nasari),
    LogLinear(LogLinear),
    Linear(Linear),
}

impl Default for ModelSpec {
    fn default() -> Self {
        ModelSpec::Nasari(NASARI_ACS)
    }
}

impl ExposureResponse for ModelSpec {
    fn hr(&self, z: f64) -> f64 {
        match self {
            ModelSpec::Nasari(m) => m.hr(z),
            ModelSpec::LogLinear(m) => m.hr(z),
            ModelSpec::Linear(m) => m.hr(z),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_nasari_acs_reference_values() {
        let cases = [
            (0.0, 1.0),
            (5.0, 1.031306668121412),
            (15.0, 1.1291019999220953),
            (25.0, 1.1676668889134683),
        ];

        for (z, want) in cases {
            assert_abs_diff_eq!(NASARI_ACS.hr(z), want, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_nasari_acs_zero_exposure_identity() {
        let acs = Nasari::acs();
        assert_eq!((acs.gamma(), acs.delta(), acs.lambda()), (0.0478, 6.94, 3.37));
        assert_abs_diff_eq!(acs.hr(0.0), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_nasari_acs_monotonic() {
        let mut prev = NASARI_ACS.hr(0.0);
        for i in 1..=2000 {
            let z = i as f64 * 0.1;
            let hr = NASARI_ACS.hr(z);
            assert!(hr > prev, "HR({}) = {} not above HR({}) = {}", z, hr, z - 0.1, prev);
            prev = hr;
        }
    }

    #[test]
    fn test_nasari_rejects_zero_lambda() {
        let result = Nasari::new(0.0478, 6.94, 0.0, Transform::LogPlusOne);
        assert!(matches!(result, Err(Error::InvalidModel(_))));
    }

    #[test]
    fn test_nasari_rejects_non_finite_coefficients() {
        assert!(Nasari::new(f64::NAN, 6.94, 3.37, Transform::LogPlusOne).is_err());
        assert!(Nasari::new(0.0478, f64::INFINITY, 3.37, Transform::LogPlusOne).is_err());
        assert!(Nasari::new(0.0478, 6.94, f64::NEG_INFINITY, Transform::LogPlusOne).is_err());
    }

    #[test]
    fn test_nasari_rejects_transform_undefined_at_zero() {
        let result = Nasari::new(0.0478, 6.94, 3.37, Transform::Custom(f64::ln));
        assert!(matches!(result, Err(Error::InvalidModel(_))));
    }

    #[test]
    fn test_nasari_custom_transform_matches_builtin() {
        fn log_plus_one(z: f64) -> f64 {
            (z + 1.0).ln()
        }
        let custom = Nasari::new(0.0478, 6.94, 3.37, Transform::Custom(log_plus_one)).unwrap();

        for z in [0.0, 3.0, 12.5, 40.0] {
            assert_eq!(custom.hr(z), NASARI_ACS.hr(z));
        }
    }

    #[test]
    fn test_nasari_deserialize_validates() {
        let ok: Nasari = toml::from_str("gamma = 0.0478\ndelta = 6.94\nlambda = 3.37").unwrap();
        assert_eq!(ok.lambda(), 3.37);
        assert!(matches!(ok.transform(), Transform::LogPlusOne));

        let bad: std::result::Result<Nasari, _> =
            toml::from_str("gamma = 0.0478\ndelta = 6.94\nlambda = 0.0");
        assert!(bad.is_err());
    }

    #[test]
    fn test_simple_families() {
        let log_linear = LogLinear::new(0.01).unwrap();
        assert_abs_diff_eq!(log_linear.hr(0.0), 1.0);
        assert_abs_diff_eq!(log_linear.hr(10.0), 0.1f64.exp(), epsilon = 1e-15);

        let linear = Linear::new(0.006).unwrap();
        assert_abs_diff_eq!(linear.hr(0.0), 1.0);
        assert_abs_diff_eq!(linear.hr(10.0), 1.06, epsilon = 1e-15);

        assert_eq!(log_linear.beta(), 0.01);
        assert_eq!(linear.slope(), 0.006);
        assert!(LogLinear::new(f64::NAN).is_err());
        assert!(Linear::new(f64::INFINITY).is_err());
    }

    #[test]
    fn test_model_spec_dispatch() {
        let models: Vec<Box<dyn ExposureResponse>> = vec![
            Box::new(ModelSpec::default()),
            Box::new(ModelSpec::LogLinear(LogLinear::new(0.01).unwrap())),
            Box::new(ModelSpec::Linear(Linear::new(0.006).unwrap())),
        ];

        for model in &models {
            assert_abs_diff_eq!(model.hr(0.0), 1.0, epsilon = 1e-12);
            assert!(model.hr(10.0) > 1.0);
        }
        assert_eq!(models[0].hr(15.0), NASARI_ACS.hr(15.0));
    }

    #[test]
    fn test_model_spec_from_toml() {
        let spec: ModelSpec = toml::from_str("kind = \"log_linear\"\nbeta = 0.0058").unwrap();
        assert!(matches!(spec, ModelSpec::LogLinear(m) if m.beta() == 0.0058));

        let spec: ModelSpec = toml::from_str(
            "kind = \"nasari\"\ngamma = 0.1\ndelta = 5.0\nlambda = 2.0\ntransform = \"identity\"",
        )
        .unwrap();
        match spec {
            ModelSpec::Nasari(m) => assert!(matches!(m.transform(), Transform::Identity)),
            other => panic!("Expected Nasari, got {:?}", other),
        }

        let bad: std::result::Result<ModelSpec, _> =
            toml::from_str("kind = \"nasari\"\ngamma = 0.1\ndelta = 5.0\nlambda = 0.0");
        assert!(bad.is_err());
    }
}

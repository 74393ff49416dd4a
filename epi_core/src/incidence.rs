//! Underlying incidence and attributable outcome calculations.
//!
//! Observed incidence already contains the effect of current pollution.
//! These functions back out the underlying (zero-exposure) incidence rate
//! from an exposure-response model, then apply it to a concentration to get
//! a count of attributable cases.
//!
//! Numeric degeneracy follows IEEE-754: [`underlying_incidence`] and
//! [`outcome`] never guard a zero hazard ratio. Only
//! [`underlying_incidence_regional`] defines a zero-weight or zero-HR region
//! as having zero underlying incidence.

use crate::{Error, ExposureResponse, Result};

/// Underlying incidence rate at a single representative concentration:
/// `Io = I / HR(z)`.
///
/// Prefer [`underlying_incidence_regional`] when several concentration
/// samples share one observed rate.
pub fn underlying_incidence<M>(z: f64, model: &M, observed: f64) -> f64
where
    M: ExposureResponse + ?Sized,
{
    observed / model.hr(z)
}

/// Underlying incidence rate for a region using population-weighted mean
/// hazard ratio (Apte et al. 2015):
///
/// `Io = I / (Σ pᵢ·HR(zᵢ) / Σ pᵢ)`
///
/// `populations[i]` is the population at the location with concentration
/// `concentrations[i]`. Returns `Ok(0.0)` when the total population is zero
/// (including empty input) or the weighted hazard ratio is zero.
///
/// # Errors
/// [`Error::LengthMismatch`] if the slices differ in length. Nothing is
/// evaluated in that case.
pub fn underlying_incidence_regional<M>(
    populations: &[f64],
    concentrations: &[f64],
    model: &M,
    observed: f64,
) -> Result<f64>
where
    M: ExposureResponse + ?Sized,
{
    if populations.len() != concentrations.len() {
        return Err(Error::LengthMismatch {
            populations: populations.len(),
            concentrations: concentrations.len(),
        });
    }

    let (p_sum, weighted_hr) = populations
        .iter()
        .zip(concentrations)
        .fold((0.0, 0.0), |(p_sum, hr_sum), (&p, &z)| {
            (p_sum + p, hr_sum + p * model.hr(z))
        });

    if p_sum == 0.0 {
        tracing::debug!(
            "Zero total population across {} locations, underlying incidence is 0",
            populations.len()
        );
        return Ok(0.0);
    }

    let hr_bar = weighted_hr / p_sum;
    if hr_bar == 0.0 {
        tracing::debug!("Population-weighted hazard ratio is 0, underlying incidence is 0");
        return Ok(0.0);
    }

    tracing::trace!(p_sum, hr_bar, "Regional underlying incidence");
    Ok(observed / hr_bar)
}

/// Number of cases attributable to concentration `z` in a population of
/// `population` with underlying incidence `io`:
///
/// `population · io · (HR(z) − 1)`
///
/// Negative when `HR(z) < 1`. Differences between two evaluations give the
/// marginal effect of a concentration change.
pub fn outcome<M>(population: f64, z: f64, io: f64, model: &M) -> f64
where
    M: ExposureResponse + ?Sized,
{
    population * io * (model.hr(z) - 1.0)
}

//! Health impact assessment over a set of locations.
//!
//! An [`Assessment`] ties a region's locations to one observed incidence
//! rate. It derives underlying incidence once from current concentrations
//! (regionally or per location) and then evaluates attributable outcomes for
//! the current concentrations and for scaled concentration scenarios.

use crate::incidence::{outcome, underlying_incidence, underlying_incidence_regional};
use crate::{Error, ExposureResponse, Result};
use serde::{Deserialize, Serialize};

/// Population and concentration at one location.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Location {
    #[serde(default)]
    pub name: Option<String>,
    pub population: f64,
    pub concentration: f64,
}

impl Location {
    pub fn new(population: f64, concentration: f64) -> Self {
        Self {
            name: None,
            population,
            concentration,
        }
    }
}

/// How underlying incidence is derived from the observed rate.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum IncidenceMethod {
    /// One rate for the whole region from the population-weighted hazard ratio
    #[default]
    Regional,
    /// A separate rate per location from that location's own concentration
    Local,
}

impl std::str::FromStr for IncidenceMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "regional" => Ok(IncidenceMethod::Regional),
            "local" => Ok(IncidenceMethod::Local),
            other => Err(Error::InvalidInput(format!(
                "unknown incidence method '{}' (expected regional or local)",
                other
            ))),
        }
    }
}

/// Attributable outcome at one location under current concentrations.
#[derive(Clone, Debug, Serialize)]
pub struct LocationImpact {
    pub name: Option<String>,
    pub population: f64,
    pub concentration: f64,
    pub underlying_incidence: f64,
    pub hazard_ratio: f64,
    pub attributable: f64,
}

/// Totals for one concentration scaling scenario.
#[derive(Clone, Debug, Serialize)]
pub struct ScenarioSummary {
    pub scale: f64,
    pub method: IncidenceMethod,
    pub baseline_total: f64,
    pub scenario_total: f64,
    /// `scenario_total - baseline_total`; negative means avoided cases.
    pub delta: f64,
}

/// Locations sharing a single observed incidence rate.
#[derive(Clone, Debug)]
pub struct Assessment {
    locations: Vec<Location>,
    observed_incidence: f64,
    method: IncidenceMethod,
}

impl Assessment {
    pub fn new(locations: Vec<Location>, observed_incidence: f64, method: IncidenceMethod) -> Self {
        Self {
            locations,
            observed_incidence,
            method,
        }
    }

    /// Build an assessment from parallel population/concentration slices.
    ///
    /// # Errors
    /// [`Error::LengthMismatch`] if the slices differ in length.
    pub fn from_parallel(
        populations: &[f64],
        concentrations: &[f64],
        observed_incidence: f64,
        method: IncidenceMethod,
    ) -> Result<Self> {
        if populations.len() != concentrations.len() {
            return Err(Error::LengthMismatch {
                populations: populations.len(),
                concentrations: concentrations.len(),
            });
        }

        let locations = populations
            .iter()
            .zip(concentrations)
            .map(|(&p, &z)| Location::new(p, z))
            .collect();

        Ok(Self::new(locations, observed_incidence, method))
    }

    pub fn locations(&self) -> &[Location] {
        &self.locations
    }

    pub fn method(&self) -> IncidenceMethod {
        self.method
    }

    /// Underlying incidence for each location, in location order.
    pub fn underlying_rates<M>(&self, model: &M) -> Result<Vec<f64>>
    where
        M: ExposureResponse + ?Sized,
    {
        match self.method {
            IncidenceMethod::Regional => {
                let (populations, concentrations): (Vec<f64>, Vec<f64>) = self
                    .locations
                    .iter()
                    .map(|l| (l.population, l.concentration))
                    .unzip();
                let io = underlying_incidence_regional(
                    &populations,
                    &concentrations,
                    model,
                    self.observed_incidence,
                )?;
                Ok(vec![io; self.locations.len()])
            }
            IncidenceMethod::Local => Ok(self
                .locations
                .iter()
                .map(|l| underlying_incidence(l.concentration, model, self.observed_incidence))
                .collect()),
        }
    }

    /// Attributable outcome per location at current concentrations.
    pub fn baseline<M>(&self, model: &M) -> Result<Vec<LocationImpact>>
    where
        M: ExposureResponse + ?Sized,
    {
        let rates = self.underlying_rates(model)?;

        Ok(self
            .locations
            .iter()
            .zip(rates)
            .map(|(l, io)| LocationImpact {
                name: l.name.clone(),
                population: l.population,
                concentration: l.concentration,
                underlying_incidence: io,
                hazard_ratio: model.hr(l.concentration),
                attributable: outcome(l.population, l.concentration, io, model),
            })
            .collect())
    }

    /// Compare attributable outcomes at `scale` times current concentration
    /// against current concentration.
    ///
    /// Underlying incidence is always derived from current concentrations.
    ///
    /// # Errors
    /// [`Error::InvalidInput`] if `scale` is negative or not finite.
    pub fn scenario<M>(&self, model: &M, scale: f64) -> Result<ScenarioSummary>
    where
        M: ExposureResponse + ?Sized,
    {
        if !scale.is_finite() || scale < 0.0 {
            return Err(Error::InvalidInput(format!(
                "concentration scale must be finite and non-negative, got {}",
                scale
            )));
        }

        let rates = self.underlying_rates(model)?;

        let (baseline_total, scenario_total) = self.locations.iter().zip(&rates).fold(
            (0.0, 0.0),
            |(base, scen), (l, &io)| {
                (
                    base + outcome(l.population, l.concentration, io, model),
                    scen + outcome(l.population, l.concentration * scale, io, model),
                )
            },
        );

        let delta = scenario_total - baseline_total;

        tracing::debug!(
            "Scenario x{} ({:?}, {} locations): baseline {:.3}, scenario {:.3}, delta {:+.3}",
            scale,
            self.method,
            self.locations.len(),
            baseline_total,
            scenario_total,
            delta
        );

        Ok(ScenarioSummary {
            scale,
            method: self.method,
            baseline_total,
            scenario_total,
            delta,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NASARI_ACS;
    use approx::assert_abs_diff_eq;

    const POPULATIONS: [f64; 4] = [100_000.0, 80_000.0, 700_000.0, 90_000.0];
    const CONCENTRATIONS: [f64; 4] = [12.0, 26.0, 11.0, 2.0];
    const OBSERVED: f64 = 800.0 / 100_000.0;

    fn reference(method: IncidenceMethod) -> Assessment {
        Assessment::from_parallel(&POPULATIONS, &CONCENTRATIONS, OBSERVED, method).unwrap()
    }

    #[test]
    fn test_regional_reference_scenario() {
        let assessment = reference(IncidenceMethod::Regional);

        let doubled = assessment.scenario(&NASARI_ACS, 2.0).unwrap();
        assert_eq!(doubled.baseline_total.round(), 672.0);
        assert_eq!(doubled.delta.round(), 403.0);
        assert_abs_diff_eq!(doubled.baseline_total, 672.3700169050982, epsilon = 1e-6);
        assert_abs_diff_eq!(doubled.delta, 402.5152768557356, epsilon = 1e-6);

        let halved = assessment.scenario(&NASARI_ACS, 0.5).unwrap();
        assert_eq!(halved.delta.round(), -389.0);
        assert_abs_diff_eq!(halved.delta, -388.60248606191556, epsilon = 1e-6);
    }

    #[test]
    fn test_local_reference_scenario() {
        let assessment = reference(IncidenceMethod::Local);

        let doubled = assessment.scenario(&NASARI_ACS, 2.0).unwrap();
        assert_eq!(doubled.baseline_total.round(), 665.0);
        assert_eq!(doubled.delta.round(), 401.0);
        assert_abs_diff_eq!(doubled.baseline_total, 665.4304798427498, epsilon = 1e-6);
    }

    #[test]
    fn test_baseline_matches_scenario_totals() {
        let assessment = reference(IncidenceMethod::Regional);
        let impacts = assessment.baseline(&NASARI_ACS).unwrap();
        assert_eq!(impacts.len(), assessment.locations().len());
        assert_eq!(assessment.method(), IncidenceMethod::Regional);

        let total: f64 = impacts.iter().map(|i| i.attributable).sum();
        let summary = assessment.scenario(&NASARI_ACS, 1.0).unwrap();
        assert_abs_diff_eq!(total, summary.baseline_total, epsilon = 1e-9);
        assert_abs_diff_eq!(summary.delta, 0.0);

        // Regional method shares one rate across locations.
        assert!(impacts
            .iter()
            .all(|i| i.underlying_incidence == impacts[0].underlying_incidence));
    }

    #[test]
    fn test_zero_scale_removes_all_attributable() {
        let assessment = reference(IncidenceMethod::Regional);
        let summary = assessment.scenario(&NASARI_ACS, 0.0).unwrap();
        assert_abs_diff_eq!(summary.scenario_total, 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(summary.delta, -summary.baseline_total, epsilon = 1e-9);
    }

    #[test]
    fn test_invalid_scale() {
        let assessment = reference(IncidenceMethod::Regional);
        assert!(matches!(
            assessment.scenario(&NASARI_ACS, -1.0),
            Err(Error::InvalidInput(_))
        ));
        assert!(assessment.scenario(&NASARI_ACS, f64::NAN).is_err());
    }

    #[test]
    fn test_from_parallel_length_mismatch() {
        let result = Assessment::from_parallel(
            &POPULATIONS,
            &[12.0, 26.0, 11.0, 2.0, 5.0],
            OBSERVED,
            IncidenceMethod::Regional,
        );
        assert!(matches!(result, Err(Error::LengthMismatch { .. })));
    }

    #[test]
    fn test_empty_assessment() {
        let assessment = Assessment::new(vec![], OBSERVED, IncidenceMethod::Regional);
        let summary = assessment.scenario(&NASARI_ACS, 2.0).unwrap();
        assert_eq!(summary.baseline_total, 0.0);
        assert_eq!(summary.delta, 0.0);
    }

    #[test]
    fn test_shared_across_threads() {
        let assessment = reference(IncidenceMethod::Regional);
        let model: &dyn ExposureResponse = &NASARI_ACS;
        let expected = assessment.scenario(model, 2.0).unwrap().delta;

        let assessment = &assessment;
        std::thread::scope(|s| {
            let handles: Vec<_> = (0..4)
                .map(|_| s.spawn(move || assessment.scenario(model, 2.0).unwrap().delta))
                .collect();
            for handle in handles {
                assert_eq!(handle.join().unwrap(), expected);
            }
        });
    }

    #[test]
    fn test_parse_method() {
        assert_eq!(
            "Regional".parse::<IncidenceMethod>().unwrap(),
            IncidenceMethod::Regional
        );
        assert_eq!(
            "local".parse::<IncidenceMethod>().unwrap(),
            IncidenceMethod::Local
        );
        assert!("county".parse::<IncidenceMethod>().is_err());
    }
}

use clap::{Parser, Subcommand};
use epi_core::*;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "epi")]
#[command(about = "Health impacts attributable to air pollution exposure", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override config file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the hazard ratio at each concentration
    Hr {
        /// Concentrations to evaluate
        #[arg(required = true, allow_negative_numbers = true)]
        concentrations: Vec<f64>,
    },

    /// Estimate attributable outcomes for a table of locations
    Assess {
        /// CSV with population and concentration columns (name optional)
        #[arg(long)]
        input: PathBuf,

        /// Observed incidence rate (e.g. deaths per person per year)
        #[arg(long)]
        incidence: Option<f64>,

        /// How underlying incidence is derived (regional, local)
        #[arg(long)]
        method: Option<IncidenceMethod>,

        /// Concentration scaling scenario; may be repeated
        #[arg(long = "scale")]
        scales: Vec<f64>,

        /// Print per-location results
        #[arg(long)]
        detail: bool,

        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    epi_core::logging::init();

    let cli = Cli::parse();

    let config = match cli.config {
        Some(ref path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    match cli.command {
        Commands::Hr { concentrations } => cmd_hr(&concentrations, &config),
        Commands::Assess {
            input,
            incidence,
            method,
            scales,
            detail,
            json,
        } => cmd_assess(input, incidence, method, &scales, detail, json, &config),
    }
}

fn cmd_hr(concentrations: &[f64], config: &Config) -> Result<()> {
    for &z in concentrations {
        println!("{}\t{}", z, config.model.hr(z));
    }
    Ok(())
}

fn cmd_assess(
    input: PathBuf,
    incidence: Option<f64>,
    method: Option<IncidenceMethod>,
    scales: &[f64],
    detail: bool,
    json: bool,
    config: &Config,
) -> Result<()> {
    let observed = incidence
        .or(config.assessment.observed_incidence)
        .ok_or_else(|| {
            Error::Config(
                "no observed incidence: pass --incidence or set assessment.observed_incidence"
                    .into(),
            )
        })?;
    let method = method.unwrap_or(config.assessment.method);

    let locations = load_locations(&input)?;
    tracing::debug!(
        "Assessing {} locations with observed incidence {} ({:?})",
        locations.len(),
        observed,
        method
    );

    let assessment = Assessment::new(locations, observed, method);
    let impacts = assessment.baseline(&config.model)?;
    let baseline_total: f64 = impacts.iter().map(|i| i.attributable).sum();

    let scenarios = scales
        .iter()
        .map(|&scale| assessment.scenario(&config.model, scale))
        .collect::<Result<Vec<_>>>()?;

    if json {
        let locations = if detail { Some(&impacts) } else { None };
        let report = serde_json::json!({
            "method": method,
            "observed_incidence": observed,
            "baseline_total": baseline_total,
            "locations": locations,
            "scenarios": scenarios,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("Locations: {} ({:?} incidence)", impacts.len(), method);

    if detail {
        println!();
        println!(
            "  {:<16} {:>12} {:>10} {:>10} {:>12}",
            "name", "population", "conc", "HR", "attributable"
        );
        for (idx, impact) in impacts.iter().enumerate() {
            let name = impact
                .name
                .clone()
                .unwrap_or_else(|| format!("#{}", idx + 1));
            println!(
                "  {:<16} {:>12.0} {:>10.3} {:>10.6} {:>12.2}",
                name,
                impact.population,
                impact.concentration,
                impact.hazard_ratio,
                impact.attributable
            );
        }
        println!();
    }

    println!("Baseline attributable: {:.2}", baseline_total);

    for s in &scenarios {
        println!(
            "Scenario x{}: {:.2} attributable, delta {:+.2}",
            s.scale, s.scenario_total, s.delta
        );
    }

    Ok(())
}

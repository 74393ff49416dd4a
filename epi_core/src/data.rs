//! Location table input.
//!
//! Reads location populations and concentrations from CSV. Expected header:
//!
//! ```text
//! name,population,concentration
//! ```
//!
//! The `name` column is optional.

use crate::{Error, Location, Result};
use std::io::Read;
use std::path::Path;

/// Load locations from a CSV file.
pub fn load_locations(path: &Path) -> Result<Vec<Location>> {
    let file = std::fs::File::open(path)?;
    let locations = read_locations(file)?;
    tracing::info!("Loaded {} locations from {:?}", locations.len(), path);
    Ok(locations)
}

/// Read locations from any CSV source.
///
/// Rows with a negative or non-finite population or concentration are
/// rejected with [`Error::InvalidInput`] naming the 1-based data row.
pub fn read_locations<R: Read>(reader: R) -> Result<Vec<Location>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut locations = Vec::new();
    for (idx, record) in csv_reader.deserialize::<Location>().enumerate() {
        let location = record?;
        validate_row(idx + 1, &location)?;
        locations.push(location);
    }

    Ok(locations)
}

fn validate_row(row: usize, location: &Location) -> Result<()> {
    for (column, value) in [
        ("population", location.population),
        ("concentration", location.concentration),
    ] {
        if !value.is_finite() || value < 0.0 {
            return Err(Error::InvalidInput(format!(
                "row {}: {} must be a finite non-negative number, got {}",
                row, column, value
            )));
        }
    }
    Ok(())
}

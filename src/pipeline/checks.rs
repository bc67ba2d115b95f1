use std::fmt;

use anyhow::Result;
use log::{info, warn};
use serde::Serialize;

use crate::{
    geom::overlap_percentage,
    store::Store,
    types::{Council, PollingDistrict, PollingStation},
};

/// Districts overlapping their council by less than this are reported.
pub const MIN_DISTRICT_OVERLAP: f64 = 99.0;

/// A problem found by the validation checks. Records are persisted regardless.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CheckWarning {
    /// The station lies in councils other than its own.
    StationOutsideCouncil { station_id: String, council_id: String, found_in: Vec<String> },
    StationInNoCouncil { station_id: String },
    DistrictOverlap { district_id: String, percentage: f64 },
    /// Overlap could not be computed.
    InvalidDistrictGeometry { district_id: String, reason: String },
}

impl fmt::Display for CheckWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StationOutsideCouncil { station_id, council_id, found_in } =>
                write!(f, "station {station_id} is outside {council_id} (inside {})", found_in.join(", ")),
            Self::StationInNoCouncil { station_id } =>
                write!(f, "station {station_id} is not inside any council"),
            Self::DistrictOverlap { district_id, percentage } =>
                write!(f, "district {district_id} overlaps its council by {percentage:.1}%"),
            Self::InvalidDistrictGeometry { district_id, reason } =>
                write!(f, "district {district_id} has invalid geometry: {reason}"),
        }
    }
}

/// Check that every located station lies inside the council it belongs to.
pub fn check_stations<'a>(stations: impl IntoIterator<Item = &'a PollingStation>, store: &dyn Store) -> Result<Vec<CheckWarning>> {
    let mut warnings = Vec::new();
    for station in stations {
        let Some(point) = station.location else { continue };
        let councils = store.councils_containing(&point)?;

        let warning = if councils.is_empty() {
            CheckWarning::StationInNoCouncil { station_id: station.internal_council_id.clone() }
        } else if !councils.contains(&station.council_id) {
            CheckWarning::StationOutsideCouncil {
                station_id: station.internal_council_id.clone(),
                council_id: station.council_id.clone(),
                found_in: councils,
            }
        } else {
            continue;
        };
        warn!("{warning}");
        warnings.push(warning);
    }
    Ok(warnings)
}

/// Check how much of each district lies inside the council boundary.
pub fn check_districts<'a>(districts: impl IntoIterator<Item = &'a PollingDistrict>, council: &Council) -> Vec<CheckWarning> {
    let mut warnings = Vec::new();
    for district in districts {
        let Some(area) = &district.area else { continue };
        let district_id = district.internal_council_id.clone();

        match overlap_percentage(area, &council.area) {
            Ok(percentage) if percentage >= MIN_DISTRICT_OVERLAP => {
                info!("District {district_id} overlaps {} by {percentage:.1}%", council.council_id);
            }
            Ok(percentage) => {
                let warning = CheckWarning::DistrictOverlap { district_id, percentage };
                warn!("{warning}");
                warnings.push(warning);
            }
            Err(err) => {
                let warning = CheckWarning::InvalidDistrictGeometry { district_id, reason: err.to_string() };
                warn!("{warning}; skipping overlap check");
                warnings.push(warning);
            }
        }
    }
    warnings
}

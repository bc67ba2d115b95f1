//! Spatial assignment: which districts' interiors contain each address point.
use std::collections::{BTreeMap, BTreeSet};

use anyhow::{Context, Result};
use log::{debug, info};
use polyindex::PolygonIndex;

use crate::{store::Store, types::{PollingDistrict, Uprn}};

/// Station (or district) id → UPRNs assigned to it.
pub type StationLookup = BTreeMap<String, BTreeSet<Uprn>>;

/// Identifiers of one indexed district.
#[derive(Debug, Clone)]
struct DistrictKey {
    district_id: String,
    station_id: String,
}

/// Point-in-polygon engine over one council's districts.
#[derive(Debug)]
pub struct SpatialAssignmentResolver {
    council_id: String,
    index: PolygonIndex<DistrictKey>,
}

impl SpatialAssignmentResolver {
    /// Index the council's districts that have an area. Districts of other councils are ignored.
    pub fn new<'a>(council_id: impl Into<String>, districts: impl IntoIterator<Item = &'a PollingDistrict>) -> Self {
        let council_id = council_id.into();
        let index = PolygonIndex::new(districts.into_iter()
            .filter(|d| d.council_id == council_id)
            .filter_map(|d| {
                let key = DistrictKey { district_id: d.internal_council_id.clone(), station_id: d.polling_station_id.clone() };
                d.area.clone().map(|area| (key, area))
            }));
        Self { council_id, index }
    }

    #[inline] pub fn num_districts(&self) -> usize { self.index.len() }

    /// Station id → UPRNs whose point lies strictly inside a district served by that station.
    pub fn station_lookup(&self, store: &dyn Store) -> Result<StationLookup> {
        self.lookup_by(store, |key| &key.station_id)
    }

    /// District id → UPRNs whose point lies strictly inside that district.
    pub fn district_lookup(&self, store: &dyn Store) -> Result<StationLookup> {
        self.lookup_by(store, |key| &key.district_id)
    }

    fn lookup_by(&self, store: &dyn Store, key_of: impl Fn(&DistrictKey) -> &String) -> Result<StationLookup> {
        let mut lookup = StationLookup::new();
        if self.index.is_empty() {
            return Ok(lookup);
        }

        let records = store.assignments(&self.council_id)
            .with_context(|| format!("[resolve] failed to list assignment records for {}", self.council_id))?;

        let (mut located, mut ambiguous) = (0, 0);
        for record in &records {
            let Some(point) = store.address(&record.uprn)?.and_then(|address| address.location) else { continue };
            located += 1;

            let containing = self.index.containing(&point);
            if containing.len() > 1 {
                ambiguous += 1;
                info!("UPRN {} lies inside {} districts", record.uprn, containing.len());
            }
            for key in containing {
                let id = key_of(key);
                if !id.is_empty() {
                    lookup.entry(id.clone()).or_default().insert(record.uprn.clone());
                }
            }
        }

        debug!("[resolve] {located} of {} addresses located, {ambiguous} in overlapping districts", records.len());
        Ok(lookup)
    }
}

/// Union of two lookups by id. Where both name the same id the district-derived
/// set is kept.
pub fn merge_lookups(district_derived: StationLookup, station_derived: StationLookup) -> StationLookup {
    let mut merged = station_derived;
    for (station_id, uprns) in district_derived {
        if merged.get(&station_id).is_some_and(|existing| *existing != uprns) {
            debug!("[resolve] station {station_id} has differing district and station lookups; keeping district");
        }
        merged.insert(station_id, uprns);
    }
    merged
}

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use log::{debug, info};
use serde::Serialize;

use crate::{resolve::StationLookup, store::Store, types::Uprn};

/// Counts of the assignment records touched by one update.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AssignmentOutcome {
    pub assigned: usize,
    /// Mapped to more than one station, left empty.
    pub ambiguous: usize,
    pub unassigned: usize,
}

/// Writes a station lookup onto the council's assignment records.
pub trait AssignPollingStations {
    fn council_id(&self) -> &str;

    /// Set every assignment record of the council to the one station its UPRN
    /// maps to, or to the empty string when it maps to none or to several.
    fn update_uprn_to_council_model(&self, store: &mut dyn Store, lookup: &StationLookup) -> Result<AssignmentOutcome> {
        let mut stations_by_uprn: BTreeMap<&Uprn, Vec<&str>> = BTreeMap::new();
        for (station_id, uprns) in lookup {
            for uprn in uprns {
                stations_by_uprn.entry(uprn).or_default().push(station_id);
            }
        }

        let records = store.assignments(self.council_id())
            .with_context(|| format!("[assign] failed to list assignment records for {}", self.council_id()))?;

        let mut outcome = AssignmentOutcome::default();
        let updates = records.into_iter()
            .map(|record| {
                let station_id = match stations_by_uprn.get(&record.uprn).map(Vec::as_slice) {
                    Some([station_id]) => { outcome.assigned += 1; station_id.to_string() }
                    Some(many) => {
                        info!("UPRN {} maps to stations {}; leaving it unassigned", record.uprn, many.join(", "));
                        outcome.ambiguous += 1;
                        String::new()
                    }
                    None => { outcome.unassigned += 1; String::new() }
                };
                (record.uprn, station_id)
            })
            .collect();

        store.set_polling_station_ids(updates)
            .with_context(|| format!("[assign] failed to update assignment records for {}", self.council_id()))?;

        debug!("[assign] {}: {outcome:?}", self.council_id());
        Ok(outcome)
    }
}

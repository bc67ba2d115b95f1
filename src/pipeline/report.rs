use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::store::Store;
use super::CheckWarning;

/// Counts describing what an import left in the store for one council.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataQuality {
    pub council_id: String,
    pub num_stations: usize,
    pub num_districts: usize,
    /// Addresses with a station assigned.
    pub num_addresses: usize,
    pub report: String,
}

impl DataQuality {
    /// Count the council's stored entities and summarize them with the run's warnings.
    pub fn compute(store: &dyn Store, council_id: &str, warnings: &[CheckWarning]) -> Result<Self> {
        let num_stations = store.stations(council_id)?.len();
        let num_districts = store.districts(council_id)?.len();
        let assignments = store.assignments(council_id)?;
        let num_addresses = assignments.iter().filter(|r| !r.polling_station_id.is_empty()).count();

        let mut lines = vec![
            council_id.to_string(),
            format!("stations: {num_stations}"),
            format!("districts: {num_districts}"),
            format!("addresses assigned: {num_addresses} of {}", assignments.len()),
        ];
        if !warnings.is_empty() {
            lines.push(format!("warnings: {}", warnings.len()));
            lines.extend(warnings.iter().map(|warning| format!("  {warning}")));
        }
        let mut report = lines.join("\n");
        report.push('\n');

        Ok(Self { council_id: council_id.to_string(), num_stations, num_districts, num_addresses, report })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{store::MemStore, types::{PollingStation, Uprn}};

    #[test]
    fn counts_assigned_addresses_only() {
        let mut store = MemStore::default();
        for uprn in ["1", "2", "3"] {
            store.add_assignment(uprn, "X01");
        }
        store.set_polling_station_ids(vec![(Uprn::new("2"), "A".into())]).unwrap();
        store.insert_stations(vec![PollingStation {
            council_id: "X01".into(),
            internal_council_id: "A".into(),
            postcode: String::new(),
            address: "Hall".into(),
            location: None,
            polling_district_id: String::new(),
        }]).unwrap();

        let warnings = [CheckWarning::StationInNoCouncil { station_id: "A".into() }];
        let quality = DataQuality::compute(&store, "X01", &warnings).unwrap();
        assert_eq!((quality.num_stations, quality.num_districts, quality.num_addresses), (1, 0, 1));
        assert_eq!(quality.report.lines().take(2).collect::<Vec<_>>(), vec!["X01", "stations: 1"]);
        assert!(quality.report.contains("addresses assigned: 1 of 3"));
        assert!(quality.report.contains("station A is not inside any council"));
    }
}

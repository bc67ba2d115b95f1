use std::collections::BTreeMap;

use ahash::AHashMap;
use anyhow::{anyhow, Result};
use geo::Point;

use crate::{
    pipeline::DataQuality,
    types::{postcodes_match, Address, AssignmentRecord, Council, PollingDistrict, PollingStation, ResidentialAddress, Uprn},
};
use super::Store;

/// Simple in-memory store.
#[derive(Debug, Clone)]
pub struct MemStore {
    srid: u32,
    councils: BTreeMap<String, Council>,
    stations: Vec<PollingStation>,
    districts: Vec<PollingDistrict>,
    addresses: Vec<ResidentialAddress>,
    register: AHashMap<Uprn, Address>,
    assignments: BTreeMap<Uprn, AssignmentRecord>,
    postcodes: Vec<(String, Point<f64>)>,
    reports: BTreeMap<String, DataQuality>,
}

impl Default for MemStore {
    fn default() -> Self { Self::new(27700) }
}

impl MemStore {
    pub fn new(srid: u32) -> Self {
        Self {
            srid,
            councils: BTreeMap::new(),
            stations: Vec::new(),
            districts: Vec::new(),
            addresses: Vec::new(),
            register: AHashMap::new(),
            assignments: BTreeMap::new(),
            postcodes: Vec::new(),
            reports: BTreeMap::new(),
        }
    }

    pub fn add_council(&mut self, council: Council) {
        self.councils.insert(council.council_id.clone(), council);
    }

    /// Add a register entry.
    pub fn add_address(&mut self, address: Address) {
        self.register.insert(address.uprn.clone(), address);
    }

    /// Record that `uprn` is governed by `council_id`, initially unassigned.
    pub fn add_assignment(&mut self, uprn: impl Into<Uprn>, council_id: impl Into<String>) {
        let uprn = uprn.into();
        let record = AssignmentRecord { uprn: uprn.clone(), council_id: council_id.into(), polling_station_id: String::new() };
        self.assignments.insert(uprn, record);
    }

    pub fn add_postcode_centroid(&mut self, postcode: impl Into<String>, centroid: Point<f64>) {
        self.postcodes.push((postcode.into(), centroid));
    }

    /// Current station id for `uprn`, if it has an assignment record.
    pub fn polling_station_id(&self, uprn: &str) -> Option<&str> {
        self.assignments.get(uprn).map(|record| record.polling_station_id.as_str())
    }

    pub fn data_quality(&self, council_id: &str) -> Option<&DataQuality> {
        self.reports.get(council_id)
    }
}

impl Store for MemStore {
    fn srid(&self) -> u32 { self.srid }

    fn council(&self, council_id: &str) -> Result<Option<Council>> {
        Ok(self.councils.get(council_id).cloned())
    }

    fn councils_containing(&self, point: &Point<f64>) -> Result<Vec<String>> {
        Ok(self.councils.values()
            .filter(|council| polyindex::covers(&council.area, point))
            .map(|council| council.council_id.clone())
            .collect())
    }

    fn delete_council_data(&mut self, council_id: &str) -> Result<()> {
        self.stations.retain(|s| s.council_id != council_id);
        self.districts.retain(|d| d.council_id != council_id);
        self.addresses.retain(|a| a.council_id != council_id);
        self.assignments.values_mut()
            .filter(|record| record.council_id == council_id)
            .for_each(|record| record.polling_station_id.clear());
        Ok(())
    }

    fn insert_stations(&mut self, stations: Vec<PollingStation>) -> Result<()> {
        self.stations.extend(stations);
        Ok(())
    }

    fn insert_districts(&mut self, districts: Vec<PollingDistrict>) -> Result<()> {
        self.districts.extend(districts);
        Ok(())
    }

    fn insert_addresses(&mut self, addresses: Vec<ResidentialAddress>) -> Result<()> {
        self.addresses.extend(addresses);
        Ok(())
    }

    fn stations(&self, council_id: &str) -> Result<Vec<PollingStation>> {
        Ok(self.stations.iter().filter(|s| s.council_id == council_id).cloned().collect())
    }

    fn districts(&self, council_id: &str) -> Result<Vec<PollingDistrict>> {
        Ok(self.districts.iter().filter(|d| d.council_id == council_id).cloned().collect())
    }

    fn addresses(&self, council_id: &str) -> Result<Vec<ResidentialAddress>> {
        Ok(self.addresses.iter().filter(|a| a.council_id == council_id).cloned().collect())
    }

    fn address(&self, uprn: &Uprn) -> Result<Option<Address>> {
        Ok(self.register.get(uprn).cloned())
    }

    fn assignment(&self, uprn: &Uprn) -> Result<Option<AssignmentRecord>> {
        Ok(self.assignments.get(uprn).cloned())
    }

    fn assignments(&self, council_id: &str) -> Result<Vec<AssignmentRecord>> {
        Ok(self.assignments.values().filter(|r| r.council_id == council_id).cloned().collect())
    }

    fn set_polling_station_ids(&mut self, updates: Vec<(Uprn, String)>) -> Result<()> {
        for (uprn, station_id) in updates {
            let record = self.assignments.get_mut(&uprn)
                .ok_or_else(|| anyhow!("no assignment record for UPRN {uprn}"))?;
            record.polling_station_id = station_id;
        }
        Ok(())
    }

    fn postcode_centroid(&self, postcode: &str) -> Result<Option<Point<f64>>> {
        Ok(self.postcodes.iter()
            .find(|(known, _)| postcodes_match(known, postcode))
            .map(|(_, centroid)| *centroid))
    }

    fn save_data_quality(&mut self, report: DataQuality) -> Result<()> {
        self.reports.insert(report.council_id.clone(), report);
        Ok(())
    }
}

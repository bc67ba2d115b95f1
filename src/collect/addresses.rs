use std::collections::{BTreeMap, BTreeSet};

use ahash::AHashSet;
use anyhow::{Context, Result};
use log::{info, warn};
use serde::Serialize;

use crate::{
    mapper::AddressSource,
    resolve::StationLookup,
    source::RawRecord,
    store::Store,
    types::{postcodes_match, AddressRecord, ResidentialAddress, Uprn},
};
use super::{AssignPollingStations, CollectStats};

/// Records removed by each step of [`AddressList::check_records`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AddressCheck {
    pub empty_uprn: usize,
    pub not_in_register: usize,
    pub other_council: usize,
    pub postcode_mismatch: usize,
    /// Records of UPRNs listed against more than one station.
    pub conflicting_station: usize,
    pub duplicates: usize,
}

impl AddressCheck {
    pub fn total(&self) -> usize {
        self.empty_uprn + self.not_in_register + self.other_council
            + self.postcode_mismatch + self.conflicting_station + self.duplicates
    }
}

/// Addresses, with the station each is assigned to, collected for one council.
#[derive(Debug)]
pub struct AddressList {
    council_id: String,
    elements: Vec<ResidentialAddress>,
    stats: CollectStats,
}

impl AddressList {
    pub fn new(council_id: impl Into<String>) -> Self {
        Self { council_id: council_id.into(), elements: Vec::new(), stats: CollectStats::default() }
    }

    #[inline] pub fn len(&self) -> usize { self.elements.len() }
    #[inline] pub fn is_empty(&self) -> bool { self.elements.is_empty() }
    #[inline] pub fn stats(&self) -> CollectStats { self.stats }

    pub fn iter(&self) -> impl Iterator<Item = &ResidentialAddress> { self.elements.iter() }

    /// Map one raw record through `source` and add the address it yields, if any.
    pub fn import_record(&mut self, source: &dyn AddressSource, record: &RawRecord) -> bool {
        match source.address_record_to_entity(record) {
            Some(address) => {
                self.add(address);
                true
            }
            None => {
                info!("Skipping address record: {:?}", record.fields());
                self.stats.skipped += 1;
                false
            }
        }
    }

    /// Add a mapped address. The UPRN is canonicalized; a missing UPRN becomes empty.
    pub fn add(&mut self, record: AddressRecord) {
        self.elements.push(ResidentialAddress::from_record(record, &self.council_id));
        self.stats.collected += 1;
    }

    /// Drop records inconsistent with the address register and with each other.
    pub fn check_records(&mut self, store: &dyn Store) -> Result<AddressCheck> {
        let mut check = AddressCheck::default();

        let before = self.elements.len();
        self.elements.retain(|a| !a.uprn.is_empty());
        check.empty_uprn = before - self.elements.len();
        if check.empty_uprn > 0 {
            warn!("Dropped {} address records with no UPRN", check.empty_uprn);
        }

        let mut kept = Vec::with_capacity(self.elements.len());
        for address in std::mem::take(&mut self.elements) {
            let Some(registered) = store.address(&address.uprn)? else {
                warn!("Dropping UPRN {}: not in the address register", address.uprn);
                check.not_in_register += 1;
                continue;
            };
            let governed = store.assignment(&address.uprn)?
                .is_some_and(|record| record.council_id == self.council_id);
            if !governed {
                warn!("Dropping UPRN {}: not governed by {}", address.uprn, self.council_id);
                check.other_council += 1;
                continue;
            }
            if !postcodes_match(&address.postcode, &registered.postcode) {
                warn!("Dropping UPRN {}: postcode {:?} differs from register {:?}",
                    address.uprn, address.postcode, registered.postcode);
                check.postcode_mismatch += 1;
                continue;
            }
            kept.push(address);
        }

        let mut stations: BTreeMap<&Uprn, BTreeSet<&str>> = BTreeMap::new();
        for address in &kept {
            stations.entry(&address.uprn).or_default().insert(&address.polling_station_id);
        }
        let conflicting: AHashSet<Uprn> = stations.into_iter()
            .filter(|(_, ids)| ids.len() > 1)
            .map(|(uprn, ids)| {
                warn!("Dropping UPRN {uprn}: assigned to stations {}", ids.into_iter().collect::<Vec<_>>().join(", "));
                uprn.clone()
            })
            .collect();

        let mut seen: AHashSet<(Uprn, String)> = AHashSet::new();
        for address in kept {
            if conflicting.contains(&address.uprn) {
                check.conflicting_station += 1;
            } else if !seen.insert((address.uprn.clone(), address.polling_station_id.clone())) {
                check.duplicates += 1;
            } else {
                self.elements.push(address);
            }
        }
        if check.duplicates > 0 {
            info!("Collapsed {} duplicate address records", check.duplicates);
        }

        Ok(check)
    }

    /// Station id → UPRNs, as listed in the address records.
    pub fn get_polling_station_lookup(&self) -> StationLookup {
        let mut lookup = StationLookup::new();
        for address in self.elements.iter().filter(|a| !a.polling_station_id.is_empty() && !a.uprn.is_empty()) {
            lookup.entry(address.polling_station_id.clone()).or_default().insert(address.uprn.clone());
        }
        lookup
    }

    /// Persist all collected addresses. Returns how many were written.
    pub fn save(&self, store: &mut dyn Store) -> Result<usize> {
        let count = self.elements.len();
        store.insert_addresses(self.elements.clone())
            .with_context(|| format!("[addresses] failed to save addresses for {}", self.council_id))?;
        Ok(count)
    }
}

impl AssignPollingStations for AddressList {
    fn council_id(&self) -> &str { &self.council_id }
}

use geo::Point;

use super::Uprn;

/// A residential address as produced by a jurisdiction's mapper.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AddressRecord {
    pub address: String,
    pub postcode: String,
    pub uprn: Option<String>,
    pub polling_station_id: String,
    pub council_id: Option<String>,
    pub location: Option<Point<f64>>,
}

impl AddressRecord {
    pub fn new(uprn: impl Into<String>, address: impl Into<String>, postcode: impl Into<String>) -> Self {
        Self {
            uprn: Some(uprn.into()),
            address: address.into(),
            postcode: postcode.into(),
            ..Default::default()
        }
    }

    pub fn with_station(mut self, polling_station_id: impl Into<String>) -> Self {
        self.polling_station_id = polling_station_id.into();
        self
    }
}

/// A residential address collected during an import, UPRN canonicalized.
#[derive(Debug, Clone, PartialEq)]
pub struct ResidentialAddress {
    pub uprn: Uprn,
    pub address: String,
    pub postcode: String,
    pub polling_station_id: String,
    pub council_id: String,
    pub location: Option<Point<f64>>,
}

impl ResidentialAddress {
    pub(crate) fn from_record(record: AddressRecord, default_council: &str) -> Self {
        Self {
            uprn: record.uprn.map(Uprn::new).unwrap_or_default(),
            address: record.address,
            postcode: record.postcode,
            polling_station_id: record.polling_station_id,
            council_id: record.council_id.unwrap_or_else(|| default_council.to_string()),
            location: record.location,
        }
    }
}

/// An entry of the external address register. Read-only to the importer.
#[derive(Debug, Clone, PartialEq)]
pub struct Address {
    pub uprn: Uprn,
    pub address: String,
    pub postcode: String,
    pub location: Option<Point<f64>>,
}

/// The UPRN → polling station assignment this importer maintains.
///
/// `council_id` is assigned independently of the importer; an empty
/// `polling_station_id` means unassigned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignmentRecord {
    pub uprn: Uprn,
    pub council_id: String,
    pub polling_station_id: String,
}

/// Compare postcodes ignoring case and whitespace.
pub(crate) fn postcodes_match(a: &str, b: &str) -> bool {
    fn normalize(postcode: &str) -> String {
        postcode.chars().filter(|c| !c.is_whitespace()).flat_map(char::to_uppercase).collect()
    }
    normalize(a) == normalize(b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_uprn_defaults_to_empty() {
        let record = AddressRecord { address: "1 High St".into(), ..Default::default() };
        let address = ResidentialAddress::from_record(record, "X01000000");
        assert!(address.uprn.is_empty());
        assert_eq!(address.council_id, "X01000000");
    }

    #[test]
    fn padded_uprn_is_canonicalized() {
        let address = ResidentialAddress::from_record(AddressRecord::new("00000042", "1 High St", "AB1 2CD"), "X");
        assert_eq!(address.uprn.as_str(), "42");
    }

    #[test]
    fn explicit_council_is_kept() {
        let record = AddressRecord { council_id: Some("Y".into()), ..AddressRecord::new("1", "a", "b") };
        assert_eq!(ResidentialAddress::from_record(record, "X").council_id, "Y");
    }

    #[test]
    fn postcode_comparison_ignores_case_and_spacing() {
        assert!(postcodes_match("bh16 5ht", "BH165HT"));
        assert!(!postcodes_match("BH17 5HT", "BH16 5HT"));
    }
}

use geo::MultiPolygon;

/// A local authority: the jurisdiction an import run targets.
#[derive(Debug, Clone, PartialEq)]
pub struct Council {
    pub council_id: String,
    pub name: String,
    pub area: MultiPolygon<f64>, // Authoritative boundary, in the store's spatial reference
}

impl Council {
    pub fn new(council_id: impl Into<String>, name: impl Into<String>, area: MultiPolygon<f64>) -> Self {
        Self { council_id: council_id.into(), name: name.into(), area }
    }
}

use std::{borrow::Borrow, fmt};

use serde::{Deserialize, Serialize};

/// Strip the zero padding some exports add to UPRNs shorter than 12 digits.
#[inline]
pub fn canonical_uprn(raw: &str) -> &str {
    raw.trim_start_matches('0')
}

/// Unique Property Reference Number, always held in canonical (unpadded) form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Uprn(String);

impl Uprn {
    pub fn new(raw: impl AsRef<str>) -> Self {
        Self(canonical_uprn(raw.as_ref()).to_string())
    }

    #[inline] pub fn as_str(&self) -> &str { &self.0 }

    /// An empty UPRN marks an address record that carried no reference.
    #[inline] pub fn is_empty(&self) -> bool { self.0.is_empty() }
}

impl From<String> for Uprn {
    fn from(raw: String) -> Self { Self::new(raw) }
}

impl From<&str> for Uprn {
    fn from(raw: &str) -> Self { Self::new(raw) }
}

impl From<Uprn> for String {
    fn from(uprn: Uprn) -> Self { uprn.0 }
}

impl Borrow<str> for Uprn {
    fn borrow(&self) -> &str { &self.0 }
}

impl fmt::Display for Uprn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

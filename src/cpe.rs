//! CPE class derivation (§3): the type character of a CPE 2.2 URI.

use serde::{Deserialize, Serialize};

/// The class of platform a vulnerability's CPE identifies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CpeClass {
    Application,
    OperatingSystem,
    Hardware,
    Unknown,
}

impl CpeClass {
    /// Derives the class from the 6th character of a CPE 2.2 URI
    /// (`cpe:/a:...` -> application, `cpe:/o:...` -> operating_system,
    /// `cpe:/h:...` -> hardware). Any other value, or a URI too short to
    /// contain that position, is `Unknown`.
    pub fn from_cpe22_uri(uri: &str) -> CpeClass {
        match uri.as_bytes().get(5) {
            Some(b'a') => CpeClass::Application,
            Some(b'o') => CpeClass::OperatingSystem,
            Some(b'h') => CpeClass::Hardware,
            _ => CpeClass::Unknown,
        }
    }
}

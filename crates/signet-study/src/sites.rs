//! Centre and country lookups for report output.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use signet_types::{Patient, RangeSet};
use tracing::warn;

use crate::StudyError;

/// One investigational centre from `DFcenters`.
///
/// Columns 0..=9 are fixed contact data; every later column is either a
/// `"<start> <end>"` patient range or the literal `ERROR MONITOR`.
#[derive(Debug, Clone, Default)]
pub struct Center {
    pub number: u32,
    pub contact: String,
    pub affiliation: String,
    pub address: String,
    pub primary_fax: String,
    pub secondary_fax: String,
    pub phone: String,
    pub investigator: String,
    pub investigator_phone: String,
    pub reply_address: String,
    pub is_error_monitor: bool,
    pub patients: RangeSet,
}

/// The loaded centres table.
#[derive(Debug, Default)]
pub struct Centers {
    centers: Vec<Center>,
}

impl Centers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.centers.is_empty()
    }

    pub fn load(path: &Path) -> Result<Self, StudyError> {
        let file = File::open(path).map_err(|source| StudyError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::from_reader(BufReader::new(file)))
    }

    pub fn from_reader<R: BufRead>(reader: R) -> Self {
        let mut centers = Vec::new();
        for line in reader.lines() {
            let Ok(line) = line else { break };
            let line = line.strip_suffix('\r').unwrap_or(&line);
            let mut center = Center::default();
            for (col, value) in line.split('|').enumerate() {
                match col {
                    0 => center.number = value.trim().parse().unwrap_or(0),
                    1 => center.contact = value.to_string(),
                    2 => center.affiliation = value.to_string(),
                    3 => center.address = value.to_string(),
                    4 => center.primary_fax = value.to_string(),
                    5 => center.secondary_fax = value.to_string(),
                    6 => center.phone = value.to_string(),
                    7 => center.investigator = value.to_string(),
                    8 => center.investigator_phone = value.to_string(),
                    9 => center.reply_address = value.to_string(),
                    _ => {
                        if value == "ERROR MONITOR" {
                            center.is_error_monitor = true;
                        } else {
                            let mut parts = value.split_whitespace();
                            match (
                                parts.next().and_then(|p| p.parse::<i64>().ok()),
                                parts.next().and_then(|p| p.parse::<i64>().ok()),
                            ) {
                                (Some(start), Some(end)) => center.patients.prepend(start, end),
                                _ => warn!(
                                    center = center.number,
                                    range = value,
                                    "invalid patient range, skipped"
                                ),
                            }
                        }
                    }
                }
            }
            centers.push(center);
        }
        Self { centers }
    }

    /// The centre number a patient belongs to. Unassigned patients fall
    /// back to the error-monitor centre, then to 0.
    pub fn find(&self, patient: Patient) -> u32 {
        let mut error_monitor = None;
        for center in &self.centers {
            if center.patients.contains(patient.as_i64()) {
                return center.number;
            }
            if center.is_error_monitor {
                error_monitor = Some(center.number);
            }
        }
        error_monitor.unwrap_or(0)
    }
}

/// One country from `DFcountries`: `name|region|centre-ranges`.
#[derive(Debug, Clone, Default)]
pub struct Country {
    pub name: String,
    pub region: String,
    pub centers: RangeSet,
}

/// The loaded countries table.
#[derive(Debug, Default)]
pub struct Countries {
    countries: Vec<Country>,
}

impl Countries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(path: &Path) -> Result<Self, StudyError> {
        let file = File::open(path).map_err(|source| StudyError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::from_reader(BufReader::new(file)))
    }

    pub fn from_reader<R: BufRead>(reader: R) -> Self {
        let mut countries = Vec::new();
        for line in reader.lines() {
            let Ok(line) = line else { break };
            let line = line.strip_suffix('\r').unwrap_or(&line);
            let mut cols = line.split('|');
            let name = cols.next().unwrap_or("").to_string();
            let region = cols.next().unwrap_or("").to_string();
            let centers = match cols.next().unwrap_or("").parse() {
                Ok(set) => set,
                Err(_) => {
                    warn!(country = %name, "bad centre list, left empty");
                    RangeSet::new()
                }
            };
            countries.push(Country {
                name,
                region,
                centers,
            });
        }
        Self { countries }
    }

    pub fn country_of(&self, center: u32) -> &str {
        self.countries
            .iter()
            .find(|c| c.centers.contains(i64::from(center)))
            .map_or("Unknown", |c| c.name.as_str())
    }

    pub fn region_of(&self, center: u32) -> &str {
        self.countries
            .iter()
            .find(|c| c.centers.contains(i64::from(center)))
            .map_or("Unknown", |c| c.region.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CENTERS: &str = "\
1|Dr. A|Site A|1 Main St||||||x|1000 1999\n\
2|Dr. B|Site B|2 Main St||||||x|2000 2999|3500 3599\n\
99|Monitor|HQ|||||||x|ERROR MONITOR\n";

    #[test]
    fn finds_the_centre_for_a_patient() {
        let centers = Centers::from_reader(CENTERS.as_bytes());
        assert_eq!(centers.find(Patient::new(1500)), 1);
        assert_eq!(centers.find(Patient::new(3550)), 2);
    }

    #[test]
    fn unassigned_patients_fall_back_to_the_error_monitor() {
        let centers = Centers::from_reader(CENTERS.as_bytes());
        assert_eq!(centers.find(Patient::new(9999)), 99);
    }

    #[test]
    fn without_an_error_monitor_the_fallback_is_zero() {
        let centers = Centers::from_reader("1|||||||||x|1000 1999\n".as_bytes());
        assert_eq!(centers.find(Patient::new(5)), 0);
    }

    #[test]
    fn malformed_patient_ranges_are_skipped() {
        let centers = Centers::from_reader("7|||||||||x|not a range|4000 4999\n".as_bytes());
        assert_eq!(centers.find(Patient::new(4500)), 7);
        assert_eq!(centers.find(Patient::new(1)), 0);
    }

    const COUNTRIES: &str = "Canada|North America|1-49\nGermany|Europe|50-99\n";

    #[test]
    fn maps_centres_to_countries_and_regions() {
        let countries = Countries::from_reader(COUNTRIES.as_bytes());
        assert_eq!(countries.country_of(10), "Canada");
        assert_eq!(countries.region_of(60), "Europe");
    }

    #[test]
    fn unmapped_centres_are_unknown() {
        let countries = Countries::from_reader(COUNTRIES.as_bytes());
        assert_eq!(countries.country_of(200), "Unknown");
        assert_eq!(countries.region_of(200), "Unknown");
    }

    #[test]
    fn a_bad_centre_list_is_left_empty() {
        let countries = Countries::from_reader("France|Europe|4-x\n".as_bytes());
        assert_eq!(countries.country_of(4), "Unknown");
    }
}

//! Currency registry: which currencies participate and where their rates come from

use crate::error::{FxStressError, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::io::Read;
use std::path::Path;

/// Code of the base currency every downloaded series is quoted against
pub const USD_CODE: &str = "USD";

/// Placeholder used for the source fields of synthetic records
pub const SYNTHETIC_SOURCE: &str = "N/A";

/// One row of the registry table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencyRecord {
    /// Human-readable name
    #[serde(rename = "Label")]
    pub label: String,
    /// ISO 4217 code (e.g. "GBP")
    #[serde(rename = "Code")]
    pub code: String,
    /// Data provider database (e.g. "BOE")
    #[serde(rename = "Source")]
    pub source: String,
    /// Dataset identifier inside the provider database
    #[serde(rename = "Quandl_Code")]
    pub quandl_code: String,
    #[serde(rename = "Enabled", deserialize_with = "deserialize_flag")]
    pub enabled: bool,
}

impl CurrencyRecord {
    /// Synthetic US dollar record; its rate series is the constant 1.0
    pub fn usd() -> Self {
        Self {
            label: "US dollar".to_string(),
            code: USD_CODE.to_string(),
            source: SYNTHETIC_SOURCE.to_string(),
            quandl_code: SYNTHETIC_SOURCE.to_string(),
            enabled: true,
        }
    }

    /// Whether this record has a real dataset behind it
    pub fn is_downloadable(&self) -> bool {
        self.source != SYNTHETIC_SOURCE && self.quandl_code != SYNTHETIC_SOURCE
    }

    /// Provider dataset path, e.g. "BOE/XUDLGBD"
    pub fn dataset(&self) -> String {
        format!("{}/{}", self.source, self.quandl_code)
    }

    /// Column name used in the cached rate table, e.g. "GBPUSD"
    pub fn column_name(&self) -> String {
        format!("{}{}", self.code, USD_CODE)
    }
}

impl fmt::Display for CurrencyRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.label, self.code)
    }
}

fn deserialize_flag<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_flag(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid Enabled flag: {raw:?}")))
}

/// Parse a boolean-like registry flag
pub fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "y" => Some(true),
        "0" | "false" | "no" | "n" | "" => Some(false),
        _ => None,
    }
}

/// Ordered set of currency records
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CurrencyRegistry {
    records: Vec<CurrencyRecord>,
}

impl CurrencyRegistry {
    /// Build a registry, rejecting empty or duplicate codes
    pub fn new(records: Vec<CurrencyRecord>) -> Result<Self> {
        let mut seen = HashSet::new();
        for record in &records {
            if record.code.trim().is_empty() {
                return Err(FxStressError::RegistryError(format!(
                    "Record '{}' has an empty currency code",
                    record.label
                )));
            }
            if !seen.insert(record.code.as_str()) {
                return Err(FxStressError::RegistryError(format!(
                    "Duplicate currency code: {}",
                    record.code
                )));
            }
        }
        Ok(Self { records })
    }

    /// Load a registry from CSV (`Label,Code,Source,Quandl_Code,Enabled`)
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let records = rdr
            .deserialize()
            .collect::<std::result::Result<Vec<CurrencyRecord>, _>>()?;
        Self::new(records)
    }

    /// Load a registry from a CSV file
    pub fn from_path(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path).map_err(|e| {
            FxStressError::RegistryError(format!("Cannot open {}: {}", path.display(), e))
        })?;
        Self::from_reader(file)
    }

    /// Return a new registry that also contains the synthetic USD record.
    ///
    /// An existing USD row is left as is.
    pub fn with_usd(&self) -> Self {
        let mut records = self.records.clone();
        if !records.iter().any(|r| r.code == USD_CODE) {
            records.push(CurrencyRecord::usd());
        }
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[CurrencyRecord] {
        &self.records
    }

    pub fn get(&self, code: &str) -> Option<&CurrencyRecord> {
        self.records.iter().find(|r| r.code == code)
    }

    /// Enabled records in registry order
    pub fn enabled(&self) -> impl Iterator<Item = &CurrencyRecord> {
        self.records.iter().filter(|r| r.enabled)
    }

    /// Enabled records that must be fetched from a data source
    pub fn downloadable(&self) -> impl Iterator<Item = &CurrencyRecord> {
        self.enabled().filter(|r| r.is_downloadable())
    }

    /// Enabled codes sorted ascending
    pub fn enabled_codes(&self) -> Vec<String> {
        let mut codes: Vec<String> = self.enabled().map(|r| r.code.clone()).collect();
        codes.sort();
        codes
    }
}

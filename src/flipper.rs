use std::collections::HashMap;

use derive_more::From;
use serde::{Deserialize, Serialize};

/// Response body of `GET /flippers/{tenantId}`.
#[derive(Debug, Deserialize)]
pub(crate) struct FlippersResponse {
    pub data: Vec<TryParse<Flipper>>,
}

/// `TryParse` allows a single entry to fail parsing without failing the parsing of the whole
/// response. This lets older clients skip flipper types introduced after they were released.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TryParse<T> {
    /// The entry was recognized.
    Parsed(T),
    /// The entry has an unknown type or an unexpected shape. Holds the raw JSON.
    ParseFailed(serde_json::Value),
}

impl<T> From<TryParse<T>> for Option<T> {
    fn from(value: TryParse<T>) -> Self {
        match value {
            TryParse::Parsed(v) => Some(v),
            TryParse::ParseFailed(_) => None,
        }
    }
}

impl<'a, T> From<&'a TryParse<T>> for Option<&'a T> {
    fn from(value: &TryParse<T>) -> Option<&T> {
        match value {
            TryParse::Parsed(v) => Some(v),
            TryParse::ParseFailed(_) => None,
        }
    }
}

/// A single flipper returned for a tenant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, From)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Flipper {
    /// An on/off toggle.
    Boolean(BooleanFlipper),
    /// An ordered list of strings.
    StringList(StringListFlipper),
}

/// A boolean flipper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BooleanFlipper {
    /// Unique among boolean flippers of a tenant.
    pub name: String,
    /// Tenant the flipper was returned for.
    pub tenant_id: String,
    /// `true` if the server returned a default value instead of a tenant-specific one.
    #[serde(default)]
    pub is_default: bool,
    /// Value of the flipper.
    #[serde(default)]
    pub enabled: bool,
}

/// A string-list flipper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StringListFlipper {
    /// Unique among string-list flippers of a tenant.
    pub name: String,
    /// Tenant the flipper was returned for.
    pub tenant_id: String,
    /// `true` if the server returned a default value instead of a tenant-specific one.
    #[serde(default)]
    pub is_default: bool,
    /// Value of the flipper, in server order.
    #[serde(default)]
    pub values: Vec<String>,
}

impl Flipper {
    /// Name of the flipper.
    pub fn name(&self) -> &str {
        match self {
            Flipper::Boolean(f) => &f.name,
            Flipper::StringList(f) => &f.name,
        }
    }

    /// Tenant the flipper was returned for.
    pub fn tenant_id(&self) -> &str {
        match self {
            Flipper::Boolean(f) => &f.tenant_id,
            Flipper::StringList(f) => &f.tenant_id,
        }
    }

    /// `true` if the server returned a default value instead of a tenant-specific one.
    pub fn is_default(&self) -> bool {
        match self {
            Flipper::Boolean(f) => f.is_default,
            Flipper::StringList(f) => f.is_default,
        }
    }

    /// Returns `true` for a boolean flipper.
    pub fn is_boolean(&self) -> bool {
        self.as_boolean().is_some()
    }
    /// Returns the boolean flipper, or `None` for other types.
    pub fn as_boolean(&self) -> Option<&BooleanFlipper> {
        match self {
            Flipper::Boolean(f) => Some(f),
            _ => None,
        }
    }

    /// Returns `true` for a string-list flipper.
    pub fn is_string_list(&self) -> bool {
        self.as_string_list().is_some()
    }
    /// Returns the string-list flipper, or `None` for other types.
    pub fn as_string_list(&self) -> Option<&StringListFlipper> {
        match self {
            Flipper::StringList(f) => Some(f),
            _ => None,
        }
    }
}

/// Flippers loaded for a single tenant.
///
/// Holds the raw list as returned by the server along with lookup tables keyed by flipper name.
/// If the server returns the same name twice, the last entry wins.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlipperData {
    flipper_data: Vec<TryParse<Flipper>>,
    boolean_flippers: HashMap<String, BooleanFlipper>,
    string_list_flippers: HashMap<String, StringListFlipper>,
}

impl FlipperData {
    /// Build lookup tables from the raw `data` list. Entries that failed to parse are kept in the
    /// raw list but are not indexed.
    pub fn from_entries(entries: Vec<TryParse<Flipper>>) -> Self {
        let mut boolean_flippers = HashMap::new();
        let mut string_list_flippers = HashMap::new();

        for entry in &entries {
            match entry {
                TryParse::Parsed(Flipper::Boolean(flipper)) => {
                    boolean_flippers.insert(flipper.name.clone(), flipper.clone());
                }
                TryParse::Parsed(Flipper::StringList(flipper)) => {
                    string_list_flippers.insert(flipper.name.clone(), flipper.clone());
                }
                TryParse::ParseFailed(raw) => {
                    log::debug!(target: "flipper", entry:serde = raw; "skipping unrecognized flipper entry");
                }
            }
        }

        FlipperData {
            flipper_data: entries,
            boolean_flippers,
            string_list_flippers,
        }
    }

    /// The raw list as returned by the server, including entries that were not recognized.
    pub fn flipper_data(&self) -> &[TryParse<Flipper>] {
        &self.flipper_data
    }

    /// Iterate over all recognized flippers in server order.
    pub fn flippers(&self) -> impl Iterator<Item = &Flipper> {
        self.flipper_data
            .iter()
            .filter_map(|entry| Option::<&Flipper>::from(entry))
    }

    /// Boolean flippers by name.
    pub fn boolean_flippers(&self) -> &HashMap<String, BooleanFlipper> {
        &self.boolean_flippers
    }

    /// String-list flippers by name.
    pub fn string_list_flippers(&self) -> &HashMap<String, StringListFlipper> {
        &self.string_list_flippers
    }

    /// Returns the value of a boolean flipper, or `false` if there is no such flipper.
    pub fn is_enabled(&self, flipper_name: &str) -> bool {
        self.boolean_flippers
            .get(flipper_name)
            .map(|flipper| flipper.enabled)
            .unwrap_or(false)
    }

    /// Returns the values of a string-list flipper, or an empty slice if there is no such
    /// flipper.
    pub fn get_string_list(&self, flipper_name: &str) -> &[String] {
        self.string_list_flippers
            .get(flipper_name)
            .map(|flipper| flipper.values.as_slice())
            .unwrap_or(&[])
    }
}

impl From<FlippersResponse> for FlipperData {
    fn from(response: FlippersResponse) -> Self {
        FlipperData::from_entries(response.data)
    }
}

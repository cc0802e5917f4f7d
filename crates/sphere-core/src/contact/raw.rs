//! Raw directory record schema.
//!
//! Mirrors the People API `person` resource with every field optional.
//! Directories routinely omit any of these, so nothing here is required
//! and unknown fields are ignored. An explicit `null` reads as absent.

use serde::{Deserialize, Deserializer};

/// Treat `null` like a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawPerson {
    pub resource_name: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub names: Vec<RawName>,
    #[serde(deserialize_with = "null_as_default")]
    pub email_addresses: Vec<RawValue>,
    #[serde(deserialize_with = "null_as_default")]
    pub phone_numbers: Vec<RawValue>,
    #[serde(deserialize_with = "null_as_default")]
    pub organizations: Vec<RawOrganization>,
    #[serde(deserialize_with = "null_as_default")]
    pub addresses: Vec<RawAddress>,
    #[serde(deserialize_with = "null_as_default")]
    pub birthdays: Vec<RawBirthday>,
    #[serde(deserialize_with = "null_as_default")]
    pub photos: Vec<RawPhoto>,
    #[serde(deserialize_with = "null_as_default")]
    pub biographies: Vec<RawValue>,
    pub metadata: Option<RawMetadata>,

    /// The untouched record, kept for audit/display.
    #[serde(skip)]
    pub payload: serde_json::Value,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawName {
    pub display_name: Option<String>,
    pub given_name: Option<String>,
    pub family_name: Option<String>,
}

/// A `{ "value": ... }` entry (emails, phones, biographies).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawValue {
    pub value: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawOrganization {
    pub name: Option<String>,
    pub title: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub current: Option<bool>,
}

impl RawOrganization {
    /// Whether the directory tagged this entry as an educational institution.
    pub fn is_school(&self) -> bool {
        self.kind
            .as_deref()
            .map(|k| k.eq_ignore_ascii_case("school"))
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawAddress {
    pub formatted_value: Option<String>,
    pub street_address: Option<String>,
    pub city: Option<String>,
    pub region: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
    pub country_code: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawBirthday {
    pub date: Option<RawDate>,
    pub text: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawDate {
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub day: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawPhoto {
    pub url: Option<String>,
    pub default: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawMetadata {
    #[serde(deserialize_with = "null_as_default")]
    pub deleted: bool,
}

impl RawPerson {
    /// Decode a JSON record, keeping the original payload.
    pub fn from_json(value: serde_json::Value) -> Result<Self, serde_json::Error> {
        let mut person: RawPerson = serde_json::from_value(value.clone())?;
        person.payload = value;
        Ok(person)
    }

    /// Stable identifier: the last segment of `resourceName` (`people/c42` -> `c42`).
    pub fn contact_id(&self) -> Option<String> {
        let resource = self.resource_name.as_deref()?.trim();
        let id = resource.rsplit('/').next().unwrap_or(resource);
        if id.is_empty() {
            None
        } else {
            Some(id.to_string())
        }
    }

    /// Incremental syncs report removed contacts as tombstones.
    pub fn is_deleted(&self) -> bool {
        self.metadata.as_ref().map(|m| m.deleted).unwrap_or(false)
    }
}

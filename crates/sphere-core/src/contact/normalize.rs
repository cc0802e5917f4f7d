//! Raw directory record -> canonical [`Contact`].

use std::collections::BTreeSet;

use super::model::Contact;
use super::raw::{RawAddress, RawDate, RawPerson};

/// Normalize one directory record.
///
/// Returns `None` (a silent discard) when the record has no resource
/// identifier or no display name. Repeated fields contribute their first
/// element only, since directories list the primary value first.
pub fn normalize(record: &RawPerson) -> Option<Contact> {
    let id = record.contact_id()?;
    let name = record
        .names
        .first()
        .and_then(|n| non_empty(n.display_name.as_deref()))?;

    let email = record
        .email_addresses
        .first()
        .and_then(|e| non_empty(e.value.as_deref()));
    let phone = record
        .phone_numbers
        .first()
        .and_then(|p| non_empty(p.value.as_deref()));

    let organization = record
        .organizations
        .first()
        .and_then(|o| non_empty(o.name.as_deref()));
    let school = record
        .organizations
        .iter()
        .find(|o| o.is_school())
        .and_then(|o| non_empty(o.name.as_deref()));
    let previous_organization = record
        .organizations
        .iter()
        .skip(1)
        .find(|o| o.current == Some(false) && !o.is_school())
        .and_then(|o| non_empty(o.name.as_deref()));

    let address = record.addresses.first();
    let city = address.and_then(|a| non_empty(a.city.as_deref()));
    let country = address.and_then(|a| {
        non_empty(a.country_code.as_deref()).or_else(|| non_empty(a.country.as_deref()))
    });
    let street = address.and_then(|a| non_empty(a.street_address.as_deref()));
    let postal_code = address.and_then(|a| non_empty(a.postal_code.as_deref()));
    let formatted_address = address.and_then(format_address);

    let birthday = record
        .birthdays
        .first()
        .and_then(|b| b.date.as_ref())
        .and_then(format_birthday);

    let photo_url = record.photos.first().and_then(|p| non_empty(p.url.as_deref()));
    let notes = record
        .biographies
        .first()
        .and_then(|b| non_empty(b.value.as_deref()))
        .unwrap_or_default();

    let mut contact = Contact {
        id,
        name,
        email,
        phone,
        organization,
        previous_organization,
        school,
        city,
        country,
        street,
        postal_code,
        address: formatted_address,
        birthday,
        photo_url,
        notes,
        raw_data: record.payload.clone(),
        tags: BTreeSet::new(),
        uncategorized: false,
        created_at: None,
        updated_at: None,
    };
    contact.uncategorized = contact.lacks_signal();
    Some(contact)
}

/// Join street, city, region, postal code and country with `", "`.
pub fn format_address(address: &RawAddress) -> Option<String> {
    let parts: Vec<String> = [
        &address.street_address,
        &address.city,
        &address.region,
        &address.postal_code,
        &address.country,
    ]
    .iter()
    .filter_map(|part| non_empty(part.as_deref()))
    .collect();

    if parts.is_empty() {
        None
    } else {
        Some(parts.join(", "))
    }
}

/// Format as zero-padded `MM-DD`. The year is dropped so birthdays recur.
pub fn format_birthday(date: &RawDate) -> Option<String> {
    match (date.month, date.day) {
        (Some(month @ 1..=12), Some(day @ 1..=31)) => Some(format!("{:02}-{:02}", month, day)),
        _ => None,
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

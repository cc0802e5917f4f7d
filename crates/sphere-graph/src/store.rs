//! `ContactStore` implementation on Neo4j.
//!
//! Layout:
//!
//! - (:Contact {id, name, email, ..., tags, notes, raw_data})
//! - (:Contact)-[:COLLEAGUE|LOCAL|... {relationship_type, strength, metadata}]->(:Contact)
//! - (:SyncMeta {key: 'sync_token', value})
//!
//! Optional fields are stored as empty strings and read back as `None`.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use neo4rs::{Query, Row};
use tracing::debug;

use sphere_core::insights::{Community, ContactPath, GraphStatistics};
use sphere_core::store::{clean_tag, ContactStore, GraphQueries};
use sphere_core::{Contact, RelationshipEdge, RelationshipType, SphereError, SphereResult};

use crate::queries;
use crate::GraphClient;

/// Projection shared by every query that returns whole contacts.
pub(crate) const CONTACT_RETURN: &str = "c.id AS id, c.name AS name,
    coalesce(c.email, '') AS email, coalesce(c.phone, '') AS phone,
    coalesce(c.organization, '') AS organization,
    coalesce(c.previous_organization, '') AS previous_organization,
    coalesce(c.school, '') AS school, coalesce(c.city, '') AS city,
    coalesce(c.country, '') AS country, coalesce(c.street, '') AS street,
    coalesce(c.postal_code, '') AS postal_code, coalesce(c.address, '') AS address,
    coalesce(c.birthday, '') AS birthday, coalesce(c.photo_url, '') AS photo_url,
    coalesce(c.notes, '') AS notes, coalesce(c.raw_data, '') AS raw_data,
    coalesce(c.tags, []) AS tags, coalesce(c.uncategorized, false) AS uncategorized,
    coalesce(c.created_at, '') AS created_at, coalesce(c.updated_at, '') AS updated_at";

/// Neo4j-backed store.
#[derive(Clone)]
pub struct Neo4jStore {
    client: GraphClient,
}

impl Neo4jStore {
    pub fn new(client: GraphClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &GraphClient {
        &self.client
    }

    async fn contact_exists(&self, id: &str) -> Result<bool> {
        let query = Query::new("MATCH (c:Contact {id: $id}) RETURN count(c) AS count".to_string())
            .param("id", id);
        let count: i64 = self.client.query_scalar(query, "count").await?.unwrap_or(0);
        Ok(count > 0)
    }

    async fn write_contact(&self, contact: &Contact) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        let raw_data = serde_json::to_string(&contact.raw_data).context("Failed to encode raw_data")?;

        let query = Query::new(
            "MERGE (c:Contact {id: $id})
             ON CREATE SET c.created_at = $now,
                           c.notes = $notes,
                           c.tags = []
             SET c.name = $name,
                 c.email = $email,
                 c.phone = $phone,
                 c.organization = $organization,
                 c.previous_organization = $previous_organization,
                 c.school = $school,
                 c.city = $city,
                 c.country = $country,
                 c.street = $street,
                 c.postal_code = $postal_code,
                 c.address = $address,
                 c.birthday = $birthday,
                 c.photo_url = $photo_url,
                 c.raw_data = $raw_data,
                 c.uncategorized = $uncategorized,
                 c.updated_at = $now"
                .to_string(),
        )
        .param("id", contact.id.as_str())
        .param("name", contact.name.as_str())
        .param("email", contact.email.as_deref().unwrap_or(""))
        .param("phone", contact.phone.as_deref().unwrap_or(""))
        .param("organization", contact.organization.as_deref().unwrap_or(""))
        .param("previous_organization", contact.previous_organization.as_deref().unwrap_or(""))
        .param("school", contact.school.as_deref().unwrap_or(""))
        .param("city", contact.city.as_deref().unwrap_or(""))
        .param("country", contact.country.as_deref().unwrap_or(""))
        .param("street", contact.street.as_deref().unwrap_or(""))
        .param("postal_code", contact.postal_code.as_deref().unwrap_or(""))
        .param("address", contact.address.as_deref().unwrap_or(""))
        .param("birthday", contact.birthday.as_deref().unwrap_or(""))
        .param("photo_url", contact.photo_url.as_deref().unwrap_or(""))
        .param("notes", contact.notes.as_str())
        .param("raw_data", raw_data)
        .param("uncategorized", contact.lacks_signal())
        .param("now", now);

        self.client.execute(query).await
    }

    async fn fetch_contacts(&self, filter: &str, params: &[(&str, &str)]) -> Result<Vec<Contact>> {
        let mut query = Query::new(format!(
            "MATCH (c:Contact) {} RETURN {} ORDER BY c.name, c.id",
            filter, CONTACT_RETURN
        ));
        for (key, value) in params {
            query = query.param(*key, *value);
        }

        let rows = self.client.query(query).await?;
        Ok(rows.iter().map(contact_from_row).collect())
    }

    /// Apply a single-contact update and return the refreshed contact.
    async fn update_contact(&self, id: &str, set_clause: &str, value: &str) -> SphereResult<Contact> {
        let query = Query::new(format!(
            "MATCH (c:Contact {{id: $id}}) SET {}, c.updated_at = $now RETURN {}",
            set_clause, CONTACT_RETURN
        ))
        .param("id", id)
        .param("value", value)
        .param("now", Utc::now().to_rfc3339());

        let rows = self.client.query(query).await.map_err(SphereError::storage)?;
        rows.first()
            .map(contact_from_row)
            .ok_or_else(|| SphereError::ContactNotFound(id.to_string()))
    }
}

#[async_trait]
impl ContactStore for Neo4jStore {
    async fn upsert_contact(&self, contact: &Contact) -> SphereResult<bool> {
        let is_new = !self.contact_exists(&contact.id).await.map_err(SphereError::storage)?;
        self.write_contact(contact).await.map_err(SphereError::storage)?;
        debug!(contact_id = %contact.id, is_new, "Upserted contact");
        Ok(is_new)
    }

    async fn get_contacts(&self, search: Option<&str>) -> SphereResult<Vec<Contact>> {
        let term = search.map(|s| s.trim().to_lowercase()).unwrap_or_default();
        let result = if term.is_empty() {
            self.fetch_contacts("", &[]).await
        } else {
            self.fetch_contacts(SEARCH_FILTER, &[("term", term.as_str())]).await
        };
        result.map_err(SphereError::storage)
    }

    async fn get_contact(&self, id: &str) -> SphereResult<Option<Contact>> {
        let contacts = self
            .fetch_contacts("WHERE c.id = $id", &[("id", id)])
            .await
            .map_err(SphereError::storage)?;
        Ok(contacts.into_iter().next())
    }

    async fn get_uncategorized_contacts(&self) -> SphereResult<Vec<Contact>> {
        self.fetch_contacts("WHERE c.uncategorized = true", &[])
            .await
            .map_err(SphereError::storage)
    }

    async fn delete_contact(&self, id: &str) -> SphereResult<bool> {
        let existed = self.contact_exists(id).await.map_err(SphereError::storage)?;
        if existed {
            let query = Query::new("MATCH (c:Contact {id: $id}) DETACH DELETE c".to_string()).param("id", id);
            self.client.execute(query).await.map_err(SphereError::storage)?;
        }
        Ok(existed)
    }

    async fn count_contacts(&self) -> SphereResult<usize> {
        let query = Query::new("MATCH (c:Contact) RETURN count(c) AS count".to_string());
        let count: i64 = self
            .client
            .query_scalar(query, "count")
            .await
            .map_err(SphereError::storage)?
            .unwrap_or(0);
        Ok(count as usize)
    }

    async fn clear_all_edges(&self) -> SphereResult<()> {
        let query = Query::new(
            "MATCH (:Contact)-[r]->(:Contact) WHERE r.relationship_type IS NOT NULL DELETE r".to_string(),
        );
        self.client.execute(query).await.map_err(SphereError::storage)
    }

    async fn add_edge(&self, edge: &RelationshipEdge) -> SphereResult<()> {
        let metadata = serde_json::to_string(&edge.metadata)?;
        // Labels cannot be parameterized; graph_label() is a closed set.
        let query = Query::new(format!(
            "MATCH (a:Contact {{id: $source}}), (b:Contact {{id: $target}})
             CREATE (a)-[r:{} {{relationship_type: $rel_type, strength: $strength, metadata: $metadata}}]->(b)
             RETURN count(r) AS created",
            edge.relationship_type.graph_label()
        ))
        .param("source", edge.source_id.as_str())
        .param("target", edge.target_id.as_str())
        .param("rel_type", edge.relationship_type.as_str())
        .param("strength", edge.strength)
        .param("metadata", metadata);

        let created: i64 = self
            .client
            .query_scalar(query, "created")
            .await
            .map_err(SphereError::storage)?
            .unwrap_or(0);
        if created == 0 {
            return Err(SphereError::ContactNotFound(format!(
                "{} or {}",
                edge.source_id, edge.target_id
            )));
        }
        Ok(())
    }

    async fn get_edges(&self, relationship_type: Option<RelationshipType>) -> SphereResult<Vec<RelationshipEdge>> {
        let query = Query::new(
            "MATCH (a:Contact)-[r]->(b:Contact)
             WHERE r.relationship_type IS NOT NULL
               AND ($rel_type = '' OR r.relationship_type = $rel_type)
             RETURN a.id AS source, b.id AS target, r.relationship_type AS rel_type,
                    coalesce(r.strength, 1.0) AS strength, coalesce(r.metadata, '') AS metadata
             ORDER BY rel_type, source, target"
                .to_string(),
        )
        .param("rel_type", relationship_type.map(|t| t.as_str()).unwrap_or(""));

        let rows = self.client.query(query).await.map_err(SphereError::storage)?;
        Ok(rows.iter().filter_map(edge_from_row).collect())
    }

    async fn add_tag(&self, id: &str, tag: &str) -> SphereResult<Contact> {
        let tag = clean_tag(tag)?;
        self.update_contact(
            id,
            "c.tags = CASE WHEN $value IN coalesce(c.tags, []) THEN c.tags ELSE coalesce(c.tags, []) + $value END",
            &tag,
        )
        .await
    }

    async fn remove_tag(&self, id: &str, tag: &str) -> SphereResult<Contact> {
        let tag = clean_tag(tag)?;
        self.update_contact(id, "c.tags = [t IN coalesce(c.tags, []) WHERE t <> $value]", &tag)
            .await
    }

    async fn update_notes(&self, id: &str, notes: &str) -> SphereResult<Contact> {
        self.update_contact(id, "c.notes = $value", notes).await
    }

    async fn get_sync_token(&self) -> SphereResult<Option<String>> {
        let query = Query::new(
            "MATCH (m:SyncMeta {key: 'sync_token'}) RETURN coalesce(m.value, '') AS value".to_string(),
        );
        let token: Option<String> = self
            .client
            .query_scalar(query, "value")
            .await
            .map_err(SphereError::storage)?;
        Ok(token.and_then(non_empty))
    }

    async fn set_sync_token(&self, token: &str) -> SphereResult<()> {
        let query = Query::new(
            "MERGE (m:SyncMeta {key: 'sync_token'})
             SET m.value = $token, m.updated_at = $now"
                .to_string(),
        )
        .param("token", token)
        .param("now", Utc::now().to_rfc3339());
        self.client.execute(query).await.map_err(SphereError::storage)
    }
}

#[async_trait]
impl GraphQueries for Neo4jStore {
    async fn graph_statistics(&self) -> SphereResult<GraphStatistics> {
        queries::stats::graph_statistics(&self.client)
            .await
            .map_err(SphereError::storage)
    }

    async fn shortest_path(&self, source_id: &str, target_id: &str) -> SphereResult<Option<ContactPath>> {
        queries::path::shortest_path(&self.client, source_id, target_id)
            .await
            .map_err(SphereError::storage)
    }

    async fn communities(&self) -> SphereResult<Vec<Community>> {
        queries::communities::communities(&self.client)
            .await
            .map_err(SphereError::storage)
    }
}

const SEARCH_FILTER: &str = "WHERE any(v IN [c.name, c.email, c.phone, c.organization,
        c.previous_organization, c.school, c.city, c.country, c.address,
        c.birthday, c.notes] WHERE toLower(coalesce(v, '')) CONTAINS $term)
    OR any(t IN coalesce(c.tags, []) WHERE toLower(t) CONTAINS $term)";

pub(crate) fn non_empty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value).ok().map(|d| d.with_timezone(&Utc))
}

fn parse_metadata(value: &str) -> BTreeMap<String, String> {
    if value.is_empty() {
        return BTreeMap::new();
    }
    serde_json::from_str(value).unwrap_or_default()
}

fn contact_from_row(row: &Row) -> Contact {
    let text = |field: &str| -> String { row.get(field).unwrap_or_default() };
    let optional = |field: &str| non_empty(text(field));

    let raw_data = text("raw_data");
    Contact {
        id: text("id"),
        name: text("name"),
        email: optional("email"),
        phone: optional("phone"),
        organization: optional("organization"),
        previous_organization: optional("previous_organization"),
        school: optional("school"),
        city: optional("city"),
        country: optional("country"),
        street: optional("street"),
        postal_code: optional("postal_code"),
        address: optional("address"),
        birthday: optional("birthday"),
        photo_url: optional("photo_url"),
        notes: text("notes"),
        raw_data: serde_json::from_str(&raw_data).unwrap_or(serde_json::Value::Null),
        tags: row.get::<Vec<String>>("tags").unwrap_or_default().into_iter().collect(),
        uncategorized: row.get("uncategorized").unwrap_or(false),
        created_at: parse_timestamp(&text("created_at")),
        updated_at: parse_timestamp(&text("updated_at")),
    }
}

fn edge_from_row(row: &Row) -> Option<RelationshipEdge> {
    let source: String = row.get("source").unwrap_or_default();
    let target: String = row.get("target").unwrap_or_default();
    let rel_type: String = row.get("rel_type").unwrap_or_default();
    let relationship_type: RelationshipType = rel_type.parse().ok()?;
    if source.is_empty() || target.is_empty() {
        return None;
    }

    Some(RelationshipEdge {
        source_id: source,
        target_id: target,
        relationship_type,
        strength: row.get("strength").unwrap_or(1.0),
        metadata: parse_metadata(&row.get::<String>("metadata").unwrap_or_default()),
    })
}

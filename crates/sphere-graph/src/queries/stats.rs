//! Dashboard statistics.

use std::collections::BTreeMap;

use anyhow::Result;
use neo4rs::Query;

use sphere_core::insights::{ConnectedContact, GraphStatistics, TOP_CONNECTED_LIMIT};

use crate::GraphClient;

pub async fn graph_statistics(client: &GraphClient) -> Result<GraphStatistics> {
    let counts_query = Query::new(
        "MATCH (c:Contact)
         RETURN count(c) AS contacts,
                sum(CASE WHEN c.uncategorized THEN 1 ELSE 0 END) AS uncategorized"
            .to_string(),
    );
    let rows = client.query(counts_query).await?;
    let (contact_count, uncategorized_count) = rows
        .first()
        .map(|row| {
            let contacts: i64 = row.get("contacts").unwrap_or(0);
            let uncategorized: i64 = row.get("uncategorized").unwrap_or(0);
            (contacts as usize, uncategorized as usize)
        })
        .unwrap_or((0, 0));

    let types_query = Query::new(
        "MATCH (:Contact)-[r]->(:Contact)
         WHERE r.relationship_type IS NOT NULL
         RETURN r.relationship_type AS rel_type, count(r) AS count"
            .to_string(),
    );
    let mut relationship_types = BTreeMap::new();
    for row in client.query(types_query).await? {
        let rel_type: String = row.get("rel_type").unwrap_or_default();
        let count: i64 = row.get("count").unwrap_or(0);
        if !rel_type.is_empty() {
            relationship_types.insert(rel_type, count as usize);
        }
    }
    let relationship_count = relationship_types.values().sum();

    let top_query = Query::new(format!(
        "MATCH (c:Contact)-[r]-(:Contact)
         WHERE r.relationship_type IS NOT NULL
         RETURN c.id AS id, c.name AS name, count(r) AS connections
         ORDER BY connections DESC, name
         LIMIT {}",
        TOP_CONNECTED_LIMIT
    ));
    let top_connected = client
        .query(top_query)
        .await?
        .into_iter()
        .map(|row| ConnectedContact {
            id: row.get("id").unwrap_or_default(),
            name: row.get("name").unwrap_or_default(),
            connections: row.get::<i64>("connections").unwrap_or(0) as usize,
        })
        .collect();

    Ok(GraphStatistics {
        contact_count,
        relationship_count,
        uncategorized_count,
        relationship_types,
        top_connected,
    })
}

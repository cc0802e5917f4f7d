//! Organization communities.

use anyhow::Result;
use neo4rs::Query;

use sphere_core::insights::{Community, ContactRef};

use crate::GraphClient;

/// Case-insensitive organization groups with at least two members, largest first.
pub async fn communities(client: &GraphClient) -> Result<Vec<Community>> {
    let query = Query::new(
        "MATCH (c:Contact)
         WHERE trim(coalesce(c.organization, '')) <> ''
         WITH toLower(trim(c.organization)) AS key, c
         ORDER BY c.id
         WITH key, collect(c) AS members
         WHERE size(members) > 1
         RETURN trim(members[0].organization) AS name,
                [m IN members | m.id] AS ids,
                [m IN members | m.name] AS names"
            .to_string(),
    );

    let mut result = Vec::new();
    for row in client.query(query).await? {
        let ids: Vec<String> = row.get("ids").unwrap_or_default();
        let names: Vec<String> = row.get("names").unwrap_or_default();
        let mut members: Vec<ContactRef> = ids
            .into_iter()
            .zip(names)
            .map(|(id, name)| ContactRef { id, name })
            .collect();
        members.sort_by(|a, b| a.name.cmp(&b.name));

        result.push(Community {
            name: row.get("name").unwrap_or_default(),
            size: members.len(),
            members,
        });
    }

    result.sort_by(|a, b| b.size.cmp(&a.size).then_with(|| a.name.cmp(&b.name)));
    Ok(result)
}

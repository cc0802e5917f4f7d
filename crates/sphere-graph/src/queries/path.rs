//! Shortest relationship chain between two contacts.

use anyhow::Result;
use neo4rs::Query;

use sphere_core::insights::{ContactPath, ContactRef, MAX_PATH_HOPS};

use crate::GraphClient;

pub async fn shortest_path(client: &GraphClient, source_id: &str, target_id: &str) -> Result<Option<ContactPath>> {
    // shortestPath rejects identical endpoints.
    if source_id == target_id {
        let query = Query::new("MATCH (c:Contact {id: $id}) RETURN c.id AS id, c.name AS name".to_string())
            .param("id", source_id);
        let rows = client.query(query).await?;
        return Ok(rows.first().map(|row| ContactPath {
            nodes: vec![ContactRef {
                id: row.get("id").unwrap_or_default(),
                name: row.get("name").unwrap_or_default(),
            }],
            relationships: Vec::new(),
        }));
    }

    let query = Query::new(format!(
        "MATCH (a:Contact {{id: $source}}), (b:Contact {{id: $target}})
         MATCH p = shortestPath((a)-[*..{}]-(b))
         WHERE all(r IN relationships(p) WHERE r.relationship_type IS NOT NULL)
         RETURN [n IN nodes(p) | n.id] AS ids,
                [n IN nodes(p) | n.name] AS names,
                [r IN relationships(p) | r.relationship_type] AS rels",
        MAX_PATH_HOPS
    ))
    .param("source", source_id)
    .param("target", target_id);

    let rows = client.query(query).await?;
    let Some(row) = rows.first() else {
        return Ok(None);
    };

    let ids: Vec<String> = row.get("ids").unwrap_or_default();
    let names: Vec<String> = row.get("names").unwrap_or_default();
    let relationships: Vec<String> = row.get("rels").unwrap_or_default();

    Ok(Some(ContactPath { nodes: zip_refs(ids, names), relationships }))
}

fn zip_refs(ids: Vec<String>, names: Vec<String>) -> Vec<ContactRef> {
    let mut names = names.into_iter();
    ids.into_iter()
        .map(|id| ContactRef { id, name: names.next().unwrap_or_default() })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zip_refs_tolerates_short_names() {
        let refs = zip_refs(vec!["a".into(), "b".into()], vec!["Alice".into()]);
        assert_eq!(refs.len(), 2);
        assert_eq!(refs[0].name, "Alice");
        assert_eq!(refs[1].name, "");
    }
}

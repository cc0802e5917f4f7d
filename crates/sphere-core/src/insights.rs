//! Read-only aggregate views over the contact graph.
//!
//! These are the in-process implementations used by [`crate::MemoryStore`];
//! the Neo4j store answers the same questions with Cypher.

use std::collections::{BTreeMap, HashMap, VecDeque};

use serde::{Deserialize, Serialize};

use crate::contact::model::Contact;
use crate::organization::derive_organizations;
use crate::relationship::model::RelationshipEdge;

/// Longest path `shortest_path` will search for.
pub const MAX_PATH_HOPS: usize = 6;

/// How many contacts `graph_statistics` ranks by degree.
pub const TOP_CONNECTED_LIMIT: usize = 10;

/// Dashboard counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphStatistics {
    pub contact_count: usize,
    pub relationship_count: usize,
    pub uncategorized_count: usize,
    pub relationship_types: BTreeMap<String, usize>,
    pub top_connected: Vec<ConnectedContact>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectedContact {
    pub id: String,
    pub name: String,
    pub connections: usize,
}

/// A contact reference inside a path or community.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactRef {
    pub id: String,
    pub name: String,
}

/// Shortest chain of relationships between two contacts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactPath {
    pub nodes: Vec<ContactRef>,
    /// Relationship type names, one per hop.
    pub relationships: Vec<String>,
}

/// Contacts sharing an organization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Community {
    pub name: String,
    pub members: Vec<ContactRef>,
    pub size: usize,
}

pub fn graph_statistics(contacts: &[Contact], edges: &[RelationshipEdge]) -> GraphStatistics {
    let mut relationship_types: BTreeMap<String, usize> = BTreeMap::new();
    let mut degree: HashMap<&str, usize> = HashMap::new();

    for edge in edges {
        *relationship_types
            .entry(edge.relationship_type.as_str().to_string())
            .or_default() += 1;
        *degree.entry(edge.source_id.as_str()).or_default() += 1;
        *degree.entry(edge.target_id.as_str()).or_default() += 1;
    }

    let mut top_connected: Vec<ConnectedContact> = contacts
        .iter()
        .filter_map(|c| {
            degree.get(c.id.as_str()).map(|&connections| ConnectedContact {
                id: c.id.clone(),
                name: c.name.clone(),
                connections,
            })
        })
        .collect();
    top_connected.sort_by(|a, b| b.connections.cmp(&a.connections).then_with(|| a.name.cmp(&b.name)));
    top_connected.truncate(TOP_CONNECTED_LIMIT);

    GraphStatistics {
        contact_count: contacts.len(),
        relationship_count: edges.len(),
        uncategorized_count: contacts.iter().filter(|c| c.lacks_signal()).count(),
        relationship_types,
        top_connected,
    }
}

/// Breadth-first search over inferred edges (treated as undirected).
///
/// Returns `None` when either contact is unknown or no path of at most
/// [`MAX_PATH_HOPS`] exists. Neighbors are visited in id order, so ties
/// resolve the same way every time.
pub fn shortest_path(
    contacts: &[Contact],
    edges: &[RelationshipEdge],
    source_id: &str,
    target_id: &str,
) -> Option<ContactPath> {
    let names: HashMap<&str, &str> = contacts.iter().map(|c| (c.id.as_str(), c.name.as_str())).collect();
    if !names.contains_key(source_id) || !names.contains_key(target_id) {
        return None;
    }

    let to_ref = |id: &str| ContactRef {
        id: id.to_string(),
        name: names.get(id).copied().unwrap_or_default().to_string(),
    };

    if source_id == target_id {
        return Some(ContactPath { nodes: vec![to_ref(source_id)], relationships: Vec::new() });
    }

    let mut adjacency: BTreeMap<&str, BTreeMap<&str, &str>> = BTreeMap::new();
    for edge in edges {
        let rel = edge.relationship_type.as_str();
        adjacency
            .entry(edge.source_id.as_str())
            .or_default()
            .entry(edge.target_id.as_str())
            .or_insert(rel);
        adjacency
            .entry(edge.target_id.as_str())
            .or_default()
            .entry(edge.source_id.as_str())
            .or_insert(rel);
    }

    // node -> (previous node, relationship used, depth)
    let mut visited: HashMap<&str, (Option<&str>, &str, usize)> = HashMap::new();
    let mut queue = VecDeque::new();
    visited.insert(source_id, (None, "", 0));
    queue.push_back(source_id);

    while let Some(current) = queue.pop_front() {
        let depth = visited[current].2;
        if current == target_id {
            break;
        }
        if depth >= MAX_PATH_HOPS {
            continue;
        }
        if let Some(neighbors) = adjacency.get(current) {
            for (&next, &rel) in neighbors {
                if !visited.contains_key(next) {
                    visited.insert(next, (Some(current), rel, depth + 1));
                    queue.push_back(next);
                }
            }
        }
    }

    visited.get(target_id)?;

    let mut nodes = Vec::new();
    let mut relationships = Vec::new();
    let mut cursor = target_id;
    while let Some(&(prev, rel, _)) = visited.get(cursor) {
        nodes.push(to_ref(cursor));
        match prev {
            Some(p) => {
                relationships.push(rel.to_string());
                cursor = p;
            }
            None => break,
        }
    }
    nodes.reverse();
    relationships.reverse();

    Some(ContactPath { nodes, relationships })
}

/// Organizations with at least two members, largest first.
pub fn communities(contacts: &[Contact]) -> Vec<Community> {
    let names: HashMap<&str, &str> = contacts.iter().map(|c| (c.id.as_str(), c.name.as_str())).collect();

    let mut result: Vec<Community> = derive_organizations(contacts)
        .into_iter()
        .filter(|org| org.employee_count > 1)
        .map(|org| {
            let mut members: Vec<ContactRef> = org
                .member_ids
                .iter()
                .map(|id| ContactRef {
                    id: id.clone(),
                    name: names.get(id.as_str()).copied().unwrap_or_default().to_string(),
                })
                .collect();
            members.sort_by(|a, b| a.name.cmp(&b.name));
            Community { name: org.name, size: members.len(), members }
        })
        .collect();

    result.sort_by(|a, b| b.size.cmp(&a.size).then_with(|| a.name.cmp(&b.name)));
    result
}

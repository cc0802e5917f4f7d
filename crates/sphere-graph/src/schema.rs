//! Neo4j schema initialization (constraints and indexes).

use anyhow::Result;
use neo4rs::Query;
use tracing::info;

use crate::GraphClient;

const SCHEMA_STATEMENTS: &[&str] = &[
    "CREATE CONSTRAINT contact_id IF NOT EXISTS FOR (c:Contact) REQUIRE c.id IS UNIQUE",
    "CREATE CONSTRAINT sync_meta_key IF NOT EXISTS FOR (m:SyncMeta) REQUIRE m.key IS UNIQUE",
    "CREATE INDEX contact_name IF NOT EXISTS FOR (c:Contact) ON (c.name)",
    "CREATE INDEX contact_email IF NOT EXISTS FOR (c:Contact) ON (c.email)",
    "CREATE INDEX contact_organization IF NOT EXISTS FOR (c:Contact) ON (c.organization)",
];

/// Create constraints and indexes. Safe to run repeatedly.
pub async fn initialize_schema(client: &GraphClient) -> Result<()> {
    info!("Initializing Neo4j schema...");

    for statement in SCHEMA_STATEMENTS {
        client.execute(Query::new(statement.to_string())).await?;
    }

    info!("Neo4j schema initialized ({} statements)", SCHEMA_STATEMENTS.len());
    Ok(())
}

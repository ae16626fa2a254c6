use crate::graph::models::{Direction, Edge, Node, Value};
use anyhow::{Context, Result, anyhow};
use log::debug;
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{Connection, OptionalExtension, params};
use std::collections::HashMap;

const IN_MEMORY_PATH: &str = ":memory:";

/// Nodes and edges with JSON property maps, stored in SQLite.
pub struct GraphDatabase {
    pool: Pool<SqliteConnectionManager>,
}

type RawNode = (String, String, String);
type RawEdge = (String, String, String, String, String);

fn decode_properties(json: &str, owner: &str) -> Result<HashMap<String, Value>> {
    serde_json::from_str(json).with_context(|| format!("Failed to deserialize properties of {}", owner))
}

fn decode_node((id, label, properties): RawNode) -> Result<Node> {
    let properties = decode_properties(&properties, &id)?;
    Ok(Node::with_id(&id, &label, properties))
}

fn decode_edge((id, source_id, target_id, label, properties): RawEdge) -> Result<Edge> {
    let properties = decode_properties(&properties, &id)?;
    Ok(Edge::with_id(&id, &source_id, &label, &target_id, properties))
}

impl GraphDatabase {
    /// An in-memory database. Every pooled connection to `:memory:` opens its
    /// own database, so the pool holds exactly one.
    pub fn new_in_memory() -> Result<Self> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .context("Failed to create connection pool")?;

        let db = Self { pool };
        db.initialize_schema()?;
        Ok(db)
    }

    /// A file-backed database at `path`; `:memory:` is the same as `new_in_memory`.
    pub fn new(path: &str) -> Result<Self> {
        if path == IN_MEMORY_PATH {
            return Self::new_in_memory();
        }
        let manager = SqliteConnectionManager::file(path);
        let pool = Pool::builder()
            .max_size(4)
            .build(manager)
            .context("Failed to create connection pool")?;

        let db = Self { pool };
        db.initialize_schema()?;
        debug!("opened graph database at {}", path);
        Ok(db)
    }

    fn initialize_schema(&self) -> Result<()> {
        let conn = self.pool.get().context("Failed to get connection from pool")?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS nodes (
                id TEXT PRIMARY KEY,
                label TEXT NOT NULL,
                properties TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS edges (
                id TEXT PRIMARY KEY,
                source_id TEXT NOT NULL,
                target_id TEXT NOT NULL,
                label TEXT NOT NULL,
                properties TEXT NOT NULL,
                FOREIGN KEY (source_id) REFERENCES nodes (id),
                FOREIGN KEY (target_id) REFERENCES nodes (id)
            );
            CREATE INDEX IF NOT EXISTS idx_edges_source_id ON edges (source_id);
            CREATE INDEX IF NOT EXISTS idx_edges_target_id ON edges (target_id);
            CREATE INDEX IF NOT EXISTS idx_nodes_label ON nodes (label);",
        )
        .context("Failed to create graph schema")?;

        // WAL is refused by in-memory databases; that is fine.
        let _ = conn.pragma_update(None, "journal_mode", "WAL");
        conn.pragma_update(None, "foreign_keys", "ON")
            .context("Failed to enable foreign keys")?;
        Ok(())
    }

    /// Runs `f` inside a transaction, committing on `Ok` and rolling back on `Err`.
    pub fn with_transaction<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&rusqlite::Transaction) -> Result<T>,
    {
        let mut conn = self.pool.get().context("Failed to get connection from pool")?;
        let tx = conn.transaction()?;
        let value = f(&tx)?;
        tx.commit().context("Failed to commit transaction")?;
        Ok(value)
    }

    /// Inserts a node on `conn`, which may be a transaction.
    pub fn insert_node(conn: &Connection, label: &str, properties: HashMap<String, Value>) -> Result<String> {
        let node = Node::new(label, properties);
        let properties_json = serde_json::to_string(&node.properties).context("Failed to serialize node properties")?;
        conn.execute(
            "INSERT INTO nodes (id, label, properties) VALUES (?1, ?2, ?3)",
            params![node.id, node.label, properties_json],
        )
        .context("Failed to insert node")?;
        Ok(node.id)
    }

    /// Inserts an edge on `conn` after checking that both endpoints exist.
    pub fn insert_edge(
        conn: &Connection,
        source_id: &str,
        label: &str,
        target_id: &str,
        properties: HashMap<String, Value>,
    ) -> Result<String> {
        for (role, id) in [("Source", source_id), ("Target", target_id)] {
            let exists = conn
                .query_row("SELECT 1 FROM nodes WHERE id = ?1", params![id], |_| Ok(()))
                .optional()?
                .is_some();
            if !exists {
                return Err(anyhow!("{} node with ID '{}' does not exist", role, id));
            }
        }
        let edge = Edge::new(source_id, label, target_id, properties);
        let properties_json = serde_json::to_string(&edge.properties).context("Failed to serialize edge properties")?;
        conn.execute(
            "INSERT INTO edges (id, source_id, target_id, label, properties)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![edge.id, edge.source_id, edge.target_id, edge.label, properties_json],
        )
        .context("Failed to insert edge")?;
        Ok(edge.id)
    }

    pub fn add_node(&self, label: &str, properties: HashMap<String, Value>) -> Result<String> {
        let conn = self.pool.get().context("Failed to get connection from pool")?;
        Self::insert_node(&conn, label, properties)
    }

    pub fn add_edge(
        &self,
        source_id: &str,
        label: &str,
        target_id: &str,
        properties: HashMap<String, Value>,
    ) -> Result<String> {
        let conn = self.pool.get().context("Failed to get connection from pool")?;
        Self::insert_edge(&conn, source_id, label, target_id, properties)
    }

    pub fn get_node(&self, id: &str) -> Result<Option<Node>> {
        let conn = self.pool.get().context("Failed to get connection from pool")?;
        let raw = conn
            .query_row(
                "SELECT id, label, properties FROM nodes WHERE id = ?1",
                params![id],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()?;
        raw.map(decode_node).transpose()
    }

    /// Nodes with `label` in insertion order.
    pub fn find_nodes_by_label(&self, label: &str) -> Result<Vec<Node>> {
        let conn = self.pool.get().context("Failed to get connection from pool")?;
        let mut stmt = conn.prepare("SELECT id, label, properties FROM nodes WHERE label = ?1 ORDER BY rowid")?;
        let rows = stmt.query_map(params![label], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?;
        let mut nodes = Vec::new();
        for raw in rows {
            nodes.push(decode_node(raw?)?);
        }
        Ok(nodes)
    }

    /// Nodes with `label` whose property `name` equals `value`.
    pub fn find_nodes_by_property(&self, label: &str, name: &str, value: &Value) -> Result<Vec<Node>> {
        Ok(self
            .find_nodes_by_label(label)?
            .into_iter()
            .filter(|node| node.property(name) == Some(value))
            .collect())
    }

    /// Neighbours of `id` along edges in `direction`, optionally restricted to
    /// one edge label.
    pub fn get_neighbors(&self, id: &str, direction: Direction, edge_label: Option<&str>) -> Result<Vec<(Node, Edge)>> {
        let conn = self.pool.get().context("Failed to get connection from pool")?;
        let (join, filter) = match direction {
            Direction::Outgoing => ("e.target_id", "e.source_id"),
            Direction::Incoming => ("e.source_id", "e.target_id"),
        };
        let sql = format!(
            "SELECT e.id, e.source_id, e.target_id, e.label, e.properties,
                    n.id, n.label, n.properties
             FROM edges e
             JOIN nodes n ON {} = n.id
             WHERE {} = ?1 AND (?2 IS NULL OR e.label = ?2)
             ORDER BY e.rowid",
            join, filter
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![id, edge_label], |row| {
            let edge: RawEdge = (row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?);
            let node: RawNode = (row.get(5)?, row.get(6)?, row.get(7)?);
            Ok((node, edge))
        })?;
        let mut neighbors = Vec::new();
        for raw in rows {
            let (node, edge) = raw?;
            neighbors.push((decode_node(node)?, decode_edge(edge)?));
        }
        Ok(neighbors)
    }

    pub fn count_nodes(&self, label: &str) -> Result<usize> {
        let conn = self.pool.get().context("Failed to get connection from pool")?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM nodes WHERE label = ?1", params![label], |row| {
            row.get(0)
        })?;
        Ok(count as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(name: &str) -> HashMap<String, Value> {
        HashMap::from([("name".to_string(), Value::from(name))])
    }

    #[test]
    fn test_add_and_get_node() {
        let db = GraphDatabase::new_in_memory().unwrap();
        let id = db.add_node("Person", named("Alice")).unwrap();
        let node = db.get_node(&id).unwrap().unwrap();
        assert_eq!(node.label, "Person");
        assert_eq!(node.property("name").and_then(Value::as_str), Some("Alice"));
        assert!(db.get_node("missing").unwrap().is_none());
    }

    #[test]
    fn test_labels_keep_insertion_order() {
        let db = GraphDatabase::new_in_memory().unwrap();
        for name in ["Carol", "Alice", "Bob"] {
            db.add_node("Person", named(name)).unwrap();
        }
        db.add_node("Post", named("Post1")).unwrap();
        let names: Vec<String> = db
            .find_nodes_by_label("Person")
            .unwrap()
            .iter()
            .filter_map(|n| n.property("name").and_then(Value::as_str).map(str::to_string))
            .collect();
        assert_eq!(names, vec!["Carol", "Alice", "Bob"]);
        assert_eq!(db.count_nodes("Post").unwrap(), 1);
    }

    #[test]
    fn test_neighbors_by_direction_and_label() {
        let db = GraphDatabase::new_in_memory().unwrap();
        let alice = db.add_node("Person", named("Alice")).unwrap();
        let post = db.add_node("Post", named("Post1")).unwrap();
        let comment = db.add_node("Comment", named("Comment1")).unwrap();
        db.add_edge(&alice, "AUTHORED", &post, HashMap::new()).unwrap();
        db.add_edge(&comment, "COMMENTED_ON", &post, HashMap::new()).unwrap();

        let incoming = db.get_neighbors(&post, Direction::Incoming, None).unwrap();
        assert_eq!(incoming.len(), 2);
        let authors = db.get_neighbors(&post, Direction::Incoming, Some("AUTHORED")).unwrap();
        assert_eq!(authors.len(), 1);
        assert_eq!(authors[0].0.id, alice);
        let outgoing = db.get_neighbors(&alice, Direction::Outgoing, None).unwrap();
        assert_eq!(outgoing[0].1.label, "AUTHORED");
    }

    #[test]
    fn test_edge_requires_both_nodes() {
        let db = GraphDatabase::new_in_memory().unwrap();
        let alice = db.add_node("Person", named("Alice")).unwrap();
        assert!(db.add_edge(&alice, "AUTHORED", "nowhere", HashMap::new()).is_err());
    }

    #[test]
    fn test_find_nodes_by_property() {
        let db = GraphDatabase::new_in_memory().unwrap();
        db.add_node("Person", HashMap::from([("entity_id".to_string(), Value::from(1))])).unwrap();
        db.add_node("Person", HashMap::from([("entity_id".to_string(), Value::from(2))])).unwrap();
        let found = db.find_nodes_by_property("Person", "entity_id", &Value::from(2)).unwrap();
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn test_transaction_rollback() {
        let db = GraphDatabase::new_in_memory().unwrap();
        let result: Result<()> = db.with_transaction(|tx| {
            GraphDatabase::insert_node(tx, "Person", named("Ghost"))?;
            Err(anyhow!("forced rollback"))
        });
        assert!(result.is_err());
        assert_eq!(db.count_nodes("Person").unwrap(), 0);
    }

    #[test]
    fn test_new_file_database() {
        use tempfile::tempdir;

        let dir = tempdir().unwrap();
        let db_path = dir.path().join("graph.db");
        let db_path_str = db_path.to_str().unwrap();
        {
            let db = GraphDatabase::new(db_path_str).unwrap();
            db.add_node("Person", named("Alice")).unwrap();
        }
        assert!(db_path.exists());
        let db = GraphDatabase::new(db_path_str).unwrap();
        assert_eq!(db.find_nodes_by_label("Person").unwrap().len(), 1);
    }
}

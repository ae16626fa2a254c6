use crate::network::common::errors::{NetworkError, NetworkResult};
use log::{debug, info};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::fs;
use std::str::FromStr;
use std::sync::Arc;

/// Rows must sum to one within this bound.
pub const PROBABILITY_TOLERANCE: f64 = 1e-6;

pub const INTERESTS: [&str; 2] = ["sports", "politics"];
pub const CONNECTION_TYPES: [&str; 3] = ["family", "close friend", "acquaintance"];
pub const MATCH_LABELS: [&str; 2] = ["no", "yes"];

/// The four kinds of entity that become random variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntityKind {
    Person,
    Post,
    Connection,
    Comment,
}

impl EntityKind {
    pub const ALL: [EntityKind; 4] = [
        EntityKind::Person,
        EntityKind::Post,
        EntityKind::Connection,
        EntityKind::Comment,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Person => "Person",
            EntityKind::Post => "Post",
            EntityKind::Connection => "Connection",
            EntityKind::Comment => "Comment",
        }
    }

    /// Prefix of the trace names of this kind's sites.
    pub fn trace_prefix(&self) -> &'static str {
        match self {
            EntityKind::Person => "Interest",
            EntityKind::Post => "Topic",
            EntityKind::Connection => "Connection",
            EntityKind::Comment => "Comment",
        }
    }

    /// Kinds whose values index this kind's table, in row-major order.
    pub fn parent_kinds(&self) -> &'static [EntityKind] {
        match self {
            EntityKind::Person => &[],
            EntityKind::Post => &[EntityKind::Person],
            EntityKind::Connection => &[],
            EntityKind::Comment => &[EntityKind::Person, EntityKind::Post, EntityKind::Connection],
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Person" => Ok(EntityKind::Person),
            "Post" => Ok(EntityKind::Post),
            "Connection" => Ok(EntityKind::Connection),
            "Comment" => Ok(EntityKind::Comment),
            _ => Err(format!("Unknown entity kind: {}", s)),
        }
    }
}

/// Serialized form of one conditional probability table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableSpec {
    pub kind: EntityKind,
    pub domain: Vec<String>,
    /// One row per parent configuration.
    pub probabilities: Vec<Vec<f64>>,
}

/// Serialized form of the whole registry, as stored in `config/registry.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrySpec {
    pub tables: Vec<TableSpec>,
}

fn labels(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

impl RegistrySpec {
    /// The tables of the social network model.
    pub fn standard() -> Self {
        let matching = [vec![0.1, 0.9], vec![0.2, 0.8], vec![0.4, 0.6]];
        let differing = [vec![0.5, 0.5], vec![0.7, 0.3], vec![0.95, 0.05]];
        let mut comment_rows = Vec::new();
        for interest in 0..INTERESTS.len() {
            for topic in 0..INTERESTS.len() {
                let rows = if interest == topic { &matching } else { &differing };
                comment_rows.extend(rows.iter().cloned());
            }
        }

        RegistrySpec {
            tables: vec![
                TableSpec {
                    kind: EntityKind::Person,
                    domain: labels(&INTERESTS),
                    probabilities: vec![vec![0.5, 0.5]],
                },
                TableSpec {
                    kind: EntityKind::Post,
                    domain: labels(&INTERESTS),
                    probabilities: vec![vec![0.8, 0.2], vec![0.2, 0.8]],
                },
                TableSpec {
                    kind: EntityKind::Connection,
                    domain: labels(&CONNECTION_TYPES),
                    probabilities: vec![vec![1.0 / 3.0; 3]],
                },
                TableSpec {
                    kind: EntityKind::Comment,
                    domain: labels(&MATCH_LABELS),
                    probabilities: comment_rows,
                },
            ],
        }
    }
}

/// A validated table: one row of `rows` per parent configuration.
#[derive(Debug, Clone)]
pub struct ConditionalTable {
    kind: EntityKind,
    domain: Arc<[String]>,
    parent_cardinalities: Vec<usize>,
    rows: Array2<f64>,
}

impl ConditionalTable {
    fn build(spec: TableSpec, cardinalities: &BTreeMap<EntityKind, usize>) -> NetworkResult<Self> {
        let kind = spec.kind;
        if spec.domain.is_empty() {
            return Err(NetworkError::config(kind, "domain is empty"));
        }
        let mut seen = HashSet::new();
        for label in &spec.domain {
            if !seen.insert(label.as_str()) {
                return Err(NetworkError::config(kind, format!("label '{}' appears twice", label)));
            }
        }

        let mut parent_cardinalities = Vec::new();
        for parent in kind.parent_kinds() {
            let cardinality = cardinalities
                .get(parent)
                .copied()
                .ok_or_else(|| NetworkError::config(kind, format!("parent {} has no table", parent)))?;
            parent_cardinalities.push(cardinality);
        }
        let expected_rows: usize = parent_cardinalities.iter().product();
        if spec.probabilities.len() != expected_rows {
            return Err(NetworkError::config(
                kind,
                format!("expected {} rows, found {}", expected_rows, spec.probabilities.len()),
            ));
        }

        let width = spec.domain.len();
        let mut flat = Vec::with_capacity(expected_rows * width);
        for (index, row) in spec.probabilities.iter().enumerate() {
            if row.len() != width {
                return Err(NetworkError::config(
                    kind,
                    format!("row {} has {} entries for {} labels", index, row.len(), width),
                ));
            }
            if row.iter().any(|p| !p.is_finite() || *p < 0.0) {
                return Err(NetworkError::config(kind, format!("row {} has a negative or non-finite entry", index)));
            }
            let total: f64 = row.iter().sum();
            if (total - 1.0).abs() > PROBABILITY_TOLERANCE {
                return Err(NetworkError::config(kind, format!("row {} sums to {}", index, total)));
            }
            flat.extend_from_slice(row);
        }
        let rows = Array2::from_shape_vec((expected_rows, width), flat)
            .map_err(|e| NetworkError::config(kind, e.to_string()))?;

        Ok(ConditionalTable {
            kind,
            domain: spec.domain.into(),
            parent_cardinalities,
            rows,
        })
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn domain(&self) -> &[String] {
        &self.domain
    }

    pub fn parent_cardinalities(&self) -> &[usize] {
        &self.parent_cardinalities
    }

    fn row_index(&self, parent_values: &[usize]) -> NetworkResult<usize> {
        if parent_values.len() != self.parent_cardinalities.len() {
            return Err(NetworkError::config(
                self.kind,
                format!(
                    "expected {} parent values, got {}",
                    self.parent_cardinalities.len(),
                    parent_values.len()
                ),
            ));
        }
        let mut index = 0;
        for (position, (&value, &cardinality)) in
            parent_values.iter().zip(&self.parent_cardinalities).enumerate()
        {
            if value >= cardinality {
                return Err(NetworkError::config(
                    self.kind,
                    format!("parent {} value {} is out of range 0..{}", position, value, cardinality),
                ));
            }
            index = index * cardinality + value;
        }
        Ok(index)
    }

    /// The distribution over this kind's domain selected by `parent_values`.
    pub fn probabilities(&self, parent_values: &[usize]) -> NetworkResult<&[f64]> {
        let row = self.row_index(parent_values)?;
        self.rows
            .row(row)
            .to_slice()
            .ok_or_else(|| NetworkError::config(self.kind, "table rows are not contiguous"))
    }

    fn to_spec(&self) -> TableSpec {
        TableSpec {
            kind: self.kind,
            domain: self.domain.to_vec(),
            probabilities: self.rows.rows().into_iter().map(|row| row.to_vec()).collect(),
        }
    }
}

/// Immutable value domains and CPTs for every entity kind. Shared read-only
/// between workers once loaded.
#[derive(Debug, Clone)]
pub struct Registry {
    person: ConditionalTable,
    post: ConditionalTable,
    connection: ConditionalTable,
    comment: ConditionalTable,
}

impl Registry {
    pub fn standard() -> NetworkResult<Self> {
        Self::from_spec(RegistrySpec::standard())
    }

    pub fn from_spec(spec: RegistrySpec) -> NetworkResult<Self> {
        let mut specs: BTreeMap<EntityKind, TableSpec> = BTreeMap::new();
        for table in spec.tables {
            let kind = table.kind;
            if specs.insert(kind, table).is_some() {
                return Err(NetworkError::config(kind, "table declared more than once"));
            }
        }
        let cardinalities: BTreeMap<EntityKind, usize> = specs
            .iter()
            .map(|(kind, table)| (*kind, table.domain.len()))
            .collect();

        let mut tables = BTreeMap::new();
        for kind in EntityKind::ALL {
            let table = specs
                .remove(&kind)
                .ok_or_else(|| NetworkError::config(kind, "missing table"))?;
            tables.insert(kind, ConditionalTable::build(table, &cardinalities)?);
        }
        debug!("validated {} conditional tables", tables.len());

        let mut take = |kind: EntityKind| {
            tables
                .remove(&kind)
                .ok_or_else(|| NetworkError::config(kind, "missing table"))
        };
        Ok(Registry {
            person: take(EntityKind::Person)?,
            post: take(EntityKind::Post)?,
            connection: take(EntityKind::Connection)?,
            comment: take(EntityKind::Comment)?,
        })
    }

    /// Loads and validates a registry from a JSON [`RegistrySpec`].
    pub fn load_from_file(path: &str) -> anyhow::Result<Self> {
        info!("Loading registry from file: {}", path);
        let json = fs::read_to_string(path)?;
        let spec: RegistrySpec = serde_json::from_str(&json)?;
        Ok(Self::from_spec(spec)?)
    }

    pub fn save_to_file(&self, path: &str) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(&self.to_spec())?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn to_spec(&self) -> RegistrySpec {
        RegistrySpec {
            tables: EntityKind::ALL.iter().map(|kind| self.table(*kind).to_spec()).collect(),
        }
    }

    pub fn table(&self, kind: EntityKind) -> &ConditionalTable {
        match kind {
            EntityKind::Person => &self.person,
            EntityKind::Post => &self.post,
            EntityKind::Connection => &self.connection,
            EntityKind::Comment => &self.comment,
        }
    }

    pub fn domain(&self, kind: EntityKind) -> &[String] {
        self.table(kind).domain()
    }

    /// The domain as a cheaply clonable handle, held by every sampled site.
    pub fn shared_domain(&self, kind: EntityKind) -> Arc<[String]> {
        Arc::clone(&self.table(kind).domain)
    }

    pub fn cpt(&self, kind: EntityKind, parent_values: &[usize]) -> NetworkResult<&[f64]> {
        self.table(kind).probabilities(parent_values)
    }

    pub fn label_index(&self, kind: EntityKind, label: &str) -> Option<usize> {
        self.domain(kind).iter().position(|l| l == label)
    }

    pub fn label(&self, kind: EntityKind, index: usize) -> Option<&str> {
        self.domain(kind).get(index).map(|l| l.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_registry_validates() {
        let registry = Registry::standard().unwrap();
        assert_eq!(registry.domain(EntityKind::Person), &["sports", "politics"]);
        assert_eq!(registry.domain(EntityKind::Connection).len(), 3);
        assert_eq!(registry.cpt(EntityKind::Person, &[]).unwrap(), &[0.5, 0.5]);
        assert_eq!(registry.cpt(EntityKind::Post, &[1]).unwrap(), &[0.2, 0.8]);
    }

    #[test]
    fn test_comment_rows_follow_parent_order() {
        let registry = Registry::standard().unwrap();
        // politics commenter, politics post, family
        assert_eq!(registry.cpt(EntityKind::Comment, &[1, 1, 0]).unwrap(), &[0.1, 0.9]);
        // sports commenter, politics post, acquaintance
        assert_eq!(registry.cpt(EntityKind::Comment, &[0, 1, 2]).unwrap(), &[0.95, 0.05]);
        assert_eq!(registry.table(EntityKind::Comment).parent_cardinalities(), &[2, 2, 3]);
    }

    #[test]
    fn test_parent_value_out_of_range() {
        let registry = Registry::standard().unwrap();
        let err = registry.cpt(EntityKind::Post, &[2]).unwrap_err();
        assert!(matches!(err, NetworkError::Config { kind: EntityKind::Post, .. }));
        let err = registry.cpt(EntityKind::Comment, &[0, 0]).unwrap_err();
        assert!(matches!(err, NetworkError::Config { kind: EntityKind::Comment, .. }));
    }

    #[test]
    fn test_rejects_row_not_summing_to_one() {
        let mut spec = RegistrySpec::standard();
        spec.tables[1].probabilities[0] = vec![0.8, 0.3];
        let err = Registry::from_spec(spec).unwrap_err();
        assert!(matches!(err, NetworkError::Config { kind: EntityKind::Post, .. }));
    }

    #[test]
    fn test_rejects_missing_and_duplicate_tables() {
        let mut spec = RegistrySpec::standard();
        spec.tables.retain(|t| t.kind != EntityKind::Connection);
        assert!(matches!(
            Registry::from_spec(spec).unwrap_err(),
            NetworkError::Config { kind: EntityKind::Connection, .. }
        ));

        let mut spec = RegistrySpec::standard();
        let person = spec.tables[0].clone();
        spec.tables.push(person);
        assert!(matches!(
            Registry::from_spec(spec).unwrap_err(),
            NetworkError::Config { kind: EntityKind::Person, .. }
        ));
    }

    #[test]
    fn test_rejects_wrong_row_count() {
        // A third interest makes the post and comment tables too short.
        let mut spec = RegistrySpec::standard();
        spec.tables[0].domain.push("music".to_string());
        spec.tables[0].probabilities = vec![vec![0.4, 0.4, 0.2]];
        let err = Registry::from_spec(spec).unwrap_err();
        assert!(matches!(err, NetworkError::Config { kind: EntityKind::Post, .. }));
    }

    #[test]
    fn test_spec_round_trip_preserves_tables() {
        let registry = Registry::standard().unwrap();
        let rebuilt = Registry::from_spec(registry.to_spec()).unwrap();
        for kind in EntityKind::ALL {
            assert_eq!(registry.domain(kind), rebuilt.domain(kind));
        }
        assert_eq!(
            rebuilt.cpt(EntityKind::Comment, &[0, 0, 1]).unwrap(),
            registry.cpt(EntityKind::Comment, &[0, 0, 1]).unwrap()
        );
    }

    #[test]
    fn test_label_lookup() {
        let registry = Registry::standard().unwrap();
        assert_eq!(registry.label_index(EntityKind::Connection, "close friend"), Some(1));
        assert_eq!(registry.label_index(EntityKind::Comment, "maybe"), None);
        assert_eq!(registry.label(EntityKind::Comment, 1), Some("yes"));
        assert_eq!("Post".parse::<EntityKind>(), Ok(EntityKind::Post));
    }
}

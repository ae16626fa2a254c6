use crate::graph::database::GraphDatabase;
use crate::graph::models::{Direction, Node, Value};
use crate::network::graphdb::schema::{EdgeLabel, NodeLabel, property};
use crate::network::records::{CommentRecord, PersonRecord, PostRecord, RecordSink, RecordSource};
use anyhow::{Context, Result, anyhow, bail};
use log::debug;
use std::collections::HashMap;
use std::sync::Arc;

/// Persons, posts and comments stored as graph nodes, with their references as
/// edges. Several knowledge bases can share one database under different
/// namespaces.
pub struct GraphRecordStore {
    pub graph_db: Arc<GraphDatabase>,
    pub namespace: String,
}

fn entity_id(node: &Node) -> Result<u64> {
    node.property(property::ENTITY_ID)
        .and_then(Value::as_integer)
        .and_then(|id| u64::try_from(id).ok())
        .ok_or_else(|| anyhow!("{} node {} has no valid {}", node.label, node.id, property::ENTITY_ID))
}

fn entity_name(node: &Node) -> Result<String> {
    node.property(property::NAME)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| anyhow!("{} node {} has no {}", node.label, node.id, property::NAME))
}

impl GraphRecordStore {
    pub fn new(graph_db: Arc<GraphDatabase>, namespace: &str) -> Self {
        Self {
            graph_db,
            namespace: namespace.to_string(),
        }
    }

    pub fn new_in_memory(namespace: &str) -> Result<Self> {
        let graph_db = Arc::new(GraphDatabase::new_in_memory()?);
        Ok(Self::new(graph_db, namespace))
    }

    pub fn new_with_file(path: &str, namespace: &str) -> Result<Self> {
        let graph_db = Arc::new(GraphDatabase::new(path)?);
        Ok(Self::new(graph_db, namespace))
    }

    fn properties(&self, id: u64, name: &str) -> Result<HashMap<String, Value>> {
        let id = i64::try_from(id).with_context(|| format!("entity id {} does not fit the store", id))?;
        Ok(HashMap::from([
            (property::ENTITY_ID.to_string(), Value::Integer(id)),
            (property::NAME.to_string(), Value::from(name)),
            (property::NAMESPACE.to_string(), Value::from(self.namespace.as_str())),
        ]))
    }

    /// Record nodes of `label` in this namespace.
    fn nodes(&self, label: NodeLabel) -> Result<Vec<Node>> {
        let namespace = Value::from(self.namespace.as_str());
        self.graph_db
            .find_nodes_by_property(label.as_str(), property::NAMESPACE, &namespace)
    }

    fn find(&self, label: NodeLabel, id: u64) -> Result<Option<Node>> {
        for node in self.nodes(label)? {
            if entity_id(&node)? == id {
                return Ok(Some(node));
            }
        }
        Ok(None)
    }

    /// The entity id of the single neighbour of `node` along `edge`.
    fn linked_id(&self, node: &Node, direction: Direction, edge: EdgeLabel) -> Result<u64> {
        let neighbors = self
            .graph_db
            .get_neighbors(&node.id, direction, Some(edge.as_str()))?;
        match neighbors.as_slice() {
            [(neighbor, _)] => entity_id(neighbor),
            [] => bail!("{} node {} has no {} edge", node.label, node.id, edge),
            _ => bail!("{} node {} has more than one {} edge", node.label, node.id, edge),
        }
    }
}

impl RecordSource for GraphRecordStore {
    fn persons(&self) -> Result<Vec<PersonRecord>> {
        let mut persons = self
            .nodes(NodeLabel::Person)?
            .iter()
            .map(|node| {
                Ok(PersonRecord {
                    id: entity_id(node)?,
                    name: entity_name(node)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        persons.sort_by_key(|p| p.id);
        Ok(persons)
    }

    fn posts(&self) -> Result<Vec<PostRecord>> {
        let mut posts = Vec::new();
        for node in self.nodes(NodeLabel::Post)? {
            posts.push(PostRecord {
                id: entity_id(&node)?,
                name: entity_name(&node)?,
                poster_id: self.linked_id(&node, Direction::Incoming, EdgeLabel::Authored)?,
            });
        }
        posts.sort_by_key(|p| p.id);
        Ok(posts)
    }

    fn comments(&self) -> Result<Vec<CommentRecord>> {
        let mut comments = Vec::new();
        for node in self.nodes(NodeLabel::Comment)? {
            comments.push(CommentRecord {
                id: entity_id(&node)?,
                name: entity_name(&node)?,
                post_id: self.linked_id(&node, Direction::Outgoing, EdgeLabel::CommentedOn)?,
                commenter_id: self.linked_id(&node, Direction::Incoming, EdgeLabel::Wrote)?,
            });
        }
        comments.sort_by_key(|c| c.id);
        Ok(comments)
    }
}

impl RecordSink for GraphRecordStore {
    fn add_person(&mut self, id: u64, name: &str) -> Result<()> {
        if self.find(NodeLabel::Person, id)?.is_some() {
            bail!("person {} already exists in {}", id, self.namespace);
        }
        self.graph_db
            .add_node(NodeLabel::Person.as_str(), self.properties(id, name)?)?;
        debug!("stored person {} ({})", id, name);
        Ok(())
    }

    fn add_post(&mut self, id: u64, name: &str, poster_id: u64) -> Result<()> {
        if self.find(NodeLabel::Post, id)?.is_some() {
            bail!("post {} already exists in {}", id, self.namespace);
        }
        let poster = self
            .find(NodeLabel::Person, poster_id)?
            .ok_or_else(|| anyhow!("post {} references unknown person {}", id, poster_id))?;
        let properties = self.properties(id, name)?;
        self.graph_db.with_transaction(|tx| {
            let post = GraphDatabase::insert_node(tx, NodeLabel::Post.as_str(), properties)?;
            GraphDatabase::insert_edge(tx, &poster.id, EdgeLabel::Authored.as_str(), &post, HashMap::new())?;
            Ok(())
        })?;
        debug!("stored post {} by person {}", id, poster_id);
        Ok(())
    }

    fn add_comment(&mut self, id: u64, name: &str, post_id: u64, commenter_id: u64) -> Result<()> {
        if self.find(NodeLabel::Comment, id)?.is_some() {
            bail!("comment {} already exists in {}", id, self.namespace);
        }
        let post = self
            .find(NodeLabel::Post, post_id)?
            .ok_or_else(|| anyhow!("comment {} references unknown post {}", id, post_id))?;
        let commenter = self
            .find(NodeLabel::Person, commenter_id)?
            .ok_or_else(|| anyhow!("comment {} references unknown person {}", id, commenter_id))?;
        let properties = self.properties(id, name)?;
        self.graph_db.with_transaction(|tx| {
            let comment = GraphDatabase::insert_node(tx, NodeLabel::Comment.as_str(), properties)?;
            GraphDatabase::insert_edge(tx, &comment, EdgeLabel::CommentedOn.as_str(), &post.id, HashMap::new())?;
            GraphDatabase::insert_edge(tx, &commenter.id, EdgeLabel::Wrote.as_str(), &comment, HashMap::new())?;
            Ok(())
        })?;
        debug!("stored comment {} by person {} on post {}", id, commenter_id, post_id);
        Ok(())
    }
}

use crate::network::common::errors::{NetworkError, NetworkResult};
use crate::network::inference::evidence::Evidence;
use crate::network::model::memo::ConnectionEntry;
use crate::network::model::registry::EntityKind;
use crate::network::model::trace::{RealizationContext, Trace};
use crate::network::records::{CommentRecord, PersonRecord, PostRecord};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Stable identity of an entity, taken from the knowledge base. The trace name
/// of the entity's site is derived from it, so the same entity binds to the same
/// random variable in every realization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntityId {
    Person(u64),
    Post(u64),
    /// Ordered: `Connection(a, b)` and `Connection(b, a)` are different entities.
    Connection(u64, u64),
    Comment(u64),
}

impl EntityId {
    pub fn kind(&self) -> EntityKind {
        match self {
            EntityId::Person(_) => EntityKind::Person,
            EntityId::Post(_) => EntityKind::Post,
            EntityId::Connection(_, _) => EntityKind::Connection,
            EntityId::Comment(_) => EntityKind::Comment,
        }
    }

    pub fn trace_name(&self) -> String {
        let prefix = self.kind().trace_prefix();
        match self {
            EntityId::Person(id) | EntityId::Post(id) | EntityId::Comment(id) => format!("{}{}", prefix, id),
            EntityId::Connection(from, to) => format!("{}{}_{}", prefix, from, to),
        }
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityId::Connection(from, to) => write!(f, "Connection {}->{}", from, to),
            EntityId::Person(id) | EntityId::Post(id) | EntityId::Comment(id) => {
                write!(f, "{} {}", self.kind(), id)
            }
        }
    }
}

/// The sampled variable an entity is bound to in the current realization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteRef {
    pub trace_name: String,
    pub value: usize,
    pub domain: Arc<[String]>,
}

impl SiteRef {
    fn sample<R: Rng + ?Sized>(
        trace: &mut Trace<'_, R>,
        id: EntityId,
        parents: &[(&str, usize)],
    ) -> NetworkResult<Self> {
        let trace_name = id.trace_name();
        let value = trace.sample(trace_name.clone(), id.kind(), parents)?;
        Ok(SiteRef {
            trace_name,
            value,
            domain: trace.registry().shared_domain(id.kind()),
        })
    }

    pub fn label(&self) -> &str {
        &self.domain[self.value]
    }

    fn as_parent(&self) -> (&str, usize) {
        (self.trace_name.as_str(), self.value)
    }
}

/// The query capability shared by every entity kind.
pub trait Observable {
    fn identity(&self) -> EntityId;

    fn site(&self) -> &SiteRef;

    /// Evidence binding this entity's site to `label`.
    fn observe(&self, label: &str) -> NetworkResult<Evidence> {
        let site = self.site();
        site.domain
            .iter()
            .position(|l| l == label)
            .map(|index| Evidence::single(site.trace_name.clone(), index))
            .ok_or_else(|| NetworkError::domain(&site.trace_name, label))
    }

    /// Evidence binding this entity's site to the domain index `value`.
    fn observe_value(&self, value: usize) -> NetworkResult<Evidence> {
        let site = self.site();
        if value < site.domain.len() {
            Ok(Evidence::single(site.trace_name.clone(), value))
        } else {
            Err(NetworkError::domain(&site.trace_name, value))
        }
    }

    /// The trace name used to query this entity's marginal.
    fn infer(&self) -> String {
        self.site().trace_name.clone()
    }

    fn value(&self) -> usize {
        self.site().value
    }

    fn label(&self) -> &str {
        self.site().label()
    }

    fn domain(&self) -> &[String] {
        &self.site().domain
    }
}

/// A person and their interest.
#[derive(Debug, Clone)]
pub struct Person {
    id: u64,
    name: String,
    interest: SiteRef,
}

impl Person {
    pub fn new<R: Rng + ?Sized>(trace: &mut Trace<'_, R>, record: &PersonRecord) -> NetworkResult<Self> {
        let interest = SiteRef::sample(trace, EntityId::Person(record.id), &[])?;
        Ok(Person {
            id: record.id,
            name: record.name.clone(),
            interest,
        })
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn interest(&self) -> &SiteRef {
        &self.interest
    }
}

impl Observable for Person {
    fn identity(&self) -> EntityId {
        EntityId::Person(self.id)
    }

    fn site(&self) -> &SiteRef {
        &self.interest
    }
}

/// A post whose topic depends on the poster's interest.
#[derive(Debug, Clone)]
pub struct Post {
    id: u64,
    name: String,
    poster: u64,
    topic: SiteRef,
}

impl Post {
    pub fn new<R: Rng + ?Sized>(
        trace: &mut Trace<'_, R>,
        record: &PostRecord,
        poster: &Person,
    ) -> NetworkResult<Self> {
        let topic = SiteRef::sample(trace, EntityId::Post(record.id), &[poster.interest.as_parent()])?;
        Ok(Post {
            id: record.id,
            name: record.name.clone(),
            poster: poster.id,
            topic,
        })
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn poster(&self) -> u64 {
        self.poster
    }

    pub fn topic(&self) -> &SiteRef {
        &self.topic
    }
}

impl Observable for Post {
    fn identity(&self) -> EntityId {
        EntityId::Post(self.id)
    }

    fn site(&self) -> &SiteRef {
        &self.topic
    }
}

/// The directed relationship from one person to another. Drawn at most once per
/// ordered pair per realization; later constructions read the memo.
#[derive(Debug, Clone)]
pub struct Connection {
    from: u64,
    to: u64,
    relation: SiteRef,
}

impl Connection {
    pub fn between<R: Rng + ?Sized>(ctx: &mut RealizationContext<'_, R>, from: u64, to: u64) -> NetworkResult<Self> {
        let id = EntityId::Connection(from, to);
        let RealizationContext { trace, connections } = ctx;
        let entry = connections.get_or_create(from, to, || {
            let site = SiteRef::sample(trace, id, &[])?;
            Ok(ConnectionEntry {
                value: site.value,
                trace_name: site.trace_name,
            })
        })?;
        Ok(Connection {
            from,
            to,
            relation: SiteRef {
                trace_name: entry.trace_name,
                value: entry.value,
                domain: trace.registry().shared_domain(EntityKind::Connection),
            },
        })
    }

    pub fn from(&self) -> u64 {
        self.from
    }

    pub fn to(&self) -> u64 {
        self.to
    }

    pub fn relation(&self) -> &SiteRef {
        &self.relation
    }
}

impl Observable for Connection {
    fn identity(&self) -> EntityId {
        EntityId::Connection(self.from, self.to)
    }

    fn site(&self) -> &SiteRef {
        &self.relation
    }
}

/// A candidate comment by `commenter` on `post`; `matched = yes` is the event
/// that the comment was made.
#[derive(Debug, Clone)]
pub struct Comment {
    id: u64,
    name: String,
    post: u64,
    commenter: u64,
    connection: SiteRef,
    matched: SiteRef,
}

impl Comment {
    pub fn new<R: Rng + ?Sized>(
        ctx: &mut RealizationContext<'_, R>,
        record: &CommentRecord,
        post: &Post,
        commenter: &Person,
    ) -> NetworkResult<Self> {
        let connection = Connection::between(ctx, post.poster, commenter.id)?;
        let parents = [
            commenter.interest.as_parent(),
            post.topic.as_parent(),
            connection.relation.as_parent(),
        ];
        let matched = SiteRef::sample(&mut ctx.trace, EntityId::Comment(record.id), &parents)?;
        Ok(Comment {
            id: record.id,
            name: record.name.clone(),
            post: post.id,
            commenter: commenter.id,
            connection: connection.relation,
            matched,
        })
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn post(&self) -> u64 {
        self.post
    }

    pub fn commenter(&self) -> u64 {
        self.commenter
    }

    /// The connection site this comment's draw was conditioned on.
    pub fn connection(&self) -> &SiteRef {
        &self.connection
    }

    pub fn matched(&self) -> &SiteRef {
        &self.matched
    }
}

impl Observable for Comment {
    fn identity(&self) -> EntityId {
        EntityId::Comment(self.id)
    }

    fn site(&self) -> &SiteRef {
        &self.matched
    }
}

/// Any constructed entity, as returned in a realization's name map.
#[derive(Debug, Clone)]
pub enum Entity {
    Person(Person),
    Post(Post),
    Connection(Connection),
    Comment(Comment),
}

impl Entity {
    pub fn as_person(&self) -> Option<&Person> {
        match self {
            Entity::Person(person) => Some(person),
            _ => None,
        }
    }

    pub fn as_post(&self) -> Option<&Post> {
        match self {
            Entity::Post(post) => Some(post),
            _ => None,
        }
    }

    pub fn as_connection(&self) -> Option<&Connection> {
        match self {
            Entity::Connection(connection) => Some(connection),
            _ => None,
        }
    }

    pub fn as_comment(&self) -> Option<&Comment> {
        match self {
            Entity::Comment(comment) => Some(comment),
            _ => None,
        }
    }
}

impl Observable for Entity {
    fn identity(&self) -> EntityId {
        match self {
            Entity::Person(person) => person.identity(),
            Entity::Post(post) => post.identity(),
            Entity::Connection(connection) => connection.identity(),
            Entity::Comment(comment) => comment.identity(),
        }
    }

    fn site(&self) -> &SiteRef {
        match self {
            Entity::Person(person) => person.site(),
            Entity::Post(post) => post.site(),
            Entity::Connection(connection) => connection.site(),
            Entity::Comment(comment) => comment.site(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trace_names_follow_identity() {
        assert_eq!(EntityId::Person(3).trace_name(), "Interest3");
        assert_eq!(EntityId::Post(1).trace_name(), "Topic1");
        assert_eq!(EntityId::Connection(1, 2).trace_name(), "Connection1_2");
        assert_eq!(EntityId::Comment(4).trace_name(), "Comment4");
        assert_ne!(
            EntityId::Connection(1, 2).trace_name(),
            EntityId::Connection(2, 1).trace_name()
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(EntityId::Person(1).to_string(), "Person 1");
        assert_eq!(EntityId::Connection(2, 3).to_string(), "Connection 2->3");
    }
}

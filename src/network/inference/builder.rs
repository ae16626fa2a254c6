use crate::network::common::errors::{NetworkError, NetworkResult};
use crate::network::inference::evidence::{Evidence, SamplingPlan};
use crate::network::model::entities::{Comment, Connection, Entity, EntityId, Observable, Person, Post};
use crate::network::model::memo::ConnectionMemo;
use crate::network::model::registry::Registry;
use crate::network::model::trace::{RealizationContext, Site, Trace};
use crate::network::records::{PostRecord, RecordSource};
use log::debug;
use rand::Rng;
use std::collections::{BTreeMap, HashMap};

/// One complete joint sample of the network.
#[derive(Debug, Clone)]
pub struct Realization {
    entities: BTreeMap<String, Entity>,
    sites: Vec<Site>,
    index: HashMap<String, usize>,
    log_weight: f64,
    memo_hits: usize,
    memo_misses: usize,
}

impl Realization {
    /// Looks up an entity by record name (connections by trace name).
    pub fn entity(&self, name: &str) -> Option<&Entity> {
        self.entities.get(name)
    }

    pub fn entities(&self) -> impl Iterator<Item = (&str, &Entity)> + '_ {
        self.entities.iter().map(|(name, entity)| (name.as_str(), entity))
    }

    pub fn site(&self, trace_name: &str) -> Option<&Site> {
        self.index.get(trace_name).map(|&i| &self.sites[i])
    }

    /// Sites in construction order.
    pub fn sites(&self) -> &[Site] {
        &self.sites
    }

    pub fn value(&self, trace_name: &str) -> Option<usize> {
        self.site(trace_name).map(|site| site.value)
    }

    pub fn log_weight(&self) -> f64 {
        self.log_weight
    }

    pub fn weight(&self) -> f64 {
        self.log_weight.exp()
    }

    pub fn memo_hits(&self) -> usize {
        self.memo_hits
    }

    pub fn memo_misses(&self) -> usize {
        self.memo_misses
    }

    /// Resolves an entity name or a trace name to a trace name.
    pub fn resolve(&self, name: &str) -> NetworkResult<String> {
        if let Some(entity) = self.entity(name) {
            return Ok(entity.infer());
        }
        self.site(name)
            .map(|site| site.name.clone())
            .ok_or_else(|| NetworkError::UnknownSite(name.to_string()))
    }

    /// Evidence binding the site named by `name` (entity or trace) to `label`.
    pub fn observe(&self, name: &str, label: &str) -> NetworkResult<Evidence> {
        if let Some(entity) = self.entity(name) {
            return entity.observe(label);
        }
        let site = self
            .site(name)
            .ok_or_else(|| NetworkError::UnknownSite(name.to_string()))?;
        site.domain
            .iter()
            .position(|l| l == label)
            .map(|index| Evidence::single(site.name.clone(), index))
            .ok_or_else(|| NetworkError::domain(&site.name, label))
    }
}

fn insert_unique(entities: &mut BTreeMap<String, Entity>, name: String, entity: Entity) -> NetworkResult<()> {
    if entities.contains_key(&name) {
        return Err(NetworkError::DuplicateEntity(name));
    }
    entities.insert(name, entity);
    Ok(())
}

/// Builds one realization from the records of `source`: persons, then the
/// ordered person pairs that comments need, then posts, then comments. `memo` is
/// reset before anything is constructed.
pub fn build_realization<S, R>(
    source: &S,
    registry: &Registry,
    plan: &SamplingPlan,
    memo: &mut ConnectionMemo,
    rng: &mut R,
) -> NetworkResult<Realization>
where
    S: RecordSource + ?Sized,
    R: Rng + ?Sized,
{
    memo.reset();
    let person_records = source.persons()?;
    let post_records = source.posts()?;
    let comment_records = source.comments()?;

    let mut ctx = RealizationContext {
        trace: Trace::new(registry, plan, rng),
        connections: memo,
    };

    let mut persons: BTreeMap<u64, Person> = BTreeMap::new();
    for record in &person_records {
        let person = Person::new(&mut ctx.trace, record)?;
        persons.insert(record.id, person);
    }

    let posts_by_id: HashMap<u64, &PostRecord> = post_records.iter().map(|p| (p.id, p)).collect();
    let mut connections: BTreeMap<(u64, u64), Connection> = BTreeMap::new();
    for record in &comment_records {
        let post = posts_by_id
            .get(&record.post_id)
            .ok_or(NetworkError::DanglingReference {
                entity: EntityId::Comment(record.id),
                missing: EntityId::Post(record.post_id),
            })?;
        for (entity, person) in [
            (EntityId::Post(post.id), post.poster_id),
            (EntityId::Comment(record.id), record.commenter_id),
        ] {
            if !persons.contains_key(&person) {
                return Err(NetworkError::DanglingReference {
                    entity,
                    missing: EntityId::Person(person),
                });
            }
        }
        let pair = (post.poster_id, record.commenter_id);
        if !connections.contains_key(&pair) {
            let connection = Connection::between(&mut ctx, pair.0, pair.1)?;
            connections.insert(pair, connection);
        }
    }

    let mut posts: BTreeMap<u64, Post> = BTreeMap::new();
    for record in &post_records {
        let poster = persons
            .get(&record.poster_id)
            .ok_or(NetworkError::DanglingReference {
                entity: EntityId::Post(record.id),
                missing: EntityId::Person(record.poster_id),
            })?;
        posts.insert(record.id, Post::new(&mut ctx.trace, record, poster)?);
    }

    let mut comments = Vec::with_capacity(comment_records.len());
    for record in &comment_records {
        let missing_post = NetworkError::DanglingReference {
            entity: EntityId::Comment(record.id),
            missing: EntityId::Post(record.post_id),
        };
        let post = posts.get(&record.post_id).ok_or(missing_post)?;
        let commenter = persons
            .get(&record.commenter_id)
            .ok_or(NetworkError::DanglingReference {
                entity: EntityId::Comment(record.id),
                missing: EntityId::Person(record.commenter_id),
            })?;
        comments.push(Comment::new(&mut ctx, record, post, commenter)?);
    }

    let memo_hits = ctx.connections.hits();
    let memo_misses = ctx.connections.misses();
    let (sites, index, log_weight) = ctx.trace.finish();

    let mut entities = BTreeMap::new();
    for person in persons.into_values() {
        insert_unique(&mut entities, person.name().to_string(), Entity::Person(person))?;
    }
    for connection in connections.into_values() {
        insert_unique(&mut entities, connection.infer(), Entity::Connection(connection))?;
    }
    for post in posts.into_values() {
        insert_unique(&mut entities, post.name().to_string(), Entity::Post(post))?;
    }
    for comment in comments {
        insert_unique(&mut entities, comment.name().to_string(), Entity::Comment(comment))?;
    }

    debug!(
        "realization: {} sites, {} entities, memo {} hits / {} misses, log weight {:.4}",
        sites.len(),
        entities.len(),
        memo_hits,
        memo_misses,
        log_weight
    );
    Ok(Realization {
        entities,
        sites,
        index,
        log_weight,
        memo_hits,
        memo_misses,
    })
}

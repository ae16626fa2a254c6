use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonRecord {
    pub id: u64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostRecord {
    pub id: u64,
    pub name: String,
    pub poster_id: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentRecord {
    pub id: u64,
    pub name: String,
    pub post_id: u64,
    pub commenter_id: u64,
}

/// Read side of the knowledge base. Each stream is returned ordered by id.
pub trait RecordSource: Send + Sync {
    fn persons(&self) -> Result<Vec<PersonRecord>>;
    fn posts(&self) -> Result<Vec<PostRecord>>;
    fn comments(&self) -> Result<Vec<CommentRecord>>;
}

/// Write side of the knowledge base, used by scenario makers.
pub trait RecordSink {
    fn add_person(&mut self, id: u64, name: &str) -> Result<()>;
    fn add_post(&mut self, id: u64, name: &str, poster_id: u64) -> Result<()>;
    fn add_comment(&mut self, id: u64, name: &str, post_id: u64, commenter_id: u64) -> Result<()>;
}

/// Records held in memory. Also used as the engine's snapshot of any other source.
#[derive(Debug, Clone, Default)]
pub struct RecordSet {
    persons: Vec<PersonRecord>,
    posts: Vec<PostRecord>,
    comments: Vec<CommentRecord>,
}

impl RecordSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads every stream of `source` once.
    pub fn snapshot(source: &dyn RecordSource) -> Result<Self> {
        Ok(RecordSet {
            persons: source.persons()?,
            posts: source.posts()?,
            comments: source.comments()?,
        })
    }

    pub fn len(&self) -> usize {
        self.persons.len() + self.posts.len() + self.comments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl RecordSource for RecordSet {
    fn persons(&self) -> Result<Vec<PersonRecord>> {
        Ok(self.persons.clone())
    }

    fn posts(&self) -> Result<Vec<PostRecord>> {
        Ok(self.posts.clone())
    }

    fn comments(&self) -> Result<Vec<CommentRecord>> {
        Ok(self.comments.clone())
    }
}

impl RecordSink for RecordSet {
    fn add_person(&mut self, id: u64, name: &str) -> Result<()> {
        if self.persons.iter().any(|p| p.id == id) {
            bail!("person {} already exists", id);
        }
        self.persons.push(PersonRecord { id, name: name.to_string() });
        self.persons.sort_by_key(|p| p.id);
        Ok(())
    }

    fn add_post(&mut self, id: u64, name: &str, poster_id: u64) -> Result<()> {
        if self.posts.iter().any(|p| p.id == id) {
            bail!("post {} already exists", id);
        }
        self.posts.push(PostRecord {
            id,
            name: name.to_string(),
            poster_id,
        });
        self.posts.sort_by_key(|p| p.id);
        Ok(())
    }

    fn add_comment(&mut self, id: u64, name: &str, post_id: u64, commenter_id: u64) -> Result<()> {
        if self.comments.iter().any(|c| c.id == id) {
            bail!("comment {} already exists", id);
        }
        self.comments.push(CommentRecord {
            id,
            name: name.to_string(),
            post_id,
            commenter_id,
        });
        self.comments.sort_by_key(|c| c.id);
        Ok(())
    }
}

//! Labels and property names used to store the social knowledge base in the
//! graph database.

use std::fmt;
use std::str::FromStr;

/// Node labels, one per record kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeLabel {
    Person,
    Post,
    Comment,
}

impl NodeLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeLabel::Person => "Person",
            NodeLabel::Post => "Post",
            NodeLabel::Comment => "Comment",
        }
    }
}

impl FromStr for NodeLabel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Person" => Ok(NodeLabel::Person),
            "Post" => Ok(NodeLabel::Post),
            "Comment" => Ok(NodeLabel::Comment),
            _ => Err(format!("Unknown node label: {}", s)),
        }
    }
}

impl fmt::Display for NodeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Edge labels linking records to the records they reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeLabel {
    /// Person -> Post
    Authored,
    /// Comment -> Post
    CommentedOn,
    /// Person -> Comment
    Wrote,
}

impl EdgeLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeLabel::Authored => "AUTHORED",
            EdgeLabel::CommentedOn => "COMMENTED_ON",
            EdgeLabel::Wrote => "WROTE",
        }
    }
}

impl FromStr for EdgeLabel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "AUTHORED" => Ok(EdgeLabel::Authored),
            "COMMENTED_ON" => Ok(EdgeLabel::CommentedOn),
            "WROTE" => Ok(EdgeLabel::Wrote),
            _ => Err(format!("Unknown edge label: {}", s)),
        }
    }
}

impl fmt::Display for EdgeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Property names carried by every record node.
pub mod property {
    pub const ENTITY_ID: &str = "entity_id";
    pub const NAME: &str = "name";
    pub const NAMESPACE: &str = "namespace";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_parse_back() {
        for label in [NodeLabel::Person, NodeLabel::Post, NodeLabel::Comment] {
            assert_eq!(label.as_str().parse::<NodeLabel>().unwrap(), label);
        }
        for label in [EdgeLabel::Authored, EdgeLabel::CommentedOn, EdgeLabel::Wrote] {
            assert_eq!(label.to_string().parse::<EdgeLabel>().unwrap(), label);
        }
        assert!("Connection".parse::<NodeLabel>().is_err());
    }
}

use crate::network::common::interface::ScenarioMaker;
use crate::network::records::RecordSink;
use anyhow::Result;
use log::info;

/// Three people who each write one post and comment on each other's posts.
pub struct ThreeFriends {}

impl ScenarioMaker for ThreeFriends {
    fn setup_scenario(&self, sink: &mut dyn RecordSink) -> Result<()> {
        for (id, name) in [(1, "Alice"), (2, "Bob"), (3, "Carol")] {
            sink.add_person(id, name)?;
        }
        for (id, poster) in [(1, 1), (2, 2), (3, 3)] {
            sink.add_post(id, &format!("Post{}", id), poster)?;
        }
        // (comment, post, commenter)
        for (id, post, commenter) in [(1, 1, 2), (2, 1, 3), (3, 2, 1), (4, 3, 2)] {
            sink.add_comment(id, &format!("Comment{}", id), post, commenter)?;
        }
        info!("three_friends: 3 persons, 3 posts, 4 comments");
        Ok(())
    }
}

use crate::network::common::interface::ScenarioMaker;
use crate::network::records::RecordSink;
use anyhow::Result;
use log::info;

/// Bob comments on both of Alice's posts, so both comments read the same
/// Alice -> Bob connection.
pub struct SharedConnection {}

impl ScenarioMaker for SharedConnection {
    fn setup_scenario(&self, sink: &mut dyn RecordSink) -> Result<()> {
        sink.add_person(1, "Alice")?;
        sink.add_person(2, "Bob")?;
        sink.add_post(1, "Post1", 1)?;
        sink.add_post(2, "Post2", 1)?;
        sink.add_comment(1, "Comment1", 1, 2)?;
        sink.add_comment(2, "Comment2", 2, 2)?;
        info!("shared_connection: 2 persons, 2 posts, 2 comments");
        Ok(())
    }
}

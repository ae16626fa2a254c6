use crate::network::records::RecordSink;
use anyhow::Result;

/// Writes a fixed knowledge base into any record sink.
pub trait ScenarioMaker {
    fn setup_scenario(&self, sink: &mut dyn RecordSink) -> Result<()>;
}

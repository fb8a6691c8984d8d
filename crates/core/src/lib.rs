pub mod commit;
pub mod envelope;
pub mod reply;

pub use commit::{CommitRequest, CommitResponse, CommitStatus, TimedResponse};
pub use envelope::TraceableEnvelope;
pub use reply::{CommitEnvelope, CommitReply, ReplyStatus, ResponseEnvelope};

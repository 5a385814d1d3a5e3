//! The `MemoryCollaborator` trait (§6.4): the optional long-term-memory/RAG
//! module is treated as an opaque collaborator. Narrowed from the teacher's
//! `SerialMemoryProvider` trait down to the four hooks spec.md §6.4 actually
//! lists — this system has no persona/graph/stats surface, just the
//! retrieval-and-notification contract the Runner drives each round.

use async_trait::async_trait;
use ws_domain::entities::TimelineMessage;

/// A hook failure is always non-fatal (§6.4: "Failures from this
/// collaborator MUST NOT abort a round"). Implementations log internally
/// and return an empty/no-op result rather than propagate an error type —
/// there is deliberately no `Result` in this trait's signatures.
#[async_trait]
pub trait MemoryCollaborator: Send + Sync {
    /// Short snippets relevant to `query_text`, most relevant first,
    /// truncated to `max_snippets` entries of at most `max_chars` each.
    async fn retrieve_context(
        &self,
        session_id: &str,
        branch_id: &str,
        query_text: &str,
        max_snippets: usize,
        max_chars: usize,
    ) -> Vec<String>;

    /// Called after a message is durably persisted and published (§4.5 step 6).
    async fn on_message_persisted(&self, session_id: &str, branch_id: &str, message: &TimelineMessage);

    /// Called when `delete_last_message` removes a message (§3: "also
    /// invalidates any memory items that referenced it").
    async fn on_message_deleted(&self, session_id: &str, branch_id: &str, message_id: &str);

    /// Called on fork: the new branch inherits memory items with
    /// `seq <= cut_seq` from the source branch.
    async fn on_fork(&self, session_id: &str, source_branch_id: &str, new_branch_id: &str, cut_seq: i64);
}

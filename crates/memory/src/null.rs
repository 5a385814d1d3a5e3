//! `MEMORY_MODE=off` — every hook is a no-op / empty `Vec` (§6.4 default).

use async_trait::async_trait;
use ws_domain::entities::TimelineMessage;

use crate::provider::MemoryCollaborator;

#[derive(Debug, Clone, Copy, Default)]
pub struct NullMemory;

#[async_trait]
impl MemoryCollaborator for NullMemory {
    async fn retrieve_context(
        &self,
        _session_id: &str,
        _branch_id: &str,
        _query_text: &str,
        _max_snippets: usize,
        _max_chars: usize,
    ) -> Vec<String> {
        Vec::new()
    }

    async fn on_message_persisted(&self, _session_id: &str, _branch_id: &str, _message: &TimelineMessage) {}

    async fn on_message_deleted(&self, _session_id: &str, _branch_id: &str, _message_id: &str) {}

    async fn on_fork(&self, _session_id: &str, _source_branch_id: &str, _new_branch_id: &str, _cut_seq: i64) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn retrieve_context_is_always_empty() {
        let m = NullMemory;
        let out = m.retrieve_context("s", "b", "query", 5, 200).await;
        assert!(out.is_empty());
    }
}

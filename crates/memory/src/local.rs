//! `MEMORY_MODE=vector|hybrid` — a minimal local implementation backed by
//! the same SQLite database as `ws-store`, scoring retrieval by naive
//! token overlap rather than a real embedding model. spec.md treats the
//! production RAG backend as an out-of-scope external collaborator (§1);
//! this local implementation only has to satisfy the hook contract and the
//! "never abort a round" invariant, not compete with a vector database.
//! `embed_provider`/`embed_dim` are accepted but unused — reserved for a
//! future real backend (see DESIGN.md).

use std::collections::HashSet;

use async_trait::async_trait;
use sqlx::SqlitePool;
use ws_domain::entities::TimelineMessage;

use crate::provider::MemoryCollaborator;

pub struct LocalMemory {
    pool: SqlitePool,
    #[allow(dead_code)]
    embed_provider: Option<String>,
    #[allow(dead_code)]
    embed_dim: Option<u32>,
}

impl LocalMemory {
    pub fn new(pool: SqlitePool, embed_provider: Option<String>, embed_dim: Option<u32>) -> Self {
        Self {
            pool,
            embed_provider,
            embed_dim,
        }
    }

    fn tokenize(text: &str) -> HashSet<String> {
        text.split(|c: char| !c.is_alphanumeric())
            .filter(|s| !s.is_empty())
            .map(|s| s.to_ascii_lowercase())
            .collect()
    }

    fn overlap_score(query_tokens: &HashSet<String>, candidate: &str) -> usize {
        let candidate_tokens = Self::tokenize(candidate);
        query_tokens.intersection(&candidate_tokens).count()
    }
}

#[derive(sqlx::FromRow)]
struct MemoryItemRow {
    #[allow(dead_code)]
    seq: i64,
    text: String,
}

#[async_trait]
impl MemoryCollaborator for LocalMemory {
    async fn retrieve_context(
        &self,
        _session_id: &str,
        branch_id: &str,
        query_text: &str,
        max_snippets: usize,
        max_chars: usize,
    ) -> Vec<String> {
        let rows: Result<Vec<MemoryItemRow>, sqlx::Error> = sqlx::query_as(
            "SELECT seq, text FROM memory_items WHERE branch_id = ? ORDER BY seq DESC LIMIT 200",
        )
        .bind(branch_id)
        .fetch_all(&self.pool)
        .await;

        let rows = match rows {
            Ok(rows) => rows,
            Err(e) => {
                tracing::warn!(error = %e, branch_id, "memory retrieval failed, continuing with no snippets");
                return Vec::new();
            }
        };

        let query_tokens = Self::tokenize(query_text);
        let mut scored: Vec<(usize, String)> = rows
            .into_iter()
            .map(|r| (Self::overlap_score(&query_tokens, &r.text), r.text))
            .filter(|(score, _)| *score > 0)
            .collect();
        scored.sort_by(|a, b| b.0.cmp(&a.0));

        scored
            .into_iter()
            .take(max_snippets)
            .map(|(_, text)| {
                if text.len() > max_chars {
                    text.chars().take(max_chars).collect()
                } else {
                    text
                }
            })
            .collect()
    }

    async fn on_message_persisted(&self, _session_id: &str, branch_id: &str, message: &TimelineMessage) {
        let result = sqlx::query(
            "INSERT INTO memory_items (branch_id, seq, message_id, text) VALUES (?, ?, ?, ?)",
        )
        .bind(branch_id)
        .bind(message.seq)
        .bind(&message.id)
        .bind(&message.content)
        .execute(&self.pool)
        .await;

        if let Err(e) = result {
            tracing::warn!(error = %e, branch_id, message_id = %message.id, "memory indexing failed, round proceeds anyway");
        }
    }

    async fn on_message_deleted(&self, _session_id: &str, branch_id: &str, message_id: &str) {
        let result = sqlx::query("DELETE FROM memory_items WHERE branch_id = ? AND message_id = ?")
            .bind(branch_id)
            .bind(message_id)
            .execute(&self.pool)
            .await;

        if let Err(e) = result {
            tracing::warn!(error = %e, branch_id, message_id, "memory invalidation failed");
        }
    }

    async fn on_fork(&self, _session_id: &str, source_branch_id: &str, new_branch_id: &str, cut_seq: i64) {
        let result = sqlx::query(
            "INSERT INTO memory_items (branch_id, seq, message_id, text) \
             SELECT ?, seq, message_id, text FROM memory_items WHERE branch_id = ? AND seq <= ?",
        )
        .bind(new_branch_id)
        .bind(source_branch_id)
        .bind(cut_seq)
        .execute(&self.pool)
        .await;

        if let Err(e) = result {
            tracing::warn!(error = %e, source_branch_id, new_branch_id, "memory fork-copy failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenize_lowercases_and_splits_on_punctuation() {
        let tokens = LocalMemory::tokenize("A drought, strikes the North!");
        assert!(tokens.contains("drought"));
        assert!(tokens.contains("north"));
        assert!(!tokens.contains("North"));
    }

    #[test]
    fn overlap_score_counts_shared_tokens() {
        let query = LocalMemory::tokenize("drought north harvest");
        let score = LocalMemory::overlap_score(&query, "a severe drought hit the north this season");
        assert_eq!(score, 2);
    }

    #[test]
    fn overlap_score_zero_for_disjoint_text() {
        let query = LocalMemory::tokenize("drought north");
        let score = LocalMemory::overlap_score(&query, "the festival was a joyous success");
        assert_eq!(score, 0);
    }
}

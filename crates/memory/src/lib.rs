//! `ws-memory` — the optional memory collaborator (§6.4). Defines the
//! narrow [`MemoryCollaborator`] hook surface and two implementations:
//! [`NullMemory`] (`MEMORY_MODE=off`, the default) and [`LocalMemory`]
//! (`MEMORY_MODE=vector|hybrid`, naive token-overlap over the same SQLite
//! database `ws-store` uses).

pub mod local;
pub mod null;
pub mod provider;

pub use local::LocalMemory;
pub use null::NullMemory;
pub use provider::MemoryCollaborator;

use std::sync::Arc;

use sqlx::SqlitePool;
use ws_domain::config::MemoryConfig;

/// Build the collaborator named by `MEMORY_MODE` (§6.5).
pub fn build_memory(cfg: &MemoryConfig, pool: SqlitePool) -> Arc<dyn MemoryCollaborator> {
    match cfg.mode {
        ws_domain::config::MemoryMode::Off => Arc::new(NullMemory),
        ws_domain::config::MemoryMode::Vector | ws_domain::config::MemoryMode::Hybrid => Arc::new(
            LocalMemory::new(pool, cfg.embed_provider.clone(), cfg.embed_dim),
        ),
    }
}

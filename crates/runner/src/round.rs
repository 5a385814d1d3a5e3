//! One Runner round (§4.5 steps 1-7): Snapshot, Prepare, Build, Generate,
//! Persist, Publish, post-generation delay.

use std::time::Duration;

use ws_domain::config::EventDiceConfig;
use ws_domain::entities::MessageRole;
use ws_domain::event::Event;
use ws_domain::{Error, Result};
use ws_eventbus::EventBus;
use ws_memory::MemoryCollaborator;
use ws_prompt::{build_prompt, PromptInput};
use ws_store::Store;

/// Backoff delays for the three retries allowed on a transient provider
/// error within a single round's Generate step (§4.5: "retry with backoff
/// sequence 1s, 2s, 4s (three attempts)").
const BACKOFF: [Duration; 3] = [Duration::from_secs(1), Duration::from_secs(2), Duration::from_secs(4)];

const MEMORY_MAX_SNIPPETS: usize = 5;
const MEMORY_MAX_CHARS: usize = 1600;

pub struct RoundContext<'a> {
    pub store: &'a Store,
    pub bus: &'a EventBus,
    pub memory: &'a dyn MemoryCollaborator,
    pub session_id: &'a str,
    pub event_dice: &'a EventDiceConfig,
}

/// Runs exactly one round. On success, sleeps `post_gen_delay_sec` before
/// returning so the caller's next loop iteration is already past the delay.
pub async fn run_round(ctx: &RoundContext<'_>) -> Result<()> {
    // 1. Snapshot.
    let session = ctx.store.get_session(ctx.session_id).await?;
    let branch_id = session.active_branch_id.clone();
    let window = ctx.store.recent_window(&branch_id).await?;

    // 2. Prepare: consume pending interventions atomically.
    let consumed = ctx.store.consume_pending_interventions(&branch_id).await?;

    let result = run_round_after_consume(ctx, &session, &branch_id, &window, &consumed).await;

    if result.is_err() && !consumed.is_empty() {
        let ids: Vec<String> = consumed.iter().map(|i| i.id.clone()).collect();
        if let Err(e) = ctx.store.restore_pending_interventions(&ids).await {
            tracing::error!(session_id = ctx.session_id, error = %e, "failed to restore pending interventions after round failure");
        }
    }

    result
}

async fn run_round_after_consume(
    ctx: &RoundContext<'_>,
    session: &ws_domain::entities::Session,
    branch_id: &str,
    window: &[ws_domain::entities::TimelineMessage],
    consumed: &[ws_domain::entities::UserIntervention],
) -> Result<()> {
    // 3. Build.
    let query_text = if !consumed.is_empty() {
        consumed.iter().map(|i| i.content.as_str()).collect::<Vec<_>>().join(" ")
    } else {
        window.last().map(|m| m.content.clone()).unwrap_or_default()
    };
    let memory_snippets = ctx
        .memory
        .retrieve_context(ctx.session_id, branch_id, &query_text, MEMORY_MAX_SNIPPETS, MEMORY_MAX_CHARS)
        .await;

    let prompt_input = PromptInput {
        world_preset: &session.world_preset,
        tick_label: &session.tick_label,
        recent_window: window,
        pending_interventions: consumed,
        memory_snippets: &memory_snippets,
        output_locale: &session.output_language,
        event_dice: ctx.event_dice,
    };
    let messages = build_prompt(&prompt_input);

    // 4. Generate, with transient-error retry.
    let provider_cfg = ctx
        .store
        .get_provider_config(ctx.session_id)
        .await?
        .ok_or_else(|| Error::PreconditionFailed {
            code: "NO_PROVIDER_CONFIGURED".into(),
            message: "session has no provider configured".into(),
        })?;
    let api_key = ctx.store.decrypt_api_key(&provider_cfg).await?;
    let provider = ws_providers::build_provider(&provider_cfg, &api_key)?;

    let mut attempt = 0usize;
    let generated = loop {
        match provider.generate(&messages, &ws_providers::GenerateOptions::default()).await {
            Ok(result) => break result,
            Err(e) if e.is_transient() && attempt < BACKOFF.len() => {
                tracing::warn!(session_id = ctx.session_id, attempt, error = %e, "transient provider error, retrying");
                tokio::time::sleep(BACKOFF[attempt]).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    };

    // 5. Persist.
    let report_snapshot = serde_json::from_str::<serde_json::Value>(&generated.text).ok();
    let message = ctx
        .store
        .append_message(
            &session.id,
            branch_id,
            MessageRole::SystemReport,
            &generated.text,
            None,
            Some(provider.provider_id()),
            provider_cfg.model_name.as_deref(),
            generated.token_in,
            generated.token_out,
            report_snapshot.as_ref(),
        )
        .await?;

    // 6. Publish.
    ctx.bus.publish(
        ctx.session_id,
        Event::MessageCreated { branch_id: branch_id.to_string(), message: message.clone() },
    );
    ctx.memory.on_message_persisted(ctx.session_id, branch_id, &message).await;

    // 7. Post-generation delay.
    tokio::time::sleep(Duration::from_secs(session.post_gen_delay_sec as u64)).await;

    Ok(())
}

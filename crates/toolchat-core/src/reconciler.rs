// History replay: persisted turns -> the blocks the live session produced

use std::sync::Arc;
use toolchat_client::Backend;
use toolchat_types::{DisplayBlock, Role, Turn};

use crate::error::Result;
use crate::labels::DateLabeler;
use crate::normalizer::normalize;

#[derive(Clone)]
pub struct HistoryReconciler {
    backend: Arc<dyn Backend>,
    labeler: DateLabeler,
}

impl HistoryReconciler {
    pub fn new(backend: Arc<dyn Backend>, labeler: DateLabeler) -> Self {
        Self { backend, labeler }
    }

    /// Fetch a conversation's turns and rebuild its timeline.
    ///
    /// All or nothing: a failed fetch returns the error and no blocks.
    pub async fn reconstruct(&self, conversation_id: &str) -> Result<Vec<DisplayBlock>> {
        let turns = self.backend.fetch_turns(conversation_id).await?;

        tracing::debug!(
            conversation_id = %conversation_id,
            turns = turns.len(),
            "Replaying history"
        );

        Ok(self.replay(turns))
    }

    /// Turn persisted turns into blocks, in storage order
    pub fn replay(&self, turns: Vec<Turn>) -> Vec<DisplayBlock> {
        turns
            .into_iter()
            .flat_map(|turn| self.turn_blocks(turn))
            .collect()
    }

    fn turn_blocks(&self, turn: Turn) -> Vec<DisplayBlock> {
        let date = self.labeler.turn_date_label(turn.timestamp);

        match turn.role {
            Role::User => {
                let time = turn.timestamp.map(|at| self.labeler.time_label(at));
                vec![DisplayBlock::user_text(turn.content.into_text(), date, time)]
            }
            Role::Assistant => normalize(&turn.content.into_reply(), &date),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use toolchat_client::MemoryBackend;
    use toolchat_types::{Conversation, RawTool, StructuredReply, ToolRecommendation, TurnContent};

    fn reconciler(backend: Arc<MemoryBackend>) -> HistoryReconciler {
        HistoryReconciler::new(backend, DateLabeler::default())
    }

    #[tokio::test]
    async fn test_replay_matches_live_normalization() {
        let reply: StructuredReply = ToolRecommendation::new()
            .with_intro("Picks")
            .with_tools(vec![RawTool::named("Anki")])
            .with_next_steps(vec!["Install".to_string()])
            .into();
        let at = Utc.with_ymd_and_hms(2025, 1, 1, 3, 0, 0).unwrap();

        let backend = Arc::new(MemoryBackend::new());
        backend
            .insert_conversation(
                "user-1",
                Conversation::new("c1", "Picks"),
                vec![Turn::assistant(reply.clone(), at)],
            )
            .await;

        let blocks = reconciler(backend).reconstruct("c1").await.unwrap();
        assert_eq!(blocks, normalize(&reply, "01/01/2025"));
    }

    #[tokio::test]
    async fn test_user_turns_carry_time() {
        let at = Utc.with_ymd_and_hms(2025, 1, 1, 3, 15, 0).unwrap();
        let backend = Arc::new(MemoryBackend::new());
        backend
            .insert_conversation(
                "user-1",
                Conversation::new("c1", "Hi"),
                vec![Turn::user("hello", at)],
            )
            .await;

        let blocks = reconciler(backend).reconstruct("c1").await.unwrap();
        assert_eq!(
            blocks,
            vec![DisplayBlock::user_text("hello", "01/01/2025", Some("10:15".to_string()))]
        );
    }

    #[test]
    fn test_bare_assistant_string_is_chat() {
        let backend = Arc::new(MemoryBackend::new());
        let turn = Turn {
            role: Role::Assistant,
            content: TurnContent::Text("legacy answer".to_string()),
            timestamp: Some(Utc.with_ymd_and_hms(2025, 2, 1, 0, 0, 0).unwrap()),
        };

        let blocks = reconciler(backend).replay(vec![turn]);
        assert_eq!(
            blocks,
            vec![DisplayBlock::assistant_text("legacy answer", "01/02/2025")]
        );
    }

    #[tokio::test]
    async fn test_fetch_failure_yields_no_blocks() {
        let backend = Arc::new(MemoryBackend::new());
        backend.set_history_available(false);

        assert!(reconciler(backend).reconstruct("c1").await.is_err());
    }
}

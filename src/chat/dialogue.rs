use log::{info, warn};

use crate::chat::graph::DialogueGraph;
use crate::chat::lexicon;
use crate::chat::outbox::{BotLine, Pause};
use crate::chat::script::ScriptError;
use crate::chat::ConversationState;

#[derive(Debug, Default)]
pub struct DialogueStep {
    pub lines: Vec<BotLine>,
    /// The user opted into the wellness check at the wrap-up node.
    pub start_check_in: bool,
}

/// Moves through the icebreaker graph based on keyword rules.
pub struct DialogueEngine<'a> {
    graph: &'a DialogueGraph,
}

impl<'a> DialogueEngine<'a> {
    pub fn new(graph: &'a DialogueGraph) -> Self {
        Self { graph }
    }

    pub fn advance(
        &self,
        state: &mut ConversationState,
        answer: &str,
    ) -> Result<DialogueStep, ScriptError> {
        let node = self
            .graph
            .get(&state.current_node_id)
            .ok_or_else(|| ScriptError::UnknownNode(state.current_node_id.clone()))?;

        // The wrap-up node ignores its own transition and asks about the check-in.
        if self.graph.is_wrap_up(&node.id) {
            let lowered = answer.to_lowercase();
            if lexicon::OPT_IN_KEYWORDS.iter().any(|k| lowered.contains(k)) {
                info!("Opt-in at {}: starting wellness check", node.id);
                return Ok(DialogueStep {
                    lines: vec![BotLine::new(lexicon::CHECK_IN_ACCEPTED, Pause::Reply)],
                    start_check_in: true,
                });
            }
            info!("Wellness check declined at {}", node.id);
            return Ok(DialogueStep {
                lines: vec![BotLine::new(lexicon::CHECK_IN_DECLINED, Pause::Reply)],
                start_check_in: false,
            });
        }

        let line = match node.next_id(answer) {
            Some(next_id) => match self.graph.get(next_id) {
                Some(next) => {
                    info!("Transition: {} -> {}", node.id, next.id);
                    state.current_node_id = next.id.clone();
                    BotLine::new(next.prompt.clone(), Pause::Reply)
                }
                None => {
                    warn!(
                        "Node '{}' points at undefined node '{next_id}'; staying put",
                        node.id
                    );
                    BotLine::new(lexicon::FILLER, Pause::Reply)
                }
            },
            None => BotLine::new(lexicon::FILLER, Pause::Reply),
        };

        Ok(DialogueStep {
            lines: vec![line],
            start_check_in: false,
        })
    }
}

use serde::Deserialize;

/// A single node in the icebreaker dialogue graph.
#[derive(Debug, Clone, Deserialize)]
pub struct DialogueNode {
    /// Unique identifier for this node (e.g. "icebreaker1", "wrapup").
    pub id: String,
    /// The line the bot says when entering this node.
    pub prompt: String,
    // Terminal, or keyword rules + default
    pub transition: Transition,
}

#[derive(Debug, Clone, Deserialize)]
pub struct KeywordRule {
    // Lower-case substring looked for in the answer
    pub keyword: String,
    // ID of an existing node
    pub target: String,
}

#[derive(Debug, Clone, Deserialize)]
pub enum Transition {
    // No next node, whatever the answer
    Terminal,
    // Rules are checked in order; first keyword found wins, otherwise `default`
    Decision {
        #[serde(default)]
        rules: Vec<KeywordRule>,
        default: String,
    },
}

impl DialogueNode {
    pub fn decision(
        id: &str,
        prompt: &str,
        rules: &[(&str, &str)],
        default: &str,
    ) -> Self {
        Self {
            id: id.into(),
            prompt: prompt.into(),
            transition: Transition::Decision {
                rules: rules
                    .iter()
                    .map(|(keyword, target)| KeywordRule {
                        keyword: (*keyword).into(),
                        target: (*target).into(),
                    })
                    .collect(),
                default: default.into(),
            },
        }
    }

    pub fn terminal(id: &str, prompt: &str) -> Self {
        Self {
            id: id.into(),
            prompt: prompt.into(),
            transition: Transition::Terminal,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.transition, Transition::Terminal)
    }

    /// Pick the next node id for `answer`. Matching is a case-insensitive
    /// substring check, so "Pretty GOOD" hits a "good" rule.
    pub fn next_id(&self, answer: &str) -> Option<&str> {
        match &self.transition {
            Transition::Terminal => None,
            Transition::Decision { rules, default } => {
                let answer = answer.to_lowercase();
                let hit = rules
                    .iter()
                    .find(|rule| answer.contains(&rule.keyword.to_lowercase()));
                Some(hit.map_or(default.as_str(), |rule| rule.target.as_str()))
            }
        }
    }

    /// Every id this node can transition to, rule targets first.
    pub fn targets(&self) -> Vec<&str> {
        match &self.transition {
            Transition::Terminal => Vec::new(),
            Transition::Decision { rules, default } => rules
                .iter()
                .map(|rule| rule.target.as_str())
                .chain(std::iter::once(default.as_str()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stress_node() -> DialogueNode {
        DialogueNode::decision(
            "followup2",
            "What do you do?",
            &[("friends", "with_friends"), ("alone", "on_my_own")],
            "generic",
        )
    }

    #[test]
    fn test_first_matching_rule_wins() {
        let node = stress_node();
        assert_eq!(
            node.next_id("I go out with friends, sometimes alone"),
            Some("with_friends")
        );
        assert_eq!(node.next_id("Mostly ALONE"), Some("on_my_own"));
    }

    #[test]
    fn test_unmatched_answer_falls_through_to_default() {
        assert_eq!(stress_node().next_id("I go for a run"), Some("generic"));
        assert_eq!(stress_node().next_id(""), Some("generic"));
    }

    #[test]
    fn test_terminal_node_has_no_next() {
        let node = DialogueNode::terminal("end", "Bye");
        assert!(node.is_terminal());
        assert_eq!(node.next_id("anything"), None);
        assert!(node.targets().is_empty());
    }

    #[test]
    fn test_transition_deserializes_from_json() {
        let raw = r#"{
            "id": "start",
            "prompt": "Hi!",
            "transition": {"Decision": {"rules": [{"keyword": "good", "target": "happy"}], "default": "sad"}}
        }"#;
        let node: DialogueNode = serde_json::from_str(raw).unwrap();
        assert_eq!(node.targets(), vec!["happy", "sad"]);

        let raw = r#"{"id": "end", "prompt": "Bye", "transition": "Terminal"}"#;
        let node: DialogueNode = serde_json::from_str(raw).unwrap();
        assert!(node.is_terminal());
    }
}

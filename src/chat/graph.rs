use std::collections::{HashMap, HashSet, VecDeque};

use crate::chat::node::DialogueNode;
use crate::chat::script::ScriptError;

/// The icebreaker dialogue: a map of node-id -> DialogueNode.
///
/// Nodes only refer to each other by id. Construction checks that every
/// referenced id exists, so a lookup by an id coming out of a transition
/// can only miss if the graph was built by hand around `new`.
#[derive(Debug, Clone)]
pub struct DialogueGraph {
    nodes: HashMap<String, DialogueNode>,
    entry_node_id: String,
    wrap_up_node_id: String,
}

impl DialogueGraph {
    pub fn new(
        entry_node_id: impl Into<String>,
        wrap_up_node_id: impl Into<String>,
        nodes: Vec<DialogueNode>,
    ) -> Result<Self, ScriptError> {
        let entry_node_id = entry_node_id.into();
        let wrap_up_node_id = wrap_up_node_id.into();

        let mut map = HashMap::new();
        for node in nodes {
            if map.contains_key(&node.id) {
                return Err(ScriptError::DuplicateNode(node.id));
            }
            map.insert(node.id.clone(), node);
        }

        if !map.contains_key(&entry_node_id) {
            return Err(ScriptError::MissingEntry(entry_node_id));
        }
        if !map.contains_key(&wrap_up_node_id) {
            return Err(ScriptError::MissingWrapUp(wrap_up_node_id));
        }

        for node in map.values() {
            if let Some(target) = node.targets().into_iter().find(|t| !map.contains_key(*t)) {
                return Err(ScriptError::DanglingTarget {
                    from: node.id.clone(),
                    target: target.to_string(),
                });
            }
        }

        Ok(Self {
            nodes: map,
            entry_node_id,
            wrap_up_node_id,
        })
    }

    /// Skips validation so lookups of undefined ids can be exercised.
    #[cfg(test)]
    pub(crate) fn unchecked(
        entry_node_id: &str,
        wrap_up_node_id: &str,
        nodes: Vec<DialogueNode>,
    ) -> Self {
        Self {
            nodes: nodes.into_iter().map(|n| (n.id.clone(), n)).collect(),
            entry_node_id: entry_node_id.into(),
            wrap_up_node_id: wrap_up_node_id.into(),
        }
    }

    pub fn get(&self, id: &str) -> Option<&DialogueNode> {
        self.nodes.get(id)
    }

    #[cfg(test)]
    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn entry_node_id(&self) -> &str {
        &self.entry_node_id
    }

    pub fn wrap_up_node_id(&self) -> &str {
        &self.wrap_up_node_id
    }

    pub fn is_wrap_up(&self, id: &str) -> bool {
        self.wrap_up_node_id == id
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[cfg(test)]
    pub fn nodes(&self) -> impl Iterator<Item = &DialogueNode> {
        self.nodes.values()
    }

    /// Ids reachable from the entry node by following any rule or default.
    /// The graph may contain cycles, so this is a plain BFS with a seen set.
    pub fn reachable_from_entry(&self) -> HashSet<&str> {
        let mut seen = HashSet::new();
        let mut queue = VecDeque::from([self.entry_node_id.as_str()]);
        while let Some(id) = queue.pop_front() {
            if !seen.insert(id) {
                continue;
            }
            if let Some(node) = self.nodes.get(id) {
                queue.extend(node.targets());
            }
        }
        seen
    }

    /// Nodes that can never be visited. Not an error, but worth a warning.
    pub fn unreachable_ids(&self) -> Vec<&str> {
        let reachable = self.reachable_from_entry();
        let mut ids: Vec<&str> = self
            .nodes
            .keys()
            .map(String::as_str)
            .filter(|id| !reachable.contains(id))
            .collect();
        ids.sort_unstable();
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::lexicon;

    fn small_nodes() -> Vec<DialogueNode> {
        vec![
            DialogueNode::decision("a", "A?", &[("yes", "b")], "c"),
            DialogueNode::decision("b", "B?", &[], "c"),
            DialogueNode::terminal("c", "Done"),
        ]
    }

    #[test]
    fn test_builds_and_looks_up_by_id() {
        let graph = DialogueGraph::new("a", "c", small_nodes()).unwrap();
        assert_eq!(graph.len(), 3);
        assert_eq!(graph.get("b").map(|n| n.prompt.as_str()), Some("B?"));
        assert!(graph.get("zzz").is_none());
        assert!(graph.is_wrap_up("c"));
    }

    #[test]
    fn test_duplicate_id_is_rejected() {
        let mut nodes = small_nodes();
        nodes.push(DialogueNode::terminal("b", "again"));
        let err = DialogueGraph::new("a", "c", nodes).unwrap_err();
        assert!(matches!(err, ScriptError::DuplicateNode(id) if id == "b"));
    }

    #[test]
    fn test_dangling_target_is_rejected() {
        let mut nodes = small_nodes();
        nodes.push(DialogueNode::decision("d", "D?", &[("x", "nowhere")], "c"));
        let err = DialogueGraph::new("a", "c", nodes).unwrap_err();
        assert!(matches!(
            err,
            ScriptError::DanglingTarget { from, target } if from == "d" && target == "nowhere"
        ));
    }

    #[test]
    fn test_missing_entry_and_wrap_up_are_rejected() {
        assert!(matches!(
            DialogueGraph::new("nope", "c", small_nodes()),
            Err(ScriptError::MissingEntry(_))
        ));
        assert!(matches!(
            DialogueGraph::new("a", "nope", small_nodes()),
            Err(ScriptError::MissingWrapUp(_))
        ));
    }

    #[test]
    fn test_cycles_do_not_hang_reachability() {
        let nodes = vec![
            DialogueNode::decision("a", "A?", &[("again", "a")], "b"),
            DialogueNode::decision("b", "B?", &[("back", "a")], "c"),
            DialogueNode::terminal("c", "Done"),
            DialogueNode::terminal("orphan", "Never"),
        ];
        let graph = DialogueGraph::new("a", "c", nodes).unwrap();
        assert_eq!(graph.reachable_from_entry().len(), 3);
        assert_eq!(graph.unreachable_ids(), vec!["orphan"]);
    }

    #[test]
    fn test_builtin_graph_is_closed_under_transitions() {
        let graph = lexicon::icebreaker_graph().unwrap();
        let answers = [
            "",
            "good",
            "I'm doing great today",
            "fine",
            "terrible",
            "friends",
            "alone",
            "yes",
            "no thanks",
        ];
        for node in graph.nodes() {
            for answer in answers {
                if let Some(next) = node.next_id(answer) {
                    assert!(graph.contains(next), "{} -> {next} missing", node.id);
                }
            }
        }
        assert!(graph.unreachable_ids().is_empty());
    }
}

//! Authored content bundle: dialogue graph, wellness script and trigger terms.
//!
//! The built-in content lives in [`crate::chat::lexicon`]. A JSON file can
//! replace it at startup; whatever the source, the bundle is validated once
//! and any problem aborts startup instead of surfacing mid-conversation.

use std::path::Path;

use anyhow::{Context, Result};
use log::{info, warn};
use serde::Deserialize;

use crate::chat::graph::DialogueGraph;
use crate::chat::lexicon;
use crate::chat::node::DialogueNode;
use crate::chat::wellness::{WellnessScript, WellnessSection};

#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    #[error("duplicate dialogue node id: {0}")]
    DuplicateNode(String),

    #[error("entry node '{0}' is not defined")]
    MissingEntry(String),

    #[error("wrap-up node '{0}' is not defined")]
    MissingWrapUp(String),

    #[error("node '{from}' points at undefined node '{target}'")]
    DanglingTarget { from: String, target: String },

    #[error("wellness script has no sections")]
    EmptyWellnessScript,

    #[error("wellness section '{0}' has no questions")]
    EmptySection(String),

    #[error("sensitive term list contains a blank entry")]
    BlankTerm,

    #[error("no dialogue node with id '{0}'")]
    UnknownNode(String),

    #[error("malformed script file: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Everything the conversation needs that is authored rather than computed.
#[derive(Debug, Clone)]
pub struct Script {
    pub graph: DialogueGraph,
    pub wellness: WellnessScript,
    pub sensitive_terms: Vec<String>,
}

/// On-disk shape of a script file.
#[derive(Debug, Deserialize)]
struct ScriptFile {
    entry_node_id: String,
    wrap_up_node_id: String,
    nodes: Vec<DialogueNode>,
    wellness: Vec<WellnessSection>,
    #[serde(default)]
    sensitive_terms: Option<Vec<String>>,
}

impl Script {
    pub fn new(
        graph: DialogueGraph,
        wellness: WellnessScript,
        sensitive_terms: Vec<String>,
    ) -> Result<Self, ScriptError> {
        if sensitive_terms.iter().any(|t| t.trim().is_empty()) {
            return Err(ScriptError::BlankTerm);
        }
        let sensitive_terms = sensitive_terms.iter().map(|t| t.to_lowercase()).collect();

        let wrap_up_id = graph.wrap_up_node_id();
        if graph.get(wrap_up_id).is_some_and(|n| !n.is_terminal()) {
            info!("Wrap-up node '{wrap_up_id}' has a transition; it is ignored in favor of the check-in offer");
        }
        for id in graph.unreachable_ids() {
            warn!("Dialogue node '{id}' is unreachable from the entry node");
        }

        Ok(Self {
            graph,
            wellness,
            sensitive_terms,
        })
    }

    /// The icebreaker, six-section check-in and substance lexicon shipped
    /// with the binary.
    pub fn builtin() -> Result<Self, ScriptError> {
        Self::new(
            lexicon::icebreaker_graph()?,
            lexicon::wellness_script()?,
            lexicon::sensitive_terms(),
        )
    }

    pub fn from_json(raw: &str) -> Result<Self, ScriptError> {
        let file: ScriptFile = serde_json::from_str(raw)?;
        let graph = DialogueGraph::new(file.entry_node_id, file.wrap_up_node_id, file.nodes)?;
        let wellness = WellnessScript::new(file.wellness)?;
        let terms = file.sensitive_terms.unwrap_or_else(lexicon::sensitive_terms);
        Self::new(graph, wellness, terms)
    }

    pub fn load(path: &Path) -> Result<Self> {
        info!("Loading script from: {}", path.display());
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read script file {}", path.display()))?;
        let script = Self::from_json(&raw)
            .with_context(|| format!("invalid script file {}", path.display()))?;
        info!(
            "Script loaded: {} dialogue nodes, {} wellness sections, {} trigger terms",
            script.graph.len(),
            script.wellness.sections().len(),
            script.sensitive_terms.len()
        );
        Ok(script)
    }
}

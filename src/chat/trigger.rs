use regex::{Regex, RegexBuilder};

/// Flags messages mentioning a sensitive term.
///
/// Plain case-insensitive substring search over the whole lexicon, compiled
/// into a single alternation. No word boundaries: "weedkiller" triggers too.
#[derive(Debug, Clone)]
pub struct TriggerDetector {
    // None when the lexicon is empty; an empty alternation would match everything.
    pattern: Option<Regex>,
}

impl TriggerDetector {
    pub fn new(terms: &[String]) -> Result<Self, regex::Error> {
        if terms.is_empty() {
            return Ok(Self { pattern: None });
        }
        let alternation = terms
            .iter()
            .map(|t| regex::escape(&t.to_lowercase()))
            .collect::<Vec<_>>()
            .join("|");
        let pattern = RegexBuilder::new(&alternation)
            .case_insensitive(true)
            .build()?;
        Ok(Self {
            pattern: Some(pattern),
        })
    }

    pub fn detect(&self, input: &str) -> bool {
        self.matched_term(input).is_some()
    }

    /// The first sensitive term found in `input`, lower-cased.
    pub fn matched_term(&self, input: &str) -> Option<String> {
        let pattern = self.pattern.as_ref()?;
        pattern.find(input).map(|m| m.as_str().to_lowercase())
    }
}

use log::{debug, info, warn};
use serde::Deserialize;

use crate::chat::lexicon;
use crate::chat::outbox::{BotLine, Pause};
use crate::chat::script::ScriptError;
use crate::chat::{ConversationState, Mode};

// ---------------------------------------------------------------------------
// Script
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct WellnessSection {
    pub name: String,
    pub questions: Vec<String>,
}

/// Ordered sections of the check-in. Order is presentation order.
#[derive(Debug, Clone)]
pub struct WellnessScript {
    sections: Vec<WellnessSection>,
}

impl WellnessScript {
    pub fn new(sections: Vec<WellnessSection>) -> Result<Self, ScriptError> {
        if sections.is_empty() {
            return Err(ScriptError::EmptyWellnessScript);
        }
        if let Some(empty) = sections.iter().find(|s| s.questions.is_empty()) {
            return Err(ScriptError::EmptySection(empty.name.clone()));
        }
        Ok(Self { sections })
    }

    pub fn sections(&self) -> &[WellnessSection] {
        &self.sections
    }

    pub fn total_questions(&self) -> usize {
        self.sections.iter().map(|s| s.questions.len()).sum()
    }

    fn question_at(&self, section_index: usize, question_index: usize) -> Option<BotLine> {
        let section = self.sections.get(section_index)?;
        let question = section.questions.get(question_index)?;
        Some(BotLine::new(
            lexicon::question_line(&section.name, question),
            Pause::Immediate,
        ))
    }
}

// ---------------------------------------------------------------------------
// Recorded answers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WellnessAnswer {
    pub section: String,
    pub question: String,
    /// Raw text as typed.
    pub answer: String,
}

impl WellnessAnswer {
    /// Yes/no view of the answer: anything containing "yes" counts as yes.
    pub fn is_affirmative(&self) -> bool {
        self.answer.to_lowercase().contains("yes")
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct WellnessStep {
    pub lines: Vec<BotLine>,
    /// True when this answer closed the last section.
    pub completed: bool,
}

/// Walks the check-in one question at a time. Question order never depends
/// on what the user answers.
pub struct WellnessEngine<'a> {
    script: &'a WellnessScript,
}

impl<'a> WellnessEngine<'a> {
    pub fn new(script: &'a WellnessScript) -> Self {
        Self { script }
    }

    /// Switch the session into check-in mode and ask the first question.
    pub fn enter(&self, state: &mut ConversationState) -> Vec<BotLine> {
        state.mode = Mode::Wellness;
        state.section_index = 0;
        state.question_index = 0;
        state.wellness_answers.clear();
        info!(
            "Wellness check started ({} sections, {} questions)",
            self.script.sections.len(),
            self.script.total_questions()
        );

        let mut lines = vec![BotLine::new(lexicon::CHECK_IN_INSTRUCTIONS, Pause::Immediate)];
        if let Some(mut first) = self.script.question_at(0, 0) {
            first.pause = Pause::FirstQuestion;
            lines.push(first);
        }
        lines
    }

    pub fn record_answer(&self, state: &mut ConversationState, answer: &str) -> WellnessStep {
        let Some(section) = self.script.sections.get(state.section_index) else {
            warn!(
                "Wellness answer at section {} but only {} sections exist; leaving check-in",
                state.section_index,
                self.script.sections.len()
            );
            state.mode = Mode::Dialogue;
            return WellnessStep::default();
        };

        state.wellness_answers.push(WellnessAnswer {
            section: section.name.clone(),
            question: section
                .questions
                .get(state.question_index)
                .cloned()
                .unwrap_or_default(),
            answer: answer.to_string(),
        });
        state.question_index += 1;
        debug!(
            "Wellness position: section {} question {}",
            state.section_index, state.question_index
        );

        if let Some(mut next) = self
            .script
            .question_at(state.section_index, state.question_index)
        {
            next.pause = Pause::NextQuestion;
            return WellnessStep {
                lines: vec![next],
                completed: false,
            };
        }

        state.section_index += 1;
        state.question_index = 0;

        match self.script.sections.get(state.section_index) {
            Some(next_section) => {
                info!("Wellness section: {}", next_section.name);
                let mut lines = vec![BotLine::new(
                    lexicon::section_intro(&next_section.name),
                    Pause::Reply,
                )];
                if let Some(mut question) = self.script.question_at(state.section_index, 0) {
                    question.pause = Pause::SectionQuestion;
                    lines.push(question);
                }
                WellnessStep {
                    lines,
                    completed: false,
                }
            }
            None => {
                info!(
                    "Wellness check complete: {} answers, {} yes",
                    state.wellness_answers.len(),
                    state.wellness_yes_count()
                );
                state.mode = Mode::Dialogue;
                WellnessStep {
                    lines: vec![BotLine::new(lexicon::CHECK_IN_COMPLETE, Pause::Immediate)],
                    completed: true,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_sections() -> WellnessScript {
        WellnessScript::new(vec![
            WellnessSection {
                name: "Sleep".into(),
                questions: vec!["Tired?".into(), "Restless?".into()],
            },
            WellnessSection {
                name: "Money".into(),
                questions: vec!["Broke?".into()],
            },
        ])
        .unwrap()
    }

    fn texts(lines: &[BotLine]) -> Vec<&str> {
        lines.iter().map(|l| l.text.as_str()).collect()
    }

    #[test]
    fn test_enter_resets_position_and_asks_first_question() {
        let script = two_sections();
        let engine = WellnessEngine::new(&script);
        let mut state = ConversationState::new("wrapup");
        state.section_index = 1;
        state.question_index = 1;

        let lines = engine.enter(&mut state);
        assert_eq!(state.mode, Mode::Wellness);
        assert_eq!((state.section_index, state.question_index), (0, 0));
        assert_eq!(lines.last().unwrap().text, "Sleep — Tired?");
        assert_eq!(lines.last().unwrap().pause, Pause::FirstQuestion);
    }

    #[test]
    fn test_walks_every_question_in_order() {
        let script = two_sections();
        let engine = WellnessEngine::new(&script);
        let mut state = ConversationState::new("wrapup");
        engine.enter(&mut state);

        let step = engine.record_answer(&mut state, "yes");
        assert_eq!(texts(&step.lines), vec!["Sleep — Restless?"]);
        assert!(!step.completed);

        let step = engine.record_answer(&mut state, "no");
        assert_eq!(
            texts(&step.lines),
            vec!["Let's talk about Money next.", "Money — Broke?"]
        );
        assert_eq!((state.section_index, state.question_index), (1, 0));

        let step = engine.record_answer(&mut state, "maybe");
        assert!(step.completed);
        assert_eq!(texts(&step.lines), vec![lexicon::CHECK_IN_COMPLETE]);
        assert_eq!(state.mode, Mode::Dialogue);
        assert_eq!(state.section_index, 2);
    }

    #[test]
    fn test_answers_are_recorded_raw_with_their_question() {
        let script = two_sections();
        let engine = WellnessEngine::new(&script);
        let mut state = ConversationState::new("wrapup");
        engine.enter(&mut state);
        engine.record_answer(&mut state, "Yes, a lot");
        engine.record_answer(&mut state, "nope");

        assert_eq!(
            state.wellness_answers[0],
            WellnessAnswer {
                section: "Sleep".into(),
                question: "Tired?".into(),
                answer: "Yes, a lot".into(),
            }
        );
        assert_eq!(state.wellness_answers[1].question, "Restless?");
        assert_eq!(state.wellness_yes_count(), 1);
    }

    #[test]
    fn test_builtin_script_takes_one_answer_per_question() {
        let script = lexicon::wellness_script().unwrap();
        let engine = WellnessEngine::new(&script);
        let mut state = ConversationState::new("wrapup");
        engine.enter(&mut state);

        let mut calls = 0;
        loop {
            calls += 1;
            let step = engine.record_answer(&mut state, "no");
            if step.completed {
                break;
            }
            assert!(calls < 100, "check-in never completed");
        }
        assert_eq!(calls, script.total_questions());
        assert_eq!(calls, 19);
    }

    #[test]
    fn test_invalid_scripts_are_rejected() {
        assert!(matches!(
            WellnessScript::new(vec![]),
            Err(ScriptError::EmptyWellnessScript)
        ));
        let err = WellnessScript::new(vec![WellnessSection {
            name: "Hollow".into(),
            questions: vec![],
        }])
        .unwrap_err();
        assert!(matches!(err, ScriptError::EmptySection(name) if name == "Hollow"));
    }

    #[test]
    fn test_affirmative_view() {
        let answer = |text: &str| WellnessAnswer {
            section: "s".into(),
            question: "q".into(),
            answer: text.into(),
        };
        assert!(answer("YES").is_affirmative());
        assert!(answer("yes, sometimes").is_affirmative());
        assert!(!answer("no").is_affirmative());
    }
}

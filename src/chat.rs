pub mod dialogue;
pub mod graph;
pub mod lexicon;
pub mod node;
pub mod outbox;
pub mod script;
pub mod trigger;
pub mod wellness;

use std::io::{self, Write};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use log::{debug, error, info, warn};

use crate::alert::Notifier;
use crate::scoring::{ScoreReport, ScoringService};
use dialogue::DialogueEngine;
use outbox::{BotLine, ChatMessage, Outbox, Pacing, Pause, RenderSink};
use script::Script;
use trigger::TriggerDetector;
use wellness::{WellnessAnswer, WellnessEngine};

// ---------------------------------------------------------------------------
// Conversation state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Dialogue,
    Wellness,
}

/// Everything that changes during one chat session.
#[derive(Debug, Clone)]
pub struct ConversationState {
    pub mode: Mode,
    /// Only meaningful in `Mode::Dialogue`.
    pub current_node_id: String,
    /// Only meaningful in `Mode::Wellness`. Equal to the section count once
    /// the check-in is finished.
    pub section_index: usize,
    pub question_index: usize,
    /// Every accepted submission, in order. Append-only.
    pub answer_log: Vec<String>,
    /// Answers of the current (or last) check-in run.
    pub wellness_answers: Vec<WellnessAnswer>,
}

impl ConversationState {
    pub fn new(entry_node_id: impl Into<String>) -> Self {
        Self {
            mode: Mode::Dialogue,
            current_node_id: entry_node_id.into(),
            section_index: 0,
            question_index: 0,
            answer_log: Vec::new(),
            wellness_answers: Vec::new(),
        }
    }

    pub fn wellness_yes_count(&self) -> usize {
        self.wellness_answers
            .iter()
            .filter(|a| a.is_affirmative())
            .count()
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// What `Session::submit` did with a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submission {
    /// Blank input; nothing happened.
    Ignored,
    /// A trigger term was found; crisis response sent, state untouched.
    Triggered,
    /// Handled by the active engine.
    Answered,
    /// The last check-in question was answered. The caller should run
    /// `score_answers` once the completion message has been shown.
    CheckInComplete,
}

type ScoreResult = Result<ScoreReport>;

/// One user's conversation: routes each submission through trigger
/// detection and then to whichever engine is active.
pub struct Session {
    script: Script,
    detector: TriggerDetector,
    state: ConversationState,
    outbox: Outbox,
    transcript: Vec<ChatMessage>,
    notifier: Box<dyn Notifier>,
    scorer: Arc<dyn ScoringService>,
    score_tx: Sender<ScoreResult>,
    score_rx: Receiver<ScoreResult>,
    scores_pending: usize,
}

impl Session {
    /// Start a session. The entry node's prompt is queued as the first message.
    pub fn new(
        script: Script,
        notifier: Box<dyn Notifier>,
        scorer: Arc<dyn ScoringService>,
    ) -> Result<Self> {
        let detector = TriggerDetector::new(&script.sensitive_terms)
            .context("failed to compile sensitive term list")?;
        let entry = script
            .graph
            .get(script.graph.entry_node_id())
            .context("entry node missing from dialogue graph")?;
        let opening = BotLine::new(entry.prompt.clone(), Pause::Immediate);
        let state = ConversationState::new(entry.id.clone());
        let (score_tx, score_rx) = mpsc::channel();

        info!("Session started. Initial node: {}", state.current_node_id);

        let mut session = Self {
            script,
            detector,
            state,
            outbox: Outbox::new(),
            transcript: Vec::new(),
            notifier,
            scorer,
            score_tx,
            score_rx,
            scores_pending: 0,
        };
        session.emit(opening);
        Ok(session)
    }

    pub fn state(&self) -> &ConversationState {
        &self.state
    }

    /// Every message queued so far, user and bot, in emission order.
    pub fn transcript(&self) -> &[ChatMessage] {
        &self.transcript
    }

    #[cfg(test)]
    fn pending(&self) -> usize {
        self.outbox.len()
    }

    pub fn submit(&mut self, raw: &str) -> Submission {
        let input = raw.trim();
        if input.is_empty() {
            return Submission::Ignored;
        }

        debug!("User input: \"{input}\"");
        self.push(ChatMessage::user(input), Pause::Immediate);
        self.state.answer_log.push(input.to_string());

        if self.detector.detect(input) {
            info!(
                "Trigger term '{}' detected; sending crisis response",
                self.detector.matched_term(input).unwrap_or_default()
            );
            for part in lexicon::CRISIS_RESPONSE {
                self.emit(BotLine::new(part, Pause::Reply));
            }
            if let Err(e) = self.notifier.notify(input) {
                warn!("Trigger notification failed: {e:#}");
            }
            return Submission::Triggered;
        }

        match self.state.mode {
            Mode::Wellness => {
                let step =
                    WellnessEngine::new(&self.script.wellness).record_answer(&mut self.state, input);
                self.emit_all(step.lines);
                if step.completed {
                    return Submission::CheckInComplete;
                }
            }
            Mode::Dialogue => {
                match DialogueEngine::new(&self.script.graph).advance(&mut self.state, input) {
                    Ok(step) => {
                        self.emit_all(step.lines);
                        if step.start_check_in {
                            let lines =
                                WellnessEngine::new(&self.script.wellness).enter(&mut self.state);
                            self.emit_all(lines);
                        }
                    }
                    Err(e) => {
                        error!("Dialogue step failed: {e}");
                        self.emit(BotLine::new(lexicon::FILLER, Pause::Reply));
                    }
                }
            }
        }

        Submission::Answered
    }

    /// Score the last check-in's answers on a worker thread. The outcome is
    /// queued by `collect_scores` once it arrives; failures become a single
    /// apology line.
    pub fn score_answers(&mut self) {
        let responses: Vec<String> = self
            .state
            .wellness_answers
            .iter()
            .map(|a| a.answer.clone())
            .collect();
        let scorer = Arc::clone(&self.scorer);
        let tx = self.score_tx.clone();

        let spawned = std::thread::Builder::new()
            .name("scoring".into())
            .spawn(move || {
                // The session may be gone by now; nothing to do then.
                let _ = tx.send(scorer.score(&responses));
            });
        match spawned {
            Ok(_) => self.scores_pending += 1,
            Err(e) => {
                error!("Failed to start scoring: {e}");
                self.emit(BotLine::new(lexicon::SCORING_FAILED, Pause::Immediate));
            }
        }
    }

    pub fn scores_pending(&self) -> usize {
        self.scores_pending
    }

    /// Queue whatever scoring results have arrived. Never blocks.
    pub fn collect_scores(&mut self) -> usize {
        let mut collected = 0;
        while let Ok(result) = self.score_rx.try_recv() {
            self.apply_score(result);
            collected += 1;
        }
        collected
    }

    /// Block up to `timeout` for scoring calls still running.
    pub fn wait_for_scores(&mut self, timeout: Duration) -> usize {
        let deadline = Instant::now() + timeout;
        let mut collected = 0;
        while self.scores_pending > 0 {
            let left = deadline.saturating_duration_since(Instant::now());
            match self.score_rx.recv_timeout(left) {
                Ok(result) => {
                    self.apply_score(result);
                    collected += 1;
                }
                Err(_) => break,
            }
        }
        collected
    }

    fn apply_score(&mut self, result: ScoreResult) {
        self.scores_pending = self.scores_pending.saturating_sub(1);
        match result {
            Ok(report) => {
                info!(
                    "Scoring result: {} ({:.1}%)",
                    report.predicted_class, report.addiction_percent
                );
                self.emit(BotLine::new(report.summary(), Pause::Immediate));
                if let Some(conclusion) = report.conclusion {
                    self.emit(BotLine::new(conclusion, Pause::Reply));
                }
            }
            Err(e) => {
                error!("Scoring failed: {e:#}");
                self.emit(BotLine::new(lexicon::SCORING_FAILED, Pause::Immediate));
            }
        }
    }

    /// Show everything queued so far, including scoring results that have
    /// arrived in the meantime.
    pub fn deliver(&mut self, sink: &mut dyn RenderSink, pacing: &Pacing) -> usize {
        self.collect_scores();
        if self.outbox.is_empty() {
            return 0;
        }
        debug!("Delivering {} message(s)", self.outbox.len());
        self.outbox.flush(sink, pacing)
    }

    /// Give scoring up to `grace` to finish and wait for pending alerts.
    pub fn close(&mut self, grace: Duration) {
        if self.scores_pending > 0 {
            info!("Waiting up to {grace:?} for scoring to finish");
            self.wait_for_scores(grace);
        }
        self.notifier.flush();
    }

    fn emit(&mut self, line: BotLine) {
        self.push(ChatMessage::bot(line.text), line.pause);
    }

    fn emit_all(&mut self, lines: Vec<BotLine>) {
        for line in lines {
            self.emit(line);
        }
    }

    fn push(&mut self, message: ChatMessage, pause: Pause) {
        self.transcript.push(message.clone());
        self.outbox.push(message, pause);
    }
}

// ---------------------------------------------------------------------------
// Terminal loop
// ---------------------------------------------------------------------------

/// Read lines from stdin until quit or EOF. `grace` bounds how long the
/// session waits for a running scoring call when the user leaves.
pub fn run(
    session: &mut Session,
    sink: &mut dyn RenderSink,
    pacing: Pacing,
    grace: Duration,
) -> Result<()> {
    println!("\n========================================");
    println!("        WELLNESS CHECK-IN CHAT");
    println!("========================================");
    println!("Type your replies and press Enter.");
    println!("Type 'quit' to leave.");

    session.deliver(sink, &pacing);

    loop {
        print!("\n[You]: ");
        io::stdout().flush()?;
        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            info!("Input closed");
            break;
        }
        let input = input.trim();

        if input.eq_ignore_ascii_case("quit") || input.eq_ignore_ascii_case("exit") {
            break;
        }

        // Blank lines still deliver, which shows scoring results that came in.
        if session.submit(input) == Submission::CheckInComplete {
            session.score_answers();
        }
        session.deliver(sink, &pacing);
    }

    session.close(grace);
    session.deliver(sink, &pacing);

    println!("\nTake care 💛");
    info!(
        "Session ended after {} submissions",
        session.state().answer_log.len()
    );
    Ok(())
}

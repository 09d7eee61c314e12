use std::collections::VecDeque;
use std::io::{self, Write};
use std::time::Duration;

use anyhow::Result;
use log::{debug, trace};
use regex::Regex;

// ---------------------------------------------------------------------------
// Transcript messages
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Author {
    User,
    Bot,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub author: Author,
    pub text: String,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            author: Author::User,
            text: text.into(),
        }
    }
    pub fn bot(text: impl Into<String>) -> Self {
        Self {
            author: Author::Bot,
            text: text.into(),
        }
    }

    pub fn from_user(&self) -> bool {
        self.author == Author::User
    }
}

impl std::fmt::Display for ChatMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let who = match self.author {
            Author::User => "You",
            Author::Bot => "Bot",
        };
        write!(f, "[{who}]: {}", self.text)
    }
}

// ---------------------------------------------------------------------------
// Pacing
// ---------------------------------------------------------------------------

/// How long a bot line waits after the previous message before it shows up.
/// Purely cosmetic "typing" latency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pause {
    Immediate,
    /// A normal reply to what the user just said.
    Reply,
    /// First check-in question, after the instructions.
    FirstQuestion,
    /// Next question inside the same section.
    NextQuestion,
    /// First question of a new section, after its announcement.
    SectionQuestion,
}

/// A bot line plus its pause, as produced by the engines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotLine {
    pub text: String,
    pub pause: Pause,
}

impl BotLine {
    pub fn new(text: impl Into<String>, pause: Pause) -> Self {
        Self {
            text: text.into(),
            pause,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Pacing {
    enabled: bool,
}

impl Pacing {
    pub fn typing() -> Self {
        Self { enabled: true }
    }

    pub fn instant() -> Self {
        Self { enabled: false }
    }

    pub fn delay(&self, pause: Pause) -> Duration {
        if !self.enabled {
            return Duration::ZERO;
        }
        let ms = match pause {
            Pause::Immediate => 0,
            Pause::Reply => 800,
            Pause::FirstQuestion => 1200,
            Pause::NextQuestion => 700,
            Pause::SectionQuestion => 1000,
        };
        Duration::from_millis(ms)
    }
}

// ---------------------------------------------------------------------------
// Render sink
// ---------------------------------------------------------------------------

/// Where delivered messages end up. Calls arrive in delivery order and must
/// be rendered in that order.
pub trait RenderSink {
    fn append_message(&mut self, text: &str, from_user: bool);
}

/// Prints bot lines to stdout. Supports `**bold**` (markers dropped) and
/// `[label](url)` links (printed as `label <url>`).
pub struct TerminalSink {
    re_link: Regex,
    re_bold: Regex,
}

impl TerminalSink {
    pub fn new() -> Result<Self> {
        Ok(Self {
            re_link: Regex::new(r"\[([^\]]+)\]\(([^)\s]+)\)")?,
            re_bold: Regex::new(r"\*\*(.+?)\*\*")?,
        })
    }

    pub fn render(&self, text: &str) -> String {
        let linked = self.re_link.replace_all(text, "$1 <$2>");
        self.re_bold.replace_all(&linked, "$1").into_owned()
    }
}

impl RenderSink for TerminalSink {
    fn append_message(&mut self, text: &str, from_user: bool) {
        // User input is already on screen where it was typed.
        if from_user {
            return;
        }
        println!("\n[Bot]: {}", self.render(text));
        let _ = io::stdout().flush();
    }
}

// ---------------------------------------------------------------------------
// Outbox
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct Outbound {
    message: ChatMessage,
    pause: Pause,
}

/// FIFO of messages waiting to be shown. Deciding what to say happens when
/// messages are queued; `flush` only decides when they appear.
#[derive(Debug, Default)]
pub struct Outbox {
    queue: VecDeque<Outbound>,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: ChatMessage, pause: Pause) {
        debug!("Queued ({pause:?}) {message}");
        self.queue.push_back(Outbound { message, pause });
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Deliver everything queued, in order, sleeping each message's pause
    /// first. Returns how many messages were delivered.
    pub fn flush(&mut self, sink: &mut dyn RenderSink, pacing: &Pacing) -> usize {
        let mut delivered = 0;
        while let Some(out) = self.queue.pop_front() {
            let delay = pacing.delay(out.pause);
            if !delay.is_zero() {
                trace!("Typing for {delay:?}");
                std::thread::sleep(delay);
            }
            sink.append_message(&out.message.text, out.message.from_user());
            delivered += 1;
        }
        delivered
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Sink that keeps everything it is given.
    #[derive(Default)]
    pub(crate) struct RecordingSink {
        pub(crate) lines: Vec<(String, bool)>,
    }

    impl RenderSink for RecordingSink {
        fn append_message(&mut self, text: &str, from_user: bool) {
            self.lines.push((text.to_string(), from_user));
        }
    }

    #[test]
    fn test_flush_preserves_queue_order() {
        let mut outbox = Outbox::new();
        outbox.push(ChatMessage::user("hi"), Pause::Immediate);
        outbox.push(ChatMessage::bot("first"), Pause::Reply);
        outbox.push(ChatMessage::bot("second"), Pause::FirstQuestion);

        let mut sink = RecordingSink::default();
        assert_eq!(outbox.flush(&mut sink, &Pacing::instant()), 3);
        assert!(outbox.is_empty());
        assert_eq!(
            sink.lines,
            vec![
                ("hi".to_string(), true),
                ("first".to_string(), false),
                ("second".to_string(), false),
            ]
        );
    }

    #[test]
    fn test_instant_pacing_collapses_every_delay() {
        let pacing = Pacing::instant();
        for pause in [
            Pause::Reply,
            Pause::FirstQuestion,
            Pause::NextQuestion,
            Pause::SectionQuestion,
        ] {
            assert_eq!(pacing.delay(pause), Duration::ZERO);
        }
        assert_eq!(Pacing::typing().delay(Pause::Reply), Duration::from_millis(800));
        assert_eq!(Pacing::typing().delay(Pause::Immediate), Duration::ZERO);
    }

    #[test]
    fn test_terminal_markup_rendering() {
        let sink = TerminalSink::new().unwrap();
        assert_eq!(
            sink.render("Call **988** or visit [FindTreatment.gov](https://findtreatment.gov)."),
            "Call 988 or visit FindTreatment.gov <https://findtreatment.gov>."
        );
        assert_eq!(sink.render("plain text"), "plain text");
    }

    #[test]
    fn test_chat_message_display() {
        assert_eq!(ChatMessage::bot("hello").to_string(), "[Bot]: hello");
        assert_eq!(ChatMessage::user("hey").to_string(), "[You]: hey");
    }
}

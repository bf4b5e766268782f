//! Message and feedback surface driven by the orchestrator
//!
//! Rendering lives outside this crate; implementors forward these calls to
//! whatever draws text in the headset.

/// On-screen message and outcome feedback
pub trait FeedbackDisplay {
    fn show_message(&mut self, text: &str);
    fn clear_message(&mut self);
    fn show_outcome(&mut self, hit: bool, reaction_time: f32);
}

/// Feedback line for a trial outcome
pub fn outcome_text(hit: bool, reaction_time: f32) -> String {
    if hit {
        format!("Hit! RT: {:.3}s", reaction_time)
    } else {
        "Miss".to_string()
    }
}

/// Writes every message to the log (headless runs)
#[derive(Debug, Default)]
pub struct LogDisplay {
    current: Option<String>,
}

impl LogDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Message currently on screen
    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }
}

impl FeedbackDisplay for LogDisplay {
    fn show_message(&mut self, text: &str) {
        log::info!("[display] {}", text);
        self.current = Some(text.to_string());
    }

    fn clear_message(&mut self) {
        self.current = None;
    }

    fn show_outcome(&mut self, hit: bool, reaction_time: f32) {
        log::info!("[display] {}", outcome_text(hit, reaction_time));
    }
}

/// Keeps a transcript of every call (useful for embedding and tests)
#[derive(Debug, Default)]
pub struct TranscriptDisplay {
    pub messages: Vec<String>,
    pub outcomes: Vec<(bool, f32)>,
    pub clears: usize,
}

impl FeedbackDisplay for TranscriptDisplay {
    fn show_message(&mut self, text: &str) {
        self.messages.push(text.to_string());
    }

    fn clear_message(&mut self) {
        self.clears += 1;
    }

    fn show_outcome(&mut self, hit: bool, reaction_time: f32) {
        self.outcomes.push((hit, reaction_time));
    }
}

//! Pulls the final responder-authored content out of a conversational exchange.
//!
//! The exchange is probed through an ordered list of [`ExtractionStrategy`]s.
//! The chain only reports failure once every view has been tried, and keeps
//! "the responder said nothing" ([`ExtractionResult::Empty`]) apart from
//! "nothing could be observed" ([`ExtractionResult::Unavailable`]).

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::conversation::{ConversationView, Message};

/// Literal token a responder appends when it considers its answer complete.
pub const SENTINEL: &str = "TASK_COMPLETE";

pub fn is_complete(content: &str) -> bool {
    content.contains(SENTINEL)
}

/// Remove every sentinel occurrence and trim surrounding whitespace.
///
/// Removal repeats until no occurrence is left, since deleting one token can
/// splice its neighbours into a new one.
pub fn strip_sentinel(content: &str) -> String {
    let mut cleaned = content.to_string();
    while cleaned.contains(SENTINEL) {
        cleaned = cleaned.replace(SENTINEL, "");
    }
    cleaned.trim().to_string()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionResult {
    Success(String),
    Empty,
    Unavailable,
}

impl ExtractionResult {
    pub fn into_content(self) -> Result<String, ExtractionFailure> {
        match self {
            ExtractionResult::Success(content) => Ok(content),
            ExtractionResult::Empty => Err(ExtractionFailure::Empty),
            ExtractionResult::Unavailable => Err(ExtractionFailure::Unavailable),
        }
    }
}

/// The two failure outcomes of an extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionFailure {
    Empty,
    Unavailable,
}

impl fmt::Display for ExtractionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractionFailure::Empty => write!(f, "responder replied without usable content"),
            ExtractionFailure::Unavailable => write!(f, "no responder content could be observed"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionStrategy {
    /// Newest-first scan of the returned log.
    ReverseLog,
    /// The responder's "most recent message" accessor.
    LastMessage,
    /// Newest-first scan of the responder's own secondary store.
    AlternateLog,
}

impl ExtractionStrategy {
    pub const ALL: [ExtractionStrategy; 3] = [
        ExtractionStrategy::ReverseLog,
        ExtractionStrategy::LastMessage,
        ExtractionStrategy::AlternateLog,
    ];

    fn probe(&self, view: &dyn ConversationView) -> Probe {
        match self {
            ExtractionStrategy::ReverseLog => scan_newest_first(view.log().messages()),
            ExtractionStrategy::LastMessage => match view.last_message() {
                Some(message) => inspect(&message),
                None => Probe::Nothing,
            },
            ExtractionStrategy::AlternateLog => match view.alternate_log() {
                Some(log) => scan_newest_first(log.messages()),
                None => Probe::Nothing,
            },
        }
    }
}

enum Probe {
    Found(String),
    /// A responder message exists but holds nothing usable.
    Blank,
    Nothing,
}

fn inspect(message: &Message) -> Probe {
    if !message.is_from_responder() {
        return Probe::Nothing;
    }
    let cleaned = strip_sentinel(message.text());
    if cleaned.is_empty() {
        Probe::Blank
    } else {
        Probe::Found(cleaned)
    }
}

fn scan_newest_first(messages: &[Message]) -> Probe {
    let mut outcome = Probe::Nothing;
    for message in messages.iter().rev() {
        match inspect(message) {
            Probe::Found(content) => return Probe::Found(content),
            Probe::Blank => outcome = Probe::Blank,
            Probe::Nothing => {}
        }
    }
    outcome
}

#[derive(Debug, Clone)]
pub struct ExtractionChain {
    strategies: Vec<ExtractionStrategy>,
}

impl Default for ExtractionChain {
    fn default() -> Self {
        Self::new(ExtractionStrategy::ALL.to_vec())
    }
}

impl ExtractionChain {
    pub fn new(strategies: Vec<ExtractionStrategy>) -> Self {
        Self { strategies }
    }

    pub fn extract(&self, view: &dyn ConversationView) -> ExtractionResult {
        let mut saw_blank = false;
        for strategy in &self.strategies {
            match strategy.probe(view) {
                Probe::Found(content) => {
                    debug!(?strategy, chars = content.len(), "extracted responder content");
                    return ExtractionResult::Success(content);
                }
                Probe::Blank => saw_blank = true,
                Probe::Nothing => {}
            }
        }

        if saw_blank {
            ExtractionResult::Empty
        } else {
            ExtractionResult::Unavailable
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::{CapturedExchange, ConversationLog};
    use proptest::prelude::*;

    fn exchange(log: Vec<Message>) -> CapturedExchange {
        CapturedExchange::from_log(ConversationLog::new(log))
    }

    #[test]
    fn picks_latest_responder_message_from_log() {
        let view = exchange(vec![
            Message::user("Recommend sights in Lisbon"),
            Message::responder("Draft answer"),
            Message::user(""),
            Message::responder("Final answer\nTASK_COMPLETE"),
        ]);

        let result = ExtractionChain::default().extract(&view);
        assert_eq!(result, ExtractionResult::Success("Final answer".to_string()));
    }

    #[test]
    fn skips_blank_trailing_turn_in_log() {
        let view = exchange(vec![
            Message::user("q"),
            Message::responder("The real answer"),
            Message::responder("   "),
        ]);

        let result = ExtractionChain::default().extract(&view);
        assert_eq!(result, ExtractionResult::Success("The real answer".to_string()));
    }

    #[test]
    fn falls_back_to_last_message_accessor() {
        let view = CapturedExchange {
            log: ConversationLog::new(vec![Message::user("q")]),
            last: Some(Message::responder("From accessor TASK_COMPLETE")),
            alternate: Some(ConversationLog::new(vec![Message::responder("From store")])),
        };

        let result = ExtractionChain::default().extract(&view);
        assert_eq!(result, ExtractionResult::Success("From accessor".to_string()));
    }

    #[test]
    fn falls_back_to_alternate_store() {
        let view = CapturedExchange {
            log: ConversationLog::default(),
            last: Some(Message::user("echoed prompt")),
            alternate: Some(ConversationLog::new(vec![
                Message::user("q"),
                Message::responder("From store"),
            ])),
        };

        let result = ExtractionChain::default().extract(&view);
        assert_eq!(result, ExtractionResult::Success("From store".to_string()));
    }

    #[test]
    fn blank_responder_reply_is_empty_not_unavailable() {
        let view = exchange(vec![
            Message::user("q"),
            Message::responder_without_content(),
            Message::responder("TASK_COMPLETE"),
        ]);

        assert_eq!(ExtractionChain::default().extract(&view), ExtractionResult::Empty);
    }

    #[test]
    fn nothing_observable_is_unavailable() {
        let view = exchange(vec![Message::user("q")]);
        assert_eq!(
            ExtractionChain::default().extract(&view),
            ExtractionResult::Unavailable
        );
        assert_eq!(
            ExtractionChain::default().extract(&CapturedExchange::default()),
            ExtractionResult::Unavailable
        );
    }

    #[test]
    fn restricted_chain_ignores_other_views() {
        let view = CapturedExchange {
            log: ConversationLog::default(),
            last: Some(Message::responder("accessor")),
            alternate: None,
        };
        let chain = ExtractionChain::new(vec![ExtractionStrategy::ReverseLog]);
        assert_eq!(chain.extract(&view), ExtractionResult::Unavailable);
    }

    #[test]
    fn strips_spliced_sentinels() {
        assert_eq!(strip_sentinel("  done TASK_TASK_COMPLETECOMPLETE "), "done");
        assert!(is_complete("ok\nTASK_COMPLETE"));
        assert!(!is_complete("ok"));
    }

    fn arb_message() -> impl Strategy<Value = Message> {
        let content = prop_oneof![
            Just(None),
            Just(Some(String::new())),
            Just(Some(SENTINEL.to_string())),
            "[a-zA-Z_ \n]{0,40}".prop_map(Some),
            "[a-z ]{0,10}".prop_map(|s| Some(format!("{s}{SENTINEL}{s}"))),
        ];
        (any::<bool>(), content).prop_map(|(from_responder, content)| Message {
            role: if from_responder {
                crate::conversation::Role::Responder
            } else {
                crate::conversation::Role::User
            },
            content,
        })
    }

    proptest! {
        #[test]
        fn extraction_is_total_and_sentinel_free(
            log in prop::collection::vec(arb_message(), 0..8),
            last in prop::option::of(arb_message()),
            alternate in prop::option::of(prop::collection::vec(arb_message(), 0..4)),
        ) {
            let view = CapturedExchange {
                log: ConversationLog::new(log),
                last,
                alternate: alternate.map(ConversationLog::new),
            };
            match ExtractionChain::default().extract(&view) {
                ExtractionResult::Success(content) => {
                    prop_assert!(!content.contains(SENTINEL));
                    prop_assert!(!content.trim().is_empty());
                }
                ExtractionResult::Empty | ExtractionResult::Unavailable => {}
            }
        }
    }
}

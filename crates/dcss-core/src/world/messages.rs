//! Message log

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::consts::MESSAGE_HISTORY;

/// Messages shown to the player, oldest first. Only the most recent
/// `MESSAGE_HISTORY` are kept.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MessageLog {
    messages: VecDeque<String>,
}

impl MessageLog {
    pub fn push(&mut self, msg: impl Into<String>) {
        let msg = msg.into();
        log::debug!("msg: {msg}");
        if self.messages.len() >= MESSAGE_HISTORY {
            self.messages.pop_front();
        }
        self.messages.push_back(msg);
    }

    pub fn last(&self) -> Option<&str> {
        self.messages.back().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.messages.iter().map(String::as_str)
    }

    /// Whether any message contains `needle`
    pub fn contains(&self, needle: &str) -> bool {
        self.messages.iter().any(|m| m.contains(needle))
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Take every pending message, leaving the log empty
    pub fn drain(&mut self) -> Vec<String> {
        core::mem::take(&mut self.messages).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_is_capped() {
        let mut log = MessageLog::default();
        for i in 0..MESSAGE_HISTORY + 5 {
            log.push(format!("message {i}"));
        }
        assert_eq!(log.len(), MESSAGE_HISTORY);
        assert_eq!(log.iter().next(), Some("message 5"));
        assert_eq!(log.last(), Some(format!("message {}", MESSAGE_HISTORY + 4).as_str()));

        let drained = log.drain();
        assert_eq!(drained.len(), MESSAGE_HISTORY);
        assert!(log.is_empty());
    }
}

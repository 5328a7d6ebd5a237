use chrono::{DateTime, Utc};
use std::collections::VecDeque;
use strum_macros::Display;

const DEFAULT_MAX_SIZE: usize = 500;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Display)]
pub enum MessageType {
    Error,
    Warning,
    Info,
    Priority,
    Status,
}

impl MessageType {
    fn color(&self) -> &'static str {
        match self {
            MessageType::Error => "\x1b[31m",
            MessageType::Warning => "\x1b[33m",
            MessageType::Info => "\x1b[0m",
            MessageType::Priority => "\x1b[32m",
            MessageType::Status => "\x1b[36m",
        }
    }
}

#[derive(Clone, Debug)]
pub struct StatusMessage {
    pub timestamp: DateTime<Utc>,
    pub message_type: MessageType,
    pub content: String,
}

impl StatusMessage {
    pub fn new(message_type: MessageType, content: impl Into<String>) -> Self {
        StatusMessage {
            timestamp: Utc::now(),
            message_type,
            content: content.into(),
        }
    }
}

/// Operator facing messages. Bounded, oldest dropped first. In headless mode every message is
/// printed as it arrives.
pub struct MessageLog {
    messages: VecDeque<StatusMessage>,
    headless: bool,
    max_size: usize,
}

impl MessageLog {
    pub fn new(headless: bool, max_size: Option<usize>) -> Self {
        MessageLog {
            messages: VecDeque::new(),
            headless,
            max_size: max_size.unwrap_or(DEFAULT_MAX_SIZE).max(1),
        }
    }

    pub fn add_message(&mut self, message: StatusMessage) {
        if self.messages.len() == self.max_size {
            self.messages.pop_front();
        }

        if self.headless {
            println!(
                "{}{} | {:^8} | {}\x1b[0m",
                message.message_type.color(),
                message.timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
                message.message_type.to_string(),
                message.content,
            )
        }
        self.messages.push_back(message);
    }

    pub fn info(&mut self, content: impl Into<String>) {
        self.add_message(StatusMessage::new(MessageType::Info, content));
    }

    pub fn status(&mut self, content: impl Into<String>) {
        self.add_message(StatusMessage::new(MessageType::Status, content));
    }

    pub fn priority(&mut self, content: impl Into<String>) {
        self.add_message(StatusMessage::new(MessageType::Priority, content));
    }

    pub fn warning(&mut self, content: impl Into<String>) {
        self.add_message(StatusMessage::new(MessageType::Warning, content));
    }

    pub fn error(&mut self, content: impl Into<String>) {
        self.add_message(StatusMessage::new(MessageType::Error, content));
    }

    pub fn get_all_messages(&self) -> Vec<StatusMessage> {
        self.messages.iter().cloned().collect()
    }

    pub fn size(&self) -> usize {
        self.messages.len()
    }
}

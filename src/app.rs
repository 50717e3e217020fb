use async_trait::async_trait;
use crossterm::event::KeyEvent;
use tokio::sync::mpsc;

use crate::chat::{Message, Messenger, Room, SlashCommand, User};
use crate::error::ChatError;

/// Everything the UI loop reacts to.
pub enum AppEvent {
    Tick,
    Key(KeyEvent),
    /// Private notice for the local user.
    Notice(Message),
    /// Message posted to the room.
    RoomMessage(Message),
    /// A command task finished, successfully or not.
    CommandDone(Option<String>),
    Error(String),
}

/// [`Messenger`] that hands deliveries to the UI loop.
#[derive(Clone)]
pub struct TerminalMessenger {
    tx: mpsc::Sender<AppEvent>,
}

impl TerminalMessenger {
    pub fn new(tx: mpsc::Sender<AppEvent>) -> Self {
        Self { tx }
    }
}

#[async_trait]
impl Messenger for TerminalMessenger {
    async fn notify_user(&self, _user: &User, message: Message) -> Result<(), ChatError> {
        self.tx
            .send(AppEvent::Notice(message))
            .await
            .map_err(|_| ChatError::Closed)
    }

    async fn send(&self, message: Message) -> Result<(), ChatError> {
        self.tx
            .send(AppEvent::RoomMessage(message))
            .await
            .map_err(|_| ChatError::Closed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// Visible to the whole room.
    Message,
    /// Visible only to the local user.
    Notice,
    /// Host output such as help text.
    System,
    Error,
}

/// One line group in the room log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomEntry {
    pub kind: EntryKind,
    pub author: String,
    pub text: String,
}

/// Terminal chat room state.
pub struct App {
    pub user: User,
    pub room: Room,
    /// Room log, oldest first.
    pub entries: Vec<RoomEntry>,
    /// Current input line.
    pub input: String,
    /// Previously submitted lines, oldest first.
    pub history: Vec<String>,
    history_index: Option<usize>,
    /// Lines scrolled up from the bottom of the log.
    pub scroll: u16,
    /// Command tasks still running.
    pub pending: usize,
    pub error: Option<String>,
}

impl App {
    pub fn new(user: User, room: Room) -> Self {
        Self {
            user,
            room,
            entries: Vec::new(),
            input: String::new(),
            history: Vec::new(),
            history_index: None,
            scroll: 0,
            pending: 0,
            error: None,
        }
    }

    /// Takes the current input line, recording it in the history.
    pub fn submit(&mut self) -> Option<String> {
        let line = std::mem::take(&mut self.input);
        self.history_index = None;
        self.error = None;
        let line = line.trim().to_string();
        if line.is_empty() {
            return None;
        }
        if self.history.last() != Some(&line) {
            self.history.push(line.clone());
        }
        Some(line)
    }

    pub fn history_previous(&mut self) {
        if self.history.is_empty() {
            return;
        }
        let index = match self.history_index {
            Some(i) => i.saturating_sub(1),
            None => self.history.len() - 1,
        };
        self.history_index = Some(index);
        self.input = self.history[index].clone();
    }

    pub fn history_next(&mut self) {
        match self.history_index {
            Some(i) if i + 1 < self.history.len() => {
                self.history_index = Some(i + 1);
                self.input = self.history[i + 1].clone();
            }
            Some(_) => {
                self.history_index = None;
                self.input.clear();
            }
            None => {}
        }
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.scroll = self.scroll.saturating_add(lines);
    }

    pub fn scroll_down(&mut self, lines: u16) {
        self.scroll = self.scroll.saturating_sub(lines);
    }

    /// Appends a room message, rendering attachments as `[title] url`.
    pub fn push_message(&mut self, message: Message) {
        let mut lines: Vec<String> = message.text.into_iter().collect();
        lines.extend(
            message
                .attachments
                .iter()
                .map(|a| format!("[{}] {}", a.title, a.image_url)),
        );
        self.push(EntryKind::Message, message.sender.username, lines.join("\n"));
    }

    pub fn push_notice(&mut self, message: Message) {
        let text = message.text.unwrap_or_default();
        self.push(EntryKind::Notice, "only you".to_string(), text);
    }

    pub fn push_system(&mut self, text: impl Into<String>) {
        self.push(EntryKind::System, "system".to_string(), text.into());
    }

    pub fn push_error(&mut self, text: impl Into<String>) {
        let text = text.into();
        self.error = Some(text.clone());
        self.push(EntryKind::Error, "error".to_string(), text);
    }

    /// Help text listing every registered command.
    pub fn help_text(commands: &[std::sync::Arc<dyn SlashCommand>]) -> String {
        let mut text = String::from("Available commands:\n");
        for command in commands {
            let example = command.params_example();
            if example.is_empty() {
                text.push_str(&format!("/{} - {}\n", command.command(), command.description()));
            } else {
                text.push_str(&format!(
                    "/{} {} - {}\n",
                    command.command(),
                    example,
                    command.description()
                ));
            }
        }
        text.push_str("/help - Show this list\n/quit - Leave the room");
        text
    }

    pub fn status_line(&self) -> String {
        if self.pending > 0 {
            format!("#{} | {} | running {} command(s)...", self.room.name, self.user.username, self.pending)
        } else {
            format!("#{} | {}", self.room.name, self.user.username)
        }
    }

    fn push(&mut self, kind: EntryKind, author: String, text: String) {
        self.entries.push(RoomEntry { kind, author, text });
        self.scroll = 0;
    }
}

//! Host-facing chat types and the seams a chat platform implements.

use async_trait::async_trait;
use serde::Serialize;

use crate::error::ChatError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: String,
    pub username: String,
}

impl User {
    pub fn new(id: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            username: username.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Room {
    pub id: String,
    pub name: String,
}

impl Room {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// An image attached to a room message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attachment {
    pub title: String,
    pub image_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    pub sender: User,
    pub room: Room,
    pub text: Option<String>,
    pub attachments: Vec<Attachment>,
}

impl Message {
    /// Starts an empty message from `sender` in `room`.
    pub fn start(sender: &User, room: &Room) -> Self {
        Self {
            sender: sender.clone(),
            room: room.clone(),
            text: None,
            attachments: Vec::new(),
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }
}

/// Everything a command executor gets to know about one invocation.
#[derive(Debug, Clone)]
pub struct CommandContext {
    pub sender: User,
    pub room: Room,
    /// Raw whitespace-delimited tokens following the command name.
    pub arguments: Vec<String>,
}

/// Delivery side of the chat platform.
#[async_trait]
pub trait Messenger: Send + Sync {
    /// Shows `message` to `user` only.
    async fn notify_user(&self, user: &User, message: Message) -> Result<(), ChatError>;

    /// Posts `message` to its room.
    async fn send(&self, message: Message) -> Result<(), ChatError>;
}

/// A slash command that can be registered with the host.
#[async_trait]
pub trait SlashCommand: Send + Sync {
    /// Command name without the leading slash.
    fn command(&self) -> &'static str;

    fn description(&self) -> &'static str;

    fn params_example(&self) -> &'static str {
        ""
    }

    /// Runs one invocation. User-facing failures are reported through
    /// `messenger`; an `Err` means delivery itself failed.
    async fn execute(&self, context: CommandContext, messenger: &dyn Messenger)
    -> anyhow::Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_builder_collects_text_and_attachments() {
        let sender = User::new("u1", "alice");
        let room = Room::new("r1", "general");
        let message = Message::start(&sender, &room)
            .with_text("hello")
            .with_attachment(Attachment {
                title: "Drake".to_string(),
                image_url: "https://img/x.jpg".to_string(),
            });

        assert_eq!(message.sender, sender);
        assert_eq!(message.room, room);
        assert_eq!(message.text.as_deref(), Some("hello"));
        assert_eq!(message.attachments.len(), 1);
    }

    #[test]
    fn message_serializes_for_host_payloads() {
        let message = Message::start(&User::new("u1", "alice"), &Room::new("r1", "general"))
            .with_attachment(Attachment {
                title: "Doge".to_string(),
                image_url: "https://img/d.jpg".to_string(),
            });
        let json = serde_json::to_value(&message).expect("serializable");
        assert_eq!(json["attachments"][0]["image_url"], "https://img/d.jpg");
        assert_eq!(json["text"], serde_json::Value::Null);
    }
}

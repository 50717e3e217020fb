//! Scripted fakes for the host seams, shared by the unit tests.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use crate::api::{HttpClient, HttpResponse};
use crate::chat::{Message, Messenger, Room, User};
use crate::error::ChatError;

/// Replays queued responses in order and records every requested URL.
#[derive(Default)]
pub struct FakeHttp {
    responses: Mutex<VecDeque<(Result<HttpResponse, String>, Option<Duration>)>>,
    requests: Mutex<Vec<String>>,
    delay: Option<Duration>,
}

impl FakeHttp {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, status: u16, body: Value) -> Self {
        self.push(Ok(HttpResponse {
            status,
            body: Some(body),
        }))
    }

    pub fn respond_without_body(self, status: u16) -> Self {
        self.push(Ok(HttpResponse { status, body: None }))
    }

    pub fn fail(self, reason: &str) -> Self {
        self.push(Err(reason.to_string()))
    }

    /// Queues a response that is held back for `delay` before answering.
    pub fn respond_after(self, delay: Duration, status: u16, body: Value) -> Self {
        let response = Ok(HttpResponse {
            status,
            body: Some(body),
        });
        self.responses.lock().push_back((response, Some(delay)));
        self
    }

    /// Holds every response back for `delay` before answering.
    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn into_arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().len()
    }

    fn push(self, response: Result<HttpResponse, String>) -> Self {
        self.responses.lock().push_back((response, None));
        self
    }
}

#[async_trait]
impl HttpClient for FakeHttp {
    async fn get(&self, url: &str) -> Result<HttpResponse, String> {
        self.requests.lock().push(url.to_string());
        let (response, delay) = self
            .responses
            .lock()
            .pop_front()
            .unwrap_or_else(|| (Err(format!("no scripted response for {url}")), None));
        if let Some(delay) = delay.or(self.delay) {
            tokio::time::sleep(delay).await;
        }
        response
    }
}

/// A single delivery observed by [`RecordingMessenger`].
#[derive(Debug, Clone)]
pub enum Delivery {
    Notice { to: User, message: Message },
    Room(Message),
}

/// Collects everything the commands try to send.
#[derive(Default)]
pub struct RecordingMessenger {
    deliveries: Mutex<Vec<Delivery>>,
}

impl RecordingMessenger {
    pub fn deliveries(&self) -> Vec<Delivery> {
        self.deliveries.lock().clone()
    }

    /// Texts of all private notices, in order.
    pub fn notices(&self) -> Vec<String> {
        self.deliveries
            .lock()
            .iter()
            .filter_map(|d| match d {
                Delivery::Notice { message, .. } => message.text.clone(),
                Delivery::Room(_) => None,
            })
            .collect()
    }

    pub fn room_messages(&self) -> Vec<Message> {
        self.deliveries
            .lock()
            .iter()
            .filter_map(|d| match d {
                Delivery::Room(message) => Some(message.clone()),
                Delivery::Notice { .. } => None,
            })
            .collect()
    }
}

#[async_trait]
impl Messenger for RecordingMessenger {
    async fn notify_user(&self, user: &User, message: Message) -> Result<(), ChatError> {
        self.deliveries.lock().push(Delivery::Notice {
            to: user.clone(),
            message,
        });
        Ok(())
    }

    async fn send(&self, message: Message) -> Result<(), ChatError> {
        self.deliveries.lock().push(Delivery::Room(message));
        Ok(())
    }
}

pub fn alice() -> User {
    User::new("u1", "alice")
}

pub fn general() -> Room {
    Room::new("r1", "general")
}

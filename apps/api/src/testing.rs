//! Test doubles shared by unit tests across modules.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::llm_client::{LlmError, TextCompletion};
use crate::models::Profile;
use crate::notify::{DeliveryError, NotificationChannel};

/// A registered participant with the given skills and a unique contact address.
pub fn participant(name: &str, skills: &[&str]) -> Profile {
    let id = Uuid::new_v4();
    Profile {
        id,
        display_name: name.to_string(),
        contact_address: format!("{}-{}@example.com", name.to_lowercase(), id.simple()),
        job_title: Some("Engineer".to_string()),
        skills: skills.iter().map(|s| s.to_string()).collect(),
        resume_processed: false,
        last_processed_at: None,
        created_at: Utc::now(),
    }
}

/// Replies with a fixed text and records every prompt and credential it sees.
#[derive(Default)]
pub struct ScriptedCompletion {
    reply: String,
    prompts: Mutex<Vec<String>>,
    credentials: Mutex<Vec<String>>,
}

impl ScriptedCompletion {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            ..Self::default()
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn credentials(&self) -> Vec<String> {
        self.credentials.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl TextCompletion for ScriptedCompletion {
    async fn complete(&self, prompt: &str, credential: &str) -> Result<String, LlmError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.credentials.lock().unwrap().push(credential.to_string());
        Ok(self.reply.clone())
    }
}

/// Always fails, as a rate-limited or unreachable service would.
pub struct FailingCompletion;

#[async_trait]
impl TextCompletion for FailingCompletion {
    async fn complete(&self, _prompt: &str, _credential: &str) -> Result<String, LlmError> {
        Err(LlmError::Api {
            status: 429,
            message: "rate limited".to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SentMessage {
    pub address: String,
    pub subject: String,
    pub body: String,
}

/// Records every delivery attempt; optionally rejects them all.
#[derive(Default)]
pub struct RecordingChannel {
    fail: bool,
    sent: Mutex<Vec<SentMessage>>,
}

impl RecordingChannel {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationChannel for RecordingChannel {
    async fn send(&self, address: &str, subject: &str, body: &str) -> Result<(), DeliveryError> {
        self.sent.lock().unwrap().push(SentMessage {
            address: address.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
        });
        if self.fail {
            return Err(DeliveryError::Rejected("mailbox unavailable".to_string()));
        }
        Ok(())
    }
}

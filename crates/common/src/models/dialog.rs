//! Dialog and message entities

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Dialog {
    pub id: Uuid,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One turn of a dialog; any combination of text, audio and images
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub dialog_id: Uuid,
    pub text: Option<String>,
    pub image_keys: Vec<String>,
    pub audio_key: Option<String>,
    pub audio_transcription: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Default)]
pub struct NewMessage {
    pub text: Option<String>,
    pub image_keys: Vec<String>,
    pub audio_key: Option<String>,
    pub audio_transcription: Option<String>,
}

impl NewMessage {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_none() && self.image_keys.is_empty() && self.audio_key.is_none()
    }
}

#[derive(Clone, Debug, Default)]
pub struct MessageUpdate {
    pub text: Option<String>,
    pub audio_transcription: Option<String>,
}

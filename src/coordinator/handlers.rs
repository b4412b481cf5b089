//! Request handling for the two public routes
//!
//! Handlers take plain request values and return a [`Reply`]; the HTTP layer
//! in [`crate::coordinator::http`] only adapts extractors and responses.

use crate::common::{now_local, validate_text, Error};
use crate::coordinator::page::render_listing;
use crate::coordinator::store::MessageStore;
use tracing::{debug, error, info};

/// Body returned for an accepted submission
pub const RECEIVED_OK: &str = "Data received successfully";

/// A submission as seen by the coordinator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitRequest {
    /// Form field `text`, absent when the caller did not send it
    pub text: Option<String>,
    /// Peer address bound by the transport
    pub source_address: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    Text,
    Html,
}

impl ContentType {
    pub fn mime(&self) -> &'static str {
        match self {
            ContentType::Text => "text/plain; charset=utf-8",
            ContentType::Html => "text/html; charset=utf-8",
        }
    }
}

/// Status and body produced by a handler
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub status: u16,
    pub content_type: ContentType,
    pub body: String,
}

impl Reply {
    pub fn text(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            content_type: ContentType::Text,
            body: body.into(),
        }
    }

    pub fn html(body: String) -> Self {
        Self {
            status: 200,
            content_type: ContentType::Html,
            body,
        }
    }

    /// Client-correctable errors keep their message; everything else is generic.
    pub fn from_error(err: &Error) -> Self {
        Self::text(err.to_http_status().as_u16(), err.public_message())
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// POST `/`: validate and record one submission.
pub async fn receive_text(store: &MessageStore, request: SubmitRequest) -> Reply {
    let text = match validate_text(request.text.as_deref().unwrap_or_default()) {
        Ok(text) => text,
        Err(e) => {
            debug!(source = %request.source_address, "Rejected submission: {}", e);
            return Reply::from_error(&e);
        }
    };

    match store
        .insert(text, &request.source_address, Some(now_local()))
        .await
    {
        Ok(()) => {
            info!("Received text: {} from IP: {}", text, request.source_address);
            Reply::text(200, RECEIVED_OK)
        }
        Err(e) => {
            error!(error = %e, "Error processing request");
            Reply::from_error(&e)
        }
    }
}

/// GET `/`: render every recorded submission, newest first.
pub async fn display_text(store: &MessageStore) -> Reply {
    match store.list_all().await {
        Ok(messages) => Reply::html(render_listing(&messages)),
        Err(e) => {
            error!(error = %e, "Error retrieving messages");
            Reply::from_error(&e)
        }
    }
}

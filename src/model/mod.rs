//! Records handed back to callers of a search.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::duration::format_duration;

/// A single video in a result set. Immutable once built; the two duration
/// representations are always derived from the same value.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MediaItem {
    pub id: String,
    pub title: String,
    pub channel_title: String,
    pub channel_id: String,
    pub description: String,
    pub thumbnail_url: String,
    pub view_count: u64,

    /// Attributed from the owning channel.
    pub subscriber_count: u64,

    pub published_at: DateTime<Utc>,

    duration_seconds: u64,
    duration_display: String,
}

impl MediaItem {
    pub fn new(
        id: impl Into<String>,
        channel_id: impl Into<String>,
        published_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            title: String::new(),
            channel_title: String::new(),
            channel_id: channel_id.into(),
            description: String::new(),
            thumbnail_url: String::new(),
            view_count: 0,
            subscriber_count: 0,
            published_at,
            duration_seconds: 0,
            duration_display: format_duration(0),
        }
    }

    pub fn with_duration(mut self, seconds: u64) -> Self {
        self.duration_seconds = seconds;
        self.duration_display = format_duration(seconds);
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_views(mut self, view_count: u64) -> Self {
        self.view_count = view_count;
        self
    }

    pub fn with_subscribers(mut self, subscriber_count: u64) -> Self {
        self.subscriber_count = subscriber_count;
        self
    }

    pub fn duration_seconds(&self) -> u64 {
        self.duration_seconds
    }

    pub fn duration_display(&self) -> &str {
        &self.duration_display
    }

    /// Watch page for this video.
    pub fn url(&self) -> String {
        format!("https://www.youtube.com/watch?v={}", self.id)
    }
}

/// A channel, with the statistics needed to judge it at a glance.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChannelSummary {
    pub id: String,
    pub title: String,
    pub description: String,
    pub thumbnail_url: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_url: Option<String>,

    pub subscriber_count: u64,
    pub view_count: u64,
    pub video_count: u64,
    pub published_at: DateTime<Utc>,
}

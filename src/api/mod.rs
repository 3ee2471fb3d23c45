//! YouTube Data API v3 wire format and request construction.
//!
//! At present, only the fields tubesift reads are translated. Every
//! request carries the API key as a query parameter; [redact] strips it
//! back out before a URI is logged.

use chrono::{DateTime, Utc};
use log::warn;
use serde::{de::DeserializeOwned, Deserialize};

use crate::{
    filter::FilterCriteria, model::ChannelSummary, query::ChannelRef, transport::Reply, Config,
    Error, Stage,
};

/// Page size of a keyword channel search.
pub const CHANNEL_SEARCH_RESULTS: u32 = 10;

#[derive(Deserialize, Clone, Debug)]
/// Envelope shared by every `list` endpoint.
pub struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
}

#[derive(Deserialize, Clone, Debug)]
/// One hit from `search.list`. Only one of the IDs is set, depending on `type`.
pub struct SearchResult {
    pub id: ResourceId,
    pub snippet: SearchSnippet,
}

#[derive(Deserialize, Clone, Debug, Default)]
pub struct ResourceId {
    #[serde(rename = "videoId")]
    pub video_id: Option<String>,

    #[serde(rename = "channelId")]
    pub channel_id: Option<String>,
}

#[derive(Deserialize, Clone, Debug)]
pub struct SearchSnippet {
    #[serde(rename = "channelId")]
    pub channel_id: String,

    #[serde(default)]
    pub title: String,

    #[serde(rename = "channelTitle", default)]
    pub channel_title: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub thumbnails: Thumbnails,

    #[serde(rename = "publishedAt")]
    pub published_at: DateTime<Utc>,
}

#[derive(Deserialize, Clone, Debug, Default)]
/// The renditions tubesift cares about; the API offers several more.
pub struct Thumbnails {
    pub high: Option<Thumbnail>,
    pub default: Option<Thumbnail>,
}

impl Thumbnails {
    /// `high` if present, then `default`, then nothing.
    pub fn best_url(&self) -> String {
        self.high
            .as_ref()
            .or_else(|| self.default.as_ref())
            .map(|t| t.url.clone())
            .unwrap_or_default()
    }
}

#[derive(Deserialize, Clone, Debug)]
pub struct Thumbnail {
    pub url: String,
}

#[derive(Deserialize, Clone, Debug)]
/// One entry of `videos.list?part=contentDetails,statistics`.
pub struct VideoResource {
    pub id: String,

    #[serde(rename = "contentDetails", default)]
    pub content_details: ContentDetails,

    #[serde(default)]
    pub statistics: VideoStatistics,
}

#[derive(Deserialize, Clone, Debug, Default)]
pub struct ContentDetails {
    #[serde(default, deserialize_with = "crate::serde::duration::from_iso8601")]
    pub duration: u64,
}

#[derive(Deserialize, Clone, Debug, Default)]
pub struct VideoStatistics {
    #[serde(
        rename = "viewCount",
        default,
        deserialize_with = "crate::serde::count::from_str_or_int"
    )]
    pub view_count: u64,
}

#[derive(Deserialize, Clone, Debug)]
/// One entry of `channels.list`. `snippet` is only present when requested.
pub struct ChannelResource {
    pub id: String,

    pub snippet: Option<ChannelSnippet>,

    #[serde(default)]
    pub statistics: ChannelStatistics,
}

#[derive(Deserialize, Clone, Debug)]
pub struct ChannelSnippet {
    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub description: String,

    #[serde(rename = "customUrl")]
    pub custom_url: Option<String>,

    #[serde(default)]
    pub thumbnails: Thumbnails,

    #[serde(rename = "publishedAt")]
    pub published_at: DateTime<Utc>,
}

#[derive(Deserialize, Clone, Debug, Default)]
pub struct ChannelStatistics {
    #[serde(
        rename = "subscriberCount",
        default,
        deserialize_with = "crate::serde::count::from_str_or_int"
    )]
    pub subscriber_count: u64,

    #[serde(
        rename = "viewCount",
        default,
        deserialize_with = "crate::serde::count::from_str_or_int"
    )]
    pub view_count: u64,

    #[serde(
        rename = "videoCount",
        default,
        deserialize_with = "crate::serde::count::from_str_or_int"
    )]
    pub video_count: u64,
}

impl ChannelResource {
    /// [None] if the response was requested without a snippet.
    pub fn into_summary(self) -> Option<ChannelSummary> {
        let snippet = self.snippet?;
        Some(ChannelSummary {
            id: self.id,
            title: snippet.title,
            description: snippet.description,
            thumbnail_url: snippet.thumbnails.best_url(),
            custom_url: snippet.custom_url,
            subscriber_count: self.statistics.subscriber_count,
            view_count: self.statistics.view_count,
            video_count: self.statistics.video_count,
            published_at: snippet.published_at,
        })
    }
}

#[derive(Deserialize, Clone, Debug)]
/// Body of a failed request.
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize, Clone, Debug)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

/// Builds request URIs against one [Config] and API key.
pub struct Requests<'a> {
    config: &'a Config,
    key: &'a str,
}

impl<'a> Requests<'a> {
    pub fn new(config: &'a Config, key: &'a str) -> Self {
        Self { config, key }
    }

    fn uri(&self, resource: &str, mut params: Vec<(&str, String)>) -> Result<String, Error> {
        params.push(("key", self.key.to_string()));
        let query = serde_urlencoded::to_string(&params)
            .map_err(|e| Error::InvalidArgument(e.to_string()))?;
        Ok(format!("{}/{}?{}", self.config.base_url, resource, query))
    }

    fn locale(&self) -> [(&'static str, String); 2] {
        [
            ("regionCode", self.config.region_code.clone()),
            ("relevanceLanguage", self.config.relevance_language.clone()),
        ]
    }

    /// `search.list` for videos, scoped to a channel when the criteria say so.
    pub fn search_videos(&self, criteria: &FilterCriteria) -> Result<String, Error> {
        let mut params = vec![
            ("part", "snippet".to_string()),
            ("type", "video".to_string()),
            ("maxResults", criteria.result_limit().to_string()),
            ("order", criteria.sort_key.as_param().to_string()),
        ];
        params.extend(self.locale().iter().cloned());
        if let Some(channel_id) = criteria.scope() {
            params.push(("channelId", channel_id.to_string()));
        }
        if let Some(q) = criteria.query() {
            params.push(("q", q.to_string()));
        }
        if let Some(length) = criteria.length_class.as_param() {
            params.push(("videoDuration", length.to_string()));
        }
        self.uri("search", params)
    }

    /// `videos.list` for durations and view counts.
    pub fn video_details(&self, ids: &[String]) -> Result<String, Error> {
        self.uri(
            "videos",
            vec![
                ("part", "contentDetails,statistics".to_string()),
                ("id", ids.join(",")),
            ],
        )
    }

    /// `channels.list` for statistics only.
    pub fn channel_stats(&self, ids: &[String]) -> Result<String, Error> {
        self.uri(
            "channels",
            vec![("part", "statistics".to_string()), ("id", ids.join(","))],
        )
    }

    /// `channels.list` for one channel, with everything a [ChannelSummary] needs.
    pub fn channel_lookup(&self, channel: &ChannelRef) -> Result<String, Error> {
        let selector = match channel {
            ChannelRef::Id(id) => ("id", id.clone()),
            ChannelRef::Handle(handle) => ("forHandle", format!("@{}", handle)),
            ChannelRef::Username(name) => ("forUsername", name.clone()),
        };
        self.uri(
            "channels",
            vec![
                ("part", "snippet,statistics,brandingSettings".to_string()),
                selector,
            ],
        )
    }

    /// `search.list` for channels matching a keyword.
    pub fn search_channels(&self, keyword: &str) -> Result<String, Error> {
        let mut params = vec![
            ("part", "snippet".to_string()),
            ("q", keyword.to_string()),
            ("type", "channel".to_string()),
            ("maxResults", CHANNEL_SEARCH_RESULTS.to_string()),
        ];
        params.extend(self.locale().iter().cloned());
        self.uri("search", params)
    }
}

/// `uri` with the API key replaced, for logging.
pub fn redact(uri: &str, key: &str) -> String {
    if key.is_empty() {
        return uri.to_string();
    }
    uri.replace(key, "REDACTED")
}

/// Turn a [Reply] into `T`, or into the error it represents.
pub fn decode<T: DeserializeOwned>(reply: Reply, stage: Stage) -> Result<T, Error> {
    if !reply.is_success() {
        let reason = serde_json::from_slice::<ErrorEnvelope>(&reply.body)
            .map(|env| env.error.message)
            .unwrap_or_default();
        return Err(Error::Upstream {
            stage,
            status: Some(reply.status),
            reason,
        });
    }

    if let Some(content_type) = &reply.content_type {
        match content_type.parse::<mime::Mime>() {
            Ok(m) if m.subtype() == mime::JSON || m.suffix() == Some(mime::JSON) => {}
            Ok(m) => {
                return Err(Error::Decode {
                    stage,
                    reason: format!("expected JSON, got {}", m),
                })
            }
            Err(e) => warn!("{}: unparseable content type {:?}: {}", stage, content_type, e),
        }
    }

    serde_json::from_slice(&reply.body).map_err(|e| Error::Decode {
        stage,
        reason: e.to_string(),
    })
}

//! Search criteria and the client-side pass that enforces them.
//!
//! Ordering is the platform's business: [filter_and_rank] only ever drops
//! items, and keeps the survivors in the order they arrived.

use std::{fmt, str::FromStr};

use serde::Serialize;

use crate::{duration::SHORT_VIDEO_SECS, model::MediaItem, Error};

/// Largest page the search endpoint will return.
pub const MAX_RESULTS: u32 = 50;

/// View floor the command line applies unless told otherwise.
pub const DEFAULT_MIN_VIEWS: u64 = 100_000;

/// Order requested from the platform.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum SortKey {
    UploadDate,
    ViewCount,
    Rating,
    Relevance,
}

impl SortKey {
    /// Value of the search endpoint's `order` parameter.
    pub fn as_param(self) -> &'static str {
        match self {
            Self::UploadDate => "date",
            Self::ViewCount => "viewCount",
            Self::Rating => "rating",
            Self::Relevance => "relevance",
        }
    }
}

impl Default for SortKey {
    fn default() -> Self {
        Self::UploadDate
    }
}

impl FromStr for SortKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "date" | "uploadDate" | "upload_date" => Ok(Self::UploadDate),
            "viewCount" | "views" | "view_count" => Ok(Self::ViewCount),
            "rating" => Ok(Self::Rating),
            "relevance" => Ok(Self::Relevance),
            other => Err(Error::InvalidArgument(format!("unknown sort key `{}`", other))),
        }
    }
}

/// Video length class.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum LengthClass {
    Any,
    /// Under four minutes.
    Short,
    /// Only hinted to the platform; not checked locally.
    Medium,
    /// Four minutes or more.
    Long,
}

impl LengthClass {
    /// Value of the search endpoint's `videoDuration` parameter, if any.
    pub fn as_param(self) -> Option<&'static str> {
        match self {
            Self::Any => None,
            Self::Short => Some("short"),
            Self::Medium => Some("medium"),
            Self::Long => Some("long"),
        }
    }

    pub fn admits(self, duration_seconds: u64) -> bool {
        match self {
            Self::Short => duration_seconds < SHORT_VIDEO_SECS,
            Self::Long => duration_seconds >= SHORT_VIDEO_SECS,
            Self::Any | Self::Medium => true,
        }
    }
}

impl Default for LengthClass {
    fn default() -> Self {
        Self::Any
    }
}

impl FromStr for LengthClass {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "any" | "all" => Ok(Self::Any),
            "short" => Ok(Self::Short),
            "medium" => Ok(Self::Medium),
            "long" => Ok(Self::Long),
            other => Err(Error::InvalidArgument(format!("unknown video length `{}`", other))),
        }
    }
}

/// What the user asked for. Built with the `with_*` methods; the result
/// limit is clamped to `1..=`[MAX_RESULTS].
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FilterCriteria {
    pub keyword: String,
    pub min_views: Option<u64>,
    pub max_subscribers: Option<u64>,
    pub sort_key: SortKey,
    pub length_class: LengthClass,
    result_limit: u32,
    pub channel_scope: Option<String>,
}

impl Default for FilterCriteria {
    fn default() -> Self {
        Self {
            keyword: String::new(),
            min_views: None,
            max_subscribers: None,
            sort_key: SortKey::default(),
            length_class: LengthClass::default(),
            result_limit: MAX_RESULTS,
            channel_scope: None,
        }
    }
}

impl FilterCriteria {
    pub fn new(keyword: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            ..Self::default()
        }
    }

    pub fn with_min_views(mut self, min_views: Option<u64>) -> Self {
        self.min_views = min_views;
        self
    }

    pub fn with_max_subscribers(mut self, max_subscribers: Option<u64>) -> Self {
        self.max_subscribers = max_subscribers;
        self
    }

    pub fn with_sort(mut self, sort_key: SortKey) -> Self {
        self.sort_key = sort_key;
        self
    }

    pub fn with_length(mut self, length_class: LengthClass) -> Self {
        self.length_class = length_class;
        self
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.result_limit = limit.max(1).min(MAX_RESULTS);
        self
    }

    pub fn with_channel_scope(mut self, channel_id: Option<String>) -> Self {
        self.channel_scope = channel_id.filter(|id| !id.trim().is_empty());
        self
    }

    pub fn result_limit(&self) -> u32 {
        self.result_limit
    }

    /// The keyword, if it is not blank.
    pub fn query(&self) -> Option<&str> {
        let keyword = self.keyword.trim();
        if keyword.is_empty() {
            None
        } else {
            Some(keyword)
        }
    }

    /// The channel scope, if it is not blank.
    pub fn scope(&self) -> Option<&str> {
        self.channel_scope
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }

    /// Fails with [Error::EmptyQuery] if there is nothing to search for.
    pub fn validate(&self) -> Result<(), Error> {
        if self.query().is_none() && self.scope().is_none() {
            return Err(Error::EmptyQuery);
        }
        Ok(())
    }

    /// Whether `item` passes every active predicate.
    pub fn admits(&self, item: &MediaItem) -> bool {
        if let Some(min) = self.min_views {
            if item.view_count < min {
                return false;
            }
        }
        if let Some(max) = self.max_subscribers {
            if item.subscriber_count > max {
                return false;
            }
        }
        if let Some(scope) = self.scope() {
            if item.channel_id != scope {
                return false;
            }
        }
        self.length_class.admits(item.duration_seconds())
    }
}

impl fmt::Display for FilterCriteria {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.keyword)?;
        if let Some(scope) = self.scope() {
            write!(f, " in {}", scope)?;
        }
        write!(
            f,
            " (order={}, limit={}",
            self.sort_key.as_param(),
            self.result_limit
        )?;
        if let Some(min) = self.min_views {
            write!(f, ", views>={}", min)?;
        }
        if let Some(max) = self.max_subscribers {
            write!(f, ", subscribers<={}", max)?;
        }
        if let Some(length) = self.length_class.as_param() {
            write!(f, ", length={}", length)?;
        }
        write!(f, ")")
    }
}

/// Keep the items that satisfy `criteria`, in their original order.
pub fn filter_and_rank(items: Vec<MediaItem>, criteria: &FilterCriteria) -> Vec<MediaItem> {
    items.into_iter().filter(|item| criteria.admits(item)).collect()
}

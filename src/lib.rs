//! # tubesift
//!
//! An async library for searching YouTube by keyword or by channel, then
//! narrowing the results by view count, subscriber count and length.
//!
//! ## Features
//!
//! Searches go through the YouTube Data API v3. Every page of results is
//! hydrated with video durations, view counts and channel subscriber
//! counts, then filtered client-side with a [FilterCriteria].
//!
//! By default, requests are made with [hyper](https://hyper.rs/) via
//! [HyperTransport]. To use something else, implement [Transport].
//!
//! ## Example
//!
//! ```
//! use tubesift::{Config, FilterCriteria, LengthClass, Searcher};
//!
//! let searcher = Searcher::from_config(Config::from_env());
//! let criteria = FilterCriteria::new("rust async")
//!     .with_min_views(Some(100_000))
//!     .with_length(LengthClass::Long)
//!     .with_limit(25);
//!
//! for video in searcher.search(&criteria).await? {
//!     println!("{} [{}] {}", video.title, video.duration_display(), video.url());
//! }
//! ```

use std::{
    error,
    fmt::{self, Display, Formatter},
};

pub mod api;
pub mod config;
pub mod duration;
pub mod filter;
pub mod format;
pub mod model;
pub mod query;
pub mod search;
pub mod serde;
pub mod session;
pub mod transport;

pub use config::Config;
pub use filter::{filter_and_rank, FilterCriteria, LengthClass, SortKey};
pub use model::{ChannelSummary, MediaItem};
pub use query::{extract_channel_id, ChannelRef};
pub use search::{Hydration, Searcher};
pub use transport::{HyperTransport, Reply, Transport};

/// Which call to the platform an error came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Search,
    VideoDetails,
    ChannelStats,
    ChannelSearch,
    ChannelLookup,
}

impl Display for Stage {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Search => "search request",
            Self::VideoDetails => "video detail request",
            Self::ChannelStats => "channel statistics request",
            Self::ChannelSearch => "channel search request",
            Self::ChannelLookup => "channel lookup request",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// No API key. Raised before anything touches the network.
    Configuration(String),

    /// Neither a keyword nor a channel to search in.
    EmptyQuery,

    /// The platform answered with a non-success status, or could not be
    /// reached at all (`status` is [None]).
    Upstream {
        stage: Stage,
        status: Option<u16>,
        reason: String,
    },

    /// The platform answered, but not with anything we can read.
    Decode { stage: Stage, reason: String },

    /// Malformed user input, such as an unknown sort key.
    InvalidArgument(String),
}

impl error::Error for Error {}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration(what) => write!(f, "configuration error: {}", what),
            Self::EmptyQuery => write!(f, "enter a search keyword or choose a channel"),
            Self::Upstream {
                stage,
                status: Some(status),
                reason,
            } if reason.is_empty() => write!(f, "{} failed: HTTP {}", stage, status),
            Self::Upstream {
                stage,
                status: Some(status),
                reason,
            } => write!(f, "{} failed: HTTP {} ({})", stage, status, reason),
            Self::Upstream {
                stage,
                status: None,
                reason,
            } => write!(f, "{} failed: {}", stage, reason),
            Self::Decode { stage, reason } => {
                write!(f, "{} returned an unreadable response: {}", stage, reason)
            }
            Self::InvalidArgument(what) => write!(f, "invalid argument: {}", what),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

//! Queries resolved by tubesift.
//!
//! Handles parsing channel URLs, handles and raw IDs into a canonical channel
//! reference. Anything that is not recognizably a channel is a keyword.

use std::{fmt, str::FromStr};

use lazy_static::lazy_static;
use regex::Regex;

/// A channel, as named by the user. Which variant is produced depends on
/// the form of the input, and decides how the channel is looked up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelRef {
    /// `youtube.com/channel/<ID>` or a bare 24 character ID.
    Id(String),
    /// `youtube.com/@<NAME>`, `@<NAME>` or a `youtube.com/c/<NAME>` custom URL.
    Handle(String),
    /// Legacy `youtube.com/user/<NAME>` URLs.
    Username(String),
}

impl ChannelRef {
    /// The captured segment, without any knowledge of its kind.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Id(s) | Self::Handle(s) | Self::Username(s) => s,
        }
    }

    pub fn into_inner(self) -> String {
        match self {
            Self::Id(s) | Self::Handle(s) | Self::Username(s) => s,
        }
    }
}

impl fmt::Display for ChannelRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "{}", id),
            Self::Handle(h) => write!(f, "@{}", h),
            Self::Username(u) => write!(f, "user/{}", u),
        }
    }
}

/// Parse free-form input into a [ChannelRef]. Patterns are tried in order
/// and the first capture wins.
pub fn parse_channel_ref(input: &str) -> Option<ChannelRef> {
    lazy_static! {
        // First capture group is always the channel segment.
        static ref CHANNEL: Regex = Regex::new(r"youtube\.com/channel/([a-zA-Z0-9_-]+)").unwrap();
        static ref CUSTOM: Regex = Regex::new(r"youtube\.com/c/([a-zA-Z0-9_-]+)").unwrap();
        static ref HANDLE_URL: Regex = Regex::new(r"youtube\.com/@([a-zA-Z0-9_-]+)").unwrap();
        static ref USER: Regex = Regex::new(r"youtube\.com/user/([a-zA-Z0-9_-]+)").unwrap();
        static ref BARE_ID: Regex = Regex::new(r"^([a-zA-Z0-9_-]{24})$").unwrap();
        static ref BARE_HANDLE: Regex = Regex::new(r"^@([a-zA-Z0-9_-]+)$").unwrap();
    }

    let patterns: [(&Regex, fn(String) -> ChannelRef); 6] = [
        (&*CHANNEL, ChannelRef::Id),
        (&*CUSTOM, ChannelRef::Handle),
        (&*HANDLE_URL, ChannelRef::Handle),
        (&*USER, ChannelRef::Username),
        (&*BARE_ID, ChannelRef::Id),
        (&*BARE_HANDLE, ChannelRef::Handle),
    ];

    let input = input.trim();
    patterns.iter().find_map(|(pattern, kind)| {
        pattern
            .captures(input)
            .and_then(|c| c.get(1))
            .map(|m| kind(m.as_str().to_string()))
    })
}

/// Extract the channel segment from `input`, or [None] if the input should
/// be treated as a free-text keyword.
pub fn extract_channel_id(input: &str) -> Option<String> {
    parse_channel_ref(input).map(ChannelRef::into_inner)
}

/// What a line of user input asks to search for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Channel(ChannelRef),
    Keyword(String),
}

impl FromStr for Target {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return Err(crate::Error::EmptyQuery);
        }
        Ok(match parse_channel_ref(s) {
            Some(r) => Self::Channel(r),
            None => Self::Keyword(s.trim().to_string()),
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn canonical_forms() {
        assert_eq!(
            extract_channel_id("https://youtube.com/channel/UC123456789"),
            Some("UC123456789".to_string())
        );
        assert_eq!(
            extract_channel_id("https://youtube.com/@username"),
            Some("username".to_string())
        );
        assert_eq!(
            extract_channel_id("https://youtube.com/c/channelname"),
            Some("channelname".to_string())
        );
        assert_eq!(
            extract_channel_id("https://youtube.com/user/username"),
            Some("username".to_string())
        );
        assert_eq!(extract_channel_id("@username"), Some("username".to_string()));
    }

    #[test]
    fn scheme_is_optional() {
        assert_eq!(
            extract_channel_id("www.youtube.com/channel/UCabc_-9"),
            Some("UCabc_-9".to_string())
        );
        assert_eq!(
            extract_channel_id("http://m.youtube.com/@someone/videos"),
            Some("someone".to_string())
        );
    }

    #[test]
    fn bare_ids_must_be_24_chars() {
        let id = "UC_x5XG1OV2P6uZZ5FSM9Ttw";
        assert_eq!(id.len(), 24);
        assert_eq!(parse_channel_ref(id), Some(ChannelRef::Id(id.to_string())));
        assert_eq!(extract_channel_id("UC123456789"), None);
        assert_eq!(extract_channel_id("UC_x5XG1OV2P6uZZ5FSM9Ttwx"), None);
    }

    #[test]
    fn kinds() {
        assert_eq!(
            parse_channel_ref("https://www.youtube.com/user/legacy"),
            Some(ChannelRef::Username("legacy".to_string()))
        );
        assert_eq!(
            parse_channel_ref("@handle"),
            Some(ChannelRef::Handle("handle".to_string()))
        );
        assert_eq!(ChannelRef::Handle("handle".to_string()).to_string(), "@handle");
    }

    #[test]
    fn not_identifiers() {
        assert_eq!(extract_channel_id("https://google.com"), None);
        assert_eq!(extract_channel_id(""), None);
        assert_eq!(extract_channel_id("invalid-url"), None);
        assert_eq!(extract_channel_id("lofi hip hop"), None);
        assert_eq!(extract_channel_id("https://youtube.com/"), None);
    }

    #[test]
    fn targets() {
        assert_eq!(
            Target::from_str("  cooking shows "),
            Ok(Target::Keyword("cooking shows".to_string()))
        );
        assert_eq!(
            Target::from_str("@chef"),
            Ok(Target::Channel(ChannelRef::Handle("chef".to_string())))
        );
        assert!(Target::from_str("   ").is_err());
    }
}

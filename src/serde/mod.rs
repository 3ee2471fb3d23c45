//! Extensions to serde for deserializing the platform's loosely typed fields.
//!
//! The Data API reports durations as ISO-8601 intervals and every statistic
//! as a decimal string. These adapters turn both into plain integers and
//! fall back to zero rather than rejecting a whole page over one field.

use serde::{Deserialize, Deserializer};

pub mod duration {
    //! Extensions for parsing interval-notation durations into seconds.

    use super::*;

    /// `"PT4M13S"` to `253`. Missing, null and unparseable values are `0`.
    pub fn from_iso8601<'de, D>(deserializer: D) -> Result<u64, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s: Option<String> = Deserialize::deserialize(deserializer)?;
        Ok(s.map(|s| crate::duration::parse_duration(&s)).unwrap_or(0))
    }
}

pub mod count {
    //! Extensions for reading counts that may arrive as strings or numbers.

    use super::*;
    use std::fmt;

    use serde::de::{Error, Visitor};

    struct CountVisitor;

    impl<'de> Visitor<'de> for CountVisitor {
        type Value = u64;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            write!(formatter, "a non-negative count as a string or integer")
        }

        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
        where
            E: Error,
        {
            Ok(v)
        }

        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
        where
            E: Error,
        {
            Ok(if v < 0 { 0 } else { v as u64 })
        }

        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
        where
            E: Error,
        {
            Ok(v.trim().parse().unwrap_or(0))
        }

        fn visit_none<E>(self) -> Result<Self::Value, E>
        where
            E: Error,
        {
            Ok(0)
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: Error,
        {
            Ok(0)
        }

        fn visit_some<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
        where
            D: Deserializer<'de>,
        {
            deserializer.deserialize_any(CountVisitor)
        }
    }

    /// `"12345"` or `12345` to `12345`. Anything else is `0`.
    pub fn from_str_or_int<'de, D>(deserializer: D) -> Result<u64, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_option(CountVisitor)
    }
}

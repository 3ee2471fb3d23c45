//! State owned by whoever drives searches: the chosen channel, the current
//! criteria, and the most recent results.
//!
//! Searches may overlap. Each one is started with a [Ticket] and its
//! result is only kept if no newer search has started since.

use std::{
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};

use log::debug;
use tokio::time::sleep;

use crate::{
    filter::FilterCriteria,
    model::{ChannelSummary, MediaItem},
    Result,
};

/// Identifies one invocation among those issued by a [Sequencer].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Ticket(u64);

/// Hands out increasing [Tickets](Ticket) and remembers the newest.
#[derive(Debug, Default)]
pub struct Sequencer {
    latest: AtomicU64,
}

impl Sequencer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&self) -> Ticket {
        Ticket(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_latest(&self, ticket: Ticket) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket.0
    }
}

/// The result of the newest invocation to have finished, as long as it was
/// also the newest to start.
#[derive(Debug)]
pub struct Latest<T> {
    requests: Sequencer,
    value: Option<T>,
}

impl<T> Default for Latest<T> {
    fn default() -> Self {
        Self {
            requests: Sequencer::new(),
            value: None,
        }
    }
}

impl<T> Latest<T> {
    pub fn begin(&self) -> Ticket {
        self.requests.issue()
    }

    /// Store `value` if `ticket` is still current. Returns whether it was kept.
    pub fn offer(&mut self, ticket: Ticket, value: T) -> bool {
        if !self.requests.is_latest(ticket) {
            debug!("Discarding result of superseded request {:?}", ticket);
            return false;
        }
        self.value = Some(value);
        true
    }

    pub fn get(&self) -> Option<&T> {
        self.value.as_ref()
    }

    pub fn clear(&mut self) {
        self.value = None;
    }
}

/// Collapses bursts of input: only the last value given within the quiet
/// period comes out, and only if it is longer than `min_len` characters.
#[derive(Debug)]
pub struct Debouncer {
    quiet: Duration,
    min_len: usize,
    inputs: Sequencer,
}

impl Debouncer {
    pub fn new(quiet: Duration, min_len: usize) -> Self {
        Self {
            quiet,
            min_len,
            inputs: Sequencer::new(),
        }
    }

    /// Wait out the quiet period. [None] if newer input arrived meanwhile or
    /// this input is too short to act on.
    pub async fn settle(&self, input: String) -> Option<String> {
        let ticket = self.inputs.issue();
        sleep(self.quiet).await;
        if !self.inputs.is_latest(ticket) {
            return None;
        }
        if input.trim().chars().count() <= self.min_len {
            return None;
        }
        Some(input)
    }
}

impl Default for Debouncer {
    /// Half a second, and more than two characters.
    fn default() -> Self {
        Self::new(Duration::from_millis(500), 2)
    }
}

/// Whether a video search should honour the selected channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchMode {
    General,
    Channel,
}

#[derive(Debug, Default)]
pub struct Session {
    criteria: FilterCriteria,
    selected_channel: Option<ChannelSummary>,
    videos: Latest<Result<Vec<MediaItem>>>,
    channels: Latest<Result<Vec<ChannelSummary>>>,
}

impl Session {
    pub fn new(criteria: FilterCriteria) -> Self {
        Self {
            criteria,
            ..Self::default()
        }
    }

    pub fn criteria(&self) -> &FilterCriteria {
        &self.criteria
    }

    /// Change the current criteria in place.
    pub fn update<F: FnOnce(&mut FilterCriteria)>(&mut self, f: F) {
        f(&mut self.criteria)
    }

    pub fn selected_channel(&self) -> Option<&ChannelSummary> {
        self.selected_channel.as_ref()
    }

    /// Make `channel` the scope of subsequent channel-mode searches.
    pub fn select_channel(&mut self, channel: ChannelSummary) {
        self.criteria.channel_scope = Some(channel.id.clone());
        self.selected_channel = Some(channel);
    }

    pub fn clear_channel_selection(&mut self) {
        self.selected_channel = None;
        self.criteria.channel_scope = None;
    }

    /// Start a video search. In [SearchMode::General] any channel selection
    /// is dropped first.
    pub fn begin_video_search(&mut self, mode: SearchMode) -> (Ticket, FilterCriteria) {
        match mode {
            SearchMode::General => self.clear_channel_selection(),
            SearchMode::Channel => {
                if let Some(channel) = &self.selected_channel {
                    self.criteria.channel_scope = Some(channel.id.clone());
                }
            }
        }
        (self.videos.begin(), self.criteria.clone())
    }

    pub fn finish_video_search(&mut self, ticket: Ticket, result: Result<Vec<MediaItem>>) -> bool {
        self.videos.offer(ticket, result)
    }

    pub fn begin_channel_search(&self) -> Ticket {
        self.channels.begin()
    }

    /// A successful channel search replaces any selection and old videos.
    pub fn finish_channel_search(
        &mut self,
        ticket: Ticket,
        result: Result<Vec<ChannelSummary>>,
    ) -> bool {
        let succeeded = result.is_ok();
        if !self.channels.offer(ticket, result) {
            return false;
        }
        if succeeded {
            self.selected_channel = None;
            self.videos.clear();
        }
        true
    }

    pub fn videos(&self) -> Option<&Result<Vec<MediaItem>>> {
        self.videos.get()
    }

    pub fn channels(&self) -> Option<&Result<Vec<ChannelSummary>>> {
        self.channels.get()
    }
}

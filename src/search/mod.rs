//! Search orchestration: one primary request, then batched lookups to
//! hydrate each hit, then the client-side filter.

use std::collections::{HashMap, HashSet};

use log::{debug, info, warn};
use serde::de::DeserializeOwned;

use crate::{
    api::{self, ChannelResource, ListResponse, Requests, SearchResult, VideoResource},
    filter::{filter_and_rank, FilterCriteria},
    model::{ChannelSummary, MediaItem},
    query::{parse_channel_ref, ChannelRef},
    transport::{HyperTransport, Transport},
    Config, Error, Result, Stage,
};

/// Outcome of fetching full details for one channel found by keyword.
#[derive(Debug, Clone, PartialEq)]
pub enum Hydration {
    Hydrated(ChannelSummary),
    Skipped { channel_id: String, reason: String },
}

impl Hydration {
    pub fn into_hydrated(self) -> Option<ChannelSummary> {
        match self {
            Self::Hydrated(channel) => Some(channel),
            Self::Skipped { .. } => None,
        }
    }
}

/// Runs searches against the platform. Holds no state between calls.
pub struct Searcher<T = HyperTransport> {
    config: Config,
    transport: T,
}

impl Searcher<HyperTransport> {
    pub fn from_config(config: Config) -> Self {
        Self::new(config, HyperTransport::new())
    }
}

impl<T: Transport> Searcher<T> {
    pub fn new(config: Config, transport: T) -> Self {
        Self { config, transport }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    async fn fetch<R: DeserializeOwned>(&self, uri: String, key: &str, stage: Stage) -> Result<R> {
        debug!("{}: GET {}", stage, api::redact(&uri, key));
        let reply = self.transport.get(&uri, stage).await?;
        api::decode(reply, stage)
    }

    /// Search for videos matching `criteria`, keep those that pass its
    /// filters, in the order the platform ranked them.
    pub async fn search(&self, criteria: &FilterCriteria) -> Result<Vec<MediaItem>> {
        let key = self.config.api_key()?;
        criteria.validate()?;
        let requests = Requests::new(&self.config, key);

        info!("Searching for {}", criteria);
        let page: ListResponse<SearchResult> = self
            .fetch(requests.search_videos(criteria)?, key, Stage::Search)
            .await?;
        let hits: Vec<(String, SearchResult)> = page
            .items
            .into_iter()
            .filter_map(|hit| hit.id.video_id.clone().map(|id| (id, hit)))
            .collect();
        if hits.is_empty() {
            info!("No results for {}", criteria);
            return Ok(Vec::new());
        }

        let video_ids: Vec<String> = hits.iter().map(|(id, _)| id.clone()).collect();
        let details = self.video_details(&requests, key, &video_ids).await?;

        let channel_ids = unique(hits.iter().map(|(_, hit)| hit.snippet.channel_id.as_str()));
        let subscribers = self.subscriber_counts(&requests, key, &channel_ids).await?;

        let items: Vec<MediaItem> = hits
            .into_iter()
            .map(|(id, hit)| {
                let (duration, views) = details
                    .get(&id)
                    .map(|v| (v.content_details.duration, v.statistics.view_count))
                    .unwrap_or((0, 0));
                let subscriber_count = subscribers
                    .get(&hit.snippet.channel_id)
                    .copied()
                    .unwrap_or(0);
                let snippet = hit.snippet;

                let mut item = MediaItem::new(id, snippet.channel_id, snippet.published_at)
                    .with_title(snippet.title)
                    .with_views(views)
                    .with_subscribers(subscriber_count)
                    .with_duration(duration);
                item.channel_title = snippet.channel_title;
                item.description = snippet.description;
                item.thumbnail_url = snippet.thumbnails.best_url();
                item
            })
            .collect();

        let fetched = items.len();
        let items = filter_and_rank(items, criteria);
        info!("{} of {} results passed the filters", items.len(), fetched);
        Ok(items)
    }

    async fn video_details(
        &self,
        requests: &Requests<'_>,
        key: &str,
        ids: &[String],
    ) -> Result<HashMap<String, VideoResource>> {
        let list: ListResponse<VideoResource> = self
            .fetch(requests.video_details(ids)?, key, Stage::VideoDetails)
            .await?;
        Ok(list.items.into_iter().map(|v| (v.id.clone(), v)).collect())
    }

    async fn subscriber_counts(
        &self,
        requests: &Requests<'_>,
        key: &str,
        ids: &[String],
    ) -> Result<HashMap<String, u64>> {
        let list: ListResponse<ChannelResource> = self
            .fetch(requests.channel_stats(ids)?, key, Stage::ChannelStats)
            .await?;
        Ok(list
            .items
            .into_iter()
            .map(|c| (c.id, c.statistics.subscriber_count))
            .collect())
    }

    /// Look a channel up by ID, handle or username. [None] if the platform
    /// does not know it.
    pub async fn resolve_channel(&self, channel: &ChannelRef) -> Result<Option<ChannelSummary>> {
        let key = self.config.api_key()?;
        let requests = Requests::new(&self.config, key);

        let list: ListResponse<ChannelResource> = self
            .fetch(requests.channel_lookup(channel)?, key, Stage::ChannelLookup)
            .await?;
        match list.items.into_iter().next() {
            None => Ok(None),
            Some(resource) => resource.into_summary().map(Some).ok_or_else(|| Error::Decode {
                stage: Stage::ChannelLookup,
                reason: format!("channel {} came back without a snippet", channel),
            }),
        }
    }

    /// [Searcher::resolve_channel] for a literal channel ID.
    pub async fn channel_info(&self, channel_id: &str) -> Result<Option<ChannelSummary>> {
        self.resolve_channel(&ChannelRef::Id(channel_id.to_string()))
            .await
    }

    /// Find channels. A URL, handle or ID is looked up directly; anything
    /// else is a keyword search whose hits are hydrated one by one.
    pub async fn search_channels(&self, query: &str) -> Result<Vec<ChannelSummary>> {
        let key = self.config.api_key()?;
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        if let Some(channel) = parse_channel_ref(query) {
            info!("Looking up channel {}", channel);
            return Ok(self.resolve_channel(&channel).await?.into_iter().collect());
        }

        info!("Searching channels for {:?}", query);
        let requests = Requests::new(&self.config, key);
        let page: ListResponse<SearchResult> = self
            .fetch(requests.search_channels(query)?, key, Stage::ChannelSearch)
            .await?;
        let ids: Vec<String> = page
            .items
            .into_iter()
            .filter_map(|hit| hit.id.channel_id)
            .collect();

        Ok(self
            .hydrate(ids)
            .await
            .into_iter()
            .filter_map(Hydration::into_hydrated)
            .collect())
    }

    /// Fetch full details for each channel in turn. A failed lookup is
    /// logged and skipped rather than failing the batch.
    pub async fn hydrate(&self, channel_ids: Vec<String>) -> Vec<Hydration> {
        let mut out = Vec::with_capacity(channel_ids.len());
        for channel_id in channel_ids {
            let outcome = match self.channel_info(&channel_id).await {
                Ok(Some(channel)) => Hydration::Hydrated(channel),
                Ok(None) => Hydration::Skipped {
                    channel_id,
                    reason: "no such channel".to_string(),
                },
                Err(e) => Hydration::Skipped {
                    channel_id,
                    reason: e.to_string(),
                },
            };
            if let Hydration::Skipped { channel_id, reason } = &outcome {
                warn!("Skipping channel {}: {}", channel_id, reason);
            }
            out.push(outcome);
        }
        out
    }
}

/// Distinct values, first occurrence wins.
fn unique<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    values
        .filter(|v| seen.insert(*v))
        .map(str::to_owned)
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{filter::LengthClass, transport::Reply};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Answers each request with the first route whose every fragment
    /// appears in the URI, and remembers what it was asked.
    struct Scripted {
        routes: Vec<(Vec<&'static str>, Reply)>,
        calls: Mutex<Vec<String>>,
    }

    impl Scripted {
        fn new() -> Self {
            Self {
                routes: Vec::new(),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn route(mut self, fragments: &[&'static str], status: u16, body: &str) -> Self {
            self.routes.push((
                fragments.to_vec(),
                Reply {
                    status,
                    content_type: Some("application/json; charset=UTF-8".to_string()),
                    body: body.as_bytes().to_vec(),
                },
            ));
            self
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Transport for Scripted {
        async fn get(&self, uri: &str, _stage: Stage) -> Result<Reply> {
            self.calls.lock().unwrap().push(uri.to_string());
            let (_, reply) = self
                .routes
                .iter()
                .find(|(fragments, _)| fragments.iter().all(|f| uri.contains(f)))
                .unwrap_or_else(|| panic!("unexpected request {}", uri));
            Ok(reply.clone())
        }
    }

    fn searcher(transport: Scripted) -> Searcher<Scripted> {
        let config = Config::default()
            .with_api_key("test-key")
            .with_base_url("https://api.test/v3");
        Searcher::new(config, transport)
    }

    fn video_hit(id: &str, channel: &str) -> String {
        format!(
            r#"{{"id": {{"kind": "youtube#video", "videoId": "{}"}},
                "snippet": {{"channelId": "{}", "title": "title {}", "channelTitle": "ch {}",
                             "description": "", "publishedAt": "2024-02-03T04:05:06Z",
                             "thumbnails": {{"high": {{"url": "https://i.test/{}.jpg"}}}}}}}}"#,
            id, channel, id, channel, id
        )
    }

    fn list(entries: &[String]) -> String {
        format!(r#"{{"items": [{}]}}"#, entries.join(","))
    }

    fn video_detail(id: &str, duration: &str, views: u64) -> String {
        format!(
            r#"{{"id": "{}", "contentDetails": {{"duration": "{}"}}, "statistics": {{"viewCount": "{}"}}}}"#,
            id, duration, views
        )
    }

    fn channel_stat(id: &str, subscribers: u64) -> String {
        format!(r#"{{"id": "{}", "statistics": {{"subscriberCount": "{}"}}}}"#, id, subscribers)
    }

    fn channel_full(id: &str, title: &str) -> String {
        format!(
            r#"{{"items": [{{"id": "{}", "snippet": {{"title": "{}", "description": "",
                "publishedAt": "2010-01-01T00:00:00Z"}},
                "statistics": {{"subscriberCount": "10", "viewCount": "20", "videoCount": "30"}}}}]}}"#,
            id, title
        )
    }

    fn keyword_fixture() -> Scripted {
        let views = [50, 150, 99_000, 250_000, 100_000, 7, 1_000_000, 99_999, 400_000, 3];
        let ids: Vec<String> = (0..views.len()).map(|i| format!("v{}", i)).collect();
        let hits: Vec<String> = ids
            .iter()
            .enumerate()
            .map(|(i, id)| video_hit(id, if i % 2 == 0 { "UCa" } else { "UCb" }))
            .collect();
        let details: Vec<String> = ids
            .iter()
            .zip(views.iter())
            .map(|(id, v)| video_detail(id, "PT5M1S", *v))
            .collect();

        Scripted::new()
            .route(&["/search?", "type=video"], 200, &list(&hits))
            .route(&["/videos?"], 200, &list(&details))
            .route(
                &["/channels?", "part=statistics&"],
                200,
                &list(&[channel_stat("UCa", 1_000), channel_stat("UCb", 2_000_000)]),
            )
    }

    #[tokio::test]
    async fn keyword_search_filters_in_order() {
        let searcher = searcher(keyword_fixture());
        let criteria = FilterCriteria::new("rust").with_min_views(Some(100_000));
        let out = searcher.search(&criteria).await.unwrap();

        let ids: Vec<&str> = out.iter().map(|v| v.id.as_str()).collect();
        assert_eq!(ids, vec!["v3", "v4", "v6", "v8"]);

        let first = &out[0];
        assert_eq!(first.title, "title v3");
        assert_eq!(first.channel_id, "UCb");
        assert_eq!(first.subscriber_count, 2_000_000);
        assert_eq!(first.duration_seconds(), 301);
        assert_eq!(first.duration_display(), "5:01");
        assert_eq!(first.thumbnail_url, "https://i.test/v3.jpg");
    }

    #[tokio::test]
    async fn lookups_are_batched_and_deduplicated() {
        let searcher = searcher(keyword_fixture());
        searcher.search(&FilterCriteria::new("rust")).await.unwrap();

        let calls = searcher.transport.calls();
        assert_eq!(calls.len(), 3);
        assert!(calls[1].contains("id=v0%2Cv1%2Cv2"));
        assert!(calls[2].contains("id=UCa%2CUCb&"));
    }

    #[tokio::test]
    async fn subscriber_ceiling_applies() {
        let searcher = searcher(keyword_fixture());
        let criteria = FilterCriteria::new("rust").with_max_subscribers(Some(5_000));
        let out = searcher.search(&criteria).await.unwrap();
        assert_eq!(out.len(), 5);
        assert!(out.iter().all(|v| v.channel_id == "UCa"));
    }

    #[tokio::test]
    async fn missing_details_default_to_zero() {
        let transport = Scripted::new()
            .route(&["/search?"], 200, &list(&[video_hit("a", "UCa"), video_hit("b", "UCa")]))
            .route(&["/videos?"], 200, &list(&[video_detail("a", "PT1H", 10)]))
            .route(&["/channels?"], 200, r#"{"items": []}"#);
        let out = searcher(transport).search(&FilterCriteria::new("q")).await.unwrap();

        assert_eq!(out.len(), 2);
        assert_eq!(out[0].duration_display(), "1:00:00");
        assert_eq!(out[1].view_count, 0);
        assert_eq!(out[1].duration_seconds(), 0);
        assert_eq!(out[1].subscriber_count, 0);
    }

    #[tokio::test]
    async fn channel_scope_restricts_results() {
        let transport = Scripted::new()
            .route(
                &["/search?", "channelId=UCa"],
                200,
                &list(&[video_hit("a", "UCa"), video_hit("stray", "UCz"), video_hit("b", "UCa")]),
            )
            .route(
                &["/videos?"],
                200,
                &list(&[video_detail("a", "PT3M", 1), video_detail("b", "PT10M", 1)]),
            )
            .route(&["/channels?"], 200, &list(&[channel_stat("UCa", 5)]));
        let criteria = FilterCriteria::new("")
            .with_channel_scope(Some("UCa".to_string()))
            .with_length(LengthClass::Long);
        let searcher = searcher(transport);
        let out = searcher.search(&criteria).await.unwrap();

        let ids: Vec<&str> = out.iter().map(|v| v.id.as_str()).collect();
        assert_eq!(ids, vec!["b"]);
        assert!(out.iter().all(|v| v.channel_id == "UCa"));
        assert!(searcher.transport.calls()[0].contains("videoDuration=long"));
    }

    #[tokio::test]
    async fn empty_page_skips_lookups() {
        let transport = Scripted::new().route(&["/search?"], 200, r#"{"items": []}"#);
        let searcher = searcher(transport);
        assert!(searcher.search(&FilterCriteria::new("q")).await.unwrap().is_empty());
        assert_eq!(searcher.transport.calls().len(), 1);
    }

    #[tokio::test]
    async fn empty_query_is_rejected() {
        let searcher = searcher(Scripted::new());
        let err = searcher.search(&FilterCriteria::new("  ")).await.unwrap_err();
        assert_eq!(err, Error::EmptyQuery);
        assert!(searcher.transport.calls().is_empty());
    }

    #[tokio::test]
    async fn blank_scope_without_keyword_makes_no_request() {
        let searcher = searcher(Scripted::new());
        let mut criteria = FilterCriteria::new("");
        criteria.channel_scope = Some("   ".to_string());
        let err = searcher.search(&criteria).await.unwrap_err();
        assert_eq!(err, Error::EmptyQuery);
        assert!(searcher.transport.calls().is_empty());
    }

    #[tokio::test]
    async fn missing_key_fails_before_any_request() {
        let searcher = Searcher::new(Config::default(), Scripted::new());

        let err = searcher.search(&FilterCriteria::new("q")).await.unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
        let err = searcher.search(&FilterCriteria::new("")).await.unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
        let err = searcher.search_channels("cooking").await.unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));

        assert!(searcher.transport.calls().is_empty());
    }

    #[tokio::test]
    async fn upstream_failures_name_their_stage() {
        let transport = Scripted::new().route(
            &["/search?"],
            403,
            r#"{"error": {"code": 403, "message": "The request cannot be completed because you have exceeded your quota."}}"#,
        );
        let err = searcher(transport).search(&FilterCriteria::new("q")).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Upstream {
                stage: Stage::Search,
                status: Some(403),
                ..
            }
        ));

        let transport = Scripted::new()
            .route(&["/search?"], 200, &list(&[video_hit("a", "UCa")]))
            .route(&["/videos?"], 500, "");
        let err = searcher(transport).search(&FilterCriteria::new("q")).await.unwrap_err();
        assert_eq!(err.to_string(), "video detail request failed: HTTP 500");

        let transport = Scripted::new()
            .route(&["/search?"], 200, &list(&[video_hit("a", "UCa")]))
            .route(&["/videos?"], 200, &list(&[video_detail("a", "PT1M", 1)]))
            .route(&["/channels?"], 400, "");
        let err = searcher(transport).search(&FilterCriteria::new("q")).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Upstream {
                stage: Stage::ChannelStats,
                status: Some(400),
                ..
            }
        ));
    }

    #[tokio::test]
    async fn identifier_is_looked_up_directly() {
        let id = "UC_x5XG1OV2P6uZZ5FSM9Ttw";
        let transport = Scripted::new().route(
            &["/channels?", "id=UC_x5XG1OV2P6uZZ5FSM9Ttw"],
            200,
            &channel_full(id, "Google"),
        );
        let searcher = searcher(transport);

        let out = searcher
            .search_channels(&format!("https://www.youtube.com/channel/{}", id))
            .await
            .unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].title, "Google");
        assert_eq!(out[0].video_count, 30);
        assert_eq!(searcher.transport.calls().len(), 1);
    }

    #[tokio::test]
    async fn handles_resolve_through_for_handle() {
        let transport = Scripted::new()
            .route(&["/channels?", "forHandle=%40chef"], 200, &channel_full("UCchef", "Chef"))
            .route(&["/channels?"], 200, r#"{"items": []}"#);
        let searcher = searcher(transport);

        let out = searcher.search_channels("@chef").await.unwrap();
        assert_eq!(out[0].id, "UCchef");
        assert!(searcher.search_channels("@nobody").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn keyword_channel_search_skips_failed_hydrations() {
        let hits = r#"{"items": [
            {"id": {"channelId": "UC1"}, "snippet": {"channelId": "UC1", "publishedAt": "2020-01-01T00:00:00Z"}},
            {"id": {"channelId": "UC2"}, "snippet": {"channelId": "UC2", "publishedAt": "2020-01-01T00:00:00Z"}},
            {"id": {"channelId": "UC3"}, "snippet": {"channelId": "UC3", "publishedAt": "2020-01-01T00:00:00Z"}}
        ]}"#;
        let transport = Scripted::new()
            .route(&["/search?", "type=channel"], 200, hits)
            .route(&["/channels?", "id=UC1&"], 200, &channel_full("UC1", "one"))
            .route(&["/channels?", "id=UC2&"], 500, "")
            .route(&["/channels?", "id=UC3&"], 200, &channel_full("UC3", "three"));
        let searcher = searcher(transport);

        let out = searcher.search_channels("cooking").await.unwrap();
        let titles: Vec<&str> = out.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["one", "three"]);

        let outcomes = searcher.hydrate(vec!["UC2".to_string()]).await;
        assert!(matches!(
            &outcomes[0],
            Hydration::Skipped { channel_id, .. } if channel_id == "UC2"
        ));
    }

    #[tokio::test]
    async fn failed_channel_search_is_fatal() {
        let transport = Scripted::new().route(&["/search?"], 503, "");
        let err = searcher(transport).search_channels("cooking").await.unwrap_err();
        assert!(matches!(
            err,
            Error::Upstream {
                stage: Stage::ChannelSearch,
                status: Some(503),
                ..
            }
        ));
    }

    #[tokio::test]
    async fn blank_channel_query_makes_no_request() {
        let searcher = searcher(Scripted::new());
        assert!(searcher.search_channels("   ").await.unwrap().is_empty());
        assert!(searcher.transport.calls().is_empty());
    }

    #[test]
    fn unique_keeps_first_occurrence() {
        let v = unique(vec!["b", "a", "b", "c", "a"].into_iter());
        assert_eq!(v, vec!["b", "a", "c"]);
    }
}

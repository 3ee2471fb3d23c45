use clap::{clap_app, App, ArgMatches};
use log::{info, LevelFilter};
use std::{error, process::exit, sync::Arc};
use tokio::{
    io::{stdin, AsyncBufReadExt, BufReader},
    sync::Mutex,
    task::JoinSet,
};

use chrono::Utc;
use tubesift::{
    filter::DEFAULT_MIN_VIEWS,
    format::{format_number, format_relative_time, format_subscriber_count, format_view_count},
    query::parse_channel_ref,
    session::{Debouncer, SearchMode, Session},
    ChannelSummary, Config, Error, FilterCriteria, MediaItem, Searcher,
};

mod siftlog {
    use chrono::Utc;
    use log::{max_level, Log, Metadata, Record};

    pub struct StderrLogger;

    impl Log for StderrLogger {
        fn enabled(&self, metadata: &Metadata) -> bool {
            metadata.level() <= max_level()
        }

        fn log(&self, record: &Record) {
            if self.enabled(record.metadata()) {
                eprintln!("{} - {} - {}", Utc::now(), record.level(), record.args());
            }
        }

        fn flush(&self) {}
    }
}

static LOGGER: siftlog::StderrLogger = siftlog::StderrLogger;

type BoxError = Box<dyn error::Error + Send + Sync + 'static>;

fn app() -> App<'static, 'static> {
    clap_app!(tubesift =>
        (version: "0.0.1")
        (author: "krashanoff <leo@krashanoff.com>")
        (about: "Search YouTube by keyword or channel, filtered by views, subscribers and length.")
        (@arg verbose: -v ... "Increases program verbosity")
        (@subcommand videos =>
            (about: "Search for videos")
            (@arg channel: -c --channel +takes_value
                "Only search this channel (URL, @handle or ID)")
            (@arg min_views: --("min-views") +takes_value
                "Drop videos with fewer views. Defaults to 100000; 0 disables.")
            (@arg max_subscribers: --("max-subscribers") +takes_value
                "Drop videos from channels with more subscribers")
            (@arg sort: -s --sort +takes_value
                "date, viewCount, rating or relevance. Defaults to date.")
            (@arg length: -l --length +takes_value "any, short, medium or long. Defaults to any.")
            (@arg count: -n --count +takes_value "Results to request, at most 50. Defaults to 50.")
            (@arg json: --json "Print results as JSON")
            (@arg KEYWORD: ... "Search keywords")
        )
        (@subcommand channels =>
            (about: "Find channels by name, URL, @handle or ID")
            (@arg interactive: -i --interactive "Read queries from stdin as they are typed")
            (@arg json: --json "Print results as JSON")
            (@arg QUERY: ... "Channel name, URL, @handle or ID")
        )
    )
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), BoxError> {
    let matches = app().get_matches();

    if let Err(e) = log::set_logger(&LOGGER).map(|()| {
        log::set_max_level(match matches.occurrences_of("verbose") {
            0 => LevelFilter::Error,
            1 => LevelFilter::Warn,
            2 => LevelFilter::Info,
            _ => LevelFilter::Debug,
        })
    }) {
        panic!("Failed to initialize logger! {}", e)
    }

    dotenv::dotenv().ok();
    let searcher = Searcher::from_config(Config::from_env());

    match matches.subcommand() {
        ("videos", Some(m)) => videos(&searcher, m).await,
        ("channels", Some(m)) if m.is_present("interactive") => {
            interactive_channels(Arc::new(searcher), m.is_present("json")).await
        }
        ("channels", Some(m)) => channels(&searcher, m).await,
        _ => {
            eprintln!("{}", matches.usage());
            exit(2)
        }
    }
}

fn joined(m: &ArgMatches<'_>, name: &str) -> String {
    m.values_of(name)
        .map(|v| v.collect::<Vec<_>>().join(" "))
        .unwrap_or_default()
}

fn count(m: &ArgMatches<'_>, name: &str) -> Result<Option<u64>, Error> {
    m.value_of(name)
        .map(|v| {
            v.parse().map_err(|_| {
                let flag = name.replace('_', "-");
                Error::InvalidArgument(format!("--{} expects a number, got `{}`", flag, v))
            })
        })
        .transpose()
}

/// `--min-views 0` turns the floor off.
fn min_views(m: &ArgMatches<'_>) -> Result<Option<u64>, Error> {
    Ok(match count(m, "min_views")? {
        None => Some(DEFAULT_MIN_VIEWS),
        Some(0) => None,
        Some(n) => Some(n),
    })
}

fn criteria(m: &ArgMatches<'_>) -> Result<FilterCriteria, Error> {
    let mut criteria = FilterCriteria::new(joined(m, "KEYWORD"))
        .with_min_views(min_views(m)?)
        .with_max_subscribers(count(m, "max_subscribers")?);
    if let Some(sort) = m.value_of("sort") {
        criteria = criteria.with_sort(sort.parse()?);
    }
    if let Some(length) = m.value_of("length") {
        criteria = criteria.with_length(length.parse()?);
    }
    if let Some(n) = count(m, "count")? {
        criteria = criteria.with_limit(n.min(u32::MAX as u64) as u32);
    }
    Ok(criteria)
}

async fn videos(searcher: &Searcher, m: &ArgMatches<'_>) -> Result<(), BoxError> {
    let mut session = Session::new(criteria(m)?);

    let mode = match m.value_of("channel") {
        Some(input) => {
            let target = parse_channel_ref(input)
                .ok_or_else(|| format!("`{}` is not a channel URL, @handle or ID", input))?;
            let channel = searcher
                .resolve_channel(&target)
                .await?
                .ok_or_else(|| format!("No channel found for {}", target))?;
            info!("Searching within {} ({})", channel.title, channel.id);
            session.select_channel(channel);
            SearchMode::Channel
        }
        None => SearchMode::General,
    };

    let (ticket, criteria) = session.begin_video_search(mode);
    let result = searcher.search(&criteria).await;
    session.finish_video_search(ticket, result);

    match session.videos() {
        Some(Ok(found)) if m.is_present("json") => {
            println!("{}", serde_json::to_string_pretty(found)?)
        }
        Some(Ok(found)) => print_videos(found),
        Some(Err(e)) => return Err(e.clone().into()),
        None => {}
    }
    Ok(())
}

async fn channels(searcher: &Searcher, m: &ArgMatches<'_>) -> Result<(), BoxError> {
    let found = searcher.search_channels(&joined(m, "QUERY")).await?;
    if m.is_present("json") {
        println!("{}", serde_json::to_string_pretty(&found)?);
    } else {
        print_channels(&found);
    }
    Ok(())
}

/// Each line typed is a query; only the last one before a pause is sent.
async fn interactive_channels(searcher: Arc<Searcher>, json: bool) -> Result<(), BoxError> {
    let debouncer = Arc::new(Debouncer::default());
    let session = Arc::new(Mutex::new(Session::default()));
    let mut lines = BufReader::new(stdin()).lines();
    let mut tasks = JoinSet::new();

    eprintln!("Type a channel name, URL or @handle. Ctrl-D to quit.");
    while let Some(line) = lines.next_line().await? {
        let (searcher, debouncer, session) = (searcher.clone(), debouncer.clone(), session.clone());
        tasks.spawn(async move {
            let query = match debouncer.settle(line).await {
                Some(query) => query,
                None => return,
            };
            let ticket = session.lock().await.begin_channel_search();
            let result = searcher.search_channels(&query).await;

            let mut session = session.lock().await;
            if !session.finish_channel_search(ticket, result) {
                return;
            }
            match session.channels() {
                Some(Ok(found)) if json => match serde_json::to_string_pretty(found) {
                    Ok(s) => println!("{}", s),
                    Err(e) => eprintln!("{}", e),
                },
                Some(Ok(found)) => print_channels(found),
                Some(Err(e)) => eprintln!("{}", e),
                None => {}
            }
        });
        while let Some(done) = tasks.try_join_next() {
            done?;
        }
    }

    while let Some(done) = tasks.join_next().await {
        done?;
    }
    Ok(())
}

fn print_videos(videos: &[MediaItem]) {
    if videos.is_empty() {
        println!("No videos matched.");
        return;
    }
    let now = Utc::now();
    for video in videos {
        println!("{} [{}]", video.title, video.duration_display());
        println!(
            "    {} · 구독자 {} · 조회수 {}회 · {}",
            video.channel_title,
            format_subscriber_count(video.subscriber_count),
            format_view_count(video.view_count),
            format_relative_time(video.published_at, now)
        );
        println!("    {}", video.url());
    }
}

fn print_channels(channels: &[ChannelSummary]) {
    if channels.is_empty() {
        println!("No channels found.");
        return;
    }
    for channel in channels {
        println!(
            "{} ({})",
            channel.title,
            channel.custom_url.as_deref().unwrap_or(&channel.id)
        );
        println!(
            "    구독자 {} · 동영상 {}개 · 조회수 {}회",
            format_subscriber_count(channel.subscriber_count),
            format_number(channel.video_count),
            format_view_count(channel.view_count)
        );
        println!("    https://www.youtube.com/channel/{}", channel.id);
    }
}

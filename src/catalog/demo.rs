//! Procedurally generated demo catalog for offline use

use chrono::{DateTime, Duration, DurationRound, Utc};
use rand::distr::Alphanumeric;
use rand::Rng;

use crate::models::{Category, Channel, Program, StreamType};

const DEMO_STREAM_URL: &str = "https://test-streams.mux.dev/x36xhzz/x36xhzz.m3u8";
const DEMO_RATING: &str = "TV-PG";
const FIRST_CHANNEL_NUMBER: usize = 101;
const HOURS_BEFORE: i64 = 2;
const HOURS_AFTER: i64 = 10;

const DEMO_CHANNELS: &[(&str, Category, &str)] = &[
    ("CNN", Category::News, "https://upload.wikimedia.org/wikipedia/commons/6/66/CNN_International_logo.svg"),
    ("Fox News", Category::News, "https://upload.wikimedia.org/wikipedia/commons/6/67/Fox_News_Channel_logo.svg"),
    ("BBC News", Category::News, "https://upload.wikimedia.org/wikipedia/commons/6/62/BBC_News_2019.svg"),
    ("ESPN", Category::Sports, "https://upload.wikimedia.org/wikipedia/commons/a/a2/ESPN_logo.svg"),
    ("Fox Sports", Category::Sports, "https://upload.wikimedia.org/wikipedia/commons/a/a2/Fox_Sports_logo_2017.svg"),
    ("HBO", Category::Entertainment, "https://upload.wikimedia.org/wikipedia/commons/d/de/HBO_logo.svg"),
    ("Netflix Channel", Category::Entertainment, "https://upload.wikimedia.org/wikipedia/commons/0/08/Netflix_2015_logo.svg"),
    ("AMC", Category::Movies, "https://upload.wikimedia.org/wikipedia/commons/1/1d/AMC_Network_logo.svg"),
    ("TCM", Category::Movies, "https://upload.wikimedia.org/wikipedia/commons/3/32/Turner_Classic_Movies_logo.svg"),
    ("Cartoon Network", Category::Kids, "https://upload.wikimedia.org/wikipedia/commons/b/b4/Cartoon_Network_2010_logo.svg"),
    ("Disney Channel", Category::Kids, "https://upload.wikimedia.org/wikipedia/commons/d/d2/Disney_Channel_logo_2014.svg"),
    ("NBC", Category::News, "https://upload.wikimedia.org/wikipedia/commons/3/3f/NBC_logo_2022.svg"),
    ("CBS", Category::News, "https://upload.wikimedia.org/wikipedia/commons/1/1a/CBS_logo_2020.svg"),
    ("ABC", Category::News, "https://upload.wikimedia.org/wikipedia/commons/2/25/ABC_logo_2021.svg"),
    ("TNT", Category::Entertainment, "https://upload.wikimedia.org/wikipedia/commons/2/21/TNT_logo_2016.svg"),
    ("TBS", Category::Entertainment, "https://upload.wikimedia.org/wikipedia/commons/c/ce/TBS_logo_2016.svg"),
    ("USA Network", Category::Entertainment, "https://upload.wikimedia.org/wikipedia/commons/1/1e/USA_Network_logo_2016.svg"),
    ("FX", Category::Entertainment, "https://upload.wikimedia.org/wikipedia/commons/7/7b/FX_Network_logo_2013.svg"),
    ("Discovery", Category::Entertainment, "https://upload.wikimedia.org/wikipedia/commons/3/3e/Discovery_Channel_2019_logo.svg"),
    ("Nat Geo", Category::Entertainment, "https://upload.wikimedia.org/wikipedia/commons/6/65/National_Geographic_logo.svg"),
    ("History", Category::Entertainment, "https://upload.wikimedia.org/wikipedia/commons/f/f3/History_Channel_logo_2015.svg"),
    ("Food Network", Category::Entertainment, "https://upload.wikimedia.org/wikipedia/commons/8/80/Food_Network_logo_2013.svg"),
    ("HGTV", Category::Entertainment, "https://upload.wikimedia.org/wikipedia/commons/d/d7/HGTV_2015_logo.svg"),
    ("TLC", Category::Entertainment, "https://upload.wikimedia.org/wikipedia/commons/6/69/TLC_2008_logo.svg"),
];

/// Build the demo catalog. Programs run hourly from two hours before the
/// current hour to ten hours after it.
pub fn demo_channels<R: Rng + ?Sized>(now: DateTime<Utc>, rng: &mut R) -> Vec<Channel> {
    let hour_start = now.duration_trunc(Duration::hours(1)).unwrap_or(now);

    DEMO_CHANNELS
        .iter()
        .enumerate()
        .map(|(index, (name, category, logo))| {
            let id = format!("ch-{}", index + 1);
            Channel {
                // Fragment keeps stream URLs unique without changing what is fetched
                stream_url: format!("{DEMO_STREAM_URL}#{id}"),
                id,
                name: name.to_string(),
                number: (index + FIRST_CHANNEL_NUMBER).to_string(),
                logo: logo.to_string(),
                category: *category,
                is_live: true,
                current_viewer_count: rng.random_range(1000..51000),
                programs: demo_programs(*category, hour_start, rng),
                stream_type: Some(StreamType::Hls),
                language: None,
            }
        })
        .collect()
}

fn demo_programs<R: Rng + ?Sized>(
    category: Category,
    hour_start: DateTime<Utc>,
    rng: &mut R,
) -> Vec<Program> {
    (-HOURS_BEFORE..HOURS_AFTER)
        .map(|offset| {
            let start = hour_start + Duration::hours(offset);
            let slot = offset + HOURS_BEFORE + 1;
            let title = format!("{category} Program {slot}");
            let token: String = (&mut *rng)
                .sample_iter(&Alphanumeric)
                .take(9)
                .map(char::from)
                .collect::<String>()
                .to_lowercase();

            Program::synthetic(
                format!("prog-{token}"),
                title.clone(),
                format!("This is a description for {title}. It is very interesting and you should watch it."),
                start,
                start + Duration::hours(1),
                vec![category.to_string()],
                DEMO_RATING,
                format!("https://picsum.photos/seed/{token}/320/180"),
            )
        })
        .collect()
}

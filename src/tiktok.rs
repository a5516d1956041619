use derive_new::new;
use reqwest::StatusCode;
use serde::Deserialize;
use snafu::{Location, ResultExt, Snafu};
use tracing::instrument;
use url::Url;

use crate::model::Video;

/// How many of an account's most recent posts are considered per poll.
pub const RECENT_POSTS: usize = 10;

/// Something that can list an account's recent videos with fresh stats.
pub trait VideoSource {
    async fn recent_videos(&self, username: &str) -> Result<Vec<Video>, FetchError>;
}

/// Client for the scraper sidecar that speaks the platform protocol for us.
///
/// Fetching is two-phase, mirroring the sidecar's layout: the user feed
/// lists recent post ids, then each post's metadata is fetched for stats.
#[derive(Debug, Clone, new)]
pub struct TikTok {
    client: reqwest::Client,
    base: Url,
}

impl TikTok {
    #[instrument(skip(self))]
    async fn user_feed(&self, username: &str) -> Result<UserFeed, FetchError> {
        let url = self
            .base
            .join(&format!("user/{username}"))
            .context(EndpointSnafu)?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .context(UserFeedSnafu { username })?;

        // an unknown or empty account is not an error, just nothing to check
        if response.status() == StatusCode::NOT_FOUND {
            tracing::warn!("no data found for @{username}");
            return Ok(UserFeed::default());
        }

        response
            .error_for_status()
            .context(UserFeedSnafu { username })?
            .json()
            .await
            .context(UserFeedSnafu { username })
    }

    #[instrument(skip(self))]
    async fn content_meta(&self, video_id: &str) -> Result<Option<ContentMeta>, FetchError> {
        let url = self
            .base
            .join(&format!("content/{video_id}"))
            .context(EndpointSnafu)?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .context(ContentSnafu { video_id })?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let meta = response
            .error_for_status()
            .context(ContentSnafu { video_id })?
            .json()
            .await
            .context(ContentSnafu { video_id })?;

        Ok(Some(meta))
    }
}

impl VideoSource for TikTok {
    async fn recent_videos(&self, username: &str) -> Result<Vec<Video>, FetchError> {
        let feed = self.user_feed(username).await?;

        let mut videos = Vec::new();
        for item in feed.item_list.into_iter().take(RECENT_POSTS) {
            // posts without an id cannot be tracked, skip them silently
            let Some(id) = item.id else { continue };

            if let Some(meta) = self.content_meta(&id).await? {
                videos.push(normalize(username, id, meta));
            }
        }

        Ok(videos)
    }
}

/// Fold raw post metadata into a canonical [Video], defaulting the fields
/// the platform sometimes omits.
fn normalize(username: &str, video_id: String, meta: ContentMeta) -> Video {
    let title = meta.desc.unwrap_or_else(|| "No title".to_string());
    let views = meta.stats.and_then(|stats| stats.play_count).unwrap_or(0);
    let url = format!("https://www.tiktok.com/@{username}/video/{video_id}");

    Video::new(video_id, username.to_string(), title, views, url)
}

#[derive(Debug, Clone, Default, Deserialize)]
struct UserFeed {
    #[serde(default, rename = "itemList")]
    item_list: Vec<FeedItem>,
}

#[derive(Debug, Clone, Deserialize)]
struct FeedItem {
    #[serde(default)]
    id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct ContentMeta {
    #[serde(default)]
    desc: Option<String>,

    #[serde(default)]
    stats: Option<ContentStats>,
}

#[derive(Debug, Clone, Deserialize)]
struct ContentStats {
    #[serde(default, rename = "playCount")]
    play_count: Option<u64>,
}

#[derive(Debug, Snafu)]
pub enum FetchError {
    /// could not fetch the feed for `{username}`
    UserFeed {
        username: String,
        source: reqwest::Error,
        #[snafu(implicit)]
        location: Location,
    },

    /// could not fetch metadata for video `{video_id}`
    Content {
        video_id: String,
        source: reqwest::Error,
        #[snafu(implicit)]
        location: Location,
    },

    /// the scraper base url does not accept path segments
    Endpoint {
        source: url::ParseError,
        #[snafu(implicit)]
        location: Location,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    fn meta(value: serde_json::Value) -> ContentMeta {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn normalize_full_metadata() {
        let meta = meta(json!({
            "desc": "dance video",
            "stats": { "playCount": 12345 }
        }));

        let video = normalize("alice", "v1".to_string(), meta);
        assert_eq!(video.title, "dance video");
        assert_eq!(video.views, 12345);
        assert_eq!(video.url, "https://www.tiktok.com/@alice/video/v1");
    }

    #[test]
    fn missing_title_gets_a_placeholder() {
        let meta = meta(json!({ "stats": { "playCount": 7 } }));

        let video = normalize("alice", "v1".to_string(), meta);
        assert_eq!(video.title, "No title");
    }

    #[test]
    fn missing_stats_count_as_zero_views() {
        let meta = meta(json!({ "desc": "quiet one" }));

        let video = normalize("alice", "v1".to_string(), meta);
        assert_eq!(video.views, 0);
    }

    #[test]
    fn feed_items_without_ids_deserialize() {
        let feed: UserFeed = serde_json::from_value(json!({
            "itemList": [{ "id": "v1" }, { "desc": "no id here" }, {}]
        }))
        .unwrap();

        let ids: Vec<_> = feed.item_list.iter().filter_map(|i| i.id.as_ref()).collect();
        assert_eq!(ids, vec!["v1"]);
    }

    #[test]
    fn empty_feed_deserializes() {
        let feed: UserFeed = serde_json::from_value(json!({})).unwrap();
        assert!(feed.item_list.is_empty());
    }
}

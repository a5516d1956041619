use chrono::Utc;
use derive_new::new;
use reqwest::StatusCode;
use snafu::{ensure, Location, ResultExt, Snafu};
use tracing::instrument;
use url::Url;

use crate::model::{group_digits, truncate, Timestamp, Video};

/// Longest title fragment shown in an alert message.
const TITLE_LIMIT: usize = 200;

/// Something that can deliver a trending-video alert.
///
/// Implementations report failure instead of panicking so the caller can
/// leave the ledger unmarked and retry on the next run.
pub trait Notify {
    async fn notify(&self, video: &Video) -> Result<(), NotifyError>;
}

/// Delivers alerts to a Slack incoming webhook. Delivered means HTTP 200.
#[derive(Debug, Clone, new)]
pub struct Slack {
    client: reqwest::Client,
    webhook: Url,
}

impl Notify for Slack {
    #[instrument(skip(self, video), fields(video_id = %video.video_id))]
    async fn notify(&self, video: &Video) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(self.webhook.clone())
            .json(&payload(video, Utc::now()))
            .send()
            .await
            .context(DeliverSnafu)?;

        let status = response.status();
        ensure!(status == StatusCode::OK, RejectedSnafu { status });

        tracing::info!(
            "alert sent: @{} - {} views",
            video.username,
            group_digits(video.views)
        );

        Ok(())
    }
}

/// Block Kit message for one trending video.
fn payload(video: &Video, now: Timestamp) -> serde_json::Value {
    serde_json::json!({
        "blocks": [
            {
                "type": "header",
                "text": { "type": "plain_text", "text": "🔥 Trending Video Alert!", "emoji": true }
            },
            { "type": "divider" },
            {
                "type": "section",
                "fields": [
                    { "type": "mrkdwn", "text": "*Platform:*\nTikTok" },
                    { "type": "mrkdwn", "text": format!("*Account:*\n@{}", video.username) }
                ]
            },
            {
                "type": "section",
                "fields": [
                    { "type": "mrkdwn", "text": format!("*Views:*\n{}", group_digits(video.views)) },
                    { "type": "mrkdwn", "text": format!("*Time:*\n{}", now.format("%Y-%m-%d %H:%M")) }
                ]
            },
            {
                "type": "section",
                "text": { "type": "mrkdwn", "text": format!("*Title:*\n{}", truncate(&video.title, TITLE_LIMIT)) }
            },
            {
                "type": "section",
                "text": { "type": "mrkdwn", "text": format!("<{}|🔗 View Video>", video.url) }
            },
            {
                "type": "context",
                "elements": [
                    { "type": "mrkdwn", "text": "🤖 Powered by trendwatch" }
                ]
            }
        ]
    })
}

#[derive(Debug, Snafu)]
pub enum NotifyError {
    /// could not deliver the webhook request
    Deliver {
        source: reqwest::Error,
        #[snafu(implicit)]
        location: Location,
    },

    /// the webhook rejected the alert with status {status}
    Rejected {
        status: StatusCode,
        #[snafu(implicit)]
        location: Location,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::TimeZone;

    fn video() -> Video {
        Video::new(
            "v1".to_string(),
            "alice".to_string(),
            "dance video".to_string(),
            1_234_567,
            "https://www.tiktok.com/@alice/video/v1".to_string(),
        )
    }

    fn text_of(block: &serde_json::Value) -> &str {
        block["text"]["text"].as_str().unwrap()
    }

    #[test]
    fn payload_header_and_fields() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap();
        let message = payload(&video(), now);
        let blocks = message["blocks"].as_array().unwrap();

        assert_eq!(text_of(&blocks[0]), "🔥 Trending Video Alert!");
        assert_eq!(blocks[1]["type"], "divider");

        let account = blocks[2]["fields"][1]["text"].as_str().unwrap();
        assert_eq!(account, "*Account:*\n@alice");

        let views = blocks[3]["fields"][0]["text"].as_str().unwrap();
        assert_eq!(views, "*Views:*\n1,234,567");

        let time = blocks[3]["fields"][1]["text"].as_str().unwrap();
        assert_eq!(time, "*Time:*\n2024-05-01 12:30");
    }

    #[test]
    fn payload_links_to_the_video() {
        let message = payload(&video(), Utc::now());
        let blocks = message["blocks"].as_array().unwrap();

        let link = text_of(&blocks[5]);
        assert_eq!(link, "<https://www.tiktok.com/@alice/video/v1|🔗 View Video>");
    }

    #[test]
    fn payload_truncates_long_titles() {
        let mut video = video();
        video.title = "x".repeat(500);

        let message = payload(&video, Utc::now());
        let title = message["blocks"][4]["text"]["text"].as_str().unwrap();

        assert_eq!(title, format!("*Title:*\n{}", "x".repeat(TITLE_LIMIT)));
    }
}

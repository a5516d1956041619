use std::time::Duration;

use chrono::Utc;
use derive_new::new;

use crate::ledger::{Ledger, LedgerError};
use crate::model::{group_digits, Video};
use crate::slack::Notify;
use crate::tiktok::VideoSource;

/// Totals for one full pass over the configured accounts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunReport {
    pub videos_checked: usize,
    pub alerts_sent: usize,
}

/// Drives one poll: fetch each account's recent videos, record them in the
/// ledger, and deliver an alert for anything newly over the threshold.
///
/// Strictly sequential. An account that fails to fetch contributes zero
/// videos; a failed delivery leaves the ledger unmarked so the next run
/// tries again.
#[derive(Debug, new)]
pub struct Monitor<'a, S, N> {
    pub source: S,
    pub notifier: N,
    pub ledger: &'a Ledger,
    pub threshold: u64,
    pub account_delay: Duration,
}

impl<S: VideoSource, N: Notify> Monitor<'_, S, N> {
    pub async fn run(&self, accounts: &[&str]) -> RunReport {
        let mut report = RunReport::default();

        for (index, account) in accounts.iter().enumerate() {
            // courtesy pause so the scraper is not hammered account-to-account
            if index > 0 {
                tokio::time::sleep(self.account_delay).await;
            }

            self.check_account(account, &mut report).await;
        }

        report
    }

    async fn check_account(&self, account: &str, report: &mut RunReport) {
        tracing::info!("checking @{account}");

        let videos = match self.source.recent_videos(account).await {
            Ok(videos) => videos,
            Err(err) => {
                tracing::warn!("failed to fetch videos for @{account}: {err}");
                return;
            }
        };

        tracing::info!("found {} videos for @{account}", videos.len());
        report.videos_checked += videos.len();

        for video in &videos {
            if let Err(err) = self.process(video, report).await {
                tracing::error!("ledger failure while processing @{account}: {err}");
                return;
            }
        }
    }

    async fn process(&self, video: &Video, report: &mut RunReport) -> Result<(), LedgerError> {
        self.ledger
            .upsert(&video.video_id, &video.username, video.views, Utc::now())?;

        if !self
            .ledger
            .should_alert(&video.video_id, video.views, self.threshold)?
        {
            return Ok(());
        }

        tracing::info!(
            "alert: @{} reached {} views",
            video.username,
            group_digits(video.views)
        );

        match self.notifier.notify(video).await {
            Ok(()) => {
                self.ledger.mark_sent(&video.video_id)?;
                report.alerts_sent += 1;
            }
            Err(err) => {
                // not marked sent, so the next run will re-attempt
                tracing::warn!("alert for {} not delivered: {err}", video.video_id);
            }
        }

        Ok(())
    }
}

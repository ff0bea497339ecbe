//! ntfy notifications for out-of-band monitoring.
//!
//! Every message carries the ntfy Title/Priority/Tags headers, plus an Actions
//! button where a follow-up link helps. With no URL configured the sink logs
//! to the console and the run carries on; a failed POST is logged and
//! swallowed the same way.

use std::fmt::Display;
use std::time::Duration;

use anyhow::Context;
use reqwest::Client;
use tracing::{info, warn};

/// One notification: body text plus the ntfy attribute headers.
#[derive(Debug, Clone)]
pub struct Notification {
    pub message: String,
    pub title: String,
    pub priority: &'static str,
    pub tags: &'static str,
    pub actions: Option<String>,
}

impl Notification {
    pub fn started(company_count: usize) -> Self {
        Self {
            message: format!("Data extraction started for {company_count} companies."),
            title: "ADGM Register data extraction started".to_string(),
            priority: "3",
            tags: "hourglass_flowing_sand,adgm-register",
            actions: None,
        }
    }

    /// 404 from the register: the derived slug is wrong for this company.
    pub fn bad_slug(company: &str, status: u16, register_url: &str) -> Self {
        Self {
            message: format!("Got {status} for {company}"),
            title: format!("Incorrect link for {company}. Check if the link ending is correct."),
            priority: "urgent",
            tags: "warning,adgm,fsra-register,incorrect-link,404-Error",
            actions: Some(format!(
                "view, Go to FSRA Public Register, {register_url}"
            )),
        }
    }

    pub fn fetch_error(company: &str, error: impl Display) -> Self {
        Self {
            message: format!("Error fetching data for {company}: {error}"),
            title: format!("Error fetching data for {company}"),
            priority: "urgent",
            tags: "warning,adgm,fsra-register,error",
            actions: None,
        }
    }

    /// Page fetched fine but the expected markup was absent.
    pub fn bad_page_layout(company: &str, error: impl Display) -> Self {
        Self {
            message: format!("Unexpected page layout for {company}: {error}"),
            title: format!("Could not extract data for {company}"),
            priority: "urgent",
            tags: "warning,adgm,fsra-register,extraction-error",
            actions: None,
        }
    }

    pub fn completed(minutes: u64, seconds: f64) -> Self {
        Self {
            message: format!("Job completed in {minutes} minutes {seconds:.2} seconds."),
            title: "ADGM Register data extraction successful".to_string(),
            priority: "4",
            tags: "white_check_mark,muscle,adgm-register",
            actions: None,
        }
    }

    pub fn interrupted(partial_path: &str) -> Self {
        Self {
            message: format!("Job was interrupted. Partial results saved to {partial_path}"),
            title: "ADGM Register data extraction interrupted".to_string(),
            priority: "3",
            tags: "negative_squared_cross_mark,adgm-register,ctrl-c,interrupted",
            actions: None,
        }
    }

    pub fn crashed(partial_path: &str, error: impl Display) -> Self {
        Self {
            message: format!(
                "App crashed\nPartial results saved to {partial_path}\n\n\
                 An error occurred during data extraction:\n{error}"
            ),
            title: "ADGM Register data extraction failed".to_string(),
            priority: "5",
            tags: "warning,adgm,fsra-register,error",
            actions: None,
        }
    }
}

/// Fire-and-forget notification sink.
#[derive(Debug, Clone)]
pub struct Notifier {
    client: Client,
    url: Option<String>,
}

impl Notifier {
    pub fn new(url: Option<String>) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .context("failed to build notification HTTP client")?;

        Ok(Self { client, url })
    }

    /// Deliver a notification; logs and continues on any failure.
    pub async fn send(&self, notification: &Notification) {
        let Some(url) = &self.url else {
            info!(
                title = notification.title.as_str(),
                "notification (no ntfy URL configured, see https://ntfy.sh): {}",
                notification.message
            );
            return;
        };

        let mut request = self
            .client
            .post(url)
            .header("Title", &notification.title)
            .header("Priority", notification.priority)
            .header("Tags", notification.tags)
            .body(notification.message.clone());
        if let Some(actions) = &notification.actions {
            request = request.header("Actions", actions);
        }

        if let Err(e) = request.send().await {
            warn!(
                "failed to deliver notification '{}': {e}",
                notification.title
            );
        }
    }
}

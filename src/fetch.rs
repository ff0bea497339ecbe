//! Single-company fetch: URL construction, outcome classification, extraction.

use std::time::Instant;

use reqwest::StatusCode;
use scraper::Html;
use tracing::warn;

use crate::extract::{extract_activities, extract_conditions, ActivityRecord, ExtractError};
use crate::notify::{Notification, Notifier};
use crate::record::CompanyRecord;
use crate::slug::company_slug;
use crate::transport::Transport;

/// Parse a detail-page body into (conditions, activities).
///
/// The document is parsed and dropped inside one synchronous call so the
/// async callers never hold it across an await point.
fn parse_detail_page(body: &str) -> Result<(String, Vec<ActivityRecord>), ExtractError> {
    let doc = Html::parse_document(body);
    let activities = extract_activities(&doc)?;
    let conditions = extract_conditions(&doc)?;
    Ok((conditions, activities))
}

/// Look up one company on the register.
///
/// Never fails: every failure mode is reported to the notifier and folded
/// into a name-only `Failure` record, so the batch keeps its shape.
pub async fn fetch_company(
    transport: &Transport,
    notifier: &Notifier,
    base_url: &str,
    company: &str,
) -> CompanyRecord {
    let started = Instant::now();
    let slug = company_slug(company);
    let url = format!("{}/{}", base_url.trim_end_matches('/'), slug);

    let response = match transport.get(&url).await {
        Ok(response) => response,
        Err(e) => {
            println!("Error fetching data for {company}: {e}");
            notifier.send(&Notification::fetch_error(company, &e)).await;
            return CompanyRecord::Failure {
                name: company.to_string(),
            };
        }
    };

    let status = response.status();
    if status == StatusCode::NOT_FOUND {
        println!(
            "There is a problem with the URL for {company}.\n\
             {slug} does not seem to be the correct slug for this company."
        );
        notifier
            .send(&Notification::bad_slug(company, status.as_u16(), base_url))
            .await;
        return CompanyRecord::Failure {
            name: company.to_string(),
        };
    }
    if !status.is_success() {
        println!("Error fetching data for {company}: unexpected status {status}");
        notifier
            .send(&Notification::fetch_error(
                company,
                format!("unexpected status {status}"),
            ))
            .await;
        return CompanyRecord::Failure {
            name: company.to_string(),
        };
    }

    let body = match response.text().await {
        Ok(body) => body,
        Err(e) => {
            println!("Error fetching data for {company}: {e}");
            notifier.send(&Notification::fetch_error(company, &e)).await;
            return CompanyRecord::Failure {
                name: company.to_string(),
            };
        }
    };

    match parse_detail_page(&body) {
        Ok((conditions, activities)) => {
            println!(
                "Data extracted for {company} - Took {:.2} seconds",
                started.elapsed().as_secs_f64()
            );
            CompanyRecord::Success {
                name: company.to_string(),
                conditions,
                activities,
            }
        }
        Err(e) => {
            warn!("unexpected page layout for {company}: {e}");
            notifier
                .send(&Notification::bad_page_layout(company, &e))
                .await;
            CompanyRecord::Failure {
                name: company.to_string(),
            }
        }
    }
}

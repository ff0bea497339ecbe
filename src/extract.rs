//! Register detail-page extraction.
//!
//! A firm's page carries its regulated activities in an accordion container
//! and any licence conditions in a two-row info table. Both extractors take an
//! already-parsed document and fail only when the expected markup is absent.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use thiserror::Error;

/// A page that fetched fine but does not look like a firm detail page.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("regulated activities container not found")]
    ActivitiesContainerMissing,

    #[error("conditions table not found")]
    ConditionsTableMissing,

    #[error("conditions table has no value below its label")]
    ConditionsValueMissing,
}

/// One regulated-activity entry, in page order. Dates keep the page's display
/// format ("14 March 2021").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityRecord {
    pub activity: String,
    pub effective_date: Option<String>,
    pub withdrawn_date: Option<String>,
}

// Selectors are compile-time constants; Selector::parse() only fails on
// malformed CSS syntax, which cannot occur with these values.
static ACTIVITIES_CONTAINER: Lazy<Selector> =
    Lazy::new(|| Selector::parse("#raTableContainer_fsfdetail").unwrap());

static ACTIVITY_PANELS: Lazy<Selector> = Lazy::new(|| Selector::parse("div.opn-accord").unwrap());

static CONDITIONS_TABLE: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".fsp-first-table.specialinfo-table").unwrap());

static CONDITIONS_CELLS: Lazy<Selector> = Lazy::new(|| Selector::parse("div.container").unwrap());

static DATE_SHAPE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{1,2} \w+ \d{4}").unwrap());

/// Whether a line looks like a register date ("1 Jan 2019", "14 March 2021").
fn looks_like_date(line: &str) -> bool {
    DATE_SHAPE.is_match(line)
}

/// Flattened, trimmed, non-empty text lines of an element, in document order.
fn text_lines<'a>(element: ElementRef<'a>) -> impl Iterator<Item = String> + 'a {
    element
        .text()
        .flat_map(|t| t.split('\n'))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Extract the regulated-activity list in document order.
///
/// The accordion flattens to a line sequence with no delimiters: an activity
/// label, then zero, one or two date lines (effective, withdrawn).
pub fn extract_activities(doc: &Html) -> Result<Vec<ActivityRecord>, ExtractError> {
    let container = doc
        .select(&ACTIVITIES_CONTAINER)
        .next()
        .ok_or(ExtractError::ActivitiesContainerMissing)?;

    let mut lines: Vec<String> = Vec::new();
    for panel in container.select(&ACTIVITY_PANELS) {
        lines.extend(text_lines(panel));
    }

    Ok(assemble_activities(lines))
}

/// Cursor walk over the flattened line list. Greedy: each of the up-to-two
/// lines after an activity label is consumed only if it is date-shaped; a
/// non-date lookahead line is left for the next activity.
fn assemble_activities(lines: Vec<String>) -> Vec<ActivityRecord> {
    let mut records = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        let activity = lines[i].clone();
        let mut effective_date = None;
        let mut withdrawn_date = None;

        if lines.get(i + 1).is_some_and(|l| looks_like_date(l)) {
            effective_date = Some(lines[i + 1].clone());
            i += 1;
        }
        if lines.get(i + 1).is_some_and(|l| looks_like_date(l)) {
            withdrawn_date = Some(lines[i + 1].clone());
            i += 1;
        }

        records.push(ActivityRecord {
            activity,
            effective_date,
            withdrawn_date,
        });
        i += 1;
    }

    records
}

/// Extract the licence conditions string.
///
/// The table's first non-empty text segment is the "Conditions" label; the
/// second is the value.
pub fn extract_conditions(doc: &Html) -> Result<String, ExtractError> {
    let table = doc
        .select(&CONDITIONS_TABLE)
        .next()
        .ok_or(ExtractError::ConditionsTableMissing)?;

    let mut segments: Vec<String> = Vec::new();
    for cell in table.select(&CONDITIONS_CELLS) {
        segments.extend(text_lines(cell));
    }

    segments
        .into_iter()
        .nth(1)
        .ok_or(ExtractError::ConditionsValueMissing)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(
        activity: &str,
        effective_date: Option<&str>,
        withdrawn_date: Option<&str>,
    ) -> ActivityRecord {
        ActivityRecord {
            activity: activity.to_string(),
            effective_date: effective_date.map(str::to_string),
            withdrawn_date: withdrawn_date.map(str::to_string),
        }
    }

    fn detail_page(activity_lines: &[&str], conditions: &str) -> Html {
        let panels: String = activity_lines
            .iter()
            .map(|lines| format!("<div class=\"opn-accord\">{lines}</div>"))
            .collect();
        Html::parse_document(&format!(
            r#"<html><body>
                <div class="fsp-first-table specialinfo-table">
                    <div class="container">Conditions</div>
                    <div class="container">{conditions}</div>
                </div>
                <div id="raTableContainer_fsfdetail">{panels}</div>
            </body></html>"#
        ))
    }

    // ===== assemble_activities: the lookahead cursor =====

    #[test]
    fn lookahead_tolerates_zero_one_or_two_dates() {
        let lines = vec![
            "Advising".to_string(),
            "14 March 2021".to_string(),
            "Arranging".to_string(),
            "1 Jan 2019".to_string(),
            "5 Feb 2020".to_string(),
        ];

        assert_eq!(
            assemble_activities(lines),
            vec![
                record("Advising", Some("14 March 2021"), None),
                record("Arranging", Some("1 Jan 2019"), Some("5 Feb 2020")),
            ]
        );
    }

    #[test]
    fn undated_activities_are_not_misattributed() {
        let lines = vec![
            "Dealing in Investments".to_string(),
            "Managing Assets".to_string(),
            "2 April 2022".to_string(),
        ];

        assert_eq!(
            assemble_activities(lines),
            vec![
                record("Dealing in Investments", None, None),
                record("Managing Assets", Some("2 April 2022"), None),
            ]
        );
    }

    #[test]
    fn three_dates_roll_the_third_into_the_next_slot() {
        // Only two lookahead lines are consumed per activity; a third date
        // line starts a new (date-shaped) activity label.
        let lines = vec![
            "Advising".to_string(),
            "1 Jan 2019".to_string(),
            "2 Feb 2020".to_string(),
            "3 Mar 2021".to_string(),
        ];

        let records = assemble_activities(lines);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0], record("Advising", Some("1 Jan 2019"), Some("2 Feb 2020")));
        assert_eq!(records[1].activity, "3 Mar 2021");
    }

    #[test]
    fn empty_line_list_yields_no_records() {
        assert!(assemble_activities(Vec::new()).is_empty());
    }

    // ===== date shape =====

    #[test]
    fn date_shape_matches_register_formats() {
        assert!(looks_like_date("14 March 2021"));
        assert!(looks_like_date("1 Jan 2019"));
        assert!(looks_like_date("31 December 2030"));

        assert!(!looks_like_date("March 2021"));
        assert!(!looks_like_date("Advising on Investments"));
        assert!(!looks_like_date("14/03/2021"));
        assert!(!looks_like_date(""));
    }

    // ===== extract_activities =====

    #[test]
    fn activities_preserve_document_order() {
        let doc = detail_page(
            &[
                "Advising on Investments\n14 March 2021",
                "Arranging Deals\n1 Jan 2019\n5 Feb 2020",
                "Managing Assets",
            ],
            "None",
        );

        let activities = extract_activities(&doc).unwrap();
        assert_eq!(
            activities,
            vec![
                record("Advising on Investments", Some("14 March 2021"), None),
                record("Arranging Deals", Some("1 Jan 2019"), Some("5 Feb 2020")),
                record("Managing Assets", None, None),
            ]
        );
    }

    #[test]
    fn extraction_is_idempotent() {
        let doc = detail_page(&["Advising\n14 March 2021", "Arranging"], "None");

        let first = extract_activities(&doc).unwrap();
        let second = extract_activities(&doc).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn whitespace_only_lines_are_dropped() {
        let doc = detail_page(&["  Advising  \n   \n  14 March 2021  "], "None");

        assert_eq!(
            extract_activities(&doc).unwrap(),
            vec![record("Advising", Some("14 March 2021"), None)]
        );
    }

    #[test]
    fn container_with_no_panels_yields_empty_list() {
        let doc = detail_page(&[], "None");
        assert!(extract_activities(&doc).unwrap().is_empty());
    }

    #[test]
    fn missing_container_is_an_error() {
        let doc = Html::parse_document("<html><body><p>maintenance page</p></body></html>");
        assert!(matches!(
            extract_activities(&doc),
            Err(ExtractError::ActivitiesContainerMissing)
        ));
    }

    // ===== extract_conditions =====

    #[test]
    fn conditions_value_follows_the_label() {
        let doc = detail_page(&[], "Not permitted to hold client assets.");
        assert_eq!(
            extract_conditions(&doc).unwrap(),
            "Not permitted to hold client assets."
        );
    }

    #[test]
    fn missing_conditions_table_is_an_error() {
        let doc = Html::parse_document(
            r#"<html><body><div id="raTableContainer_fsfdetail"></div></body></html>"#,
        );
        assert!(matches!(
            extract_conditions(&doc),
            Err(ExtractError::ConditionsTableMissing)
        ));
    }

    #[test]
    fn label_without_value_is_an_error() {
        let doc = Html::parse_document(
            r#"<html><body>
                <div class="fsp-first-table specialinfo-table">
                    <div class="container">Conditions</div>
                    <div class="container">   </div>
                </div>
            </body></html>"#,
        );
        assert!(matches!(
            extract_conditions(&doc),
            Err(ExtractError::ConditionsValueMissing)
        ));
    }
}

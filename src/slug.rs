//! Company name → register URL slug.
//!
//! The public register addresses each firm by a slug derived from its display
//! name. Most names convert mechanically; firms that were renamed, merged or
//! withdrawn keep a slug that no longer matches their listed name, so those go
//! through a fixed override table first.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

/// Display names whose register slug cannot be derived mechanically.
static SPECIAL_CASES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        (
            "Abrdn Investments Middle East Limited",
            "aberdeen-asset-middle-east-limited",
        ),
        ("Xanara ME LTD", "xanara-management-limited"),
        (
            "SS&C Financial Services Middle East Limited",
            "ssandc-financial-services-middle-east-limited",
        ),
        (
            "Perella Weinberg Partners UK LLP - branch",
            "perella-weinberg-partners-uk-llp",
        ),
        (
            "Mubadala (Re)insurance Limited",
            "mubadala-re-insurance-limited",
        ),
        ("Bitmena Limited", "venomex-limited"),
        (
            "Bank Lombard Odier & Co. Limited",
            "bank-lombard-odier--co-limited",
        ),
        (
            "AT Capital Markets Limited (Withdrawn)",
            "at-capital-markets-limited",
        ),
        ("Worldwide Cash Express Limited", "worldwide-cash-express"),
        ("BNP Paribas S.A.", "bnp-paribas-sa"),
        ("Shorooq Partners Ltd", "shorooq-vc-partners-ltd"),
        ("UniCredit S.p.A.", "unicredit-spa"),
    ])
});

static NON_SLUG_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s-]").unwrap());
static SEPARATOR_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\s-]+").unwrap());

/// Derive the register URL slug for a company display name.
///
/// Total: any printable input yields a slug, in the worst case an empty one.
pub fn company_slug(name: &str) -> String {
    if let Some(slug) = SPECIAL_CASES.get(name) {
        return (*slug).to_string();
    }

    let name = name.to_lowercase();
    let name = name.replace('&', " and ");
    let name = name.replace('.', "-");
    let name = NON_SLUG_CHARS.replace_all(&name, "");
    let name = SEPARATOR_RUNS.replace_all(&name, "-");
    name.trim_end_matches('-').to_string()
}

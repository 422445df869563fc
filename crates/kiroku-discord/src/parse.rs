//! Line-based extraction of the two labeled entry fields.

/// Label prefix for the category line.
pub const CATEGORY_LABEL: &str = "分類:";

/// Label prefix for the detail line.
pub const DETAIL_LABEL: &str = "やったこと:";

/// One category+detail pair extracted from a message body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedEntry {
    pub category: String,
    pub detail: String,
}

/// Scan `body` line by line for the two label prefixes.
///
/// Lines may appear in any order. If a label appears more than once the
/// last occurrence wins — observed behavior, possibly a latent bug rather
/// than intended semantics. Returns `None` when either field is missing
/// or empty after trimming.
pub fn parse_entry(body: &str) -> Option<ParsedEntry> {
    let mut category: Option<String> = None;
    let mut detail: Option<String> = None;

    for line in body.lines() {
        if let Some(rest) = line.strip_prefix(CATEGORY_LABEL) {
            category = Some(rest.trim().to_string());
        } else if let Some(rest) = line.strip_prefix(DETAIL_LABEL) {
            detail = Some(rest.trim().to_string());
        }
    }

    match (category, detail) {
        (Some(c), Some(d)) if !c.is_empty() && !d.is_empty() => {
            Some(ParsedEntry {
                category: c,
                detail: d,
            })
        }
        _ => None,
    }
}

//! Seller name recovery from DTE print layouts
//!
//! Patterns are tried in a fixed order; the first capture wins:
//!
//! 1. `Vendedor:</b> Name` in the HTML `print_content` blocks
//! 2. `Vendedor: Name` up to end of line in the `print_content_v2` blocks
//! 3. `Vendedor: Name` in `print_content` after stripping all tags
//!
//! No match yields `None`; callers then leave the seller unresolved.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::model::PrintDocument;

static HTML_BOLD_LABEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)Vendedor:\s*</b>\s*([^<]+)").expect("valid regex"));

static PLAIN_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)Vendedor:\s*([^\n]+)").expect("valid regex"));

static STRIPPED_TEXT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)Vendedor:\s*([^\n<]+)").expect("valid regex"));

static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").expect("valid regex"));

/// Seller display name split into given and family name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SellerName {
    /// First word
    pub first_name: String,
    /// Remaining words, possibly empty
    pub last_name: String,
}

impl SellerName {
    fn from_display(raw: &str) -> Option<Self> {
        let cleaned = strip_tags(raw);
        let mut words = cleaned.split_whitespace();
        let first_name = words.next()?.to_string();
        let last_name = words.collect::<Vec<_>>().join(" ");
        Some(Self {
            first_name,
            last_name,
        })
    }
}

fn strip_tags(text: &str) -> String {
    TAG.replace_all(text, " ").trim().to_string()
}

fn first_capture<'a, I>(pattern: &Regex, blocks: I) -> Option<SellerName>
where
    I: IntoIterator<Item = &'a String>,
{
    blocks.into_iter().find_map(|block| {
        pattern
            .captures(block)
            .and_then(|caps| caps.get(1))
            .and_then(|m| SellerName::from_display(m.as_str()))
    })
}

/// Extract the seller name from a print document
pub fn extract_seller_name(doc: &PrintDocument) -> Option<SellerName> {
    first_capture(&HTML_BOLD_LABEL, &doc.print_content)
        .or_else(|| first_capture(&PLAIN_LINE, &doc.print_content_v2))
        .or_else(|| {
            let stripped: Vec<String> = doc.print_content.iter().map(|b| strip_tags(b)).collect();
            first_capture(&STRIPPED_TEXT, &stripped)
        })
}

//! Print-layout payload of `/dtes/{id}/imprimir`

use serde::{Deserialize, Serialize};

/// Rendered print blocks of a DTE
///
/// Only the content blocks are kept; they are the free-text sources scanned
/// for the seller name when the seller is missing from the cache.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PrintDocument {
    /// HTML content blocks (legacy layout)
    #[serde(deserialize_with = "super::null_as_default")]
    pub print_content: Vec<String>,
    /// Plain-text content blocks (v2 layout)
    #[serde(deserialize_with = "super::null_as_default")]
    pub print_content_v2: Vec<String>,
    /// Header block
    pub print_header: Option<String>,
    /// Footer block
    pub print_footer: Option<String>,
}

//! Descriptions, thumbnails and display names from page summaries

mod client;
mod naming;

pub use client::{DescriptionSource, PageSummary, SummaryClient, unescape_html};
pub use naming::{extract_display_name, is_generic_opener, lookup_keys};

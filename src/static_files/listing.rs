//! HTML directory listings.

use chrono::{DateTime, Local};
use html_escape::{encode_double_quoted_attribute, encode_text};
use std::fmt::Write as _;
use std::path::Path;

/// One direct child of a listed directory.
#[derive(Debug, Clone)]
pub struct ListingEntry {
    pub name: String,
    pub is_dir: bool,
    pub modified: DateTime<Local>,
}

impl ListingEntry {
    /// The name as shown in the listing: directories get a trailing `/`.
    pub fn display_name(&self) -> String {
        if self.is_dir {
            format!("{}/", self.name)
        } else {
            self.name.clone()
        }
    }
}

/// Reads the direct children of `dir` in enumeration order.
///
/// Fails if the directory or the metadata of any entry cannot be read.
pub async fn read_entries(dir: &Path) -> std::io::Result<Vec<ListingEntry>> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut items = Vec::new();

    while let Some(entry) = entries.next_entry().await? {
        let metadata = entry.metadata().await?;
        let modified: DateTime<Local> = metadata.modified()?.into();

        items.push(ListingEntry {
            name: entry.file_name().to_string_lossy().into_owned(),
            is_dir: metadata.is_dir(),
            modified,
        });
    }

    Ok(items)
}

/// Renders the listing page for the directory requested at `request_path`.
pub fn render(request_path: &str, entries: &[ListingEntry]) -> String {
    let base = if request_path.ends_with('/') {
        request_path.to_string()
    } else {
        format!("{}/", request_path)
    };

    let mut html = String::from("<html><head><title>Directory Listing</title></head><body>");
    let _ = write!(
        html,
        "<h1>Directory listing for {}</h1><ul>",
        encode_text(request_path)
    );

    for entry in entries {
        let mut href = format!("{}{}", base, urlencoding::encode(&entry.name));
        if entry.is_dir {
            href.push('/');
        }

        let _ = write!(
            html,
            "<li><a href=\"{}\">{}</a> - Last Modified: {}</li>",
            encode_double_quoted_attribute(&href),
            encode_text(&entry.display_name()),
            entry.modified.format("%Y-%m-%d %H:%M:%S")
        );
    }

    html.push_str("</ul></body></html>");
    html
}

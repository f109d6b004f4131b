//! Final table sink: one CSV row per deduplicated mention.

use crate::error::SinkError;
use crate::models::MentionRow;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

pub const HEADER: [&str; 6] = ["source", "title", "description", "link", "pubDate", "location"];

/// Encode `rows` as CSV; the header is written even for an empty table.
pub fn encode_table(rows: &[MentionRow]) -> Result<Vec<u8>, SinkError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    writer.write_record(HEADER)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer
        .into_inner()
        .map_err(|e| SinkError::Csv(e.into_error().into()))
}

/// Write the final table to `path`, replacing any previous file.
///
/// # Errors
///
/// Any [`SinkError`]; the caller treats it as fatal.
#[instrument(level = "info", skip_all, fields(path = %path.display(), rows = rows.len()))]
pub async fn write_table(rows: &[MentionRow], path: &Path) -> Result<(), SinkError> {
    let bytes = encode_table(rows)?;
    fs::write(path, bytes).await.map_err(|source| SinkError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    info!("Wrote final table");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PubDate, Source};

    fn row(pub_date: PubDate) -> MentionRow {
        MentionRow {
            source: Source::HealthMap,
            title: "Dengue, Brazil".to_string(),
            description: "Dengue outbreak".to_string(),
            link: "Unknown".to_string(),
            pub_date,
            location: "Unknown".to_string(),
        }
    }

    #[test]
    fn test_header_only_for_empty_table() {
        let bytes = encode_table(&[]).unwrap();
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            "source,title,description,link,pubDate,location\n"
        );
    }

    #[test]
    fn test_rows_are_quoted_and_dates_rendered() {
        let bytes = encode_table(&[row(PubDate::Invalid("soon".into())), row(PubDate::Absent)]).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1], "HealthMap,\"Dengue, Brazil\",Dengue outbreak,Unknown,Invalid,Unknown");
        assert_eq!(lines[2], "HealthMap,\"Dengue, Brazil\",Dengue outbreak,Unknown,Unknown,Unknown");
    }

    #[tokio::test]
    async fn test_write_table_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clean_data.csv");
        write_table(&[row(PubDate::Absent)], &path).await.unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("source,title,description,link,pubDate,location\n"));
    }
}

use crate::error::{Result, ScrapeError};
use crate::results::ScanResult;
use crate::scan::Bucket;
use serde::Serialize;
use std::io::Write;

/// Output formats for a scan result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// The result object, pretty-printed
    Json,
    /// One row per image: bucket, index within the bucket, url
    Csv,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
        }
    }
}

const CSV_HEADER: [&str; 3] = ["bucket", "index", "url"];

#[derive(Serialize)]
struct ListingRow<'a> {
    bucket: &'static str,
    index: usize,
    url: &'a str,
}

/// Writes `result` to `writer` in the given format
pub fn export<W: Write>(result: &ScanResult, format: ExportFormat, writer: W) -> Result<()> {
    match format {
        ExportFormat::Json => write_json(result, writer),
        ExportFormat::Csv => write_csv(result, writer),
    }
}

pub fn write_json<W: Write>(result: &ScanResult, mut writer: W) -> Result<()> {
    serde_json::to_writer_pretty(&mut writer, result)?;
    writer.write_all(b"\n")?;
    Ok(())
}

/// Lists main images first, then variant images.
///
/// The header is written even when both buckets are empty.
pub fn write_csv<W: Write>(result: &ScanResult, writer: W) -> Result<()> {
    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    csv_writer.write_record(CSV_HEADER)?;
    for bucket in [Bucket::Main, Bucket::Variant] {
        for (index, url) in result.images(bucket).iter().enumerate() {
            csv_writer.serialize(ListingRow {
                bucket: bucket.as_str(),
                index,
                url: url.as_str(),
            })?;
        }
    }
    csv_writer
        .into_inner()
        .map_err(|e| ScrapeError::Io(e.into_error()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::UrlNormalizer;

    fn sample() -> ScanResult {
        let normalizer = UrlNormalizer::default();
        let url = |raw: &str| normalizer.normalize(raw).unwrap();
        ScanResult::new(
            vec![url("https://img.example/I/m1._AC_SX679_.jpg")],
            vec![
                url("https://img.example/I/v1.jpg"),
                url("https://img.example/I/v2.jpg"),
            ],
            "Desk Lamp".to_string(),
        )
    }

    #[test]
    fn test_csv_listing() {
        let mut out = Vec::new();
        export(&sample(), ExportFormat::Csv, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                "bucket,index,url",
                "main,0,https://img.example/I/m1.jpg",
                "variant,0,https://img.example/I/v1.jpg",
                "variant,1,https://img.example/I/v2.jpg",
            ]
        );
    }

    #[test]
    fn test_csv_listing_of_empty_result() {
        let mut out = Vec::new();
        write_csv(&ScanResult::default(), &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "bucket,index,url\n");
    }

    #[test]
    fn test_json_uses_camel_case_fields() {
        let mut out = Vec::new();
        export(&sample(), ExportFormat::Json, &mut out).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();

        assert_eq!(value["title"], "Desk Lamp");
        assert_eq!(value["mainImages"][0], "https://img.example/I/m1.jpg");
        assert_eq!(value["variantImages"].as_array().unwrap().len(), 2);
    }
}

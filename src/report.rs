use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use time::{format_description::well_known, OffsetDateTime};

use crate::types::{AnalysisUrls, OutputDocument};

/// Fold the per-analysis groups into the final output document.
pub fn build_document(analyses: Vec<AnalysisUrls>) -> OutputDocument {
    let total_scans = analyses.iter().map(|a| a.scans.len() as u64).sum();
    let missing_url_count = analyses
        .iter()
        .flat_map(|a| &a.scans)
        .filter(|s| s.target_url.is_none())
        .count() as u64;
    OutputDocument {
        generated_at: now_rfc3339(),
        total_analyses: analyses.len() as u64,
        total_scans,
        missing_url_count,
        analyses,
    }
}

/// Print the per-analysis summary to stdout.
pub fn print_summary(doc: &OutputDocument) {
    println!("\nTarget URLs by analysis:");
    println!("{:-<72}", "");
    for analysis in &doc.analyses {
        println!(
            "\nAnalysis: {} (ID: {}, App: {})",
            analysis.analysis_name,
            analysis.analysis_id,
            analysis.application_name.as_deref().unwrap_or("Unknown")
        );
        println!("  scans: {}", analysis.scans.len());
        for scan in &analysis.scans {
            let status = scan.status.as_deref().unwrap_or("Unknown");
            match &scan.target_url {
                Some(url) => println!("  - [{}] {url}  ({status})", scan.scan_id),
                None => println!("  - [{}] <no target URL>  ({status})", scan.scan_id),
            }
        }
    }
    println!(
        "\nTotal: {} scans across {} analyses, {} missing URL(s)",
        doc.total_scans, doc.total_analyses, doc.missing_url_count
    );
}

/// Serialize the document and replace the output file in one write.
///
/// The document is rendered to memory first, so a failed run never leaves a
/// partially written file behind.
pub fn write_json(path: &Path, doc: &OutputDocument) -> Result<()> {
    let body =
        serde_json::to_vec_pretty(doc).context("failed to serialize output document")?;
    fs::write(path, body)
        .with_context(|| format!("failed to write output file: {}", path.display()))?;
    Ok(())
}

fn now_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&well_known::Rfc3339)
        .unwrap_or_else(|_| String::from("1970-01-01T00:00:00Z"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ScanUrl;

    fn scan(id: &str, url: Option<&str>) -> ScanUrl {
        ScanUrl {
            scan_id: id.to_string(),
            target_url: url.map(str::to_string),
            status: None,
            scan_config_name: None,
            created_on: None,
            last_modified_on: None,
        }
    }

    #[test]
    fn build_document_counts_scans_and_missing_urls() {
        let doc = build_document(vec![
            AnalysisUrls {
                analysis_id: "1".into(),
                analysis_name: "App A".into(),
                application_name: None,
                scans: vec![scan("11", Some("http://a.example")), scan("12", None)],
            },
            AnalysisUrls {
                analysis_id: "2".into(),
                analysis_name: "App B".into(),
                application_name: None,
                scans: vec![scan("21", Some("http://b.example"))],
            },
        ]);
        assert_eq!(doc.total_analyses, 2);
        assert_eq!(doc.total_scans, 3);
        assert_eq!(doc.missing_url_count, 1);
        assert_eq!(doc.analyses[0].scans[1].target_url, None);
        assert!(!doc.generated_at.is_empty());
    }

    #[test]
    fn empty_run_builds_empty_document() {
        let doc = build_document(Vec::new());
        assert_eq!(doc.total_analyses, 0);
        assert_eq!(doc.total_scans, 0);
        assert_eq!(doc.missing_url_count, 0);
        assert!(doc.analyses.is_empty());
    }
}

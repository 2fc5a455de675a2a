use serde::{Deserialize, Deserializer, Serialize};

/// One Dynamic Analysis as returned by the configuration service.
#[derive(Debug, Clone, Deserialize)]
pub struct Analysis {
    #[serde(deserialize_with = "id_string")]
    pub analysis_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub application: Option<ApplicationRef>,
}

/// The application an analysis belongs to. Only the name is of interest.
#[derive(Debug, Clone, Deserialize)]
pub struct ApplicationRef {
    #[serde(default)]
    pub name: Option<String>,
}

/// One scan occurrence under an analysis. A scan may legitimately lack a
/// captured `target_url`.
#[derive(Debug, Clone, Deserialize)]
pub struct Scan {
    #[serde(deserialize_with = "id_string")]
    pub scan_id: String,
    #[serde(default)]
    pub target_url: Option<String>,
    #[serde(default)]
    pub scan_config_name: Option<String>,
    #[serde(default)]
    pub latest_occurrence_status: Option<ScanStatus>,
    #[serde(default)]
    pub created_on: Option<String>,
    #[serde(default)]
    pub last_modified_on: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScanStatus {
    #[serde(default)]
    pub status_type: Option<String>,
}

/// One page of the analyses collection (HAL envelope).
#[derive(Debug, Deserialize)]
pub struct AnalysesPage {
    #[serde(rename = "_embedded", default)]
    pub embedded: Option<AnalysesEmbedded>,
    #[serde(rename = "_links", default)]
    pub links: Links,
}

#[derive(Debug, Default, Deserialize)]
pub struct AnalysesEmbedded {
    #[serde(default)]
    pub analyses: Vec<Analysis>,
}

/// One page of an analysis's scans collection (HAL envelope).
#[derive(Debug, Deserialize)]
pub struct ScansPage {
    #[serde(rename = "_embedded", default)]
    pub embedded: Option<ScansEmbedded>,
    #[serde(rename = "_links", default)]
    pub links: Links,
}

#[derive(Debug, Default, Deserialize)]
pub struct ScansEmbedded {
    #[serde(default)]
    pub scans: Vec<Scan>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Links {
    #[serde(default)]
    pub next: Option<Link>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Link {
    pub href: String,
}

/// One scan's extracted record in the output document. `target_url` stays
/// `null` when the scan never captured one.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ScanUrl {
    pub scan_id: String,
    pub target_url: Option<String>,
    pub status: Option<String>,
    pub scan_config_name: Option<String>,
    pub created_on: Option<String>,
    pub last_modified_on: Option<String>,
}

impl From<Scan> for ScanUrl {
    fn from(scan: Scan) -> Self {
        Self {
            scan_id: scan.scan_id,
            target_url: scan.target_url.filter(|u| !u.is_empty()),
            status: scan.latest_occurrence_status.and_then(|s| s.status_type),
            scan_config_name: scan.scan_config_name,
            created_on: scan.created_on,
            last_modified_on: scan.last_modified_on,
        }
    }
}

/// All extracted records of one analysis, in the order the API returned them.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct AnalysisUrls {
    pub analysis_id: String,
    pub analysis_name: String,
    pub application_name: Option<String>,
    pub scans: Vec<ScanUrl>,
}

/// Aggregate document written to the output file. Analyses keep discovery
/// order; counters summarize the run.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct OutputDocument {
    pub generated_at: String,
    pub total_analyses: u64,
    pub total_scans: u64,
    pub missing_url_count: u64,
    pub analyses: Vec<AnalysisUrls>,
}

/// The service emits ids as JSON numbers in some responses and strings in
/// others; accept both and keep them opaque.
fn id_string<'de, D>(de: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum IdRepr {
        Num(i64),
        Str(String),
    }
    Ok(match IdRepr::deserialize(de)? {
        IdRepr::Num(n) => n.to_string(),
        IdRepr::Str(s) => s,
    })
}

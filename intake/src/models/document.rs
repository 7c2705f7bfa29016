use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// File-type tag derived from the uploaded filename's extension.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Pdf,
    Docx,
    Txt,
    Md,
    Jpg,
    Png,
    Mp3,
    Wav,
    M4a,
    Unknown,
}

impl FileType {
    /// The enumerated list of supported extensions, in the order the 400
    /// response for an unsupported upload should list them.
    pub const SUPPORTED: &'static [&'static str] =
        &["pdf", "docx", "txt", "md", "jpg", "png", "mp3", "wav", "m4a"];

    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "pdf" => Self::Pdf,
            "docx" => Self::Docx,
            "txt" => Self::Txt,
            "md" | "markdown" => Self::Md,
            "jpg" | "jpeg" => Self::Jpg,
            "png" => Self::Png,
            "mp3" => Self::Mp3,
            "wav" => Self::Wav,
            "m4a" => Self::M4a,
            _ => Self::Unknown,
        }
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, Self::Unknown)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Docx => "docx",
            Self::Txt => "txt",
            Self::Md => "md",
            Self::Jpg => "jpg",
            Self::Png => "png",
            Self::Mp3 => "mp3",
            Self::Wav => "wav",
            Self::M4a => "m4a",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for FileType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for FileType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_extension(s))
    }
}

/// Classification assigned by the Analyzer. Distinct from `FileType`, which
/// is derived mechanically from the extension before any content is read.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DocumentClassification {
    Motion,
    Response,
    Complaint,
    Order,
    Notice,
    Evidence,
    Research,
    #[default]
    Unknown,
}

impl std::fmt::Display for DocumentClassification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Motion => "motion",
            Self::Response => "response",
            Self::Complaint => "complaint",
            Self::Order => "order",
            Self::Notice => "notice",
            Self::Evidence => "evidence",
            Self::Research => "research",
            Self::Unknown => "unknown",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for DocumentClassification {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "motion" => Ok(Self::Motion),
            "response" => Ok(Self::Response),
            "complaint" => Ok(Self::Complaint),
            "order" => Ok(Self::Order),
            "notice" => Ok(Self::Notice),
            "evidence" => Ok(Self::Evidence),
            "research" => Ok(Self::Research),
            "unknown" => Ok(Self::Unknown),
            _ => Err(format!("unknown document classification: {s}")),
        }
    }
}

/// Pipeline stage a document currently occupies (spec.md §4.2's state
/// machine).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingStatus {
    #[default]
    Pending,
    Extracting,
    Analyzing,
    Indexing,
    Complete,
    Failed,
}

impl ProcessingStatus {
    /// Percent mapping from spec.md §6.2.
    pub fn percent(&self) -> u8 {
        match self {
            Self::Pending => 10,
            Self::Extracting => 30,
            Self::Analyzing => 60,
            Self::Indexing => 85,
            Self::Complete => 100,
            Self::Failed => 0,
        }
    }
}

impl std::fmt::Display for ProcessingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Extracting => "extracting",
            Self::Analyzing => "analyzing",
            Self::Indexing => "indexing",
            Self::Complete => "complete",
            Self::Failed => "failed",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for ProcessingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "extracting" => Ok(Self::Extracting),
            "analyzing" => Ok(Self::Analyzing),
            "indexing" => Ok(Self::Indexing),
            "complete" => Ok(Self::Complete),
            "failed" => Ok(Self::Failed),
            _ => Err(format!("unknown processing status: {s}")),
        }
    }
}

/// A single uploaded file tracked through the pipeline (spec.md §3).
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Document {
    pub id: String,
    pub case_id: String,
    pub filename: String,
    /// Sanitized folder slug: alphanumerics, dashes, underscores, max 100
    /// chars, never empty (falls back to "document").
    pub folder_name: String,
    pub document_type: Option<DocumentClassification>,
    pub file_type: FileType,
    pub page_count: Option<i64>,
    pub word_count: Option<i64>,
    pub processing_status: ProcessingStatus,
    pub has_text_extraction: bool,
    pub has_metadata: bool,
    pub rag_indexed: bool,
    pub file_search_store_id: Option<String>,
    pub retrieval_file_uri: Option<String>,
    pub blob_key: Option<String>,
    pub blob_bucket: Option<String>,
    pub blob_version_id: Option<String>,
    pub blob_uploaded_at: Option<DateTime<Utc>>,
    pub content_type: Option<String>,
    pub file_size_bytes: Option<i64>,
    pub error_message: Option<String>,
    pub uploaded_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
}

impl Document {
    pub fn new(id: String, case_id: String, filename: String, folder_name: String, file_type: FileType) -> Self {
        Self {
            id,
            case_id,
            filename,
            folder_name,
            document_type: None,
            file_type,
            page_count: None,
            word_count: None,
            processing_status: ProcessingStatus::Pending,
            has_text_extraction: false,
            has_metadata: false,
            rag_indexed: false,
            file_search_store_id: None,
            retrieval_file_uri: None,
            blob_key: None,
            blob_bucket: None,
            blob_version_id: None,
            blob_uploaded_at: None,
            content_type: None,
            file_size_bytes: None,
            error_message: None,
            uploaded_at: Utc::now(),
            processed_at: None,
        }
    }

    /// Invariant 5: `processing_status=complete` implies all three flags are
    /// set and `processed_at` is non-null.
    pub fn is_consistent_complete(&self) -> bool {
        if self.processing_status != ProcessingStatus::Complete {
            return true;
        }
        self.has_text_extraction && self.has_metadata && self.rag_indexed && self.processed_at.is_some()
    }
}

/// Sanitizes an uploaded filename into a folder slug: alphanumerics, dashes,
/// and underscores only, max 100 chars, falling back to "document" if the
/// result would otherwise be empty.
pub fn sanitize_folder_slug(filename: &str) -> String {
    let stem = filename.rsplit_once('.').map(|(s, _)| s).unwrap_or(filename);
    let slug: String = stem
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '-' })
        .collect();
    let trimmed: String = slug.trim_matches('-').chars().take(100).collect();
    if trimmed.is_empty() {
        "document".to_string()
    } else {
        trimmed
    }
}

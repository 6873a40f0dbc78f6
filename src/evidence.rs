//! Evidence files and per-file constraint checks
//!
//! Every upload substantiating a draft's claims carries a category tag. Per
//! file, checks run in strict order and stop at the first failure: minimum
//! size, then category maximum size, then mime/extension allow-list.
//! Aggregate count rules (minimum photo counts etc.) belong to the rule
//! engine and only run once every per-file check has passed.

use serde::{Deserialize, Serialize};

/// Minimum accepted file size (20KB); anything smaller is treated as a
/// broken or placeholder upload
pub const MIN_FILE_BYTES: u64 = 20 * 1024;

/// Maximum size for image evidence (10MB)
pub const MAX_IMAGE_BYTES: u64 = 10 * 1024 * 1024;

/// Maximum size for document and boundary evidence (20MB)
pub const MAX_DOCUMENT_BYTES: u64 = 20 * 1024 * 1024;

/// Size/type class of an evidence category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileClass {
    Image,
    Document,
    Boundary,
}

/// Evidence categories with their fixed multipart field names.
///
/// Single-valued categories appear at most once per submission; multi-valued
/// ones repeat under the same field name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceCategory {
    Photo,
    OnsetImage,
    SupportingDocument,
    SatelliteImage,
    LabReport,
    ResearchDocument,
    /// Local variant's single optional permit document
    ProjectPermit,
    /// Organization variant's permit documents
    PermitDocument,
    FundingDocument,
    BoundaryFile,
    LicenseDocument,
    LandOwnershipDocument,
    CommunityConsentDocument,
    Signature,
}

impl EvidenceCategory {
    /// Multipart field name, stable across client and server
    pub fn field_name(&self) -> &'static str {
        match self {
            EvidenceCategory::Photo => "photos",
            EvidenceCategory::OnsetImage => "onset_image",
            EvidenceCategory::SupportingDocument => "supporting_documents",
            EvidenceCategory::SatelliteImage => "satellite_images",
            EvidenceCategory::LabReport => "lab_reports",
            EvidenceCategory::ResearchDocument => "research_documents",
            EvidenceCategory::ProjectPermit => "permit_document",
            EvidenceCategory::PermitDocument => "permit_documents",
            EvidenceCategory::FundingDocument => "funding_documents",
            EvidenceCategory::BoundaryFile => "boundary_file",
            EvidenceCategory::LicenseDocument => "license_document",
            EvidenceCategory::LandOwnershipDocument => "land_ownership_document",
            EvidenceCategory::CommunityConsentDocument => "community_consent_document",
            EvidenceCategory::Signature => "signature",
        }
    }

    /// Resolve a multipart field name back to its category
    pub fn from_field_name(name: &str) -> Option<EvidenceCategory> {
        ALL_CATEGORIES.iter().copied().find(|c| c.field_name() == name)
    }

    /// Whether the field repeats in the payload
    pub fn is_multi(&self) -> bool {
        matches!(
            self,
            EvidenceCategory::Photo
                | EvidenceCategory::SupportingDocument
                | EvidenceCategory::SatelliteImage
                | EvidenceCategory::LabReport
                | EvidenceCategory::ResearchDocument
                | EvidenceCategory::PermitDocument
                | EvidenceCategory::FundingDocument
        )
    }

    pub fn class(&self) -> FileClass {
        match self {
            EvidenceCategory::Photo
            | EvidenceCategory::OnsetImage
            | EvidenceCategory::SatelliteImage
            | EvidenceCategory::Signature => FileClass::Image,
            EvidenceCategory::BoundaryFile => FileClass::Boundary,
            _ => FileClass::Document,
        }
    }

    pub fn max_bytes(&self) -> u64 {
        match self.class() {
            FileClass::Image => MAX_IMAGE_BYTES,
            FileClass::Document | FileClass::Boundary => MAX_DOCUMENT_BYTES,
        }
    }

    fn allowed_mimes(&self) -> &'static [&'static str] {
        match self.class() {
            FileClass::Image => match self {
                // Declared mime for tiff is unreliable across capture
                // sources; the extension check below compensates.
                EvidenceCategory::SatelliteImage => {
                    &["image/tiff", "image/jpeg", "image/png"]
                }
                _ => &["image/jpeg", "image/png", "image/webp"],
            },
            FileClass::Document => &[
                "application/pdf",
                "application/msword",
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
                "image/jpeg",
                "image/png",
            ],
            FileClass::Boundary => &[
                "application/geo+json",
                "application/json",
                "application/vnd.google-earth.kml+xml",
                "application/vnd.google-earth.kmz",
                "application/zip",
            ],
        }
    }

    fn allowed_extensions(&self) -> &'static [&'static str] {
        match self.class() {
            FileClass::Image => match self {
                EvidenceCategory::SatelliteImage => &["tiff", "tif", "jpg", "jpeg", "png"],
                _ => &["jpg", "jpeg", "png", "webp"],
            },
            FileClass::Document => &["pdf", "doc", "docx", "jpg", "jpeg", "png"],
            FileClass::Boundary => &["geojson", "json", "kml", "kmz", "zip"],
        }
    }
}

/// All categories, used for field-name resolution
pub const ALL_CATEGORIES: [EvidenceCategory; 14] = [
    EvidenceCategory::Photo,
    EvidenceCategory::OnsetImage,
    EvidenceCategory::SupportingDocument,
    EvidenceCategory::SatelliteImage,
    EvidenceCategory::LabReport,
    EvidenceCategory::ResearchDocument,
    EvidenceCategory::ProjectPermit,
    EvidenceCategory::PermitDocument,
    EvidenceCategory::FundingDocument,
    EvidenceCategory::BoundaryFile,
    EvidenceCategory::LicenseDocument,
    EvidenceCategory::LandOwnershipDocument,
    EvidenceCategory::CommunityConsentDocument,
    EvidenceCategory::Signature,
];

/// An uploaded evidence file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceFile {
    pub category: EvidenceCategory,
    pub name: String,
    /// Declared size; checked before the payload is buffered
    pub size_bytes: u64,
    pub mime: String,
    #[serde(skip)]
    pub bytes: Vec<u8>,
}

impl EvidenceFile {
    pub fn new(
        category: EvidenceCategory,
        name: impl Into<String>,
        mime: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            category,
            name: name.into(),
            size_bytes: bytes.len() as u64,
            mime: mime.into(),
            bytes,
        }
    }

    /// Lowercased filename extension, if any
    pub fn extension(&self) -> Option<String> {
        let (stem, ext) = self.name.rsplit_once('.')?;
        if stem.is_empty() || ext.is_empty() {
            return None;
        }
        Some(ext.to_ascii_lowercase())
    }
}

/// First-matching cause of a per-file or aggregate evidence failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintCause {
    TooSmall,
    TooLarge,
    WrongType,
    InsufficientCount,
}

/// A per-file constraint failure, keyed by the category's field name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceViolation {
    pub field_key: String,
    pub file_name: String,
    pub cause: ConstraintCause,
}

impl EvidenceViolation {
    pub fn message(&self) -> String {
        match self.cause {
            ConstraintCause::TooSmall => {
                format!("{}: file is smaller than 20KB", self.file_name)
            }
            ConstraintCause::TooLarge => {
                format!("{}: file exceeds the size limit for this category", self.file_name)
            }
            ConstraintCause::WrongType => {
                format!("{}: file type is not accepted for this category", self.file_name)
            }
            ConstraintCause::InsufficientCount => {
                format!("{}: not enough files of this category", self.file_name)
            }
        }
    }
}

/// Check one file. Short-circuits at the first failing rule:
/// minimum size, then category maximum, then type allow-list.
pub fn check_file(file: &EvidenceFile) -> Result<(), EvidenceViolation> {
    let violation = |cause| EvidenceViolation {
        field_key: file.category.field_name().to_string(),
        file_name: file.name.clone(),
        cause,
    };

    // Drawn signature exports are tiny; the minimum applies to evidence
    // captures, not the signature slot.
    if file.size_bytes < MIN_FILE_BYTES && file.category != EvidenceCategory::Signature {
        return Err(violation(ConstraintCause::TooSmall));
    }
    if file.size_bytes > file.category.max_bytes() {
        return Err(violation(ConstraintCause::TooLarge));
    }

    let mime = file.mime.to_ascii_lowercase();
    let mime_ok = file.category.allowed_mimes().contains(&mime.as_str());
    let ext_ok = file
        .extension()
        .map(|e| file.category.allowed_extensions().contains(&e.as_str()))
        .unwrap_or(false);

    let type_ok = if file.category == EvidenceCategory::SatelliteImage {
        // Either source of truth is enough for satellite captures.
        mime_ok || ext_ok
    } else {
        mime_ok && ext_ok
    };

    if !type_ok {
        return Err(violation(ConstraintCause::WrongType));
    }

    Ok(())
}

/// All files attached to the active draft, in upload order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EvidenceBundle {
    files: Vec<EvidenceFile>,
}

impl EvidenceBundle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a file. Single-valued categories replace any previous file.
    pub fn attach(&mut self, file: EvidenceFile) {
        if !file.category.is_multi() {
            self.files.retain(|f| f.category != file.category);
        }
        self.files.push(file);
    }

    pub fn remove(&mut self, category: EvidenceCategory, name: &str) {
        self.files
            .retain(|f| !(f.category == category && f.name == name));
    }

    pub fn files(&self) -> &[EvidenceFile] {
        &self.files
    }

    pub fn files_for(&self, category: EvidenceCategory) -> Vec<&EvidenceFile> {
        self.files.iter().filter(|f| f.category == category).collect()
    }

    pub fn first_for(&self, category: EvidenceCategory) -> Option<&EvidenceFile> {
        self.files.iter().find(|f| f.category == category)
    }

    pub fn count(&self, category: EvidenceCategory) -> usize {
        self.files.iter().filter(|f| f.category == category).count()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Run per-file checks over every attached file, in upload order
    pub fn check_all(&self) -> Vec<EvidenceViolation> {
        self.files
            .iter()
            .filter_map(|f| check_file(f).err())
            .collect()
    }
}

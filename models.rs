use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

pub fn generate_id() -> String {
    Uuid::new_v4().to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MediaStatus {
    #[default]
    Pending,
    Uploading,
    Uploaded,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FileMeta {
    pub name: String,
    pub mime_type: String,
    pub size_bytes: u64,
}

/// One picked file attached to a cover slot or a stop. `local_path` is the
/// locally-resolvable original; it is transient and never serialized.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MediaItem {
    pub id: String,
    #[serde(skip)]
    pub local_path: Option<PathBuf>,
    pub thumbnail: Option<String>,
    pub remote_url: Option<String>,
    pub status: MediaStatus,
    pub meta: FileMeta,
}

impl MediaItem {
    pub fn new(meta: FileMeta, local_path: PathBuf) -> Self {
        Self {
            id: generate_id(),
            local_path: Some(local_path),
            thumbnail: None,
            remote_url: None,
            status: MediaStatus::Pending,
            meta,
        }
    }

    /// Drop the reference to the original file. Removal from a container is
    /// the only destruction path, and it must go through here.
    pub fn release_local(&mut self) {
        self.local_path = None;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StopKind {
    Activity,
    Attraction,
    Accommodation,
}

impl StopKind {
    pub fn label(self) -> &'static str {
        match self {
            StopKind::Activity => "Activity",
            StopKind::Attraction => "Attraction",
            StopKind::Accommodation => "Accommodation",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stop {
    pub id: String,
    pub kind: StopKind,
    pub title: String,
    pub description: String,
    pub media: Vec<MediaItem>,
}

impl Stop {
    pub fn new(kind: StopKind) -> Self {
        Self {
            id: generate_id(),
            kind,
            title: String::new(),
            description: String::new(),
            media: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Day {
    pub id: String,
    pub number: u32,
    pub title: String,
    pub stops: Vec<Stop>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Trip {
    pub title: String,
    pub description: String,
    pub location: String,
    pub cover_images: Vec<MediaItem>,
}

pub const COVER_IMAGE_CAP: usize = 10;

/// Which container owns a queued media item. The literal string `cover` is
/// what the upload webhook expects in the `stopId` field for cover items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaOwner {
    Cover,
    Stop(String),
}

impl MediaOwner {
    pub fn as_field(&self) -> &str {
        match self {
            MediaOwner::Cover => "cover",
            MediaOwner::Stop(id) => id,
        }
    }
}

/// A reference pair, never a copy; the authoritative item lives in the trip
/// tree and is re-resolved by id when a worker claims the entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueEntry {
    pub owner: MediaOwner,
    pub media_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct TripStats {
    pub total_days: usize,
    pub total_stops: usize,
    pub total_media: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Consent {
    pub ownership: bool,
    pub license: bool,
    pub age: bool,
    pub people: bool,
}

impl Consent {
    pub fn all_given(&self) -> bool {
        self.ownership && self.license && self.age && self.people
    }
}

// ===== Saved form (export/import round trip) =====

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedTrip {
    pub trip: SavedTripMeta,
    pub days: Vec<SavedDay>,
    #[serde(default)]
    pub consent: Consent,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SavedTripMeta {
    pub title: String,
    pub description: String,
    pub location: String,
    pub cover_images: Vec<SavedMedia>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedDay {
    pub id: String,
    pub number: u32,
    pub title: String,
    pub stops: Vec<SavedStop>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedStop {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: StopKind,
    pub title: String,
    pub description: String,
    pub media: Vec<SavedMedia>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SavedMedia {
    pub id: String,
    pub url: Option<String>,
    pub remote_url: Option<String>,
    pub file_name: Option<String>,
    pub file_type: Option<String>,
    pub file_size: Option<u64>,
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub status: MediaStatus,
}

// ===== Final submission payload =====

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submitter {
    pub name: String,
    pub email: String,
    pub id: String,
}

impl Default for Submitter {
    fn default() -> Self {
        Self {
            name: "Anonymous".into(),
            email: String::new(),
            id: String::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionPayload {
    pub user: Submitter,
    pub trip: SubmissionTrip,
    pub submitted_at: DateTime<Utc>,
    pub days: Vec<SubmissionDay>,
    pub preferences: Preferences,
    pub consent: SubmissionConsent,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionTrip {
    pub title: String,
    pub description: String,
    pub location: String,
    pub cover_images: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionDay {
    pub id: String,
    pub number: u32,
    pub title: String,
    pub stops: Vec<SubmissionStop>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionStop {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: StopKind,
    pub title: String,
    pub description: String,
    pub media: Vec<SubmissionMedia>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionMedia {
    pub id: String,
    pub url: String,
    pub file_name: String,
    pub file_type: String,
    pub file_size: u64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    pub notify_on_launch: bool,
    pub interested_in_travel_architect: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionConsent {
    pub ownership_confirmed: bool,
    pub license_agreed: bool,
    pub age_confirmed: bool,
    pub people_consent_given: bool,
    pub consent_timestamp: DateTime<Utc>,
}

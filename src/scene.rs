//! Scene records as served by the Constellations API
//!
//! A `Scene` is immutable once fetched. The cache owns every record behind an
//! `Arc`; history nodes and the forward buffer refer to scenes by `SceneId`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque scene identifier assigned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SceneId(String);

impl SceneId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SceneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl From<&str> for SceneId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for SceneId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Public account summary embedded in each scene
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandleSummary {
    pub handle: String,
    pub display_name: String,
}

/// Pointing direction and region of interest for a scene
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceDetails {
    pub ra_rad: f64,
    pub dec_rad: f64,
    #[serde(default)]
    pub roll_rad: Option<f64>,
    pub roi_height_deg: f64,
    pub roi_aspect_ratio: f64,
}

/// Tiling parameters the rendering engine needs for an imageset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageWwt {
    pub base_degrees_per_tile: f64,
    pub bottoms_up: bool,
    pub center_x: f64,
    pub center_y: f64,
    pub file_type: String,
    pub offset_x: f64,
    pub offset_y: f64,
    pub projection: String,
    pub quad_tree_map: String,
    pub rotation: f64,
    pub tile_levels: u32,
    pub width_factor: f64,
    pub thumbnail_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageStorage {
    #[serde(default)]
    pub legacy_url_template: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImagePermissions {
    pub copyright: String,
    pub license: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credits: Option<String>,
}

/// Everything needed to display one image layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageDisplayInfo {
    pub id: String,
    pub wwt: ImageWwt,
    pub storage: ImageStorage,
    pub permissions: ImagePermissions,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt_text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneImageLayer {
    pub image: ImageDisplayInfo,
    pub opacity: f64,
}

/// Image layers with their image records inlined
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SceneContent {
    #[serde(default)]
    pub image_layers: Option<Vec<SceneImageLayer>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<ImageDisplayInfo>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ScenePreviews {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
}

/// Full scene record (`GET /scene/:id` and timeline entries)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    pub id: SceneId,
    pub handle_id: String,
    pub handle: HandleSummary,
    pub creation_date: DateTime<Utc>,
    pub likes: u64,
    pub impressions: u64,
    pub clicks: u64,
    pub shares: u64,
    pub place: PlaceDetails,
    pub content: SceneContent,
    pub text: String,
    /// Whether the current viewer has liked this scene
    pub liked: bool,
    #[serde(default)]
    pub outgoing_url: Option<String>,
    #[serde(default)]
    pub previews: ScenePreviews,
    pub published: bool,
}

impl Scene {
    /// Project the parts of the scene the sky view needs.
    pub fn display_info(&self) -> SceneDisplayInfo {
        SceneDisplayInfo {
            id: self.id.clone(),
            place: self.place.clone(),
            content: self.content.clone(),
        }
    }
}

/// What the sky view must show for a scene
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneDisplayInfo {
    pub id: SceneId,
    pub place: PlaceDetails,
    pub content: SceneContent,
}

/// Timeline page envelope: `{ "results": [...] }`
#[derive(Debug, Clone, Deserialize)]
pub struct TimelineResponse {
    pub results: Vec<Scene>,
}

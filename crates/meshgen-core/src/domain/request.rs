//! Generation request types.
//!
//! A request is validated once at construction and then consumed by a
//! single generation session.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Camera view an input image was captured from.
///
/// The declaration order is the fallback order used when a multi-view input
/// has no front image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewTag {
    Front,
    Back,
    Left,
    Right,
    Top,
    Bottom,
}

impl ViewTag {
    /// All view tags in fallback order.
    pub const ALL: [Self; 6] = [
        Self::Front,
        Self::Back,
        Self::Left,
        Self::Right,
        Self::Top,
        Self::Bottom,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Front => "front",
            Self::Back => "back",
            Self::Left => "left",
            Self::Right => "right",
            Self::Top => "top",
            Self::Bottom => "bottom",
        }
    }
}

impl fmt::Display for ViewTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ViewTag {
    type Err = RequestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|tag| tag.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| RequestError::UnknownView(s.to_string()))
    }
}

/// Image input for a generation: one picture, or up to six tagged views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum ImageInput {
    Single(PathBuf),
    MultiView(BTreeMap<ViewTag, PathBuf>),
}

impl ImageInput {
    /// Build a multi-view input from `(tag, path)` pairs.
    ///
    /// A tag may appear only once.
    pub fn multi_view(
        views: impl IntoIterator<Item = (ViewTag, PathBuf)>,
    ) -> Result<Self, RequestError> {
        let mut map = BTreeMap::new();
        for (tag, path) in views {
            if map.insert(tag, path).is_some() {
                return Err(RequestError::DuplicateView(tag));
            }
        }
        Ok(Self::MultiView(map))
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Single(path) => path.as_os_str().is_empty(),
            Self::MultiView(views) => views.is_empty(),
        }
    }

    /// The image handed to the single-image pipeline.
    ///
    /// For multi-view input this is the front view, or the first present view
    /// in [`ViewTag::ALL`] order.
    pub fn primary(&self) -> Option<&Path> {
        match self {
            Self::Single(path) if path.as_os_str().is_empty() => None,
            Self::Single(path) => Some(path.as_path()),
            Self::MultiView(views) => ViewTag::ALL
                .iter()
                .find_map(|tag| views.get(tag))
                .map(PathBuf::as_path),
        }
    }
}

/// Generation model selectable by the user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ModelId {
    #[default]
    InstantMesh,
    Hunyuan3dV2,
}

impl ModelId {
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::InstantMesh => "InstantMesh",
            Self::Hunyuan3dV2 => "Hunyuan3D-V2",
        }
    }

    /// Whether an inference pipeline exists for this model.
    pub const fn has_pipeline(self) -> bool {
        matches!(self, Self::InstantMesh)
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for ModelId {
    type Err = RequestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(char::is_ascii_alphanumeric)
            .collect::<String>()
            .to_ascii_lowercase();
        match normalized.as_str() {
            "instantmesh" => Ok(Self::InstantMesh),
            "hunyuan3dv2" => Ok(Self::Hunyuan3dV2),
            _ => Err(RequestError::UnknownModel(s.to_string())),
        }
    }
}

/// Errors raised while building a request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error("Provide a text prompt or an image")]
    EmptyInput,

    #[error("View '{0}' was given more than once")]
    DuplicateView(ViewTag),

    #[error("Unknown view '{0}' (expected front, back, left, right, top or bottom)")]
    UnknownView(String),

    #[error("Unknown model '{0}'")]
    UnknownModel(String),
}

/// A user's request for one mesh generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Free-text prompt. May be empty when an image is supplied.
    pub prompt: String,
    /// Image input, absent for prompt-only requests.
    pub image: Option<ImageInput>,
    /// Model to run.
    pub model: ModelId,
    /// Trade speed for memory (FP16 / offloading).
    pub low_resource: bool,
}

impl GenerationRequest {
    /// Create a request, rejecting one with neither prompt nor image.
    pub fn new(
        prompt: impl Into<String>,
        image: Option<ImageInput>,
        model: ModelId,
        low_resource: bool,
    ) -> Result<Self, RequestError> {
        let prompt = prompt.into();
        let image = image.filter(|input| !input.is_empty());
        if prompt.trim().is_empty() && image.is_none() {
            return Err(RequestError::EmptyInput);
        }
        Ok(Self {
            prompt,
            image,
            model,
            low_resource,
        })
    }

    /// Shorthand for a single-image request with the default model.
    pub fn from_image(path: impl Into<PathBuf>) -> Result<Self, RequestError> {
        Self::new(
            String::new(),
            Some(ImageInput::Single(path.into())),
            ModelId::default(),
            false,
        )
    }

    /// The image the pipeline will consume, if any.
    pub fn primary_image(&self) -> Option<&Path> {
        self.image.as_ref().and_then(ImageInput::primary)
    }
}

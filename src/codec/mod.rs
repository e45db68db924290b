//! Snapshot codec - turns a [`Scene`] into a portable [`Snapshot`] and back.
//!
//! Serialization keeps every property needed to rebuild the document
//! exactly. Custom element metadata is filtered through an allow-list so
//! only the fields the caller cares about travel with history and saves.
//! Decoding validates the whole scene before anything reaches a document,
//! so a bad snapshot never leaves a half-replaced canvas behind.

mod error;
mod snapshot;
mod transform;

use std::collections::{BTreeSet, HashSet};

use crate::document::{Document, Element, ElementKind, Reconstruction, Scene, SCENE_VERSION};

pub use error::CodecError;
pub use snapshot::Snapshot;
pub use transform::{Base64Transform, Lz4Transform, PlainTransform, TextTransform, TransformKind};

/// Serializes and restores whole-document snapshots.
#[derive(Debug, Clone, Default)]
pub struct SnapshotCodec {
    metadata_fields: BTreeSet<String>,
}

impl SnapshotCodec {
    /// A codec that keeps no custom metadata (ids and selectability are
    /// always kept).
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep the named custom metadata fields when serializing.
    pub fn with_metadata_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.metadata_fields
            .extend(fields.into_iter().map(Into::into));
        self
    }

    pub fn metadata_fields(&self) -> impl Iterator<Item = &str> {
        self.metadata_fields.iter().map(String::as_str)
    }

    /// Serialize a scene. Pure: the input is not modified.
    pub fn serialize(&self, scene: &Scene) -> Result<Snapshot, CodecError> {
        validate(scene)?;
        let mut filtered = scene.clone();
        retain_metadata(&mut filtered.elements, &self.metadata_fields);
        serde_json::to_string(&filtered)
            .map(Snapshot::from)
            .map_err(|e| CodecError::Serialize(e.to_string()))
    }

    /// Parse and validate a snapshot.
    pub fn deserialize(&self, snapshot: &Snapshot) -> Result<Scene, CodecError> {
        let scene: Scene = serde_json::from_str(snapshot.as_str())
            .map_err(|e| CodecError::Malformed(e.to_string()))?;
        validate(&scene)?;
        Ok(scene)
    }

    /// Replace the document's state with the one in `snapshot`.
    ///
    /// The snapshot is fully decoded before the document is asked to do
    /// anything; decode failures leave it untouched.
    pub fn restore<D: Document + ?Sized>(
        &self,
        document: &D,
        snapshot: &Snapshot,
    ) -> Result<Reconstruction, CodecError> {
        let scene = self.deserialize(snapshot)?;
        Ok(document.replace(scene))
    }
}

fn retain_metadata(elements: &mut [Element], allowed: &BTreeSet<String>) {
    for element in elements {
        element.metadata.retain(|key, _| allowed.contains(key));
        if let ElementKind::Group { children } = &mut element.kind {
            retain_metadata(children, allowed);
        }
    }
}

fn validate(scene: &Scene) -> Result<(), CodecError> {
    if scene.version > SCENE_VERSION {
        return Err(CodecError::UnsupportedVersion {
            found: scene.version,
            supported: SCENE_VERSION,
        });
    }
    if !is_extent(scene.width) || !is_extent(scene.height) {
        return Err(CodecError::InvalidScene(format!(
            "bad canvas size {}x{}",
            scene.width, scene.height
        )));
    }

    let mut seen = HashSet::new();
    let mut problem = None;
    scene.walk(&mut |element| {
        if problem.is_some() {
            return;
        }
        problem = check_element(element, &mut seen);
    });
    match problem {
        Some(message) => Err(CodecError::InvalidScene(message)),
        None => Ok(()),
    }
}

fn check_element<'a>(element: &'a Element, seen: &mut HashSet<&'a str>) -> Option<String> {
    if element.id.is_empty() {
        return Some("element with empty id".into());
    }
    if !seen.insert(element.id.as_str()) {
        return Some(format!("duplicate element id {}", element.id));
    }
    let numbers = [
        element.left,
        element.top,
        element.angle,
        element.scale_x,
        element.scale_y,
        element.opacity,
    ];
    if numbers.iter().any(|n| !n.is_finite()) {
        return Some(format!("non-finite geometry on {}", element.id));
    }
    if let Some(field) = non_finite_kind_field(&element.kind) {
        return Some(format!(
            "non-finite {} on {} {}",
            field,
            element.kind.name(),
            element.id
        ));
    }
    if let ElementKind::Image { src, .. } = &element.kind {
        if src.is_empty() {
            return Some(format!("image {} has no source", element.id));
        }
    }
    None
}

/// Name of the first variant field that JSON cannot carry, if any.
fn non_finite_kind_field(kind: &ElementKind) -> Option<&'static str> {
    let fields: Vec<(&'static str, f64)> = match kind {
        ElementKind::Image { width, height, .. } => vec![("width", *width), ("height", *height)],
        ElementKind::Rect {
            width,
            height,
            style,
        } => vec![
            ("width", *width),
            ("height", *height),
            ("stroke_width", style.stroke_width),
        ],
        ElementKind::Ellipse { rx, ry, style } => vec![
            ("rx", *rx),
            ("ry", *ry),
            ("stroke_width", style.stroke_width),
        ],
        ElementKind::Text {
            font_size, style, ..
        } => vec![
            ("font_size", *font_size),
            ("stroke_width", style.stroke_width),
        ],
        ElementKind::Path { style, .. } => vec![("stroke_width", style.stroke_width)],
        ElementKind::Group { .. } => Vec::new(),
    };
    fields
        .into_iter()
        .find(|(_, value)| !value.is_finite())
        .map(|(name, _)| name)
}

fn is_extent(value: f64) -> bool {
    value.is_finite() && value >= 0.0
}

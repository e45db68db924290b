use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Current scene format version written by the codec.
pub const SCENE_VERSION: u32 = 1;

/// Full structured state of an editable canvas.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    pub version: u32,
    pub width: f64,
    pub height: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
    #[serde(default)]
    pub elements: Vec<Element>,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new(800.0, 600.0)
    }
}

impl Scene {
    pub fn new(width: f64, height: f64) -> Self {
        Scene {
            version: SCENE_VERSION,
            width,
            height,
            background: None,
            elements: Vec::new(),
        }
    }

    /// Builder-style helper for adding a top-level element.
    pub fn with_element(mut self, element: Element) -> Self {
        self.elements.push(element);
        self
    }

    pub fn with_background(mut self, background: impl Into<String>) -> Self {
        self.background = Some(background.into());
        self
    }

    /// Find an element by id, searching inside groups.
    pub fn find(&self, id: &str) -> Option<&Element> {
        find_in(&self.elements, id)
    }

    /// Mutable lookup by id, searching inside groups.
    pub fn find_mut(&mut self, id: &str) -> Option<&mut Element> {
        find_in_mut(&mut self.elements, id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.find(id).is_some()
    }

    /// Remove an element by id, searching inside groups.
    pub fn remove(&mut self, id: &str) -> Option<Element> {
        remove_from(&mut self.elements, id)
    }

    /// Visit every element depth-first, groups before their children.
    pub fn walk<'a>(&'a self, visit: &mut dyn FnMut(&'a Element)) {
        walk_in(&self.elements, visit);
    }

    /// Total element count, including group children.
    pub fn element_count(&self) -> usize {
        let mut count = 0;
        self.walk(&mut |_| count += 1);
        count
    }
}

/// A single element on the canvas.
///
/// `id` and `selectable` are always persisted. `metadata` carries custom
/// properties; the codec keeps only the keys on its allow-list.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub id: String,
    #[serde(default = "default_true")]
    pub selectable: bool,
    #[serde(default)]
    pub left: f64,
    #[serde(default)]
    pub top: f64,
    #[serde(default)]
    pub angle: f64,
    #[serde(default = "default_one")]
    pub scale_x: f64,
    #[serde(default = "default_one")]
    pub scale_y: f64,
    #[serde(default = "default_one")]
    pub opacity: f64,
    #[serde(default = "default_true")]
    pub visible: bool,
    pub kind: ElementKind,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, Value>,
}

impl Element {
    pub fn new(id: impl Into<String>, kind: ElementKind) -> Self {
        Element {
            id: id.into(),
            selectable: true,
            left: 0.0,
            top: 0.0,
            angle: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            opacity: 1.0,
            visible: true,
            kind,
            metadata: BTreeMap::new(),
        }
    }

    pub fn image(id: impl Into<String>, src: impl Into<String>, width: f64, height: f64) -> Self {
        Self::new(
            id,
            ElementKind::Image {
                src: src.into(),
                width,
                height,
            },
        )
    }

    pub fn rect(id: impl Into<String>, width: f64, height: f64) -> Self {
        Self::new(
            id,
            ElementKind::Rect {
                width,
                height,
                style: Style::default(),
            },
        )
    }

    pub fn ellipse(id: impl Into<String>, rx: f64, ry: f64) -> Self {
        Self::new(
            id,
            ElementKind::Ellipse {
                rx,
                ry,
                style: Style::default(),
            },
        )
    }

    pub fn text(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(
            id,
            ElementKind::Text {
                text: text.into(),
                font_family: "sans-serif".into(),
                font_size: 16.0,
                style: Style::default(),
            },
        )
    }

    pub fn at(mut self, left: f64, top: f64) -> Self {
        self.left = left;
        self.top = top;
        self
    }

    /// Mark the element as non-interactive.
    pub fn locked(mut self) -> Self {
        self.selectable = false;
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn children(&self) -> &[Element] {
        match &self.kind {
            ElementKind::Group { children } => children,
            _ => &[],
        }
    }
}

/// Closed set of element variants; each carries only its own geometry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ElementKind {
    Image {
        src: String,
        width: f64,
        height: f64,
    },
    Rect {
        width: f64,
        height: f64,
        #[serde(default)]
        style: Style,
    },
    Ellipse {
        rx: f64,
        ry: f64,
        #[serde(default)]
        style: Style,
    },
    Text {
        text: String,
        font_family: String,
        font_size: f64,
        #[serde(default)]
        style: Style,
    },
    Path {
        data: String,
        #[serde(default)]
        style: Style,
    },
    Group {
        #[serde(default)]
        children: Vec<Element>,
    },
}

impl ElementKind {
    pub fn name(&self) -> &'static str {
        match self {
            ElementKind::Image { .. } => "image",
            ElementKind::Rect { .. } => "rect",
            ElementKind::Ellipse { .. } => "ellipse",
            ElementKind::Text { .. } => "text",
            ElementKind::Path { .. } => "path",
            ElementKind::Group { .. } => "group",
        }
    }
}

/// Fill and stroke paint for vector elements.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Style {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke: Option<String>,
    #[serde(default)]
    pub stroke_width: f64,
}

fn default_true() -> bool {
    true
}

fn default_one() -> f64 {
    1.0
}

fn find_in<'a>(elements: &'a [Element], id: &str) -> Option<&'a Element> {
    for element in elements {
        if element.id == id {
            return Some(element);
        }
        if let Some(found) = find_in(element.children(), id) {
            return Some(found);
        }
    }
    None
}

fn find_in_mut<'a>(elements: &'a mut [Element], id: &str) -> Option<&'a mut Element> {
    for element in elements.iter_mut() {
        if element.id == id {
            return Some(element);
        }
        if let ElementKind::Group { children } = &mut element.kind {
            if let Some(found) = find_in_mut(children, id) {
                return Some(found);
            }
        }
    }
    None
}

fn remove_from(elements: &mut Vec<Element>, id: &str) -> Option<Element> {
    if let Some(index) = elements.iter().position(|e| e.id == id) {
        return Some(elements.remove(index));
    }
    for element in elements.iter_mut() {
        if let ElementKind::Group { children } = &mut element.kind {
            if let Some(removed) = remove_from(children, id) {
                return Some(removed);
            }
        }
    }
    None
}

fn walk_in<'a>(elements: &'a [Element], visit: &mut dyn FnMut(&'a Element)) {
    for element in elements {
        visit(element);
        walk_in(element.children(), visit);
    }
}

//! Detectable class catalog.
//!
//! The catalog is built once and shared read-only by every decode call. Class
//! indices are positional, so a catalog built from `N` labels always covers
//! exactly `0..N`.

use crate::util::{GridYoloError, GridYoloResult};
use std::sync::Arc;

/// Labels of the Pascal VOC 2007 classes, in the order Tiny-YOLO-v2 VOC emits them.
pub const VOC_LABELS: [&str; 20] = [
    "aeroplane",
    "bicycle",
    "bird",
    "boat",
    "bottle",
    "bus",
    "car",
    "cat",
    "chair",
    "cow",
    "diningtable",
    "dog",
    "horse",
    "motorbike",
    "person",
    "pottedplant",
    "sheep",
    "sofa",
    "train",
    "tvmonitor",
];

/// A class the detector can report.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct DetectableClass {
    index: usize,
    label: Arc<str>,
}

impl DetectableClass {
    /// Position of the class in the model's class logits.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Human-readable label.
    pub fn label(&self) -> &str {
        &self.label
    }
}

/// Ordered, index-addressable list of detectable classes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClassCatalog {
    classes: Vec<DetectableClass>,
}

impl ClassCatalog {
    /// Builds a catalog where the `i`-th label gets class index `i`.
    pub fn from_labels<I, S>(labels: I) -> GridYoloResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let classes: Vec<DetectableClass> = labels
            .into_iter()
            .enumerate()
            .map(|(index, label)| DetectableClass {
                index,
                label: Arc::from(label.as_ref()),
            })
            .collect();
        if classes.is_empty() {
            return Err(GridYoloError::InvalidConfiguration(
                "class catalog must contain at least one label",
            ));
        }
        Ok(Self { classes })
    }

    /// The 20-class Pascal VOC catalog.
    pub fn voc() -> Self {
        Self {
            classes: VOC_LABELS
                .iter()
                .enumerate()
                .map(|(index, label)| DetectableClass {
                    index,
                    label: Arc::from(*label),
                })
                .collect(),
        }
    }

    /// Number of classes.
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Returns true when the catalog has no classes.
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Returns the class with the given index.
    pub fn get(&self, index: usize) -> Option<&DetectableClass> {
        self.classes.get(index)
    }

    /// Finds a class by its label.
    pub fn lookup(&self, label: &str) -> Option<&DetectableClass> {
        self.classes.iter().find(|c| c.label() == label)
    }

    /// Iterates classes in index order.
    pub fn iter(&self) -> impl Iterator<Item = &DetectableClass> {
        self.classes.iter()
    }
}

impl Default for ClassCatalog {
    fn default() -> Self {
        Self::voc()
    }
}

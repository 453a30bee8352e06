//! Object detector output contracts.

use serde::{Deserialize, Serialize};

/// One detected object instance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Detector class id (COCO numbering).
    pub class_id: u32,
    /// Detection confidence [0.0, 1.0].
    pub confidence: f32,
}

impl Detection {
    pub const fn new(class_id: u32, confidence: f32) -> Self {
        Self {
            class_id,
            confidence,
        }
    }
}

/// Object classes the pipeline cares about. Every other class id is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ObjectClass {
    #[serde(rename = "person")]
    Person,
    #[serde(rename = "cell phone")]
    CellPhone,
    #[serde(rename = "laptop")]
    Laptop,
    #[serde(rename = "book")]
    Book,
    #[serde(rename = "tv")]
    Tv,
}

impl ObjectClass {
    /// Map a COCO class id through the fixed registry.
    pub fn from_class_id(class_id: u32) -> Option<Self> {
        match class_id {
            0 => Some(Self::Person),
            67 => Some(Self::CellPhone),
            63 => Some(Self::Laptop),
            73 => Some(Self::Book),
            62 => Some(Self::Tv),
            _ => None,
        }
    }

    /// Semantic label as reported in summaries.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Person => "person",
            Self::CellPhone => "cell phone",
            Self::Laptop => "laptop",
            Self::Book => "book",
            Self::Tv => "tv",
        }
    }
}

impl std::fmt::Display for ObjectClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

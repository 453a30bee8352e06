//! Per-frame object tally.

use std::collections::BTreeSet;

use proctor_session_model::{Detection, ObjectClass};

/// What the object detector saw in one sampled frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectTally {
    /// Person instances in the frame.
    pub persons: u32,
    /// Phone instances in the frame. Each instance counts separately.
    pub phones: u32,
    /// Other registered classes (laptop, book, tv).
    pub forbidden: BTreeSet<ObjectClass>,
}

impl ObjectTally {
    /// Map raw detections through the class registry. Unregistered ids are
    /// ignored.
    pub fn from_detections(detections: &[Detection]) -> Self {
        let mut tally = Self::default();
        for detection in detections {
            match ObjectClass::from_class_id(detection.class_id) {
                Some(ObjectClass::Person) => tally.persons += 1,
                Some(ObjectClass::CellPhone) => tally.phones += 1,
                Some(other) => {
                    tally.forbidden.insert(other);
                }
                None => {}
            }
        }
        tally
    }

    /// More than one person is in view. Counted once per frame.
    pub fn has_multiple_people(&self) -> bool {
        self.persons > 1
    }
}

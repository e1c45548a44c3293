//! Pairwise change signal between consecutive sampled frames.

use image::GrayImage;
use tracing::{debug, trace};

use super::motion::MotionDetector;
use super::{ObjectSet, ObjectSetDetector};
use crate::error::MediaResult;
use crate::frame::Frame;

/// What changed between a sampled frame and its predecessor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChangeSignal {
    pub motion_changed: bool,
    pub objects_changed: bool,
}

impl ChangeSignal {
    /// Either signal fired.
    pub fn changed(&self) -> bool {
        self.motion_changed || self.objects_changed
    }
}

/// Stateful change detector. Retains only the previous frame's luma and object set.
pub struct ChangeDetector<'a> {
    objects: &'a dyn ObjectSetDetector,
    motion: MotionDetector,
    prev_luma: Option<GrayImage>,
    prev_objects: ObjectSet,
}

impl<'a> ChangeDetector<'a> {
    pub fn new(objects: &'a dyn ObjectSetDetector, motion_threshold: u8) -> Self {
        Self {
            objects,
            motion: MotionDetector::new(motion_threshold),
            prev_luma: None,
            prev_objects: ObjectSet::new(),
        }
    }

    /// Feed the next sampled frame.
    ///
    /// Returns `None` for the first frame: it has no predecessor, but its
    /// object set still seeds the comparison for the second frame.
    /// Detection failures are returned as-is; a skipped reading could hide a
    /// real boundary.
    pub fn observe(&mut self, frame: &Frame) -> MediaResult<Option<ChangeSignal>> {
        let luma = frame.to_luma();

        let motion_changed = match &self.prev_luma {
            Some(prev) => Some(self.motion.detect(prev, &luma)?),
            None => None,
        };

        let objects = self.objects.detect(frame)?;
        let objects_changed = objects != self.prev_objects;

        trace!(
            sample = frame.index,
            timestamp = frame.timestamp,
            objects = ?objects,
            "Frame observed"
        );

        if objects_changed {
            debug!(
                timestamp = frame.timestamp,
                before = ?self.prev_objects,
                after = ?objects,
                "Object set changed"
            );
        }

        self.prev_luma = Some(luma);
        self.prev_objects = objects;

        Ok(motion_changed.map(|motion_changed| ChangeSignal {
            motion_changed,
            objects_changed,
        }))
    }

    /// Object set of the most recent frame.
    pub fn current_objects(&self) -> &ObjectSet {
        &self.prev_objects
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::NullObjectDetector;
    use crate::error::MediaError;
    use image::{Rgb, RgbImage};
    use std::sync::Mutex;

    /// Replays a scripted label set per call.
    struct ScriptedDetector {
        script: Mutex<Vec<Vec<&'static str>>>,
    }

    impl ScriptedDetector {
        fn new(mut script: Vec<Vec<&'static str>>) -> Self {
            script.reverse();
            Self {
                script: Mutex::new(script),
            }
        }
    }

    impl ObjectSetDetector for ScriptedDetector {
        fn detect(&self, _frame: &Frame) -> MediaResult<ObjectSet> {
            let labels = self
                .script
                .lock()
                .unwrap()
                .pop()
                .ok_or_else(|| MediaError::detection_failed("script exhausted"))?;
            Ok(labels.into_iter().map(String::from).collect())
        }

        fn name(&self) -> &'static str {
            "scripted"
        }
    }

    fn frame(index: usize, value: u8) -> Frame {
        let image = RgbImage::from_pixel(4, 4, Rgb([value, value, value]));
        Frame::new(index, index as u64 * 15, index as f64 * 0.5, image)
    }

    #[test]
    fn test_first_frame_has_no_signal() {
        let detector = NullObjectDetector;
        let mut change = ChangeDetector::new(&detector, 25);
        assert_eq!(change.observe(&frame(0, 0)).unwrap(), None);
        assert_eq!(
            change.observe(&frame(1, 0)).unwrap(),
            Some(ChangeSignal::default())
        );
    }

    #[test]
    fn test_first_frame_seeds_object_set() {
        let detector = ScriptedDetector::new(vec![
            vec!["person", "bottle"],
            vec!["bottle", "person"],
            vec!["person"],
        ]);
        let mut change = ChangeDetector::new(&detector, 25);

        assert_eq!(change.observe(&frame(0, 0)).unwrap(), None);

        let same = change.observe(&frame(1, 0)).unwrap().unwrap();
        assert!(!same.objects_changed, "set order must not matter");

        let removed = change.observe(&frame(2, 0)).unwrap().unwrap();
        assert!(removed.objects_changed);
        assert!(removed.changed());
        assert_eq!(change.current_objects().len(), 1);
    }

    #[test]
    fn test_detection_failure_propagates() {
        let detector = ScriptedDetector::new(vec![vec![]]);
        let mut change = ChangeDetector::new(&detector, 25);
        change.observe(&frame(0, 0)).unwrap();

        let err = change.observe(&frame(1, 0)).unwrap_err();
        assert!(matches!(err, MediaError::DetectionFailed(_)));
    }

    #[test]
    fn test_resolution_change_is_decode_error() {
        let detector = NullObjectDetector;
        let mut change = ChangeDetector::new(&detector, 25);
        change.observe(&frame(0, 0)).unwrap();

        let bigger = Frame::new(1, 15, 0.5, RgbImage::new(8, 8));
        assert!(matches!(
            change.observe(&bigger),
            Err(MediaError::Decode(_))
        ));
    }
}

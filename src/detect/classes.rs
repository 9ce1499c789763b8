//! Class label tables.

use crate::layout::ClassId;

/// The 80 COCO classes, in the index order YOLOv8 emits.
pub const COCO_CLASSES: &[&str] = &[
    "person",
    "bicycle",
    "car",
    "motorcycle",
    "airplane",
    "bus",
    "train",
    "truck",
    "boat",
    "traffic light",
    "fire hydrant",
    "stop sign",
    "parking meter",
    "bench",
    "bird",
    "cat",
    "dog",
    "horse",
    "sheep",
    "cow",
    "elephant",
    "bear",
    "zebra",
    "giraffe",
    "backpack",
    "umbrella",
    "handbag",
    "tie",
    "suitcase",
    "frisbee",
    "skis",
    "snowboard",
    "sports ball",
    "kite",
    "baseball bat",
    "baseball glove",
    "skateboard",
    "surfboard",
    "tennis racket",
    "bottle",
    "wine glass",
    "cup",
    "fork",
    "knife",
    "spoon",
    "bowl",
    "banana",
    "apple",
    "sandwich",
    "orange",
    "broccoli",
    "carrot",
    "hot dog",
    "pizza",
    "donut",
    "cake",
    "chair",
    "couch",
    "potted plant",
    "bed",
    "dining table",
    "toilet",
    "tv",
    "laptop",
    "mouse",
    "remote",
    "keyboard",
    "cell phone",
    "microwave",
    "oven",
    "toaster",
    "sink",
    "refrigerator",
    "book",
    "clock",
    "vase",
    "scissors",
    "teddy bear",
    "hair drier",
    "toothbrush",
];

/// Room-relevant COCO classes grouped the way the front end lists them.
///
/// COCO has no lighting or textile classes, so those groups are absent.
pub const ROOM_CATEGORIES: &[(&str, &[&str])] = &[
    ("furniture", &["chair", "couch", "bed", "dining table", "bench"]),
    (
        "electronics",
        &["tv", "laptop", "cell phone", "keyboard", "mouse", "remote"],
    ),
    (
        "appliances",
        &["microwave", "oven", "toaster", "sink", "refrigerator"],
    ),
    ("decor", &["vase", "clock", "book", "teddy bear"]),
    ("plants", &["potted plant"]),
];

/// Name for a class id, or `"unknown"` past the end of the table.
pub fn class_name(class_id: ClassId) -> &'static str {
    COCO_CLASSES
        .get(class_id.as_index())
        .copied()
        .unwrap_or("unknown")
}

/// Reverse lookup of a COCO class name.
pub fn class_id_for_name(name: &str) -> Option<ClassId> {
    COCO_CLASSES
        .iter()
        .position(|c| *c == name)
        .map(|idx| ClassId(idx as u32))
}

/// Room group a class belongs to, if any.
pub fn room_category(name: &str) -> Option<&'static str> {
    ROOM_CATEGORIES
        .iter()
        .find(|(_, names)| names.contains(&name))
        .map(|(group, _)| *group)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coco_classes() {
        assert_eq!(COCO_CLASSES.len(), 80);
        assert_eq!(class_name(ClassId(0)), "person");
        assert_eq!(class_name(ClassId(56)), "chair");
        assert_eq!(class_name(ClassId(79)), "toothbrush");
        assert_eq!(class_name(ClassId(200)), "unknown");
    }

    #[test]
    fn every_room_class_is_a_coco_class() {
        for (group, names) in ROOM_CATEGORIES {
            for name in *names {
                assert!(
                    class_id_for_name(name).is_some(),
                    "{} in {} is not a COCO class",
                    name,
                    group
                );
            }
        }
    }

    #[test]
    fn room_category_lookup() {
        assert_eq!(room_category("couch"), Some("furniture"));
        assert_eq!(room_category("potted plant"), Some("plants"));
        assert_eq!(room_category("giraffe"), None);
        assert_eq!(class_id_for_name("couch"), Some(ClassId(57)));
    }
}

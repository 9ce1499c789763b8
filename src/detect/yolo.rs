//! YOLOv8 inference through ONNX Runtime.

use ndarray::Array4;
use ort::session::{Session, SessionOutputs};
use ort::value::TensorRef;
use tracing::{debug, info};

use image::RgbImage;

use super::{
    class_name, non_maximum_suppression, verify_model_source, Detection, Detector, DetectorConfig,
};
use crate::error::RedecorError;
use crate::layout::{BBoxXYXY, ClassId};

/// Box coordinates before the class scores in each anchor's feature column.
const BOX_FEATURES: usize = 4;

pub struct YoloDetector {
    session: Session,
    config: DetectorConfig,
}

impl YoloDetector {
    /// Verify and load the model named by `config.model_path`. Runs on CPU.
    pub fn load(config: &DetectorConfig) -> Result<Self, RedecorError> {
        let path = &config.model_path;
        verify_model_source(path, &config.load_options())?;

        info!(model = %path.display(), "loading YOLOv8 model");
        let model_err = |e: ort::Error| RedecorError::ModelLoad {
            path: path.clone(),
            message: e.to_string(),
        };
        let session = Session::builder()
            .map_err(model_err)?
            .commit_from_file(path)
            .map_err(model_err)?;

        Ok(Self {
            session,
            config: config.clone(),
        })
    }

    /// `(1, 3, S, S)` tensor in `[0, 1]`, image stretched to the input square.
    fn preprocess(&self, image: &RgbImage) -> Array4<f32> {
        let size = self.config.input_size;
        let resized =
            image::imageops::resize(image, size, size, image::imageops::FilterType::Triangle);

        let side = size as usize;
        let mut input = Array4::zeros((1, 3, side, side));
        for (x, y, pixel) in resized.enumerate_pixels() {
            let (x, y) = (x as usize, y as usize);
            input[[0, 0, y, x]] = f32::from(pixel[0]) / 255.0;
            input[[0, 1, y, x]] = f32::from(pixel[1]) / 255.0;
            input[[0, 2, y, x]] = f32::from(pixel[2]) / 255.0;
        }
        input
    }

    fn postprocess(
        outputs: SessionOutputs<'_>,
        config: &DetectorConfig,
    ) -> Result<Vec<Detection>, RedecorError> {
        let (shape, data) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| RedecorError::Inference(format!("failed to extract tensor: {e}")))?;

        // (batch, 4 + classes, anchors)
        let dims = shape.as_ref();
        if dims.len() != 3 || (dims[1] as usize) <= BOX_FEATURES {
            return Err(RedecorError::Inference(format!(
                "unexpected output shape {:?}",
                dims
            )));
        }
        let num_classes = dims[1] as usize - BOX_FEATURES;
        let num_anchors = dims[2] as usize;
        let side = f64::from(config.input_size);

        let mut raw = Vec::new();
        for anchor in 0..num_anchors {
            let feature = |f: usize| data[f * num_anchors + anchor];

            let (best_class, best_score) = (0..num_classes)
                .map(|c| (c, feature(BOX_FEATURES + c)))
                .fold((0, f32::MIN), |best, cur| if cur.1 > best.1 { cur } else { best });

            if best_score < config.confidence_threshold {
                continue;
            }
            let class_id = ClassId(best_class as u32);
            if let Some(classes) = &config.classes {
                if !classes.contains(&class_id.as_u32()) {
                    continue;
                }
            }

            let bbox = BBoxXYXY::from_cxcywh(
                f64::from(feature(0)) / side,
                f64::from(feature(1)) / side,
                f64::from(feature(2)) / side,
                f64::from(feature(3)) / side,
            );
            raw.push(Detection {
                class_id,
                class_name: class_name(class_id).to_string(),
                confidence: best_score,
                bbox,
            });
        }

        debug!(candidates = raw.len(), "raw detections before NMS");
        let mut detections = non_maximum_suppression(raw, f64::from(config.iou_threshold));
        detections.truncate(config.max_detections);
        Ok(detections)
    }
}

impl Detector for YoloDetector {
    fn name(&self) -> &str {
        "yolov8"
    }

    fn detect(&mut self, image: &RgbImage) -> Result<Vec<Detection>, RedecorError> {
        debug!(
            width = image.width(),
            height = image.height(),
            "running object detection"
        );
        let input = self.preprocess(image);
        let tensor = TensorRef::from_array_view(input.view())
            .map_err(|e| RedecorError::Inference(e.to_string()))?;
        let outputs = self
            .session
            .run(ort::inputs![tensor])
            .map_err(|e| RedecorError::Inference(e.to_string()))?;
        // Disjoint from the session borrow held by `outputs`.
        let detections = Self::postprocess(outputs, &self.config)?;
        info!(count = detections.len(), "detected objects");
        Ok(detections)
    }
}

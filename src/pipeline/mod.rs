//! End-to-end pipeline: detect, extract, rearrange, render.
//!
//! Stages run strictly in order and any failure aborts the run; no partial
//! output is returned. Files already written by an aborted run are left on
//! disk.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use image::RgbImage;
use tracing::info;
use walkdir::WalkDir;

use crate::detect::Detector;
use crate::error::RedecorError;
use crate::layout::{extract_layout, io_json, Layout, LayoutVariant};
use crate::rearrange::{generate_rearranged_layouts, validate_rearrange_options, RearrangeOptions};
use crate::render::{self, RenderOptions};

/// Image extensions picked up by [`run_batch`], matched case-insensitively.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "webp"];

/// File name of the per-run layout written by [`run_batch`].
pub const LAYOUT_JSON_NAME: &str = "layout.json";

#[derive(Clone, Debug)]
pub struct PipelineOptions {
    pub rearrange: RearrangeOptions,
    pub render: RenderOptions,
    /// Also write `{stem}_detected.jpg` with the extracted layout drawn.
    pub save_detected: bool,
    /// Where to write the extracted layout, if anywhere.
    pub layout_json: Option<PathBuf>,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            rearrange: RearrangeOptions::default(),
            render: RenderOptions::default(),
            save_detected: true,
            layout_json: None,
        }
    }
}

/// Everything one run produced.
#[derive(Clone, Debug)]
pub struct PipelineOutput {
    pub layout: Layout,
    pub variants: Vec<LayoutVariant>,
    pub detected_image: Option<PathBuf>,
    /// `layout_1.jpg`..`layout_N.jpg`, in variant order.
    pub variant_images: Vec<PathBuf>,
    pub layout_json: Option<PathBuf>,
}

impl PipelineOutput {
    /// Every image written, detection image first.
    pub fn images(&self) -> impl Iterator<Item = &PathBuf> {
        self.detected_image.iter().chain(self.variant_images.iter())
    }
}

/// Runs the whole pipeline on one image file.
pub fn run_pipeline(
    detector: &mut dyn Detector,
    image_path: &Path,
    output_dir: &Path,
    opts: &PipelineOptions,
) -> Result<PipelineOutput, RedecorError> {
    validate_rearrange_options(&opts.rearrange)?;

    info!(image = %image_path.display(), "loading image");
    let image = render::load_rgb_image(image_path)?;
    let stem = image_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("image");

    run_pipeline_on_image(detector, &image, stem, output_dir, opts)
}

/// Runs the pipeline on an already decoded image.
///
/// `stem` names the detection image (`{stem}_detected.jpg`).
pub fn run_pipeline_on_image(
    detector: &mut dyn Detector,
    image: &RgbImage,
    stem: &str,
    output_dir: &Path,
    opts: &PipelineOptions,
) -> Result<PipelineOutput, RedecorError> {
    validate_rearrange_options(&opts.rearrange)?;
    let (width, height) = image.dimensions();

    info!(detector = detector.name(), width, height, "detecting objects");
    let detections = detector.detect(image)?;

    let layout = extract_layout(&detections, width, height);
    info!(
        objects = layout.len(),
        detections = detections.len(),
        "extracted layout"
    );
    if let Some(path) = &opts.layout_json {
        io_json::write_layout_json(path, &layout)?;
        info!(path = %path.display(), "wrote layout");
    }

    let variants = generate_rearranged_layouts(&layout, &opts.rearrange)?;
    info!(count = variants.len(), "generated layout variants");

    let detected_image = if opts.save_detected {
        Some(render::render_detections(
            image,
            &layout,
            stem,
            output_dir,
            &opts.render,
        )?)
    } else {
        None
    };
    let variant_images = render::render_variants(image, &variants, output_dir, &opts.render)?;
    info!(
        output_dir = %output_dir.display(),
        images = variant_images.len() + usize::from(detected_image.is_some()),
        "rendered images"
    );

    Ok(PipelineOutput {
        layout,
        variants,
        detected_image,
        variant_images,
        layout_json: opts.layout_json.clone(),
    })
}

/// Image files under `root`, sorted by path.
pub fn collect_images(root: &Path) -> Result<Vec<PathBuf>, RedecorError> {
    let mut files = Vec::new();

    for entry in WalkDir::new(root).follow_links(true).sort_by_file_name() {
        let entry = entry.map_err(|source| RedecorError::Io(source.into()))?;

        if entry.file_type().is_file() && has_image_extension(entry.path()) {
            files.push(entry.path().to_path_buf());
        }
    }

    Ok(files)
}

fn has_image_extension(path: &Path) -> bool {
    let Some(ext) = path.extension().and_then(|ext| ext.to_str()) else {
        return false;
    };

    IMAGE_EXTENSIONS
        .iter()
        .any(|allowed| ext.eq_ignore_ascii_case(allowed))
}

/// Output subdirectory for each image, relative to the batch output dir.
///
/// The image's path under `input_dir` minus its extension (`a/room.jpg`
/// gives `a/room`). Images in one directory that share a stem keep their
/// extension instead (`room.jpg` and `room.png` give `room_jpg` and
/// `room_png`).
fn batch_run_dirs(input_dir: &Path, images: &[PathBuf]) -> Result<Vec<PathBuf>, RedecorError> {
    let relative = images
        .iter()
        .map(|path| {
            path.strip_prefix(input_dir).map_err(|_| {
                RedecorError::invalid_argument(format!(
                    "{} is not under {}",
                    path.display(),
                    input_dir.display()
                ))
            })
        })
        .collect::<Result<Vec<&Path>, _>>()?;

    let mut stem_counts: HashMap<PathBuf, usize> = HashMap::new();
    for rel in &relative {
        *stem_counts.entry(rel.with_extension("")).or_default() += 1;
    }

    let mut seen = HashSet::new();
    let mut dirs = Vec::with_capacity(relative.len());
    for rel in relative {
        let base = rel.with_extension("");
        let dir = if stem_counts.get(&base).copied().unwrap_or(0) > 1 {
            let name = rel
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("image")
                .replace('.', "_");
            rel.with_file_name(name)
        } else {
            base
        };
        if !seen.insert(dir.clone()) {
            return Err(RedecorError::invalid_argument(format!(
                "more than one image maps to output directory {}",
                dir.display()
            )));
        }
        dirs.push(dir);
    }
    Ok(dirs)
}

/// Runs the pipeline for every image under `input_dir`.
///
/// Each image gets its own directory under `output_dir` (see
/// [`batch_run_dirs`]) with its renders and a `layout.json`. Directories
/// are assigned before the first run, and the first failure stops the batch.
pub fn run_batch(
    detector: &mut dyn Detector,
    input_dir: &Path,
    output_dir: &Path,
    opts: &PipelineOptions,
) -> Result<Vec<PipelineOutput>, RedecorError> {
    validate_rearrange_options(&opts.rearrange)?;

    let images = collect_images(input_dir)?;
    let run_dirs = batch_run_dirs(input_dir, &images)?;
    info!(count = images.len(), input = %input_dir.display(), "batch run");

    let mut outputs = Vec::with_capacity(images.len());
    for (image_path, run_dir) in images.iter().zip(run_dirs) {
        let run_dir = output_dir.join(run_dir);
        let run_opts = PipelineOptions {
            layout_json: Some(run_dir.join(LAYOUT_JSON_NAME)),
            ..opts.clone()
        };
        outputs.push(run_pipeline(detector, image_path, &run_dir, &run_opts)?);
    }
    Ok(outputs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::Detection;
    use crate::layout::{BBoxXYXY, ClassId};

    /// Returns the same detections for every image.
    struct FixedDetector(Vec<Detection>);

    impl Detector for FixedDetector {
        fn name(&self) -> &str {
            "fixed"
        }

        fn detect(&mut self, _image: &RgbImage) -> Result<Vec<Detection>, RedecorError> {
            Ok(self.0.clone())
        }
    }

    struct FailingDetector;

    impl Detector for FailingDetector {
        fn name(&self) -> &str {
            "failing"
        }

        fn detect(&mut self, _image: &RgbImage) -> Result<Vec<Detection>, RedecorError> {
            Err(RedecorError::Inference("model exploded".to_string()))
        }
    }

    fn couch_and_chair() -> FixedDetector {
        FixedDetector(vec![
            Detection {
                class_id: ClassId(57),
                class_name: "couch".to_string(),
                confidence: 0.9,
                bbox: BBoxXYXY::from_xyxy(0.1, 0.1, 0.5, 0.5),
            },
            Detection {
                class_id: ClassId(56),
                class_name: "chair".to_string(),
                confidence: 0.8,
                bbox: BBoxXYXY::from_xyxy(0.6, 0.2, 0.9, 0.8),
            },
        ])
    }

    fn seeded(num_versions: usize) -> PipelineOptions {
        PipelineOptions {
            rearrange: RearrangeOptions {
                num_versions,
                seed: Some(1),
            },
            ..PipelineOptions::default()
        }
    }

    #[test]
    fn runs_all_stages_on_a_decoded_image() {
        let dir = tempfile::tempdir().expect("tempdir");
        let image = RgbImage::new(200, 100);
        let mut detector = couch_and_chair();
        let opts = PipelineOptions {
            layout_json: Some(dir.path().join("intermediate/layout.json")),
            ..seeded(3)
        };

        let out = run_pipeline_on_image(&mut detector, &image, "room", dir.path(), &opts)
            .expect("pipeline");

        assert_eq!(out.layout.len(), 2);
        assert_eq!(out.variants.len(), 3);
        assert_eq!(out.variant_images.len(), 3);
        assert_eq!(out.detected_image, Some(dir.path().join("room_detected.jpg")));
        assert_eq!(out.images().count(), 4);
        for path in out.images() {
            assert!(path.is_file(), "{} missing", path.display());
        }

        let written = io_json::read_layout_json(&dir.path().join("intermediate/layout.json"))
            .expect("layout json");
        assert_eq!(written, out.layout);
    }

    #[test]
    fn skips_detection_image_when_asked() {
        let dir = tempfile::tempdir().expect("tempdir");
        let image = RgbImage::new(50, 50);
        let opts = PipelineOptions {
            save_detected: false,
            ..seeded(1)
        };
        let out = run_pipeline_on_image(&mut couch_and_chair(), &image, "room", dir.path(), &opts)
            .expect("pipeline");
        assert!(out.detected_image.is_none());
        assert!(!dir.path().join("room_detected.jpg").exists());
    }

    #[test]
    fn zero_versions_fails_before_detection() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = run_pipeline_on_image(
            &mut FailingDetector,
            &RgbImage::new(10, 10),
            "room",
            dir.path(),
            &seeded(0),
        )
        .expect_err("invalid");
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn detector_failure_aborts_the_run() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = run_pipeline_on_image(
            &mut FailingDetector,
            &RgbImage::new(10, 10),
            "room",
            dir.path(),
            &seeded(2),
        )
        .expect_err("detector fails");
        assert!(!err.is_invalid_argument());
        assert!(!dir.path().join("layout_1.jpg").exists());
    }

    #[test]
    fn missing_image_is_a_decode_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = run_pipeline(
            &mut couch_and_chair(),
            &dir.path().join("nope.jpg"),
            dir.path(),
            &seeded(1),
        )
        .expect_err("missing");
        assert!(matches!(err, RedecorError::ImageDecode { .. }));
    }

    #[test]
    fn batch_runs_each_image_into_its_own_directory() {
        let input = tempfile::tempdir().expect("input");
        let output = tempfile::tempdir().expect("output");
        RgbImage::new(40, 30)
            .save(input.path().join("kitchen.PNG"))
            .expect("save");
        RgbImage::new(40, 30)
            .save(input.path().join("bedroom.jpg"))
            .expect("save");
        std::fs::write(input.path().join("notes.txt"), "not an image").expect("write");

        let outputs =
            run_batch(&mut couch_and_chair(), input.path(), output.path(), &seeded(2)).expect("batch");

        assert_eq!(outputs.len(), 2);
        for stem in ["bedroom", "kitchen"] {
            let run_dir = output.path().join(stem);
            assert!(run_dir.join("layout_1.jpg").is_file());
            assert!(run_dir.join("layout_2.jpg").is_file());
            assert!(run_dir.join(format!("{stem}_detected.jpg")).is_file());
            assert!(run_dir.join(LAYOUT_JSON_NAME).is_file());
        }
    }

    #[test]
    fn batch_keeps_same_stem_images_apart() {
        let input = tempfile::tempdir().expect("input");
        let output = tempfile::tempdir().expect("output");
        for rel in ["a/room.jpg", "b/room.jpg", "room.png", "room.jpg"] {
            let path = input.path().join(rel);
            std::fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
            RgbImage::new(40, 30).save(&path).expect("save");
        }

        let outputs =
            run_batch(&mut couch_and_chair(), input.path(), output.path(), &seeded(1)).expect("batch");
        assert_eq!(outputs.len(), 4);

        let layout_files: HashSet<_> = outputs
            .iter()
            .map(|out| out.layout_json.clone().expect("layout json"))
            .collect();
        assert_eq!(layout_files.len(), 4);

        for dir in ["a/room", "b/room", "room_jpg", "room_png"] {
            let run_dir = output.path().join(dir);
            assert!(run_dir.join("layout_1.jpg").is_file(), "{dir} missing");
            assert!(run_dir.join("room_detected.jpg").is_file(), "{dir} missing");
            assert!(run_dir.join(LAYOUT_JSON_NAME).is_file(), "{dir} missing");
        }
        assert!(!output.path().join("room").exists());
    }

    #[test]
    fn batch_run_dirs_mirror_the_input_tree() {
        let root = Path::new("photos");
        let images: Vec<PathBuf> = ["photos/kitchen.png", "photos/up/bed.jpg", "photos/up/bed.JPG"]
            .iter()
            .map(PathBuf::from)
            .collect();
        let dirs = batch_run_dirs(root, &images).expect("dirs");
        assert_eq!(
            dirs,
            vec![
                PathBuf::from("kitchen"),
                PathBuf::from("up/bed_jpg"),
                PathBuf::from("up/bed_JPG"),
            ]
        );
    }

    #[test]
    fn image_extension_filter() {
        assert!(has_image_extension(Path::new("a/room.JPEG")));
        assert!(has_image_extension(Path::new("room.webp")));
        assert!(!has_image_extension(Path::new("room.gif")));
        assert!(!has_image_extension(Path::new("room")));
    }
}

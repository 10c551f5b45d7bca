use std::path::{Path, PathBuf};

use crate::{
    error::IoError,
    media::MediaKind,
    video::{extract_frames, VideoDecoder},
};

/// An input file that contributed images to the pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputFileRecord {
    /// Path of the source file.
    pub path: PathBuf,
    /// Whether the file was a video or an image.
    pub kind: MediaKind,
    /// Number of images the file produced in the pool.
    pub num_images: usize,
}

/// Result of scanning the input directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectionReport {
    /// Processed files, in file name order.
    pub files: Vec<InputFileRecord>,
    /// Total number of images written to the pool.
    pub total_images: usize,
}

/// Options controlling how videos are sampled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectOptions {
    /// Keep one frame every `frame_skip` frames.
    pub frame_skip: usize,
    /// Maximum number of frames kept per video.
    pub max_frames: Option<usize>,
}

impl Default for CollectOptions {
    fn default() -> Self {
        Self {
            frame_skip: 1,
            max_frames: None,
        }
    }
}

/// Fill the image pool from a directory of videos and images.
///
/// Images are copied verbatim into the pool root. Videos are sampled into
/// `<images_dir>/<video stem>/frame_XXXXXX.jpg`. Files with other extensions
/// and non-regular entries are skipped. A missing `input_dir` is reported as an
/// empty collection, not as an error.
///
/// # Arguments
///
/// * `input_dir` - Directory holding the user provided videos and images.
/// * `images_dir` - The image pool, created if missing.
/// * `options` - Video sampling options.
/// * `decoder` - Backend used to decode videos.
pub fn collect_inputs(
    input_dir: impl AsRef<Path>,
    images_dir: impl AsRef<Path>,
    options: &CollectOptions,
    decoder: &dyn VideoDecoder,
) -> Result<CollectionReport, IoError> {
    let input_dir = input_dir.as_ref();
    let images_dir = images_dir.as_ref();

    if options.frame_skip == 0 {
        return Err(IoError::InvalidFrameSkip(options.frame_skip));
    }

    if !input_dir.exists() {
        log::warn!("Input directory {} does not exist!", input_dir.display());
        return Ok(CollectionReport::default());
    }

    std::fs::create_dir_all(images_dir)?;

    let mut entries = std::fs::read_dir(input_dir)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<Result<Vec<_>, _>>()?;
    entries.sort();

    let mut report = CollectionReport::default();

    for path in entries {
        if !path.is_file() {
            continue;
        }

        let Some(kind) = MediaKind::from_path(&path) else {
            log::debug!("Skipping unsupported file: {}", path.display());
            continue;
        };

        let num_images = match kind {
            MediaKind::Video => {
                log::info!("Processing video: {}", display_name(&path));
                let stem = path
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_default();
                sample_video(&path, &images_dir.join(stem), options, decoder)?
            }
            MediaKind::Image => {
                log::info!("Copying image: {}", display_name(&path));
                let Some(file_name) = path.file_name() else {
                    continue;
                };
                std::fs::copy(&path, images_dir.join(file_name))?;
                1
            }
        };

        report.total_images += num_images;
        report.files.push(InputFileRecord {
            path,
            kind,
            num_images,
        });
    }

    log::info!("Total images to process: {}", report.total_images);
    for record in &report.files {
        log::info!(
            "  {} ({}): {} frames",
            display_name(&record.path),
            record.kind,
            record.num_images
        );
    }

    Ok(report)
}

fn sample_video(
    path: &Path,
    output_dir: &Path,
    options: &CollectOptions,
    decoder: &dyn VideoDecoder,
) -> Result<usize, IoError> {
    log::info!("Extracting frames from {}", display_name(path));
    let mut source = decoder.open(path)?;
    let count = extract_frames(
        source.as_mut(),
        output_dir,
        options.frame_skip,
        options.max_frames,
    )?;
    log::info!("Extracted {} frames from {}", count, display_name(path));
    Ok(count)
}

fn display_name(path: &Path) -> std::borrow::Cow<'_, str> {
    path.file_name()
        .map(|name| name.to_string_lossy())
        .unwrap_or_else(|| path.to_string_lossy())
}

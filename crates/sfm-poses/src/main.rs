use argh::FromArgs;
use std::{error::Error, path::PathBuf, process::ExitCode};

use sfm_poses::{
    io::video::default_decoder,
    pipeline::{
        config::{FeatureExtractor, FeatureMatcher, RetrievalOptions},
        controller::{Pipeline, PipelineConfig},
        features::FeatureOptions,
        hloc::HlocToolkit,
    },
};

#[derive(FromArgs, Debug)]
/// Estimate camera poses from videos and images with structure-from-motion
struct Args {
    /// input directory containing videos or images
    #[argh(option, default = "PathBuf::from(\"./videos\")")]
    input_dir: PathBuf,

    /// output directory for results
    #[argh(option, default = "PathBuf::from(\"./outputs/hloc_poses\")")]
    output_dir: PathBuf,

    /// temporary directory for processing
    #[argh(option, default = "PathBuf::from(\"./temp/hloc_processing\")")]
    temp_dir: PathBuf,

    /// feature extractor: superpoint_aachen, aliked, aliked-n16, disk, d2net or r2d2
    #[argh(option, default = "FeatureExtractor::SuperPointAachen")]
    feature_extractor: FeatureExtractor,

    /// feature matcher: superglue, lightglue or nearest_neighbor
    #[argh(option, default = "FeatureMatcher::SuperGlue")]
    feature_matcher: FeatureMatcher,

    /// select image pairs with NetVLAD retrieval instead of exhaustively
    #[argh(option, default = "true")]
    use_netvlad_retrieval: bool,

    /// number of most similar images matched with NetVLAD
    #[argh(option, default = "20")]
    netvlad_num_matched: usize,

    /// maximum number of frames sampled per video
    #[argh(option)]
    max_images: Option<usize>,

    /// keep every n-th frame of the videos
    #[argh(option, default = "1")]
    frame_skip: usize,

    /// enable verbose logging
    #[argh(switch, short = 'v')]
    verbose: bool,

    /// python interpreter running hloc
    #[argh(option, default = "PathBuf::from(\"python3\")")]
    python: PathBuf,

    /// hloc checkout added to PYTHONPATH when present
    #[argh(option, default = "PathBuf::from(\"./modules/hloc\")")]
    hloc_root: PathBuf,
}

impl Args {
    fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            input_dir: self.input_dir.clone(),
            output_dir: self.output_dir.clone(),
            temp_dir: self.temp_dir.clone(),
            features: FeatureOptions {
                extractor: self.feature_extractor,
                matcher: self.feature_matcher,
                retrieval: RetrievalOptions {
                    enabled: self.use_netvlad_retrieval,
                    num_matched: self.netvlad_num_matched,
                },
            },
            frame_skip: self.frame_skip,
            max_images: self.max_images,
        }
    }
}

/// Accept `--input_dir` style flags alongside argh's `--input-dir`.
fn normalize_flag(arg: &str) -> String {
    match arg.strip_prefix("--") {
        Some(name) if !name.is_empty() => format!("--{}", name.replace('_', "-")),
        _ => arg.to_string(),
    }
}

const RETRIEVAL_FLAG: &str = "--use-netvlad-retrieval";

fn parse_args(raw: &[String]) -> Result<Args, argh::EarlyExit> {
    let cmd = raw.first().map(String::as_str).unwrap_or("sfm-poses");
    let normalized = raw
        .iter()
        .skip(1)
        .map(|a| normalize_flag(a))
        .collect::<Vec<_>>();

    // the retrieval flag may also be given bare, meaning `true`
    let mut args = Vec::with_capacity(normalized.len() + 1);
    for (i, arg) in normalized.iter().enumerate() {
        args.push(arg.as_str());
        let bare = normalized
            .get(i + 1)
            .map_or(true, |next| next.starts_with('-'));
        if arg == RETRIEVAL_FLAG && bare {
            args.push("true");
        }
    }
    Args::from_args(&[cmd], &args)
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let env = env_logger::Env::default().default_filter_or(level);
    env_logger::Builder::from_env(env)
        .format_timestamp_secs()
        .init();
}

fn main() -> ExitCode {
    let raw = std::env::args().collect::<Vec<_>>();
    let args = match parse_args(&raw) {
        Ok(args) => args,
        Err(early_exit) => {
            return match early_exit.status {
                Ok(()) => {
                    println!("{}", early_exit.output);
                    ExitCode::SUCCESS
                }
                Err(()) => {
                    eprintln!("{}", early_exit.output);
                    ExitCode::from(1)
                }
            };
        }
    };

    init_logging(args.verbose);

    let mut config = args.pipeline_config();
    if let Err(err) = config.apply_env_overrides(|name| std::env::var(name).ok()) {
        log::error!("{err}");
        return ExitCode::from(1);
    }

    let toolkit = HlocToolkit::new(&args.python).with_hloc_root(&args.hloc_root);
    let decoder = default_decoder();

    let mut pipeline = Pipeline::new(config, &toolkit, decoder.as_ref());
    match pipeline.run() {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("Pipeline failed with error: {err}");
            if args.verbose {
                let mut source = err.source();
                while let Some(cause) = source {
                    log::debug!("  caused by: {cause}");
                    source = cause.source();
                }
            }
            ExitCode::from(err.exit_code())
        }
    }
}

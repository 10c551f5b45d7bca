use std::{
    ffi::OsString,
    path::{Path, PathBuf},
    process::Command,
};

use sfm_poses_3d::reconstruction::{read_reconstruction, ModelFormat, Reconstruction};
use sfm_poses_io::manifest::ImageManifest;

use crate::{
    config::{ExtractorConf, MatcherConf},
    layout::IMAGE_LIST_TXT,
    toolkit::{SfmToolkit, ToolkitError},
};

const MODEL_FILES: [&str; 6] = [
    "cameras.bin",
    "images.bin",
    "points3D.bin",
    "cameras.txt",
    "images.txt",
    "points3D.txt",
];

const EXTRACT_DRIVER: &str = r#"import sys
from pathlib import Path
from hloc import extract_features
conf, image_dir, image_list, feature_path = sys.argv[1:]
extract_features.main(
    extract_features.confs[conf],
    Path(image_dir),
    image_list=Path(image_list).read_text().splitlines(),
    feature_path=Path(feature_path),
)
"#;

const RETRIEVAL_DRIVER: &str = r#"import sys
from pathlib import Path
from hloc import pairs_from_retrieval
descriptors, output, num_matched = sys.argv[1:]
pairs_from_retrieval.main(Path(descriptors), Path(output), num_matched=int(num_matched))
"#;

const MATCH_DRIVER: &str = r#"import sys
from pathlib import Path
from hloc import match_features
conf, pairs, features, matches = sys.argv[1:]
match_features.main(
    match_features.confs[conf],
    Path(pairs),
    features=Path(features),
    matches=Path(matches),
)
"#;

const RECONSTRUCTION_DRIVER: &str = r#"import sys
from pathlib import Path
from hloc import reconstruction
sfm_dir, image_dir, pairs, features, matches, image_list = sys.argv[1:]
reconstruction.main(
    Path(sfm_dir),
    Path(image_dir),
    Path(pairs),
    Path(features),
    Path(matches),
    image_list=Path(image_list).read_text().splitlines(),
)
"#;

/// Drives the hloc python library as blocking subprocesses.
///
/// Each step runs a short `python -c` script that calls the hloc function with
/// keyword arguments, so output paths are passed exactly as given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HlocToolkit {
    python: PathBuf,
    hloc_root: Option<PathBuf>,
}

impl HlocToolkit {
    /// Create a toolkit using the given python interpreter.
    pub fn new(python: impl Into<PathBuf>) -> Self {
        Self {
            python: python.into(),
            hloc_root: None,
        }
    }

    /// Checkout of hloc prepended to `PYTHONPATH` when the directory exists.
    pub fn with_hloc_root(mut self, hloc_root: impl Into<PathBuf>) -> Self {
        self.hloc_root = Some(hloc_root.into());
        self
    }

    fn python_path(&self) -> Option<OsString> {
        let root = self.hloc_root.as_ref().filter(|root| root.is_dir())?;
        let mut paths = vec![root.clone()];
        if let Some(existing) = std::env::var_os("PYTHONPATH") {
            paths.extend(std::env::split_paths(&existing));
        }
        std::env::join_paths(paths).ok()
    }

    fn command(&self, driver: &str) -> Command {
        let mut cmd = Command::new(&self.python);
        cmd.arg("-c").arg(driver);
        if let Some(python_path) = self.python_path() {
            cmd.env("PYTHONPATH", python_path);
        }
        cmd
    }

    fn run(&self, step: &'static str, mut cmd: Command) -> Result<(), ToolkitError> {
        let args = cmd.get_args().skip(2).collect::<Vec<_>>();
        log::debug!("Running {step} with {args:?}");
        let status = cmd.status().map_err(|source| ToolkitError::Spawn {
            program: self.python.display().to_string(),
            source,
        })?;
        if !status.success() {
            return Err(ToolkitError::StepFailed { step, status });
        }
        Ok(())
    }

    fn extract_command(
        &self,
        conf: &ExtractorConf,
        image_dir: &Path,
        image_list: &Path,
        feature_path: &Path,
    ) -> Command {
        let mut cmd = self.command(EXTRACT_DRIVER);
        cmd.arg(conf.key)
            .arg(image_dir)
            .arg(image_list)
            .arg(feature_path);
        cmd
    }

    fn retrieval_command(&self, descriptors: &Path, output: &Path, num_matched: usize) -> Command {
        let mut cmd = self.command(RETRIEVAL_DRIVER);
        cmd.arg(descriptors)
            .arg(output)
            .arg(num_matched.to_string());
        cmd
    }

    fn match_command(
        &self,
        conf: &MatcherConf,
        pairs: &Path,
        features: &Path,
        matches: &Path,
    ) -> Command {
        let mut cmd = self.command(MATCH_DRIVER);
        cmd.arg(conf.key()).arg(pairs).arg(features).arg(matches);
        cmd
    }

    fn reconstruction_command(
        &self,
        sfm_dir: &Path,
        image_dir: &Path,
        pairs: &Path,
        features: &Path,
        matches: &Path,
        image_list: &Path,
    ) -> Command {
        let mut cmd = self.command(RECONSTRUCTION_DRIVER);
        cmd.arg(sfm_dir)
            .arg(image_dir)
            .arg(pairs)
            .arg(features)
            .arg(matches)
            .arg(image_list);
        cmd
    }
}

impl Default for HlocToolkit {
    fn default() -> Self {
        Self::new("python3")
    }
}

fn parent_dir(path: &Path) -> &Path {
    path.parent().unwrap_or_else(|| Path::new("."))
}

/// Write the manifest next to `store` and return its path.
fn write_image_list(store: &Path, manifest: &ImageManifest) -> Result<PathBuf, ToolkitError> {
    let export_dir = parent_dir(store);
    std::fs::create_dir_all(export_dir)?;
    let image_list = export_dir.join(IMAGE_LIST_TXT);
    manifest.write(&image_list)?;
    Ok(image_list)
}

impl SfmToolkit for HlocToolkit {
    fn extract_features(
        &self,
        conf: &ExtractorConf,
        image_dir: &Path,
        manifest: &ImageManifest,
        feature_path: &Path,
    ) -> Result<(), ToolkitError> {
        let image_list = write_image_list(feature_path, manifest)?;
        let cmd = self.extract_command(conf, image_dir, &image_list, feature_path);
        self.run("hloc.extract_features", cmd)
    }

    fn pairs_from_retrieval(
        &self,
        descriptors: &Path,
        output: &Path,
        num_matched: usize,
    ) -> Result<(), ToolkitError> {
        let cmd = self.retrieval_command(descriptors, output, num_matched);
        self.run("hloc.pairs_from_retrieval", cmd)
    }

    fn match_features(
        &self,
        conf: &MatcherConf,
        pairs: &Path,
        features: &Path,
        matches: &Path,
    ) -> Result<(), ToolkitError> {
        let cmd = self.match_command(conf, pairs, features, matches);
        self.run("hloc.match_features", cmd)
    }

    fn reconstruct(
        &self,
        sfm_dir: &Path,
        image_dir: &Path,
        pairs: &Path,
        features: &Path,
        matches: &Path,
        manifest: &ImageManifest,
    ) -> Result<Option<Reconstruction>, ToolkitError> {
        std::fs::create_dir_all(sfm_dir)?;

        // a model left by an earlier run must not be mistaken for this one
        for name in MODEL_FILES {
            let path = sfm_dir.join(name);
            if path.is_file() {
                log::debug!("Removing stale model file {}", path.display());
                std::fs::remove_file(path)?;
            }
        }

        log::debug!("Reconstructing from {} images", manifest.len());
        let image_list = write_image_list(features, manifest)?;
        let cmd =
            self.reconstruction_command(sfm_dir, image_dir, pairs, features, matches, &image_list);
        self.run("hloc.reconstruction", cmd)?;

        if ModelFormat::detect(sfm_dir).is_none() {
            log::warn!("No model written to {}", sfm_dir.display());
            return Ok(None);
        }
        Ok(Some(read_reconstruction(sfm_dir)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(cmd: &Command) -> Vec<String> {
        cmd.get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    /// Minimal `hloc` package recording how each function was called.
    fn stub_hloc(root: &Path) -> std::io::Result<()> {
        let package = root.join("hloc");
        std::fs::create_dir_all(&package)?;
        std::fs::write(package.join("__init__.py"), "")?;
        std::fs::write(
            package.join("match_features.py"),
            "confs = {'NN-mutual': 'NN-mutual'}\n\
             def main(conf, pairs, export_dir=None, features=None, matches=None):\n\
             \x20   assert export_dir is None\n\
             \x20   matches.write_text(conf + ' ' + features.name)\n",
        )?;
        std::fs::write(
            package.join("reconstruction.py"),
            "def main(sfm_dir, image_dir, pairs, features, matches, image_list=None):\n\
             \x20   (sfm_dir / 'seen.txt').write_text(','.join(image_list))\n",
        )?;
        Ok(())
    }

    #[test]
    fn extract_arguments() {
        let toolkit = HlocToolkit::default();
        let cmd = toolkit.extract_command(
            &ExtractorConf::SUPERPOINT_AACHEN,
            Path::new("/tmp/images"),
            Path::new("/out/image-list.txt"),
            Path::new("/out/features.h5"),
        );
        assert_eq!(cmd.get_program(), "python3");
        let a = args(&cmd);
        assert_eq!(a[0], "-c");
        assert_eq!(a[1], EXTRACT_DRIVER);
        assert_eq!(
            a[2..],
            [
                "superpoint_aachen",
                "/tmp/images",
                "/out/image-list.txt",
                "/out/features.h5",
            ]
        );
    }

    #[test]
    fn match_and_retrieval_arguments() {
        let toolkit = HlocToolkit::new("/usr/bin/python");
        let cmd = toolkit.match_command(
            &MatcherConf::NearestNeighbor,
            Path::new("/out/pairs-sfm.txt"),
            Path::new("/out/features.h5"),
            Path::new("/out/matches.h5"),
        );
        let a = args(&cmd);
        assert_eq!(a[1], MATCH_DRIVER);
        assert_eq!(
            a[2..],
            [
                "NN-mutual",
                "/out/pairs-sfm.txt",
                "/out/features.h5",
                "/out/matches.h5",
            ]
        );

        let cmd = toolkit.retrieval_command(
            Path::new("/out/global-features.h5"),
            Path::new("/out/pairs-sfm.txt"),
            20,
        );
        assert_eq!(
            args(&cmd)[2..],
            ["/out/global-features.h5", "/out/pairs-sfm.txt", "20"]
        );
    }

    #[test]
    fn hloc_root_on_python_path() -> std::io::Result<()> {
        let tmp_dir = tempfile::tempdir()?;
        let missing = HlocToolkit::default().with_hloc_root(tmp_dir.path().join("missing"));
        assert_eq!(missing.python_path(), None);

        let present = HlocToolkit::default().with_hloc_root(tmp_dir.path());
        let python_path = present.python_path().unwrap();
        let first = std::env::split_paths(&python_path).next().unwrap();
        assert_eq!(first, tmp_dir.path());
        Ok(())
    }

    #[test]
    fn missing_interpreter() {
        let toolkit = HlocToolkit::new("/nonexistent/python-for-sfm-poses");
        let result = toolkit.pairs_from_retrieval(Path::new("a"), Path::new("b"), 5);
        assert!(matches!(result, Err(ToolkitError::Spawn { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn failing_step() {
        let toolkit = HlocToolkit::new("false");
        let result = toolkit.pairs_from_retrieval(Path::new("a"), Path::new("b"), 5);
        assert!(matches!(
            result,
            Err(ToolkitError::StepFailed {
                step: "hloc.pairs_from_retrieval",
                ..
            })
        ));
    }

    #[test]
    fn matches_path_is_forwarded() -> Result<(), ToolkitError> {
        let tmp_dir = tempfile::tempdir()?;
        let root = tmp_dir.path().join("hloc_root");
        stub_hloc(&root)?;
        let matches = tmp_dir.path().join("matches.h5");

        let toolkit = HlocToolkit::default().with_hloc_root(&root);
        match toolkit.match_features(
            &MatcherConf::NearestNeighbor,
            &tmp_dir.path().join("pairs-sfm.txt"),
            &tmp_dir.path().join("features.h5"),
            &matches,
        ) {
            // no python3 on this machine
            Err(ToolkitError::Spawn { .. }) => return Ok(()),
            result => result?,
        }
        let written = std::fs::read_to_string(matches)?;
        assert_eq!(written, "NN-mutual features.h5");
        Ok(())
    }

    #[test]
    fn reconstruction_receives_image_list() -> Result<(), ToolkitError> {
        let tmp_dir = tempfile::tempdir()?;
        let root = tmp_dir.path().join("hloc_root");
        stub_hloc(&root)?;
        let sfm_dir = tmp_dir.path().join("sfm");
        std::fs::create_dir_all(&sfm_dir)?;
        std::fs::write(sfm_dir.join("cameras.txt"), "# stale\n")?;

        let toolkit = HlocToolkit::default().with_hloc_root(&root);
        let model = match toolkit.reconstruct(
            &sfm_dir,
            tmp_dir.path(),
            &tmp_dir.path().join("pairs-sfm.txt"),
            &tmp_dir.path().join("features.h5"),
            &tmp_dir.path().join("matches.h5"),
            &ImageManifest::from_names(["b.jpg", "a/c.jpg"]),
        ) {
            Err(ToolkitError::Spawn { .. }) => return Ok(()),
            result => result?,
        };

        // no model files were written, the stale one is gone
        assert!(model.is_none());
        assert!(!sfm_dir.join("cameras.txt").exists());
        assert_eq!(
            std::fs::read_to_string(sfm_dir.join("seen.txt"))?,
            "a/c.jpg,b.jpg"
        );
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn no_model_written() -> Result<(), ToolkitError> {
        let tmp_dir = tempfile::tempdir()?;
        let sfm_dir = tmp_dir.path().join("sfm");

        let toolkit = HlocToolkit::new("true");
        let model = toolkit.reconstruct(
            &sfm_dir,
            tmp_dir.path(),
            &tmp_dir.path().join("pairs-sfm.txt"),
            &tmp_dir.path().join("features.h5"),
            &tmp_dir.path().join("matches.h5"),
            &ImageManifest::from_names(["a.jpg"]),
        )?;
        assert!(model.is_none());
        assert_eq!(
            std::fs::read_to_string(tmp_dir.path().join(IMAGE_LIST_TXT))?,
            "a.jpg\n"
        );
        Ok(())
    }
}

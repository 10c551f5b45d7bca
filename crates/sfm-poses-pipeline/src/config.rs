use std::{fmt, str::FromStr};

use crate::error::ConfigError;

/// Parameters of a local or global feature extraction configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractorConf {
    /// Name of the configuration in the toolkit registry.
    pub key: &'static str,
    /// Name of the feature group written by the toolkit.
    pub output: &'static str,
    /// Network used by the configuration.
    pub model: &'static str,
    /// Keypoint budget per image, if the model has one.
    pub max_keypoints: Option<usize>,
    /// Whether images are converted to grayscale before extraction.
    pub grayscale: bool,
    /// Longest image side after resizing.
    pub resize_max: usize,
}

impl ExtractorConf {
    /// SuperPoint tuned for the Aachen day-night benchmark.
    pub const SUPERPOINT_AACHEN: Self = Self {
        key: "superpoint_aachen",
        output: "feats-superpoint-n4096-r1024",
        model: "superpoint",
        max_keypoints: Some(4096),
        grayscale: true,
        resize_max: 1024,
    };

    /// ALIKED with 16 descriptor channels.
    pub const ALIKED_N16: Self = Self {
        key: "aliked-n16",
        output: "feats-aliked-n16",
        model: "aliked",
        max_keypoints: None,
        grayscale: false,
        resize_max: 1024,
    };

    /// DISK keypoints.
    pub const DISK: Self = Self {
        key: "disk",
        output: "feats-disk",
        model: "disk",
        max_keypoints: Some(5000),
        grayscale: false,
        resize_max: 1600,
    };

    /// Single scale D2-Net.
    pub const D2NET_SS: Self = Self {
        key: "d2net-ss",
        output: "feats-d2net-ss",
        model: "d2net",
        max_keypoints: None,
        grayscale: false,
        resize_max: 1600,
    };

    /// R2D2 keypoints.
    pub const R2D2: Self = Self {
        key: "r2d2",
        output: "feats-r2d2-n5000-r1024",
        model: "r2d2",
        max_keypoints: Some(5000),
        grayscale: false,
        resize_max: 1024,
    };

    /// NetVLAD global descriptors used for image retrieval.
    pub const NETVLAD: Self = Self {
        key: "netvlad",
        output: "global-feats-netvlad",
        model: "netvlad",
        max_keypoints: None,
        grayscale: false,
        resize_max: 1024,
    };
}

impl fmt::Display for ExtractorConf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (model: {}, output: {}, grayscale: {}, resize_max: {}",
            self.key, self.model, self.output, self.grayscale, self.resize_max
        )?;
        if let Some(max_keypoints) = self.max_keypoints {
            write!(f, ", max_keypoints: {max_keypoints}")?;
        }
        write!(f, ")")
    }
}

/// Local feature extractors accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureExtractor {
    /// `superpoint_aachen`
    SuperPointAachen,
    /// `aliked`
    Aliked,
    /// `aliked-n16`
    AlikedN16,
    /// `disk`
    Disk,
    /// `d2net`
    D2Net,
    /// `r2d2`
    R2D2,
}

impl FeatureExtractor {
    /// Every accepted extractor.
    pub const ALL: [Self; 6] = [
        Self::SuperPointAachen,
        Self::Aliked,
        Self::AlikedN16,
        Self::Disk,
        Self::D2Net,
        Self::R2D2,
    ];

    /// The command line name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::SuperPointAachen => "superpoint_aachen",
            Self::Aliked => "aliked",
            Self::AlikedN16 => "aliked-n16",
            Self::Disk => "disk",
            Self::D2Net => "d2net",
            Self::R2D2 => "r2d2",
        }
    }

    /// The toolkit configuration backing this extractor.
    pub fn conf(&self) -> ExtractorConf {
        match self {
            Self::SuperPointAachen => ExtractorConf::SUPERPOINT_AACHEN,
            Self::Aliked | Self::AlikedN16 => ExtractorConf::ALIKED_N16,
            Self::Disk => ExtractorConf::DISK,
            Self::D2Net => ExtractorConf::D2NET_SS,
            Self::R2D2 => ExtractorConf::R2D2,
        }
    }

    /// Whether the extractor belongs to the ALIKED family.
    pub fn is_aliked(&self) -> bool {
        self.name().starts_with("aliked")
    }
}

impl FromStr for FeatureExtractor {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|e| e.name() == s)
            .ok_or_else(|| ConfigError::UnknownExtractor(s.to_string()))
    }
}

impl fmt::Display for FeatureExtractor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Feature matchers accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureMatcher {
    /// `superglue`
    SuperGlue,
    /// `lightglue`
    LightGlue,
    /// `nearest_neighbor`, also accepted as `nn`
    NearestNeighbor,
}

impl FeatureMatcher {
    /// The command line name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::SuperGlue => "superglue",
            Self::LightGlue => "lightglue",
            Self::NearestNeighbor => "nearest_neighbor",
        }
    }
}

impl FromStr for FeatureMatcher {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "superglue" => Ok(Self::SuperGlue),
            "lightglue" => Ok(Self::LightGlue),
            "nearest_neighbor" | "nn" => Ok(Self::NearestNeighbor),
            _ => Err(ConfigError::UnknownMatcher(s.to_string())),
        }
    }
}

impl fmt::Display for FeatureMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Matcher configuration handed to the toolkit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatcherConf {
    /// SuperGlue with outdoor weights.
    SuperGlue,
    /// LightGlue trained on ALIKED features.
    AlikedLightGlue,
    /// Mutual nearest neighbour on descriptors.
    NearestNeighbor,
}

impl MatcherConf {
    /// Name of the configuration in the toolkit registry.
    pub fn key(&self) -> &'static str {
        match self {
            Self::SuperGlue => "superglue",
            Self::AlikedLightGlue => "aliked+lightglue",
            Self::NearestNeighbor => "NN-mutual",
        }
    }

    /// Name of the match group written by the toolkit.
    pub fn output(&self) -> &'static str {
        match self {
            Self::SuperGlue => "matches-superglue",
            Self::AlikedLightGlue => "matches-aliked-lightglue",
            Self::NearestNeighbor => "matches-NN-mutual",
        }
    }
}

impl fmt::Display for MatcherConf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (output: {})", self.key(), self.output())
    }
}

/// Pick the matcher configuration for an extractor and matcher choice.
///
/// LightGlue weights only exist for ALIKED here, so LightGlue with any other
/// extractor falls back to nearest neighbour matching.
pub fn resolve_matcher(extractor: FeatureExtractor, matcher: FeatureMatcher) -> MatcherConf {
    match matcher {
        FeatureMatcher::SuperGlue => MatcherConf::SuperGlue,
        FeatureMatcher::LightGlue if extractor.is_aliked() => MatcherConf::AlikedLightGlue,
        FeatureMatcher::LightGlue => {
            log::warn!(
                "LightGlue is not available for {extractor}, falling back to nearest neighbour matching"
            );
            MatcherConf::NearestNeighbor
        }
        FeatureMatcher::NearestNeighbor => MatcherConf::NearestNeighbor,
    }
}

/// Image retrieval settings used to select the pairs to match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetrievalOptions {
    /// Select pairs by global descriptor similarity instead of exhaustively.
    pub enabled: bool,
    /// Number of retrieved neighbours per image.
    pub num_matched: usize,
}

impl Default for RetrievalOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            num_matched: 20,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_extractors() -> Result<(), ConfigError> {
        for extractor in FeatureExtractor::ALL {
            assert_eq!(extractor.name().parse::<FeatureExtractor>()?, extractor);
        }
        assert_eq!(FeatureExtractor::Aliked.conf().key, "aliked-n16");
        assert_eq!(FeatureExtractor::D2Net.conf().key, "d2net-ss");
        assert_eq!(
            "sift".parse::<FeatureExtractor>(),
            Err(ConfigError::UnknownExtractor("sift".to_string()))
        );
        Ok(())
    }

    #[test]
    fn parse_matchers() {
        assert_eq!("superglue".parse::<FeatureMatcher>(), Ok(FeatureMatcher::SuperGlue));
        assert_eq!("lightglue".parse::<FeatureMatcher>(), Ok(FeatureMatcher::LightGlue));
        assert_eq!("nn".parse::<FeatureMatcher>(), Ok(FeatureMatcher::NearestNeighbor));
        assert!("loftr".parse::<FeatureMatcher>().is_err());
    }

    #[test]
    fn matcher_resolution_table() {
        use FeatureExtractor as E;
        use FeatureMatcher as M;

        let cases = [
            (E::SuperPointAachen, M::SuperGlue, MatcherConf::SuperGlue),
            (E::Disk, M::SuperGlue, MatcherConf::SuperGlue),
            (E::Aliked, M::LightGlue, MatcherConf::AlikedLightGlue),
            (E::AlikedN16, M::LightGlue, MatcherConf::AlikedLightGlue),
            (E::SuperPointAachen, M::LightGlue, MatcherConf::NearestNeighbor),
            (E::R2D2, M::LightGlue, MatcherConf::NearestNeighbor),
            (E::D2Net, M::NearestNeighbor, MatcherConf::NearestNeighbor),
            (E::Aliked, M::NearestNeighbor, MatcherConf::NearestNeighbor),
        ];
        for (extractor, matcher, expected) in cases {
            assert_eq!(resolve_matcher(extractor, matcher), expected, "{extractor} + {matcher}");
        }
    }

    #[test]
    fn display_conf() {
        assert_eq!(
            ExtractorConf::DISK.to_string(),
            "disk (model: disk, output: feats-disk, grayscale: false, resize_max: 1600, max_keypoints: 5000)"
        );
        assert_eq!(MatcherConf::AlikedLightGlue.key(), "aliked+lightglue");
    }
}

use std::{
    collections::HashSet,
    fs::File,
    io::{BufRead, BufReader, BufWriter, Write},
    path::Path,
};

use sfm_poses_io::manifest::ImageManifest;

/// An unordered pair of images to match, by relative name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImagePair(pub String, pub String);

/// Every pair of distinct manifest images, `n * (n - 1) / 2` in total.
///
/// The first image of a pair always precedes the second in the manifest.
pub fn pairs_from_exhaustive(manifest: &ImageManifest) -> Vec<ImagePair> {
    let names = manifest.as_slice();
    let mut pairs = Vec::with_capacity(names.len() * names.len().saturating_sub(1) / 2);
    for (i, a) in names.iter().enumerate() {
        for b in &names[i + 1..] {
            pairs.push(ImagePair(a.clone(), b.clone()));
        }
    }
    pairs
}

/// Write pairs as `imageA imageB` lines.
pub fn write_pairs(path: impl AsRef<Path>, pairs: &[ImagePair]) -> std::io::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    for ImagePair(a, b) in pairs {
        writeln!(writer, "{a} {b}")?;
    }
    writer.flush()
}

/// Read a pairs file, skipping blank lines.
pub fn read_pairs(path: impl AsRef<Path>) -> std::io::Result<Vec<ImagePair>> {
    let reader = BufReader::new(File::open(path)?);
    let mut pairs = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let mut parts = line.split_whitespace();
        match (parts.next(), parts.next()) {
            (Some(a), Some(b)) => pairs.push(ImagePair(a.to_string(), b.to_string())),
            (None, _) => continue,
            (Some(_), None) => {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    format!("malformed pair line: {line}"),
                ))
            }
        }
    }
    Ok(pairs)
}

/// Number of distinct unordered pairs, ignoring self pairs.
pub fn count_unique_pairs(pairs: &[ImagePair]) -> usize {
    pairs
        .iter()
        .filter(|ImagePair(a, b)| a != b)
        .map(|ImagePair(a, b)| if a < b { (a, b) } else { (b, a) })
        .collect::<HashSet<_>>()
        .len()
}

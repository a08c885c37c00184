//! Builds a feature dataset from collected training images.
//!
//! [`build`] walks a data directory produced by [`collect`][crate::collect], runs the hand
//! landmarker over every image, and extracts one feature vector per image. Images in which no
//! hand is found are skipped with a log message. [`write_csv`] serializes the result; the header
//! records the [`FEATURE_LAYOUT`] tag so that training pipelines can verify they agree on the
//! feature ordering.

use std::{
    io::Write,
    path::{Path, PathBuf},
};

use crate::features::{self, FeatureVector, FEATURE_LAYOUT};
use crate::hand::DetectLandmarks;
use crate::image::Frame;
use crate::labels;

/// One labeled feature vector.
pub struct Record {
    pub class: u8,
    pub features: FeatureVector,
}

/// Extracts feature vectors from every image below `data_dir`.
///
/// `data_dir` is expected to contain one subdirectory per class, named after the numeric class
/// index, as written by a collection session. Unrecognized directories and images without a
/// detectable hand are skipped.
pub fn build<D: DetectLandmarks>(data_dir: &Path, mut landmarker: D) -> anyhow::Result<Vec<Record>> {
    let mut classes = Vec::new();
    for entry in std::fs::read_dir(data_dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let name = entry.file_name();
        match name.to_string_lossy().parse::<u8>() {
            Ok(class) if (class as usize) < labels::NUM_CLASSES => {
                classes.push((class, entry.path()));
            }
            _ => {
                log::warn!("skipping unrecognized directory {}", entry.path().display());
            }
        }
    }
    classes.sort_by_key(|&(class, _)| class);

    let mut records = Vec::new();
    for (class, dir) in classes {
        let mut images = image_paths(&dir)?;
        images.sort();
        log::info!("class {}: {} images", class, images.len());

        for path in images {
            let frame = Frame::load(&path)?;
            let hands = landmarker.detect(&frame)?;
            match hands.first() {
                Some(hand) => records.push(Record {
                    class,
                    features: features::extract(hand)?,
                }),
                None => {
                    log::warn!("no hand found in {}, skipping", path.display());
                }
            }
        }
    }
    Ok(records)
}

fn image_paths(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("jpg" | "jpeg" | "png") => paths.push(path),
            _ => {}
        }
    }
    Ok(paths)
}

/// Writes `records` as CSV.
///
/// The first line is a comment naming the feature layout; each following line holds the class
/// index followed by the feature values.
pub fn write_csv<W: Write>(records: &[Record], mut writer: W) -> anyhow::Result<()> {
    writeln!(writer, "# {}", FEATURE_LAYOUT)?;
    for record in records {
        write!(writer, "{}", record.class)?;
        for value in record.features.as_slice() {
            write!(writer, ",{}", value)?;
        }
        writeln!(writer)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::features::FEATURE_LEN;
    use crate::hand::{HandLandmarks, NUM_LANDMARKS};

    struct OneHand;

    impl DetectLandmarks for OneHand {
        fn detect(&mut self, _frame: &Frame) -> anyhow::Result<Vec<HandLandmarks>> {
            Ok(vec![HandLandmarks::new(vec![[0.25, 0.75]; NUM_LANDMARKS])])
        }
    }

    struct NoHands;

    impl DetectLandmarks for NoHands {
        fn detect(&mut self, _frame: &Frame) -> anyhow::Result<Vec<HandLandmarks>> {
            Ok(Vec::new())
        }
    }

    fn data_dir(name: &str, classes: &[(u8, usize)]) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("handsign-{name}-{}", fastrand::u64(..)));
        for &(class, count) in classes {
            let class_dir = dir.join(class.to_string());
            std::fs::create_dir_all(&class_dir).unwrap();
            for i in 0..count {
                Frame::new(8, 8).save(class_dir.join(format!("{i}.jpg"))).unwrap();
            }
        }
        dir
    }

    #[test]
    fn build_produces_one_record_per_image() {
        let dir = data_dir("build", &[(0, 2), (35, 1)]);
        let records = build(&dir, OneHand).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].class, 0);
        assert_eq!(records[2].class, 35);
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn images_without_hands_are_skipped() {
        let dir = data_dir("skip", &[(1, 2)]);
        let records = build(&dir, NoHands).unwrap();
        assert!(records.is_empty());
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn csv_header_names_the_feature_layout() {
        let hand = HandLandmarks::new(vec![[0.0, 0.0]; NUM_LANDMARKS]);
        let records = vec![Record {
            class: 3,
            features: features::extract(&hand).unwrap(),
        }];
        let mut out = Vec::new();
        write_csv(&records, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some(format!("# {FEATURE_LAYOUT}").as_str()));
        let row = lines.next().unwrap();
        assert!(row.starts_with("3,0"));
        assert_eq!(row.split(',').count(), FEATURE_LEN + 1);
    }
}

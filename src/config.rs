use std::path::PathBuf;

use clap::builder::BoolishValueParser;
use clap::{ArgAction, Parser};

/// Detect keypoints in an image and dump them with their descriptors.
#[derive(Parser, Debug, Clone)]
#[command(name = "feature-dump")]
pub struct Args {
    /// Detector name: SIFT, SURF, Dense or any name known to the detector factory
    #[arg(short, long, default_value = "SIFT")]
    pub detector: String,

    /// Descriptor name: SIFT, SURF or any name known to the extractor factory
    #[arg(short = 's', long, default_value = "SIFT")]
    pub descriptor: String,

    /// Cell size of the Dense detector grid
    #[arg(short = 'e', long = "densesize", default_value_t = 6, value_parser = clap::value_parser!(u32).range(1..=i64::from(i32::MAX)))]
    pub dense_size: u32,

    /// Input image
    #[arg(short, long = "input1")]
    pub input: Option<PathBuf>,

    /// Print statistics and show the annotated image
    #[arg(
        short = 'V',
        long,
        default_value_t = true,
        action = ArgAction::Set,
        value_parser = BoolishValueParser::new()
    )]
    pub verbose: bool,

    /// Where to save the annotated image
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Where to save keypoints and descriptors as text
    #[arg(short = 'p', long)]
    pub descfile: Option<PathBuf>,
}

/// Validated run configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub detector: String,
    pub descriptor: String,
    pub input: PathBuf,
    pub output: Option<PathBuf>,
    pub descfile: Option<PathBuf>,
    pub verbose: bool,
    pub dense_size: u32,
}

impl Config {
    pub fn new(input: impl Into<PathBuf>) -> Self {
        Config {
            detector: "SIFT".to_string(),
            descriptor: "SIFT".to_string(),
            input: input.into(),
            output: None,
            descfile: None,
            verbose: true,
            dense_size: 6,
        }
    }
}

impl Args {
    /// `None` when no input image was given.
    pub fn into_config(self) -> Option<Config> {
        Some(Config {
            input: self.input?,
            detector: self.detector,
            descriptor: self.descriptor,
            output: self.output,
            descfile: self.descfile,
            verbose: self.verbose,
            dense_size: self.dense_size,
        })
    }
}

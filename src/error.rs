use std::path::PathBuf;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("FeatureDetector failed for {name} (supported: {supported})")]
    UnsupportedDetector { name: String, supported: String },

    #[error("DescriptorExtractor failed for {name} (supported: {supported})")]
    UnsupportedDescriptor { name: String, supported: String },

    #[error("failed to read image {}: {source}", path.display())]
    ImageRead {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("failed to write image {}: {source}", path.display())]
    ImageWrite {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("failed to write descriptors to {}: {source}", path.display())]
    DescriptorWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("descriptor extraction failed: {0}")]
    Extraction(String),

    #[error("preview failed: {0}")]
    Preview(#[from] std::io::Error),

    #[cfg(feature = "opencv")]
    #[error("OpenCV error: {0}")]
    OpenCv(#[from] opencv::Error),
}

impl Error {
    /// Selection errors abort with -1, everything else with 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::UnsupportedDetector { .. } | Error::UnsupportedDescriptor { .. } => -1,
            _ => 1,
        }
    }
}

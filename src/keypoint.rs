use ndarray::Array2;

/// Octave and layer within an octave of a Gaussian scale space.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd)]
#[cfg_attr(
    any(test, feature = "serde"),
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct ScaleLevel {
    pub octave: usize,
    pub scale: usize,
}

/// A detected interest point in image pixel coordinates.
#[derive(Debug, Clone, PartialEq, PartialOrd)]
#[cfg_attr(
    any(test, feature = "serde"),
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct KeyPoint {
    pub x: f32,
    pub y: f32,
    /// Diameter of the meaningful neighbourhood around the point.
    pub size: f32,
    /// Orientation in degrees, [`KeyPoint::NO_ANGLE`] if the detector does not assign one.
    pub angle: f32,
    pub response: f32,
    /// Scale space level the point was found at, if the detector works on a scale space.
    pub level: Option<ScaleLevel>,
}

impl KeyPoint {
    pub const NO_ANGLE: f32 = -1.0;

    pub fn new(x: f32, y: f32, size: f32) -> Self {
        KeyPoint {
            x,
            y,
            size,
            angle: Self::NO_ANGLE,
            response: 0.0,
            level: None,
        }
    }

    pub fn has_angle(&self) -> bool {
        self.angle >= 0.0
    }

    pub(crate) fn is_inside(&self, width: u32, height: u32, border: f32) -> bool {
        self.x >= border
            && self.y >= border
            && self.x < width as f32 - border
            && self.y < height as f32 - border
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DescriptorType {
    /// 32-bit float components (SIFT, SURF).
    Float,
    /// Packed bytes of a binary string (BRIEF, ORB, ...).
    Binary,
}

/// Descriptor matrix with one row per keypoint.
#[derive(Debug, Clone, PartialEq)]
pub enum Descriptors {
    Float(Array2<f32>),
    Binary(Array2<u8>),
}

impl Descriptors {
    pub fn empty(kind: DescriptorType, cols: usize) -> Self {
        match kind {
            DescriptorType::Float => Descriptors::Float(Array2::zeros((0, cols))),
            DescriptorType::Binary => Descriptors::Binary(Array2::zeros((0, cols))),
        }
    }

    pub fn rows(&self) -> usize {
        match self {
            Descriptors::Float(m) => m.nrows(),
            Descriptors::Binary(m) => m.nrows(),
        }
    }

    pub fn cols(&self) -> usize {
        match self {
            Descriptors::Float(m) => m.ncols(),
            Descriptors::Binary(m) => m.ncols(),
        }
    }

    pub fn descriptor_type(&self) -> DescriptorType {
        match self {
            Descriptors::Float(_) => DescriptorType::Float,
            Descriptors::Binary(_) => DescriptorType::Binary,
        }
    }
}

/// Keypoints and their descriptors, aligned row by row.
#[derive(Debug, Clone, PartialEq)]
pub struct Features {
    pub keypoints: Vec<KeyPoint>,
    pub descriptors: Descriptors,
}

impl Features {
    pub fn len(&self) -> usize {
        self.keypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keypoints.is_empty()
    }
}

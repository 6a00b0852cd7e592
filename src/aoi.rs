//! Area-of-interest inputs and their normalization to the wire form the
//! service accepts.

use crate::error::{Error, Result};

/// Axis-aligned bounding box in the service's coordinate reference
/// (longitude/latitude degrees).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub xmin: f64,
    pub ymin: f64,
    pub xmax: f64,
    pub ymax: f64,
}

impl BoundingBox {
    pub fn new(xmin: f64, ymin: f64, xmax: f64, ymax: f64) -> Self {
        Self { xmin, ymin, xmax, ymax }
    }
}

/// Capability seam for geometry types: anything that can report a bounding
/// box can be used as an area of interest.
pub trait ToBoundingBox {
    /// The geometry's bounding box, or `None` if it has no extent
    /// (e.g. an empty geometry collection).
    fn bounding_box(&self) -> Option<BoundingBox>;
}

impl ToBoundingBox for BoundingBox {
    fn bounding_box(&self) -> Option<BoundingBox> {
        Some(*self)
    }
}

/// The shapes of spatial input a job accepts.
///
/// Arbitrary geometry is reduced to its bounding box up front via
/// [`AreaOfInterest::from_geometry`], so by the time a job is built there are
/// only three cases left.
#[derive(Debug, Clone, PartialEq)]
pub enum AreaOfInterest {
    /// A pre-registered feature id (e.g. a map zone number).
    FeatureId(u64),
    /// Already in the service's own syntax; passed through verbatim.
    Raw(String),
    BBox(BoundingBox),
}

impl AreaOfInterest {
    /// Reduces a geometry to its bounding box.
    pub fn from_geometry<G: ToBoundingBox>(geometry: &G) -> Result<Self> {
        geometry
            .bounding_box()
            .map(Self::BBox)
            .ok_or_else(|| Error::InvalidAreaOfInterest {
                detail: "geometry has no bounding box".to_string(),
            })
    }

    /// The single string form the service accepts.
    ///
    /// Bounding boxes are formatted `"xmin ymin xmax ymax"` with shortest
    /// round-trip float formatting, so `-120.0` stays `-120.0` and no
    /// precision is lost.
    pub fn normalize(&self) -> String {
        match self {
            Self::FeatureId(id) => id.to_string(),
            Self::Raw(s) => s.clone(),
            Self::BBox(b) => format!("{:?} {:?} {:?} {:?}", b.xmin, b.ymin, b.xmax, b.ymax),
        }
    }
}

impl From<u64> for AreaOfInterest {
    fn from(id: u64) -> Self {
        Self::FeatureId(id)
    }
}

impl From<&str> for AreaOfInterest {
    fn from(s: &str) -> Self {
        Self::Raw(s.to_string())
    }
}

impl From<String> for AreaOfInterest {
    fn from(s: String) -> Self {
        Self::Raw(s)
    }
}

impl From<BoundingBox> for AreaOfInterest {
    fn from(b: BoundingBox) -> Self {
        Self::BBox(b)
    }
}

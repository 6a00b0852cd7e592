//! Job construction and content-hash identity.

use sha2::{Digest, Sha256};

use crate::aoi::AreaOfInterest;
use crate::config;
use crate::error::{Error, Result};
use crate::product::Product;

/// Optional processing knobs the service accepts alongside the layer list.
///
/// Every field defaults to absent; absent fields are omitted from the
/// submission payload entirely.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobOptions {
    /// Well-known text or EPSG code for the delivery projection.
    pub output_projection: Option<String>,
    /// Target cell size in metres, 30..=9999.
    pub resample_resolution: Option<u32>,
    pub edit_rule: Option<String>,
    pub edit_mask: Option<String>,
    pub priority_code: Option<String>,
}

/// An immutable unit of work: who is asking, which layers, where, and how.
///
/// Jobs are constructed once and passed by reference from then on. Two jobs
/// built independently from equal field values are interchangeable — in
/// particular they share a [`content_hash`](Job::content_hash), which is what
/// makes the dataset cache content-addressed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    email: String,
    layers: Vec<Product>,
    area_of_interest: String,
    options: JobOptions,
}

impl Job {
    /// Builds a job.
    ///
    /// `email` falls back to configuration (`LFPS_EMAIL`, then `.lfpsrc`)
    /// when not supplied; the service refuses anonymous jobs, so an email
    /// that cannot be resolved anywhere fails construction with
    /// [`Error::MissingEmail`]. `layers` must be non-empty and keeps its
    /// order. `aoi` accepts anything convertible to an [`AreaOfInterest`];
    /// arbitrary geometry goes through
    /// [`AreaOfInterest::from_geometry`] first.
    pub fn new(
        email: Option<&str>,
        layers: Vec<Product>,
        aoi: impl Into<AreaOfInterest>,
        options: JobOptions,
    ) -> Result<Self> {
        let email = config::resolve_email(email)?;
        if layers.is_empty() {
            return Err(Error::EmptyLayerList);
        }
        if let Some(value) = options.resample_resolution {
            if !(30..=9999).contains(&value) {
                return Err(Error::InvalidResampleResolution { value });
            }
        }

        Ok(Self {
            email,
            layers,
            area_of_interest: aoi.into().normalize(),
            options,
        })
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn layers(&self) -> &[Product] {
        &self.layers
    }

    /// The normalized area-of-interest wire string.
    pub fn area_of_interest(&self) -> &str {
        &self.area_of_interest
    }

    pub fn options(&self) -> &JobOptions {
        &self.options
    }

    /// Stable 64-bit fingerprint of the job's semantic fields, used as the
    /// cache key.
    ///
    /// Computed as the first eight bytes of a SHA-256 over a length-framed
    /// encoding of email, each layer's (name, layer code, version) in order,
    /// the area of interest, and every optional field with a present/absent
    /// tag. The framing keeps adjacent fields from bleeding into each other,
    /// and the tag keeps an absent option distinct from an empty string. No
    /// volatile per-process state is involved, so equal field values hash
    /// equally across restarts and platforms.
    pub fn content_hash(&self) -> u64 {
        let mut hasher = Sha256::new();
        hash_str(&mut hasher, &self.email);
        for layer in &self.layers {
            hash_str(&mut hasher, &layer.name);
            hash_str(&mut hasher, &layer.layer_code);
            hash_str(&mut hasher, &layer.version);
        }
        hash_str(&mut hasher, &self.area_of_interest);
        hash_opt(&mut hasher, self.options.output_projection.as_deref());
        hash_opt(
            &mut hasher,
            self.options
                .resample_resolution
                .map(|v| v.to_string())
                .as_deref(),
        );
        hash_opt(&mut hasher, self.options.edit_rule.as_deref());
        hash_opt(&mut hasher, self.options.edit_mask.as_deref());
        hash_opt(&mut hasher, self.options.priority_code.as_deref());

        let digest = hasher.finalize();
        let mut key = [0u8; 8];
        key.copy_from_slice(&digest[..8]);
        u64::from_be_bytes(key)
    }
}

fn hash_str(hasher: &mut Sha256, value: &str) {
    hasher.update((value.len() as u64).to_be_bytes());
    hasher.update(value.as_bytes());
}

fn hash_opt(hasher: &mut Sha256, value: Option<&str>) {
    match value {
        Some(v) => {
            hasher.update([1u8]);
            hash_str(hasher, v);
        }
        None => hasher.update([0u8]),
    }
}

//! A small Rust client for the LANDFIRE Product Service (LFPS).
//!
//! This crate implements the full delivery flow: pick products, submit a
//! processing job for an area of interest, poll for completion, then download
//! and extract the resulting archive into a content-addressed local cache.
//! Jobs are identified by a stable hash of their semantic fields, so asking
//! for the same products over the same area twice does the remote work once.
//!
//! ## Quick start
//! - Configure the requester email via the `LFPS_EMAIL` environment variable
//!   or an `.lfpsrc` file (supported in the current directory and in your
//!   home directory).
//! - Build a [`Job`], wrap it in a [`Dataset`], and call
//!   [`Dataset::retrieve`].
//!
//! ```no_run
//! use lfps::{
//!     BoundingBox, Client, Dataset, Job, JobOptions, Product, ZipExtractor,
//!     default_cache_root,
//! };
//! use std::time::Duration;
//!
//! fn main() -> lfps::Result<()> {
//!     let client = Client::from_env()?;
//!
//!     let fuel = Product {
//!         name: "13 Fire Behavior Fuel Models".into(),
//!         theme: "Fuel".into(),
//!         layer_code: "240FBFM13".into(),
//!         version: "2.4.0".into(),
//!         conus: true,
//!         ..Default::default()
//!     };
//!     let job = Job::new(
//!         None, // email comes from LFPS_EMAIL / .lfpsrc
//!         vec![fuel],
//!         BoundingBox::new(-120.0, 35.0, -110.0, 40.0),
//!         JobOptions::default(),
//!     )?;
//!
//!     let dataset = Dataset::new(job, default_cache_root());
//!     let raster = dataset.retrieve(
//!         &client,
//!         &ZipExtractor,
//!         Duration::from_secs(5),
//!         Duration::from_secs(600),
//!     )?;
//!     println!("{}", raster.display());
//!     Ok(())
//! }
//! ```
//!
//! For full usage and configuration details, see the crate README.

#![forbid(unsafe_code)]

mod aoi;
mod client;
mod config;
mod dataset;
mod error;
mod extract;
mod job;
mod product;
mod protocol;
mod util;

pub use aoi::{AreaOfInterest, BoundingBox, ToBoundingBox};
pub use client::{Client, JobHandle, JobService, JobState, JobStatusSnapshot};
pub use config::default_cache_root;
pub use dataset::Dataset;
pub use error::{Error, Result};
pub use extract::{ArchiveExtractor, ZipExtractor};
pub use job::{Job, JobOptions};
pub use product::{Product, ProductCatalog, Region};

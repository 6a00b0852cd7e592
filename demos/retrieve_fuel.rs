use anyhow::Result;
use lfps::{
    BoundingBox, Client, Dataset, Job, JobOptions, ProductCatalog, ZipExtractor,
    default_cache_root,
};
use std::time::Duration;

fn main() -> Result<()> {
    // Example program that calls the library API.
    // Configure the requester email via LFPS_EMAIL or an `.lfpsrc` file.
    let client = Client::from_env()?;

    let catalog = ProductCatalog::from_json_str(
        r#"[
            {"name": "13 Fire Behavior Fuel Models", "theme": "Fuel",
             "layerCode": "240FBFM13", "version": "2.4.0", "conus": true},
            {"name": "Forest Canopy Cover", "theme": "Canopy",
             "layerCode": "240CC", "version": "2.4.0", "conus": true}
        ]"#,
    )?;

    let layers = catalog.products().to_vec();
    let job = Job::new(
        None,
        layers,
        BoundingBox::new(-113.79, 42.14, -113.56, 42.29),
        JobOptions::default(),
    )?;

    let dataset = Dataset::new(job, default_cache_root());
    let raster = dataset.retrieve(
        &client,
        &ZipExtractor,
        Duration::from_secs(5),
        Duration::from_secs(600),
    )?;

    println!("primary raster: {}", raster.display());
    Ok(())
}

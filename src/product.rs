//! Product descriptions and the read-only catalog they come from.
//!
//! The job/cache core only needs each product's name, layer code, and version
//! as stable strings; the rest of the fields exist so callers can filter the
//! catalog before building a job.

use std::io::Read;

use serde::Deserialize;

use crate::error::{Error, Result};

/// One entry of the service's product table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub name: String,
    /// Product theme, e.g. "Fuel" or "Vegetation".
    pub theme: String,
    /// The code the service expects in a job's layer list.
    pub layer_code: String,
    pub version: String,
    /// Published for the conterminous US.
    #[serde(default)]
    pub conus: bool,
    #[serde(default)]
    pub alaska: bool,
    #[serde(default)]
    pub hawaii: bool,
    /// Free-form geographic-area descriptor, when the table carries one.
    #[serde(default)]
    pub geo_area: Option<String>,
}

/// Regions the service publishes products for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    Conus,
    Alaska,
    Hawaii,
}

impl Product {
    pub fn available_in(&self, region: Region) -> bool {
        match region {
            Region::Conus => self.conus,
            Region::Alaska => self.alaska,
            Region::Hawaii => self.hawaii,
        }
    }
}

/// Read-only product catalog, deserialized from the service's JSON table.
///
/// Catalogs are plain values: load one, filter it, hand the chosen products
/// to a job. Nothing here talks to the network.
#[derive(Debug, Clone, Default)]
pub struct ProductCatalog {
    products: Vec<Product>,
}

impl ProductCatalog {
    pub fn new(products: Vec<Product>) -> Self {
        Self { products }
    }

    /// Parses a catalog from a JSON array of products.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let products = serde_json::from_str(json).map_err(|e| Error::MalformedCatalog {
            detail: e.to_string(),
        })?;
        Ok(Self { products })
    }

    pub fn from_reader(mut reader: impl Read) -> Result<Self> {
        let mut json = String::new();
        reader.read_to_string(&mut json)?;
        Self::from_json_str(&json)
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    pub fn by_theme<'a>(&'a self, theme: &'a str) -> impl Iterator<Item = &'a Product> {
        self.products
            .iter()
            .filter(move |p| p.theme.eq_ignore_ascii_case(theme))
    }

    pub fn available_in(&self, region: Region) -> impl Iterator<Item = &Product> {
        self.products.iter().filter(move |p| p.available_in(region))
    }

    /// Looks a product up by its layer code.
    pub fn find_layer(&self, layer_code: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.layer_code == layer_code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &str = r#"[
        {"name": "13 Fire Behavior Fuel Models", "theme": "Fuel",
         "layerCode": "240FBFM13", "version": "2.4.0",
         "conus": true, "alaska": true},
        {"name": "Existing Vegetation Type", "theme": "Vegetation",
         "layerCode": "240EVT", "version": "2.4.0",
         "conus": true, "hawaii": true, "geoArea": "CONUS+HI"}
    ]"#;

    #[test]
    fn parses_the_service_table() {
        let catalog = ProductCatalog::from_json_str(TABLE).unwrap();
        assert_eq!(catalog.len(), 2);

        let fuel = catalog.find_layer("240FBFM13").unwrap();
        assert_eq!(fuel.name, "13 Fire Behavior Fuel Models");
        assert_eq!(fuel.version, "2.4.0");
        assert!(fuel.available_in(Region::Alaska));
        assert!(!fuel.available_in(Region::Hawaii));
        assert_eq!(fuel.geo_area, None);
    }

    #[test]
    fn filters_are_stateless_views() {
        let catalog = ProductCatalog::from_json_str(TABLE).unwrap();
        assert_eq!(catalog.by_theme("fuel").count(), 1);
        assert_eq!(catalog.available_in(Region::Conus).count(), 2);
        assert_eq!(catalog.available_in(Region::Hawaii).count(), 1);
        assert!(catalog.find_layer("missing").is_none());
    }

    #[test]
    fn malformed_table_is_rejected() {
        let err = ProductCatalog::from_json_str("{not json").unwrap_err();
        assert!(matches!(err, Error::MalformedCatalog { .. }));
    }
}

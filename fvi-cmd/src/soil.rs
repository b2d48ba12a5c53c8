//! Soil attribute lookup against the iSDA soil API.
//!
//! Logs in once, then for each parcel queries every soil property at the
//! parcel centroid concurrently. Any transport failure degrades the whole
//! lookup to an empty result.

use fvi_series::{ParcelRef, ParcelSubmission};
use futures::future::join_all;
use log::{info, warn};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;

pub const ISDA_BASE_URL: &str = "https://api.isda-africa.com";

/// Depth interval queried, in centimetres.
pub const SOIL_DEPTH: &str = "0-20";

pub const SOIL_PROPERTIES: [&str; 17] = [
    "bulk_density",
    "calcium_extractable",
    "carbon_organic",
    "carbon_total",
    "clay_content",
    "iron_extractable",
    "magnesium_extractable",
    "nitrogen_total",
    "ph",
    "phosphorous_extractable",
    "potassium_extractable",
    "sand_content",
    "silt_content",
    "stone_content",
    "sulphur_extractable",
    "texture_class",
    "zinc_extractable",
];

/// USDA texture classes in storage-code order (Sand = 1 ... Clay = 12).
const TEXTURE_CLASSES: [&str; 12] = [
    "sand",
    "loamy sand",
    "sandy loam",
    "loam",
    "silt loam",
    "silt",
    "sandy clay loam",
    "clay loam",
    "silty clay loam",
    "sandy clay",
    "silty clay",
    "clay",
];

/// Integer code of a texture class name, case-insensitive.
pub fn texture_class_code(name: &str) -> Option<u8> {
    let name = name.trim().to_ascii_lowercase();
    TEXTURE_CLASSES
        .iter()
        .position(|class| *class == name)
        .map(|i| i as u8 + 1)
}

/// Soil properties of one parcel. Missing values are `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoilRecord {
    pub parcel_id: String,
    pub properties: BTreeMap<String, Option<f64>>,
}

#[derive(Deserialize)]
struct LoginResponse {
    access_token: Option<String>,
}

/// Read `property.<name>[0].value.value` from a response body.
///
/// Texture classes arrive as names and are stored as their code.
pub fn extract_value(property: &str, body: &Value) -> Option<f64> {
    let value = body.pointer(&format!("/property/{property}/0/value/value"))?;
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => texture_class_code(s)
            .map(f64::from)
            .or_else(|| s.trim().parse().ok()),
        _ => None,
    }
}

#[derive(Debug, Clone)]
pub struct SoilClient {
    client: Client,
    base_url: String,
}

impl SoilClient {
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(60)).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Exchange credentials for a bearer token.
    pub async fn login(&self, username: &str, password: &str) -> anyhow::Result<String> {
        let response: LoginResponse = self
            .client
            .post(format!("{}/login", self.base_url))
            .form(&[("username", username), ("password", password)])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        response
            .access_token
            .ok_or_else(|| anyhow::anyhow!("login response has no access_token"))
    }

    pub async fn fetch_property(
        &self,
        token: &str,
        lat: f64,
        lon: f64,
        property: &str,
    ) -> anyhow::Result<Option<f64>> {
        let body: Value = self
            .client
            .get(format!("{}/isdasoil/v2/soilproperty", self.base_url))
            .query(&[
                ("lat", lat.to_string()),
                ("lon", lon.to_string()),
                ("property", property.to_string()),
                ("depth", SOIL_DEPTH.to_string()),
            ])
            .bearer_auth(token)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(extract_value(property, &body))
    }

    /// All soil properties at the parcel's centroid.
    pub async fn fetch_parcel(&self, token: &str, parcel: &ParcelRef) -> anyhow::Result<SoilRecord> {
        let (lon, lat) = parcel.polygon().centroid();
        let values = join_all(
            SOIL_PROPERTIES
                .iter()
                .map(|property| self.fetch_property(token, lat, lon, property)),
        )
        .await;
        let mut properties = BTreeMap::new();
        for (property, value) in SOIL_PROPERTIES.iter().zip(values) {
            properties.insert(property.to_string(), value?);
        }
        Ok(SoilRecord {
            parcel_id: parcel.id().to_string(),
            properties,
        })
    }

    /// Soil records for every parcel, or nothing if any request fails.
    pub async fn lookup(&self, username: &str, password: &str, parcels: &[ParcelRef]) -> Vec<SoilRecord> {
        let token = match self.login(username, password).await {
            Ok(token) => token,
            Err(e) => {
                warn!("soil lookup: login failed, returning no records: {e}");
                return Vec::new();
            }
        };
        let results = join_all(parcels.iter().map(|parcel| self.fetch_parcel(&token, parcel))).await;
        match results.into_iter().collect::<anyhow::Result<Vec<_>>>() {
            Ok(records) => {
                info!("soil lookup: fetched {} parcel(s)", records.len());
                records
            }
            Err(e) => {
                warn!("soil lookup: request failed, returning no records: {e}");
                Vec::new()
            }
        }
    }
}

/// Render soil records as CSV: `parcel_id` followed by one column per property.
pub fn soil_records_to_csv(records: &[SoilRecord]) -> anyhow::Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    let mut header = vec!["parcel_id"];
    header.extend(SOIL_PROPERTIES);
    writer.write_record(&header)?;
    for record in records {
        let mut row = vec![record.parcel_id.clone()];
        for property in SOIL_PROPERTIES {
            let cell = record
                .properties
                .get(property)
                .copied()
                .flatten()
                .map(|v| v.to_string())
                .unwrap_or_default();
            row.push(cell);
        }
        writer.write_record(&row)?;
    }
    Ok(String::from_utf8(writer.into_inner()?)?)
}

/// Look up soil attributes for the parcels in `parcels_csv` and write them to `output_csv`.
pub async fn run_soil(
    parcels_csv: &str,
    output_csv: &str,
    username: &str,
    password: &str,
    base_url: &str,
) -> anyhow::Result<()> {
    let csv_data = std::fs::read_to_string(parcels_csv)?;
    let parcels = ParcelSubmission::parse_parcel_csv(&csv_data)?
        .into_iter()
        .map(|submission| submission.into_parcel_ref(|| uuid::Uuid::new_v4().to_string()))
        .collect::<Result<Vec<_>, _>>()?;
    info!("Looking up soil properties for {} parcel(s)", parcels.len());

    let client = SoilClient::new(base_url)?;
    let records = client.lookup(username, password, &parcels).await;
    std::fs::write(output_csv, soil_records_to_csv(&records)?)?;
    info!("Soil lookup complete. {} record(s) written to {}", records.len(), output_csv);
    Ok(())
}

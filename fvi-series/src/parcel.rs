use crate::error::{Result, SeriesError};
use csv::{ReaderBuilder, StringRecord};
use serde::{Deserialize, Serialize};

/// Header names accepted for each parcel CSV column.
const ID_HEADERS: [&str; 2] = ["uuid", "parcel_id"];
const REGION_HEADERS: [&str; 1] = ["region"];
const AREA_HEADERS: [&str; 3] = ["area (acres)", "area_acres", "area"];
const GEOMETRY_HEADERS: [&str; 2] = ["geometry", "polygon"];

/// A closed WGS84 linear ring of (longitude, latitude) pairs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    ring: Vec<(f64, f64)>,
}

impl Polygon {
    /// Build a polygon from its exterior ring, closing it if needed.
    pub fn new(mut ring: Vec<(f64, f64)>) -> Result<Self> {
        for &(lon, lat) in &ring {
            if !(-180.0..=180.0).contains(&lon) || !(-90.0..=90.0).contains(&lat) {
                return Err(SeriesError::MalformedInput(format!(
                    "coordinate out of WGS84 range: ({lon}, {lat})"
                )));
            }
        }
        if let (Some(first), Some(last)) = (ring.first().copied(), ring.last().copied()) {
            if first != last {
                ring.push(first);
            }
        }
        // a closed triangle needs four positions
        if ring.len() < 4 {
            return Err(SeriesError::MalformedInput(format!(
                "polygon ring needs at least 3 distinct vertices, got {}",
                ring.len().saturating_sub(1)
            )));
        }
        Ok(Self { ring })
    }

    /// Parse the exterior ring of a WKT `POLYGON ((lon lat, ...))`.
    ///
    /// Interior rings, if present, are ignored.
    pub fn from_wkt(wkt: &str) -> Result<Self> {
        let malformed = |why: &str| SeriesError::MalformedInput(format!("{why}: {wkt:?}"));
        let trimmed = wkt.trim();
        let keyword = trimmed.get(..7).map(|k| k.to_ascii_uppercase());
        if keyword.as_deref() != Some("POLYGON") {
            return Err(malformed("expected a WKT POLYGON"));
        }
        let body = trimmed[7..].trim_start();
        let body = body
            .strip_prefix('(')
            .ok_or_else(|| malformed("missing polygon parenthesis"))?
            .trim_start();
        let body = body
            .strip_prefix('(')
            .ok_or_else(|| malformed("missing ring parenthesis"))?;
        let end = body.find(')').ok_or_else(|| malformed("unterminated ring"))?;

        let mut ring = Vec::new();
        for pair in body[..end].split(',') {
            let mut parts = pair.split_whitespace();
            let lon = parts.next().and_then(|v| v.parse::<f64>().ok());
            let lat = parts.next().and_then(|v| v.parse::<f64>().ok());
            match (lon, lat) {
                (Some(lon), Some(lat)) => ring.push((lon, lat)),
                _ => return Err(malformed("invalid coordinate pair")),
            }
        }
        Polygon::new(ring)
    }

    /// Exterior ring, closed (first position repeated last).
    pub fn exterior(&self) -> &[(f64, f64)] {
        &self.ring
    }

    /// Render as WKT.
    pub fn to_wkt(&self) -> String {
        let coords = self
            .ring
            .iter()
            .map(|(lon, lat)| format!("{lon} {lat}"))
            .collect::<Vec<_>>()
            .join(", ");
        format!("POLYGON (({coords}))")
    }

    /// Area-weighted centroid as (longitude, latitude), planar in degrees.
    ///
    /// Falls back to the vertex mean for degenerate (zero-area) rings.
    pub fn centroid(&self) -> (f64, f64) {
        let mut twice_area = 0.0;
        let mut cx = 0.0;
        let mut cy = 0.0;
        for w in self.ring.windows(2) {
            let (x0, y0) = w[0];
            let (x1, y1) = w[1];
            let cross = x0 * y1 - x1 * y0;
            twice_area += cross;
            cx += (x0 + x1) * cross;
            cy += (y0 + y1) * cross;
        }
        if twice_area.abs() < 1e-18 {
            let vertices = &self.ring[..self.ring.len() - 1];
            let n = vertices.len() as f64;
            let lon = vertices.iter().map(|p| p.0).sum::<f64>() / n;
            let lat = vertices.iter().map(|p| p.1).sum::<f64>() / n;
            return (lon, lat);
        }
        (cx / (3.0 * twice_area), cy / (3.0 * twice_area))
    }
}

/// Identity of a land parcel under analysis. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParcelRef {
    id: String,
    region: Option<String>,
    area_acres: Option<f64>,
    polygon: Polygon,
}

impl ParcelRef {
    pub fn new(
        id: impl Into<String>,
        region: Option<String>,
        area_acres: Option<f64>,
        polygon: Polygon,
    ) -> Result<Self> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(SeriesError::MalformedInput(
                "parcel identifier is empty".to_string(),
            ));
        }
        if let Some(area) = area_acres {
            if !(area.is_finite() && area > 0.0) {
                return Err(SeriesError::MalformedInput(format!(
                    "parcel {id} has non-positive area: {area}"
                )));
            }
        }
        Ok(Self {
            id,
            region,
            area_acres,
            polygon,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn region(&self) -> Option<&str> {
        self.region.as_deref()
    }

    pub fn area_acres(&self) -> Option<f64> {
        self.area_acres
    }

    pub fn polygon(&self) -> &Polygon {
        &self.polygon
    }
}

/// A parcel as submitted by a user or upload, before an id is guaranteed.
#[derive(Debug, Clone, PartialEq)]
pub struct ParcelSubmission {
    pub id: Option<String>,
    pub region: Option<String>,
    pub area_acres: Option<f64>,
    pub polygon: Polygon,
}

impl ParcelSubmission {
    /// Freeze into a `ParcelRef`, reusing the supplied id or minting one.
    pub fn into_parcel_ref<F: FnOnce() -> String>(self, mint_id: F) -> Result<ParcelRef> {
        let id = match self.id {
            Some(id) if !id.trim().is_empty() => id,
            _ => mint_id(),
        };
        ParcelRef::new(id, self.region, self.area_acres, self.polygon)
    }

    /// Parse a parcel CSV (headers required).
    ///
    /// Columns: `uuid` (optional), `region` (optional), `area (acres)`
    /// (optional), `geometry` (required, WKT polygon). Empty cells are null.
    pub fn parse_parcel_csv(csv_object: &str) -> Result<Vec<ParcelSubmission>> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(csv_object.as_bytes());
        let headers = rdr
            .headers()
            .map_err(|e| SeriesError::MalformedInput(format!("unreadable parcel CSV: {e}")))?
            .clone();

        let geometry_col = find_column(&headers, &GEOMETRY_HEADERS).ok_or_else(|| {
            SeriesError::MalformedInput("parcel CSV has no geometry column".to_string())
        })?;
        let id_col = find_column(&headers, &ID_HEADERS);
        let region_col = find_column(&headers, &REGION_HEADERS);
        let area_col = find_column(&headers, &AREA_HEADERS);

        let mut parcels = Vec::new();
        for row in rdr.records() {
            let record =
                row.map_err(|e| SeriesError::MalformedInput(format!("bad parcel row: {e}")))?;
            let geometry = cell(&record, Some(geometry_col)).ok_or_else(|| {
                SeriesError::MalformedInput(format!(
                    "parcel row {} has no geometry",
                    parcels.len() + 1
                ))
            })?;
            let area_acres = match cell(&record, area_col) {
                Some(raw) => Some(raw.parse::<f64>().map_err(|_| {
                    SeriesError::MalformedInput(format!("invalid parcel area: {raw:?}"))
                })?),
                None => None,
            };
            parcels.push(ParcelSubmission {
                id: cell(&record, id_col).map(str::to_string),
                region: cell(&record, region_col).map(str::to_string),
                area_acres,
                polygon: Polygon::from_wkt(geometry)?,
            });
        }
        log::debug!("parsed {} parcel(s) from CSV", parcels.len());
        Ok(parcels)
    }
}

/// Index of the first header matching any of `names` (case-insensitive).
pub(crate) fn find_column(headers: &StringRecord, names: &[&str]) -> Option<usize> {
    headers.iter().position(|h| {
        let h = h.trim();
        names.iter().any(|name| h.eq_ignore_ascii_case(name))
    })
}

/// Trimmed, non-empty cell content.
pub(crate) fn cell(record: &StringRecord, column: Option<usize>) -> Option<&str> {
    column
        .and_then(|c| record.get(c))
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

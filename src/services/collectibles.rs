// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Collectible item import and proximity pickup.

use crate::config::TelemetryConfig;
use crate::db::Store;
use crate::error::Result;
use crate::models::{BoundingBox, CollectibleItem, Coordinate};
use crate::services::geo::distance_meters;
use crate::services::validation::CoordinateValidator;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use validator::Validate;

/// Service for importing items and matching them against positions.
#[derive(Clone)]
pub struct CollectibleService {
    db: Arc<dyn Store>,
    config: TelemetryConfig,
    validator: CoordinateValidator,
}

impl CollectibleService {
    pub fn new(db: Arc<dyn Store>, config: TelemetryConfig) -> Self {
        Self {
            db,
            validator: CoordinateValidator::from_config(&config),
            config,
        }
    }

    /// All items.
    pub async fn list(&self) -> Result<Vec<CollectibleItem>> {
        self.db.list_collectibles().await
    }

    /// Items an athlete has picked up.
    pub async fn collected_by(&self, athlete_id: &str) -> Result<Vec<CollectibleItem>> {
        let items = self.db.list_collectibles().await?;
        Ok(items
            .into_iter()
            .filter(|item| item.collected_by.iter().any(|id| id == athlete_id))
            .collect())
    }

    /// Give the athlete every item within the pickup radius of `point`.
    ///
    /// Returns only items the athlete did not already hold.
    pub async fn collect_nearby(
        &self,
        athlete_id: &str,
        point: Coordinate,
    ) -> Result<Vec<CollectibleItem>> {
        let bbox = BoundingBox::around(point, self.config.collect_search_degrees);
        let candidates = self.db.collectibles_in_box(&bbox).await?;

        let mut collected = Vec::new();
        for item in find_within(&candidates, point, self.config.collect_radius_meters) {
            if self.db.add_collector(&item.uid, athlete_id).await? {
                collected.push(item.clone());
            }
        }
        Ok(collected)
    }

    /// Import rows, storing the valid ones and reporting the rest.
    ///
    /// A bad row never aborts the batch.
    pub async fn import(&self, rows: Vec<Map<String, Value>>) -> Result<ImportReport> {
        let mut report = ImportReport::default();

        for (index, raw) in rows.into_iter().enumerate() {
            let row_number = index + 1;

            let item = match self.parse_row(&raw) {
                Ok(item) => item,
                Err(errors) => {
                    tracing::debug!(row = row_number, errors = ?errors, "Import row rejected");
                    report.failed.push(RejectedRow::new(row_number, &raw, errors));
                    continue;
                }
            };

            if self.db.insert_collectible(&item).await? {
                report.imported += 1;
            } else {
                let errors =
                    BTreeMap::from([("uid".to_string(), "Item with this uid already exists".to_string())]);
                tracing::debug!(row = row_number, uid = %item.uid, "Import row duplicates uid");
                report.failed.push(RejectedRow::new(row_number, &raw, errors));
            }
        }

        tracing::info!(
            imported = report.imported,
            failed = report.failed.len(),
            "Collectible import finished"
        );

        Ok(report)
    }

    /// Convert one raw row into an item, collecting every field error.
    fn parse_row(
        &self,
        raw: &Map<String, Value>,
    ) -> std::result::Result<CollectibleItem, BTreeMap<String, String>> {
        let mut errors = BTreeMap::new();

        let name = text_field(raw, "name", &mut errors);
        let uid = text_field(raw, "uid", &mut errors);
        let picture = text_field(raw, "picture", &mut errors);
        let value = number_field(raw, "value", &mut errors).and_then(|v| {
            if v.fract() == 0.0 {
                Some(v as i64)
            } else {
                errors.insert("value".to_string(), "Value must be a whole number".to_string());
                None
            }
        });
        let latitude = number_field(raw, "latitude", &mut errors);
        let longitude = number_field(raw, "longitude", &mut errors);

        if let Some(lat) = latitude {
            if let Err(e) = self.validator.validate_latitude(lat) {
                errors.insert("latitude".to_string(), e.to_string());
            }
        }
        if let Some(lon) = longitude {
            if let Err(e) = self.validator.validate_longitude(lon) {
                errors.insert("longitude".to_string(), e.to_string());
            }
        }

        let fields = ImportRow {
            name: name.unwrap_or_default(),
            uid: uid.unwrap_or_default(),
            picture: picture.unwrap_or_default(),
            value: value.unwrap_or_default(),
        };
        if let Err(validation) = fields.validate() {
            for (field, field_errors) in validation.field_errors() {
                if errors.contains_key(field.as_ref()) {
                    continue;
                }
                if let Some(first) = field_errors.first() {
                    let message = first
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| first.code.to_string());
                    errors.insert(field.to_string(), message);
                }
            }
        }

        match (latitude, longitude) {
            (Some(latitude), Some(longitude)) if errors.is_empty() => Ok(CollectibleItem {
                uid: fields.uid,
                name: fields.name,
                latitude,
                longitude,
                picture: fields.picture,
                value: fields.value,
                collected_by: Vec::new(),
            }),
            _ => Err(errors),
        }
    }
}

/// Items within `radius_meters` of `point` (exact geodesic check).
pub fn find_within(
    items: &[CollectibleItem],
    point: Coordinate,
    radius_meters: f64,
) -> Vec<&CollectibleItem> {
    items
        .iter()
        .filter(|item| distance_meters(item.coordinate(), point) < radius_meters)
        .collect()
}

/// Text and reward fields of an import row, checked with `validator`.
#[derive(Debug, Validate)]
struct ImportRow {
    #[validate(length(min = 1, max = 255, message = "Name must not be empty"))]
    name: String,
    #[validate(length(min = 1, max = 255, message = "Uid must not be empty"))]
    uid: String,
    #[validate(url(message = "Picture must be a valid URL"))]
    picture: String,
    #[validate(range(min = 0, message = "Value must not be negative"))]
    value: i64,
}

fn text_field(
    raw: &Map<String, Value>,
    field: &str,
    errors: &mut BTreeMap<String, String>,
) -> Option<String> {
    match raw.get(field) {
        Some(Value::String(s)) => Some(s.trim().to_string()),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Null) | None => {
            errors.insert(field.to_string(), "This field is required".to_string());
            None
        }
        Some(_) => {
            errors.insert(field.to_string(), "Expected text".to_string());
            None
        }
    }
}

/// Spreadsheet cells may arrive as numbers or numeric strings.
fn number_field(
    raw: &Map<String, Value>,
    field: &str,
    errors: &mut BTreeMap<String, String>,
) -> Option<f64> {
    let parsed = match raw.get(field) {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().replace(',', ".").parse::<f64>().ok(),
        Some(Value::Null) | None => {
            errors.insert(field.to_string(), "This field is required".to_string());
            return None;
        }
        Some(_) => None,
    };
    if parsed.is_none() {
        errors.insert(field.to_string(), "A valid number is required".to_string());
    }
    parsed
}

/// Outcome of a bulk import.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ImportReport {
    pub imported: usize,
    pub failed: Vec<RejectedRow>,
}

/// A row that was not imported.
#[derive(Debug, Serialize, Deserialize)]
pub struct RejectedRow {
    /// 1-based row number
    pub row: usize,
    /// Error message per failing field
    pub errors: BTreeMap<String, String>,
    /// Submitted values of the failing fields
    pub values: BTreeMap<String, Value>,
}

impl RejectedRow {
    fn new(row: usize, raw: &Map<String, Value>, errors: BTreeMap<String, String>) -> Self {
        let values = errors
            .keys()
            .map(|field| (field.clone(), raw.get(field).cloned().unwrap_or(Value::Null)))
            .collect();
        Self {
            row,
            errors,
            values,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryDb;
    use serde_json::json;

    fn service() -> CollectibleService {
        CollectibleService::new(Arc::new(MemoryDb::new()), TelemetryConfig::default())
    }

    fn row(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("row must be an object"),
        }
    }

    fn valid_row(uid: &str) -> Map<String, Value> {
        row(json!({
            "name": "Golden Shoe",
            "uid": uid,
            "value": 10,
            "latitude": 55.7558,
            "longitude": 37.6173,
            "picture": "https://example.com/shoe.png"
        }))
    }

    #[test]
    fn test_find_within_radius() {
        let item = |uid: &str, lat: f64| CollectibleItem {
            uid: uid.to_string(),
            name: uid.to_string(),
            latitude: lat,
            longitude: 0.0,
            picture: String::new(),
            value: 1,
            collected_by: vec![],
        };
        // 0.0008 deg latitude ~ 88 m, 0.00135 deg ~ 149 m
        let items = vec![item("near", 0.0008), item("far", 0.00135)];

        let found = find_within(&items, Coordinate::new(0.0, 0.0), 100.0);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].uid, "near");
    }

    #[tokio::test]
    async fn test_import_partial_success() {
        let service = service();
        let rows = vec![
            valid_row("a"),
            row(json!({
                "name": "Bad Coordinates",
                "uid": "b",
                "value": 5,
                "latitude": 91.0,
                "longitude": 37.12345,
                "picture": "https://example.com/b.png"
            })),
            valid_row("c"),
        ];

        let report = service.import(rows).await.unwrap();

        assert_eq!(report.imported, 2);
        assert_eq!(report.failed.len(), 1);
        let rejected = &report.failed[0];
        assert_eq!(rejected.row, 2);
        assert!(rejected.errors.contains_key("latitude"));
        assert!(rejected.errors.contains_key("longitude"));
        assert_eq!(rejected.values["latitude"], json!(91.0));
        assert!(!rejected.values.contains_key("name"));
        assert_eq!(service.list().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_import_reports_missing_and_malformed_fields() {
        let service = service();
        let rows = vec![row(json!({
            "name": "",
            "uid": "x",
            "value": "lots",
            "latitude": "55.75",
            "picture": "not a url"
        }))];

        let report = service.import(rows).await.unwrap();

        assert_eq!(report.imported, 0);
        let errors = &report.failed[0].errors;
        assert!(errors.contains_key("name"));
        assert!(errors.contains_key("value"));
        assert!(errors.contains_key("longitude"));
        assert!(errors.contains_key("picture"));
        assert!(!errors.contains_key("latitude"));
        assert_eq!(report.failed[0].values["longitude"], Value::Null);
    }

    #[tokio::test]
    async fn test_import_rejects_duplicate_uid() {
        let service = service();
        let report = service
            .import(vec![valid_row("dup"), valid_row("dup")])
            .await
            .unwrap();

        assert_eq!(report.imported, 1);
        assert_eq!(report.failed.len(), 1);
        assert!(report.failed[0].errors.contains_key("uid"));
    }

    #[tokio::test]
    async fn test_collect_nearby_is_idempotent() {
        let service = service();
        service.import(vec![valid_row("shoe")]).await.unwrap();
        let near = Coordinate::new(55.7560, 37.6173);

        let first = service.collect_nearby("athlete-1", near).await.unwrap();
        let second = service.collect_nearby("athlete-1", near).await.unwrap();

        assert_eq!(first.len(), 1);
        assert!(second.is_empty());
        let items = service.collected_by("athlete-1").await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].collected_by, vec!["athlete-1"]);
    }
}

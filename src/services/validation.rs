// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Coordinate validation for telemetry points and collectible items.

use crate::config::TelemetryConfig;
use crate::models::Coordinate;
use std::fmt;

/// Which coordinate component was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinateField {
    Latitude,
    Longitude,
}

impl CoordinateField {
    pub fn as_str(self) -> &'static str {
        match self {
            CoordinateField::Latitude => "latitude",
            CoordinateField::Longitude => "longitude",
        }
    }

    fn bound(self) -> f64 {
        match self {
            CoordinateField::Latitude => 90.0,
            CoordinateField::Longitude => 180.0,
        }
    }
}

impl fmt::Display for CoordinateField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which rule the value broke.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinateRule {
    /// Outside [-bound, bound]
    Range,
    /// Too many digits after the decimal point
    Precision { max_digits: u32 },
}

/// A rejected coordinate value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateError {
    pub field: CoordinateField,
    pub rule: CoordinateRule,
    pub value: f64,
}

impl fmt::Display for CoordinateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.rule {
            CoordinateRule::Range => {
                let bound = self.field.bound();
                write!(
                    f,
                    "{} {} must be within [{:.1}, {:.1}] degrees",
                    capitalize(self.field.as_str()),
                    self.value,
                    -bound,
                    bound
                )
            }
            CoordinateRule::Precision { max_digits } => write!(
                f,
                "{} {} may have at most {} digits after the decimal point",
                capitalize(self.field.as_str()),
                self.value,
                max_digits
            ),
        }
    }
}

impl std::error::Error for CoordinateError {}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Validates coordinate range and decimal precision.
#[derive(Debug, Clone, Copy)]
pub struct CoordinateValidator {
    max_digits: u32,
}

impl CoordinateValidator {
    pub fn new(max_digits: u32) -> Self {
        Self { max_digits }
    }

    pub fn from_config(config: &TelemetryConfig) -> Self {
        Self::new(config.coordinate_precision)
    }

    /// Validate a latitude/longitude pair; latitude is checked first.
    pub fn validate(&self, point: Coordinate) -> Result<(), CoordinateError> {
        self.validate_latitude(point.latitude)?;
        self.validate_longitude(point.longitude)
    }

    pub fn validate_latitude(&self, value: f64) -> Result<(), CoordinateError> {
        self.check(CoordinateField::Latitude, value)
    }

    pub fn validate_longitude(&self, value: f64) -> Result<(), CoordinateError> {
        self.check(CoordinateField::Longitude, value)
    }

    fn check(&self, field: CoordinateField, value: f64) -> Result<(), CoordinateError> {
        let bound = field.bound();
        // NaN fails the range check too
        if !(-bound..=bound).contains(&value) {
            return Err(CoordinateError {
                field,
                rule: CoordinateRule::Range,
                value,
            });
        }
        if decimal_places(value) > self.max_digits {
            return Err(CoordinateError {
                field,
                rule: CoordinateRule::Precision {
                    max_digits: self.max_digits,
                },
                value,
            });
        }
        Ok(())
    }
}

/// Digits after the decimal point in the shortest representation that
/// round-trips to `value`.
pub fn decimal_places(value: f64) -> u32 {
    let repr = value.to_string();
    match repr.find('.') {
        Some(dot) => (repr.len() - dot - 1) as u32,
        None => 0,
    }
}

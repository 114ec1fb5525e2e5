//! Bounded in-memory location telemetry buffer.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::frames::unix_now;
use crate::observability::metrics;

/// Why a submitted point was rejected.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LocationError {
    #[error("latitude {0} is outside [-90, 90]")]
    Latitude(f64),
    #[error("longitude {0} is outside [-180, 180]")]
    Longitude(f64),
    #[error("field '{0}' must be a finite number")]
    NotFinite(&'static str),
    #[error("accuracy must not be negative")]
    NegativeAccuracy,
}

/// A location report as submitted by a client.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LocationPoint {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub altitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heading: Option<f64>,
    /// Client-side timestamp, seconds since epoch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
}

impl LocationPoint {
    pub fn validate(&self) -> Result<(), LocationError> {
        let numbers = [
            ("latitude", Some(self.latitude)),
            ("longitude", Some(self.longitude)),
            ("accuracy", self.accuracy),
            ("altitude", self.altitude),
            ("speed", self.speed),
            ("heading", self.heading),
        ];
        for (field, value) in numbers {
            if value.is_some_and(|v| !v.is_finite()) {
                return Err(LocationError::NotFinite(field));
            }
        }
        if !(-90.0..=90.0).contains(&self.latitude) {
            return Err(LocationError::Latitude(self.latitude));
        }
        if !(-180.0..=180.0).contains(&self.longitude) {
            return Err(LocationError::Longitude(self.longitude));
        }
        if self.accuracy.is_some_and(|a| a < 0.0) {
            return Err(LocationError::NegativeAccuracy);
        }
        Ok(())
    }
}

/// A point accepted by the server.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredLocation {
    pub seq: u64,
    /// Seconds since epoch, server clock.
    pub received_at: u64,
    #[serde(flatten)]
    pub point: LocationPoint,
}

#[derive(Debug)]
struct Inner {
    points: VecDeque<StoredLocation>,
    next_seq: u64,
}

/// Ring buffer of recent points; the oldest is dropped when full.
#[derive(Debug, Clone)]
pub struct LocationStore {
    inner: Arc<Mutex<Inner>>,
    capacity: usize,
}

impl LocationStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                points: VecDeque::with_capacity(capacity.min(1024)),
                next_seq: 1,
            })),
            capacity: capacity.max(1),
        }
    }

    /// Validate and append a point.
    pub fn record(&self, point: LocationPoint) -> Result<StoredLocation, LocationError> {
        point.validate()?;

        let mut inner = self.inner.lock().expect("location store mutex poisoned");
        let stored = StoredLocation {
            seq: inner.next_seq,
            received_at: unix_now(),
            point,
        };
        inner.next_seq += 1;
        if inner.points.len() == self.capacity {
            inner.points.pop_front();
        }
        inner.points.push_back(stored.clone());
        drop(inner);

        metrics::record_location();
        Ok(stored)
    }

    /// Up to `limit` most recent points, newest first, optionally for one device.
    pub fn recent(&self, limit: usize, device_id: Option<&str>) -> Vec<StoredLocation> {
        let inner = self.inner.lock().expect("location store mutex poisoned");
        inner
            .points
            .iter()
            .rev()
            .filter(|p| device_id.is_none() || p.point.device_id.as_deref() == device_id)
            .take(limit)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expect("location store mutex poisoned").points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

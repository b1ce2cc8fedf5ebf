//! Pluggable distance providers: trait abstraction for travel distance/duration lookups.
//!
//! Implementations, selectable via [`DistanceProviderKind`]:
//!
//! - **`StraightLineProvider`**: great-circle distance (h3o) at a fixed average speed. Zero dependencies.
//! - **`TableDistanceProvider`**: in-memory table of legs between address labels (tests, fixtures).
//! - **`OsrmDistanceProvider`** (feature `osrm`): calls a local/remote OSRM HTTP endpoint.
//! - **`Precomputed`** (feature `precomputed`): a `TableDistanceProvider` loaded from a bincode file.
//!
//! The provider is stored as a `Box<dyn DistanceProvider>` ECS resource. Network and file
//! backed providers are wrapped in [`CachedDistanceProvider`], since the engine asks for the
//! same address pairs over and over.

use std::collections::HashMap;
use std::fmt;
use std::num::NonZeroUsize;
use std::sync::Mutex;

use bevy_ecs::prelude::Resource;
use lru::LruCache;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Core types
// ---------------------------------------------------------------------------

/// WGS84 coordinates in degrees.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

/// A place the teams can drive to. Two addresses denote the same place when their labels match.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Address {
    pub label: String,
    /// Resolved coordinates; `None` until geocoded.
    #[serde(default)]
    pub coordinates: Option<Coordinates>,
}

impl Address {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            coordinates: None,
        }
    }

    pub fn with_coordinates(label: impl Into<String>, lat: f64, lng: f64) -> Self {
        Self {
            label: label.into(),
            coordinates: Some(Coordinates { lat, lng }),
        }
    }

    pub fn same_place(&self, other: &Address) -> bool {
        self.label == other.label
    }

    fn require_coordinates(&self) -> Result<Coordinates, RoutingError> {
        self.coordinates
            .ok_or_else(|| RoutingError::MissingCoordinates(self.label.clone()))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

/// Result of a distance query between two addresses.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Leg {
    /// Road-network distance in kilometres.
    pub distance_km: f64,
    /// Typical (non-emergency) driving time in minutes.
    pub duration_minutes: f64,
}

impl Leg {
    pub const ZERO: Leg = Leg {
        distance_km: 0.0,
        duration_minutes: 0.0,
    };
}

#[derive(Debug, thiserror::Error)]
pub enum RoutingError {
    #[error("address {0:?} has no resolved coordinates")]
    MissingCoordinates(String),
    #[error("address {0:?} has coordinates out of range")]
    InvalidCoordinates(String),
    #[error("no route from {from:?} to {to:?}")]
    NoRoute { from: String, to: String },
    #[cfg(feature = "osrm")]
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("routing service error: {0}")]
    Api(String),
}

/// Which distance backend to use. Serializable so it can live in [`crate::scenario::SimulationParams`].
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub enum DistanceProviderKind {
    /// Great-circle distance at an average speed, zero external dependencies.
    StraightLine { speed_kmh: f64 },
    /// Fixed symmetric legs between address labels.
    Table { legs: Vec<TableLeg> },
    /// OSRM HTTP endpoint (e.g. `"http://localhost:5000"`).
    #[cfg(feature = "osrm")]
    Osrm { endpoint: String },
    /// Pre-computed leg table loaded from a binary file at startup.
    #[cfg(feature = "precomputed")]
    Precomputed { path: String },
}

impl Default for DistanceProviderKind {
    fn default() -> Self {
        Self::StraightLine {
            speed_kmh: DEFAULT_AVERAGE_SPEED_KMH,
        }
    }
}

/// One symmetric entry of a [`DistanceProviderKind::Table`].
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct TableLeg {
    pub from: String,
    pub to: String,
    pub distance_km: f64,
    pub duration_minutes: f64,
}

/// Trait for distance backends. Implementations must be `Send + Sync` so the
/// provider can be stored as a shared ECS resource.
pub trait DistanceProvider: Send + Sync {
    /// Distance and typical driving time from `from` to `to`.
    fn distance_and_duration(&self, from: &Address, to: &Address) -> Result<Leg, RoutingError>;
}

/// ECS resource wrapping a boxed distance provider.
#[derive(Resource)]
pub struct DistanceProviderResource(pub Box<dyn DistanceProvider>);

impl std::ops::Deref for DistanceProviderResource {
    type Target = dyn DistanceProvider;

    fn deref(&self) -> &Self::Target {
        self.0.as_ref()
    }
}

// ---------------------------------------------------------------------------
// Straight-line provider (always available)
// ---------------------------------------------------------------------------

/// Average urban driving speed used when nothing better is configured.
pub const DEFAULT_AVERAGE_SPEED_KMH: f64 = 40.0;

/// Road distance is longer than the great-circle distance; this is the usual urban ratio.
const ROAD_DETOUR_FACTOR: f64 = 1.3;

pub struct StraightLineProvider {
    pub speed_kmh: f64,
}

impl Default for StraightLineProvider {
    fn default() -> Self {
        Self {
            speed_kmh: DEFAULT_AVERAGE_SPEED_KMH,
        }
    }
}

impl DistanceProvider for StraightLineProvider {
    fn distance_and_duration(&self, from: &Address, to: &Address) -> Result<Leg, RoutingError> {
        let a = to_lat_lng(from)?;
        let b = to_lat_lng(to)?;
        let distance_km = a.distance_km(b) * ROAD_DETOUR_FACTOR;
        let duration_minutes = if distance_km > 0.0 && self.speed_kmh > 0.0 {
            distance_km / self.speed_kmh * 60.0
        } else {
            0.0
        };
        Ok(Leg {
            distance_km,
            duration_minutes,
        })
    }
}

fn to_lat_lng(address: &Address) -> Result<h3o::LatLng, RoutingError> {
    let coordinates = address.require_coordinates()?;
    h3o::LatLng::new(coordinates.lat, coordinates.lng)
        .map_err(|_| RoutingError::InvalidCoordinates(address.label.clone()))
}

// ---------------------------------------------------------------------------
// Table provider
// ---------------------------------------------------------------------------

/// Legs keyed by `(from_label, to_label)`. Legs inserted with [`Self::with_leg`] are symmetric.
#[derive(Clone, Debug, Default)]
pub struct TableDistanceProvider {
    legs: HashMap<(String, String), Leg>,
}

impl TableDistanceProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`Self::insert_symmetric`] taking the typical driving time only.
    pub fn with_leg(mut self, from: &str, to: &str, distance_km: f64, duration_minutes: f64) -> Self {
        self.insert_symmetric(
            from,
            to,
            Leg {
                distance_km,
                duration_minutes,
            },
        );
        self
    }

    pub fn insert_symmetric(&mut self, from: &str, to: &str, leg: Leg) {
        self.legs.insert((from.to_string(), to.to_string()), leg);
        self.legs.insert((to.to_string(), from.to_string()), leg);
    }

    pub fn len(&self) -> usize {
        self.legs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.legs.is_empty()
    }
}

impl DistanceProvider for TableDistanceProvider {
    fn distance_and_duration(&self, from: &Address, to: &Address) -> Result<Leg, RoutingError> {
        if from.same_place(to) {
            return Ok(Leg::ZERO);
        }
        self.legs
            .get(&(from.label.clone(), to.label.clone()))
            .copied()
            .ok_or_else(|| RoutingError::NoRoute {
                from: from.label.clone(),
                to: to.label.clone(),
            })
    }
}

// ---------------------------------------------------------------------------
// OSRM provider (behind `osrm` feature)
// ---------------------------------------------------------------------------

#[cfg(feature = "osrm")]
pub mod osrm {
    use super::*;
    use reqwest::blocking::Client;
    use std::time::Duration;

    /// Driving distances via an OSRM HTTP endpoint.
    pub struct OsrmDistanceProvider {
        client: Client,
        endpoint: String,
    }

    impl OsrmDistanceProvider {
        pub fn new(endpoint: &str) -> Result<Self, RoutingError> {
            let client = Client::builder().timeout(Duration::from_secs(5)).build()?;
            Ok(Self {
                client,
                endpoint: endpoint.trim_end_matches('/').to_string(),
            })
        }
    }

    #[derive(Deserialize)]
    struct OsrmResponse {
        code: String,
        routes: Option<Vec<OsrmRoute>>,
    }

    #[derive(Deserialize)]
    struct OsrmRoute {
        distance: f64, // metres
        duration: f64, // seconds
    }

    impl DistanceProvider for OsrmDistanceProvider {
        fn distance_and_duration(&self, from: &Address, to: &Address) -> Result<Leg, RoutingError> {
            let a = from.require_coordinates()?;
            let b = to.require_coordinates()?;
            let url = format!(
                "{}/route/v1/driving/{},{};{},{}?overview=false",
                self.endpoint, a.lng, a.lat, b.lng, b.lat,
            );

            let resp: OsrmResponse = self.client.get(&url).send()?.json()?;
            if resp.code != "Ok" {
                return Err(RoutingError::Api(resp.code));
            }
            let route = resp
                .routes
                .and_then(|routes| routes.into_iter().next())
                .ok_or_else(|| RoutingError::NoRoute {
                    from: from.label.clone(),
                    to: to.label.clone(),
                })?;

            Ok(Leg {
                distance_km: route.distance / 1000.0,
                duration_minutes: route.duration / 60.0,
            })
        }
    }
}

// ---------------------------------------------------------------------------
// Pre-computed table on disk (behind `precomputed` feature)
// ---------------------------------------------------------------------------

#[cfg(feature = "precomputed")]
mod precomputed {
    use super::*;
    use std::fs;

    impl TableDistanceProvider {
        /// Load from a bincode-serialized file.
        pub fn from_file(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
            let data = fs::read(path)?;
            let legs: HashMap<(String, String), Leg> = bincode::deserialize(&data)?;
            Ok(Self { legs })
        }

        /// Serialize the table to a file.
        pub fn save_to_file(&self, path: &str) -> Result<(), Box<dyn std::error::Error>> {
            let data = bincode::serialize(&self.legs)?;
            fs::write(path, data)?;
            Ok(())
        }
    }
}

// ---------------------------------------------------------------------------
// Caching wrapper
// ---------------------------------------------------------------------------

/// LRU-cached wrapper around any [`DistanceProvider`].
///
/// Cache key is `(from_label, to_label)` (directional). Failures are not cached.
pub struct CachedDistanceProvider {
    inner: Box<dyn DistanceProvider>,
    cache: Mutex<LruCache<(String, String), Leg>>,
}

impl CachedDistanceProvider {
    pub fn new(inner: Box<dyn DistanceProvider>, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner,
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub fn cached_len(&self) -> usize {
        self.cache.lock().map(|cache| cache.len()).unwrap_or(0)
    }
}

impl DistanceProvider for CachedDistanceProvider {
    fn distance_and_duration(&self, from: &Address, to: &Address) -> Result<Leg, RoutingError> {
        let key = (from.label.clone(), to.label.clone());

        if let Ok(mut cache) = self.cache.lock() {
            if let Some(leg) = cache.get(&key) {
                return Ok(*leg);
            }
        }

        let leg = self.inner.distance_and_duration(from, to)?;
        if let Ok(mut cache) = self.cache.lock() {
            cache.put(key, leg);
        }
        Ok(leg)
    }
}

// ---------------------------------------------------------------------------
// Factory: build a provider from DistanceProviderKind
// ---------------------------------------------------------------------------

/// Default leg cache capacity (used by OSRM and precomputed providers).
#[cfg(any(feature = "osrm", feature = "precomputed"))]
const DEFAULT_LEG_CACHE_CAPACITY: usize = 20_000;

/// Construct a boxed [`DistanceProvider`] from a [`DistanceProviderKind`] descriptor.
///
/// Backends that fail to initialise fall back to the straight-line provider with a warning.
pub fn build_distance_provider(kind: &DistanceProviderKind) -> Box<dyn DistanceProvider> {
    match kind {
        DistanceProviderKind::StraightLine { speed_kmh } => Box::new(StraightLineProvider {
            speed_kmh: *speed_kmh,
        }),

        DistanceProviderKind::Table { legs } => {
            let mut table = TableDistanceProvider::new();
            for leg in legs {
                table.insert_symmetric(
                    &leg.from,
                    &leg.to,
                    Leg {
                        distance_km: leg.distance_km,
                        duration_minutes: leg.duration_minutes,
                    },
                );
            }
            Box::new(table)
        }

        #[cfg(feature = "osrm")]
        DistanceProviderKind::Osrm { endpoint } => match osrm::OsrmDistanceProvider::new(endpoint) {
            Ok(provider) => Box::new(CachedDistanceProvider::new(
                Box::new(provider),
                DEFAULT_LEG_CACHE_CAPACITY,
            )),
            Err(err) => {
                tracing::warn!(%endpoint, %err, "OSRM client unavailable, using straight-line distances");
                Box::new(StraightLineProvider::default())
            }
        },

        #[cfg(feature = "precomputed")]
        DistanceProviderKind::Precomputed { path } => match TableDistanceProvider::from_file(path) {
            Ok(table) => Box::new(CachedDistanceProvider::new(
                Box::new(table),
                DEFAULT_LEG_CACHE_CAPACITY,
            )),
            Err(err) => {
                tracing::warn!(%path, %err, "failed to load leg table, using straight-line distances");
                Box::new(StraightLineProvider::default())
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingProvider {
        calls: Arc<AtomicUsize>,
    }

    impl DistanceProvider for CountingProvider {
        fn distance_and_duration(&self, _from: &Address, _to: &Address) -> Result<Leg, RoutingError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Leg {
                distance_km: 3.0,
                duration_minutes: 6.0,
            })
        }
    }

    #[test]
    fn straight_line_requires_coordinates() {
        let provider = StraightLineProvider::default();
        let err = provider
            .distance_and_duration(&Address::new("nowhere"), &Address::with_coordinates("b", 50.0, 19.0))
            .unwrap_err();
        assert!(matches!(err, RoutingError::MissingCoordinates(label) if label == "nowhere"));
    }

    #[test]
    fn straight_line_duration_follows_speed() {
        let provider = StraightLineProvider { speed_kmh: 60.0 };
        let krakow = Address::with_coordinates("Krakow", 50.0647, 19.9450);
        let chrzanow = Address::with_coordinates("Chrzanow", 50.1355, 19.4022);
        let leg = provider.distance_and_duration(&krakow, &chrzanow).expect("leg");
        assert!(leg.distance_km > 40.0 && leg.distance_km < 60.0, "{leg:?}");
        assert!((leg.duration_minutes - leg.distance_km).abs() < 1e-9);
    }

    #[test]
    fn table_is_symmetric_and_zero_for_same_place() {
        let table = TableDistanceProvider::new().with_leg("a", "b", 2.0, 5.0);
        let a = Address::new("a");
        let b = Address::new("b");
        assert_eq!(table.distance_and_duration(&b, &a).unwrap().duration_minutes, 5.0);
        assert_eq!(table.distance_and_duration(&a, &a).unwrap(), Leg::ZERO);
        assert!(matches!(
            table.distance_and_duration(&a, &Address::new("c")),
            Err(RoutingError::NoRoute { .. })
        ));
    }

    #[test]
    fn cache_queries_inner_provider_once_per_pair() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cached = CachedDistanceProvider::new(
            Box::new(CountingProvider {
                calls: Arc::clone(&calls),
            }),
            8,
        );
        let a = Address::new("a");
        let b = Address::new("b");
        for _ in 0..3 {
            cached.distance_and_duration(&a, &b).expect("leg");
        }
        cached.distance_and_duration(&b, &a).expect("leg");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(cached.cached_len(), 2);
    }
}

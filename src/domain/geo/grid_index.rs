use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::domain::geo::point::{EARTH_RADIUS_KM, GeoPoint, haversine_km};
use crate::domain::geo::query::{GeoQuery, MAX_RESULTS};
use crate::domain::utils::id::{NodeId, PoolId};
use crate::error::{Error, Result};

/// Answers "does this node have at least one free unit in this pool".
/// Implemented by the capacity ledger and handed in explicitly, so the index
/// never reaches into global state.
pub trait PoolAvailability: Send + Sync {
    fn has_available(&self, node: &NodeId, pool: &PoolId) -> bool;
}

impl std::fmt::Debug for dyn PoolAvailability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PoolAvailability")
    }
}

/// One ranked search hit.
#[derive(Debug, Clone)]
pub struct NodeDistance {
    pub node: NodeId,
    pub distance_km: f64,
}

/// Radius-bounded nearest-node lookup. Read-only; results are ordered
/// ascending by distance and truncated to [`MAX_RESULTS`].
pub trait ProximitySearch: Send + Sync {
    fn find_within(&self, query: &GeoQuery) -> Result<Vec<NodeDistance>>;
}

/// Width of one index cell in degrees.
const CELL_SIZE_DEG: f64 = 1.0;

/// Surface distance of one degree of latitude (and of longitude at the
/// equator) on the shared Earth sphere.
const KM_PER_DEG: f64 = EARTH_RADIUS_KM * std::f64::consts::PI / 180.0;

const LNG_CELLS: i32 = (360.0 / CELL_SIZE_DEG) as i32;
const MAX_LAT_CELL: i32 = (90.0 / CELL_SIZE_DEG) as i32 - 1;

type Cell = (i32, i32);

#[derive(Debug, Default)]
struct IndexInner {
    /// Node ids bucketed by the cell containing their position.
    cells: HashMap<Cell, Vec<NodeId>>,

    /// Reverse lookup, needed to move a node out of its old cell on a
    /// location update.
    positions: HashMap<NodeId, GeoPoint>,
}

/// Spatial index partitioning the globe into fixed latitude/longitude cells.
///
/// A query only touches the cell rows the search radius can reach, so the
/// cost scales with the covered area plus the result count instead of the
/// total node count. All registered nodes are indexed, regardless of
/// remaining capacity; pool filtering happens at query time.
#[derive(Debug)]
pub struct GridIndex {
    inner: RwLock<IndexInner>,
    availability: Arc<dyn PoolAvailability>,
}

fn lat_cell(lat: f64) -> i32 {
    let cell = (lat / CELL_SIZE_DEG).floor() as i32;
    cell.clamp(-MAX_LAT_CELL - 1, MAX_LAT_CELL)
}

fn lng_cell(lng: f64) -> i32 {
    let cell = (lng / CELL_SIZE_DEG).floor() as i32;
    // 180.0 belongs to the same cell as -180.0
    if cell >= LNG_CELLS / 2 { cell - LNG_CELLS } else { cell }
}

fn cell_of(point: GeoPoint) -> Cell {
    (lat_cell(point.lat), lng_cell(point.lng))
}

/// Cells covered by `radius_km` in one direction along an axis where one
/// cell spans `km_per_cell`. Clamped to the full grid width so an oversized
/// radius covers the globe instead of overflowing the cast.
fn span_cells(radius_km: f64, km_per_cell: f64) -> i32 {
    let cells = (radius_km / km_per_cell).ceil() + 1.0;
    if cells >= LNG_CELLS as f64 { LNG_CELLS } else { cells as i32 }
}

impl GridIndex {
    pub fn new(availability: Arc<dyn PoolAvailability>) -> Self {
        GridIndex { inner: RwLock::new(IndexInner::default()), availability }
    }

    /// Inserts a node or moves an already indexed node to a new position.
    pub fn upsert(&self, node: NodeId, position: GeoPoint) -> Result<()> {
        let mut guard = self.inner.write().map_err(|_| Error::IndexUnavailable("grid index lock poisoned".to_string()))?;

        if let Some(previous) = guard.positions.insert(node.clone(), position) {
            let old_cell = cell_of(previous);
            if let Some(bucket) = guard.cells.get_mut(&old_cell) {
                bucket.retain(|id| id != &node);
            }
        }

        guard.cells.entry(cell_of(position)).or_default().push(node);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.inner.read().map(|guard| guard.positions.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Collects the cells of one latitude row that the search radius can
    /// reach, handling antimeridian wrap-around.
    fn row_cells(&self, row: i32, origin_lng_cell: i32, radius_km: f64) -> Vec<Cell> {
        // The longitude span is widest at the row edge furthest from the
        // equator. cos() shrinks towards the poles, so clamp it away from 0.
        let edge_a = (row as f64 * CELL_SIZE_DEG).abs();
        let edge_b = ((row + 1) as f64 * CELL_SIZE_DEG).abs();
        let max_abs_lat = edge_a.max(edge_b).min(90.0);
        let cos_lat = max_abs_lat.to_radians().cos().max(1e-6);

        let lng_span_cells = span_cells(radius_km, KM_PER_DEG * cos_lat * CELL_SIZE_DEG);

        if lng_span_cells * 2 + 1 >= LNG_CELLS {
            // Radius wraps the whole row.
            return (-LNG_CELLS / 2..LNG_CELLS / 2).map(|lng| (row, lng)).collect();
        }

        let span = lng_span_cells;
        (-span..=span)
            .map(|offset| {
                let wrapped = (origin_lng_cell + offset + LNG_CELLS / 2).rem_euclid(LNG_CELLS) - LNG_CELLS / 2;
                (row, wrapped)
            })
            .collect()
    }
}

impl ProximitySearch for GridIndex {
    fn find_within(&self, query: &GeoQuery) -> Result<Vec<NodeDistance>> {
        let lat_span_cells = span_cells(query.radius_km, KM_PER_DEG * CELL_SIZE_DEG);

        let origin_lat_cell = lat_cell(query.origin.lat);
        let row_min = origin_lat_cell.saturating_sub(lat_span_cells).max(-MAX_LAT_CELL - 1);
        let row_max = origin_lat_cell.saturating_add(lat_span_cells).min(MAX_LAT_CELL);
        let origin_lng_cell = lng_cell(query.origin.lng);

        let guard = self.inner.read().map_err(|_| Error::IndexUnavailable("grid index lock poisoned".to_string()))?;

        let mut hits: Vec<NodeDistance> = Vec::new();

        for row in row_min..=row_max {
            for cell in self.row_cells(row, origin_lng_cell, query.radius_km) {
                let Some(bucket) = guard.cells.get(&cell) else {
                    continue;
                };

                for node in bucket {
                    let position = guard.positions[node];
                    let distance_km = haversine_km(query.origin, position);

                    if distance_km > query.radius_km {
                        continue;
                    }

                    if let Some(pool) = &query.pool {
                        if !self.availability.has_available(node, pool) {
                            continue;
                        }
                    }

                    hits.push(NodeDistance { node: node.clone(), distance_km });
                }
            }
        }

        drop(guard);

        hits.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km).then_with(|| a.node.cmp(&b.node)));
        hits.truncate(MAX_RESULTS);

        log::debug!("Proximity query at ({}, {}) radius {} km matched {} node(s).", query.origin.lat, query.origin.lng, query.radius_km, hits.len());

        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_of_clamps_poles_and_wraps_antimeridian() {
        assert_eq!(lat_cell(90.0), MAX_LAT_CELL);
        assert_eq!(lat_cell(-90.0), -MAX_LAT_CELL - 1);
        assert_eq!(lng_cell(180.0), lng_cell(-180.0));
        assert_eq!(cell_of(GeoPoint { lat: 0.0, lng: 0.0 }), (0, 0));
    }

    #[test]
    fn test_row_cells_wrap_across_antimeridian() {
        struct NoPools;
        impl PoolAvailability for NoPools {
            fn has_available(&self, _: &NodeId, _: &PoolId) -> bool {
                false
            }
        }

        let index = GridIndex::new(Arc::new(NoPools));
        let cells = index.row_cells(0, lng_cell(179.5), 150.0);

        assert!(cells.contains(&(0, lng_cell(179.5))));
        assert!(cells.contains(&(0, lng_cell(-179.5))));
    }
}

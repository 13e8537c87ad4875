//! Drifting clouds and the weather tiles they leave behind.
//!
//! Each cloud occupies one coordinate and takes a random orthogonal step
//! whenever its timer fires, wrapping around the edges of the global region.
//! The padded region re-centres as claims spread, so clouds left outside it
//! are pulled back onto its nearest edge.
//! A weather tile counts the clouds standing on it; its severity follows the
//! count, and it disappears once the last cloud leaves.

use plotcoin_types::{CloudId, GridCoord, PresentationCommand, WeatherKind};
use rand::Rng;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::WorldError;
use crate::region::BoundingRegion;
use crate::spatial::SpatialIndex;

/// Orthogonal unit steps a cloud may take.
const STEPS: [(i32, i32); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];

/// A weather overlay on one coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeatherTile {
    kind: WeatherKind,
    cloud_count: u32,
}

impl WeatherTile {
    /// A tile holding exactly one cloud.
    pub const fn single() -> Self {
        Self {
            kind: WeatherKind::Cloud,
            cloud_count: 1,
        }
    }

    /// Current severity.
    pub const fn kind(&self) -> WeatherKind {
        self.kind
    }

    /// Clouds currently on the tile.
    pub const fn cloud_count(&self) -> u32 {
        self.cloud_count
    }

    /// The tile after one more cloud arrives.
    #[must_use]
    pub fn with_cloud_added(self) -> Self {
        let cloud_count = self.cloud_count.saturating_add(1);
        Self {
            kind: WeatherKind::from_cloud_count(cloud_count).unwrap_or(self.kind),
            cloud_count,
        }
    }

    /// The tile after one cloud leaves, or `None` if it is now clear.
    #[must_use]
    pub fn with_cloud_removed(self) -> Option<Self> {
        let cloud_count = self.cloud_count.saturating_sub(1);
        WeatherKind::from_cloud_count(cloud_count).map(|kind| Self { kind, cloud_count })
    }
}

/// A single drifting cloud.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cloud {
    /// Identifier used by the cloud's timer.
    pub id: CloudId,
    /// Where the cloud currently is.
    pub position: GridCoord,
}

/// The outcome of moving one cloud.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloudMove {
    /// Where the cloud was.
    pub from: GridCoord,
    /// Where it is now.
    pub to: GridCoord,
    /// Drawing commands for both affected tiles.
    pub commands: Vec<PresentationCommand>,
}

/// All clouds in the session.
#[derive(Debug, Clone, Default)]
pub struct WeatherSystem {
    clouds: Vec<Cloud>,
}

impl WeatherSystem {
    /// Create a system with no clouds.
    pub const fn new() -> Self {
        Self { clouds: Vec::new() }
    }

    /// All clouds in spawn order.
    pub fn clouds(&self) -> &[Cloud] {
        &self.clouds
    }

    /// Spawn a cloud at a random coordinate inside the global region.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::EmptyGlobalRegion`] if no claim tile exists yet.
    pub fn spawn_cloud<R: Rng + ?Sized>(
        &mut self,
        index: &mut SpatialIndex,
        rng: &mut R,
    ) -> Result<(CloudId, PresentationCommand), WorldError> {
        let region = index.global_region().ok_or(WorldError::EmptyGlobalRegion)?;
        let position = GridCoord::new(
            rng.random_range(region.min_x()..=region.max_x()),
            rng.random_range(region.min_y()..=region.max_y()),
        );
        let id = CloudId::new();
        self.clouds.push(Cloud { id, position });
        let command = arrive(index, position);
        debug!(cloud = %id, %position, "cloud spawned");
        Ok((id, command))
    }

    /// Move a cloud one random orthogonal step.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::CloudNotFound`] for an unknown cloud, or
    /// [`WorldError::EmptyGlobalRegion`] if no claim tile exists.
    pub fn step_cloud<R: Rng + ?Sized>(
        &mut self,
        id: CloudId,
        index: &mut SpatialIndex,
        rng: &mut R,
    ) -> Result<CloudMove, WorldError> {
        let (dx, dy) = STEPS.choose(rng).copied().unwrap_or((0, 0));
        self.move_cloud(id, dx, dy, index)
    }

    /// Move a cloud by `(dx, dy)`, wrapping around the global region.
    ///
    /// # Errors
    ///
    /// Same as [`WeatherSystem::step_cloud`].
    pub fn move_cloud(
        &mut self,
        id: CloudId,
        dx: i32,
        dy: i32,
        index: &mut SpatialIndex,
    ) -> Result<CloudMove, WorldError> {
        let region = index.global_region().ok_or(WorldError::EmptyGlobalRegion)?;
        let cloud = self
            .clouds
            .iter_mut()
            .find(|cloud| cloud.id == id)
            .ok_or(WorldError::CloudNotFound(id))?;

        let from = cloud.position;
        let to = wrap(from.offset(dx, dy), &region);
        cloud.position = to;

        let commands = vec![depart(index, from), arrive(index, to)];
        Ok(CloudMove { from, to, commands })
    }

    /// Move every cloud the global region no longer covers to the nearest
    /// coordinate inside it. Returns one move per relocated cloud.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::EmptyGlobalRegion`] if no claim tile exists.
    pub fn confine(&mut self, index: &mut SpatialIndex) -> Result<Vec<CloudMove>, WorldError> {
        let region = index.global_region().ok_or(WorldError::EmptyGlobalRegion)?;
        let mut moves = Vec::new();
        for cloud in self
            .clouds
            .iter_mut()
            .filter(|cloud| !region.contains(cloud.position))
        {
            let from = cloud.position;
            let to = clamp(from, &region);
            cloud.position = to;
            debug!(cloud = %cloud.id, %from, %to, "cloud pulled back into the global region");
            let commands = vec![depart(index, from), arrive(index, to)];
            moves.push(CloudMove { from, to, commands });
        }
        Ok(moves)
    }
}

/// Take one cloud off the tile at `coord`.
fn depart(index: &mut SpatialIndex, coord: GridCoord) -> PresentationCommand {
    match index
        .remove_weather_tile(coord)
        .and_then(WeatherTile::with_cloud_removed)
    {
        Some(tile) => {
            index.register_weather_tile(coord, tile);
            PresentationCommand::DrawWeatherTile {
                coord,
                weather: tile.kind(),
            }
        }
        None => PresentationCommand::RemoveTiles {
            coords: vec![coord],
        },
    }
}

/// Put one cloud on the tile at `coord`.
fn arrive(index: &mut SpatialIndex, coord: GridCoord) -> PresentationCommand {
    let tile = index
        .weather_tile(coord)
        .map_or_else(WeatherTile::single, WeatherTile::with_cloud_added);
    index.register_weather_tile(coord, tile);
    PresentationCommand::DrawWeatherTile {
        coord,
        weather: tile.kind(),
    }
}

/// Wrap a coordinate that stepped past an edge of `region` to the opposite
/// edge.
const fn wrap(coord: GridCoord, region: &BoundingRegion) -> GridCoord {
    let mut x = coord.x;
    let mut y = coord.y;
    if x < region.min_x() {
        x = region.max_x();
    } else if x > region.max_x() {
        x = region.min_x();
    }
    if y < region.min_y() {
        y = region.max_y();
    } else if y > region.max_y() {
        y = region.min_y();
    }
    GridCoord::new(x, y)
}

/// The coordinate inside `region` closest to `coord`.
fn clamp(coord: GridCoord, region: &BoundingRegion) -> GridCoord {
    GridCoord::new(
        coord.x.clamp(region.min_x(), region.max_x()),
        coord.y.clamp(region.min_y(), region.max_y()),
    )
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::arithmetic_side_effects
)]
mod tests {
    use plotcoin_types::ClaimId;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    fn seeded_index() -> SpatialIndex {
        let mut index = SpatialIndex::new(10, 5);
        index.register_claim_tile(GridCoord::ORIGIN, ClaimId::new()).unwrap();
        index
    }

    #[test]
    fn tile_severity_follows_count() {
        let tile = WeatherTile::single();
        assert_eq!(tile.kind(), WeatherKind::Cloud);
        let storm = tile.with_cloud_added();
        assert_eq!(storm.kind(), WeatherKind::Storm);
        let hell = storm.with_cloud_added();
        assert_eq!(hell.kind(), WeatherKind::HellRain);
        assert_eq!(hell.cloud_count(), 3);
        assert_eq!(storm.with_cloud_removed(), Some(tile));
        assert_eq!(tile.with_cloud_removed(), None);
    }

    #[test]
    fn spawn_needs_a_region() {
        let mut index = SpatialIndex::new(10, 5);
        let mut weather = WeatherSystem::new();
        let mut rng = StdRng::seed_from_u64(1);
        let result = weather.spawn_cloud(&mut index, &mut rng);
        assert!(matches!(result, Err(WorldError::EmptyGlobalRegion)));
    }

    #[test]
    fn spawned_cloud_is_inside_region() {
        let mut index = seeded_index();
        let mut weather = WeatherSystem::new();
        let mut rng = StdRng::seed_from_u64(9);
        for _ in 0..20 {
            weather.spawn_cloud(&mut index, &mut rng).unwrap();
        }
        let region = index.global_region().unwrap();
        for cloud in weather.clouds() {
            assert!(region.contains(cloud.position));
            assert!(index.weather_tile(cloud.position).is_some());
        }
    }

    #[test]
    fn merging_clouds_form_a_storm_then_split() {
        let mut index = seeded_index();
        let mut weather = WeatherSystem::new();
        let mut rng = StdRng::seed_from_u64(5);
        let (a, _) = weather.spawn_cloud(&mut index, &mut rng).unwrap();
        let start = weather.clouds()[0].position;

        // Park a second cloud one step above the first.
        let (b, _) = weather.spawn_cloud(&mut index, &mut rng).unwrap();
        let b_pos = weather.clouds()[1].position;
        let region = index.global_region().unwrap();
        let above = wrap(start.offset(0, 1), &region);
        let dx = above.x - b_pos.x;
        let dy = above.y - b_pos.y;
        weather.move_cloud(b, dx, dy, &mut index).unwrap();

        let step = weather.move_cloud(a, 0, 1, &mut index).unwrap();
        assert_eq!(step.to, above);
        assert_eq!(index.weather_tile(above).map(|t| t.kind()), Some(WeatherKind::Storm));
        assert!(index.weather_tile(start).is_none());

        let step = weather.move_cloud(a, 0, 1, &mut index).unwrap();
        assert_eq!(index.weather_tile(above).map(|t| t.kind()), Some(WeatherKind::Cloud));
        assert_eq!(index.weather_tile(step.to).map(|t| t.kind()), Some(WeatherKind::Cloud));
    }

    #[test]
    fn clouds_wrap_across_the_region() {
        let mut index = seeded_index();
        let mut weather = WeatherSystem::new();
        let mut rng = StdRng::seed_from_u64(2);
        let (id, _) = weather.spawn_cloud(&mut index, &mut rng).unwrap();
        let region = index.global_region().unwrap();

        for _ in 0..region.width() {
            let step = weather.move_cloud(id, 1, 0, &mut index).unwrap();
            assert!(index.weather_tile(step.from).is_none());
            assert!(region.contains(step.to));
            assert_eq!(
                step.commands[0],
                PresentationCommand::RemoveTiles {
                    coords: vec![step.from]
                }
            );
        }
        // A full lap ends where it started.
        assert_eq!(index.weather_tiles().count(), 1);
    }

    #[test]
    fn growing_region_pulls_stranded_clouds_back_in() {
        let mut index = seeded_index();
        let mut weather = WeatherSystem::new();
        let mut rng = StdRng::seed_from_u64(4);
        let (id, _) = weather.spawn_cloud(&mut index, &mut rng).unwrap();

        // Park the cloud on the west edge of the padding around the origin.
        let before = index.global_region().unwrap();
        assert!(before.min_x() < 0);
        let start = weather.clouds()[0].position;
        weather
            .move_cloud(id, before.min_x() - start.x, 0, &mut index)
            .unwrap();
        let parked = weather.clouds()[0].position;
        assert_eq!(parked.x, before.min_x());

        // A claim tile far east makes the region wide enough to need no
        // padding, so its west edge moves to x = 0.
        index
            .register_claim_tile(GridCoord::new(12, 0), ClaimId::new())
            .unwrap();
        let after = index.global_region().unwrap();
        assert_eq!(after.min_x(), 0);
        assert!(!after.contains(parked));

        let moves = weather.confine(&mut index).unwrap();
        assert_eq!(moves.len(), 1);
        assert_eq!(moves[0].from, parked);
        assert_eq!(moves[0].to, GridCoord::new(0, parked.y));
        assert!(after.contains(weather.clouds()[0].position));
        assert!(index.weather_tile(parked).is_none());
        assert!(index.weather_tile(moves[0].to).is_some());

        // Nothing left to move.
        assert!(weather.confine(&mut index).unwrap().is_empty());
    }

    #[test]
    fn unknown_cloud_is_an_error() {
        let mut index = seeded_index();
        let mut weather = WeatherSystem::new();
        let result = weather.move_cloud(CloudId::new(), 1, 0, &mut index);
        assert!(matches!(result, Err(WorldError::CloudNotFound(_))));
    }
}

use cgmath::InnerSpace;
use smallvec::{smallvec, SmallVec};
use traincarts_core::{BlockCoordinate, BlockFace, BlockShape, MapView, RailData};

use super::logic::{RailLogic, VerticalSlopeKind};
use super::{RailType, SpawnLocation};
use crate::cart::Cart;

/// Straight, curved and sloped rails lying on a floor or hanging from a ceiling.
#[derive(Debug)]
pub struct RegularRail;

impl RegularRail {
    fn rail(map: &dyn MapView, track: BlockCoordinate) -> Option<RailData> {
        map.block(track).rail()
    }

    /// A slope turns into a vertical-slope hybrid when a vertical rail climbing the
    /// same way sits on top of it.
    fn has_vertical_above(map: &dyn MapView, track: BlockCoordinate, rail: RailData) -> bool {
        map.block(track.up())
            .vertical_rail()
            .is_some_and(|v| v.facing() == rail.direction())
    }

    fn logic_for(map: &dyn MapView, track: BlockCoordinate) -> &'static RailLogic {
        let Some(rail) = Self::rail(map, track) else {
            tracing::error!("No regular rail at {:?}", track);
            return RailLogic::ground();
        };
        if !rail.is_sloped() {
            RailLogic::horizontal(rail.direction(), rail.is_upside_down())
        } else if Self::has_vertical_above(map, track, rail) {
            RailLogic::vertical_slope(
                VerticalSlopeKind::new(rail.is_upside_down(), false),
                rail.direction(),
            )
        } else {
            RailLogic::sloped(rail.direction(), rail.is_upside_down())
        }
    }
}

impl RailType for RegularRail {
    fn name(&self) -> &'static str {
        "regular"
    }

    fn is_rail(&self, block: BlockShape) -> bool {
        matches!(block, BlockShape::Rail(_))
    }

    fn find_rail(&self, map: &dyn MapView, candidate: BlockCoordinate) -> Option<BlockCoordinate> {
        if Self::rail(map, candidate).is_some() {
            return Some(candidate);
        }
        // The upper half of a slope pokes into the block above it
        let below = candidate.down();
        if Self::rail(map, below).is_some_and(|r| r.is_sloped()) {
            return Some(below);
        }
        // Carts hang below upside-down rails
        let above = candidate.up();
        if Self::rail(map, above).is_some_and(|r| r.is_upside_down()) {
            return Some(above);
        }
        None
    }

    fn possible_directions(
        &self,
        map: &dyn MapView,
        track: BlockCoordinate,
    ) -> SmallVec<[BlockFace; 2]> {
        match Self::rail(map, track) {
            Some(rail) => rail.connections(),
            None => smallvec![],
        }
    }

    fn resolve_direction(
        &self,
        map: &dyn MapView,
        track: BlockCoordinate,
        heading: BlockFace,
    ) -> Option<BlockFace> {
        let rail = Self::rail(map, track)?;
        let connections = rail.connections();
        if rail.is_curved() {
            if connections.contains(&heading) {
                return Some(heading);
            }
            // Entering through one connection leaves through the other
            if heading.opposite() == connections[0] {
                return Some(connections[1]);
            }
            if heading.opposite() == connections[1] {
                return Some(connections[0]);
            }
            let v = heading.vector();
            return connections
                .iter()
                .copied()
                .filter(|c| c.vector().dot(v) > 0.0)
                .max_by(|a, b| a.vector().dot(v).total_cmp(&b.vector().dot(v)));
        }
        if heading.is_vertical() {
            return match (rail.is_sloped(), heading == BlockFace::UP) {
                (true, true) => Some(rail.direction()),
                (true, false) => Some(rail.direction().opposite()),
                (false, _) => None,
            };
        }
        let along = heading.vector().dot(rail.direction().vector());
        if along > 0.0 {
            Some(rail.direction())
        } else if along < 0.0 {
            Some(rail.direction().opposite())
        } else {
            None
        }
    }

    fn next_pos(
        &self,
        map: &dyn MapView,
        track: BlockCoordinate,
        direction: BlockFace,
    ) -> Option<BlockCoordinate> {
        let rail = Self::rail(map, track)?;
        let direction = self.resolve_direction(map, track, direction)?;
        if rail.is_sloped() && direction == rail.direction() {
            if Self::has_vertical_above(map, track, rail) {
                return Some(track.up());
            }
            return Some(track.relative(direction).up());
        }
        Some(track.relative(direction))
    }

    fn direction(&self, map: &dyn MapView, track: BlockCoordinate) -> BlockFace {
        Self::rail(map, track)
            .map(|r| r.direction())
            .unwrap_or(BlockFace::SELF)
    }

    fn logic(&self, _cart: &Cart, map: &dyn MapView, track: BlockCoordinate) -> &'static RailLogic {
        Self::logic_for(map, track)
    }

    fn spawn_location(
        &self,
        map: &dyn MapView,
        track: BlockCoordinate,
        direction: BlockFace,
    ) -> SpawnLocation {
        SpawnLocation {
            position: Self::logic_for(map, track).fixed_position(track.mid(), track),
            yaw: direction.yaw(),
        }
    }

    fn is_upside_down(&self, map: &dyn MapView, track: BlockCoordinate) -> bool {
        Self::rail(map, track).is_some_and(|r| r.is_upside_down())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use traincarts_core::SparseMap;

    #[test]
    fn test_curve_directions() {
        let mut map = SparseMap::new();
        let track = BlockCoordinate::new(0, 0, 0);
        // Connects SOUTH and EAST
        map.lay_rail(track, RailData::curved(BlockFace::NORTH_WEST).unwrap());
        let rail = RegularRail;
        assert_eq!(
            rail.resolve_direction(&map, track, BlockFace::WEST),
            Some(BlockFace::SOUTH)
        );
        assert_eq!(
            rail.resolve_direction(&map, track, BlockFace::NORTH),
            Some(BlockFace::EAST)
        );
        assert_eq!(
            rail.resolve_direction(&map, track, BlockFace::NORTH_EAST),
            Some(BlockFace::EAST)
        );
        assert_eq!(
            rail.next_pos(&map, track, BlockFace::WEST),
            Some(BlockCoordinate::new(0, 0, 1))
        );
    }

    #[test]
    fn test_curve_spawn_on_diagonal() {
        let mut map = SparseMap::new();
        let track = BlockCoordinate::new(0, 0, 0);
        map.lay_rail(track, RailData::curved(BlockFace::NORTH_WEST).unwrap());
        let spawn = RegularRail.spawn_location(&map, track, BlockFace::SOUTH_WEST);
        assert!((spawn.position.x - 0.75).abs() < 1e-9);
        assert!((spawn.position.z - 0.75).abs() < 1e-9);
        assert!((spawn.position.y - 0.0625).abs() < 1e-9);
    }

    #[test]
    fn test_straight_rejects_perpendicular() {
        let mut map = SparseMap::new();
        let track = BlockCoordinate::new(0, 0, 0);
        map.lay_rail(track, RailData::straight(BlockFace::EAST).unwrap());
        assert_eq!(
            RegularRail.resolve_direction(&map, track, BlockFace::NORTH),
            None
        );
        assert_eq!(RegularRail.resolve_direction(&map, track, BlockFace::UP), None);
        assert_eq!(
            RegularRail.resolve_direction(&map, track, BlockFace::SOUTH_WEST),
            Some(BlockFace::WEST)
        );
    }
}

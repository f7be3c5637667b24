use smallvec::{smallvec, SmallVec};
use traincarts_core::{BlockCoordinate, BlockFace, BlockShape, MapView};

use super::logic::{RailLogic, VerticalSlopeKind};
use super::{RailType, SpawnLocation};
use crate::cart::Cart;

/// Rails climbing a wall. The rail's direction is the side the wall is on.
#[derive(Debug)]
pub struct VerticalRail;

impl VerticalRail {
    fn facing(map: &dyn MapView, track: BlockCoordinate) -> Option<BlockFace> {
        map.block(track).vertical_rail().map(|v| v.facing())
    }

    fn logic_for(map: &dyn MapView, track: BlockCoordinate) -> &'static RailLogic {
        let Some(facing) = Self::facing(map, track) else {
            tracing::error!("No vertical rail at {:?}", track);
            return RailLogic::ground();
        };
        match map.block(track.down()).rail() {
            Some(below) if below.is_sloped() && below.direction() == facing => {
                RailLogic::vertical_slope(
                    VerticalSlopeKind::new(below.is_upside_down(), true),
                    facing,
                )
            }
            _ => RailLogic::vertical(facing),
        }
    }
}

impl RailType for VerticalRail {
    fn name(&self) -> &'static str {
        "vertical"
    }

    fn is_rail(&self, block: BlockShape) -> bool {
        matches!(block, BlockShape::VerticalRail(_))
    }

    fn find_rail(&self, map: &dyn MapView, candidate: BlockCoordinate) -> Option<BlockCoordinate> {
        if self.is_rail(map.block(candidate)) {
            Some(candidate)
        } else {
            None
        }
    }

    fn possible_directions(
        &self,
        _map: &dyn MapView,
        _track: BlockCoordinate,
    ) -> SmallVec<[BlockFace; 2]> {
        smallvec![BlockFace::UP, BlockFace::DOWN]
    }

    fn resolve_direction(
        &self,
        map: &dyn MapView,
        track: BlockCoordinate,
        heading: BlockFace,
    ) -> Option<BlockFace> {
        let facing = Self::facing(map, track)?;
        if heading.mod_y() > 0 {
            Some(BlockFace::UP)
        } else if heading.mod_y() < 0 {
            Some(BlockFace::DOWN)
        } else if heading == facing {
            Some(BlockFace::UP)
        } else if heading == facing.opposite() {
            Some(BlockFace::DOWN)
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
        match self.resolve_direction(map, track, direction)? {
            BlockFace::UP => Some(track.up()),
            _ => Some(track.down()),
        }
    }

    fn direction(&self, map: &dyn MapView, track: BlockCoordinate) -> BlockFace {
        Self::facing(map, track).unwrap_or(BlockFace::SELF)
    }

    fn logic(&self, _cart: &Cart, map: &dyn MapView, track: BlockCoordinate) -> &'static RailLogic {
        Self::logic_for(map, track)
    }

    fn spawn_location(
        &self,
        map: &dyn MapView,
        track: BlockCoordinate,
        _direction: BlockFace,
    ) -> SpawnLocation {
        SpawnLocation {
            position: Self::logic_for(map, track).fixed_position(track.mid(), track),
            yaw: self.direction(map, track).yaw(),
        }
    }

    fn is_vertical(&self) -> bool {
        true
    }
}

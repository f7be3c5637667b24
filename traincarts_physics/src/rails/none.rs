use smallvec::SmallVec;
use traincarts_core::{BlockCoordinate, BlockFace, BlockShape, MapView};

use super::logic::RailLogic;
use super::{RailType, SpawnLocation};
use crate::cart::Cart;

/// Stand-in for "no rail here". Derailed carts fly or slide under this type.
#[derive(Debug)]
pub struct NoRail;

impl RailType for NoRail {
    fn name(&self) -> &'static str {
        "none"
    }

    fn is_rail(&self, _block: BlockShape) -> bool {
        false
    }

    fn is_none(&self) -> bool {
        true
    }

    fn find_rail(&self, _map: &dyn MapView, candidate: BlockCoordinate) -> Option<BlockCoordinate> {
        Some(candidate)
    }

    fn possible_directions(
        &self,
        _map: &dyn MapView,
        _track: BlockCoordinate,
    ) -> SmallVec<[BlockFace; 2]> {
        SmallVec::new()
    }

    fn resolve_direction(
        &self,
        _map: &dyn MapView,
        _track: BlockCoordinate,
        _heading: BlockFace,
    ) -> Option<BlockFace> {
        None
    }

    fn next_pos(
        &self,
        _map: &dyn MapView,
        _track: BlockCoordinate,
        _direction: BlockFace,
    ) -> Option<BlockCoordinate> {
        None
    }

    fn direction(&self, _map: &dyn MapView, _track: BlockCoordinate) -> BlockFace {
        BlockFace::SELF
    }

    fn logic(&self, cart: &Cart, _map: &dyn MapView, _track: BlockCoordinate) -> &'static RailLogic {
        if cart.on_ground {
            RailLogic::ground()
        } else {
            RailLogic::air()
        }
    }

    fn spawn_location(
        &self,
        _map: &dyn MapView,
        track: BlockCoordinate,
        direction: BlockFace,
    ) -> SpawnLocation {
        SpawnLocation {
            position: track.mid(),
            yaw: direction.yaw(),
        }
    }

    /// Lets carts gliding past a block's edge through, instead of catching on it.
    fn on_collide(&self, cart: &Cart, block: BlockCoordinate, _hit_face: BlockFace) -> bool {
        const VEL_LIMIT: f64 = 0.05;
        let dx = cart.position.x - block.x as f64;
        let dy = cart.position.y - block.y as f64;
        let dz = cart.position.z - block.z as f64;
        let v = cart.velocity;
        let escaping = (dx < 0.0 && v.x < -VEL_LIMIT)
            || (dx > 1.0 && v.x > VEL_LIMIT)
            || (dz < 0.0 && v.z < -VEL_LIMIT)
            || (dz > 1.0 && v.z > VEL_LIMIT);
        if v.y < -VEL_LIMIT && escaping {
            return false;
        }
        if v.y > VEL_LIMIT && dy < -0.5 && escaping {
            return false;
        }
        true
    }
}

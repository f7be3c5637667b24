use traincarts_core::{BlockCoordinate, BlockFace};

use super::Cart;

/// Carts that jump further than this between rail blocks forget where they came from.
const MAX_DIRECTION_FROM_DISTANCE: u32 = 3;

/// The cardinal direction a cart moving along a curve is heading to, given the direction
/// of travel and the direction of the rail it is on.
fn sub_cardinal_direction_to(direction: BlockFace, rail_direction: BlockFace) -> BlockFace {
    match direction {
        BlockFace::NORTH_EAST if rail_direction == BlockFace::NORTH_WEST => BlockFace::EAST,
        BlockFace::NORTH_EAST => BlockFace::NORTH,
        BlockFace::SOUTH_EAST if rail_direction == BlockFace::NORTH_EAST => BlockFace::SOUTH,
        BlockFace::SOUTH_EAST => BlockFace::EAST,
        BlockFace::SOUTH_WEST if rail_direction == BlockFace::NORTH_WEST => BlockFace::SOUTH,
        BlockFace::SOUTH_WEST => BlockFace::WEST,
        BlockFace::NORTH_WEST if rail_direction == BlockFace::NORTH_EAST => BlockFace::WEST,
        BlockFace::NORTH_WEST => BlockFace::NORTH,
        other => other,
    }
}

impl Cart {
    /// Direction of travel. SELF until the first physics tick resolves it.
    pub fn direction(&self) -> BlockFace {
        self.direction.unwrap_or(BlockFace::SELF)
    }

    /// The cardinal direction the cart is heading to.
    pub fn direction_to(&self) -> BlockFace {
        self.direction_to.unwrap_or(BlockFace::SELF)
    }

    /// The direction the cart was heading to when it entered its current rail.
    pub fn direction_from(&self) -> BlockFace {
        self.direction_from
            .or(self.direction_to)
            .unwrap_or(BlockFace::SELF)
    }

    pub fn is_direction_to(&self, face: BlockFace) -> bool {
        self.direction_to == Some(face)
    }

    /// Direction of the rail block the cart is on.
    pub fn rail_direction(&self) -> BlockFace {
        self.rail_tracker.rail_direction()
    }

    /// Re-derives the direction of travel from the current rail, the previous direction
    /// and the velocity.
    pub fn update_direction(&mut self) {
        let block_movement = self.rail_direction();
        if self.direction.is_none() {
            self.direction = Some(block_movement);
        }
        if self.direction_to.is_none() {
            self.direction_to = Some(block_movement.cardinal_components()[0]);
        }
        let movement = self.rail_logic().movement_direction(self, block_movement);
        self.set_direction(movement);
    }

    pub fn set_direction(&mut self, movement: BlockFace) {
        self.direction = Some(movement);
        self.direction_to = Some(if movement.is_sub_cardinal() {
            sub_cardinal_direction_to(movement, self.rail_direction())
        } else {
            movement
        });
    }

    /// Forgets all direction state. It is recomputed on the next tick.
    pub fn invalidate_direction(&mut self) {
        self.direction = None;
        self.direction_to = None;
        self.direction_from = None;
    }

    pub(crate) fn on_block_change(&mut self, from: BlockCoordinate, to: BlockCoordinate) {
        if from.manhattan_distance(to) > MAX_DIRECTION_FROM_DISTANCE {
            tracing::debug!(cart = ?self.id, ?from, ?to, "Cart jumped, forgetting direction_from");
            self.direction_from = None;
        }
    }
}

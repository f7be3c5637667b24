use cgmath::{vec3, InnerSpace, Vector3};
use traincarts_core::BlockCoordinate;

use super::{RailLogic, MIN_VEL_FOR_SLOPE, Y_POS_OFFSET, Y_POS_OFFSET_UPSIDEDOWN};
use crate::cart::Cart;
use crate::train::{SlowdownMode, TrainProperties};

/// Position on a slope rising from `rail.y` to `rail.y + 1` toward the logic's direction.
pub(super) fn fixed_position(
    logic: &RailLogic,
    position: Vector3<f64>,
    rail: BlockCoordinate,
    y_offset: f64,
) -> Vector3<f64> {
    let direction = logic.direction;
    let (x, z, stage) = if direction.is_along_x() {
        (
            position.x,
            rail.mid_z(),
            (position.x - rail.mid_x()) * direction.mod_x() as f64,
        )
    } else {
        (
            rail.mid_x(),
            position.z,
            (position.z - rail.mid_z()) * direction.mod_z() as f64,
        )
    };
    let base = if logic.upside_down {
        Y_POS_OFFSET_UPSIDEDOWN
    } else {
        Y_POS_OFFSET
    };
    vec3(x, rail.y as f64 + 0.5 + stage + base + y_offset, z)
}

/// Turns slow carts downhill and keeps the velocity on the slope's axis.
pub(super) fn prepare_velocity(logic: &RailLogic, cart: &mut Cart, properties: &TrainProperties) {
    if properties.is_slowing_down(SlowdownMode::Gravity)
        && cart.velocity.magnitude() < MIN_VEL_FOR_SLOPE
    {
        cart.set_direction(logic.direction.opposite());
    }
    if logic.direction.is_along_x() {
        cart.velocity.z = 0.0;
    } else {
        cart.velocity.x = 0.0;
    }
}

pub(super) fn on_pre_move(logic: &RailLogic, cart: &mut Cart, properties: &TrainProperties) {
    prepare_velocity(logic, cart, properties);
    super::snap(logic, cart);
}

pub(super) fn on_post_move(logic: &RailLogic, cart: &mut Cart) {
    // Vertical velocity picked up from gravity turns into movement along the slope
    let direction = logic.direction;
    cart.velocity.x += direction.mod_x() as f64 * cart.velocity.y;
    cart.velocity.z += direction.mod_z() as f64 * cart.velocity.y;
    cart.velocity.y = 0.0;
    super::snap(logic, cart);
}

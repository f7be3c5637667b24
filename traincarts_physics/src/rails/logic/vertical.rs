use cgmath::{vec3, Vector3};
use traincarts_core::{BlockCoordinate, BlockFace};

use super::{RailLogic, DIRECTION_EPS};
use crate::cart::Cart;

pub(super) fn fixed_position(position: Vector3<f64>, rail: BlockCoordinate) -> Vector3<f64> {
    vec3(rail.mid_x(), position.y, rail.mid_z())
}

/// Horizontal velocity into the wall becomes upward velocity.
pub(super) fn convert_to_vertical(logic: &RailLogic, cart: &mut Cart) {
    let direction = logic.direction;
    cart.velocity.y += cart.velocity.x * direction.mod_x() as f64
        + cart.velocity.z * direction.mod_z() as f64;
    cart.velocity.x = 0.0;
    cart.velocity.z = 0.0;
}

pub(super) fn on_pre_move(logic: &RailLogic, cart: &mut Cart) {
    convert_to_vertical(logic, cart);
    cart.position = fixed_position(cart.position, cart.rail_pos());
}

/// +1 when the cart travels up (or toward the wall), -1 otherwise.
fn vertical_factor(logic: &RailLogic, cart: &Cart) -> f64 {
    let direction = cart.direction();
    if direction.is_vertical() {
        direction.mod_y() as f64
    } else if direction == logic.direction {
        1.0
    } else {
        -1.0
    }
}

pub(super) fn forward_velocity(logic: &RailLogic, cart: &Cart) -> f64 {
    cart.velocity.y * vertical_factor(logic, cart)
}

pub(super) fn set_forward_velocity(logic: &RailLogic, cart: &mut Cart, force: f64) {
    let factor = vertical_factor(logic, cart);
    cart.velocity = vec3(0.0, force * factor, 0.0);
}

pub(super) fn movement_direction(logic: &RailLogic, cart: &Cart) -> BlockFace {
    if cart.velocity.y > DIRECTION_EPS {
        return BlockFace::UP;
    }
    if cart.velocity.y < -DIRECTION_EPS {
        return BlockFace::DOWN;
    }
    match cart.direction {
        Some(previous) if previous.is_vertical() => previous,
        Some(previous) if previous.horizontal() != logic.direction => BlockFace::DOWN,
        _ => BlockFace::UP,
    }
}

use cgmath::{vec3, InnerSpace, Vector3};
use traincarts_core::{BlockCoordinate, BlockFace};

use super::{RailLogic, DIRECTION_EPS};
use crate::cart::Cart;

const AIR_DRAG: f64 = 0.95;
const GROUND_FRICTION: f64 = 0.5;

pub(super) fn fixed_position_ground(position: Vector3<f64>, rail: BlockCoordinate) -> Vector3<f64> {
    vec3(position.x, rail.y as f64, position.z)
}

pub(super) fn on_pre_move_air(cart: &mut Cart) {
    cart.velocity *= AIR_DRAG;
}

pub(super) fn on_pre_move_ground(logic: &RailLogic, cart: &mut Cart) {
    cart.velocity.x *= GROUND_FRICTION;
    cart.velocity.y = 0.0;
    cart.velocity.z *= GROUND_FRICTION;
    super::snap(logic, cart);
}

pub(super) fn movement_direction(
    cart: &Cart,
    end_direction: BlockFace,
    allow_vertical: bool,
) -> BlockFace {
    let v = cart.velocity;
    if v.x * v.x + v.z * v.z > DIRECTION_EPS * DIRECTION_EPS {
        BlockFace::from_vector(v, true)
    } else if allow_vertical && v.y > DIRECTION_EPS {
        BlockFace::UP
    } else if allow_vertical && v.y < -DIRECTION_EPS {
        BlockFace::DOWN
    } else {
        cart.direction.unwrap_or(end_direction)
    }
}

pub(super) fn on_rotation_update(cart: &mut Cart) {
    let v = cart.velocity;
    let horizontal = (v.x * v.x + v.z * v.z).sqrt();
    let yaw = if horizontal > DIRECTION_EPS {
        v.z.atan2(v.x).to_degrees()
    } else {
        cart.yaw
    };
    let speed = v.magnitude();
    let pitch = if speed > DIRECTION_EPS {
        -(v.y / speed).asin().to_degrees()
    } else {
        cart.pitch
    };
    cart.set_rotation_wrap(yaw, pitch);
}

use cgmath::{vec3, InnerSpace, Vector3};
use traincarts_core::BlockCoordinate;

use super::{RailLogic, Y_POS_OFFSET, Y_POS_OFFSET_UPSIDEDOWN};
use crate::cart::Cart;

pub(super) fn fixed_position(
    logic: &RailLogic,
    position: Vector3<f64>,
    rail: BlockCoordinate,
) -> Vector3<f64> {
    let y = rail.y as f64
        + if logic.upside_down {
            Y_POS_OFFSET_UPSIDEDOWN
        } else {
            Y_POS_OFFSET
        };
    let direction = logic.direction;
    if direction.is_along_x() {
        vec3(position.x, y, rail.mid_z())
    } else if direction.is_along_z() {
        vec3(rail.mid_x(), y, position.z)
    } else {
        // Curves run between the midpoints of the two edges they connect.
        let a = vec3(rail.mid_x() - 0.5 * direction.mod_x() as f64, y, rail.mid_z());
        let b = vec3(rail.mid_x(), y, rail.mid_z() - 0.5 * direction.mod_z() as f64);
        let ab = b - a;
        let t = (vec3(position.x, y, position.z) - a).dot(ab) / ab.magnitude2();
        a + ab * t
    }
}

pub(super) fn on_pre_move(logic: &RailLogic, cart: &mut Cart) {
    // Keep the horizontal speed, but only along the rail
    let axis = logic.cart_direction.unit_vector();
    let horizontal = vec3(cart.velocity.x, 0.0, cart.velocity.z);
    let speed = horizontal.magnitude();
    let along = horizontal.dot(axis);
    let sign = if along > 0.0 {
        1.0
    } else if along < 0.0 {
        -1.0
    } else if cart.direction().vector().dot(axis) < 0.0 {
        -1.0
    } else {
        1.0
    };
    cart.velocity = axis * (speed * sign);
    cart.position = fixed_position(logic, cart.position, cart.rail_pos());
}

pub(super) fn on_rotation_update(logic: &RailLogic, cart: &mut Cart) {
    let direction = cart.direction();
    let yaw = if direction.is_horizontal() {
        direction.yaw()
    } else {
        logic.cart_direction.yaw()
    };
    let pitch = if logic.upside_down { 180.0 } else { 0.0 };
    cart.set_rotation_wrap(yaw, pitch);
}

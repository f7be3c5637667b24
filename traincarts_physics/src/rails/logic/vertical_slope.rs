use cgmath::Vector3;
use traincarts_core::{BlockCoordinate, BlockFace};

use super::{
    sloped, vertical, RailLogic, VerticalSlopeKind, DIRECTION_EPS, Y_POS_OFFSET,
    Y_POS_OFFSET_UPSIDEDOWN, Y_POS_OFFSET_UPSIDEDOWN_SLOPE,
};
use crate::cart::Cart;
use crate::train::TrainProperties;

/// Height separating the sloped half (below) from the vertical half (above).
pub(super) fn boundary(kind: VerticalSlopeKind, rail: BlockCoordinate) -> f64 {
    let offset = if kind.is_upside_down() {
        Y_POS_OFFSET_UPSIDEDOWN + Y_POS_OFFSET_UPSIDEDOWN_SLOPE
    } else {
        Y_POS_OFFSET
    };
    let drop = if kind.is_anchored_above() { 1.0 } else { 0.0 };
    rail.mid_y() - drop + offset
}

pub(super) fn is_vertical_half(kind: VerticalSlopeKind, y: f64, rail: BlockCoordinate) -> bool {
    y - 0.0001 > boundary(kind, rail)
}

fn slope_block(kind: VerticalSlopeKind, rail: BlockCoordinate) -> BlockCoordinate {
    if kind.is_anchored_above() {
        rail.down()
    } else {
        rail
    }
}

pub(super) fn fixed_position(
    logic: &RailLogic,
    kind: VerticalSlopeKind,
    position: Vector3<f64>,
    rail: BlockCoordinate,
) -> Vector3<f64> {
    if is_vertical_half(kind, position.y, rail) {
        vertical::fixed_position(position, rail)
    } else {
        let y_offset = if kind.is_upside_down() {
            Y_POS_OFFSET_UPSIDEDOWN_SLOPE
        } else {
            0.0
        };
        let mut snapped = sloped::fixed_position(logic, position, slope_block(kind, rail), y_offset);
        // Climbed past the top of the slope, so the cart is on the wall now
        if is_vertical_half(kind, snapped.y, rail) {
            snapped.x = rail.mid_x();
            snapped.z = rail.mid_z();
        }
        snapped
    }
}

pub(super) fn on_pre_move(
    logic: &RailLogic,
    kind: VerticalSlopeKind,
    cart: &mut Cart,
    properties: &TrainProperties,
) {
    if is_vertical_half(kind, cart.position.y, cart.rail_pos()) {
        vertical::convert_to_vertical(logic, cart);
    } else {
        sloped::prepare_velocity(logic, cart, properties);
    }
    super::snap(logic, cart);
}

pub(super) fn on_post_move(logic: &RailLogic, kind: VerticalSlopeKind, cart: &mut Cart) {
    if is_vertical_half(kind, cart.position.y, cart.rail_pos()) {
        super::snap(logic, cart);
    } else {
        sloped::on_post_move(logic, cart);
    }
}

pub(super) fn movement_direction(
    logic: &RailLogic,
    kind: VerticalSlopeKind,
    cart: &Cart,
) -> BlockFace {
    if is_vertical_half(kind, cart.position.y, cart.rail_pos()) {
        return vertical::movement_direction(logic, cart);
    }
    let uphill = logic.direction;
    let along = cart.velocity.x * uphill.mod_x() as f64 + cart.velocity.z * uphill.mod_z() as f64;
    if along > DIRECTION_EPS {
        return uphill;
    }
    if along < -DIRECTION_EPS {
        return uphill.opposite();
    }
    match cart.direction {
        Some(previous) if previous == BlockFace::DOWN => uphill.opposite(),
        Some(previous) if previous.horizontal() == uphill.opposite() => uphill.opposite(),
        _ => uphill,
    }
}

pub(super) fn on_rotation_update(logic: &RailLogic, kind: VerticalSlopeKind, cart: &mut Cart) {
    let upside_down = kind.is_upside_down();
    let pitch = if is_vertical_half(kind, cart.position.y, cart.rail_pos()) {
        if upside_down {
            90.0
        } else {
            -90.0
        }
    } else if upside_down {
        135.0
    } else {
        -45.0
    };
    cart.set_rotation_wrap(logic.direction.yaw(), pitch);
}

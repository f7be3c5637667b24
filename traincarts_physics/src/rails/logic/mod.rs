// Copyright 2023 drey7925
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

//! Movement policies for the geometric classes of rail.
//!
//! Every policy is an immutable [RailLogic] value living in a lookup table keyed
//! by direction. Carts hold `&'static` references into these tables.

use cgmath::{InnerSpace, Vector3, Zero};
use traincarts_core::{BlockCoordinate, BlockFace};

use crate::cart::Cart;
use crate::settings::TrainCartsConfig;
use crate::train::{SlowdownMode, TrainProperties};

mod derailed;
mod horizontal;
mod sloped;
mod vertical;
mod vertical_slope;

#[cfg(test)]
mod tests;

/// Downward acceleration of carts in free fall.
pub const GRAVITY_MULTIPLIER: f64 = 0.04;
/// Downward acceleration on vertical rails before slopes got their own constant.
pub const VERTRAIL_MULTIPLIER_LEGACY: f64 = 0.02;
/// Downward acceleration on slopes and vertical rails.
pub const SLOPE_VELOCITY_MULTIPLIER: f64 = 0.0078125;
/// Below this speed a cart on a slope starts rolling downhill.
pub const MIN_VEL_FOR_SLOPE: f64 = 0.05;
/// Height of the cart reference point above the floor of an upright rail block.
pub const Y_POS_OFFSET: f64 = 0.0625;
/// Height of the cart reference point relative to the floor of an upside-down rail block.
pub const Y_POS_OFFSET_UPSIDEDOWN: f64 = -0.4;
/// Additional offset applied on upside-down slopes.
pub const Y_POS_OFFSET_UPSIDEDOWN_SLOPE: f64 = -0.2;

/// Velocities below this are treated as standing still when picking a direction.
const DIRECTION_EPS: f64 = 1e-4;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum VerticalSlopeKind {
    /// Upright, anchored on the slope block.
    NormalA,
    /// Upright, anchored on the vertical rail above the slope.
    NormalB,
    /// Upside-down, anchored on the slope block.
    UpsideDownA,
    /// Upside-down, anchored on the vertical rail above the slope.
    UpsideDownB,
}

impl VerticalSlopeKind {
    pub fn new(upside_down: bool, anchored_above: bool) -> VerticalSlopeKind {
        match (upside_down, anchored_above) {
            (false, false) => VerticalSlopeKind::NormalA,
            (false, true) => VerticalSlopeKind::NormalB,
            (true, false) => VerticalSlopeKind::UpsideDownA,
            (true, true) => VerticalSlopeKind::UpsideDownB,
        }
    }

    pub fn is_upside_down(&self) -> bool {
        matches!(
            self,
            VerticalSlopeKind::UpsideDownA | VerticalSlopeKind::UpsideDownB
        )
    }

    /// Whether the anchor is the vertical rail block rather than the slope below it.
    pub fn is_anchored_above(&self) -> bool {
        matches!(
            self,
            VerticalSlopeKind::NormalB | VerticalSlopeKind::UpsideDownB
        )
    }

    fn index(&self) -> usize {
        match self {
            VerticalSlopeKind::NormalA => 0,
            VerticalSlopeKind::NormalB => 1,
            VerticalSlopeKind::UpsideDownA => 2,
            VerticalSlopeKind::UpsideDownB => 3,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum RailLogicKind {
    /// Straight or curved rail on a flat floor or ceiling.
    Horizontal,
    Sloped,
    Vertical,
    /// A slope that bends upward into a vertical rail.
    VerticalSlope(VerticalSlopeKind),
    /// Derailed with nothing below.
    Air,
    /// Derailed, resting on a block.
    Ground,
}

#[derive(Debug, PartialEq)]
pub struct RailLogic {
    kind: RailLogicKind,
    direction: BlockFace,
    cart_direction: BlockFace,
    upside_down: bool,
}

lazy_static::lazy_static! {
    static ref HORIZONTAL: [[RailLogic; 8]; 2] = std::array::from_fn(|ud| {
        std::array::from_fn(|notch| {
            RailLogic::build(RailLogicKind::Horizontal, BlockFace::from_notch(notch as i32), ud == 1)
        })
    });
    static ref SLOPED: [[RailLogic; 4]; 2] = std::array::from_fn(|ud| {
        std::array::from_fn(|i| {
            RailLogic::build(RailLogicKind::Sloped, BlockFace::CARDINALS[i], ud == 1)
        })
    });
    static ref VERTICAL: [RailLogic; 4] = std::array::from_fn(|i| {
        RailLogic::build(RailLogicKind::Vertical, BlockFace::CARDINALS[i], false)
    });
    static ref VERTICAL_SLOPE: [[RailLogic; 4]; 4] = std::array::from_fn(|kind| {
        let kind = VerticalSlopeKind::new(kind >= 2, kind % 2 == 1);
        std::array::from_fn(|i| {
            RailLogic::build(
                RailLogicKind::VerticalSlope(kind),
                BlockFace::CARDINALS[i],
                kind.is_upside_down(),
            )
        })
    });
}

static AIR: RailLogic = RailLogic {
    kind: RailLogicKind::Air,
    direction: BlockFace::SELF,
    cart_direction: BlockFace::SELF,
    upside_down: false,
};

static GROUND: RailLogic = RailLogic {
    kind: RailLogicKind::Ground,
    direction: BlockFace::SELF,
    cart_direction: BlockFace::SELF,
    upside_down: false,
};

fn notch_index(direction: BlockFace) -> Option<usize> {
    let index = direction.notch();
    if index.is_none() {
        tracing::error!("No horizontal rail logic for direction {:?}", direction);
    }
    index
}

fn cardinal_index(direction: BlockFace) -> Option<usize> {
    let index = BlockFace::CARDINALS.iter().position(|&x| x == direction);
    if index.is_none() {
        tracing::error!("No cardinal rail logic for direction {:?}", direction);
    }
    index
}

impl RailLogic {
    fn build(kind: RailLogicKind, direction: BlockFace, upside_down: bool) -> RailLogic {
        // The line a curve runs along is perpendicular to the corner it bends around.
        let cart_direction = if direction.is_sub_cardinal() {
            BlockFace::new(direction.mod_x(), 0, -direction.mod_z()).unwrap_or(direction)
        } else {
            direction
        };
        RailLogic {
            kind,
            direction,
            cart_direction,
            upside_down,
        }
    }

    /// Logic for a flat rail. A direction with no horizontal rail gives the ground logic.
    pub fn horizontal(direction: BlockFace, upside_down: bool) -> &'static RailLogic {
        match notch_index(direction) {
            Some(i) => &HORIZONTAL[upside_down as usize][i],
            None => &GROUND,
        }
    }
    pub fn sloped(direction: BlockFace, upside_down: bool) -> &'static RailLogic {
        match cardinal_index(direction) {
            Some(i) => &SLOPED[upside_down as usize][i],
            None => &GROUND,
        }
    }
    pub fn vertical(direction: BlockFace) -> &'static RailLogic {
        match cardinal_index(direction) {
            Some(i) => &VERTICAL[i],
            None => &GROUND,
        }
    }
    pub fn vertical_slope(kind: VerticalSlopeKind, direction: BlockFace) -> &'static RailLogic {
        match cardinal_index(direction) {
            Some(i) => &VERTICAL_SLOPE[kind.index()][i],
            None => &GROUND,
        }
    }
    pub fn air() -> &'static RailLogic {
        &AIR
    }
    pub fn ground() -> &'static RailLogic {
        &GROUND
    }

    pub fn kind(&self) -> RailLogicKind {
        self.kind
    }
    /// The direction of the rail itself: a straight rail's axis, a curve's corner,
    /// a slope's uphill side or the wall a vertical rail climbs.
    pub fn direction(&self) -> BlockFace {
        self.direction
    }
    /// The axis a cart is aligned to while on this rail.
    pub fn cart_direction(&self) -> BlockFace {
        self.cart_direction
    }
    pub fn is_upside_down(&self) -> bool {
        self.upside_down
    }
    pub fn is_sloped(&self) -> bool {
        matches!(
            self.kind,
            RailLogicKind::Sloped | RailLogicKind::VerticalSlope(_)
        )
    }
    pub fn is_derailed(&self) -> bool {
        matches!(self.kind, RailLogicKind::Air | RailLogicKind::Ground)
    }

    /// Whether the policy moves the cart vertically itself. Others get their
    /// vertical velocity zeroed after every move.
    pub fn has_vertical_movement(&self) -> bool {
        !matches!(self.kind, RailLogicKind::Horizontal | RailLogicKind::Ground)
    }

    pub fn gravity_multiplier(&self, properties: &TrainProperties, config: &TrainCartsConfig) -> f64 {
        let gravity = properties.is_slowing_down(SlowdownMode::Gravity);
        match self.kind {
            RailLogicKind::Sloped if gravity => SLOPE_VELOCITY_MULTIPLIER,
            RailLogicKind::Vertical | RailLogicKind::VerticalSlope(_) if gravity => {
                if config.legacy_vertical_gravity {
                    VERTRAIL_MULTIPLIER_LEGACY
                } else {
                    SLOPE_VELOCITY_MULTIPLIER
                }
            }
            RailLogicKind::Air => GRAVITY_MULTIPLIER,
            _ => 0.0,
        }
    }

    /// Snaps a position onto the idealized rail of the given anchor.
    pub fn fixed_position(&self, position: Vector3<f64>, rail: BlockCoordinate) -> Vector3<f64> {
        match self.kind {
            RailLogicKind::Horizontal => horizontal::fixed_position(self, position, rail),
            RailLogicKind::Sloped => sloped::fixed_position(self, position, rail, 0.0),
            RailLogicKind::Vertical => vertical::fixed_position(position, rail),
            RailLogicKind::VerticalSlope(kind) => {
                vertical_slope::fixed_position(self, kind, position, rail)
            }
            RailLogicKind::Air => position,
            RailLogicKind::Ground => derailed::fixed_position_ground(position, rail),
        }
    }

    /// Velocity along the cart's direction of travel.
    pub fn forward_velocity(&self, cart: &Cart) -> f64 {
        match self.kind {
            RailLogicKind::Vertical => vertical::forward_velocity(self, cart),
            RailLogicKind::VerticalSlope(kind)
                if vertical_slope::is_vertical_half(kind, cart.position.y, cart.rail_pos()) =>
            {
                vertical::forward_velocity(self, cart)
            }
            _ => generic_forward_velocity(cart),
        }
    }

    pub fn set_forward_velocity(&self, cart: &mut Cart, force: f64) {
        match self.kind {
            RailLogicKind::Vertical => vertical::set_forward_velocity(self, cart, force),
            RailLogicKind::VerticalSlope(kind)
                if vertical_slope::is_vertical_half(kind, cart.position.y, cart.rail_pos()) =>
            {
                vertical::set_forward_velocity(self, cart, force)
            }
            _ => self.generic_set_forward_velocity(cart, force),
        }
    }

    fn generic_set_forward_velocity(&self, cart: &mut Cart, force: f64) {
        let direction = cart.direction();
        if force == 0.0 {
            cart.velocity = Vector3::zero();
        } else if direction.is_vertical() && self.has_vertical_movement() {
            cart.velocity.x = 0.0;
            cart.velocity.y = force * direction.mod_y() as f64;
            cart.velocity.z = 0.0;
        } else {
            cart.velocity.x = force * direction.cos();
            cart.velocity.z = force * direction.sin();
        }
    }

    /// Resolves the direction of travel, given the direction of the rail block.
    pub fn movement_direction(&self, cart: &Cart, end_direction: BlockFace) -> BlockFace {
        match self.kind {
            RailLogicKind::Horizontal => pick_along(self.cart_direction, cart, end_direction),
            RailLogicKind::Sloped => pick_along(self.direction, cart, end_direction),
            RailLogicKind::Vertical => vertical::movement_direction(self, cart),
            RailLogicKind::VerticalSlope(kind) => {
                vertical_slope::movement_direction(self, kind, cart)
            }
            RailLogicKind::Air => derailed::movement_direction(cart, end_direction, true),
            RailLogicKind::Ground => derailed::movement_direction(cart, end_direction, false),
        }
    }

    pub fn on_pre_move(&self, cart: &mut Cart, properties: &TrainProperties) {
        match self.kind {
            RailLogicKind::Horizontal => horizontal::on_pre_move(self, cart),
            RailLogicKind::Sloped => sloped::on_pre_move(self, cart, properties),
            RailLogicKind::Vertical => vertical::on_pre_move(self, cart),
            RailLogicKind::VerticalSlope(kind) => {
                vertical_slope::on_pre_move(self, kind, cart, properties)
            }
            RailLogicKind::Air => derailed::on_pre_move_air(cart),
            RailLogicKind::Ground => derailed::on_pre_move_ground(self, cart),
        }
    }

    pub fn on_post_move(&self, cart: &mut Cart) {
        match self.kind {
            RailLogicKind::Sloped => sloped::on_post_move(self, cart),
            RailLogicKind::VerticalSlope(kind) => vertical_slope::on_post_move(self, kind, cart),
            RailLogicKind::Air => {}
            _ => snap(self, cart),
        }
    }

    pub fn on_rotation_update(&self, cart: &mut Cart) {
        match self.kind {
            RailLogicKind::Horizontal => horizontal::on_rotation_update(self, cart),
            RailLogicKind::Sloped => {
                let pitch = if self.upside_down { 135.0 } else { -45.0 };
                cart.set_rotation_wrap(self.direction.yaw(), pitch);
            }
            RailLogicKind::Vertical => cart.set_rotation_wrap(self.direction.yaw(), -90.0),
            RailLogicKind::VerticalSlope(kind) => {
                vertical_slope::on_rotation_update(self, kind, cart)
            }
            RailLogicKind::Air | RailLogicKind::Ground => derailed::on_rotation_update(cart),
        }
    }

    /// Blends the spacing correction vector into the velocity. Both gains default to zero.
    pub fn on_spacing_update(
        &self,
        velocity: &mut Vector3<f64>,
        factor: Vector3<f64>,
        config: &TrainCartsConfig,
    ) {
        let f = (config.cart_distance_forcer * factor.dot(*velocity)).clamp(-1.0, 1.0) + 1.0;
        *velocity *= f;
        *velocity += factor * config.cart_distance_forcer_constant;
    }
}

/// Projects the velocity onto the cart's direction of travel.
fn generic_forward_velocity(cart: &Cart) -> f64 {
    let direction = cart.direction();
    cart.velocity.x * direction.cos()
        + cart.velocity.y * direction.mod_y() as f64
        + cart.velocity.z * direction.sin()
}

fn snap(logic: &RailLogic, cart: &mut Cart) {
    cart.position = logic.fixed_position(cart.position, cart.rail_pos());
}

/// Picks which way along `axis` the cart travels: by horizontal velocity when moving,
/// else by the direction it had before.
fn pick_along(axis: BlockFace, cart: &Cart, end_direction: BlockFace) -> BlockFace {
    let forward = axis.unit_vector();
    let along = cart.velocity.x * forward.x + cart.velocity.z * forward.z;
    if along > DIRECTION_EPS {
        return axis;
    }
    if along < -DIRECTION_EPS {
        return axis.opposite();
    }
    let previous = cart.direction.unwrap_or(end_direction);
    if previous.vector().dot(forward) < 0.0 {
        axis.opposite()
    } else {
        axis
    }
}

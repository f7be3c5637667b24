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

//! Keeps the carts of a train evenly spaced.
//!
//! Every tick each member gets a correction vector pointing to where it should be.
//! The vector is blended into the velocity by [crate::rails::RailLogic::on_spacing_update],
//! so trains converge on the target spacing over several ticks instead of snapping.

use cgmath::{vec3, InnerSpace, MetricSpace, Vector3, Zero};
use smallvec::SmallVec;
use traincarts_core::BlockFace;

use crate::cart::Cart;

/// Displacements shorter than this give no usable orientation.
const MIN_ORIENTATION_LENGTH: f64 = 0.0001;
/// Neighbours closer than this give no usable direction.
const MIN_NEIGHBOUR_DISTANCE: f64 = 0.01;

/// What the spacing calculation needs to know about one member of a train.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpacingSample {
    pub position: Vector3<f64>,
    /// Displacement over the previous tick.
    pub moved: Vector3<f64>,
    pub yaw: f64,
    pub pitch: f64,
    pub direction: BlockFace,
}

impl Cart {
    pub fn spacing_sample(&self) -> SpacingSample {
        SpacingSample {
            position: self.position,
            moved: self.moved,
            yaw: self.yaw,
            pitch: self.pitch,
            direction: self.direction(),
        }
    }
}

/// Unit vector for a yaw/pitch pair in degrees. Negative pitch points up.
pub fn direction_from_rotation(yaw: f64, pitch: f64) -> Vector3<f64> {
    let (yaw, pitch) = (yaw.to_radians(), pitch.to_radians());
    vec3(
        yaw.cos() * pitch.cos(),
        -pitch.sin(),
        yaw.sin() * pitch.cos(),
    )
}

/// The direction member `index` faces, pointing toward the head of the train.
///
/// A lone cart uses its own displacement. Members of longer trains use the offsets to
/// their neighbours. Either falls back to the cart's rotation when too short.
pub fn calculate_orientation(samples: &[SpacingSample], index: usize) -> Vector3<f64> {
    let me = &samples[index];
    let offset = if samples.len() <= 1 {
        me.moved
    } else {
        let mut sum = Vector3::zero();
        let mut n = 0.0;
        if index > 0 {
            sum += samples[index - 1].position - me.position;
            n += 1.0;
        }
        if let Some(next) = samples.get(index + 1) {
            sum += me.position - next.position;
            n += 1.0;
        }
        sum / n
    };
    let length = offset.magnitude();
    if length < MIN_ORIENTATION_LENGTH {
        direction_from_rotation(me.yaw, me.pitch)
    } else {
        offset / length
    }
}

/// The spacing correction for member `index` given the target distance between
/// neighbouring carts.
pub fn calculate_speed_factor(
    samples: &[SpacingSample],
    index: usize,
    target_distance: f64,
) -> Vector3<f64> {
    let n = samples.len();
    if n <= 1 {
        return Vector3::zero();
    }
    let me = &samples[index];
    let is_head = index == 0;
    let is_tail = index == n - 1;

    if is_head || is_tail {
        // The ends stretch or compress the train
        let neighbour = if is_head {
            &samples[1]
        } else {
            &samples[n - 2]
        };
        let offset = me.position - neighbour.position;
        let distance = offset.magnitude();
        let direction = if distance < MIN_NEIGHBOUR_DISTANCE {
            me.direction.unit_vector()
        } else {
            offset / distance
        };
        return direction * (target_distance - distance);
    }

    // Interior carts aim for the middle of the rail between their neighbours
    let prev = &samples[index - 1];
    let next = &samples[index + 1];
    let half = 0.5 * prev.position.distance(next.position);
    let from_prev = prev.position - calculate_orientation(samples, index - 1) * half;
    let from_next = next.position + calculate_orientation(samples, index + 1) * half;
    (from_prev + from_next) * 0.5 - me.position
}

/// Spacing corrections for all members, head first.
pub fn calculate_speed_factors(
    samples: &[SpacingSample],
    target_distance: f64,
) -> SmallVec<[Vector3<f64>; 8]> {
    (0..samples.len())
        .map(|i| calculate_speed_factor(samples, i, target_distance))
        .collect()
}

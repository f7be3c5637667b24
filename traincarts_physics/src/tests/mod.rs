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

//! Tests that drive whole trains through [Railway] ticks.

use cgmath::{vec3, Vector3};
use traincarts_core::{BlockCoordinate, BlockFace, SparseMap};

use crate::railway::Railway;
use crate::settings::TrainCartsConfig;

mod pipeline_tests;
mod train_tests;

#[cfg(test)]
#[ctor::ctor]
fn init() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
}

/// Height of a cart resting on a rail laid at y = 0.
pub(crate) const RAIL_Y: f64 = 0.0625;

/// A straight east-west line at y = 0, z = 0, starting at `from_x`.
pub(crate) fn straight_map(from_x: i32, len: u32) -> SparseMap {
    let mut map = SparseMap::new();
    map.lay_straight(BlockCoordinate::new(from_x, 0, 0), BlockFace::EAST, len)
        .unwrap();
    map
}

/// Where a cart at `x` sits on the line laid by [straight_map].
pub(crate) fn on_line(x: f64) -> Vector3<f64> {
    vec3(x, RAIL_Y, 0.5)
}

pub(crate) fn railway_with(config: TrainCartsConfig) -> Railway {
    Railway::new(config).unwrap()
}

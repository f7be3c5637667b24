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

//! Leaf types shared by the rail physics engine and its hosts: integer
//! coordinates, the 26-way block face direction, and the read-only view of
//! the world that the engine classifies rails from.

pub mod block_face;
pub mod coordinates;
pub mod map;

pub use block_face::BlockFace;
pub use coordinates::{BlockCoordinate, ChunkCoordinate};
pub use map::{BlockShape, MapError, MapView, RailData, SparseMap, VerticalRailData};

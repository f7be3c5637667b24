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

//! Walking along connected rails, one rail block at a time or by distance.

use cgmath::{InnerSpace, Vector3, Zero};
use traincarts_core::{BlockCoordinate, BlockFace, MapView};

use crate::rails::{self, logic::Y_POS_OFFSET, RailType, NONE};

/// Steps rail block by rail block, following the rail's own idea of what comes next.
pub struct TrackMovingPoint<'a> {
    map: &'a dyn MapView,
    current_track: BlockCoordinate,
    current_direction: BlockFace,
    current_rail: &'static dyn RailType,
    next_track: BlockCoordinate,
    next_direction: BlockFace,
    next_rail: &'static dyn RailType,
    has_next: bool,
}

impl<'a> TrackMovingPoint<'a> {
    /// Starts on the rail governing `start`, heading toward `direction`. The first call to
    /// [TrackMovingPoint::next] moves onto that rail.
    pub fn new(map: &'a dyn MapView, start: BlockCoordinate, direction: BlockFace) -> Self {
        let mut point = TrackMovingPoint {
            map,
            current_track: start,
            current_direction: direction,
            current_rail: &NONE,
            next_track: start,
            next_direction: direction,
            next_rail: &NONE,
            has_next: false,
        };
        let (rail, anchor) = rails::find_rail(map, start);
        if rail.is_none() {
            return point;
        }
        if let Some(resolved) = rail.resolve_direction(map, anchor, direction) {
            point.next_track = anchor;
            point.next_direction = resolved;
            point.next_rail = rail;
            point.has_next = true;
        }
        point
    }

    pub fn has_next(&self) -> bool {
        self.has_next
    }

    pub fn clear_next(&mut self) {
        self.has_next = false;
    }

    pub fn current_track(&self) -> BlockCoordinate {
        self.current_track
    }
    pub fn current_direction(&self) -> BlockFace {
        self.current_direction
    }
    pub fn current_rail(&self) -> &'static dyn RailType {
        self.current_rail
    }
    pub fn next_track(&self) -> BlockCoordinate {
        self.next_track
    }
    pub fn next_direction(&self) -> BlockFace {
        self.next_direction
    }
    pub fn next_rail(&self) -> &'static dyn RailType {
        self.next_rail
    }

    /// Moves onto the next rail. With `allow_next` unset, the rail after it is not looked up
    /// and the point ends there. Returns false if there was no next rail.
    pub fn next(&mut self, allow_next: bool) -> bool {
        if !self.has_next {
            return false;
        }
        self.current_track = self.next_track;
        self.current_direction = self.next_direction;
        self.current_rail = self.next_rail;
        self.has_next = allow_next && self.find_next();
        true
    }

    fn find_next(&mut self) -> bool {
        let Some(candidate) =
            self.current_rail
                .next_pos(self.map, self.current_track, self.current_direction)
        else {
            return false;
        };
        let (rail, anchor) = rails::find_rail(self.map, candidate);
        if rail.is_none() || anchor == self.current_track {
            return false;
        }
        // Entering a rail keeps the heading we left the previous one with
        let Some(direction) = rail.resolve_direction(self.map, anchor, self.current_direction)
        else {
            return false;
        };
        self.next_track = anchor;
        self.next_direction = direction;
        self.next_rail = rail;
        true
    }
}

/// The rail blocks reached by walking from a starting block, with the direction each
/// is left in. The first item is the starting rail itself. Never ends on looping track.
pub struct TrackIterator<'a> {
    point: TrackMovingPoint<'a>,
}

impl<'a> TrackIterator<'a> {
    pub fn new(map: &'a dyn MapView, start: BlockCoordinate, direction: BlockFace) -> Self {
        TrackIterator {
            point: TrackMovingPoint::new(map, start, direction),
        }
    }
}

impl<'a> Iterator for TrackIterator<'a> {
    type Item = (BlockCoordinate, BlockFace);

    fn next(&mut self) -> Option<Self::Item> {
        if !self.point.next(true) {
            return None;
        }
        Some((self.point.current_track, self.point.current_direction))
    }
}

/// Whether walking from `from` toward `direction` reaches the rail `to` within `max_steps`
/// rail blocks.
pub fn can_reach(
    map: &dyn MapView,
    from: BlockCoordinate,
    direction: BlockFace,
    to: BlockCoordinate,
    max_steps: usize,
) -> bool {
    TrackIterator::new(map, from, direction)
        .take(max_steps)
        .any(|(track, _)| track == to)
}

/// Whether rail `to` can be reached from rail `from` in any of the directions `from` allows.
/// With `bidirectional`, walking back from `to` counts as well.
pub fn is_connected(
    map: &dyn MapView,
    from: BlockCoordinate,
    to: BlockCoordinate,
    bidirectional: bool,
    max_steps: usize,
) -> bool {
    let reaches = |a: BlockCoordinate, b: BlockCoordinate| {
        let (rail, anchor) = rails::find_rail(map, a);
        rail.possible_directions(map, anchor)
            .into_iter()
            .any(|direction| can_reach(map, anchor, direction, b, max_steps))
    };
    if from == to {
        return true;
    }
    reaches(from, to) || (bidirectional && reaches(to, from))
}

/// Walks along rails by distance, through the positions carts take when placed on them.
pub struct TrackWalkingPoint<'a> {
    point: TrackMovingPoint<'a>,
    current_position: Vector3<f64>,
    next_position: Vector3<f64>,
    /// Unit vector from the current toward the next position.
    direction: Vector3<f64>,
    /// Distance left until the next position.
    track_distance: f64,
}

impl<'a> TrackWalkingPoint<'a> {
    pub fn new(
        map: &'a dyn MapView,
        start_position: Vector3<f64>,
        start_rail: BlockCoordinate,
        start_direction: BlockFace,
    ) -> Self {
        let mut walker = TrackWalkingPoint {
            point: TrackMovingPoint::new(map, start_rail, start_direction),
            current_position: start_position,
            next_position: start_position,
            direction: start_direction.unit_vector(),
            track_distance: 0.0,
        };
        // The starting rail is where we already are
        walker.point.next(true);
        walker
    }

    pub fn position(&self) -> Vector3<f64> {
        self.current_position
    }
    pub fn next_position(&self) -> Vector3<f64> {
        self.next_position
    }
    pub fn direction(&self) -> Vector3<f64> {
        self.direction
    }
    pub fn track_distance(&self) -> f64 {
        self.track_distance
    }
    pub fn current_track(&self) -> BlockCoordinate {
        self.point.current_track
    }
    pub fn current_direction(&self) -> BlockFace {
        self.point.current_direction
    }
    pub fn has_next(&self) -> bool {
        self.point.has_next
    }

    /// Moves onto the next rail, computing the span toward its spawn position.
    fn advance(&mut self) -> bool {
        if !self.point.has_next {
            return false;
        }
        self.current_position = self.next_position;
        self.next_position = self
            .point
            .next_rail
            .spawn_location(
                self.point.map,
                self.point.next_track,
                self.point.next_direction,
            )
            .position;
        let span = self.next_position - self.current_position;
        self.track_distance = span.magnitude();
        self.direction = if self.track_distance > 0.0 {
            span / self.track_distance
        } else {
            Vector3::zero()
        };
        self.point.next(true)
    }

    /// Moves `distance` along the track. Returns false if the track ends first, in which
    /// case the walker stays where the track ran out.
    pub fn move_by(&mut self, distance: f64) -> bool {
        let mut remaining = distance;
        loop {
            while self.track_distance == 0.0 {
                if !self.advance() {
                    return false;
                }
            }
            if remaining > self.track_distance {
                remaining -= self.track_distance;
                self.current_position = self.next_position;
                self.track_distance = 0.0;
                continue;
            }
            self.current_position += self.direction * remaining;
            self.track_distance -= remaining;
            self.clamp_to_floor();
            return true;
        }
    }

    /// Keeps the position from sinking below the rail it is on.
    fn clamp_to_floor(&mut self) {
        let rail = self.point.current_rail;
        let track = self.point.current_track;
        if rail.is_none() || rail.is_vertical() || rail.is_upside_down(self.point.map, track) {
            return;
        }
        let min_y = rail.find_minecart_pos(track).y as f64 + Y_POS_OFFSET;
        if self.current_position.y < min_y {
            self.current_position.y = min_y;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use traincarts_core::{RailData, SparseMap};

    fn straight_into_curve() -> SparseMap {
        let mut map = SparseMap::new();
        map.lay_straight(BlockCoordinate::new(0, 0, 0), BlockFace::EAST, 4)
            .unwrap();
        // Connects WEST and SOUTH
        map.lay_rail(
            BlockCoordinate::new(4, 0, 0),
            RailData::curved(BlockFace::NORTH_EAST).unwrap(),
        );
        map.lay_straight(BlockCoordinate::new(4, 0, 1), BlockFace::SOUTH, 3)
            .unwrap();
        map
    }

    #[test]
    fn test_iterator_follows_curve() {
        let map = straight_into_curve();
        let blocks: Vec<_> = TrackIterator::new(&map, BlockCoordinate::new(2, 0, 0), BlockFace::EAST)
            .collect();
        assert_eq!(
            blocks,
            vec![
                (BlockCoordinate::new(2, 0, 0), BlockFace::EAST),
                (BlockCoordinate::new(3, 0, 0), BlockFace::EAST),
                (BlockCoordinate::new(4, 0, 0), BlockFace::SOUTH),
                (BlockCoordinate::new(4, 0, 1), BlockFace::SOUTH),
                (BlockCoordinate::new(4, 0, 2), BlockFace::SOUTH),
                (BlockCoordinate::new(4, 0, 3), BlockFace::SOUTH),
            ]
        );
    }

    #[test]
    fn test_reachability() {
        let map = straight_into_curve();
        let start = BlockCoordinate::new(1, 0, 0);
        let end = BlockCoordinate::new(4, 0, 2);
        assert!(can_reach(&map, start, BlockFace::EAST, end, 10));
        assert!(!can_reach(&map, start, BlockFace::WEST, end, 10));
        assert!(!can_reach(&map, start, BlockFace::EAST, end, 3));
        assert!(is_connected(&map, start, end, false, 10));
        assert!(is_connected(&map, end, start, false, 10));
        assert!(!is_connected(&map, start, BlockCoordinate::new(9, 0, 9), true, 10));
    }

    #[test]
    fn test_not_on_track() {
        let map = SparseMap::new();
        let mut iter = TrackIterator::new(&map, BlockCoordinate::new(0, 0, 0), BlockFace::EAST);
        assert_eq!(iter.next(), None);
    }

    #[test]
    fn test_split_move_matches_single_move() {
        let mut map = SparseMap::new();
        map.lay_straight(BlockCoordinate::new(0, 0, 0), BlockFace::EAST, 6)
            .unwrap();
        let start = vec3_at(0.5);
        let rail = BlockCoordinate::new(0, 0, 0);

        let mut split = TrackWalkingPoint::new(&map, start, rail, BlockFace::EAST);
        assert!(split.move_by(0.3));
        assert!(split.move_by(0.4));
        let mut single = TrackWalkingPoint::new(&map, start, rail, BlockFace::EAST);
        assert!(single.move_by(0.7));

        assert!((split.position() - single.position()).magnitude() < 1e-9);
        assert!((single.position().x - 1.2).abs() < 1e-9);
        assert!((single.position().y - Y_POS_OFFSET).abs() < 1e-9);
        assert!((single.position().z - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_move_past_end_fails() {
        let mut map = SparseMap::new();
        map.lay_straight(BlockCoordinate::new(0, 0, 0), BlockFace::EAST, 3)
            .unwrap();
        let mut walker = TrackWalkingPoint::new(
            &map,
            vec3_at(0.5),
            BlockCoordinate::new(0, 0, 0),
            BlockFace::EAST,
        );
        assert!(walker.move_by(1.5));
        assert!(!walker.move_by(5.0));
        assert!((walker.position().x - 2.5).abs() < 1e-9);
    }

    fn vec3_at(x: f64) -> Vector3<f64> {
        cgmath::vec3(x, Y_POS_OFFSET, 0.5)
    }
}

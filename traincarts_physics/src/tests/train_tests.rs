use cgmath::vec3;
use traincarts_core::{BlockCoordinate, BlockFace, RailData, SparseMap};

use super::{on_line, railway_with, straight_map, RAIL_Y};
use crate::rails::RailLogicKind;
use crate::railway::CartEvent;
use crate::settings::TrainCartsConfig;

#[test]
fn test_coupled_train_not_ticked_twice() {
    let map = straight_map(0, 20);
    let mut railway = railway_with(TrainCartsConfig::default());
    let a = railway.spawn_cart(on_line(6.5)).unwrap();
    let b = railway.spawn_cart(on_line(5.0)).unwrap();
    let ta = railway.train_of(a).unwrap();

    railway.begin_tick();
    assert!(railway.advance_train(&map, ta).unwrap().ticked);
    let merged = railway.connect(a, b).unwrap();
    assert_eq!(merged, ta);
    // b has not moved yet, but its new train already ran
    assert!(!railway.advance_cart(&map, b).unwrap().ticked);

    let summary = railway.tick(&map);
    assert_eq!(summary.trains_ticked, 1);
    assert!(summary.failed.is_empty());
}

#[test]
fn test_split_train_not_ticked_twice() {
    let map = straight_map(0, 20);
    let mut railway = railway_with(TrainCartsConfig::default());
    let train = railway
        .spawn_train(&map, BlockCoordinate::new(12, 0, 0), BlockFace::EAST, 4)
        .unwrap();
    railway.begin_tick();
    assert!(railway.advance_train(&map, train).unwrap().ticked);
    let back = railway.split(train, 2).unwrap();
    assert!(!railway.advance_train(&map, back).unwrap().ticked);

    let summary = railway.tick(&map);
    assert_eq!(summary.trains_ticked, 2);
    assert_eq!(railway.train(back).unwrap().len(), 2);
}

#[test]
fn test_train_follows_curve() {
    let mut map = SparseMap::new();
    map.lay_straight(BlockCoordinate::new(0, 0, 0), BlockFace::EAST, 4)
        .unwrap();
    // Connects WEST and SOUTH
    map.lay_rail(
        BlockCoordinate::new(4, 0, 0),
        RailData::curved(BlockFace::NORTH_EAST).unwrap(),
    );
    map.lay_straight(BlockCoordinate::new(4, 0, 1), BlockFace::SOUTH, 10)
        .unwrap();

    let mut railway = railway_with(TrainCartsConfig::default());
    let train = railway
        .spawn_train(&map, BlockCoordinate::new(2, 0, 0), BlockFace::EAST, 2)
        .unwrap();
    let members = railway.train(train).unwrap().members().to_vec();
    for &id in &members {
        railway
            .cart_mut(id)
            .unwrap()
            .set_velocity(vec3(0.2, 0.0, 0.0));
    }

    let mut entered_curve = false;
    for _ in 0..30 {
        let summary = railway.tick(&map);
        assert!(summary.failed.is_empty());
        entered_curve |= railway.drain_events().iter().any(|e| {
            matches!(
                e,
                CartEvent::BlockChanged { cart, to, .. }
                    if *cart == members[0] && *to == BlockCoordinate::new(4, 0, 0)
            )
        });
    }
    assert!(entered_curve);

    let head = railway.cart(members[0]).unwrap();
    let tail = railway.cart(members[1]).unwrap();
    for cart in [head, tail] {
        assert!(!cart.is_derailed());
        assert_eq!(cart.direction(), BlockFace::SOUTH);
        assert_eq!(cart.position().x, 4.5);
        assert_eq!(cart.position().y, RAIL_Y);
        assert!(cart.velocity().z > 0.0);
    }
    assert!(head.position().z > 2.5, "{:?}", head.position());
    assert!(tail.position().z > 1.2, "{:?}", tail.position());
    assert!(head.position().z > tail.position().z);
}

#[test]
fn test_cart_rolls_down_slope() {
    let mut map = SparseMap::new();
    map.lay_straight(BlockCoordinate::new(-40, 0, 0), BlockFace::EAST, 45)
        .unwrap();
    map.lay_rail(
        BlockCoordinate::new(5, 0, 0),
        RailData::sloped(BlockFace::EAST).unwrap(),
    );
    map.lay_straight(BlockCoordinate::new(6, 1, 0), BlockFace::EAST, 3)
        .unwrap();

    let mut railway = railway_with(TrainCartsConfig::default());
    let cart = railway.spawn_cart(vec3(5.5, 0.5625, 0.5)).unwrap();
    railway.tick(&map);
    assert!(railway.cart(cart).unwrap().is_on_slope());

    for _ in 0..60 {
        assert!(railway.tick(&map).failed.is_empty());
    }
    let cart = railway.cart(cart).unwrap();
    assert_eq!(cart.rail_logic().kind(), RailLogicKind::Horizontal);
    assert_eq!(cart.direction(), BlockFace::WEST);
    assert!(cart.position().x < 5.0);
    assert_eq!(cart.position().y, RAIL_Y);
    assert!(cart.velocity().x < 0.0);
}

#[test]
fn test_stop_train() {
    let map = straight_map(0, 20);
    let mut railway = railway_with(TrainCartsConfig::default());
    let train = railway
        .spawn_train(&map, BlockCoordinate::new(12, 0, 0), BlockFace::EAST, 3)
        .unwrap();
    let members = railway.train(train).unwrap().members().to_vec();
    for &id in &members {
        railway
            .cart_mut(id)
            .unwrap()
            .set_velocity(vec3(0.3, 0.0, 0.0));
    }
    railway.tick(&map);
    railway.stop_train(train).unwrap();
    for &id in &members {
        assert!(!railway.cart(id).unwrap().is_moving());
    }
    let before: Vec<_> = members
        .iter()
        .map(|&id| railway.cart(id).unwrap().position())
        .collect();
    railway.tick(&map);
    for (&id, position) in members.iter().zip(before) {
        assert_eq!(railway.cart(id).unwrap().position(), position);
    }
}

#[test]
fn test_track_queries_through_railway() {
    let mut map = straight_map(0, 20);
    // A parallel line that does not join the first
    map.lay_straight(BlockCoordinate::new(8, 0, 3), BlockFace::EAST, 5)
        .unwrap();
    let mut railway = railway_with(TrainCartsConfig::default());
    let train = railway
        .spawn_train(&map, BlockCoordinate::new(10, 0, 0), BlockFace::EAST, 2)
        .unwrap();
    railway.tick(&map);
    let members = railway.train(train).unwrap().members().to_vec();
    assert!(railway.is_near_of(members[0], members[1]).unwrap());
    assert!(railway
        .is_track_connected(&map, members[0], members[1])
        .unwrap());

    let stray = railway.spawn_cart(vec3(10.5, 0.0625, 3.5)).unwrap();
    railway.tick(&map);
    assert!(railway.is_near_of(members[0], stray).unwrap());
    assert!(!railway.is_track_connected(&map, members[0], stray).unwrap());
}

use cgmath::{vec3, InnerSpace, Vector3};
use traincarts_core::{BlockCoordinate, BlockFace, BlockShape, ChunkCoordinate, SparseMap};

use super::{on_line, railway_with, straight_map, RAIL_Y};
use crate::railway::CartEvent;
use crate::settings::TrainCartsConfig;

fn assert_close(a: Vector3<f64>, b: Vector3<f64>) {
    assert!((a - b).magnitude() < 1e-9, "{:?} != {:?}", a, b);
}

#[test]
fn test_direction_stable_at_rest() {
    let map = straight_map(0, 20);
    let mut railway = railway_with(TrainCartsConfig::default());
    let cart = railway.spawn_cart(on_line(5.5)).unwrap();
    railway.tick(&map);
    let direction = railway.cart(cart).unwrap().direction();
    assert_eq!(direction, BlockFace::EAST);
    for _ in 0..20 {
        let summary = railway.tick(&map);
        assert!(summary.failed.is_empty());
        let cart = railway.cart(cart).unwrap();
        assert_eq!(cart.direction(), direction);
        assert_close(cart.position(), on_line(5.5));
    }
}

#[test]
fn test_speed_limit_on_rails() {
    let map = straight_map(0, 20);
    let mut railway = railway_with(TrainCartsConfig::default());
    let cart = railway.spawn_cart(on_line(5.5)).unwrap();
    railway
        .cart_mut(cart)
        .unwrap()
        .set_velocity(vec3(1.0, 0.0, 0.0));
    railway.tick(&map);
    let cart = railway.cart(cart).unwrap();
    // The full velocity is applied before the limit, then friction
    assert_close(cart.position(), on_line(6.5));
    assert_close(cart.velocity(), vec3(0.4 * 0.997, 0.0, 0.0));
}

#[test]
fn test_speed_limit_modes_in_the_air() {
    let start = vec3(0.5, 50.0, 0.5);
    let launch = vec3(1.0, 0.0, 0.5);
    // Gravity then air drag, before the limit applies
    let unclamped = vec3(0.95, -0.038, 0.475);
    let map = SparseMap::new();

    let mut railway = railway_with(TrainCartsConfig::default());
    let cart = railway.spawn_cart(start).unwrap();
    railway.cart_mut(cart).unwrap().set_velocity(launch);
    railway.tick(&map);
    let velocity = railway.cart(cart).unwrap().velocity();
    assert!((velocity.magnitude() - 0.4).abs() < 1e-9);
    assert_close(velocity.normalize(), unclamped.normalize());

    let mut legacy = railway_with(TrainCartsConfig {
        legacy_speed_limiting: true,
        ..Default::default()
    });
    let cart = legacy.spawn_cart(start).unwrap();
    legacy.cart_mut(cart).unwrap().set_velocity(launch);
    legacy.tick(&map);
    assert_close(legacy.cart(cart).unwrap().velocity(), vec3(0.4, -0.038, 0.4));
}

#[test]
fn test_free_fall() {
    let map = SparseMap::new();
    let mut railway = railway_with(TrainCartsConfig::default());
    let id = railway.spawn_cart(vec3(0.5, 10.0, 0.5)).unwrap();
    railway.tick(&map);
    let cart = railway.cart(id).unwrap();
    assert!(cart.is_flying());
    assert!((cart.velocity().y + 0.038).abs() < 1e-12);
    assert!((cart.position().y - 9.962).abs() < 1e-12);
    assert!((cart.fall_distance() - 0.038).abs() < 1e-12);
    railway.tick(&map);
    let cart = railway.cart(id).unwrap();
    assert!((cart.velocity().y + (0.038 + 0.04) * 0.95).abs() < 1e-12);
}

#[test]
fn test_void_kills_only_that_cart() {
    let map = straight_map(0, 20);
    let mut reference = railway_with(TrainCartsConfig::default());
    let solo = reference.spawn_cart(on_line(5.5)).unwrap();
    reference
        .cart_mut(solo)
        .unwrap()
        .set_velocity(vec3(0.2, 0.0, 0.0));

    let mut railway = railway_with(TrainCartsConfig::default());
    let a = railway.spawn_cart(on_line(5.5)).unwrap();
    let b = railway.spawn_cart(vec3(3.5, -70.0, 0.5)).unwrap();
    let train = railway.connect(a, b).unwrap();
    railway.cart_mut(a).unwrap().set_velocity(vec3(0.2, 0.0, 0.0));

    for _ in 0..3 {
        let summary = railway.tick(&map);
        assert!(summary.failed.is_empty());
        reference.tick(&map);
        let expected = reference.cart(solo).unwrap();
        let actual = railway.cart(a).unwrap();
        assert_eq!(actual.position(), expected.position());
        assert_eq!(actual.velocity(), expected.velocity());
    }
    assert!(railway.cart(b).is_none());
    assert_eq!(railway.train(train).unwrap().members(), &[a]);
}

#[test]
fn test_dead_cart_removed_next_tick() {
    let map = straight_map(0, 20);
    let mut railway = railway_with(TrainCartsConfig::default());
    let train = railway
        .spawn_train(&map, BlockCoordinate::new(10, 0, 0), BlockFace::EAST, 3)
        .unwrap();
    let members = railway.train(train).unwrap().members().to_vec();
    railway.kill_cart(members[2]).unwrap();
    assert!(railway.cart(members[2]).unwrap().is_dead());

    let summary = railway.tick(&map);
    assert_eq!(summary.missing, vec![members[2]]);
    let events = railway.drain_events();
    assert!(events.contains(&CartEvent::Died { cart: members[2] }));
    assert!(railway.cart(members[2]).is_none());
    assert_eq!(railway.train(train).unwrap().members(), &members[..2]);
}

#[test]
fn test_dead_head_keeps_train() {
    let map = straight_map(0, 20);
    let mut railway = railway_with(TrainCartsConfig::default());
    let train = railway
        .spawn_train(&map, BlockCoordinate::new(10, 0, 0), BlockFace::EAST, 3)
        .unwrap();
    let members = railway.train(train).unwrap().members().to_vec();
    railway.kill_cart(members[0]).unwrap();

    let summary = railway.tick(&map);
    assert_eq!(summary.missing, vec![members[0]]);
    assert_eq!(railway.train(train).unwrap().members(), &members[1..]);
    assert_eq!(railway.train_of(members[1]), Some(train));
    assert_eq!(railway.train_count(), 1);
}

#[test]
fn test_unloaded_cart_left_alone() {
    let mut map = straight_map(0, 110);
    let mut railway = railway_with(TrainCartsConfig::default());
    let a = railway.spawn_cart(on_line(5.5)).unwrap();
    let b = railway.spawn_cart(on_line(100.5)).unwrap();
    railway.connect(a, b).unwrap();
    for id in [a, b] {
        railway
            .cart_mut(id)
            .unwrap()
            .set_velocity(vec3(0.2, 0.0, 0.0));
    }

    // Within two chunks of b, but nowhere near a
    let far_chunk = ChunkCoordinate::new(8, 0, 0);
    map.unload_chunk(far_chunk);
    let summary = railway.tick(&map);
    assert!(summary.failed.is_empty());
    assert_eq!(summary.unloaded, vec![b]);
    let cart_b = railway.cart(b).unwrap();
    assert!(cart_b.is_unloaded());
    assert_eq!(cart_b.position(), on_line(100.5));
    assert_eq!(cart_b.velocity(), vec3(0.2, 0.0, 0.0));
    assert_close(railway.cart(a).unwrap().position(), on_line(5.7));

    map.load_chunk(far_chunk);
    let summary = railway.tick(&map);
    assert!(summary.unloaded.is_empty());
    assert!(!railway.cart(b).unwrap().is_unloaded());
    assert_close(railway.cart(b).unwrap().position(), on_line(100.7));
}

#[test]
fn test_train_ticks_once_per_tick() {
    let map = straight_map(0, 20);
    let mut railway = railway_with(TrainCartsConfig::default());
    let cart = railway.spawn_cart(on_line(5.5)).unwrap();
    let train = railway.train_of(cart).unwrap();
    railway
        .cart_mut(cart)
        .unwrap()
        .set_velocity(vec3(0.2, 0.0, 0.0));

    railway.begin_tick();
    assert!(railway.advance_train(&map, train).unwrap().ticked);
    assert!(!railway.advance_cart(&map, cart).unwrap().ticked);
    assert!(!railway.advance_train(&map, train).unwrap().ticked);
    assert_close(railway.cart(cart).unwrap().position(), on_line(5.7));
    assert_eq!(
        railway.train(train).unwrap().last_tick(),
        Some(railway.current_tick())
    );

    railway.begin_tick();
    assert!(railway.advance_cart(&map, cart).unwrap().ticked);
    assert_close(railway.cart(cart).unwrap().position(), on_line(5.7 + 0.2 * 0.997));
}

#[test]
fn test_nan_velocity_is_reset() {
    let map = straight_map(0, 20);
    let mut railway = railway_with(TrainCartsConfig::default());
    let cart = railway.spawn_cart(on_line(5.5)).unwrap();
    railway
        .cart_mut(cart)
        .unwrap()
        .set_velocity(vec3(f64::NAN, 0.0, f64::NAN));
    let summary = railway.tick(&map);
    assert!(summary.failed.is_empty());
    let cart = railway.cart(cart).unwrap();
    assert_eq!(cart.velocity(), vec3(0.0, 0.0, 0.0));
    assert_close(cart.position(), on_line(5.5));
}

#[test]
fn test_head_on_collision_stops_train() {
    let mut map = straight_map(0, 6);
    map.set(BlockCoordinate::new(6, 0, 0), BlockShape::Solid);
    let mut railway = railway_with(TrainCartsConfig::default());
    let train = railway
        .spawn_train(&map, BlockCoordinate::new(5, 0, 0), BlockFace::EAST, 2)
        .unwrap();
    let members = railway.train(train).unwrap().members().to_vec();
    for &id in &members {
        railway
            .cart_mut(id)
            .unwrap()
            .set_velocity(vec3(0.3, 0.0, 0.0));
    }

    let mut stopped = false;
    for _ in 0..5 {
        railway.begin_tick();
        let report = railway.advance_train(&map, train).unwrap();
        if report.stopped {
            stopped = true;
            break;
        }
    }
    assert!(stopped);
    assert!(railway.drain_events().contains(&CartEvent::TrainStopped {
        train,
        cart: members[0]
    }));
    let head = railway.cart(members[0]).unwrap();
    assert!((head.position().x - (6.0 - 1e-4)).abs() < 1e-9);
    assert_eq!(head.position().y, RAIL_Y);
    for id in members {
        assert_eq!(railway.cart(id).unwrap().velocity(), vec3(0.0, 0.0, 0.0));
    }
}

#[test]
fn test_block_change_events() {
    let map = straight_map(0, 20);
    let mut railway = railway_with(TrainCartsConfig::default());
    let cart = railway.spawn_cart(on_line(5.8)).unwrap();
    railway
        .cart_mut(cart)
        .unwrap()
        .set_velocity(vec3(0.3, 0.0, 0.0));
    railway.tick(&map);
    let events = railway.drain_events();
    assert!(events
        .iter()
        .any(|e| matches!(e, CartEvent::Moved { cart: c, .. } if *c == cart)));
    // Spawning onto the rail does not count as changing blocks
    assert!(!events
        .iter()
        .any(|e| matches!(e, CartEvent::BlockChanged { .. })));

    railway.tick(&map);
    let events = railway.drain_events();
    assert!(events.contains(&CartEvent::BlockChanged {
        cart,
        from: BlockCoordinate::new(5, 0, 0),
        to: BlockCoordinate::new(6, 0, 0),
    }));
}

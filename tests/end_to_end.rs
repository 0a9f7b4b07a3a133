use approx::assert_relative_eq;
use coasterkit::ride::{Actuator, Cart, RideEvent, Sensor, Train, TrainConfig, Zones};
use coasterkit::sim::Float3;
use coasterkit::spline::{bezier, Anchor, SplineChain};
use coasterkit::track::{
    GeneratorConfig, HeightBinding, ProfileMesh, Rebuildable, SupportPrefab, TrackGenerator,
    TrackMeshBuilder,
};

fn flat_chain() -> SplineChain {
    SplineChain::new(vec![
        Anchor::new(Float3::new(0.0, 2.0, 0.0), Float3::new(2.0, 0.0, 0.0), 0.0),
        Anchor::new(Float3::new(5.0, 2.0, 0.0), Float3::new(2.0, 0.0, 0.0), 0.0),
    ])
}

fn connected_track() -> TrackGenerator {
    let mut generator = TrackGenerator::new(GeneratorConfig::default());
    generator.add_chain(flat_chain());
    generator.add_chain(SplineChain::new(vec![
        Anchor::new(Float3::new(5.0, 2.0, 0.0), Float3::new(2.0, 0.0, 0.0), 0.0),
        Anchor::new(Float3::new(10.0, 2.0, 0.0), Float3::new(2.0, 0.0, 0.0), 0.0),
    ]));
    generator.set_profile(ProfileMesh::strip(1.0));
    generator.set_support_prefabs(vec![SupportPrefab::single_leg(0.0)]);
    generator
}

#[test]
fn bezier_hits_its_end_points() {
    let p0 = Float3::new(1.0, 2.0, 3.0);
    let p3 = Float3::new(-4.0, 0.5, 2.0);
    let (p1, p2) = (Float3::new(0.0, 5.0, 0.0), Float3::new(3.0, -1.0, 1.0));
    assert_eq!(bezier::evaluate(p0, p1, p2, p3, 0.0), p0);
    assert_eq!(bezier::evaluate(p0, p1, p2, p3, 1.0), p3);
}

#[test]
fn flat_chain_length() {
    assert_relative_eq!(flat_chain().length(), 5.0, epsilon = 1e-3);
}

#[test]
fn length_grows_with_handle() {
    let mut chain = flat_chain();
    let mut previous = chain.length();
    // A handle off the chord bends the segment further as it grows.
    for magnitude in [1.0, 2.0, 3.0, 4.0] {
        chain.anchor_mut(0).expect("anchor").handle = Float3::new(0.0, magnitude, 0.0);
        chain.set_dirty();
        let length = chain.length();
        assert!(length > previous, "{length} after {previous}");
        previous = length;
    }
}

#[test]
fn collinear_handles_keep_straight_length() {
    let mut chain = flat_chain();
    for magnitude in [3.0, 4.0] {
        chain.anchor_mut(0).expect("anchor").handle = Float3::new(magnitude, 0.0, 0.0);
        chain.anchor_mut(1).expect("anchor").handle = Float3::new(magnitude, 0.0, 0.0);
        chain.set_dirty();
        assert_relative_eq!(chain.length(), 5.0, epsilon = 1e-3);
    }
}

#[test]
fn rebuilding_twice_is_identical() {
    let mut generator = connected_track();
    let first = generator.rebuild();
    let meshes: Vec<_> = (0..generator.chains().len())
        .map(|i| generator.surface(i).cloned().expect("surface"))
        .collect();

    let second = generator.rebuild();
    assert_eq!(first, second);
    for (i, mesh) in meshes.iter().enumerate() {
        assert_eq!(generator.surface(i), Some(mesh));
    }
}

#[test]
fn supports_avoid_track_below() {
    let mut generator = connected_track();
    // A low chain passing under the first support of chain 0.
    generator.add_chain(SplineChain::new(vec![
        Anchor::new(Float3::new(0.0, 0.8, -3.0), Float3::new(0.0, 0.0, 2.0), 0.0),
        Anchor::new(Float3::new(0.0, 0.8, 3.0), Float3::new(0.0, 0.0, 2.0), 0.0),
    ]));
    let supports = generator.place_supports(0).expect("supports");
    assert!(supports
        .iter()
        .all(|s| s.position.distance(Float3::new(0.0, 2.0, 0.0)) > 0.1));
    assert!(!supports.is_empty());
}

#[test]
fn train_at_rest_on_flat_track() {
    let mut generator = TrackGenerator::new(GeneratorConfig::default());
    generator.add_chain(flat_chain());
    let mut train = Train::from_carts(&generator, vec![Cart::new(0, 0.0)], TrainConfig::default());
    train.step(&generator, &Zones::new(), 1.0 / 60.0);
    assert_eq!(train.speed(), 0.0);
    assert_eq!(train.carts()[0].distance, 0.0);
}

#[test]
fn launched_train_runs_onto_next_chain() {
    let generator = connected_track();
    let mut train = Train::place(&generator, Float3::new(1.0, 3.0, 0.0), 1, TrainConfig::default())
        .expect("train");
    let mut zones = Zones::new();
    let mut launch = Actuator::new(train.current_pose(0).expect("pose").position);
    launch.set_force(40.0);
    zones.add_actuator(launch);
    let gate = zones.add_sensor(Sensor::new(Float3::new(6.0, 3.0, 0.0)));
    let events = train.subscribe();

    for _ in 0..150 {
        train.step(&generator, &zones, 1.0 / 60.0);
    }
    assert_eq!(train.carts().len(), 1);
    assert_eq!(train.carts()[0].chain, 1);

    let received: Vec<RideEvent> = events.receiver.try_iter().collect();
    assert!(received.contains(&RideEvent::SensorEnter(gate)));
}

#[test]
fn builder_rebuilds_after_height_change_settles() {
    let mut generator = connected_track();
    let mut builder = TrackMeshBuilder::new();
    builder.build_now(&mut generator);

    let mut binding = HeightBinding::new(&generator, 0, 0, 2, -1.0, 1.0).expect("binding");
    binding.set_height01(1.0, &mut generator).expect("height");
    assert!(builder.update(&mut generator).is_none());
    let report = builder.update(&mut generator).expect("rebuild");
    assert_eq!(report.surfaces, 2);

    let surface = generator.surface(0).expect("surface");
    assert_relative_eq!(surface.vertices[0].y, 3.0, epsilon = 1e-3);
}

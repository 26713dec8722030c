//! Drive path requests through the plugin the way a game would, by sending
//! events at a grid entity and collecting the results
//!

use std::sync::{Arc, Mutex};

use bevy::prelude::*;
use bevy_astar_grid_plugin::prelude::*;

/// Results collected from [EventPathResult]s
#[derive(Resource, Default)]
struct Received(Vec<EventPathResult>);

/// Copy every published result into [Received]
fn collect(mut events: EventReader<EventPathResult>, mut received: ResMut<Received>) {
	for event in events.read() {
		received.0.push(event.clone());
	}
}

/// A 20x20 world with a wall along `x = 0` open only at the far `z` end
fn walled(point: Vec3, _radius: f32) -> bool {
	!(point.x.abs() < 0.5 && point.z < 8.0)
}

/// A ring of blocked nodes around the walkable node centred at `(5, 0.5)`
fn ringed(point: Vec3, _radius: f32) -> bool {
	let distance = (point.x - 5.0).abs().max((point.z - 0.5).abs());
	!(distance > 0.5 && distance < 1.5)
}

/// No terrain anywhere
fn bare(_point: Vec3) -> Option<u32> {
	None
}

/// An app running the plugin with a single grid entity
fn setup(mode: BrokerMode) -> (App, Entity) {
	setup_with(mode, walled)
}

/// An app running the plugin with a single grid entity whose obstacles
/// come from `classifier`
fn setup_with(mode: BrokerMode, classifier: fn(Vec3, f32) -> bool) -> (App, Entity) {
	let mut app = App::new();
	app.add_plugins(AStarGridPlugin)
		.init_resource::<Received>()
		.add_systems(Update, collect.after(OrderingSet::Deliver));
	let settings = GridSettings::new(Vec3::ZERO, Vec2::new(21.0, 20.0), 0.5);
	let bundle = AStarGridBundle::new(settings, &classifier, &bare, mode).unwrap();
	let grid = app.world_mut().spawn(bundle).id();
	(app, grid)
}

/// Update the app until `count` results have arrived
fn update_until(app: &mut App, count: usize) -> Vec<EventPathResult> {
	for _ in 0..100_000 {
		app.update();
		if app.world().resource::<Received>().0.len() >= count {
			return app.world().resource::<Received>().0.clone();
		}
		std::thread::yield_now();
	}
	panic!("Results never arrived");
}

#[test]
fn immediate_event_round_trip() {
	let (mut app, grid) = setup(BrokerMode::Immediate);
	let actor = app.world_mut().spawn_empty().id();
	let start = Vec3::new(-5.0, 0.0, -4.5);
	let end = Vec3::new(5.0, 0.0, -4.5);
	app.world_mut().send_event(EventPathRequest::new(grid, actor, start, end));
	let results = update_until(&mut app, 1);
	assert_eq!(actor, results[0].get_requester());
	assert!(results[0].is_success());
	let waypoints = results[0].get_waypoints();
	// the route has to climb past the wall before coming back down
	assert!(waypoints.iter().any(|w| w.z >= 8.0));
	assert_eq!(end, *waypoints.last().unwrap());
}

#[test]
fn background_results_in_request_order() {
	let (mut app, grid) = setup(BrokerMode::Background);
	let actors: Vec<Entity> = (0..3).map(|_| app.world_mut().spawn_empty().id()).collect();
	for (i, actor) in actors.iter().enumerate() {
		let end = Vec3::new(5.0, 0.0, i as f32 * 2.0 - 2.0);
		app.world_mut()
			.send_event(EventPathRequest::new(grid, *actor, Vec3::new(-5.0, 0.0, 0.0), end));
	}
	let results = update_until(&mut app, 3);
	let order: Vec<Entity> = results.iter().map(|r| r.get_requester()).collect();
	assert_eq!(actors, order);
	assert!(results.iter().all(|r| r.is_success()));
	let broker = app.world().get::<PathRequestBroker>(grid).unwrap();
	assert!(!broker.is_busy());
	assert_eq!(0, broker.get_queue_len());
}

#[test]
fn blocked_target_reports_failure() {
	let (mut app, grid) = setup(BrokerMode::Immediate);
	let actor = app.world_mut().spawn_empty().id();
	// the target node sits on the wall
	let end = Vec3::new(0.0, 0.0, 0.0);
	app.world_mut()
		.send_event(EventPathRequest::new(grid, actor, Vec3::new(-5.0, 0.0, 0.0), end));
	let results = update_until(&mut app, 1);
	assert!(!results[0].is_success());
	assert!(results[0].get_waypoints().is_empty());
}

#[test]
fn walled_off_target_reports_failure() {
	let (mut app, grid) = setup_with(BrokerMode::Background, ringed);
	let actor = app.world_mut().spawn_empty().id();
	// the target node is walkable but every neighbour is blocked
	let end = Vec3::new(5.0, 0.0, 0.5);
	let broker = app.world().get::<PathRequestBroker>(grid).unwrap();
	assert!(broker.get_grid().get_node_from_world_point(end).is_walkable());
	app.world_mut()
		.send_event(EventPathRequest::new(grid, actor, Vec3::new(-5.0, 0.0, 0.5), end));
	let results = update_until(&mut app, 1);
	assert_eq!(actor, results[0].get_requester());
	assert!(!results[0].is_success());
	assert!(results[0].get_waypoints().is_empty());
	// the whole reachable region was searched without tripping the bound
	let search = PathSearch::new(broker_grid(&app, grid).as_ref()).run(Vec3::new(-5.0, 0.0, 0.5), end);
	assert_eq!(Err(SearchError::UnreachableTarget), search);
}

/// The grid searched by the broker on `entity`
fn broker_grid(app: &App, entity: Entity) -> Arc<Grid> {
	let broker = app.world().get::<PathRequestBroker>(entity).unwrap();
	Arc::clone(broker.get_grid())
}

#[test]
fn request_without_broker_fails() {
	let (mut app, _grid) = setup(BrokerMode::Immediate);
	let actor = app.world_mut().spawn_empty().id();
	let not_a_grid = app.world_mut().spawn_empty().id();
	app.world_mut()
		.send_event(EventPathRequest::new(not_a_grid, actor, Vec3::ZERO, Vec3::ONE));
	let results = update_until(&mut app, 1);
	assert_eq!(actor, results[0].get_requester());
	assert!(!results[0].is_success());
}

#[test]
fn callbacks_share_a_broker_with_events() {
	let (mut app, grid) = setup(BrokerMode::Background);
	let hits = Arc::new(Mutex::new(Vec::new()));
	let sink = Arc::clone(&hits);
	{
		let mut entity = app.world_mut().entity_mut(grid);
		let mut broker = entity.get_mut::<PathRequestBroker>().unwrap();
		broker.request(Vec3::new(-5.0, 0.0, 0.0), Vec3::new(-2.0, 0.0, 3.0), move |result| {
			sink.lock().unwrap().push(result.is_success());
		});
	}
	let actor = app.world_mut().spawn_empty().id();
	app.world_mut().send_event(EventPathRequest::new(
		grid,
		actor,
		Vec3::new(-5.0, 0.0, 0.0),
		Vec3::new(5.0, 0.0, 0.0),
	));
	let results = update_until(&mut app, 1);
	// the callback request was queued first so it resolved first
	assert_eq!(vec![true], *hits.lock().unwrap());
	assert!(results[0].is_success());
}

//! Logic relating to queuing path requests against a [Grid].
//!
//! Many actors may ask for a path in the same frame. Requests are placed in
//! a FIFO queue owned by a [PathRequestBroker] and only one search runs at a
//! time, its result is handed back before the next request is dispatched.
//!

use std::collections::VecDeque;
use std::sync::Arc;

use crate::prelude::*;
use bevy::prelude::*;
use bevy::tasks::{block_on, futures_lite::future, AsyncComputeTaskPool, Task, TaskPool};

/// The outcome of a path request
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PathResult {
	/// Simplified route from the start to the target, empty on failure
	waypoints: Vec<Vec3>,
	/// Whether a path was found
	success: bool,
}

impl PathResult {
	/// A result with no route
	pub fn failed() -> Self {
		PathResult::default()
	}
	/// Simplified route, empty on failure
	pub fn get_waypoints(&self) -> &[Vec3] {
		&self.waypoints
	}
	/// Consume the result leaving only its waypoints
	pub fn into_waypoints(self) -> Vec<Vec3> {
		self.waypoints
	}
	/// Whether a path was found
	pub fn is_success(&self) -> bool {
		self.success
	}
}

impl From<Result<Path, SearchError>> for PathResult {
	fn from(result: Result<Path, SearchError>) -> Self {
		match result {
			Ok(path) => PathResult {
				waypoints: path.into_waypoints(),
				success: true,
			},
			Err(e) => {
				debug!("Path request failed: {}", e);
				PathResult::failed()
			}
		}
	}
}

/// Invoked with the result of a request made through [PathRequestBroker::request]
pub type PathCallback = Box<dyn FnOnce(PathResult) + Send + Sync>;

/// Where the result of a request should go
enum Responder {
	/// Call a closure
	Callback(PathCallback),
	/// Emit an [EventPathResult] addressed to an entity
	Entity(Entity),
}

/// A queued request for a path
struct PathRequest {
	/// World position to path from
	start: Vec3,
	/// World position to path to
	end: Vec3,
	/// Receiver of the result
	responder: Responder,
}

/// How a [PathRequestBroker] runs its searches
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Reflect)]
pub enum BrokerMode {
	/// Each search runs as a task on the [AsyncComputeTaskPool] and is
	/// collected by [PathRequestBroker::poll]
	#[default]
	Background,
	/// Each search runs to completion as soon as it is dispatched
	Immediate,
}

/// The request currently being searched
struct ActiveRequest {
	/// Receiver of the result
	responder: Responder,
	/// Search running in the background
	task: Task<PathResult>,
}

/// Serialises path requests against one [Grid]. Requests are dispatched in
/// the order they arrive and only one search is ever in flight
#[derive(Component)]
pub struct PathRequestBroker {
	/// The grid searched, shared with any running task
	grid: Arc<Grid>,
	/// How searches are run
	mode: BrokerMode,
	/// Requests waiting to be searched
	queue: VecDeque<PathRequest>,
	/// The request being searched in [BrokerMode::Background]
	active: Option<ActiveRequest>,
}

impl PathRequestBroker {
	/// Create a new instance of [PathRequestBroker]
	pub fn new(grid: Arc<Grid>, mode: BrokerMode) -> Self {
		PathRequestBroker {
			grid,
			mode,
			queue: VecDeque::new(),
			active: None,
		}
	}
	/// Get a reference to the grid the broker searches
	pub fn get_grid(&self) -> &Arc<Grid> {
		&self.grid
	}
	/// How the broker runs searches
	pub fn get_mode(&self) -> BrokerMode {
		self.mode
	}
	/// Number of requests waiting behind the active one
	pub fn get_queue_len(&self) -> usize {
		self.queue.len()
	}
	/// Whether a search is in flight
	pub fn is_busy(&self) -> bool {
		self.active.is_some()
	}
	/// Queue a path request whose result is passed to `callback`. If no
	/// search is running the request is dispatched straight away
	pub fn request<F>(&mut self, start: Vec3, end: Vec3, callback: F)
	where
		F: FnOnce(PathResult) + Send + Sync + 'static,
	{
		let delivered = self.enqueue(PathRequest {
			start,
			end,
			responder: Responder::Callback(Box::new(callback)),
		});
		// immediate mode never leaves entity requests waiting so nothing
		// addressed to an entity can surface here
		debug_assert!(delivered.is_empty());
	}
	/// Queue a path request on behalf of an entity. The result is returned
	/// from [PathRequestBroker::poll] (or from this call in
	/// [BrokerMode::Immediate]) for the plugin to emit as an
	/// [EventPathResult]
	pub fn request_for(&mut self, requester: Entity, start: Vec3, end: Vec3) -> Vec<(Entity, PathResult)> {
		self.enqueue(PathRequest {
			start,
			end,
			responder: Responder::Entity(requester),
		})
	}
	/// Push a request to the back of the queue and try to dispatch
	fn enqueue(&mut self, request: PathRequest) -> Vec<(Entity, PathResult)> {
		trace!(
			"Queuing path request from {:?} to {:?}, {} already waiting",
			request.start,
			request.end,
			self.queue.len()
		);
		self.queue.push_back(request);
		self.dispatch()
	}
	/// In [BrokerMode::Immediate] run every waiting request, otherwise make
	/// sure the head of the queue has been dispatched
	fn dispatch(&mut self) -> Vec<(Entity, PathResult)> {
		let mut delivered = Vec::new();
		match self.mode {
			BrokerMode::Immediate => {
				while let Some(request) = self.queue.pop_front() {
					let result = run_search(&self.grid, request.start, request.end);
					if let Some(entity_result) = respond(request.responder, result) {
						delivered.push(entity_result);
					}
				}
			}
			BrokerMode::Background => self.try_dispatch_next(),
		}
		delivered
	}
	/// Start a background search for the head of the queue if nothing is running
	fn try_dispatch_next(&mut self) {
		if self.active.is_some() {
			return;
		}
		if let Some(request) = self.queue.pop_front() {
			let grid = Arc::clone(&self.grid);
			let (start, end) = (request.start, request.end);
			let pool = AsyncComputeTaskPool::get_or_init(TaskPool::new);
			let task = pool.spawn(async move { run_search(&grid, start, end) });
			self.active = Some(ActiveRequest {
				responder: request.responder,
				task,
			});
		}
	}
	/// Check on the active search. When it has finished its result is
	/// delivered, callbacks are invoked directly while entity addressed
	/// results are returned, and the next queued request is dispatched
	pub fn poll(&mut self) -> Option<(Entity, PathResult)> {
		let active = self.active.as_mut()?;
		let result = block_on(future::poll_once(&mut active.task))?;
		let finished = self.active.take()?;
		let delivered = respond(finished.responder, result);
		self.try_dispatch_next();
		delivered
	}
}

/// Search the grid and flatten the outcome into a [PathResult]
fn run_search(grid: &Grid, start: Vec3, end: Vec3) -> PathResult {
	PathSearch::new(grid).run(start, end).into()
}

/// Hand a result to its responder, entity addressed results are returned
/// for the caller to publish
fn respond(responder: Responder, result: PathResult) -> Option<(Entity, PathResult)> {
	match responder {
		Responder::Callback(callback) => {
			callback(result);
			None
		}
		Responder::Entity(entity) => Some((entity, result)),
	}
}

/// A request to queue up a path search from `start` to `end` on the
/// [PathRequestBroker] of the `grid` entity
#[derive(Event)]
pub struct EventPathRequest {
	/// Entity holding the [PathRequestBroker] to search with
	grid: Entity,
	/// Entity that wants the path, the result is addressed to it
	requester: Entity,
	/// World position to path from
	start: Vec3,
	/// World position to path to
	end: Vec3,
}

impl EventPathRequest {
	/// Create a new instance of [EventPathRequest]
	pub fn new(grid: Entity, requester: Entity, start: Vec3, end: Vec3) -> Self {
		EventPathRequest {
			grid,
			requester,
			start,
			end,
		}
	}
	/// Entity holding the broker to search with
	pub fn get_grid(&self) -> Entity {
		self.grid
	}
	/// Entity that asked for the path
	pub fn get_requester(&self) -> Entity {
		self.requester
	}
	/// World position to path from
	pub fn get_start(&self) -> Vec3 {
		self.start
	}
	/// World position to path to
	pub fn get_end(&self) -> Vec3 {
		self.end
	}
}

/// The result of an [EventPathRequest]
#[derive(Event, Clone, Debug)]
pub struct EventPathResult {
	/// Entity that asked for the path
	requester: Entity,
	/// Simplified route, empty on failure
	waypoints: Vec<Vec3>,
	/// Whether a path was found
	success: bool,
}

impl EventPathResult {
	/// Create a new instance of [EventPathResult]
	pub fn new(requester: Entity, result: PathResult) -> Self {
		EventPathResult {
			requester,
			success: result.is_success(),
			waypoints: result.into_waypoints(),
		}
	}
	/// Entity that asked for the path
	pub fn get_requester(&self) -> Entity {
		self.requester
	}
	/// Simplified route, empty on failure
	pub fn get_waypoints(&self) -> &[Vec3] {
		&self.waypoints
	}
	/// Whether a path was found
	pub fn is_success(&self) -> bool {
		self.success
	}
}

/// Move [EventPathRequest]s into the queue of their [PathRequestBroker]
#[cfg(not(tarpaulin_include))]
pub fn event_insert_path_queue(
	mut events: EventReader<EventPathRequest>,
	mut brokers: Query<&mut PathRequestBroker>,
	mut results: EventWriter<EventPathResult>,
) {
	for event in events.read() {
		match brokers.get_mut(event.get_grid()) {
			Ok(mut broker) => {
				let delivered =
					broker.request_for(event.get_requester(), event.get_start(), event.get_end());
				for (requester, result) in delivered {
					results.write(EventPathResult::new(requester, result));
				}
			}
			Err(_) => {
				warn!(
					"Path request from {:?} names {:?} which has no PathRequestBroker",
					event.get_requester(),
					event.get_grid()
				);
				results.write(EventPathResult::new(
					event.get_requester(),
					PathResult::failed(),
				));
			}
		}
	}
}

/// Collect finished background searches and publish their results
#[cfg(not(tarpaulin_include))]
pub fn poll_path_brokers(
	mut brokers: Query<&mut PathRequestBroker>,
	mut results: EventWriter<EventPathResult>,
) {
	for mut broker in &mut brokers {
		if let Some((requester, result)) = broker.poll() {
			results.write(EventPathResult::new(requester, result));
		}
	}
}

#[rustfmt::skip]
#[cfg(test)]
mod tests {
	use super::*;
	use std::sync::Mutex;

	/// Every point is walkable
	fn open(_point: Vec3, _radius: f32) -> bool {
		true
	}
	/// No terrain layers anywhere
	fn bare(_point: Vec3) -> Option<u32> {
		None
	}
	/// A 5x5 open grid of unit nodes centred at the origin
	fn open_grid() -> Arc<Grid> {
		let settings = GridSettings::new(Vec3::ZERO, Vec2::splat(5.0), 0.5).with_blur_size(0);
		Arc::new(Grid::new(settings, &open, &bare).unwrap())
	}
	/// Poll until the broker goes idle
	fn run_until_idle(broker: &mut PathRequestBroker) -> Vec<(Entity, PathResult)> {
		let mut delivered = Vec::new();
		for _ in 0..100_000 {
			if !broker.is_busy() {
				return delivered;
			}
			if let Some(result) = broker.poll() {
				delivered.push(result);
			}
			std::thread::yield_now();
		}
		panic!("Broker did not finish its queue");
	}

	#[test]
	fn immediate_callback() {
		let mut broker = PathRequestBroker::new(open_grid(), BrokerMode::Immediate);
		let received = Arc::new(Mutex::new(None));
		let sink = Arc::clone(&received);
		broker.request(Vec3::new(-2.0, 0.0, -2.0), Vec3::new(2.0, 0.0, 2.0), move |result| {
			*sink.lock().unwrap() = Some(result);
		});
		let result = received.lock().unwrap().take().unwrap();
		assert!(result.is_success());
		assert_eq!(vec![Vec3::new(2.0, 0.0, 2.0)], result.get_waypoints());
		assert!(!broker.is_busy());
	}
	#[test]
	fn immediate_entity_result() {
		let mut broker = PathRequestBroker::new(open_grid(), BrokerMode::Immediate);
		let requester = Entity::from_raw(7);
		let delivered = broker.request_for(requester, Vec3::new(-2.0, 0.0, 0.0), Vec3::new(2.0, 0.0, 0.0));
		assert_eq!(1, delivered.len());
		assert_eq!(requester, delivered[0].0);
		assert!(delivered[0].1.is_success());
	}
	#[test]
	fn failure_is_empty() {
		let settings = GridSettings::new(Vec3::ZERO, Vec2::splat(5.0), 0.5);
		let pillar = |p: Vec3, _r: f32| p != Vec3::ZERO;
		let grid = Arc::new(Grid::new(settings, &pillar, &bare).unwrap());
		let mut broker = PathRequestBroker::new(grid, BrokerMode::Immediate);
		let delivered = broker.request_for(Entity::from_raw(1), Vec3::new(-2.0, 0.0, -2.0), Vec3::ZERO);
		let actual = PathResult::failed();
		assert_eq!(actual, delivered[0].1);
	}
	#[test]
	fn background_fifo_order() {
		let mut broker = PathRequestBroker::new(open_grid(), BrokerMode::Background);
		let order = Arc::new(Mutex::new(Vec::new()));
		for i in 0..3 {
			let sink = Arc::clone(&order);
			broker.request(Vec3::new(-2.0, 0.0, -2.0), Vec3::new(2.0, 0.0, i as f32 - 1.0), move |result| {
				assert!(result.is_success());
				sink.lock().unwrap().push(i);
			});
		}
		// the first is in flight, the other two wait
		assert!(broker.is_busy());
		assert_eq!(2, broker.get_queue_len());
		run_until_idle(&mut broker);
		let result = order.lock().unwrap().clone();
		let actual = vec![0, 1, 2];
		assert_eq!(actual, result);
		assert_eq!(0, broker.get_queue_len());
	}
	#[test]
	fn background_entity_results_in_order() {
		let mut broker = PathRequestBroker::new(open_grid(), BrokerMode::Background);
		let requesters: Vec<Entity> = (0..4).map(Entity::from_raw).collect();
		for requester in requesters.iter() {
			let delivered = broker.request_for(*requester, Vec3::new(-2.0, 0.0, -2.0), Vec3::new(2.0, 0.0, 2.0));
			assert!(delivered.is_empty());
		}
		let delivered = run_until_idle(&mut broker);
		let result: Vec<Entity> = delivered.iter().map(|(e, _)| *e).collect();
		assert_eq!(requesters, result);
	}
	#[test]
	fn path_result_from_search_error() {
		let result: PathResult = Err(SearchError::UnreachableTarget).into();
		assert!(!result.is_success());
		assert!(result.get_waypoints().is_empty());
	}
}

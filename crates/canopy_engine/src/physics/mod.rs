//! Physics manager: a facade over the rapier3d rigid-body solver
//!
//! The manager owns the whole simulation context (pipeline, body and
//! collider sets, island manager) as plain fields; nothing is process-global,
//! so independent managers own independent worlds. Engine code deals in
//! [`BodyDesc`]s and owner entities; collision detection and constraint
//! solving are delegated entirely to rapier.

use std::collections::HashMap;
use std::sync::Mutex;

use rapier3d::geometry::ContactPair;
use rapier3d::pipeline::EventHandler;
use rapier3d::prelude::{
    ActiveEvents, CCDSolver, ColliderBuilder, ColliderSet, CollisionEvent, DefaultBroadPhase,
    ImpulseJointSet, IntegrationParameters, IslandManager, MultibodyJointSet, NarrowPhase,
    PhysicsPipeline, Real, RigidBody, RigidBodyBuilder, RigidBodyHandle, RigidBodySet,
};
use slotmap::{new_key_type, Key, SlotMap};

use crate::config::PhysicsConfig;
use crate::entity::EntityKey;
use crate::foundation::math::{Quat, Transform, Unit, Vec3};
use crate::plugin::{Plugin, PluginCore};

/// Handle to a rigid body owned by the manager
///
/// Re-exported rapier handle; wrapping it in a parallel type would only add
/// a translation table.
pub type BodyHandle = RigidBodyHandle;

new_key_type! {
    /// Handle identifying a registered [`PhysicsController`]
    pub struct ControllerHandle;
}

/// Errors raised by the physics facade
///
/// All of these are programmer errors; operations fail immediately with no
/// state mutation and no retry.
#[derive(thiserror::Error, Debug)]
pub enum PhysicsError {
    /// The body handle does not resolve to a registered body
    #[error("body not registered with the physics manager")]
    BodyNotFound,

    /// The owning entity already has a registered body
    #[error("owner already has a registered body")]
    BodyAlreadyRegistered,

    /// The controller handle does not resolve to a registered controller
    #[error("controller not registered with the physics manager")]
    ControllerNotFound,
}

/// Rigid body motion kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    /// Simulated: forces and contacts move the body
    Dynamic,
    /// Immovable scenery
    Fixed,
    /// Moved by engine code, pushes dynamic bodies
    KinematicPositionBased,
}

/// Collision shape for a body's single collider
#[derive(Debug, Clone)]
pub enum ColliderShape {
    /// Infinite half-space, solid below the given surface normal
    Plane {
        /// Outward surface normal
        normal: Unit<Vec3>,
    },
    /// Axis-aligned box in local space
    Cuboid {
        /// Half extents along each local axis
        half_extents: Vec3,
    },
    /// Sphere
    Ball {
        /// Sphere radius
        radius: f32,
    },
}

/// Everything needed to register a body with the solver
#[derive(Debug, Clone)]
pub struct BodyDesc {
    /// Motion kind
    pub kind: BodyKind,

    /// Initial pose (scale is ignored; colliders are sized by the shape)
    pub transform: Transform,

    /// Collision shape
    pub shape: ColliderShape,

    /// Collider density, used by rapier to derive mass
    pub density: f32,

    /// Contact friction coefficient
    pub friction: f32,

    /// Contact restitution (bounciness)
    pub restitution: f32,

    /// Initial linear velocity
    pub linear_velocity: Vec3,
}

impl BodyDesc {
    /// A dynamic body with default material parameters
    pub fn dynamic(shape: ColliderShape) -> Self {
        Self {
            kind: BodyKind::Dynamic,
            transform: Transform::identity(),
            shape,
            density: 1.0,
            friction: 0.5,
            restitution: 0.0,
            linear_velocity: Vec3::zeros(),
        }
    }

    /// A fixed (immovable) body with default material parameters
    pub fn fixed(shape: ColliderShape) -> Self {
        Self {
            kind: BodyKind::Fixed,
            ..Self::dynamic(shape)
        }
    }

    /// Builder-style: set the initial pose
    pub fn at(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    /// Builder-style: set the initial linear velocity
    pub fn with_velocity(mut self, velocity: Vec3) -> Self {
        self.linear_velocity = velocity;
        self
    }
}

/// Per-step hook mutating the body set before integration
///
/// Controllers are the engine-level adapter for rapier's pre-step force and
/// velocity hooks: each registered controller runs once per physics update,
/// in registration order, immediately before the integration step.
pub trait PhysicsController {
    /// Apply forces/velocities for the coming step of length `dt`
    fn pre_step(&mut self, bodies: &mut RigidBodySet, dt: f32);
}

/// A contact between two entity-owned bodies
#[derive(Debug, Clone, Copy)]
pub struct ContactEvent {
    /// Owner of the first body in the pair
    pub first: EntityKey,

    /// Owner of the second body in the pair
    pub second: EntityKey,

    /// True when contact started, false when it stopped
    pub started: bool,
}

/// Collects rapier collision events during a step
///
/// Rapier requires `Sync` from event handlers; the mutex is only ever
/// contended by rapier's own (single-threaded here) dispatch.
#[derive(Default)]
struct ContactCollector {
    events: Mutex<Vec<CollisionEvent>>,
}

impl EventHandler for ContactCollector {
    fn handle_collision_event(
        &self,
        _bodies: &RigidBodySet,
        _colliders: &ColliderSet,
        event: CollisionEvent,
        _contact_pair: Option<&ContactPair>,
    ) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }

    fn handle_contact_force_event(
        &self,
        _dt: Real,
        _bodies: &RigidBodySet,
        _colliders: &ColliderSet,
        _contact_pair: &ContactPair,
        _total_force_magnitude: Real,
    ) {
    }
}

/// Facade over the rapier3d rigid-body solver
pub struct PhysicsManager {
    core: PluginCore,

    gravity: Vec3,
    max_timestep: f32,

    pipeline: PhysicsPipeline,
    integration_parameters: IntegrationParameters,
    islands: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,

    owners: HashMap<BodyHandle, EntityKey>,
    bodies_by_owner: HashMap<EntityKey, BodyHandle>,

    controllers: SlotMap<ControllerHandle, Box<dyn PhysicsController>>,
    controller_order: Vec<ControllerHandle>,

    pending_contacts: Vec<ContactEvent>,
}

impl PhysicsManager {
    /// Create a manager owning a fresh simulation context
    pub fn new(config: &PhysicsConfig) -> Self {
        log::info!(
            "physics manager initialized (gravity {:?}, max timestep {}s)",
            config.gravity,
            config.max_timestep
        );
        Self {
            core: PluginCore::new("physics", 0),
            gravity: Vec3::from(config.gravity),
            max_timestep: config.max_timestep,
            pipeline: PhysicsPipeline::new(),
            integration_parameters: IntegrationParameters::default(),
            islands: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            owners: HashMap::new(),
            bodies_by_owner: HashMap::new(),
            controllers: SlotMap::with_key(),
            controller_order: Vec::new(),
            pending_contacts: Vec::new(),
        }
    }

    /// World gravity
    pub fn gravity(&self) -> Vec3 {
        self.gravity
    }

    /// Set world gravity; applied from the next step onward
    pub fn set_gravity(&mut self, gravity: Vec3) {
        self.gravity = gravity;
    }

    /// Register a body for `owner`
    ///
    /// Fails with [`PhysicsError::BodyAlreadyRegistered`] if the owner
    /// already has a body. The owner key is echoed into the body's user
    /// data so collision callbacks can recover it.
    pub fn add_body(&mut self, owner: EntityKey, desc: &BodyDesc) -> Result<BodyHandle, PhysicsError> {
        if self.bodies_by_owner.contains_key(&owner) {
            return Err(PhysicsError::BodyAlreadyRegistered);
        }

        let builder = match desc.kind {
            BodyKind::Dynamic => RigidBodyBuilder::dynamic(),
            BodyKind::Fixed => RigidBodyBuilder::fixed(),
            BodyKind::KinematicPositionBased => RigidBodyBuilder::kinematic_position_based(),
        };
        let body = builder
            .position(nalgebra::Isometry3::from_parts(
                desc.transform.position.into(),
                desc.transform.rotation,
            ))
            .linvel(desc.linear_velocity)
            .user_data(u128::from(owner.data().as_ffi()))
            .build();
        let handle = self.bodies.insert(body);

        let collider = match &desc.shape {
            ColliderShape::Plane { normal } => ColliderBuilder::halfspace(*normal),
            ColliderShape::Cuboid { half_extents } => {
                ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z)
            }
            ColliderShape::Ball { radius } => ColliderBuilder::ball(*radius),
        }
        .density(desc.density)
        .friction(desc.friction)
        .restitution(desc.restitution)
        .active_events(ActiveEvents::COLLISION_EVENTS)
        .build();
        self.colliders
            .insert_with_parent(collider, handle, &mut self.bodies);

        self.owners.insert(handle, owner);
        self.bodies_by_owner.insert(owner, handle);
        Ok(handle)
    }

    /// Remove a registered body and its colliders
    ///
    /// Fails with [`PhysicsError::BodyNotFound`] if the handle is unknown;
    /// never a silent no-op.
    pub fn remove_body(&mut self, handle: BodyHandle) -> Result<(), PhysicsError> {
        let owner = self.owners.remove(&handle).ok_or(PhysicsError::BodyNotFound)?;
        self.bodies_by_owner.remove(&owner);
        self.bodies.remove(
            handle,
            &mut self.islands,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            true,
        );
        Ok(())
    }

    /// Number of registered bodies
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// The body handle registered for `owner`, if any
    pub fn body_of(&self, owner: EntityKey) -> Option<BodyHandle> {
        self.bodies_by_owner.get(&owner).copied()
    }

    /// The entity owning `handle`, if registered
    pub fn owner_of(&self, handle: BodyHandle) -> Option<EntityKey> {
        self.owners.get(&handle).copied()
    }

    /// Current pose of a registered body
    pub fn body_pose(&self, handle: BodyHandle) -> Option<(Vec3, Quat)> {
        self.bodies
            .get(handle)
            .map(|body| (*body.translation(), *body.rotation()))
    }

    /// Direct mutable access to a body, for impulses and velocity changes
    pub fn body_mut(&mut self, handle: BodyHandle) -> Option<&mut RigidBody> {
        self.bodies.get_mut(handle)
    }

    /// Register a controller; it runs before each step, in registration order
    pub fn add_controller(&mut self, controller: Box<dyn PhysicsController>) -> ControllerHandle {
        let handle = self.controllers.insert(controller);
        self.controller_order.push(handle);
        handle
    }

    /// Remove a registered controller
    ///
    /// Fails with [`PhysicsError::ControllerNotFound`] if the handle is
    /// unknown.
    pub fn remove_controller(&mut self, handle: ControllerHandle) -> Result<(), PhysicsError> {
        if self.controllers.remove(handle).is_none() {
            return Err(PhysicsError::ControllerNotFound);
        }
        self.controller_order.retain(|&h| h != handle);
        Ok(())
    }

    /// Number of registered controllers
    pub fn controller_count(&self) -> usize {
        self.controllers.len()
    }

    /// Advance the simulation by one step
    ///
    /// The timestep is `dt` clamped to the configured maximum; exactly one
    /// integration step runs per call, with no sub-stepping. Controllers run
    /// first, then the solver; collision events accumulate until drained
    /// with [`take_contact_events`](Self::take_contact_events).
    pub fn update(&mut self, dt: f32) {
        if dt <= 0.0 {
            return;
        }
        let step = dt.min(self.max_timestep);
        self.integration_parameters.dt = step;

        let order = self.controller_order.clone();
        for handle in order {
            if let Some(controller) = self.controllers.get_mut(handle) {
                controller.pre_step(&mut self.bodies, step);
            }
        }

        let collector = ContactCollector::default();
        self.pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.islands,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            None,
            &(),
            &collector,
        );

        let events = collector.events.into_inner().unwrap_or_default();
        for event in events {
            let (c1, c2, started) = match event {
                CollisionEvent::Started(c1, c2, _) => (c1, c2, true),
                CollisionEvent::Stopped(c1, c2, _) => (c1, c2, false),
            };
            let owner = |collider| {
                self.colliders
                    .get(collider)
                    .and_then(|c| c.parent())
                    .and_then(|body| self.owners.get(&body).copied())
            };
            if let (Some(first), Some(second)) = (owner(c1), owner(c2)) {
                self.pending_contacts.push(ContactEvent {
                    first,
                    second,
                    started,
                });
            }
        }
    }

    /// Drain contact events accumulated since the last call
    pub fn take_contact_events(&mut self) -> Vec<ContactEvent> {
        std::mem::take(&mut self.pending_contacts)
    }
}

impl Plugin for PhysicsManager {
    fn core(&self) -> &PluginCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut PluginCore {
        &mut self.core
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn manager() -> PhysicsManager {
        PhysicsManager::new(&PhysicsConfig::default())
    }

    fn keys(n: usize) -> Vec<EntityKey> {
        let mut map: SlotMap<EntityKey, ()> = SlotMap::with_key();
        (0..n).map(|_| map.insert(())).collect()
    }

    fn ball() -> ColliderShape {
        ColliderShape::Ball { radius: 0.5 }
    }

    #[test]
    fn test_add_remove_body_count() {
        let mut physics = manager();
        let owner = keys(1)[0];
        let handle = physics.add_body(owner, &BodyDesc::dynamic(ball())).unwrap();
        assert_eq!(physics.body_count(), 1);
        assert_eq!(physics.owner_of(handle), Some(owner));

        physics.remove_body(handle).unwrap();
        assert_eq!(physics.body_count(), 0);
        assert_eq!(physics.body_of(owner), None);
    }

    #[test]
    fn test_remove_unknown_body_fails_without_mutation() {
        let mut physics = manager();
        let owner = keys(1)[0];
        let handle = physics.add_body(owner, &BodyDesc::dynamic(ball())).unwrap();
        physics.remove_body(handle).unwrap();

        assert!(matches!(
            physics.remove_body(handle),
            Err(PhysicsError::BodyNotFound)
        ));
        assert_eq!(physics.body_count(), 0);
    }

    #[test]
    fn test_duplicate_owner_rejected() {
        let mut physics = manager();
        let owner = keys(1)[0];
        physics.add_body(owner, &BodyDesc::dynamic(ball())).unwrap();
        assert!(matches!(
            physics.add_body(owner, &BodyDesc::dynamic(ball())),
            Err(PhysicsError::BodyAlreadyRegistered)
        ));
        assert_eq!(physics.body_count(), 1);
    }

    #[test]
    fn test_remove_unregistered_controller_fails() {
        let mut physics = manager();
        struct Noop;
        impl PhysicsController for Noop {
            fn pre_step(&mut self, _bodies: &mut RigidBodySet, _dt: f32) {}
        }
        let handle = physics.add_controller(Box::new(Noop));
        physics.remove_controller(handle).unwrap();

        assert!(matches!(
            physics.remove_controller(handle),
            Err(PhysicsError::ControllerNotFound)
        ));
        assert_eq!(physics.controller_count(), 0);
    }

    #[test]
    fn test_controllers_run_in_registration_order() {
        let mut physics = manager();
        let log: Rc<RefCell<Vec<&'static str>>> = Rc::new(RefCell::new(Vec::new()));

        struct Tagger {
            tag: &'static str,
            log: Rc<RefCell<Vec<&'static str>>>,
        }
        impl PhysicsController for Tagger {
            fn pre_step(&mut self, _bodies: &mut RigidBodySet, _dt: f32) {
                self.log.borrow_mut().push(self.tag);
            }
        }

        physics.add_controller(Box::new(Tagger { tag: "first", log: Rc::clone(&log) }));
        physics.add_controller(Box::new(Tagger { tag: "second", log: Rc::clone(&log) }));
        physics.update(1.0 / 60.0);

        assert_eq!(*log.borrow(), vec!["first", "second"]);
    }

    #[test]
    fn test_gravity_passthrough() {
        let mut physics = manager();
        assert_relative_eq!(physics.gravity().y, -9.81);
        physics.set_gravity(Vec3::new(0.0, -3.71, 0.0));
        assert_relative_eq!(physics.gravity().y, -3.71);
    }

    #[test]
    fn test_long_frame_clamped_to_max_timestep() {
        let config = PhysicsConfig::default();
        let mut physics = PhysicsManager::new(&config);
        let owner = keys(1)[0];
        let handle = physics.add_body(owner, &BodyDesc::dynamic(ball())).unwrap();

        // A 10 second frame must advance by exactly max_timestep.
        physics.update(10.0);

        let velocity = physics.body_mut(handle).unwrap().linvel().y;
        assert_relative_eq!(velocity, -9.81 * config.max_timestep, epsilon = 1e-3);
    }

    #[test]
    fn test_contact_events_keyed_by_owner() {
        let mut physics = manager();
        let owners = keys(2);

        physics
            .add_body(
                owners[0],
                &BodyDesc::fixed(ColliderShape::Plane {
                    normal: Vec3::y_axis(),
                }),
            )
            .unwrap();
        physics
            .add_body(
                owners[1],
                &BodyDesc::dynamic(ball())
                    .at(Transform::from_position(Vec3::new(0.0, 1.0, 0.0))),
            )
            .unwrap();

        let mut contacts = Vec::new();
        for _ in 0..300 {
            physics.update(1.0 / 60.0);
            contacts.extend(physics.take_contact_events());
        }

        let started = contacts.iter().find(|c| c.started).expect("ball never landed");
        let pair = [started.first, started.second];
        assert!(pair.contains(&owners[0]) && pair.contains(&owners[1]));
    }
}

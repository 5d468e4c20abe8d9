//! Rapier-backed physics world
//!
//! Coordinates are container pixels with y growing downward, so gravity is +y.

use std::collections::HashMap;

use glam::Vec2;
use rapier2d::crossbeam::channel::{Receiver, unbounded};
use rapier2d::prelude::*;

use super::physics::{self, BodyHandle, BodyKind, DiscBody, PhysicsWorld};

/// Pixels per physics "meter"; keeps the solver tolerances sensible at pixel scale
const PIXELS_PER_METER: Real = 50.0;

/// [`PhysicsWorld`] on top of rapier2d
pub struct RapierWorld {
    gravity: Vector<Real>,
    params: IntegrationParameters,
    pipeline: PhysicsPipeline,
    islands: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    events: ChannelEventCollector,
    collision_recv: Receiver<CollisionEvent>,
    /// Never read, only kept so the collector's sends succeed
    _contact_force_recv: Receiver<ContactForceEvent>,
    /// Our handles to rapier's
    handles: HashMap<BodyHandle, RigidBodyHandle>,
    /// Collider back to the body that owns it (for contact reporting)
    owners: HashMap<ColliderHandle, BodyHandle>,
    next_id: u32,
}

impl RapierWorld {
    /// Empty world with downward gravity in pixels/second²
    pub fn new(gravity: f32) -> Self {
        let mut params = IntegrationParameters::default();
        params.length_unit = PIXELS_PER_METER;
        let (collision_send, collision_recv) = unbounded();
        let (contact_force_send, contact_force_recv) = unbounded();

        Self {
            gravity: vector![0.0, gravity],
            params,
            pipeline: PhysicsPipeline::new(),
            islands: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            events: ChannelEventCollector::new(collision_send, contact_force_send),
            collision_recv,
            _contact_force_recv: contact_force_recv,
            handles: HashMap::new(),
            owners: HashMap::new(),
            next_id: 1,
        }
    }

    /// Number of live bodies (walls included)
    pub fn body_count(&self) -> usize {
        self.handles.len()
    }

    fn register(&mut self, rb: RigidBodyHandle, collider: Collider) -> BodyHandle {
        let id = BodyHandle(self.next_id);
        self.next_id += 1;

        let ch = self
            .colliders
            .insert_with_parent(collider, rb, &mut self.bodies);
        self.handles.insert(id, rb);
        self.owners.insert(ch, id);
        id
    }

    fn body(&self, body: BodyHandle) -> Option<&RigidBody> {
        self.handles.get(&body).and_then(|h| self.bodies.get(*h))
    }
}

impl PhysicsWorld for RapierWorld {
    fn add_wall(&mut self, center: Vec2, half_extents: Vec2) -> BodyHandle {
        let rb = self.bodies.insert(
            RigidBodyBuilder::fixed()
                .translation(vector![center.x, center.y])
                .build(),
        );
        let collider = ColliderBuilder::cuboid(half_extents.x, half_extents.y)
            .friction(0.5)
            .build();
        self.register(rb, collider)
    }

    fn add_disc(&mut self, desc: &DiscBody) -> BodyHandle {
        let translation = vector![desc.pos.x, desc.pos.y];
        let (rb, collider) = match desc.kind {
            BodyKind::Dynamic => (
                RigidBodyBuilder::dynamic()
                    .translation(translation)
                    .ccd_enabled(true)
                    .build(),
                ColliderBuilder::ball(desc.radius)
                    .restitution(desc.material.restitution)
                    .friction(desc.material.friction)
                    .density(desc.material.density)
                    .active_events(ActiveEvents::COLLISION_EVENTS)
                    .build(),
            ),
            BodyKind::Sensor => (
                RigidBodyBuilder::fixed().translation(translation).build(),
                ColliderBuilder::ball(desc.radius).sensor(true).build(),
            ),
        };
        let rb = self.bodies.insert(rb);
        self.register(rb, collider)
    }

    fn remove(&mut self, body: BodyHandle) -> bool {
        let Some(rb) = self.handles.remove(&body) else {
            return false;
        };
        self.owners.retain(|_, owner| *owner != body);
        self.bodies
            .remove(
                rb,
                &mut self.islands,
                &mut self.colliders,
                &mut self.impulse_joints,
                &mut self.multibody_joints,
                true,
            )
            .is_some()
    }

    fn set_position(&mut self, body: BodyHandle, pos: Vec2) {
        if let Some(rb) = self
            .handles
            .get(&body)
            .and_then(|h| self.bodies.get_mut(*h))
        {
            rb.set_translation(vector![pos.x, pos.y], true);
        }
    }

    fn position(&self, body: BodyHandle) -> Option<Vec2> {
        self.body(body).map(|rb| {
            let t = rb.translation();
            Vec2::new(t.x, t.y)
        })
    }

    fn velocity(&self, body: BodyHandle) -> Option<Vec2> {
        self.body(body).map(|rb| {
            let v = rb.linvel();
            Vec2::new(v.x, v.y)
        })
    }

    fn step(&mut self, dt: f32) -> Vec<physics::ContactPair> {
        self.params.dt = dt;

        self.pipeline.step(
            &self.gravity,
            &self.params,
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
            &self.events,
        );

        self.collision_recv
            .try_iter()
            .filter_map(|event| {
                let CollisionEvent::Started(c1, c2, _) = event else {
                    return None;
                };
                let a = self.owners.get(&c1)?;
                let b = self.owners.get(&c2)?;
                Some(physics::ContactPair::new(*a, *b))
            })
            .collect()
    }
}

//! Simulation and container parameters for runtime tuning

use glam::Vec3;
use paper_physics::{ImpulseParams, Resolver, GRAVITY, PENETRATION_SLOP};

/// How `dt` enters position integration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TimeStep {
    /// `v += g·dt; p += v·dt`
    #[default]
    Scaled,
    /// `v += g; p += v`, one unit of time per step, `dt` ignored
    Fixed,
}

/// When collisions are resolved relative to integration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CollisionOrder {
    /// Each particle is integrated, contained, rebucketed and resolved
    /// against its neighbours before the next particle moves
    #[default]
    Sequential,
    /// Every particle moves first, then all collisions are resolved in one sweep
    Deferred,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationParams {
    // Integration
    pub gravity: Vec3,
    pub time_step: TimeStep,

    // Collisions
    pub resolver: Resolver,
    pub order: CollisionOrder,
    /// Penetration still counted as resolved
    pub slop: f32,

    // Walls
    pub contain: bool,
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            gravity: Vec3::new(0.0, -GRAVITY, 0.0),
            time_step: TimeStep::Scaled,
            resolver: Resolver::default(),
            order: CollisionOrder::Sequential,
            slop: PENETRATION_SLOP,
            contain: true,
        }
    }
}

impl SimulationParams {
    pub fn with_gravity(mut self, gravity: Vec3) -> Self {
        self.gravity = gravity;
        self
    }

    /// Pull of `g` along every axis toward negative infinity, as in `(−g, −g, −g)`
    pub fn with_uniform_gravity(mut self, g: f32) -> Self {
        self.gravity = Vec3::splat(-g);
        self
    }

    pub fn with_time_step(mut self, time_step: TimeStep) -> Self {
        self.time_step = time_step;
        self
    }

    pub fn with_resolver(mut self, resolver: Resolver) -> Self {
        self.resolver = resolver;
        self
    }

    /// Impulse resolver with the given restitution and rotation switch
    pub fn with_impulse(mut self, restitution: f32, rotation: bool) -> Self {
        let friction = match self.resolver {
            Resolver::Impulse(params) => params.friction,
            Resolver::Positional => 0.0,
        };
        self.resolver = Resolver::Impulse(ImpulseParams {
            restitution,
            friction,
            rotation,
        });
        self
    }

    pub fn with_order(mut self, order: CollisionOrder) -> Self {
        self.order = order;
        self
    }

    pub fn with_slop(mut self, slop: f32) -> Self {
        self.slop = slop;
        self
    }

    pub fn with_containment(mut self, contain: bool) -> Self {
        self.contain = contain;
        self
    }

    /// Whether angular state takes part in collisions and integration
    pub fn rotation(&self) -> bool {
        matches!(self.resolver, Resolver::Impulse(params) if params.rotation)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContainerParams {
    pub center: Vec3,
    pub size: Vec3,
    pub cell_size: f32,
}

impl Default for ContainerParams {
    fn default() -> Self {
        Self {
            center: Vec3::ZERO,
            size: Vec3::splat(100.0),
            cell_size: 10.0,
        }
    }
}

impl ContainerParams {
    pub fn with_center(mut self, center: Vec3) -> Self {
        self.center = center;
        self
    }

    pub fn with_size(mut self, size: Vec3) -> Self {
        self.size = size;
        self
    }

    pub fn with_cell_size(mut self, cell_size: f32) -> Self {
        self.cell_size = cell_size;
        self
    }
}

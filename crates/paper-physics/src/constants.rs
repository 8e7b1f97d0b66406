//! Physical constants for the particle simulation
//!
//! Values are in world units (one unit per meter) and seconds.

/// Standard gravitational acceleration (m/s²)
pub const GRAVITY: f32 = 9.81;

/// Default fraction of normal velocity kept after bouncing off a wall
pub const COLLISION_DAMPING: f32 = 0.8;

/// Default restitution for the impulse resolver (1.0 = perfectly elastic)
pub const RESTITUTION: f32 = 1.0;

/// Default Coulomb friction between touching spheres
pub const FRICTION: f32 = 0.2;

/// Default particle radius
pub const PARTICLE_RADIUS: f32 = 4.0;

/// Default particle mass
pub const PARTICLE_MASS: f32 = 1.0;

/// Distances below this are treated as coincident centers
pub const DEGENERATE_DISTANCE: f32 = 1.0e-6;

/// Default penetration left after a step that still counts as resolved
pub const PENETRATION_SLOP: f32 = 1.0e-4;

/// Moment of inertia factor of a solid sphere (I = k·m·r²)
pub const SOLID_SPHERE_INERTIA: f32 = 2.0 / 5.0;

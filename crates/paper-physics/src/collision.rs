//! Narrow-phase sphere tests and collision resolution
//!
//! Two resolution models are provided:
//! - [`Resolver::Positional`]: push both spheres apart by half the penetration each
//!   and reflect their approaching normal velocity, damped by each particle's own
//!   collision damping.
//! - [`Resolver::Impulse`]: rigid-body contact impulse from relative normal velocity,
//!   inverse masses and (optionally) inverse inertia through the contact lever arms,
//!   plus mass-weighted positional correction.

use glam::{Mat3, Vec3};

use crate::constants::{DEGENERATE_DISTANCE, FRICTION, RESTITUTION};
use crate::math;
use crate::particle::Particle;

/// Normal used when two centers coincide
pub const FALLBACK_NORMAL: Vec3 = Vec3::Y;

/// Geometry of an overlapping pair
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    /// Unit vector from B's center toward A's center
    pub normal: Vec3,
    /// `rA + rB - distance`, positive while overlapping
    pub penetration: f32,
    pub distance: f32,
}

/// Result of resolving one colliding pair
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Collision {
    pub contact: Contact,
    /// Normal impulse magnitude (zero for the positional model or separating pairs)
    pub impulse: f32,
    /// Overlap left after resolution, zero or negative once separated
    pub remaining: f32,
}

/// Sphere-sphere overlap test
pub fn are_colliding(a: &Particle, b: &Particle) -> bool {
    a.position.distance_squared(b.position) < (a.radius + b.radius).powi(2)
}

/// Contact geometry, `None` when the spheres do not overlap
pub fn contact(a: &Particle, b: &Particle) -> Option<Contact> {
    let delta = a.position - b.position;
    let distance = delta.length();
    let penetration = a.radius + b.radius - distance;
    if penetration <= 0.0 {
        return None;
    }

    Some(Contact {
        normal: math::normal_or(delta, FALLBACK_NORMAL),
        penetration,
        distance,
    })
}

/// Parameters of the impulse model
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImpulseParams {
    /// Coefficient of restitution; 1.0 gives the `λ = 2·(...)` elastic impulse
    pub restitution: f32,
    /// Coulomb friction coefficient for the tangential impulse
    pub friction: f32,
    /// Include inverse inertia and angular velocity in the impulse
    pub rotation: bool,
}

impl Default for ImpulseParams {
    fn default() -> Self {
        Self {
            restitution: RESTITUTION,
            friction: FRICTION,
            rotation: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Resolver {
    Positional,
    Impulse(ImpulseParams),
}

impl Default for Resolver {
    fn default() -> Self {
        Resolver::Impulse(ImpulseParams::default())
    }
}

impl Resolver {
    /// Resolve a pair in place. Returns `None` if they were not touching.
    pub fn resolve(&self, a: &mut Particle, b: &mut Particle) -> Option<Collision> {
        let contact = contact(a, b)?;

        let impulse = match self {
            Resolver::Positional => {
                resolve_positional(a, b, &contact);
                0.0
            }
            Resolver::Impulse(params) => resolve_impulse(a, b, &contact, params),
        };

        let remaining = a.radius + b.radius - a.position.distance(b.position);
        log::trace!(
            "penetration {:.5} -> {:.5}, impulse {:.5}",
            contact.penetration,
            remaining,
            impulse
        );

        Some(Collision {
            contact,
            impulse,
            remaining,
        })
    }
}

/// Reflect the component of `v` pointing against `normal`, scaled by `damping`
fn reflect_approaching(v: Vec3, normal: Vec3, damping: f32) -> Vec3 {
    let vn = v.dot(normal);
    if vn < 0.0 {
        v - normal * vn * (1.0 + damping)
    } else {
        v
    }
}

fn resolve_positional(a: &mut Particle, b: &mut Particle, contact: &Contact) {
    let n = contact.normal;
    let half = contact.penetration / 2.0;

    a.position += n * half;
    b.position -= n * half;

    a.velocity = reflect_approaching(a.velocity, n, a.collision_damping);
    b.velocity = reflect_approaching(b.velocity, -n, b.collision_damping);
}

/// Angular contribution of one body to the effective mass along `direction`
fn angular_term(inv_inertia: Mat3, lever: Vec3, direction: Vec3) -> f32 {
    (inv_inertia * lever.cross(direction)).cross(lever).dot(direction)
}

fn resolve_impulse(a: &mut Particle, b: &mut Particle, contact: &Contact, params: &ImpulseParams) -> f32 {
    let n = contact.normal;
    let inv_ma = a.inverse_mass();
    let inv_mb = b.inverse_mass();

    // Contact point halfway through the overlap, kept in each body's frame
    let contact_point = b.position + n * (b.radius - contact.penetration / 2.0);
    a.lever = a.to_local(contact_point);
    b.lever = b.to_local(contact_point);
    let ra = a.lever_arm();
    let rb = b.lever_arm();

    let (inv_ia, inv_ib) = if params.rotation {
        (a.inverse_inertia_world(), b.inverse_inertia_world())
    } else {
        (Mat3::ZERO, Mat3::ZERO)
    };

    let contact_velocity = |p: &Particle, r: Vec3| {
        if params.rotation {
            p.velocity + p.angular_velocity.cross(r)
        } else {
            p.velocity
        }
    };
    let relative = contact_velocity(&*a, ra) - contact_velocity(&*b, rb);
    let vn = relative.dot(n);

    let mut lambda = 0.0;
    if vn < 0.0 {
        let effective = inv_ma + inv_mb + angular_term(inv_ia, ra, n) + angular_term(inv_ib, rb, n);
        lambda = -(1.0 + params.restitution) * vn / effective;

        let j = n * lambda;
        a.velocity += j * inv_ma;
        b.velocity -= j * inv_mb;
        a.angular_velocity += inv_ia * ra.cross(j);
        b.angular_velocity -= inv_ib * rb.cross(j);

        if params.friction > 0.0 {
            apply_friction(
                a,
                b,
                n,
                (ra, rb),
                (inv_ia, inv_ib),
                lambda * params.friction,
                params.rotation,
            );
        }
    }

    // Split the overlap by inverse mass so the lighter body moves further
    let total = inv_ma + inv_mb;
    a.position += n * contact.penetration * (inv_ma / total);
    b.position -= n * contact.penetration * (inv_mb / total);

    lambda
}

/// Tangential impulse opposing sliding at the contact, capped at `max_impulse`
fn apply_friction(
    a: &mut Particle,
    b: &mut Particle,
    n: Vec3,
    (ra, rb): (Vec3, Vec3),
    (inv_ia, inv_ib): (Mat3, Mat3),
    max_impulse: f32,
    rotation: bool,
) {
    let relative = if rotation {
        (a.velocity + a.angular_velocity.cross(ra)) - (b.velocity + b.angular_velocity.cross(rb))
    } else {
        a.velocity - b.velocity
    };
    let tangential = relative - n * relative.dot(n);
    let speed = tangential.length();
    if speed < DEGENERATE_DISTANCE {
        return;
    }
    let t = tangential / speed;

    let effective = a.inverse_mass()
        + b.inverse_mass()
        + angular_term(inv_ia, ra, t)
        + angular_term(inv_ib, rb, t);
    let jt = (speed / effective).min(max_impulse);

    let j = -t * jt;
    a.velocity += j * a.inverse_mass();
    b.velocity -= j * b.inverse_mass();
    a.angular_velocity += inv_ia * ra.cross(j);
    b.angular_velocity -= inv_ib * rb.cross(j);
}

//! Particle state and the render hand-off format

use bytemuck::{Pod, Zeroable};
use glam::{Mat3, Mat4, Quat, Vec3};

use crate::constants::{COLLISION_DAMPING, PARTICLE_MASS, SOLID_SPHERE_INERTIA};
use crate::error::ParticleError;
use crate::math;

/// A dynamic sphere: point-mass kinematics plus optional rigid-body rotation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    pub position: Vec3,
    pub velocity: Vec3,
    pub radius: f32,
    pub mass: f32,
    /// Fraction of normal velocity kept after a bounce, in [0, 1]
    pub collision_damping: f32,

    pub angular_velocity: Vec3,
    /// Last contact point in the particle's local frame
    pub lever: Vec3,
    /// Accumulated torque, cleared after every rotation update
    pub torque: Vec3,
    pub orientation: Mat3,
    /// Body-frame inertia tensor (diagonal)
    pub inertia: Mat3,

    /// RGBA, only carried through to the renderer
    pub color: [f32; 4],
}

impl Particle {
    pub fn inverse_mass(&self) -> f32 {
        1.0 / self.mass
    }

    /// Inverse inertia tensor in world space
    pub fn inverse_inertia_world(&self) -> Mat3 {
        math::world_inverse_inertia(self.orientation, self.inertia)
    }

    pub fn momentum(&self) -> Vec3 {
        self.velocity * self.mass
    }

    pub fn kinetic_energy(&self) -> f32 {
        let linear = 0.5 * self.mass * self.velocity.length_squared();
        let body_omega = self.orientation.transpose() * self.angular_velocity;
        let angular = 0.5 * body_omega.dot(self.inertia * body_omega);
        linear + angular
    }

    /// Local-to-world transform
    pub fn model_matrix(&self) -> Mat4 {
        let mut m = Mat4::from_mat3(self.orientation);
        m.w_axis = self.position.extend(1.0);
        m
    }

    /// Express a world-space point in the particle's local frame
    pub fn to_local(&self, point: Vec3) -> Vec3 {
        math::gl_inverse(self.model_matrix()).transform_point3(point)
    }

    /// Express a local-frame point in world space
    pub fn to_world(&self, point: Vec3) -> Vec3 {
        self.model_matrix().transform_point3(point)
    }

    /// World-space offset from the center to the last contact point
    pub fn lever_arm(&self) -> Vec3 {
        self.to_world(self.lever) - self.position
    }

    pub fn apply_torque(&mut self, torque: Vec3) {
        self.torque += torque;
    }

    /// Advance angular velocity by the accumulated torque and orientation by the
    /// angular velocity, then clear the torque.
    pub fn integrate_rotation(&mut self, dt: f32) {
        self.angular_velocity += self.inverse_inertia_world() * self.torque * dt;
        self.torque = Vec3::ZERO;

        let angle = self.angular_velocity * dt;
        if angle != Vec3::ZERO {
            let rotation = Mat3::from_quat(Quat::from_scaled_axis(angle));
            self.orientation = math::orthonormalize(rotation * self.orientation);
        }
    }

    pub fn instance(&self) -> ParticleInstance {
        ParticleInstance {
            position: self.position.to_array(),
            radius: self.radius,
            color: self.color,
            orientation: Quat::from_mat3(&self.orientation).to_array(),
        }
    }
}

/// Validated construction parameters for a [`Particle`]
#[derive(Debug, Clone, Copy)]
pub struct ParticleDesc {
    pub position: Vec3,
    pub velocity: Vec3,
    pub radius: f32,
    pub mass: f32,
    pub collision_damping: f32,
    pub angular_velocity: Vec3,
    /// Diagonal of the body inertia tensor; `None` means a solid sphere
    pub inertia: Option<Vec3>,
    pub color: [f32; 4],
}

impl ParticleDesc {
    pub fn new(position: Vec3, radius: f32) -> Self {
        Self {
            position,
            velocity: Vec3::ZERO,
            radius,
            mass: PARTICLE_MASS,
            collision_damping: COLLISION_DAMPING,
            angular_velocity: Vec3::ZERO,
            inertia: None,
            color: [1.0; 4],
        }
    }

    pub fn with_velocity(mut self, velocity: Vec3) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn with_mass(mut self, mass: f32) -> Self {
        self.mass = mass;
        self
    }

    pub fn with_damping(mut self, damping: f32) -> Self {
        self.collision_damping = damping;
        self
    }

    pub fn with_angular_velocity(mut self, angular_velocity: Vec3) -> Self {
        self.angular_velocity = angular_velocity;
        self
    }

    pub fn with_inertia(mut self, diagonal: Vec3) -> Self {
        self.inertia = Some(diagonal);
        self
    }

    pub fn with_color(mut self, color: [f32; 4]) -> Self {
        self.color = color;
        self
    }

    pub fn build(self) -> Result<Particle, ParticleError> {
        if !(self.mass > 0.0) || !self.mass.is_finite() {
            return Err(ParticleError::InvalidMass(self.mass));
        }
        if !(self.radius > 0.0) || !self.radius.is_finite() {
            return Err(ParticleError::InvalidRadius(self.radius));
        }
        if !(0.0..=1.0).contains(&self.collision_damping) {
            return Err(ParticleError::InvalidDamping(self.collision_damping));
        }

        let diagonal = self
            .inertia
            .unwrap_or_else(|| Vec3::splat(SOLID_SPHERE_INERTIA * self.mass * self.radius * self.radius));
        if !(diagonal.min_element() > 0.0) || !diagonal.is_finite() {
            return Err(ParticleError::InvalidInertia(diagonal.to_array()));
        }

        Ok(Particle {
            position: self.position,
            velocity: self.velocity,
            radius: self.radius,
            mass: self.mass,
            collision_damping: self.collision_damping,
            angular_velocity: self.angular_velocity,
            lever: Vec3::ZERO,
            torque: Vec3::ZERO,
            orientation: Mat3::IDENTITY,
            inertia: Mat3::from_diagonal(diagonal),
            color: self.color,
        })
    }
}

/// Per-instance data for a sphere renderer.
/// Laid out for direct upload as a vertex/storage buffer.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct ParticleInstance {
    pub position: [f32; 3],
    pub radius: f32,
    pub color: [f32; 4],
    /// Quaternion (x, y, z, w)
    pub orientation: [f32; 4],
}

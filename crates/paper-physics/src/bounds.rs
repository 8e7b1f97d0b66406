//! Axis-aligned box used both as the grid extent and as the world walls

use glam::Vec3;

use crate::error::ParticleError;
use crate::particle::Particle;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub x_min: f32,
    pub x_max: f32,
    pub y_min: f32,
    pub y_max: f32,
    pub z_min: f32,
    pub z_max: f32,
}

/// Which faces a particle touched during containment
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WallContacts {
    pub x: bool,
    pub y: bool,
    pub z: bool,
}

impl WallContacts {
    pub fn any(&self) -> bool {
        self.x || self.y || self.z
    }
}

impl Bounds {
    /// Box of `size` centered on `center`
    pub fn from_center_size(center: Vec3, size: Vec3) -> Result<Self, ParticleError> {
        if !(size.x > 0.0 && size.y > 0.0 && size.z > 0.0) || !size.is_finite() {
            return Err(ParticleError::InvalidBounds(size.to_array()));
        }
        let half = size / 2.0;
        Ok(Self {
            x_min: center.x - half.x,
            x_max: center.x + half.x,
            y_min: center.y - half.y,
            y_max: center.y + half.y,
            z_min: center.z - half.z,
            z_max: center.z + half.z,
        })
    }

    pub fn min(&self) -> Vec3 {
        Vec3::new(self.x_min, self.y_min, self.z_min)
    }

    pub fn max(&self) -> Vec3 {
        Vec3::new(self.x_max, self.y_max, self.z_max)
    }

    pub fn size(&self) -> Vec3 {
        self.max() - self.min()
    }

    pub fn center(&self) -> Vec3 {
        (self.min() + self.max()) / 2.0
    }

    pub fn contains(&self, point: Vec3) -> bool {
        point.cmpge(self.min()).all() && point.cmple(self.max()).all()
    }

    /// Whether a sphere of `radius` fits inside on every axis
    pub fn fits(&self, radius: f32) -> bool {
        self.size().min_element() >= 2.0 * radius
    }

    /// Clamp a particle inside the walls.
    ///
    /// Any axis where the sphere crosses a face is snapped back onto the face and,
    /// if the particle is still moving outward, that velocity component is
    /// reflected and scaled by the particle's collision damping.
    pub fn contain(&self, particle: &mut Particle) -> WallContacts {
        let r = particle.radius;
        let d = particle.collision_damping;
        let mut contacts = WallContacts::default();

        contacts.x = contain_axis(
            &mut particle.position.x,
            &mut particle.velocity.x,
            self.x_min + r,
            self.x_max - r,
            d,
        );
        contacts.y = contain_axis(
            &mut particle.position.y,
            &mut particle.velocity.y,
            self.y_min + r,
            self.y_max - r,
            d,
        );
        contacts.z = contain_axis(
            &mut particle.position.z,
            &mut particle.velocity.z,
            self.z_min + r,
            self.z_max - r,
            d,
        );

        contacts
    }
}

fn contain_axis(position: &mut f32, velocity: &mut f32, low: f32, high: f32, damping: f32) -> bool {
    if *position < low {
        *position = low;
        if *velocity < 0.0 {
            *velocity *= -damping;
        }
        true
    } else if *position > high {
        *position = high;
        if *velocity > 0.0 {
            *velocity *= -damping;
        }
        true
    } else {
        false
    }
}

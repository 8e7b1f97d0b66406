//! Property tests for the collision resolvers
//!
//! - Linear momentum of an isolated pair is conserved by the impulse model
//! - Both models leave the pair non-penetrating
//! - Resolution never produces NaN, even for coincident centers

use glam::Vec3;
use paper_physics::{are_colliding, ImpulseParams, Particle, ParticleDesc, Resolver};
use proptest::prelude::*;

fn arb_vec3(range: f32) -> impl Strategy<Value = Vec3> {
    (-range..range, -range..range, -range..range).prop_map(|(x, y, z)| Vec3::new(x, y, z))
}

fn arb_particle() -> impl Strategy<Value = Particle> {
    (arb_vec3(1.0), arb_vec3(5.0), arb_vec3(2.0), 0.5f32..2.0, 0.1f32..10.0, 0.0f32..=1.0).prop_map(
        |(position, velocity, spin, radius, mass, damping)| {
            ParticleDesc::new(position, radius)
                .with_velocity(velocity)
                .with_angular_velocity(spin)
                .with_mass(mass)
                .with_damping(damping)
                .build()
                .unwrap()
        },
    )
}

fn arb_resolver() -> impl Strategy<Value = Resolver> {
    prop_oneof![
        Just(Resolver::Positional),
        (0.0f32..=1.0, 0.0f32..1.0, any::<bool>()).prop_map(|(restitution, friction, rotation)| {
            Resolver::Impulse(ImpulseParams {
                restitution,
                friction,
                rotation,
            })
        }),
    ]
}

proptest! {
    #[test]
    fn impulse_conserves_linear_momentum(
        mut a in arb_particle(),
        mut b in arb_particle(),
        restitution in 0.0f32..=1.0,
        friction in 0.0f32..1.0,
    ) {
        prop_assume!(are_colliding(&a, &b));
        let before = a.momentum() + b.momentum();
        let resolver = Resolver::Impulse(ImpulseParams { restitution, friction, rotation: true });

        resolver.resolve(&mut a, &mut b);

        let after = a.momentum() + b.momentum();
        let scale = 1.0 + before.length();
        prop_assert!((before - after).length() <= 1.0e-3 * scale,
            "momentum drifted from {:?} to {:?}", before, after);
    }

    #[test]
    fn resolution_separates_pair(
        mut a in arb_particle(),
        mut b in arb_particle(),
        resolver in arb_resolver(),
    ) {
        prop_assume!(are_colliding(&a, &b));

        let collision = resolver.resolve(&mut a, &mut b).unwrap();

        prop_assert!(collision.remaining <= 1.0e-3);
        prop_assert!(a.position.distance(b.position) >= a.radius + b.radius - 1.0e-3);
        prop_assert!(a.position.is_finite() && b.position.is_finite());
        prop_assert!(a.velocity.is_finite() && b.velocity.is_finite());
        prop_assert!(a.angular_velocity.is_finite() && b.angular_velocity.is_finite());
    }

    #[test]
    fn coincident_centers_stay_finite(
        mut a in arb_particle(),
        mut b in arb_particle(),
        resolver in arb_resolver(),
    ) {
        b.position = a.position;

        let collision = resolver.resolve(&mut a, &mut b).unwrap();

        prop_assert_eq!(collision.contact.normal, Vec3::Y);
        prop_assert!(a.position.is_finite() && b.position.is_finite());
        prop_assert!(a.velocity.is_finite() && b.velocity.is_finite());
    }
}

//! Headless particle and fluid demo
//!
//! Drops a cloud of spheres into a box, steps the world for a fixed number of
//! frames and reports what a renderer would receive. A short stable-fluids run
//! follows.

use glam::{UVec3, Vec3};
use paper_fluid::{FluidCube, FluidParams};
use paper_physics::{ParticleDesc, PARTICLE_RADIUS};
use paper_simulation::{ContainerParams, Simulation, SimulationParams, StepStats};
use rand::Rng;

const PARTICLE_COUNT: usize = 300;
const SPAWN_RADIUS: f32 = 35.0;
const MAX_SPEED: f32 = 20.0;
const FRAMES: usize = 600;
const FRAME_DT: f32 = 1.0 / 60.0;
const REPORT_EVERY: usize = 120;
const RESTITUTION: f32 = 0.9;

const FLUID_RESOLUTION: usize = 24;
const FLUID_FRAMES: usize = 40;

/// Catppuccin Mocha accents as RGBA
fn palette() -> Vec<[f32; 4]> {
    let colors = &catppuccin::PALETTE.mocha.colors;
    [
        &colors.rosewater,
        &colors.mauve,
        &colors.red,
        &colors.peach,
        &colors.yellow,
        &colors.green,
        &colors.teal,
        &colors.sky,
        &colors.blue,
        &colors.lavender,
    ]
    .iter()
    .map(|c| {
        [
            c.rgb.r as f32 / 255.0,
            c.rgb.g as f32 / 255.0,
            c.rgb.b as f32 / 255.0,
            1.0,
        ]
    })
    .collect()
}

/// Fill the box with particles at random positions inside a sphere
fn initialize_particles(sim: &mut Simulation) {
    let mut rng = rand::rng();
    let colors = palette();

    for _ in 0..PARTICLE_COUNT {
        let theta = rng.random::<f32>() * std::f32::consts::TAU;
        let cos_phi = rng.random::<f32>() * 2.0 - 1.0;
        let sin_phi = (1.0 - cos_phi * cos_phi).sqrt();
        let r = rng.random::<f32>().powf(1.0 / 3.0) * SPAWN_RADIUS;
        let position = Vec3::new(r * sin_phi * theta.cos(), r * sin_phi * theta.sin(), r * cos_phi);

        let velocity = Vec3::new(
            rng.random_range(-MAX_SPEED..MAX_SPEED),
            rng.random_range(-MAX_SPEED..MAX_SPEED),
            rng.random_range(-MAX_SPEED..MAX_SPEED),
        );
        let radius = PARTICLE_RADIUS * rng.random_range(0.25..0.5);

        let desc = ParticleDesc::new(position, radius)
            .with_velocity(velocity)
            .with_mass(radius * radius * radius)
            .with_color(colors[rng.random_range(0..colors.len())]);

        if let Err(err) = sim.spawn(desc) {
            log::warn!("skipped particle: {}", err);
        }
    }

    log::info!("✓ Initialized {} particles", sim.len());
}

fn run_particles() -> Result<(), paper_simulation::SimulationError> {
    let params = SimulationParams::default().with_impulse(RESTITUTION, true);
    let mut sim = Simulation::new(ContainerParams::default(), params)?;
    initialize_particles(&mut sim);

    let mut totals = StepStats::default();
    for frame in 1..=FRAMES {
        let stats = sim.step(FRAME_DT);
        totals.candidates += stats.candidates;
        totals.collisions += stats.collisions;
        totals.unresolved += stats.unresolved;
        totals.rebucketed += stats.rebucketed;

        if frame % REPORT_EVERY == 0 {
            let energy: f32 = sim.particles().map(|(_, p)| p.kinetic_energy()).sum();
            log::info!(
                "frame {:>4}: {} collisions, {} unresolved, {} rebucketed, {} occupied cells, kinetic energy {:.1}",
                frame,
                stats.collisions,
                stats.unresolved,
                stats.rebucketed,
                sim.grid().occupied_cells().count(),
                energy
            );
        }
    }

    sim.verify_grid()?;
    log::info!(
        "{} frames: {} candidates, {} collisions, {} unresolved, {} rebucketed",
        FRAMES,
        totals.candidates,
        totals.collisions,
        totals.unresolved,
        totals.rebucketed
    );
    let instances = sim.instances();
    let payload: &[u8] = bytemuck::cast_slice(&instances);
    log::info!(
        "render payload: {} instances, {} bytes",
        instances.len(),
        payload.len()
    );

    while let Some((id, _)) = sim.remove_oldest() {
        log::trace!("removed {:?}", id);
    }
    log::info!("all particles removed, grid empty: {}", sim.grid().is_empty());
    Ok(())
}

fn run_fluid() -> Result<(), paper_fluid::FluidError> {
    let params = FluidParams::default()
        .with_resolution(FLUID_RESOLUTION)
        .with_dt(0.1)
        .with_diffusion(1.0e-4);
    let mut fluid = FluidCube::new(params)?;

    let mid = (FLUID_RESOLUTION / 2) as u32;
    fluid.add_obstacle(Vec3::new(14.0, 8.0, 8.0), Vec3::new(16.0, 16.0, 16.0));

    for frame in 1..=FLUID_FRAMES {
        fluid.add_density(UVec3::new(3, mid, mid), 50.0)?;
        fluid.add_velocity(UVec3::new(3, mid, mid), Vec3::new(8.0, 0.5, 0.0))?;
        fluid.step();

        if frame % 10 == 0 {
            log::info!("fluid frame {:>3}: total density {:.2}", frame, fluid.total_density());
        }
    }

    log::info!(
        "density behind obstacle: {:.4}",
        fluid.density(UVec3::new(18, mid, mid))?
    );
    Ok(())
}

fn main() {
    // Initialize logger (RUST_LOG=debug for verbose output)
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Starting particle simulation...");
    if let Err(err) = run_particles() {
        log::error!("particle simulation failed: {}", err);
        std::process::exit(1);
    }

    log::info!("Starting fluid simulation...");
    if let Err(err) = run_fluid() {
        log::error!("fluid simulation failed: {}", err);
        std::process::exit(1);
    }
}

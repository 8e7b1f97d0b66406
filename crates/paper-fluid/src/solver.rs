//! Stable-fluids kernels over flat `N³` fields
//!
//! All kernels update the interior `1..N-1` on each axis and finish with
//! [`set_boundaries`] so the outer layer always mirrors its neighbours.

use crate::lattice::{Boundary, Lattice};

/// Weight of each neighbour when averaging a corner cell
const CORNER_WEIGHT: f32 = 0.33;

fn mirror(lattice: &Lattice, f: &mut [f32], edge: usize, inner: usize, negate: bool) {
    f[edge] = if lattice.is_solid_at(edge) {
        0.0
    } else if negate {
        -f[inner]
    } else {
        f[inner]
    };
}

/// Fill the outer layer of `f` from the interior.
///
/// Solid cells are zeroed wherever they are.
pub fn set_boundaries(lattice: &Lattice, b: Boundary, f: &mut [f32]) {
    let n = lattice.resolution();
    let last = n - 1;
    let ix = |x, y, z| lattice.ix(x, y, z);

    for a in 1..last {
        for c in 1..last {
            let flip = b == Boundary::VelocityZ;
            mirror(lattice, f, ix(c, a, 0), ix(c, a, 1), flip);
            mirror(lattice, f, ix(c, a, last), ix(c, a, last - 1), flip);

            let flip = b == Boundary::VelocityY;
            mirror(lattice, f, ix(c, 0, a), ix(c, 1, a), flip);
            mirror(lattice, f, ix(c, last, a), ix(c, last - 1, a), flip);

            let flip = b == Boundary::VelocityX;
            mirror(lattice, f, ix(0, c, a), ix(1, c, a), flip);
            mirror(lattice, f, ix(last, c, a), ix(last - 1, c, a), flip);
        }
    }

    let inward = |v: usize| if v == 0 { 1 } else { last - 1 };
    for z in [0, last] {
        for y in [0, last] {
            for x in [0, last] {
                f[ix(x, y, z)] = CORNER_WEIGHT
                    * (f[ix(inward(x), y, z)] + f[ix(x, inward(y), z)] + f[ix(x, y, inward(z))]);
            }
        }
    }

    for &index in lattice.solids() {
        f[index] = 0.0;
    }
}

/// Gauss-Seidel relaxation of `x = (x0 + a·Σneighbours(x)) / c`
pub fn lin_solve(
    lattice: &Lattice,
    b: Boundary,
    x: &mut [f32],
    x0: &[f32],
    a: f32,
    c: f32,
    iterations: usize,
) {
    let last = lattice.resolution() - 1;
    let c_recip = 1.0 / c;
    let ix = |x, y, z| lattice.ix(x, y, z);

    for _ in 0..iterations {
        for k in 1..last {
            for j in 1..last {
                for i in 1..last {
                    let neighbours = x[ix(i + 1, j, k)]
                        + x[ix(i - 1, j, k)]
                        + x[ix(i, j + 1, k)]
                        + x[ix(i, j - 1, k)]
                        + x[ix(i, j, k + 1)]
                        + x[ix(i, j, k - 1)];
                    x[ix(i, j, k)] = (x0[ix(i, j, k)] + a * neighbours) * c_recip;
                }
            }
        }
        set_boundaries(lattice, b, x);
    }
}

/// Implicit diffusion of `x0` into `x` at rate `diff`
pub fn diffuse(
    lattice: &Lattice,
    b: Boundary,
    x: &mut [f32],
    x0: &[f32],
    diff: f32,
    dt: f32,
    iterations: usize,
) {
    let inner = (lattice.resolution() - 2) as f32;
    let a = dt * diff * inner * inner;
    lin_solve(lattice, b, x, x0, a, 1.0 + 6.0 * a, iterations);
}

/// Semi-Lagrangian transport of `d0` into `d` along `velocity`.
///
/// Each interior cell traces back by `dt·(N−2)·v`, clamped to stay between cell
/// centres, and samples `d0` trilinearly.
pub fn advect(lattice: &Lattice, b: Boundary, d: &mut [f32], d0: &[f32], velocity: [&[f32]; 3], dt: f32) {
    let n = lattice.resolution();
    let last = n - 1;
    let dt0 = dt * (n - 2) as f32;
    let upper = n as f32 - 1.5;
    let ix = |x, y, z| lattice.ix(x, y, z);
    let [vx, vy, vz] = velocity;

    for k in 1..last {
        for j in 1..last {
            for i in 1..last {
                let here = ix(i, j, k);
                let x = (i as f32 - dt0 * vx[here]).clamp(0.5, upper);
                let y = (j as f32 - dt0 * vy[here]).clamp(0.5, upper);
                let z = (k as f32 - dt0 * vz[here]).clamp(0.5, upper);

                let (i0, j0, k0) = (x.floor() as usize, y.floor() as usize, z.floor() as usize);
                let (i1, j1, k1) = (i0 + 1, j0 + 1, k0 + 1);

                let s1 = x - i0 as f32;
                let s0 = 1.0 - s1;
                let t1 = y - j0 as f32;
                let t0 = 1.0 - t1;
                let u1 = z - k0 as f32;
                let u0 = 1.0 - u1;

                d[here] = s0
                    * (t0 * (u0 * d0[ix(i0, j0, k0)] + u1 * d0[ix(i0, j0, k1)])
                        + t1 * (u0 * d0[ix(i0, j1, k0)] + u1 * d0[ix(i0, j1, k1)]))
                    + s1 * (t0 * (u0 * d0[ix(i1, j0, k0)] + u1 * d0[ix(i1, j0, k1)])
                        + t1 * (u0 * d0[ix(i1, j1, k0)] + u1 * d0[ix(i1, j1, k1)]));
            }
        }
    }
    set_boundaries(lattice, b, d);
}

/// Make the velocity field divergence-free. `p` and `div` are scratch.
///
/// Solid cells carry no divergence, no pressure and no velocity.
pub fn project(
    lattice: &Lattice,
    vx: &mut [f32],
    vy: &mut [f32],
    vz: &mut [f32],
    p: &mut [f32],
    div: &mut [f32],
    iterations: usize,
) {
    let n = lattice.resolution();
    let last = n - 1;
    let h = n as f32;
    let ix = |x, y, z| lattice.ix(x, y, z);

    for k in 1..last {
        for j in 1..last {
            for i in 1..last {
                let here = ix(i, j, k);
                div[here] = if lattice.is_solid_at(here) {
                    0.0
                } else {
                    -0.5 * (vx[ix(i + 1, j, k)] - vx[ix(i - 1, j, k)] + vy[ix(i, j + 1, k)]
                        - vy[ix(i, j - 1, k)]
                        + vz[ix(i, j, k + 1)]
                        - vz[ix(i, j, k - 1)])
                        / h
                };
                p[here] = 0.0;
            }
        }
    }
    set_boundaries(lattice, Boundary::Scalar, div);
    set_boundaries(lattice, Boundary::Scalar, p);
    lin_solve(lattice, Boundary::Scalar, p, div, 1.0, 6.0, iterations);

    for k in 1..last {
        for j in 1..last {
            for i in 1..last {
                let here = ix(i, j, k);
                if lattice.is_solid_at(here) {
                    vx[here] = 0.0;
                    vy[here] = 0.0;
                    vz[here] = 0.0;
                    continue;
                }
                vx[here] -= 0.5 * (p[ix(i + 1, j, k)] - p[ix(i - 1, j, k)]) * h;
                vy[here] -= 0.5 * (p[ix(i, j + 1, k)] - p[ix(i, j - 1, k)]) * h;
                vz[here] -= 0.5 * (p[ix(i, j, k + 1)] - p[ix(i, j, k - 1)]) * h;
            }
        }
    }
    set_boundaries(lattice, Boundary::VelocityX, vx);
    set_boundaries(lattice, Boundary::VelocityY, vy);
    set_boundaries(lattice, Boundary::VelocityZ, vz);
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn field(lattice: &Lattice) -> Vec<f32> {
        vec![0.0; lattice.cell_count()]
    }

    fn divergence(lattice: &Lattice, vx: &[f32], vy: &[f32], vz: &[f32]) -> f32 {
        let last = lattice.resolution() - 1;
        let ix = |x, y, z| lattice.ix(x, y, z);
        let mut total = 0.0;
        for k in 1..last {
            for j in 1..last {
                for i in 1..last {
                    total += (vx[ix(i + 1, j, k)] - vx[ix(i - 1, j, k)] + vy[ix(i, j + 1, k)]
                        - vy[ix(i, j - 1, k)]
                        + vz[ix(i, j, k + 1)]
                        - vz[ix(i, j, k - 1)])
                        .abs();
                }
            }
        }
        total
    }

    #[test]
    fn test_set_boundaries_mirrors_faces() {
        let lattice = Lattice::new(5);
        let mut f = field(&lattice);
        f[lattice.ix(1, 2, 2)] = 3.0;
        f[lattice.ix(2, 1, 2)] = 5.0;

        let mut vx = f.clone();
        set_boundaries(&lattice, Boundary::VelocityX, &mut vx);
        assert_eq!(vx[lattice.ix(0, 2, 2)], -3.0);
        assert_eq!(vx[lattice.ix(2, 0, 2)], 5.0);

        let mut s = f.clone();
        set_boundaries(&lattice, Boundary::Scalar, &mut s);
        assert_eq!(s[lattice.ix(0, 2, 2)], 3.0);
        assert_eq!(s[lattice.ix(2, 0, 2)], 5.0);
    }

    #[test]
    fn test_corners_average_neighbours() {
        let lattice = Lattice::new(4);
        let mut f = field(&lattice);
        f[lattice.ix(1, 0, 0)] = 1.0;
        f[lattice.ix(0, 1, 0)] = 2.0;
        f[lattice.ix(0, 0, 1)] = 3.0;

        set_boundaries(&lattice, Boundary::Scalar, &mut f);

        assert!((f[lattice.ix(0, 0, 0)] - 0.33 * 6.0).abs() < 1.0e-6);
    }

    #[test]
    fn test_solid_cells_are_zeroed() {
        let mut lattice = Lattice::new(6);
        lattice.voxelize(Vec3::new(0.0, 2.0, 2.0), Vec3::new(3.0, 3.0, 3.0));
        let mut f = vec![1.0; lattice.cell_count()];

        set_boundaries(&lattice, Boundary::Scalar, &mut f);

        assert_eq!(f[lattice.ix(0, 2, 2)], 0.0);
        assert_eq!(f[lattice.ix(2, 2, 2)], 0.0);
        assert_eq!(f[lattice.ix(0, 3, 3)], 1.0);
    }

    #[test]
    fn test_diffuse_without_rate_copies_interior() {
        let lattice = Lattice::new(6);
        let mut x0 = field(&lattice);
        x0[lattice.ix(2, 3, 2)] = 7.0;
        let mut x = field(&lattice);

        diffuse(&lattice, Boundary::Scalar, &mut x, &x0, 0.0, 0.1, 4);

        assert_eq!(x[lattice.ix(2, 3, 2)], 7.0);
        assert_eq!(x[lattice.ix(3, 3, 2)], 0.0);
    }

    #[test]
    fn test_diffuse_spreads_to_neighbours() {
        let lattice = Lattice::new(8);
        let mut x0 = field(&lattice);
        x0[lattice.ix(4, 4, 4)] = 10.0;
        let mut x = field(&lattice);

        diffuse(&lattice, Boundary::Scalar, &mut x, &x0, 0.01, 0.1, 8);

        let center = x[lattice.ix(4, 4, 4)];
        assert!(center < 10.0 && center > 0.0);
        assert!(x[lattice.ix(5, 4, 4)] > 0.0);
        assert!(x[lattice.ix(4, 3, 4)] > 0.0);
    }

    #[test]
    fn test_advect_shifts_one_cell() {
        let lattice = Lattice::new(10);
        let mut d0 = field(&lattice);
        d0[lattice.ix(3, 4, 4)] = 1.0;
        let vx = vec![1.0; lattice.cell_count()];
        let still = field(&lattice);
        let mut d = field(&lattice);

        // dt·(N−2)·v is exactly one cell
        advect(&lattice, Boundary::Scalar, &mut d, &d0, [&vx, &still, &still], 0.125);

        assert!((d[lattice.ix(4, 4, 4)] - 1.0).abs() < 1.0e-6);
        assert!(d[lattice.ix(3, 4, 4)].abs() < 1.0e-6);
    }

    #[test]
    fn test_project_reduces_divergence() {
        let lattice = Lattice::new(10);
        let mut vx = field(&lattice);
        let mut vy = field(&lattice);
        let mut vz = field(&lattice);
        vx[lattice.ix(5, 5, 5)] = 1.0;
        vy[lattice.ix(4, 5, 5)] = -0.5;
        let before = divergence(&lattice, &vx, &vy, &vz);

        let (mut p, mut div) = (field(&lattice), field(&lattice));
        project(&lattice, &mut vx, &mut vy, &mut vz, &mut p, &mut div, 30);

        let after = divergence(&lattice, &vx, &vy, &vz);
        assert!(after < before, "divergence went from {before} to {after}");
    }

    #[test]
    fn test_project_keeps_solids_still() {
        let mut lattice = Lattice::new(8);
        lattice.voxelize(Vec3::splat(3.0), Vec3::splat(4.0));
        let mut vx = vec![1.0; lattice.cell_count()];
        let mut vy = field(&lattice);
        let mut vz = field(&lattice);

        let (mut p, mut div) = (field(&lattice), field(&lattice));
        project(&lattice, &mut vx, &mut vy, &mut vz, &mut p, &mut div, 4);

        assert_eq!(vx[lattice.ix(3, 3, 3)], 0.0);
        assert!(vx.iter().all(|v| v.is_finite()));
    }
}

//! Damped harmonic oscillator stepped at a fixed frame rate.
//!
//! The closed-form coefficients are computed once per spring, after which
//! each step is four multiplications. See Ryan Juckett, "Damped Springs".

/// Frames per second of the animation clock.
pub const FPS: u32 = 60;

/// Angular frequency shared by every transition.
pub const FREQUENCY: f64 = 7.0;

/// Converts a frame rate into the time step of one frame.
pub fn fps(n: u32) -> f64 {
    1.0 / f64::from(n.max(1))
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spring {
    pos_pos: f64,
    pos_vel: f64,
    vel_pos: f64,
    vel_vel: f64,
}

impl Spring {
    pub fn new(delta_time: f64, angular_frequency: f64, damping_ratio: f64) -> Self {
        let omega = angular_frequency.max(0.0);
        let zeta = damping_ratio.max(0.0);

        if omega < f64::EPSILON {
            return Self {
                pos_pos: 1.0,
                pos_vel: 0.0,
                vel_pos: 0.0,
                vel_vel: 1.0,
            };
        }

        if zeta > 1.0 + f64::EPSILON {
            // Over-damped
            let za = -omega * zeta;
            let zb = omega * (zeta * zeta - 1.0).sqrt();
            let z1 = za - zb;
            let z2 = za + zb;
            let e1 = (z1 * delta_time).exp();
            let e2 = (z2 * delta_time).exp();
            let inv_two_zb = 1.0 / (2.0 * zb);
            let e1_over = e1 * inv_two_zb;
            let e2_over = e2 * inv_two_zb;
            let z1e1_over = z1 * e1_over;
            let z2e2_over = z2 * e2_over;
            Self {
                pos_pos: e1_over * z2 - z2e2_over + e2,
                pos_vel: -e1_over + e2_over,
                vel_pos: (z1e1_over - z2e2_over + e2) * z2,
                vel_vel: -z1e1_over + z2e2_over,
            }
        } else if zeta < 1.0 - f64::EPSILON {
            // Under-damped
            let omega_zeta = omega * zeta;
            let alpha = omega * (1.0 - zeta * zeta).sqrt();
            let exp_term = (-omega_zeta * delta_time).exp();
            let cos_term = (alpha * delta_time).cos();
            let sin_term = (alpha * delta_time).sin();
            let inv_alpha = 1.0 / alpha;
            let exp_sin = exp_term * sin_term;
            let exp_cos = exp_term * cos_term;
            let exp_omega_zeta_sin_over_alpha = exp_term * omega_zeta * sin_term * inv_alpha;
            Self {
                pos_pos: exp_cos + exp_omega_zeta_sin_over_alpha,
                pos_vel: exp_sin * inv_alpha,
                vel_pos: -exp_sin * alpha - omega_zeta * exp_omega_zeta_sin_over_alpha,
                vel_vel: exp_cos - exp_omega_zeta_sin_over_alpha,
            }
        } else {
            // Critically damped
            let exp_term = (-omega * delta_time).exp();
            let time_exp = delta_time * exp_term;
            let time_exp_freq = time_exp * omega;
            Self {
                pos_pos: time_exp_freq + exp_term,
                pos_vel: time_exp,
                vel_pos: -omega * time_exp_freq,
                vel_vel: -time_exp_freq + exp_term,
            }
        }
    }

    /// Advance one step toward `target`, returning the new position and
    /// velocity.
    pub fn update(&self, position: f64, velocity: f64, target: f64) -> (f64, f64) {
        let offset = position - target;
        (
            offset * self.pos_pos + velocity * self.pos_vel + target,
            offset * self.vel_pos + velocity * self.vel_vel,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frames_to_reach(damping: f64, target: f64) -> usize {
        let spring = Spring::new(fps(FPS), FREQUENCY, damping);
        let (mut x, mut v) = (0.0, 0.0);
        for frame in 1..=1000 {
            (x, v) = spring.update(x, v, target);
            if (target >= 0.0 && x >= target) || (target < 0.0 && x <= target) {
                return frame;
            }
        }
        usize::MAX
    }

    #[test]
    fn test_underdamped_reaches_target() {
        let frames = frames_to_reach(0.8, 80.0);
        assert!((30..45).contains(&frames), "took {frames} frames");
    }

    #[test]
    fn test_lighter_damping_is_faster() {
        assert!(frames_to_reach(0.75, 80.0) < frames_to_reach(0.8, 80.0));
    }

    #[test]
    fn test_negative_target() {
        assert!(frames_to_reach(0.75, -80.0) < 60);
    }

    #[test]
    fn test_zero_frequency_holds_still() {
        let spring = Spring::new(fps(FPS), 0.0, 0.8);
        assert_eq!(spring.update(3.0, 0.0, 10.0), (3.0, 0.0));
    }

    #[test]
    fn test_critically_damped_never_overshoots() {
        let spring = Spring::new(fps(FPS), FREQUENCY, 1.0);
        let (mut x, mut v) = (0.0, 0.0);
        for _ in 0..600 {
            (x, v) = spring.update(x, v, 10.0);
            assert!(x <= 10.0 + 1e-9);
        }
        assert!((10.0 - x).abs() < 1e-3);
    }

    #[test]
    fn test_overdamped_converges() {
        let spring = Spring::new(fps(FPS), FREQUENCY, 2.0);
        let (mut x, mut v) = (0.0, 0.0);
        for _ in 0..2000 {
            (x, v) = spring.update(x, v, 10.0);
        }
        assert!((10.0 - x).abs() < 1e-3);
    }
}

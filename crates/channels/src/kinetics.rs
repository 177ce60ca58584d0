//! Voltage-dependent steady states and time constants for the continuous
//! gates. Rate constants follow the perisomatic channel set used for
//! neocortical pyramidal models; temperatures are corrected to 34 °C with
//! per-channel Q10 reference temperatures.

/// `x / (exp(x/y) - 1)` with a series fallback near the removable
/// singularity at `x = 0`.
pub fn vtrap(x: f64, y: f64) -> f64 {
    if (x / y).abs() < 1e-6 {
        y * (1.0 - (x / y) / 2.0)
    } else {
        x / ((x / y).exp() - 1.0)
    }
}

fn qt(ref_temp: f64) -> f64 {
    2.3_f64.powf((34.0 - ref_temp) / 10.0)
}

/// Transient Na⁺, somatic variant.
pub mod nats {
    use super::{qt, vtrap};

    fn alpha_m(v: f64) -> f64 {
        0.182 * vtrap(-(v + 40.0), 6.0)
    }
    fn beta_m(v: f64) -> f64 {
        0.124 * vtrap(v + 40.0, 6.0)
    }
    fn alpha_h(v: f64) -> f64 {
        0.015 * vtrap(v + 66.0, 6.0)
    }
    fn beta_h(v: f64) -> f64 {
        0.015 * vtrap(-(v + 66.0), 6.0)
    }

    pub fn m_inf(v: f64) -> f64 {
        alpha_m(v) / (alpha_m(v) + beta_m(v))
    }
    pub fn h_inf(v: f64) -> f64 {
        alpha_h(v) / (alpha_h(v) + beta_h(v))
    }
    pub fn m_tau(v: f64) -> f64 {
        1.0 / (alpha_m(v) + beta_m(v)) / qt(23.0)
    }
    pub fn h_tau(v: f64) -> f64 {
        1.0 / (alpha_h(v) + beta_h(v)) / qt(23.0)
    }
}

/// Transient Na⁺, axonal variant (shifted half-activation).
pub mod nata {
    use super::{qt, vtrap};

    fn alpha_m(v: f64) -> f64 {
        0.182 * vtrap(-(v + 48.0), 6.0)
    }
    fn beta_m(v: f64) -> f64 {
        0.124 * vtrap(v + 48.0, 6.0)
    }
    fn alpha_h(v: f64) -> f64 {
        0.015 * vtrap(v + 69.0, 6.0)
    }
    fn beta_h(v: f64) -> f64 {
        0.015 * vtrap(-(v + 69.0), 6.0)
    }

    pub fn m_inf(v: f64) -> f64 {
        alpha_m(v) / (alpha_m(v) + beta_m(v))
    }
    pub fn h_inf(v: f64) -> f64 {
        alpha_h(v) / (alpha_h(v) + beta_h(v))
    }
    pub fn m_tau(v: f64) -> f64 {
        1.0 / (alpha_m(v) + beta_m(v)) / qt(23.0)
    }
    pub fn h_tau(v: f64) -> f64 {
        1.0 / (alpha_h(v) + beta_h(v)) / qt(23.0)
    }
}

/// Persistent Na⁺. Activation is instantaneous (`m_inf` is used directly in
/// the conductance); only inactivation carries state.
pub mod nap {
    use super::{qt, vtrap};

    fn alpha_h(v: f64) -> f64 {
        2.88e-6 * vtrap(v + 17.0, 4.63)
    }
    fn beta_h(v: f64) -> f64 {
        6.94e-6 * vtrap(-(v + 64.4), 2.63)
    }

    pub fn m_inf(v: f64) -> f64 {
        1.0 / (1.0 + ((v + 52.6) / -4.6).exp())
    }
    pub fn h_inf(v: f64) -> f64 {
        1.0 / (1.0 + ((v + 48.8) / 10.0).exp())
    }
    pub fn h_tau(v: f64) -> f64 {
        1.0 / (alpha_h(v) + beta_h(v)) / qt(21.0)
    }
}

/// Delayed-rectifier K⁺ with two inactivation time scales.
pub mod kv2 {
    use super::{qt, vtrap};

    fn alpha_m(v: f64) -> f64 {
        0.12 * vtrap(-(v - 43.0), 11.0)
    }
    fn beta_m(v: f64) -> f64 {
        0.02 * (-(v + 1.27) / 120.0).exp()
    }

    pub fn m_inf(v: f64) -> f64 {
        alpha_m(v) / (alpha_m(v) + beta_m(v))
    }
    pub fn h_inf(v: f64) -> f64 {
        1.0 / (1.0 + ((v + 58.0) / 11.0).exp())
    }
    pub fn m_tau(v: f64) -> f64 {
        2.5 / (qt(21.0) * (alpha_m(v) + beta_m(v)))
    }
    pub fn h1_tau(v: f64) -> f64 {
        let u = (v + 75.0) / 48.0;
        (360.0 + (1010.0 + 23.7 * (v + 54.0)) * (-u * u).exp()) / qt(21.0)
    }
    pub fn h2_tau(v: f64) -> f64 {
        (2350.0 + 1380.0 * (-0.011 * v).exp() - 210.0 * (-0.03 * v).exp()) / qt(21.0)
    }
}

/// Fast-activating K⁺ (Kv3.1), non-inactivating.
pub mod kv3 {
    pub fn m_inf(v: f64) -> f64 {
        1.0 / (1.0 + ((v - 18.700) / -9.700).exp())
    }
    pub fn m_tau(v: f64) -> f64 {
        0.2 * 20.000 / (1.0 + ((v + 46.560) / -44.140).exp())
    }
}

/// Persistent K⁺.
pub mod kp {
    use super::qt;

    pub fn m_inf(v: f64) -> f64 {
        1.0 / (1.0 + (-(v + 14.3) / 14.6).exp())
    }
    pub fn h_inf(v: f64) -> f64 {
        1.0 / (1.0 + (-(v + 54.0) / -11.0).exp())
    }
    pub fn m_tau(v: f64) -> f64 {
        if v < -50.0 {
            (1.25 + 175.03 * (v * 0.026).exp()) / qt(21.0)
        } else {
            (1.25 + 13.0 * (-v * 0.026).exp()) / qt(21.0)
        }
    }
    pub fn h_tau(v: f64) -> f64 {
        let u = (v + 75.0) / 48.0;
        (360.0 + (1010.0 + 24.0 * (v + 55.0)) * (-u * u).exp()) / qt(21.0)
    }
}

/// Transient K⁺.
pub mod kt {
    use super::qt;

    pub fn m_inf(v: f64) -> f64 {
        1.0 / (1.0 + (-(v + 47.0) / 29.0).exp())
    }
    pub fn h_inf(v: f64) -> f64 {
        1.0 / (1.0 + (-(v + 66.0) / -10.0).exp())
    }
    pub fn m_tau(v: f64) -> f64 {
        let u = (v + 71.0) / 59.0;
        (0.34 + 0.92 * (-u * u).exp()) / qt(21.0)
    }
    pub fn h_tau(v: f64) -> f64 {
        let u = (v + 73.0) / 23.0;
        (8.0 + 49.0 * (-u * u).exp()) / qt(21.0)
    }
}

/// Slowly inactivating K⁺ with fixed time constants.
pub mod kd {
    pub fn m_inf(v: f64) -> f64 {
        1.0 - 1.0 / (1.0 + ((v + 43.0) / 8.0).exp())
    }
    pub fn h_inf(v: f64) -> f64 {
        1.0 / (1.0 + ((v + 67.0) / 7.3).exp())
    }
    pub fn m_tau(_v: f64) -> f64 {
        1.0
    }
    pub fn h_tau(_v: f64) -> f64 {
        1500.0
    }
}

/// Muscarinic K⁺.
pub mod im {
    use super::qt;

    fn alpha_m(v: f64) -> f64 {
        3.3e-3 * (2.5 * 0.04 * (v + 35.0)).exp()
    }
    fn beta_m(v: f64) -> f64 {
        3.3e-3 * (-2.5 * 0.04 * (v + 35.0)).exp()
    }

    pub fn m_inf(v: f64) -> f64 {
        alpha_m(v) / (alpha_m(v) + beta_m(v))
    }
    pub fn m_tau(v: f64) -> f64 {
        1.0 / (alpha_m(v) + beta_m(v)) / qt(21.0)
    }
}

/// Muscarinic K⁺, second kinetic scheme.
pub mod imv2 {
    use super::qt;

    fn alpha_m(v: f64) -> f64 {
        0.007 * ((6.0 * 0.4 * (v + 48.0)) / 26.12).exp()
    }
    fn beta_m(v: f64) -> f64 {
        0.007 * ((-6.0 * (1.0 - 0.4) * (v + 48.0)) / 26.12).exp()
    }

    pub fn m_inf(v: f64) -> f64 {
        alpha_m(v) / (alpha_m(v) + beta_m(v))
    }
    pub fn m_tau(v: f64) -> f64 {
        (15.0 + 1.0 / (alpha_m(v) + beta_m(v))) / qt(30.0)
    }
}

/// Hyperpolarization-activated cation current.
pub mod ih {
    use super::vtrap;

    fn alpha_m(v: f64) -> f64 {
        0.001 * 6.43 * vtrap(v + 154.9, 11.9)
    }
    fn beta_m(v: f64) -> f64 {
        0.001 * 193.0 * (v / 33.1).exp()
    }

    pub fn m_inf(v: f64) -> f64 {
        alpha_m(v) / (alpha_m(v) + beta_m(v))
    }
    pub fn m_tau(v: f64) -> f64 {
        1.0 / (alpha_m(v) + beta_m(v))
    }
}

/// Small-conductance Ca²⁺-activated K⁺. The activation variable depends on
/// the calcium concentration, not the voltage.
pub mod sk {
    pub fn z_inf(_v: f64, ca: f64) -> f64 {
        let ca = if ca < 1e-7 { ca + 1e-7 } else { ca };
        1.0 / (1.0 + (0.00043 / ca).powf(4.8))
    }
    pub fn z_tau(_v: f64) -> f64 {
        1.0
    }
}

/// High-voltage-activated Ca²⁺.
pub mod cahva {
    use super::vtrap;

    fn alpha_m(v: f64) -> f64 {
        0.055 * vtrap(-27.0 - v, 3.8)
    }
    fn beta_m(v: f64) -> f64 {
        0.94 * ((-75.0 - v) / 17.0).exp()
    }
    fn alpha_h(v: f64) -> f64 {
        0.000457 * ((-13.0 - v) / 50.0).exp()
    }
    fn beta_h(v: f64) -> f64 {
        0.0065 / (((-v - 15.0) / 28.0).exp() + 1.0)
    }

    pub fn m_inf(v: f64) -> f64 {
        alpha_m(v) / (alpha_m(v) + beta_m(v))
    }
    pub fn h_inf(v: f64) -> f64 {
        alpha_h(v) / (alpha_h(v) + beta_h(v))
    }
    pub fn m_tau(v: f64) -> f64 {
        1.0 / (alpha_m(v) + beta_m(v))
    }
    pub fn h_tau(v: f64) -> f64 {
        1.0 / (alpha_h(v) + beta_h(v))
    }
}

/// Low-voltage-activated Ca²⁺ (10 mV activation shift built in).
pub mod calva {
    use super::qt;

    pub fn m_inf(v: f64) -> f64 {
        let v = v + 10.0;
        1.0 / (1.0 + ((v + 30.0) / -6.0).exp())
    }
    pub fn h_inf(v: f64) -> f64 {
        let v = v + 10.0;
        1.0 / (1.0 + ((v + 80.0) / 6.4).exp())
    }
    pub fn m_tau(v: f64) -> f64 {
        let v = v + 10.0;
        (5.0 + 20.0 / (1.0 + ((v + 25.0) / 5.0).exp())) / qt(21.0)
    }
    pub fn h_tau(v: f64) -> f64 {
        let v = v + 10.0;
        (20.0 + 50.0 / (1.0 + ((v + 40.0) / 7.0).exp())) / qt(21.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vtrap_is_continuous_through_zero() {
        let eps = 1e-9;
        approx::assert_relative_eq!(vtrap(eps, 6.0), vtrap(-eps, 6.0), max_relative = 1e-6);
        approx::assert_relative_eq!(vtrap(0.0, 6.0), 6.0, max_relative = 1e-12);
    }

    #[test]
    fn steady_states_are_probabilities_and_taus_positive() {
        let mut v = -110.0;
        while v <= 60.0 {
            let infs = [
                nats::m_inf(v),
                nats::h_inf(v),
                nata::m_inf(v),
                nata::h_inf(v),
                nap::m_inf(v),
                nap::h_inf(v),
                kv2::m_inf(v),
                kv2::h_inf(v),
                kv3::m_inf(v),
                kp::m_inf(v),
                kp::h_inf(v),
                kt::m_inf(v),
                kt::h_inf(v),
                kd::m_inf(v),
                kd::h_inf(v),
                im::m_inf(v),
                imv2::m_inf(v),
                ih::m_inf(v),
                sk::z_inf(v, 1e-4),
                cahva::m_inf(v),
                cahva::h_inf(v),
                calva::m_inf(v),
                calva::h_inf(v),
            ];
            for (k, inf) in infs.iter().enumerate() {
                assert!((0.0..=1.0).contains(inf), "inf {k} out of range at v={v}: {inf}");
            }
            let taus = [
                nats::m_tau(v),
                nats::h_tau(v),
                nata::m_tau(v),
                nata::h_tau(v),
                nap::h_tau(v),
                kv2::m_tau(v),
                kv2::h1_tau(v),
                kv2::h2_tau(v),
                kv3::m_tau(v),
                kp::m_tau(v),
                kp::h_tau(v),
                kt::m_tau(v),
                kt::h_tau(v),
                kd::m_tau(v),
                kd::h_tau(v),
                im::m_tau(v),
                imv2::m_tau(v),
                ih::m_tau(v),
                sk::z_tau(v),
                cahva::m_tau(v),
                cahva::h_tau(v),
                calva::m_tau(v),
                calva::h_tau(v),
            ];
            for (k, tau) in taus.iter().enumerate() {
                assert!(*tau > 0.0, "tau {k} not positive at v={v}: {tau}");
            }
            v += 2.5;
        }
    }

    #[test]
    fn sk_activation_tracks_calcium() {
        // Half-activation at 0.43 µM.
        approx::assert_relative_eq!(sk::z_inf(-65.0, 0.00043), 0.5, max_relative = 1e-12);
        assert!(sk::z_inf(-65.0, 1e-2) > 0.99);
        assert!(sk::z_inf(-65.0, 1e-5) < 0.01);
    }
}

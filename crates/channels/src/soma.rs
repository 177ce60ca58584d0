//! Somatic active-conductance contribution to the linear system.
//!
//! Every channel contributes `g` to the diagonal and `g·E` to the right-hand
//! side of the soma row, where `g` is the maximal conductance times the open
//! probability from the current gate values.

use crate::{calcium, gate, gbar, kinetics, E_HCN, E_K, E_NA};

/// Accumulate `(Σg, Σg·E)` over the full perisomatic channel set at soma
/// voltage `v` and calcium `ca`.
pub fn conductance_terms(gbar_soma: &[f64], gates: &[f64], v: f64, ca: f64) -> (f64, f64) {
    let e_ca = calcium::reversal(ca);
    let mut lhs = 0.0;
    let mut rhs = 0.0;
    let mut add = |g: f64, e: f64| {
        lhs += g;
        rhs += g * e;
    };

    add(gbar_soma[gbar::NAV] * gates[gate::OO_NAV], E_NA);
    add(
        gbar_soma[gbar::NATS]
            * gates[gate::M_NATS]
            * gates[gate::M_NATS]
            * gates[gate::M_NATS]
            * gates[gate::H_NATS],
        E_NA,
    );
    add(
        gbar_soma[gbar::NATA]
            * gates[gate::M_NATA]
            * gates[gate::M_NATA]
            * gates[gate::M_NATA]
            * gates[gate::H_NATA],
        E_NA,
    );
    // Persistent Na+ activation is instantaneous.
    add(
        gbar_soma[gbar::NAP] * kinetics::nap::m_inf(v) * gates[gate::H_NAP],
        E_NA,
    );
    add(
        gbar_soma[gbar::KV2]
            * gates[gate::M_KV2]
            * gates[gate::M_KV2]
            * (0.5 * gates[gate::H1_KV2] + 0.5 * gates[gate::H2_KV2]),
        E_K,
    );
    add(gbar_soma[gbar::KV3] * gates[gate::M_KV3], E_K);
    add(
        gbar_soma[gbar::KP] * gates[gate::M_KP] * gates[gate::M_KP] * gates[gate::H_KP],
        E_K,
    );
    add(
        gbar_soma[gbar::KT]
            * gates[gate::M_KT]
            * gates[gate::M_KT]
            * gates[gate::M_KT]
            * gates[gate::M_KT]
            * gates[gate::H_KT],
        E_K,
    );
    add(gbar_soma[gbar::KD] * gates[gate::M_KD] * gates[gate::H_KD], E_K);
    add(gbar_soma[gbar::IM] * gates[gate::M_IM], E_K);
    add(gbar_soma[gbar::IMV2] * gates[gate::M_IMV2], E_K);
    add(gbar_soma[gbar::IH] * gates[gate::M_IH], E_HCN);
    add(gbar_soma[gbar::SK] * gates[gate::Z_SK], E_K);
    add(
        gbar_soma[gbar::CAHVA]
            * gates[gate::M_CAHVA]
            * gates[gate::M_CAHVA]
            * gates[gate::H_CAHVA],
        e_ca,
    );
    add(
        gbar_soma[gbar::CALVA]
            * gates[gate::M_CALVA]
            * gates[gate::M_CALVA]
            * gates[gate::H_CALVA],
        e_ca,
    );

    (lhs, rhs)
}

//! Delay programming: match the gathered spike list against the pre-table.

use synapses::{ConnectionTable, SynapseState};

/// Walk the globally sorted spiking IDs and the sorted presynaptic table in
/// lock-step; every match programs the delay registers of that neuron's
/// local fan-out.
pub fn program_delays(spiking: &[u32], conn: &ConnectionTable, syn: &mut SynapseState) {
    let mut ni = 0;
    let mut ti = 0;
    while ni < spiking.len() && ti < conn.pre_table.len() {
        match (spiking[ni] as usize).cmp(&conn.pre_table[ti]) {
            std::cmp::Ordering::Less => ni += 1,
            std::cmp::Ordering::Greater => ti += 1,
            std::cmp::Ordering::Equal => {
                syn.program_fan(conn, ti);
                ni += 1;
                ti += 1;
            }
        }
    }
}

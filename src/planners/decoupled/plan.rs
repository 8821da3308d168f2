use crate::state::{Action, JointAction, Plan};

/// Steps `from..to` of every agent's sequence as joint actions.
///
/// Agents whose sequence ends early are padded with `NoOp`; the result is as
/// long as the longest clipped sequence.
pub fn aligned_slice(sequences: &[Vec<Action>], from: usize, to: usize) -> Plan {
    let clipped: Vec<&[Action]> = sequences
        .iter()
        .map(|seq| seq.get(from..to.min(seq.len())).unwrap_or_default())
        .collect();
    let steps = clipped.iter().map(|s| s.len()).max().unwrap_or(0);

    (0..steps)
        .map(|step| {
            clipped
                .iter()
                .map(|seq| seq.get(step).copied().unwrap_or(Action::NoOp))
                .collect::<JointAction>()
        })
        .collect()
}

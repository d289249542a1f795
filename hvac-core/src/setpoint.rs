//! Setpoint adjustment from the button interrupt

use crate::state::SharedState;
use crate::types::{AdjustDirection, InputSnapshot};

/// Apply one setpoint button edge.
///
/// Called from the GPIO interrupt with the levels read inside the handler.
/// Only one line is honoured per firing, increase before decrease. The
/// update is a single lock-free read-modify-write and the setpoint is not
/// clamped.
pub fn handle_setpoint_edge(shared: &SharedState, snapshot: &InputSnapshot) -> Option<AdjustDirection> {
    let direction = AdjustDirection::from_snapshot(snapshot)?;
    let _setpoint = shared.adjust_setpoint(direction.delta());
    shared.raise_edge();

    #[cfg(feature = "defmt")]
    defmt::trace!("Setpoint {:?}: {}", direction, _setpoint);

    Some(direction)
}

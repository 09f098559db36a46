//! Collaborator trait the host virtualization framework implements to
//! receive this device's outgoing interrupt lines.
//!
//! The controller never owns real GPIO/IRQ wiring — it only calls into
//! whatever the host framework hands it at construction, exactly as this
//! workspace's other device models take a bus/line collaborator rather than
//! reaching for a global.

/// Supervisor-soft and user-soft output lines, one pair per hart.
///
/// These are level lines: the controller calls `set_*` whenever the
/// corresponding flag on a `GlobalQueue` changes, and the implementor is
/// responsible for translating that into whatever the host's interrupt
/// controller needs (claim/complete, edge synthesis, etc).
pub trait OutputLines {
    fn set_supervisor_soft(&mut self, hart_id: u32, level: bool);
    fn set_user_soft(&mut self, hart_id: u32, level: bool);
}

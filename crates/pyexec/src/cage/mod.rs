//! Platform resource caging: the `ResourceCage` abstraction applies a
//! `Limits`' CPU-time and address-space bounds to a not-yet-spawned child
//! process, using whatever mechanism the host OS offers for it.
//!
//! There is exactly one implementation selected at compile time per
//! platform (`#[cfg(unix)]` / `#[cfg(windows)]`), never a runtime dispatch —
//! the two mechanisms (POSIX rlimits, Win32 Job Objects) attach to a child
//! at different points in its lifecycle (before `exec`, vs. after spawn but
//! before resume) and don't share a useful common runtime-polymorphic shape.

#[cfg(unix)]
pub mod unix;
#[cfg(windows)]
pub mod windows;

#[cfg(unix)]
pub use unix::UnixResourceCage as PlatformResourceCage;
#[cfg(windows)]
pub use windows::WindowsResourceCage as PlatformResourceCage;

use crate::types::Limits;

/// A human-readable note describing any reduction in isolation strength,
/// surfaced to the caller as `ExecutionResult::platform_note` /
/// `platform_warning` (spec invariant I4). Empty when full isolation held.
pub type PlatformNote = String;

/// Apply `limits`'s CPU-time and address-space bounds to `child`, the
/// platform-specific way. Implementations never fail the whole evaluation
/// on a caging failure; they degrade to unbounded execution and report that
/// degradation via the returned [`PlatformNote`], per spec invariant I4.
pub trait ResourceCage {
    fn cage(limits: &Limits, child: &mut std::process::Command) -> PlatformNote;
}

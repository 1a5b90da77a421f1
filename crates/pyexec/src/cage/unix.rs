//! POSIX resource cage: `setrlimit(RLIMIT_CPU)` and `setrlimit(RLIMIT_AS)`
//! applied in the child's `pre_exec` hook, grounded on the native-engine
//! resource limiting in the reference sandboxing crate this pack includes.

use std::os::unix::process::CommandExt;
use std::process::Command;

use super::{PlatformNote, ResourceCage};
use crate::types::Limits;

pub struct UnixResourceCage;

impl ResourceCage for UnixResourceCage {
    fn cage(limits: &Limits, child: &mut Command) -> PlatformNote {
        let cpu_seconds = limits.cpu_seconds;
        let address_space_mb = limits.address_space_mb;

        // SAFETY: the closure runs in the forked child between `fork` and
        // `exec`, strictly single-threaded, and touches only libc functions
        // documented as async-signal-safe (setpgid, setrlimit). It must not
        // allocate or take locks shared with the parent; it doesn't.
        unsafe {
            child.pre_exec(move || {
                libc::setpgid(0, 0);

                if cpu_seconds > 0.0 {
                    let secs = cpu_seconds.trunc() as libc::rlim_t;
                    let limit = libc::rlimit {
                        rlim_cur: secs,
                        rlim_max: secs,
                    };
                    if libc::setrlimit(libc::RLIMIT_CPU, &limit) != 0 {
                        return Err(std::io::Error::last_os_error());
                    }
                }

                #[cfg(not(target_os = "macos"))]
                if address_space_mb > 0 {
                    let bytes = address_space_mb * 1024 * 1024;
                    let limit = libc::rlimit {
                        rlim_cur: bytes as libc::rlim_t,
                        rlim_max: bytes as libc::rlim_t,
                    };
                    if libc::setrlimit(libc::RLIMIT_AS, &limit) != 0 {
                        return Err(std::io::Error::last_os_error());
                    }
                }

                Ok(())
            });
        }

        // macOS's RLIMIT_AS does not reliably bound process memory; CPU
        // time is still enforced there, so isolation is reduced, not absent.
        #[cfg(target_os = "macos")]
        {
            String::from("address-space limit is not enforced on macOS; CPU-time limit still applies")
        }
        #[cfg(not(target_os = "macos"))]
        {
            String::new()
        }
    }
}

/// Send SIGKILL to the entire process group rooted at `pid`, matching the
/// `setpgid(0, 0)` call above so a child that forked its own children dies
/// along with it.
pub fn kill_group(pid: u32) {
    unsafe {
        libc::kill(-(pid as i32), libc::SIGKILL);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cage_with_zero_limits_skips_both_rlimits() {
        let limits = Limits {
            wall_timeout_seconds: 1.0,
            cpu_seconds: 0.0,
            address_space_mb: 0,
        };
        let mut cmd = Command::new("true");
        let note = UnixResourceCage::cage(&limits, &mut cmd);
        assert!(note.is_empty() || cfg!(target_os = "macos"));
    }
}

//! Windows resource cage: a Job Object with process-memory and CPU-time
//! limits, assigned to the child while it is held suspended so the limits
//! are in force before the first user instruction runs. Grounded on the
//! `win32job` usage in the original sandbox, translated to the `windows-sys`
//! crate since this workspace has no Python interop layer to lean on
//! `pywin32` the way the original implementation did.

use std::mem::size_of;
use std::os::windows::io::AsRawHandle;
use std::os::windows::process::CommandExt;
use std::process::{Child, Command};

use windows_sys::Win32::Foundation::{CloseHandle, INVALID_HANDLE_VALUE, HANDLE};
use windows_sys::Win32::System::Diagnostics::ToolHelp::{
    CreateToolhelp32Snapshot, Thread32First, Thread32Next, TH32CS_SNAPTHREAD, THREADENTRY32,
};
use windows_sys::Win32::System::JobObjects::{
    AssignProcessToJobObject, CreateJobObjectW, JobObjectExtendedLimitInformation,
    SetInformationJobObject, JOBOBJECT_EXTENDED_LIMIT_INFORMATION, JOB_OBJECT_LIMIT_ACTIVE_PROCESS,
    JOB_OBJECT_LIMIT_JOB_MEMORY, JOB_OBJECT_LIMIT_PROCESS_MEMORY, JOB_OBJECT_LIMIT_PROCESS_TIME,
};
use windows_sys::Win32::System::Threading::{
    OpenProcess, OpenThread, ResumeThread, TerminateProcess, CREATE_SUSPENDED, PROCESS_TERMINATE,
    THREAD_SUSPEND_RESUME,
};

use super::{PlatformNote, ResourceCage};
use crate::types::Limits;

pub struct WindowsResourceCage;

impl ResourceCage for WindowsResourceCage {
    /// Only arranges the suspended spawn; the Job Object itself is created
    /// and assigned in [`assign_and_resume`] once a real process handle
    /// exists, and that call produces the platform note.
    fn cage(_limits: &Limits, child: &mut Command) -> PlatformNote {
        child.creation_flags(CREATE_SUSPENDED);
        String::new()
    }
}

/// Create a Job Object carrying `limits`'s bounds, assign the just-spawned
/// (still-suspended) `child` to it, then resume its primary thread. Must run
/// as soon as possible after spawn — the child makes no progress until this
/// completes.
///
/// Returns a platform note describing any reduction in isolation strength;
/// on every failure path the child is still resumed, unconfined, rather
/// than left suspended forever.
pub fn assign_and_resume(limits: &Limits, child: &Child) -> PlatformNote {
    let handle = child.as_raw_handle() as HANDLE;
    let pid = child.id();

    unsafe {
        let job = CreateJobObjectW(std::ptr::null(), std::ptr::null());
        if job.is_null() {
            resume_primary_thread(pid);
            return String::from(
                "failed to create Windows Job Object; process ran without resource limits",
            );
        }

        let mut info: JOBOBJECT_EXTENDED_LIMIT_INFORMATION = std::mem::zeroed();
        info.BasicLimitInformation.LimitFlags = JOB_OBJECT_LIMIT_ACTIVE_PROCESS
            | JOB_OBJECT_LIMIT_PROCESS_MEMORY
            | JOB_OBJECT_LIMIT_JOB_MEMORY
            | JOB_OBJECT_LIMIT_PROCESS_TIME;
        info.BasicLimitInformation.ActiveProcessLimit = 1;

        if limits.address_space_mb > 0 {
            let bytes = (limits.address_space_mb as usize) * 1024 * 1024;
            info.ProcessMemoryLimit = bytes;
            info.JobMemoryLimit = bytes;
        }
        if limits.cpu_seconds > 0.0 {
            // 100-nanosecond intervals, Windows' native time unit.
            info.BasicLimitInformation.PerProcessUserTimeLimit = (limits.cpu_seconds * 1.0e7) as i64;
        }

        let configured = SetInformationJobObject(
            job,
            JobObjectExtendedLimitInformation,
            &info as *const _ as *const _,
            size_of::<JOBOBJECT_EXTENDED_LIMIT_INFORMATION>() as u32,
        );
        if configured == 0 {
            resume_primary_thread(pid);
            return String::from(
                "failed to configure Windows Job Object; process ran without resource limits",
            );
        }

        if AssignProcessToJobObject(job, handle) == 0 {
            resume_primary_thread(pid);
            return String::from(
                "failed to assign process to Windows Job Object; process ran without resource limits",
            );
        }

        resume_primary_thread(pid);
    }

    String::new()
}

/// `std::process::Child` exposes the process handle but not the primary
/// thread handle `CREATE_SUSPENDED` actually suspends, so the thread is
/// found the same way Process Explorer does: snapshot the system's threads
/// and pick the one owned by `pid` (a just-spawned, still-suspended process
/// has exactly one).
unsafe fn resume_primary_thread(pid: u32) {
    let snapshot = CreateToolhelp32Snapshot(TH32CS_SNAPTHREAD, 0);
    if snapshot == INVALID_HANDLE_VALUE {
        return;
    }

    let mut entry: THREADENTRY32 = std::mem::zeroed();
    entry.dwSize = size_of::<THREADENTRY32>() as u32;

    if Thread32First(snapshot, &mut entry) != 0 {
        loop {
            if entry.th32OwnerProcessID == pid {
                let thread_handle = OpenThread(THREAD_SUSPEND_RESUME, 0, entry.th32ThreadID);
                if !thread_handle.is_null() {
                    ResumeThread(thread_handle);
                    CloseHandle(thread_handle);
                }
                break;
            }
            if Thread32Next(snapshot, &mut entry) == 0 {
                break;
            }
        }
    }

    CloseHandle(snapshot);
}

/// Terminate the process identified by `pid`. Used by the launcher's wall-
/// clock deadline, independent of the Job Object's own CPU-time limit,
/// since the two bounds (wall-clock vs. CPU time) are not interchangeable.
pub fn kill_process(pid: u32) {
    unsafe {
        let handle = OpenProcess(PROCESS_TERMINATE, 0, pid);
        if !handle.is_null() {
            TerminateProcess(handle, 1);
            CloseHandle(handle);
        }
    }
}

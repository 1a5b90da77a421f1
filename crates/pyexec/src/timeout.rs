//! Wall-clock deadline enforcement for a spawned child process.
//!
//! This generalizes the same abandonment pattern the teacher's in-process
//! VM timeout used (spawn a worker, race it against `recv_timeout`, give up
//! on the worker rather than joining it) from *thread* abandonment to
//! *child-process* abandonment: on deadline expiry the child is killed
//! rather than merely ignored, since — unlike an abandoned thread — a
//! runaway child process left running would leak a live interpreter.

use std::io;
use std::process::{Child, Output};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

pub enum WaitOutcome {
    Completed(Output),
    TimedOut,
}

/// Wait for `child` to exit and collect its output, for at most `timeout`.
///
/// On timeout, `kill(pid)` is invoked and the child is handed off to a
/// background thread that finishes draining its pipes and reaping it once
/// the kill takes effect. That thread is never joined — the call returns
/// `TimedOut` immediately — but it holds no references the caller needs
/// back, so abandoning it leaks nothing the caller can observe.
///
/// # Why no SIGALRM / process::exit
/// Signal-based interruption only affects the calling process, not the
/// child; `process::exit` would tear down the whole launcher, not just the
/// one runaway evaluation. A background wait thread plus an explicit kill
/// is the only portable way to bound a child that never exits on its own.
pub fn wait_with_deadline<K>(mut child: Child, timeout: Duration, kill: K) -> io::Result<WaitOutcome>
where
    K: FnOnce(u32) + Send + 'static,
{
    let pid = child.id();
    let (tx, rx) = mpsc::channel::<io::Result<Output>>();

    thread::Builder::new()
        .name("pyexec-wait".to_string())
        .spawn(move || {
            let result = child.wait_with_output();
            let _ = tx.send(result);
        })
        .expect("failed to spawn sandbox wait thread");

    match rx.recv_timeout(timeout) {
        Ok(result) => Ok(WaitOutcome::Completed(result?)),
        Err(mpsc::RecvTimeoutError::Timeout) => {
            kill(pid);
            Ok(WaitOutcome::TimedOut)
        }
        Err(mpsc::RecvTimeoutError::Disconnected) => Err(io::Error::other(
            "sandbox wait thread vanished without a result",
        )),
    }
}

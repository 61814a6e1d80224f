//! Child process helpers shared by the engine drivers and command renderers.

use std::{
    io::{self, Read},
    process::{Child, ExitStatus},
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

const POLL_INTERVAL: Duration = Duration::from_millis(25);

pub(crate) type Drained = Option<JoinHandle<io::Result<Vec<u8>>>>;

/// Read a pipe to the end on a background thread.
pub(crate) fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Drained {
    pipe.map(|mut pipe| {
        thread::spawn(move || {
            let mut bytes = Vec::new();
            pipe.read_to_end(&mut bytes)?;
            Ok(bytes)
        })
    })
}

/// Join a drained pipe, decoding it lossily and trimming whitespace.
pub(crate) fn collect(handle: Drained) -> String {
    handle
        .and_then(|h| h.join().ok())
        .and_then(Result::ok)
        .map(|bytes| String::from_utf8_lossy(&bytes).trim().to_string())
        .unwrap_or_default()
}

/// Wait for `child`, killing it once `timeout` has elapsed.
///
/// Returns `Ok(None)` when the process was killed.
pub(crate) fn wait_with_deadline(
    child: &mut Child,
    timeout: Option<Duration>,
) -> io::Result<Option<ExitStatus>> {
    let Some(timeout) = timeout else {
        return child.wait().map(Some);
    };

    let deadline = Instant::now() + timeout;
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if Instant::now() >= deadline {
            // The process may exit between the check and the kill.
            let _ = child.kill();
            let _ = child.wait();
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL);
    }
}

#[cfg(all(test, unix))]
mod tests {
    use std::process::{Command, Stdio};

    use super::*;

    #[test]
    fn test_wait_returns_status() {
        let mut child = Command::new("sh")
            .args(["-c", "exit 4"])
            .spawn()
            .unwrap();

        let status = wait_with_deadline(&mut child, Some(Duration::from_secs(5)))
            .unwrap()
            .unwrap();

        assert_eq!(status.code(), Some(4));
    }

    #[test]
    fn test_deadline_kills_child() {
        let mut child = Command::new("sleep")
            .arg("5")
            .stdout(Stdio::null())
            .spawn()
            .unwrap();
        let started = Instant::now();

        let status = wait_with_deadline(&mut child, Some(Duration::from_millis(100))).unwrap();

        assert!(status.is_none());
        assert!(started.elapsed() < Duration::from_secs(4));
    }
}

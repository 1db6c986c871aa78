//! Shared fixtures: `sh` scripts stand in for the print server.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::{Duration, Instant};

use printmon_supervisor::LaunchSpec;
use tempfile::TempDir;

pub fn write_script(dir: &TempDir, body: &str) -> LaunchSpec {
    let script = dir.path().join("server.sh");
    fs::write(&script, body).expect("write script");
    LaunchSpec {
        program: "sh".to_string(),
        script,
        args: Vec::new(),
        env: BTreeMap::new(),
        stop_timeout: Duration::from_secs(5),
    }
}

/// Script that records each launch in `spawns.txt` next to itself, then idles.
pub const COUNTING_SERVER: &str = r#"echo "$$" >> "$(dirname "$0")/spawns.txt"
echo "server ready"
exec sleep 30
"#;

pub fn spawn_count(dir: &Path) -> usize {
    fs::read_to_string(dir.join("spawns.txt"))
        .map(|s| s.lines().filter(|l| !l.trim().is_empty()).count())
        .unwrap_or(0)
}

pub async fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    condition()
}

use tracing::warn;

/// Whether a step targeting `expected` must be skipped while connected to `current`.
///
/// Every network is treated alike, local development nodes included.
pub fn should_skip(current: &str, expected: &str) -> bool {
    if current == expected {
        return false;
    }

    warn!(current, expected, "skipping step, it only deploys to the expected network");
    true
}

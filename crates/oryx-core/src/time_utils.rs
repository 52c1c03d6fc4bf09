/// Returns the current Unix timestamp in milliseconds.
pub fn current_unix_timestamp_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis()
        .try_into()
        .unwrap_or(u64::MAX)
}

/// Returns true when `then_unix_ms` is still inside the rolling window ending
/// at `now_unix_ms`. A marker from the future counts as inside the window.
pub fn within_window_ms(then_unix_ms: u64, now_unix_ms: u64, window_ms: u64) -> bool {
    now_unix_ms.saturating_sub(then_unix_ms) <= window_ms
}

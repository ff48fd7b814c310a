/// Maps how long the last response took to the delay before the next poll, both in milliseconds.
///
/// Fast servers are polled at the 1000ms floor; slow ones are backed off by the square root of their latency.
///
/// ```
/// use notify_update_content::backoff::calculate_backoff;
///
/// assert_eq!(calculate_backoff(0.0), 1000);
/// assert_eq!(calculate_backoff(500.0), 4590);
/// ```
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn calculate_backoff(response_time_ms: f64) -> u32 {
	// `f64::max` ignores NaN, so negative input lands on the floor too.
	(250.0 * response_time_ms.sqrt() - 1000.0).max(1000.0) as u32
}

pub mod arxiv;
pub mod semantic_scholar;

use std::thread;
use std::time::Duration;

/// Delay before retry `attempt` (0-based): `delay * factor^attempt`.
pub(crate) fn backoff_secs(request_delay_secs: f64, backoff_factor: f64, attempt: u32) -> f64 {
    request_delay_secs * backoff_factor.powi(attempt as i32)
}

pub(crate) fn pause(secs: f64) {
    if secs > 0.0 {
        thread::sleep(Duration::from_secs_f64(secs));
    }
}

#[cfg(test)]
mod tests {
    use super::backoff_secs;

    #[test]
    fn backoff_grows_geometrically() {
        assert_eq!(backoff_secs(3.0, 2.0, 0), 3.0);
        assert_eq!(backoff_secs(3.0, 2.0, 1), 6.0);
        assert_eq!(backoff_secs(3.0, 2.0, 2), 12.0);
    }
}

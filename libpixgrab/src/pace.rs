use std::time::Duration;
use tokio::time::sleep;

/// Fixed-interval pacing between download attempts. The wait applies after
/// every attempt, success or failure alike.
#[derive(Debug, Clone)]
pub struct FixedDelay {
    interval: Duration,
}

impl FixedDelay {
    pub fn new(interval: Duration) -> Self {
        FixedDelay { interval }
    }

    pub async fn wait(&self) {
        sleep(self.interval).await;
    }
}

use std::time::Duration;

use async_trait::async_trait;

/// Suspends the current handler without blocking the UI thread
#[async_trait(?Send)]
pub trait Delay {
    async fn sleep(&self, duration: Duration);
}

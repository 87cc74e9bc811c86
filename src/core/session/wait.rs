//! Bounded readiness polls
//!
//! Every wait polls a condition at a fixed interval until it holds or the
//! timeout elapses. Nothing here busy-loops: the interval is validated > 0 at
//! configuration load.

use crate::adapters::automation::{Automation, Control, Selector};
use crate::domain::{AutomationError, HarvestError, Result};
use std::path::Path;
use std::time::Duration;
use tokio::time::{sleep, Instant};

/// Condition a control must meet before it is handed out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    /// Attached to the document
    Present,
    /// Present and rendered
    Visible,
    /// Rendered and enabled
    Clickable,
}

/// Polls the automation capability and the file system
pub struct Waiter<'a> {
    automation: &'a dyn Automation,
    poll: Duration,
}

impl<'a> Waiter<'a> {
    pub fn new(automation: &'a dyn Automation, poll: Duration) -> Self {
        Self { automation, poll }
    }

    /// Waits for a control matching `selector` to reach `readiness`
    ///
    /// # Errors
    ///
    /// `AutomationError::Timeout` when the bound elapses. Driver failures other
    /// than a missing or stale control end the wait early.
    pub async fn for_control(
        &self,
        selector: &Selector,
        readiness: Readiness,
        timeout: Duration,
    ) -> Result<Control> {
        let what = format!("{selector} to be {readiness:?}").to_lowercase();
        self.poll_until(&what, timeout, move || async move {
            let Some(control) = self.automation.find_control(selector).await? else {
                return Ok(None);
            };
            let ready = match readiness {
                Readiness::Present => true,
                Readiness::Visible => self.automation.is_displayed(&control).await?,
                Readiness::Clickable => {
                    self.automation.is_displayed(&control).await?
                        && self.automation.is_enabled(&control).await?
                }
            };
            Ok(ready.then_some(control))
        })
        .await
    }

    /// Waits for `control` to leave the document
    pub async fn until_stale(&self, control: &Control, timeout: Duration) -> Result<()> {
        let what = format!("{} to go stale", control.selector());
        self.poll_until(&what, timeout, move || async move {
            Ok(self.automation.is_stale(control).await?.then_some(()))
        })
        .await
    }

    /// Waits for a file to exist
    pub async fn for_file(&self, path: &Path, timeout: Duration) -> Result<()> {
        let what = format!("{} to appear", path.display());
        self.poll_until(&what, timeout, move || async move {
            let exists = tokio::fs::try_exists(path)
                .await
                .map_err(|e| HarvestError::io_at(path, e))?;
            Ok(exists.then_some(()))
        })
        .await
    }

    async fn poll_until<T, F, Fut>(&self, what: &str, timeout: Duration, mut check: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<Option<T>>>,
    {
        let deadline = Instant::now() + timeout;
        loop {
            match check().await {
                Ok(Some(value)) => return Ok(value),
                Ok(None) => {}
                Err(HarvestError::Automation(
                    AutomationError::StaleControl(_) | AutomationError::ControlNotFound(_),
                )) => {}
                Err(e) => return Err(e),
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(AutomationError::timeout(what, timeout).into());
            }
            sleep(self.poll.min(deadline - now)).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tempfile::TempDir;

    /// Control appears after `appear_after` lookups and goes stale after
    /// `stale_after` staleness checks
    struct Flaky {
        lookups: AtomicU32,
        appear_after: u32,
        stale_checks: AtomicU32,
        stale_after: u32,
    }

    impl Flaky {
        fn new(appear_after: u32, stale_after: u32) -> Self {
            Self {
                lookups: AtomicU32::new(0),
                appear_after,
                stale_checks: AtomicU32::new(0),
                stale_after,
            }
        }
    }

    #[async_trait]
    impl Automation for Flaky {
        async fn navigate(&self, _url: &str) -> Result<()> {
            Ok(())
        }
        async fn find_control(&self, selector: &Selector) -> Result<Option<Control>> {
            let n = self.lookups.fetch_add(1, Ordering::SeqCst) + 1;
            Ok((n > self.appear_after).then(|| Control::new("e-1", selector.clone())))
        }
        async fn is_displayed(&self, _control: &Control) -> Result<bool> {
            Ok(true)
        }
        async fn is_enabled(&self, _control: &Control) -> Result<bool> {
            Ok(true)
        }
        async fn click(&self, _control: &Control) -> Result<()> {
            Ok(())
        }
        async fn force_click(&self, _control: &Control) -> Result<()> {
            Ok(())
        }
        async fn scroll_into_view(&self, _control: &Control) -> Result<()> {
            Ok(())
        }
        async fn select_option(&self, _control: &Control, _label: &str) -> Result<()> {
            Ok(())
        }
        async fn is_stale(&self, _control: &Control) -> Result<bool> {
            let n = self.stale_checks.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(n > self.stale_after)
        }
        async fn shutdown(&self) -> Result<()> {
            Ok(())
        }
    }

    fn selector() -> Selector {
        Selector::Id("next".into())
    }

    #[tokio::test]
    async fn test_control_found_after_polls() {
        let driver = Flaky::new(2, 0);
        let waiter = Waiter::new(&driver, Duration::from_millis(1));
        let control = waiter
            .for_control(&selector(), Readiness::Clickable, Duration::from_millis(500))
            .await
            .unwrap();
        assert_eq!(control.element_id(), "e-1");
        assert_eq!(driver.lookups.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_control_times_out() {
        let driver = Flaky::new(u32::MAX, 0);
        let waiter = Waiter::new(&driver, Duration::from_millis(2));
        let err = waiter
            .for_control(&selector(), Readiness::Visible, Duration::from_millis(20))
            .await
            .unwrap_err();
        assert!(err.is_pagination_end());
        assert!(driver.lookups.load(Ordering::SeqCst) >= 2);
    }

    #[tokio::test]
    async fn test_until_stale() {
        let driver = Flaky::new(0, 3);
        let waiter = Waiter::new(&driver, Duration::from_millis(1));
        let control = Control::new("e-1", selector());
        waiter
            .until_stale(&control, Duration::from_millis(500))
            .await
            .unwrap();
        assert_eq!(driver.stale_checks.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_for_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("data.csv");
        let driver = Flaky::new(0, 0);
        let waiter = Waiter::new(&driver, Duration::from_millis(2));

        assert!(waiter
            .for_file(&path, Duration::from_millis(10))
            .await
            .is_err());

        std::fs::write(&path, "h\n").unwrap();
        waiter
            .for_file(&path, Duration::from_millis(10))
            .await
            .unwrap();
    }
}

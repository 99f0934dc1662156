use regex::Regex;
use std::future::Future;
use std::sync::OnceLock;
use std::time::Duration;
use tokio::task::JoinHandle;

static REFRESH_CONTENT: OnceLock<Option<Regex>> = OnceLock::new();

/// Reads the delay out of a refresh directive such as `5` or `0.5; url=/next`.
pub fn parse_refresh_delay(content: &str) -> Option<Duration> {
    let pattern = REFRESH_CONTENT
        .get_or_init(|| Regex::new(r"^\s*(\d+(?:\.\d+)?)\s*(?:[;,].*)?$").ok())
        .as_ref()?;
    let captures = pattern.captures(content)?;
    let seconds = captures.get(1)?.as_str().parse::<f64>().ok()?;
    Duration::try_from_secs_f64(seconds).ok()
}

#[derive(Debug)]
struct PendingRefresh {
    ticket: u64,
    delay: Duration,
    handle: JoinHandle<()>,
}

/// Holds the single deferred reload of a browser.
#[derive(Debug, Default)]
pub struct RefreshScheduler {
    pending: Option<PendingRefresh>,
    issued: u64,
}

impl RefreshScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces any pending timer with one that runs `task` after `delay`.
    ///
    /// `task` receives the ticket it must present to [`claim`](Self::claim)
    /// when it fires.
    pub fn arm<F, Fut>(&mut self, delay: Duration, task: F)
    where
        F: FnOnce(u64) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.cancel();
        self.issued += 1;
        let ticket = self.issued;
        let fired = task(ticket);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            fired.await;
        });
        ::log::debug!("Refresh {} armed for {:?}", ticket, delay);
        self.pending = Some(PendingRefresh {
            ticket,
            delay,
            handle,
        });
    }

    /// Stops the pending timer, if any.
    pub fn cancel(&mut self) {
        if let Some(pending) = self.pending.take() {
            ::log::debug!("Refresh {} cancelled", pending.ticket);
            pending.handle.abort();
        }
    }

    /// Takes ownership of the pending slot for a timer that has fired.
    ///
    /// Returns false when the timer was cancelled or replaced in the meantime.
    pub fn claim(&mut self, ticket: u64) -> bool {
        match &self.pending {
            Some(pending) if pending.ticket == ticket => {
                self.pending = None;
                true
            }
            _ => false,
        }
    }

    /// Delay of the pending timer.
    pub fn delay(&self) -> Option<Duration> {
        self.pending.as_ref().map(|p| p.delay)
    }

    pub fn is_armed(&self) -> bool {
        self.pending.is_some()
    }
}

impl Drop for RefreshScheduler {
    fn drop(&mut self) {
        self.cancel();
    }
}

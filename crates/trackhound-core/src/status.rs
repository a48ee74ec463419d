//! Status notifications emitted before each provider attempt

use tokio::sync::mpsc;

/// Receives a notification before each provider starts its network work.
pub trait StatusReporter: Send {
    fn attempting(&mut self, provider: &str, query: &str);
}

impl<F> StatusReporter for F
where
    F: FnMut(&str, &str) + Send,
{
    fn attempting(&mut self, provider: &str, query: &str) {
        self(provider, query)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusEvent {
    pub provider: String,
    pub query: String,
}

/// Forwards notifications to a channel, e.g. a progress display task.
#[derive(Debug, Clone)]
pub struct ChannelReporter {
    tx: mpsc::UnboundedSender<StatusEvent>,
}

impl ChannelReporter {
    pub fn new(tx: mpsc::UnboundedSender<StatusEvent>) -> Self {
        Self { tx }
    }
}

impl StatusReporter for ChannelReporter {
    fn attempting(&mut self, provider: &str, query: &str) {
        // receiver gone means nobody is watching
        let _ = self.tx.send(StatusEvent {
            provider: provider.to_string(),
            query: query.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_reporter_forwards_events() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut reporter = ChannelReporter::new(tx);
        reporter.attempting("yt-dlp", "Hey Jude");

        assert_eq!(
            rx.try_recv().unwrap(),
            StatusEvent {
                provider: "yt-dlp".to_string(),
                query: "Hey Jude".to_string(),
            }
        );
    }

    #[test]
    fn test_closure_reporter() {
        let mut seen = Vec::new();
        {
            let mut reporter = |provider: &str, query: &str| seen.push(format!("{provider}:{query}"));
            reporter.attempting("archive", "query");
        }
        assert_eq!(seen, vec!["archive:query"]);
    }
}

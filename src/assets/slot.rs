/// One independently loaded asset (photo, preview raster or SVG)
///
/// A slot remembers which URL it is showing. Pointing it at a new URL
/// aborts the fetch in flight, and answers for any URL other than the
/// current one are dropped, so a slow response can never overwrite the
/// asset of a newer target.

use iced::task;

#[derive(Debug, Clone)]
pub enum Asset<T> {
    /// No URL; nothing to show
    Empty,
    Loading,
    Ready(T),
    /// Fetch or decode failed; shown as a placeholder
    Unavailable(String),
}

pub struct AssetSlot<T> {
    url: Option<String>,
    asset: Asset<T>,
    in_flight: Option<task::Handle>,
}

impl<T> AssetSlot<T> {
    pub fn new() -> Self {
        Self {
            url: None,
            asset: Asset::Empty,
            in_flight: None,
        }
    }

    pub fn asset(&self) -> &Asset<T> {
        &self.asset
    }

    pub fn ready(&self) -> Option<&T> {
        match &self.asset {
            Asset::Ready(value) => Some(value),
            _ => None,
        }
    }

    /// Point the slot at `url`.
    ///
    /// Returns the URL to fetch when the target changed, `None` when it is
    /// the same as before or absent.
    pub fn target(&mut self, url: Option<String>) -> Option<String> {
        if self.url == url {
            return None;
        }
        self.abort();
        self.url = url.clone();

        match url {
            Some(url) => {
                self.asset = Asset::Loading;
                Some(url)
            }
            None => {
                self.asset = Asset::Empty;
                None
            }
        }
    }

    /// Remember the abort handle of the fetch for the current URL
    pub fn track(&mut self, handle: task::Handle) {
        self.in_flight = Some(handle);
    }

    /// Store the outcome of a fetch for `url`.
    ///
    /// Returns `false` (and changes nothing) when `url` is no longer the
    /// slot's target.
    pub fn resolve(&mut self, url: &str, result: Result<T, String>) -> bool {
        if self.url.as_deref() != Some(url) {
            tracing::debug!(url, "dropping stale asset response");
            return false;
        }
        self.in_flight = None;
        self.asset = match result {
            Ok(value) => Asset::Ready(value),
            Err(error) => {
                tracing::warn!(url, %error, "asset unavailable");
                Asset::Unavailable(error)
            }
        };
        true
    }

    /// Forget the target and abort anything in flight
    pub fn reset(&mut self) {
        self.abort();
        self.url = None;
        self.asset = Asset::Empty;
    }

    fn abort(&mut self) {
        if let Some(handle) = self.in_flight.take() {
            tracing::debug!(url = ?self.url, "aborting in-flight asset fetch");
            handle.abort();
        }
    }
}

impl<T> Default for AssetSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_target_change_requests_fetch() {
        let mut slot: AssetSlot<u32> = AssetSlot::new();
        assert_eq!(slot.target(Some("/a.png".into())), Some("/a.png".to_string()));
        assert_matches!(slot.asset(), Asset::Loading);

        assert_eq!(slot.target(Some("/a.png".into())), None);
    }

    #[test]
    fn test_stale_response_is_dropped() {
        let mut slot: AssetSlot<u32> = AssetSlot::new();
        slot.target(Some("/a.png".into()));
        slot.target(Some("/a.png?v=1".into()));

        assert!(!slot.resolve("/a.png", Ok(1)));
        assert_matches!(slot.asset(), Asset::Loading);

        assert!(slot.resolve("/a.png?v=1", Ok(2)));
        assert_eq!(slot.ready(), Some(&2));
    }

    #[test]
    fn test_failure_degrades_to_unavailable() {
        let mut slot: AssetSlot<u32> = AssetSlot::new();
        slot.target(Some("/broken.png".into()));
        slot.resolve("/broken.png", Err("not a PNG".into()));

        assert_matches!(slot.asset(), Asset::Unavailable(msg) if msg == "not a PNG");
        assert_eq!(slot.ready(), None);
    }

    #[test]
    fn test_empty_target() {
        let mut slot: AssetSlot<u32> = AssetSlot::new();
        slot.target(Some("/a.svg".into()));
        slot.resolve("/a.svg", Ok(1));

        assert_eq!(slot.target(None), None);
        assert_matches!(slot.asset(), Asset::Empty);

        slot.target(Some("/b.svg".into()));
        slot.reset();
        assert_eq!(slot.url, None);
        assert!(!slot.resolve("/b.svg", Ok(3)));
    }
}

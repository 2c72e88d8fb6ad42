//! Viewport bookkeeping for reverse infinite scroll
//!
//! Rendering layers feed raw scroll metrics in and get back pagination
//! decisions and scroll commands. Nothing here touches the timeline itself.

/// Raw viewport measurements in pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollMetrics {
    pub scroll_top: f64,
    pub scroll_height: f64,
    pub client_height: f64,
}

impl ScrollMetrics {
    pub fn new(scroll_top: f64, scroll_height: f64, client_height: f64) -> Self {
        Self {
            scroll_top,
            scroll_height,
            client_height,
        }
    }
}

/// Viewport movement requested by the controller
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScrollCommand {
    /// Set `scroll_top` to this offset
    ScrollTo(f64),
    /// Scroll to the newest message
    ScrollToBottom,
}

/// True when the viewport shows the very end of the content.
///
/// Exact comparison: fractional pixel layouts can miss it by a sub-pixel.
#[allow(clippy::float_cmp)]
pub fn is_at_bottom(metrics: &ScrollMetrics) -> bool {
    metrics.scroll_height - metrics.scroll_top == metrics.client_height
}

/// True when the viewport is pinned to the top and another page may be fetched
#[allow(clippy::float_cmp)]
pub fn should_load_older(scroll_top: f64, loading_older: bool, has_more: bool) -> bool {
    scroll_top == 0.0 && !loading_older && has_more
}

/// Tracks the last known viewport position
#[derive(Debug, Clone)]
pub struct ScrollController {
    at_bottom: bool,
    restore_offset: f64,
}

impl ScrollController {
    /// A fresh view starts pinned to the bottom
    pub fn new(restore_offset: f64) -> Self {
        Self {
            at_bottom: true,
            restore_offset,
        }
    }

    /// Record a scroll event; returns true if an older page should be requested
    pub fn on_scroll(&mut self, metrics: ScrollMetrics, loading_older: bool, has_more: bool) -> bool {
        self.at_bottom = is_at_bottom(&metrics);
        should_load_older(metrics.scroll_top, loading_older, has_more)
    }

    /// Where to put the viewport once a page has been prepended
    ///
    /// A small non-zero offset keeps the top edge from immediately
    /// requesting the next page.
    pub fn after_page_loaded(&mut self) -> ScrollCommand {
        self.at_bottom = false;
        ScrollCommand::ScrollTo(self.restore_offset)
    }

    /// Follow new content only if the user was already at the bottom
    pub fn on_timeline_mutated(&self) -> Option<ScrollCommand> {
        self.at_bottom.then_some(ScrollCommand::ScrollToBottom)
    }

    /// Whether to offer a "jump to latest" control
    pub fn show_jump_to_latest(&self) -> bool {
        !self.at_bottom
    }

    pub fn jump_to_latest(&mut self) -> ScrollCommand {
        self.at_bottom = true;
        ScrollCommand::ScrollToBottom
    }

    pub fn is_at_bottom(&self) -> bool {
        self.at_bottom
    }
}

impl Default for ScrollController {
    fn default() -> Self {
        Self::new(50.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_at_bottom_is_exact() {
        assert!(is_at_bottom(&ScrollMetrics::new(600.0, 1000.0, 400.0)));
        assert!(!is_at_bottom(&ScrollMetrics::new(599.0, 1000.0, 400.0)));
        assert!(!is_at_bottom(&ScrollMetrics::new(599.5, 1000.0, 400.0)));
    }

    #[test]
    fn test_load_older_only_at_top() {
        assert!(should_load_older(0.0, false, true));
        assert!(!should_load_older(1.0, false, true));
        assert!(!should_load_older(0.0, true, true));
        assert!(!should_load_older(0.0, false, false));
    }

    #[test]
    fn test_scrolling_up_stops_autoscroll() {
        let mut controller = ScrollController::default();
        assert_eq!(
            controller.on_timeline_mutated(),
            Some(ScrollCommand::ScrollToBottom)
        );

        let wants_page = controller.on_scroll(ScrollMetrics::new(200.0, 1000.0, 400.0), false, true);
        assert!(!wants_page);
        assert!(controller.show_jump_to_latest());
        assert_eq!(controller.on_timeline_mutated(), None);

        assert_eq!(controller.jump_to_latest(), ScrollCommand::ScrollToBottom);
        assert!(controller.is_at_bottom());
    }

    #[test]
    fn test_page_load_restores_offset() {
        let mut controller = ScrollController::new(50.0);
        assert!(controller.on_scroll(ScrollMetrics::new(0.0, 1000.0, 400.0), false, true));
        assert_eq!(controller.after_page_loaded(), ScrollCommand::ScrollTo(50.0));
        assert!(!should_load_older(50.0, false, true));
        assert_eq!(controller.on_timeline_mutated(), None);
    }
}

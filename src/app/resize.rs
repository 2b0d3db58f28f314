use eframe::egui::Vec2;

pub(in crate::app) const RESIZE_DEBOUNCE_SECS: f64 = 0.1;

/// Debounces canvas size changes; only the last size of a burst is applied.
#[derive(Debug, Default)]
pub(in crate::app) struct ResizeCoordinator {
    applied: Option<Vec2>,
    pending: Option<(Vec2, f64)>,
}

impl ResizeCoordinator {
    /// Records the size seen this frame. The very first observation is
    /// returned immediately; later changes wait for [`poll`](Self::poll).
    pub(in crate::app) fn observe(&mut self, size: Vec2, now: f64) -> Option<Vec2> {
        if size.x <= 0.0 || size.y <= 0.0 || !size.is_finite() {
            return None;
        }
        let Some(applied) = self.applied else {
            self.applied = Some(size);
            return Some(size);
        };

        match self.pending {
            Some((pending, _)) if pending == size => {}
            _ if applied == size => self.pending = None,
            _ => self.pending = Some((size, now)),
        }
        None
    }

    /// Returns the settled size once no change has been seen for the debounce window.
    pub(in crate::app) fn poll(&mut self, now: f64) -> Option<Vec2> {
        let (size, changed_at) = self.pending?;
        if now - changed_at < RESIZE_DEBOUNCE_SECS {
            return None;
        }
        self.pending = None;
        self.applied = Some(size);
        Some(size)
    }

    pub(in crate::app) fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    #[cfg(test)]
    pub(in crate::app) fn applied(&self) -> Option<Vec2> {
        self.applied
    }
}

#[cfg(test)]
mod tests {
    use eframe::egui::vec2;

    use super::*;

    #[test]
    fn first_size_applies_immediately() {
        let mut resize = ResizeCoordinator::default();

        assert_eq!(resize.observe(vec2(1200.0, 800.0), 0.0), Some(vec2(1200.0, 800.0)));
        assert_eq!(resize.observe(vec2(1200.0, 800.0), 0.1), None);
        assert!(!resize.has_pending());
    }

    #[test]
    fn bursts_collapse_to_the_last_size() {
        let mut resize = ResizeCoordinator::default();
        resize.observe(vec2(1200.0, 800.0), 0.0);

        let mut now = 1.0;
        for step in 0..10 {
            let size = vec2(1200.0 - step as f32 * 60.0, 800.0 - step as f32 * 40.0);
            resize.observe(size, now);
            assert_eq!(resize.poll(now), None);
            now += 0.02;
        }
        resize.observe(vec2(600.0, 400.0), now);

        assert_eq!(resize.poll(now + 0.05), None);
        assert_eq!(
            resize.poll(now + RESIZE_DEBOUNCE_SECS + 0.01),
            Some(vec2(600.0, 400.0))
        );
        assert_eq!(resize.applied(), Some(vec2(600.0, 400.0)));
        assert_eq!(resize.poll(now + 1.0), None);
    }

    #[test]
    fn returning_to_the_applied_size_cancels_the_pending_change() {
        let mut resize = ResizeCoordinator::default();
        resize.observe(vec2(800.0, 600.0), 0.0);

        resize.observe(vec2(700.0, 600.0), 1.0);
        resize.observe(vec2(800.0, 600.0), 1.05);

        assert_eq!(resize.poll(2.0), None);
    }

    #[test]
    fn degenerate_sizes_are_ignored() {
        let mut resize = ResizeCoordinator::default();

        assert_eq!(resize.observe(vec2(0.0, 600.0), 0.0), None);
        assert_eq!(resize.applied(), None);
    }
}

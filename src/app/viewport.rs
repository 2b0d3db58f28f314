use eframe::egui::Vec2;

use super::retry::{BoundedRetry, CancelToken, RetryPoll};

pub(in crate::app) const MIN_SCALE: f32 = 0.1;
pub(in crate::app) const MAX_SCALE: f32 = 4.0;
pub(in crate::app) const FOCUS_SCALE: f32 = 2.5;
pub(in crate::app) const FOCUS_DURATION_SECS: f64 = 0.75;
pub(in crate::app) const FOCUS_POLL_INTERVAL_SECS: f64 = 0.2;
pub(in crate::app) const FOCUS_POLL_ATTEMPTS: u32 = 10;

/// Maps simulation space onto the canvas: `canvas = translate + world * scale`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(in crate::app) struct ViewTransform {
    pub translate: Vec2,
    pub scale: f32,
}

impl ViewTransform {
    pub(in crate::app) const IDENTITY: Self = Self {
        translate: Vec2::ZERO,
        scale: 1.0,
    };

    pub(in crate::app) fn apply(self, world: Vec2) -> Vec2 {
        self.translate + world * self.scale
    }

    pub(in crate::app) fn invert(self, canvas: Vec2) -> Vec2 {
        (canvas - self.translate) / self.scale
    }

    fn clamped(self) -> Self {
        let scale = if self.scale.is_finite() {
            self.scale.clamp(MIN_SCALE, MAX_SCALE)
        } else {
            1.0
        };
        Self {
            translate: self.translate,
            scale,
        }
    }

    fn lerp(from: Self, to: Self, t: f32) -> Self {
        Self {
            translate: from.translate + (to.translate - from.translate) * t,
            scale: from.scale + (to.scale - from.scale) * t,
        }
    }
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[derive(Clone, Copy, Debug)]
struct Transition {
    from: ViewTransform,
    to: ViewTransform,
    started_at: f64,
}

#[derive(Debug)]
struct PendingFocus {
    node_id: String,
    scale: f32,
    retry: BoundedRetry,
}

/// Owns the pan/zoom transform, its animated transitions and the
/// best-effort focus polling against a layout that is still converging.
#[derive(Debug)]
pub(in crate::app) struct ViewportController {
    transform: ViewTransform,
    size: Vec2,
    transition: Option<Transition>,
    pending: Option<PendingFocus>,
}

impl ViewportController {
    pub(in crate::app) fn new(size: Vec2) -> Self {
        Self {
            transform: ViewTransform::IDENTITY,
            size,
            transition: None,
            pending: None,
        }
    }

    pub(in crate::app) fn transform(&self) -> ViewTransform {
        self.transform
    }

    #[cfg(test)]
    pub(in crate::app) fn size(&self) -> Vec2 {
        self.size
    }

    pub(in crate::app) fn set_size(&mut self, size: Vec2) {
        self.size = size;
    }

    pub(in crate::app) fn is_animating(&self) -> bool {
        self.transition.is_some()
    }

    pub(in crate::app) fn has_pending_focus(&self) -> bool {
        self.pending
            .as_ref()
            .is_some_and(|pending| !pending.retry.is_cancelled())
    }

    /// Starts polling for the node's position; the previous focus request, if any, is cancelled.
    /// The returned token cancels this request only.
    pub(in crate::app) fn focus_on(&mut self, node_id: &str, scale: f32, now: f64) -> CancelToken {
        self.cancel_focus();
        let retry = BoundedRetry::new(FOCUS_POLL_ATTEMPTS, FOCUS_POLL_INTERVAL_SECS, now);
        let token = retry.token();
        self.pending = Some(PendingFocus {
            node_id: node_id.to_owned(),
            scale,
            retry,
        });
        token
    }

    fn cancel_focus(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.retry.cancel();
        }
    }

    /// Runs a due focus attempt. Returns the world position the view started animating towards.
    pub(in crate::app) fn poll_focus(
        &mut self,
        now: f64,
        locate: impl FnOnce(&str) -> Option<Vec2>,
    ) -> Option<Vec2> {
        let pending = self.pending.as_mut()?;

        match pending.retry.poll(now, || locate(&pending.node_id)) {
            RetryPoll::Waiting => {}
            RetryPoll::Ready(position) => {
                let scale = pending.scale;
                self.pending = None;
                let target = self.focus_transform(position, scale);
                self.animate_to(target, now);
                return Some(position);
            }
            RetryPoll::Exhausted => {
                tracing::debug!(
                    node = %pending.node_id,
                    attempts = pending.retry.attempts(),
                    "focus target never acquired a position"
                );
                self.pending = None;
            }
            RetryPoll::Cancelled => self.pending = None,
        }
        None
    }

    /// Transform that centers `world` in the viewport at `scale`.
    pub(in crate::app) fn focus_transform(&self, world: Vec2, scale: f32) -> ViewTransform {
        let scale = scale.clamp(MIN_SCALE, MAX_SCALE);
        ViewTransform {
            translate: self.size * 0.5 - world * scale,
            scale,
        }
    }

    pub(in crate::app) fn reset(&mut self, now: f64) {
        self.cancel_focus();
        self.animate_to(ViewTransform::IDENTITY, now);
    }

    /// Direct user pan/zoom; interrupts any focus animation or pending focus.
    pub(in crate::app) fn apply_user_pan_zoom(&mut self, transform: ViewTransform) {
        self.cancel_focus();
        self.transition = None;
        self.transform = transform.clamped();
    }

    pub(in crate::app) fn pan_by(&mut self, delta: Vec2) {
        let mut next = self.transform;
        next.translate += delta;
        self.apply_user_pan_zoom(next);
    }

    /// Zooms by `factor` while keeping the canvas point `anchor` fixed.
    pub(in crate::app) fn zoom_at(&mut self, factor: f32, anchor: Vec2) {
        let world = self.transform.invert(anchor);
        let scale = (self.transform.scale * factor).clamp(MIN_SCALE, MAX_SCALE);
        self.apply_user_pan_zoom(ViewTransform {
            translate: anchor - world * scale,
            scale,
        });
    }

    /// Advances the running transition. Returns whether one is still in flight.
    pub(in crate::app) fn update(&mut self, now: f64) -> bool {
        let Some(transition) = self.transition else {
            return false;
        };

        let progress = ((now - transition.started_at) / FOCUS_DURATION_SECS).clamp(0.0, 1.0);
        self.transform = ViewTransform::lerp(
            transition.from,
            transition.to,
            ease_cubic_in_out(progress as f32),
        );
        if progress >= 1.0 {
            self.transform = transition.to;
            self.transition = None;
        }
        self.transition.is_some()
    }

    fn animate_to(&mut self, target: ViewTransform, now: f64) {
        self.transition = Some(Transition {
            from: self.transform,
            to: target.clamped(),
            started_at: now,
        });
    }
}

fn ease_cubic_in_out(t: f32) -> f32 {
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
    }
}

#[cfg(test)]
mod tests {
    use eframe::egui::vec2;

    use super::*;

    fn run_until(viewport: &mut ViewportController, from: f64, to: f64, locate: Option<Vec2>) {
        let mut now = from;
        while now <= to {
            let _ = viewport.poll_focus(now, |_| locate);
            viewport.update(now);
            now += 0.05;
        }
    }

    #[test]
    fn focus_centers_the_node_at_the_requested_scale() {
        let mut viewport = ViewportController::new(vec2(800.0, 600.0));
        let node = vec2(100.0, 50.0);

        viewport.focus_on("n", FOCUS_SCALE, 0.0);
        run_until(&mut viewport, 0.0, 1.0, Some(node));

        let transform = viewport.transform();
        assert_eq!(transform.scale, FOCUS_SCALE);
        let on_canvas = transform.apply(node);
        assert!((on_canvas - vec2(400.0, 300.0)).length() < 1e-3);
        assert!(!viewport.is_animating());
        assert!(!viewport.has_pending_focus());
    }

    #[test]
    fn focus_animates_over_the_transition_duration() {
        let mut viewport = ViewportController::new(vec2(800.0, 600.0));
        viewport.focus_on("n", 2.0, 0.0);
        assert_eq!(viewport.poll_focus(0.0, |_| Some(vec2(0.0, 0.0))), Some(Vec2::ZERO));

        assert!(viewport.update(0.3));
        let midway = viewport.transform().scale;
        assert!(midway > 1.0 && midway < 2.0, "scale {midway}");
        assert!(!viewport.update(FOCUS_DURATION_SECS));
        assert_eq!(viewport.transform().scale, 2.0);
    }

    #[test]
    fn unknown_node_leaves_the_transform_unchanged() {
        let mut viewport = ViewportController::new(vec2(800.0, 600.0));
        let before = viewport.transform();

        viewport.focus_on("nonexistent-id", FOCUS_SCALE, 0.0);
        run_until(&mut viewport, 0.0, 5.0, None);

        assert_eq!(viewport.transform(), before);
        assert!(!viewport.has_pending_focus());
        assert!(!viewport.is_animating());
    }

    #[test]
    fn late_positions_are_picked_up_by_polling() {
        let mut viewport = ViewportController::new(vec2(800.0, 600.0));
        viewport.focus_on("n", FOCUS_SCALE, 0.0);

        run_until(&mut viewport, 0.0, 0.5, None);
        assert!(viewport.has_pending_focus());
        run_until(&mut viewport, 0.55, 2.0, Some(vec2(10.0, 10.0)));

        assert!(!viewport.has_pending_focus());
        assert_eq!(viewport.transform().scale, FOCUS_SCALE);
    }

    #[test]
    fn scale_is_always_clamped() {
        let mut viewport = ViewportController::new(vec2(800.0, 600.0));

        for _ in 0..100 {
            viewport.zoom_at(3.0, vec2(400.0, 300.0));
            assert!(viewport.transform().scale <= MAX_SCALE);
        }
        for _ in 0..100 {
            viewport.zoom_at(0.2, vec2(10.0, 10.0));
            assert!(viewport.transform().scale >= MIN_SCALE);
        }

        viewport.apply_user_pan_zoom(ViewTransform {
            translate: Vec2::ZERO,
            scale: 1_000.0,
        });
        assert_eq!(viewport.transform().scale, MAX_SCALE);
        viewport.apply_user_pan_zoom(ViewTransform {
            translate: Vec2::ZERO,
            scale: f32::NAN,
        });
        assert_eq!(viewport.transform().scale, 1.0);
    }

    #[test]
    fn zoom_keeps_the_anchor_fixed() {
        let mut viewport = ViewportController::new(vec2(800.0, 600.0));
        let anchor = vec2(200.0, 150.0);
        let world_before = viewport.transform().invert(anchor);

        viewport.zoom_at(1.5, anchor);

        let world_after = viewport.transform().invert(anchor);
        assert!((world_before - world_after).length() < 1e-3);
    }

    #[test]
    fn user_pan_interrupts_focus() {
        let mut viewport = ViewportController::new(vec2(800.0, 600.0));
        viewport.focus_on("n", FOCUS_SCALE, 0.0);
        let _ = viewport.poll_focus(0.0, |_| Some(vec2(300.0, 300.0)));
        viewport.update(0.2);
        assert!(viewport.is_animating());

        viewport.pan_by(vec2(5.0, 0.0));
        let after_pan = viewport.transform();
        viewport.update(2.0);

        assert!(!viewport.is_animating());
        assert_eq!(viewport.transform(), after_pan);
    }

    #[test]
    fn returned_token_cancels_the_request() {
        let mut viewport = ViewportController::new(vec2(800.0, 600.0));
        let token = viewport.focus_on("n", FOCUS_SCALE, 0.0);

        token.cancel();

        assert!(!viewport.has_pending_focus());
        assert_eq!(viewport.poll_focus(0.0, |_| Some(vec2(10.0, 10.0))), None);
        assert!(!viewport.update(0.1));
        assert_eq!(viewport.transform(), ViewTransform::IDENTITY);
    }

    #[test]
    fn refocusing_cancels_the_previous_token() {
        let mut viewport = ViewportController::new(vec2(800.0, 600.0));
        let first = viewport.focus_on("a", FOCUS_SCALE, 0.0);

        let second = viewport.focus_on("b", FOCUS_SCALE, 0.0);

        assert!(first.is_cancelled());
        assert!(!second.is_cancelled());
        assert!(viewport.has_pending_focus());
    }

    #[test]
    fn reset_animates_back_to_identity() {
        let mut viewport = ViewportController::new(vec2(800.0, 600.0));
        viewport.zoom_at(2.0, vec2(0.0, 0.0));
        viewport.pan_by(vec2(40.0, -20.0));

        viewport.reset(1.0);
        viewport.update(1.0 + FOCUS_DURATION_SECS);

        assert_eq!(viewport.transform(), ViewTransform::IDENTITY);
    }
}

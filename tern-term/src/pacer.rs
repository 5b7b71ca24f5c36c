//! Frame pacing
//!
//! At most one frame is in flight. A redraw requested while the compositor
//! still holds the previous frame waits for its completion callback, and
//! nothing is drawn while the surface is not visible on any output.

#[derive(Debug, Clone)]
pub struct FramePacer {
    needs_redraw: bool,
    visible: bool,
    pending: bool,
}

impl Default for FramePacer {
    fn default() -> Self {
        Self {
            needs_redraw: true,
            visible: true,
            pending: false,
        }
    }
}

impl FramePacer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&mut self) {
        self.needs_redraw = true;
    }

    pub fn needs_redraw(&self) -> bool {
        self.needs_redraw
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Surface entered or left every output
    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    pub fn should_draw(&self) -> bool {
        self.needs_redraw && self.visible && !self.pending
    }

    /// Claim the next frame if one may be drawn now
    pub fn begin_frame(&mut self) -> bool {
        if !self.should_draw() {
            return false;
        }
        self.needs_redraw = false;
        self.pending = true;
        true
    }

    /// The compositor is done with the last frame; true if the caller
    /// should draw again right away
    pub fn frame_done(&mut self) -> bool {
        self.pending = false;
        self.should_draw()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_request_during_pending_waits_for_callback() {
        let mut pacer = FramePacer::new();
        assert!(pacer.begin_frame());
        pacer.request();
        assert!(!pacer.begin_frame());
        assert!(pacer.frame_done());
        assert!(pacer.begin_frame());
        assert!(!pacer.frame_done());
    }

    #[test]
    fn test_hidden_surface_is_not_drawn() {
        let mut pacer = FramePacer::new();
        pacer.set_visible(false);
        assert!(!pacer.begin_frame());
        assert!(pacer.needs_redraw());
        pacer.set_visible(true);
        assert!(pacer.begin_frame());
    }

    #[derive(Debug, Clone)]
    enum Op {
        Request,
        Tick,
        Callback,
        Visible(bool),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            Just(Op::Request),
            Just(Op::Tick),
            Just(Op::Callback),
            any::<bool>().prop_map(Op::Visible),
        ]
    }

    proptest! {
        #[test]
        fn prop_one_frame_per_callback(ops in proptest::collection::vec(op(), 0..200)) {
            let mut pacer = FramePacer::new();
            let mut in_flight = 0u32;
            for op in ops {
                match op {
                    Op::Request => pacer.request(),
                    Op::Visible(v) => pacer.set_visible(v),
                    Op::Tick => {
                        if pacer.begin_frame() {
                            in_flight += 1;
                        }
                    }
                    Op::Callback => {
                        if pacer.is_pending() {
                            in_flight -= 1;
                        }
                        if pacer.frame_done() && pacer.begin_frame() {
                            in_flight += 1;
                        }
                    }
                }
                prop_assert!(in_flight <= 1);
                prop_assert_eq!(in_flight == 1, pacer.is_pending());
            }
        }
    }
}

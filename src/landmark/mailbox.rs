use super::LandmarkFrame;

/// 最新フレームだけを保持する単一スロットのメールボックス
///
/// 配信側は `post` で上書きし、描画側は `sequence` の変化で新着を判定する。
/// キューは持たない (古いフレームは捨てられる)。
#[derive(Debug, Default)]
pub struct FrameMailbox {
    slot: Option<LandmarkFrame>,
    sequence: u64,
}

impl FrameMailbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn post(&mut self, frame: LandmarkFrame) {
        self.slot = Some(frame);
        self.sequence += 1;
    }

    pub fn latest(&self) -> Option<&LandmarkFrame> {
        self.slot.as_ref()
    }

    /// これまでに投函された回数
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// `seen` 以降に新着があればそのフレームを返す
    pub fn newer_than(&self, seen: u64) -> Option<&LandmarkFrame> {
        if self.sequence > seen {
            self.slot.as_ref()
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmark::{Landmark, PoseLandmarks};

    fn frame_with_nose(x: f32) -> LandmarkFrame {
        LandmarkFrame {
            pose: Some(PoseLandmarks(vec![Landmark::with_visibility(x, 0.5, 0.0, 1.0)])),
            ..Default::default()
        }
    }

    #[test]
    fn test_empty_mailbox() {
        let mb = FrameMailbox::new();
        assert!(mb.latest().is_none());
        assert_eq!(mb.sequence(), 0);
        assert!(mb.newer_than(0).is_none());
    }

    #[test]
    fn test_latest_frame_wins() {
        let mut mb = FrameMailbox::new();
        mb.post(frame_with_nose(0.1));
        mb.post(frame_with_nose(0.2));
        let latest = mb.latest().unwrap();
        assert_eq!(latest.pose.as_ref().unwrap().0[0].x, 0.2);
        assert_eq!(mb.sequence(), 2);
    }

    #[test]
    fn test_newer_than() {
        let mut mb = FrameMailbox::new();
        mb.post(frame_with_nose(0.1));
        let seen = mb.sequence();
        assert!(mb.newer_than(seen).is_none());
        mb.post(frame_with_nose(0.3));
        assert!(mb.newer_than(seen).is_some());
    }
}

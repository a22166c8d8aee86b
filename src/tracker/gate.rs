use crate::config::GateConfig;
use crate::landmark::{PoseIndex, PoseLandmarks};
use crate::rig::BoneName;

/// 信頼度ゲートの段階。末端ほど推定が不安定なので閾値を下げる
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateClass {
    /// 肩・股関節
    Proximal,
    /// 肘・膝
    Middle,
    /// 手首・足首
    Distal,
}

impl GateClass {
    pub fn threshold(&self, config: &GateConfig) -> f32 {
        match self {
            Self::Proximal => config.proximal,
            Self::Middle => config.middle,
            Self::Distal => config.distal,
        }
    }

    pub fn of(index: PoseIndex) -> Self {
        use PoseIndex::*;
        match index {
            LeftShoulder | RightShoulder | LeftHip | RightHip => Self::Proximal,
            LeftElbow | RightElbow | LeftKnee | RightKnee => Self::Middle,
            _ => Self::Distal,
        }
    }
}

/// 手足のボーンと、その区間を挟むランドマーク
#[derive(Debug, Clone, Copy)]
pub struct LimbGate {
    pub bone: BoneName,
    pub landmarks: &'static [PoseIndex],
}

pub const LIMB_GATES: [LimbGate; 10] = [
    LimbGate {
        bone: BoneName::LeftShoulder,
        landmarks: &[PoseIndex::LeftShoulder],
    },
    LimbGate {
        bone: BoneName::LeftUpperArm,
        landmarks: &[PoseIndex::LeftShoulder, PoseIndex::LeftElbow],
    },
    LimbGate {
        bone: BoneName::LeftLowerArm,
        landmarks: &[PoseIndex::LeftElbow, PoseIndex::LeftWrist],
    },
    LimbGate {
        bone: BoneName::RightShoulder,
        landmarks: &[PoseIndex::RightShoulder],
    },
    LimbGate {
        bone: BoneName::RightUpperArm,
        landmarks: &[PoseIndex::RightShoulder, PoseIndex::RightElbow],
    },
    LimbGate {
        bone: BoneName::RightLowerArm,
        landmarks: &[PoseIndex::RightElbow, PoseIndex::RightWrist],
    },
    LimbGate {
        bone: BoneName::LeftUpperLeg,
        landmarks: &[PoseIndex::LeftHip, PoseIndex::LeftKnee],
    },
    LimbGate {
        bone: BoneName::LeftLowerLeg,
        landmarks: &[PoseIndex::LeftKnee, PoseIndex::LeftAnkle],
    },
    LimbGate {
        bone: BoneName::RightUpperLeg,
        landmarks: &[PoseIndex::RightHip, PoseIndex::RightKnee],
    },
    LimbGate {
        bone: BoneName::RightLowerLeg,
        landmarks: &[PoseIndex::RightKnee, PoseIndex::RightAnkle],
    },
];

impl LimbGate {
    /// 全ランドマークが段階ごとの閾値を超えていれば通す
    pub fn passes(&self, pose: &PoseLandmarks, config: &GateConfig) -> bool {
        self.landmarks
            .iter()
            .all(|&idx| pose.visibility(idx) > GateClass::of(idx).threshold(config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmark::Landmark;

    fn pose_with(vis: &[(PoseIndex, f32)]) -> PoseLandmarks {
        let mut pts = vec![Landmark::with_visibility(0.5, 0.5, 0.0, 0.0); PoseIndex::COUNT];
        for (idx, v) in vis {
            pts[*idx as usize].visibility = Some(*v);
        }
        PoseLandmarks(pts)
    }

    fn gate(bone: BoneName) -> LimbGate {
        *LIMB_GATES.iter().find(|g| g.bone == bone).unwrap()
    }

    #[test]
    fn test_thresholds_by_class() {
        let config = GateConfig::default();
        assert_eq!(GateClass::of(PoseIndex::LeftShoulder).threshold(&config), 0.5);
        assert_eq!(GateClass::of(PoseIndex::RightKnee).threshold(&config), 0.4);
        assert_eq!(GateClass::of(PoseIndex::LeftAnkle).threshold(&config), 0.3);
    }

    #[test]
    fn test_upper_arm_gate() {
        let config = GateConfig::default();
        let g = gate(BoneName::LeftUpperArm);
        let ok = pose_with(&[(PoseIndex::LeftShoulder, 0.6), (PoseIndex::LeftElbow, 0.45)]);
        assert!(g.passes(&ok, &config));
        let weak_elbow = pose_with(&[(PoseIndex::LeftShoulder, 0.9), (PoseIndex::LeftElbow, 0.35)]);
        assert!(!g.passes(&weak_elbow, &config));
    }

    #[test]
    fn test_threshold_is_strict() {
        let config = GateConfig::default();
        let g = gate(BoneName::RightShoulder);
        assert!(!g.passes(&pose_with(&[(PoseIndex::RightShoulder, 0.5)]), &config));
        assert!(g.passes(&pose_with(&[(PoseIndex::RightShoulder, 0.51)]), &config));
    }

    #[test]
    fn test_lower_leg_gate_uses_distal_threshold() {
        let config = GateConfig::default();
        let g = gate(BoneName::RightLowerLeg);
        let pose = pose_with(&[(PoseIndex::RightKnee, 0.41), (PoseIndex::RightAnkle, 0.31)]);
        assert!(g.passes(&pose, &config));
    }

    #[test]
    fn test_missing_landmarks_fail() {
        let config = GateConfig::default();
        let short = PoseLandmarks(vec![Landmark::with_visibility(0.5, 0.5, 0.0, 1.0); 12]);
        assert!(gate(BoneName::LeftShoulder).passes(&short, &config));
        assert!(!gate(BoneName::LeftUpperArm).passes(&short, &config));
    }
}

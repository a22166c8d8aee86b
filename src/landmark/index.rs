//! ランドマークの固定インデックス表
//!
//! 全レンダラーとリターゲッターはこの表経由でのみランドマークを参照する。

/// 体ランドマーク 33 点のインデックス
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(usize)]
pub enum PoseIndex {
    Nose = 0,
    LeftEyeInner = 1,
    LeftEye = 2,
    LeftEyeOuter = 3,
    RightEyeInner = 4,
    RightEye = 5,
    RightEyeOuter = 6,
    LeftEar = 7,
    RightEar = 8,
    MouthLeft = 9,
    MouthRight = 10,
    LeftShoulder = 11,
    RightShoulder = 12,
    LeftElbow = 13,
    RightElbow = 14,
    LeftWrist = 15,
    RightWrist = 16,
    LeftPinky = 17,
    RightPinky = 18,
    LeftIndex = 19,
    RightIndex = 20,
    LeftThumb = 21,
    RightThumb = 22,
    LeftHip = 23,
    RightHip = 24,
    LeftKnee = 25,
    RightKnee = 26,
    LeftAnkle = 27,
    RightAnkle = 28,
    LeftHeel = 29,
    RightHeel = 30,
    LeftFootIndex = 31,
    RightFootIndex = 32,
}

impl PoseIndex {
    pub const COUNT: usize = 33;

    pub const ALL: [PoseIndex; Self::COUNT] = [
        Self::Nose,
        Self::LeftEyeInner,
        Self::LeftEye,
        Self::LeftEyeOuter,
        Self::RightEyeInner,
        Self::RightEye,
        Self::RightEyeOuter,
        Self::LeftEar,
        Self::RightEar,
        Self::MouthLeft,
        Self::MouthRight,
        Self::LeftShoulder,
        Self::RightShoulder,
        Self::LeftElbow,
        Self::RightElbow,
        Self::LeftWrist,
        Self::RightWrist,
        Self::LeftPinky,
        Self::RightPinky,
        Self::LeftIndex,
        Self::RightIndex,
        Self::LeftThumb,
        Self::RightThumb,
        Self::LeftHip,
        Self::RightHip,
        Self::LeftKnee,
        Self::RightKnee,
        Self::LeftAnkle,
        Self::RightAnkle,
        Self::LeftHeel,
        Self::RightHeel,
        Self::LeftFootIndex,
        Self::RightFootIndex,
    ];

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }
}

/// 顔メッシュ上で名前付きで使う点
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum FaceIndex {
    UpperLipInner = 13,
    LowerLipInner = 14,
    NoseTip = 4,
    NoseBridge = 6,
    LeftEyeOuter = 33,
    MouthLeft = 61,
    LeftNostril = 64,
    LeftEyeInner = 133,
    LeftEyeBottom = 145,
    LeftEyeTop = 159,
    RightEyeOuter = 263,
    MouthRight = 291,
    RightNostril = 294,
    RightEyeInner = 362,
    RightEyeBottom = 374,
    RightEyeTop = 386,
    /// refine 有効時のみ存在する虹彩中心
    LeftIris = 468,
    RightIris = 473,
}

/// 目 1 つ分の参照点 (外側, 内側, 上瞼, 下瞼)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EyeIndices {
    pub outer: FaceIndex,
    pub inner: FaceIndex,
    pub top: FaceIndex,
    pub bottom: FaceIndex,
}

pub const LEFT_EYE: EyeIndices = EyeIndices {
    outer: FaceIndex::LeftEyeOuter,
    inner: FaceIndex::LeftEyeInner,
    top: FaceIndex::LeftEyeTop,
    bottom: FaceIndex::LeftEyeBottom,
};

pub const RIGHT_EYE: EyeIndices = EyeIndices {
    outer: FaceIndex::RightEyeOuter,
    inner: FaceIndex::RightEyeInner,
    top: FaceIndex::RightEyeTop,
    bottom: FaceIndex::RightEyeBottom,
};

/// 左眉 (内側 → 外側)
pub const LEFT_BROW: [usize; 5] = [107, 66, 105, 63, 70];
/// 右眉 (内側 → 外側)
pub const RIGHT_BROW: [usize; 5] = [336, 296, 334, 293, 300];

/// 顔の輪郭 (閉ループ、先頭と末尾が同じ点)
pub const FACE_OVAL: [usize; 37] = [
    10, 338, 297, 332, 284, 251, 389, 356, 454, 323, 361, 288, 397, 365, 379, 378, 400, 377, 152,
    148, 176, 149, 150, 136, 172, 58, 132, 93, 234, 127, 162, 21, 54, 103, 67, 109, 10,
];

/// 左目の輪郭 (閉ループ)
pub const LEFT_EYE_LOOP: [usize; 17] = [
    33, 7, 163, 144, 145, 153, 154, 155, 133, 173, 157, 158, 159, 160, 161, 246, 33,
];

/// 右目の輪郭 (閉ループ)
pub const RIGHT_EYE_LOOP: [usize; 17] = [
    263, 249, 390, 373, 374, 380, 381, 382, 362, 398, 384, 385, 386, 387, 388, 466, 263,
];

/// 唇の外周 (閉ループ)
pub const LIPS_OUTER: [usize; 21] = [
    61, 146, 91, 181, 84, 17, 314, 405, 321, 375, 291, 409, 270, 269, 267, 0, 37, 39, 40, 185, 61,
];

/// 手ランドマーク 21 点のインデックス
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum HandIndex {
    Wrist = 0,
    ThumbCmc = 1,
    ThumbMcp = 2,
    ThumbIp = 3,
    ThumbTip = 4,
    IndexMcp = 5,
    IndexPip = 6,
    IndexDip = 7,
    IndexTip = 8,
    MiddleMcp = 9,
    MiddlePip = 10,
    MiddleDip = 11,
    MiddleTip = 12,
    RingMcp = 13,
    RingPip = 14,
    RingDip = 15,
    RingTip = 16,
    PinkyMcp = 17,
    PinkyPip = 18,
    PinkyDip = 19,
    PinkyTip = 20,
}

impl HandIndex {
    pub const COUNT: usize = 21;
}

/// 指ごとの関節チェーン (根元 → 指先)
pub const FINGER_CHAINS: [(&str, [HandIndex; 4]); 5] = [
    (
        "Thumb",
        [HandIndex::ThumbCmc, HandIndex::ThumbMcp, HandIndex::ThumbIp, HandIndex::ThumbTip],
    ),
    (
        "Index",
        [HandIndex::IndexMcp, HandIndex::IndexPip, HandIndex::IndexDip, HandIndex::IndexTip],
    ),
    (
        "Middle",
        [HandIndex::MiddleMcp, HandIndex::MiddlePip, HandIndex::MiddleDip, HandIndex::MiddleTip],
    ),
    (
        "Ring",
        [HandIndex::RingMcp, HandIndex::RingPip, HandIndex::RingDip, HandIndex::RingTip],
    ),
    (
        "Little",
        [HandIndex::PinkyMcp, HandIndex::PinkyPip, HandIndex::PinkyDip, HandIndex::PinkyTip],
    ),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pose_index_count() {
        assert_eq!(PoseIndex::COUNT, 33);
        for (i, idx) in PoseIndex::ALL.iter().enumerate() {
            assert_eq!(*idx as usize, i);
        }
    }

    #[test]
    fn test_pose_index_from_index() {
        assert_eq!(PoseIndex::from_index(0), Some(PoseIndex::Nose));
        assert_eq!(PoseIndex::from_index(11), Some(PoseIndex::LeftShoulder));
        assert_eq!(PoseIndex::from_index(24), Some(PoseIndex::RightHip));
        assert_eq!(PoseIndex::from_index(33), None);
    }

    #[test]
    fn test_contours_are_closed() {
        assert_eq!(FACE_OVAL.first(), FACE_OVAL.last());
        assert_eq!(LEFT_EYE_LOOP.first(), LEFT_EYE_LOOP.last());
        assert_eq!(RIGHT_EYE_LOOP.first(), RIGHT_EYE_LOOP.last());
        assert_eq!(LIPS_OUTER.first(), LIPS_OUTER.last());
    }

    #[test]
    fn test_finger_chains_cover_hand() {
        let mut seen: Vec<usize> = FINGER_CHAINS
            .iter()
            .flat_map(|(_, chain)| chain.iter().map(|i| *i as usize))
            .collect();
        seen.sort_unstable();
        assert_eq!(seen, (1..HandIndex::COUNT).collect::<Vec<_>>());
    }
}

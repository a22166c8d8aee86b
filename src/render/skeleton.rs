use crate::landmark::{HandIndex, PoseIndex};

/// 体の骨格の接続定義 (開始ランドマーク, 終了ランドマーク)
pub const POSE_CONNECTIONS: [(PoseIndex, PoseIndex); 35] = {
    use PoseIndex::*;
    [
        // 顔
        (Nose, LeftEyeInner),
        (LeftEyeInner, LeftEye),
        (LeftEye, LeftEyeOuter),
        (LeftEyeOuter, LeftEar),
        (Nose, RightEyeInner),
        (RightEyeInner, RightEye),
        (RightEye, RightEyeOuter),
        (RightEyeOuter, RightEar),
        (MouthLeft, MouthRight),
        // 上半身
        (LeftShoulder, RightShoulder),
        (LeftShoulder, LeftElbow),
        (LeftElbow, LeftWrist),
        (LeftWrist, LeftPinky),
        (LeftWrist, LeftIndex),
        (LeftWrist, LeftThumb),
        (LeftPinky, LeftIndex),
        (RightShoulder, RightElbow),
        (RightElbow, RightWrist),
        (RightWrist, RightPinky),
        (RightWrist, RightIndex),
        (RightWrist, RightThumb),
        (RightPinky, RightIndex),
        // 胴体
        (LeftShoulder, LeftHip),
        (RightShoulder, RightHip),
        (LeftHip, RightHip),
        // 下半身
        (LeftHip, LeftKnee),
        (RightHip, RightKnee),
        (LeftKnee, LeftAnkle),
        (RightKnee, RightAnkle),
        (LeftAnkle, LeftHeel),
        (RightAnkle, RightHeel),
        (LeftHeel, LeftFootIndex),
        (RightHeel, RightFootIndex),
        (LeftAnkle, LeftFootIndex),
        (RightAnkle, RightFootIndex),
    ]
};

/// 手の骨格 (指4本の連なり + 掌の外周)
pub const HAND_CONNECTIONS: [(HandIndex, HandIndex); 21] = {
    use HandIndex::*;
    [
        (Wrist, ThumbCmc),
        (ThumbCmc, ThumbMcp),
        (ThumbMcp, ThumbIp),
        (ThumbIp, ThumbTip),
        (IndexMcp, IndexPip),
        (IndexPip, IndexDip),
        (IndexDip, IndexTip),
        (MiddleMcp, MiddlePip),
        (MiddlePip, MiddleDip),
        (MiddleDip, MiddleTip),
        (RingMcp, RingPip),
        (RingPip, RingDip),
        (RingDip, RingTip),
        (PinkyMcp, PinkyPip),
        (PinkyPip, PinkyDip),
        (PinkyDip, PinkyTip),
        (Wrist, IndexMcp),
        (IndexMcp, MiddleMcp),
        (MiddleMcp, RingMcp),
        (RingMcp, PinkyMcp),
        (Wrist, PinkyMcp),
    ]
};

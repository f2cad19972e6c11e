//! Upper-body pose stub.
//!
//! No vision model runs here: [`PoseEstimator::detect`] returns a fixed
//! fencing-stance skeleton with a small random jitter, and derives the same
//! features a real detector would feed to the commentary.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Tracked upper-body joints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Joint {
    LeftShoulder,
    RightShoulder,
    LeftElbow,
    RightElbow,
    LeftWrist,
    RightWrist,
}

/// Normalised image coordinates plus visibility in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Keypoint {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub visibility: f64,
}

impl Keypoint {
    const fn at(x: f64, y: f64, visibility: f64) -> Self {
        Self {
            x,
            y,
            z: 0.0,
            visibility,
        }
    }

    fn distance(&self, other: &Keypoint) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }
}

/// Features derived from the keypoints. Angles are in degrees.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PoseFeatures {
    pub left_arm_angle: f64,
    pub right_arm_angle: f64,
    /// Positive when the right shoulder sits lower than the left.
    pub shoulder_angle: f64,
    pub left_arm_extension: f64,
    pub right_arm_extension: f64,
}

impl PoseFeatures {
    pub fn from_keypoints(keypoints: &BTreeMap<Joint, Keypoint>) -> Self {
        let get = |joint| keypoints.get(&joint);
        let mut features = PoseFeatures::default();

        if let (Some(s), Some(e), Some(w)) = (
            get(Joint::LeftShoulder),
            get(Joint::LeftElbow),
            get(Joint::LeftWrist),
        ) {
            features.left_arm_angle = joint_angle(s, e, w);
            features.left_arm_extension = s.distance(w);
        }
        if let (Some(s), Some(e), Some(w)) = (
            get(Joint::RightShoulder),
            get(Joint::RightElbow),
            get(Joint::RightWrist),
        ) {
            features.right_arm_angle = joint_angle(s, e, w);
            features.right_arm_extension = s.distance(w);
        }
        if let (Some(l), Some(r)) = (get(Joint::LeftShoulder), get(Joint::RightShoulder)) {
            features.shoulder_angle = (r.y - l.y).atan2(r.x - l.x).to_degrees();
        }

        features
    }
}

/// Output of one detection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PoseDetection {
    pub keypoints: BTreeMap<Joint, Keypoint>,
    pub features: PoseFeatures,
    pub confidence: f64,
    pub detection_method: &'static str,
}

const STANCE: [(Joint, Keypoint); 6] = [
    (Joint::LeftShoulder, Keypoint::at(0.4, 0.3, 0.8)),
    (Joint::RightShoulder, Keypoint::at(0.6, 0.3, 0.8)),
    (Joint::LeftElbow, Keypoint::at(0.35, 0.4, 0.75)),
    (Joint::RightElbow, Keypoint::at(0.65, 0.4, 0.75)),
    (Joint::LeftWrist, Keypoint::at(0.3, 0.5, 0.7)),
    (Joint::RightWrist, Keypoint::at(0.7, 0.5, 0.7)),
];

/// Fallback pose detector.
#[derive(Debug, Clone)]
pub struct PoseEstimator {
    jitter: f64,
}

impl Default for PoseEstimator {
    fn default() -> Self {
        Self { jitter: 0.01 }
    }
}

impl PoseEstimator {
    /// Maximum per-coordinate offset applied to each stance keypoint.
    pub fn with_jitter(jitter: f64) -> Self {
        Self {
            jitter: jitter.abs(),
        }
    }

    pub fn detect<R: Rng + ?Sized>(&self, rng: &mut R) -> PoseDetection {
        let keypoints: BTreeMap<_, _> = STANCE
            .iter()
            .map(|&(joint, kp)| {
                let moved = Keypoint {
                    x: kp.x + self.offset(rng),
                    y: kp.y + self.offset(rng),
                    ..kp
                };
                (joint, moved)
            })
            .collect();

        let features = PoseFeatures::from_keypoints(&keypoints);
        let confidence = mean_visibility(&keypoints);

        PoseDetection {
            keypoints,
            features,
            confidence,
            detection_method: "fallback",
        }
    }

    fn offset<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        if self.jitter == 0.0 {
            0.0
        } else {
            rng.random_range(-self.jitter..=self.jitter)
        }
    }
}

/// Angle at `vertex` between the rays to `a` and `b`, in degrees.
fn joint_angle(a: &Keypoint, vertex: &Keypoint, b: &Keypoint) -> f64 {
    let v1 = (a.x - vertex.x, a.y - vertex.y);
    let v2 = (b.x - vertex.x, b.y - vertex.y);
    let mag = v1.0.hypot(v1.1) * v2.0.hypot(v2.1);
    if mag == 0.0 {
        return 0.0;
    }
    let cos = ((v1.0 * v2.0 + v1.1 * v2.1) / mag).clamp(-1.0, 1.0);
    cos.acos().to_degrees()
}

fn mean_visibility(keypoints: &BTreeMap<Joint, Keypoint>) -> f64 {
    if keypoints.is_empty() {
        return 0.0;
    }
    keypoints.values().map(|k| k.visibility).sum::<f64>() / keypoints.len() as f64
}

//! Head orientation from a perspective-n-point solve.
//!
//! Six mesh anchors are lifted to 3D using their own pixel position plus the
//! tracker's relative depth, then a rotation and translation are fitted with
//! Levenberg–Marquardt against a pinhole camera whose focal length is the
//! frame width. Pitch and yaw are read off the fitted rotation.

use nalgebra::{Matrix6, Rotation3, SVector, Vector3, Vector6};

use proctor_common::config::AnalysisConfig;
use proctor_session_model::FaceLandmarks;

/// Mesh indices used as pose anchors: nose tip, chin, outer eye corners,
/// mouth corners.
pub const POSE_ANCHORS: [usize; 6] = [1, 152, 33, 263, 61, 291];

/// Multiplier applied to the decomposed Euler angles (degrees). The gaze
/// thresholds are calibrated against this scale.
pub const ANGLE_SCALE: f64 = 360.0;

const RESIDUALS: usize = 2 * POSE_ANCHORS.len();
const MAX_ITERATIONS: usize = 100;
const INITIAL_DAMPING: f64 = 1e-3;

type Residuals = SVector<f64, RESIDUALS>;
type Jacobian = nalgebra::SMatrix<f64, RESIDUALS, 6>;

/// Head orientation in scaled degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HeadPose {
    /// Rotation about the horizontal axis.
    pub pitch: f64,
    /// Rotation about the vertical axis.
    pub yaw: f64,
}

impl HeadPose {
    /// Pose reported when the solve fails.
    pub const FORWARD: Self = Self {
        pitch: 0.0,
        yaw: 0.0,
    };

    pub fn is_looking_away(&self, config: &AnalysisConfig) -> bool {
        self.yaw.abs() > config.gaze_threshold_x || self.pitch.abs() > config.gaze_threshold_y
    }
}

/// Estimate head pose for a frame of `width` x `height` pixels.
///
/// Never fails: a solve that does not converge to finite values yields
/// [`HeadPose::FORWARD`].
pub fn estimate_head_pose(face: &FaceLandmarks, width: u32, height: u32) -> HeadPose {
    if width == 0 || height == 0 {
        return HeadPose::FORWARD;
    }
    let problem = PnpProblem::new(face, width, height);
    match problem.solve() {
        Some(params) => {
            let rotation = Rotation3::new(Vector3::new(params[0], params[1], params[2]));
            let pose = pose_from_rotation(&rotation);
            if pose.pitch.is_finite() && pose.yaw.is_finite() {
                pose
            } else {
                HeadPose::FORWARD
            }
        }
        None => {
            tracing::debug!("Head pose solve failed, assuming forward gaze");
            HeadPose::FORWARD
        }
    }
}

/// Decompose a rotation into scaled pitch (about x) and yaw (about y).
pub fn pose_from_rotation(rotation: &Rotation3<f64>) -> HeadPose {
    let m = rotation.matrix();
    let pitch = m[(2, 1)].atan2(m[(2, 2)]);
    let yaw = (-m[(2, 0)]).atan2(m[(2, 1)].hypot(m[(2, 2)]));
    HeadPose {
        pitch: pitch.to_degrees() * ANGLE_SCALE,
        yaw: yaw.to_degrees() * ANGLE_SCALE,
    }
}

struct PnpProblem {
    object: [Vector3<f64>; 6],
    image: [(f64, f64); 6],
    focal: f64,
    cx: f64,
    cy: f64,
}

impl PnpProblem {
    fn new(face: &FaceLandmarks, width: u32, height: u32) -> Self {
        let mut object = [Vector3::zeros(); 6];
        let mut image = [(0.0, 0.0); 6];
        for (slot, &index) in POSE_ANCHORS.iter().enumerate() {
            let lm = face.point(index);
            let (px, py) = lm.to_pixel(width, height);
            object[slot] = Vector3::new(px as f64, py as f64, lm.z);
            image[slot] = (px as f64, py as f64);
        }
        Self {
            object,
            image,
            focal: width as f64,
            cx: width as f64 / 2.0,
            cy: height as f64 / 2.0,
        }
    }

    /// Parameters: Rodrigues rotation vector followed by translation.
    fn residuals(&self, params: &Vector6<f64>) -> Option<Residuals> {
        let rotation = Rotation3::new(Vector3::new(params[0], params[1], params[2]));
        let translation = Vector3::new(params[3], params[4], params[5]);
        let mut out = Residuals::zeros();
        for (i, (point, &(u, v))) in self.object.iter().zip(self.image.iter()).enumerate() {
            let cam = rotation * *point + translation;
            // Behind or on the camera plane.
            if cam.z <= f64::EPSILON {
                return None;
            }
            out[2 * i] = self.focal * cam.x / cam.z + self.cx - u;
            out[2 * i + 1] = self.focal * cam.y / cam.z + self.cy - v;
        }
        out.iter().all(|r| r.is_finite()).then_some(out)
    }

    fn jacobian(&self, params: &Vector6<f64>, base: &Residuals) -> Option<Jacobian> {
        let mut jac = Jacobian::zeros();
        for k in 0..6 {
            let step = 1e-6 * params[k].abs().max(1.0);
            let mut shifted = *params;
            shifted[k] += step;
            let r = self.residuals(&shifted)?;
            jac.set_column(k, &((r - base) / step));
        }
        Some(jac)
    }

    fn solve(&self) -> Option<Vector6<f64>> {
        // Camera looking straight at the lifted points.
        let mut params = Vector6::new(0.0, 0.0, 0.0, -self.cx, -self.cy, self.focal);
        let mut residuals = self.residuals(&params)?;
        let mut cost = residuals.norm_squared();
        let mut damping = INITIAL_DAMPING;

        for _ in 0..MAX_ITERATIONS {
            if cost < 1e-18 {
                break;
            }
            let jac = self.jacobian(&params, &residuals)?;
            let jtj = jac.transpose() * jac;
            let gradient = jac.transpose() * residuals;

            let mut augmented: Matrix6<f64> = jtj;
            for d in 0..6 {
                augmented[(d, d)] += damping * jtj[(d, d)].max(1e-9);
            }
            let Some(step) = augmented.lu().solve(&(-gradient)) else {
                damping *= 10.0;
                continue;
            };

            let candidate = params + step;
            match self.residuals(&candidate) {
                Some(next) if next.norm_squared() < cost => {
                    params = candidate;
                    residuals = next;
                    let next_cost = residuals.norm_squared();
                    let improvement = cost - next_cost;
                    cost = next_cost;
                    damping = (damping / 10.0).max(1e-12);
                    if step.norm() < 1e-12 * (params.norm() + 1e-12) || improvement < 1e-14 {
                        break;
                    }
                }
                _ => {
                    damping *= 10.0;
                    if damping > 1e12 {
                        break;
                    }
                }
            }
        }

        params.iter().all(|p| p.is_finite()).then_some(params)
    }
}

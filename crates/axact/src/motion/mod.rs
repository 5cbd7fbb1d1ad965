/*!
Humanized pointer trajectories.

Plans a cubic Bézier path from start to end with randomized interior
control points, an occasional overshoot-and-correct, and Fitts's-law step
timing distributed on a sine bell so the pointer is slower near the
endpoints. Pure: no side effects, all randomness comes from the injected
generator.
*/

use crate::types::Point;
use rand::Rng;
use std::time::Duration;

/// Tuning for the trajectory planner.
#[derive(Debug, Clone, Copy)]
pub struct MotionConfig {
  /// Maximum perpendicular control-point offset as a fraction of the
  /// travel distance.
  pub randomness: f64,
  /// Probability of an overshoot-and-correct ending.
  pub overshoot_chance: f64,
  /// Fitts's-law intercept, seconds.
  pub fitts_a: f64,
  /// Fitts's-law slope, seconds per bit.
  pub fitts_b: f64,
  /// Total-time jitter fraction.
  pub jitter: f64,
  /// Floor for the total movement time.
  pub min_duration: Duration,
}

impl Default for MotionConfig {
  fn default() -> Self {
    Self {
      randomness: 0.3,
      overshoot_chance: 0.2,
      fitts_a: 0.05,
      fitts_b: 0.15,
      jitter: 0.10,
      min_duration: Duration::from_millis(20),
    }
  }
}

/// One trajectory step: where the pointer goes and how long to wait before
/// the next step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathStep {
  pub point: Point,
  pub delay: Duration,
}

/// Distances under this emit a single terminal step.
const SHORT_DISTANCE: f64 = 3.0;

/// Fitts's-law movement time in seconds, before jitter and clamping.
pub fn fitts_duration(distance: f64, target_width: f64, config: &MotionConfig) -> f64 {
  let width = target_width.max(1.0);
  let index = (2.0 * distance / width).max(1.0).log2();
  config.fitts_a + config.fitts_b * index
}

/// Plan a humanized trajectory from `start` to `end`.
///
/// The sequence excludes the start point, ends exactly at `end`, and sums
/// its delays to the (jittered) Fitts time. An overshoot, when rolled,
/// appends one extra correction step.
pub fn humanized_path(
  start: Point,
  end: Point,
  target_width: f64,
  config: &MotionConfig,
  rng: &mut impl Rng,
) -> Vec<PathStep> {
  let distance = start.distance_to(end);
  if distance < SHORT_DISTANCE {
    return vec![PathStep {
      point: end,
      delay: Duration::ZERO,
    }];
  }

  let steps = ((distance / 8.0) as usize).clamp(20, 80);

  // Interior control points: along-line positions with perpendicular
  // offsets up to distance * randomness.
  let dx = end.x - start.x;
  let dy = end.y - start.y;
  let (perp_x, perp_y) = (-dy / distance, dx / distance);
  let control = |along: f64, offset_unit: f64| -> Point {
    let offset = offset_unit * distance * config.randomness;
    Point::new(
      start.x + dx * along + perp_x * offset,
      start.y + dy * along + perp_y * offset,
    )
  };
  let (t1, o1) = (rng.random_range(0.2..0.4), rng.random_range(-1.0..1.0));
  let (t2, o2) = (rng.random_range(0.6..0.8), rng.random_range(-1.0..1.0));
  let p1 = control(t1, o1);
  let p2 = control(t2, o2);

  let mut points: Vec<Point> = (1..=steps)
    .map(|i| cubic_bezier(start, p1, p2, end, i as f64 / steps as f64))
    .collect();

  // Overshoot-and-correct: extrapolate a few px past the endpoint along
  // the approach direction, then come back to the exact endpoint.
  if rng.random_bool(config.overshoot_chance) {
    let before = points[points.len() - 2];
    let (ax, ay) = (end.x - before.x, end.y - before.y);
    let approach = ax.hypot(ay);
    if approach > f64::EPSILON {
      let past = rng.random_range(2.0..6.0);
      let overshoot = Point::new(
        end.x + ax / approach * past,
        end.y + ay / approach * past,
      );
      let last = points.len() - 1;
      points[last] = overshoot;
      points.push(end);
    }
  }

  // Total time: Fitts's law, jittered, floored. Distributed over the steps
  // by a sine bell with a 0.3 floor so endpoints stay slow but nonzero.
  let total = (fitts_duration(distance, target_width, config)
    * rng.random_range(1.0 - config.jitter..1.0 + config.jitter))
  .max(config.min_duration.as_secs_f64());

  let count = points.len();
  let weights: Vec<f64> = (0..count)
    .map(|i| 0.3 + (std::f64::consts::PI * i as f64 / (count - 1).max(1) as f64).sin())
    .collect();
  let weight_sum: f64 = weights.iter().sum();

  points
    .into_iter()
    .zip(weights)
    .map(|(point, weight)| PathStep {
      point,
      delay: Duration::from_secs_f64(total * weight / weight_sum),
    })
    .collect()
}

fn cubic_bezier(p0: Point, p1: Point, p2: Point, p3: Point, t: f64) -> Point {
  let u = 1.0 - t;
  let (a, b, c, d) = (u * u * u, 3.0 * u * u * t, 3.0 * u * t * t, t * t * t);
  Point::new(
    a * p0.x + b * p1.x + c * p2.x + d * p3.x,
    a * p0.y + b * p1.y + c * p2.y + d * p3.y,
  )
}

//! Joint angle between two limb segments meeting at a vertex.

use crate::pose::Landmark;

/// Signed angle in degrees from ray `b→a` to ray `b→c`, normalized to [0, 360).
///
/// `b` is the vertex. Swapping `a` and `c` yields `360 - angle` (or 0 for a
/// zero angle), so callers must keep the argument order fixed per exercise.
pub fn joint_angle(a: Landmark, b: Landmark, c: Landmark) -> f64 {
    let to_c = (c.y - b.y).atan2(c.x - b.x);
    let to_a = (a.y - b.y).atan2(a.x - b.x);
    normalize_degrees((to_c - to_a).to_degrees())
}

/// Fold a raw difference of two `atan2` results, in (-360, 360), into [0, 360).
fn normalize_degrees(raw: f64) -> f64 {
    let folded = if raw < 0.0 { raw + 360.0 } else { raw };
    // -ε + 360 can round up to exactly 360
    if folded >= 360.0 {
        folded - 360.0
    } else {
        folded
    }
}

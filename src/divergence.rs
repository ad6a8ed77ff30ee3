//! Detects drift between two successive coarse paths (SPEC_FULL.md section
//! 4.5).

use crate::types::CoarsePath;

/// Arc length (meters) at which `new` first drifts from `prev` by more than
/// `div_distance` grid cells, or `f64::INFINITY` if it never does (or if
/// `prev` is empty).
pub fn divergent_distance(new: &CoarsePath, prev: &CoarsePath, div_distance: f64, planner_res: f64) -> f64 {
    if new.is_empty() || prev.is_empty() {
        return f64::INFINITY;
    }

    let anchor = new.indices[0];
    let mut matching_idx = None;
    let mut best_dist = f64::INFINITY;
    for (i, p) in prev.indices.iter().enumerate() {
        let d = anchor.distance_to(p);
        if d < best_dist {
            best_dist = d;
            matching_idx = Some(i);
        }
        if d < 1.0 {
            matching_idx = Some(i);
            break;
        }
    }
    let matching_idx = match matching_idx {
        Some(i) => i,
        None => return f64::INFINITY,
    };

    let dx = anchor.x - prev.indices[matching_idx].x;
    let dy = anchor.y - prev.indices[matching_idx].y;

    let mut diverge_at = None;
    for i in 0..new.len() {
        let prev_i = i + matching_idx;
        if prev_i >= prev.len() {
            break;
        }
        let shifted_x = new.indices[i].x - dx;
        let shifted_y = new.indices[i].y - dy;
        let d = (((shifted_x - prev.indices[prev_i].x).pow(2)
            + (shifted_y - prev.indices[prev_i].y).pow(2)) as f64)
            .sqrt();
        if d > div_distance {
            diverge_at = Some(i);
            break;
        }
    }

    match diverge_at {
        Some(i) => {
            crate::coordinates::polyline_length(
                &new.indices[..=i]
                    .iter()
                    .map(|g| crate::types::Point::new(g.x as f64, g.y as f64))
                    .collect::<Vec<_>>(),
            ) * planner_res
        }
        None => f64::INFINITY,
    }
}

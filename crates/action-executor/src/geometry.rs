//! Coordinate establishment with bounded recovery.
//!
//! The box model of a newly-mounted or off-screen element is often
//! degenerate (zero-size, NaN, missing). Recovery forces visibility and
//! relayout, re-scrolls, and finally falls back to a page-side rect query
//! with its own fallback chain. When nothing yields usable geometry the
//! click fails with a dedicated error; a coordinate is never guessed.

use serde_json::{json, Value};
use tracing::{debug, warn};

use page_bridge::{PageBridge, ProtocolBridge};
use pagegrip_core_types::{ElementHandle, Point};

use crate::config::ExecutorConfig;
use crate::errors::ExecError;

/// Pause between geometry recovery attempts, long enough for a layout pass.
const GEOMETRY_RETRY_PAUSE_MS: u64 = 100;

/// Center of a content quad `[x1,y1,x2,y2,x3,y3,x4,y4]`. `None` for
/// malformed, non-finite or zero-area quads.
pub fn quad_center(quad: &[f64]) -> Option<Point> {
    if quad.len() != 8 {
        return None;
    }
    if quad.iter().any(|v| !v.is_finite()) {
        return None;
    }
    let xs = [quad[0], quad[2], quad[4], quad[6]];
    let ys = [quad[1], quad[3], quad[5], quad[7]];
    let width = xs.iter().cloned().fold(f64::MIN, f64::max)
        - xs.iter().cloned().fold(f64::MAX, f64::min);
    let height = ys.iter().cloned().fold(f64::MIN, f64::max)
        - ys.iter().cloned().fold(f64::MAX, f64::min);
    if width <= 0.0 || height <= 0.0 {
        return None;
    }
    Some(Point::new(
        xs.iter().sum::<f64>() / 4.0,
        ys.iter().sum::<f64>() / 4.0,
    ))
}

fn parse_box_model(value: &Value) -> Option<Point> {
    let quad: Vec<f64> = value
        .pointer("/model/content")?
        .as_array()?
        .iter()
        .filter_map(Value::as_f64)
        .collect();
    quad_center(&quad)
}

/// Establish the dispatch point for a handle.
pub async fn element_center(
    protocol: &dyn ProtocolBridge,
    page: &dyn PageBridge,
    handle: &ElementHandle,
    config: &ExecutorConfig,
) -> Result<Point, ExecError> {
    if let Some(point) = handle.virtual_point {
        return Ok(point);
    }

    let attempts = config.geometry_attempts.max(1);
    for attempt in 0..attempts {
        if let Some(backend_node_id) = handle.backend_node_id {
            match protocol
                .send("DOM.getBoxModel", json!({ "backendNodeId": backend_node_id }))
                .await
            {
                Ok(value) => {
                    if let Some(center) = parse_box_model(&value) {
                        return Ok(center);
                    }
                    debug!(attempt, "box model degenerate");
                }
                Err(err) => debug!(attempt, error = %err, "box model query failed"),
            }
        }

        // Force visibility, re-scroll, relayout, give the page a beat to
        // paint, then try again.
        if attempt + 1 < attempts {
            if let Err(err) = page.force_layout(handle).await {
                debug!(error = %err, "force layout failed");
            }
            if let Err(err) = page.scroll_into_view(handle).await {
                debug!(error = %err, "recovery scroll failed");
            }
            tokio::time::sleep(std::time::Duration::from_millis(GEOMETRY_RETRY_PAUSE_MS)).await;
        }
    }

    // Page-side bounding rect with its own fallback chain (self, first
    // visible child, nearest visible ancestor).
    match page.element_rect(handle).await {
        Ok(Some(rect)) if !rect.is_degenerate() => {
            let center = rect.center();
            if center.is_finite() {
                debug!("geometry recovered via page-side rect query");
                return Ok(center);
            }
        }
        Ok(_) => {}
        Err(err) => warn!(error = %err, "page-side rect query failed"),
    }

    Err(ExecError::GeometryUnavailable(
        "no usable geometry after box model retries and rect fallback".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quad_center_of_rectangle() {
        let quad = [10.0, 10.0, 110.0, 10.0, 110.0, 50.0, 10.0, 50.0];
        let center = quad_center(&quad).unwrap();
        assert_eq!(center.x, 60.0);
        assert_eq!(center.y, 30.0);
    }

    #[test]
    fn degenerate_quads_are_rejected() {
        // Zero area.
        assert!(quad_center(&[5.0, 5.0, 5.0, 5.0, 5.0, 5.0, 5.0, 5.0]).is_none());
        // NaN coordinate.
        assert!(quad_center(&[f64::NAN, 0.0, 10.0, 0.0, 10.0, 10.0, 0.0, 10.0]).is_none());
        // Wrong arity.
        assert!(quad_center(&[1.0, 2.0, 3.0]).is_none());
    }

    #[test]
    fn parse_box_model_reads_content_quad() {
        let value = serde_json::json!({
            "model": { "content": [0.0, 0.0, 20.0, 0.0, 20.0, 10.0, 0.0, 10.0] }
        });
        let center = parse_box_model(&value).unwrap();
        assert_eq!(center.x, 10.0);
        assert_eq!(center.y, 5.0);

        let missing = serde_json::json!({ "model": {} });
        assert!(parse_box_model(&missing).is_none());
    }
}

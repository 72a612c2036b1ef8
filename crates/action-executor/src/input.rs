//! Raw input dispatch over the debugging protocol.

use serde_json::json;

use page_bridge::ProtocolBridge;
use pagegrip_core_types::Point;

use crate::errors::ExecError;

/// Modifier bitmask for Control in the protocol's key events.
pub const MODIFIER_CTRL: u64 = 2;

/// Dispatch a full left-click (mouse down then up) at a point.
pub async fn dispatch_click(protocol: &dyn ProtocolBridge, point: Point) -> Result<(), ExecError> {
    for event_type in ["mousePressed", "mouseReleased"] {
        protocol
            .send(
                "Input.dispatchMouseEvent",
                json!({
                    "type": event_type,
                    "x": point.x,
                    "y": point.y,
                    "button": "left",
                    "clickCount": 1,
                }),
            )
            .await?;
    }
    Ok(())
}

/// Dispatch one keydown/keyup pair.
///
/// `text` rides on the keydown so the page sees a real character insertion
/// rather than a bare key code.
pub async fn dispatch_key_pair(
    protocol: &dyn ProtocolBridge,
    key: &str,
    text: Option<&str>,
    modifiers: u64,
) -> Result<(), ExecError> {
    let mut down = json!({
        "type": "keyDown",
        "key": key,
        "modifiers": modifiers,
    });
    if let Some(text) = text {
        down["text"] = json!(text);
    }
    protocol.send("Input.dispatchKeyEvent", down).await?;

    protocol
        .send(
            "Input.dispatchKeyEvent",
            json!({
                "type": "keyUp",
                "key": key,
                "modifiers": modifiers,
            }),
        )
        .await?;
    Ok(())
}

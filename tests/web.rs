#![cfg(target_arch = "wasm32")]

use neural_backdrop::NeuralBackdrop;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_test::*;
use web_sys::HtmlCanvasElement;

wasm_bindgen_test_configure!(run_in_browser);

fn canvas() -> HtmlCanvasElement {
    web_sys::window()
        .and_then(|w| w.document())
        .and_then(|d| d.create_element("canvas").ok())
        .and_then(|e| e.dyn_into::<HtmlCanvasElement>().ok())
        .unwrap()
}

#[wasm_bindgen_test]
fn test_start_stop_lifecycle() {
    let mut backdrop = NeuralBackdrop::new(JsValue::UNDEFINED).unwrap();
    assert!(!backdrop.is_running());
    backdrop.start(canvas());
    assert!(backdrop.is_running());
    backdrop.stop();
    backdrop.stop();
    assert!(!backdrop.is_running());
}

#[wasm_bindgen_test]
fn test_invalid_config_is_rejected() {
    let config = js_sys::JSON::parse(r#"{"emission_probability": 2.0}"#).unwrap();
    assert!(NeuralBackdrop::new(config).is_err());
}

#[wasm_bindgen_test]
fn test_snapshot_after_start() {
    let config = js_sys::JSON::parse(r#"{"seed": 3, "node_count": 12}"#).unwrap();
    let mut backdrop = NeuralBackdrop::new(config).unwrap();
    assert!(backdrop.snapshot().unwrap().is_null());
    backdrop.start(canvas());
    let json = backdrop.snapshot().unwrap().as_string().unwrap();
    assert!(json.contains("\"nodes\""));
    assert!(!backdrop.stats().is_null());
    backdrop.stop();
}

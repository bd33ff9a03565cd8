use wasm_bindgen::JsValue;
use web_sys::Window;

pub fn websocket_url(window: &Window) -> Result<String, JsValue> {
    let location = window.location();
    let protocol = location.protocol()?;
    let host = location.host()?;
    Ok(format!("{}://{host}/ws", websocket_scheme(&protocol)))
}

fn websocket_scheme(page_protocol: &str) -> &'static str {
    if page_protocol == "https:" {
        "wss"
    } else {
        "ws"
    }
}

#[cfg(test)]
mod tests {
    use super::websocket_scheme;

    #[test]
    fn secure_pages_use_wss() {
        assert_eq!(websocket_scheme("https:"), "wss");
        assert_eq!(websocket_scheme("http:"), "ws");
        assert_eq!(websocket_scheme("file:"), "ws");
    }
}

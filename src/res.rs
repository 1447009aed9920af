use crate::session::{Flash, FlashKind};

#[macro_export]
macro_rules! include_res {
    (bytes, $p:expr) => {
        include_bytes!(concat!(env!("CARGO_MANIFEST_DIR"), "/res", $p))
    };
    (str, $p:expr) => {
        include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/res", $p))
    };
}

/// Escapes text for HTML, including the braces used by page placeholders.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            '{' => escaped.push_str("&#123;"),
            '}' => escaped.push_str("&#125;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

pub fn alerts(flashes: &[Flash], errors: &[&str]) -> String {
    let mut html = String::new();
    for Flash { kind, msg } in flashes {
        let class = match kind {
            FlashKind::Success => "success",
            FlashKind::Error => "error",
        };
        html += &format!(r#"<div class="alert {class}">{}</div>"#, escape_html(msg));
    }
    for error in errors {
        html += &format!(r#"<div class="alert error">{}</div>"#, escape_html(error));
    }
    html
}

/// Serializes `value` for embedding inside a `<script>` element.
pub fn script_json<T: serde::Serialize>(value: &T) -> serde_json::Result<String> {
    Ok(serde_json::to_string(value)?.replace("</", "<\\/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_markup() {
        assert_eq!(escape_html(r#"<b a="1">Tom & 'Jerry'</b>"#), "&lt;b a=&quot;1&quot;&gt;Tom &amp; &#39;Jerry&#39;&lt;/b&gt;");
    }

    #[test]
    fn script_json_cannot_close_the_tag() {
        let json = script_json(&"</script><script>").unwrap();
        assert!(!json.contains("</"));
    }

    #[test]
    fn user_text_cannot_forge_placeholders() {
        assert_eq!(escape_html("{boot}"), "&#123;boot&#125;");
    }

    #[test]
    fn renders_flashes_before_errors() {
        let flashes = [Flash { kind: FlashKind::Success, msg: "You are logged out".into() }];
        let html = alerts(&flashes, &["Password incorrect"]);
        let success = html.find("alert success").unwrap();
        let error = html.find("alert error").unwrap();
        assert!(success < error);
    }
}

/// Escape text for element content and quoted attribute values
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// `hidden` attribute when `visible` is false
pub fn hidden_unless(visible: bool) -> &'static str {
    if visible {
        ""
    } else {
        " hidden"
    }
}

pub fn checked_if(checked: bool) -> &'static str {
    if checked {
        " checked"
    } else {
        ""
    }
}

//! Fallback artifact synthesized when compilation fails.

/// A compiled unit that registers `template_name` with a renderer producing a
/// fixed failure notice. Always syntactically valid dust.js output, so the
/// client-side engine loads it like any real template.
pub fn fallback_artifact(template_name: &str) -> String {
    let name = escape_js_string(template_name);
    format!(
        "(function(){{dust.register(\"{name}\",body_0);\
         function body_0(chk,ctx){{return chk.write(\"Failed to compile template\");}}\
         return body_0;}})();"
    )
}

/// Escape a value for embedding inside a double-quoted JS string literal,
/// keeping the artifact well-formed whatever the path contained.
fn escape_js_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            c => out.push(c),
        }
    }
    out
}

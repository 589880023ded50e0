//! Placeholder substitution into user-authored strings.
//!
//! One canonical engine, used by every handler before any effect fires, so
//! the live and simulation backends agree on syntax by construction. Two
//! placeholder families are supported:
//!
//! - Variable lookups: `{{name}}` and `{name}` read the invocation's variable
//!   map. An unset variable leaves the placeholder verbatim.
//! - Context accessors: dotted paths into the invoking identity, in either
//!   brace form — `{user.id}`, `{user.username}`, `{user.mention}`,
//!   `{guild.id}`, `{guild.name}`, `{channel.id}`, `{channel.name}`,
//!   `{channel.mention}`.

use serde_json::Value;

use super::context::InvocationContext;

/// Substitute all placeholders in `input` against the invocation context.
///
/// Unknown variables and unknown dotted paths are left verbatim, including
/// their braces, so authors can see exactly what failed to resolve.
#[must_use]
pub fn interpolate(input: &str, ctx: &InvocationContext) -> String {
    let mut out = String::with_capacity(input.len());
    let bytes = input.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] != b'{' {
            // Copy the full character, not just one byte.
            let ch_len = utf8_len(bytes[i]);
            out.push_str(&input[i..i + ch_len]);
            i += ch_len;
            continue;
        }

        let double = i + 1 < bytes.len() && bytes[i + 1] == b'{';
        let key_start = if double { i + 2 } else { i + 1 };
        let close = if double { "}}" } else { "}" };

        match input[key_start..].find(close) {
            Some(rel) => {
                let key = &input[key_start..key_start + rel];
                let raw = &input[i..key_start + rel + close.len()];
                match resolve(key.trim(), ctx) {
                    Some(value) => out.push_str(&value),
                    None => out.push_str(raw),
                }
                i = key_start + rel + close.len();
            }
            None => {
                // Unterminated brace: emit the rest as-is.
                out.push_str(&input[i..]);
                break;
            }
        }
    }

    out
}

fn utf8_len(first_byte: u8) -> usize {
    match first_byte {
        b if b < 0x80 => 1,
        b if b >= 0xF0 => 4,
        b if b >= 0xE0 => 3,
        _ => 2,
    }
}

fn resolve(key: &str, ctx: &InvocationContext) -> Option<String> {
    if key.is_empty() {
        return None;
    }
    if let Some((head, tail)) = key.split_once('.') {
        return resolve_context_path(head, tail, ctx);
    }
    ctx.variables.get(key).map(render_value)
}

fn resolve_context_path(head: &str, tail: &str, ctx: &InvocationContext) -> Option<String> {
    match (head, tail) {
        ("user", "id") => Some(ctx.user.id.clone()),
        ("user", "username") => Some(ctx.user.username.clone()),
        ("user", "mention") => Some(format!("<@{}>", ctx.user.id)),
        ("guild", "id") => Some(ctx.guild.id.clone()),
        ("guild", "name") => ctx.guild.name.clone(),
        ("channel", "id") => Some(ctx.channel.id.clone()),
        ("channel", "name") => ctx.channel.name.clone(),
        ("channel", "mention") => Some(format!("<#{}>", ctx.channel.id)),
        _ => None,
    }
}

/// Render a variable value the way it should appear inside a message:
/// strings bare, everything else in its JSON form.
#[must_use]
pub fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

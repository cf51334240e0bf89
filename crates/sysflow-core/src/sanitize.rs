//! Text, id and color sanitizers shared by the emitter, the canvas bridge and importers.
//!
//! All functions here are total: malformed input is coerced to a safe value, never an error.

pub const FALLBACK_COLOR: &str = "#333333";

/// Glyphs users paste (or keyboards produce) in place of `#`.
fn is_hash_confusable(ch: char) -> bool {
    matches!(
        ch,
        '°' | '·' | '•' | '∙' | '●' | '▪' | '▫' | '○' | '◦' | '\u{FFFF}' | '¶' | 'ß'
    )
}

fn is_ctrl_character(ch: char) -> bool {
    matches!(ch, '\u{0000}'..='\u{001F}' | '\u{007F}')
}

/// Converts a display name into a diagram/canvas id token.
///
/// Whitespace runs become a single `_`, then everything outside `[A-Za-z0-9_]` is dropped.
/// Distinct names may map to the same id (see [`crate::Model::sanitized_id_collisions`]).
pub fn sanitize_id(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut in_ws = false;
    for ch in raw.chars() {
        if ch.is_whitespace() {
            if !in_ws {
                out.push('_');
            }
            in_ws = true;
            continue;
        }
        in_ws = false;
        if ch.is_ascii_alphanumeric() || ch == '_' {
            out.push(ch);
        }
    }
    out
}

/// Escapes a label for embedding inside a double-quoted diagram label.
pub fn escape_label(raw: &str) -> String {
    raw.replace('"', "'").replace('<', "&lt;")
}

/// Keeps printable ASCII (`0x20..=0x7E`) only.
pub fn ascii_strict(raw: &str) -> String {
    raw.chars().filter(|ch| matches!(ch, ' '..='~')).collect()
}

/// `^#[0-9a-fA-F]{6}$`.
pub fn is_strict_hex_color(s: &str) -> bool {
    let Some(rest) = s.strip_prefix('#') else {
        return false;
    };
    rest.len() == 6 && rest.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Normalizes arbitrary input into a lowercase `#rrggbb` color.
///
/// Short hex runs are right-padded by repeating their last digit (`#abc` becomes `#abcccc`);
/// input without any hex digit falls back to [`FALLBACK_COLOR`].
pub fn sanitize_color(raw: &str) -> String {
    if raw.is_empty() {
        return FALLBACK_COLOR.to_string();
    }

    let cleaned: String = raw
        .chars()
        .filter(|&ch| !is_ctrl_character(ch))
        .map(|ch| if is_hash_confusable(ch) { '#' } else { ch })
        .collect();
    let mut s = cleaned.trim().to_string();

    if !s.starts_with('#') && s.len() == 6 && s.bytes().all(|b| b.is_ascii_hexdigit()) {
        s.insert(0, '#');
    }
    s.retain(|ch| ch == '#' || ch.is_ascii_hexdigit());
    if !s.starts_with('#') {
        s.insert(0, '#');
    }

    let mut core: String = s[1..]
        .chars()
        .skip_while(|ch| !ch.is_ascii_hexdigit())
        .take_while(|ch| ch.is_ascii_hexdigit())
        .take(6)
        .collect();
    while core.len() < 6 {
        let pad = core.chars().last().unwrap_or('3');
        core.push(pad);
    }

    let out = format!("#{}", core.to_ascii_lowercase());
    if is_strict_hex_color(&out) {
        out
    } else {
        FALLBACK_COLOR.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_id_collapses_whitespace_and_strips_punctuation() {
        assert_eq!(sanitize_id("Payment API"), "Payment_API");
        assert_eq!(sanitize_id("  a \t b  "), "_a_b_");
        assert_eq!(sanitize_id("Auth-Service (v2)"), "AuthService_v2");
        assert_eq!(sanitize_id("Zürich"), "Zrich");
        assert_eq!(sanitize_id(""), "");
    }

    #[test]
    fn escape_label_replaces_quotes_and_angle_brackets() {
        assert_eq!(escape_label(r#"say "hi" <b>"#), "say 'hi' &lt;b>");
    }

    #[test]
    fn ascii_strict_drops_non_printable() {
        assert_eq!(ascii_strict("a\tb\u{00e9}c~\u{7f}"), "abc~");
    }

    #[test]
    fn sanitize_color_documented_cases() {
        assert_eq!(sanitize_color("ff0000"), "#ff0000");
        assert_eq!(sanitize_color(""), "#333333");
        assert_eq!(sanitize_color("#abc"), "#abcccc");
        assert_eq!(sanitize_color("#ABCDEF"), "#abcdef");
        assert_eq!(sanitize_color("  #12345678 "), "#123456");
        assert_eq!(sanitize_color("not a color"), "#accccc");
        assert_eq!(sanitize_color("zzz"), "#333333");
        assert_eq!(sanitize_color("\u{0007}•00ff00"), "#00ff00");
        assert_eq!(sanitize_color("rgb(1,2,3)"), "#b12333");
    }

    #[test]
    fn sanitize_color_is_total_and_idempotent() {
        let inputs = [
            "", "#", "##", "#0", "°ff", "ß12", "\u{0000}", "red", "#GGGGGG", "12", "#1#2#3",
            "￿", "¶¶¶", "#abcdefabcdef", "  ", "\n#fff\n", "日本", "0x00ff00",
        ];
        for input in inputs {
            let once = sanitize_color(input);
            assert!(is_strict_hex_color(&once), "{input:?} -> {once:?}");
            assert_eq!(once, once.to_ascii_lowercase());
            assert_eq!(sanitize_color(&once), once, "not idempotent for {input:?}");
        }
    }
}

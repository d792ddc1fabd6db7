//! Lightweight structural scanning of contract documents.
//!
//! Contract documents are TypeScript-style sources built from
//! `define<Kind>({ ... })` calls. Nothing here builds a syntax tree; the
//! helpers only track bracket depth while skipping string literals and
//! comments, which is enough to pull object fields and array elements out of
//! a block.
use regex::Regex;
use std::ops::Range;
use std::sync::OnceLock;

/// One `define<Kind>(...)` call found in a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefineBlock<'a> {
    /// Suffix after `define`, e.g. `Command` for `defineCommand`.
    pub kind: &'a str,
    /// Byte range of the whole call, from `define` through the closing paren.
    pub span: Range<usize>,
    /// First argument when it is an object literal, braces included.
    pub object: Option<&'a str>,
}

fn define_call_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\bdefine([A-Z][A-Za-z0-9]*)\s*(?:<[^>()]*>)?\s*\(")
            .expect("regex for define calls")
    })
}

/// Find top-level `define<Kind>(...)` calls in source order.
///
/// Calls nested inside an earlier call are part of that call and are not
/// reported separately.
pub fn define_blocks(content: &str) -> Vec<DefineBlock<'_>> {
    let mut blocks = Vec::new();
    let mut cursor = 0;
    for caps in define_call_regex().captures_iter(content) {
        let (Some(whole), Some(kind)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        if whole.start() < cursor || in_non_code(content, whole.start()) {
            continue;
        }
        let open = whole.end() - 1;
        let Some(close) = matching_close(content, open) else {
            continue;
        };
        let args = &content[open + 1..close];
        let object = args
            .find(|ch: char| !ch.is_whitespace())
            .filter(|&idx| args.as_bytes()[idx] == b'{')
            .and_then(|idx| {
                let start = open + 1 + idx;
                matching_close(content, start).map(|end| &content[start..=end])
            });
        blocks.push(DefineBlock {
            kind: kind.as_str(),
            span: whole.start()..close + 1,
            object,
        });
        cursor = close + 1;
    }
    blocks
}

/// Return the index just past a string literal or comment starting at `i`.
fn skip_non_code(bytes: &[u8], i: usize) -> Option<usize> {
    match bytes[i] {
        quote @ (b'\'' | b'"' | b'`') => {
            let mut j = i + 1;
            while j < bytes.len() {
                match bytes[j] {
                    b'\\' => j += 2,
                    c if c == quote => return Some(j + 1),
                    _ => j += 1,
                }
            }
            Some(bytes.len())
        }
        b'/' if bytes.get(i + 1) == Some(&b'/') => Some(
            bytes[i..]
                .iter()
                .position(|&b| b == b'\n')
                .map(|p| i + p)
                .unwrap_or(bytes.len()),
        ),
        b'/' if bytes.get(i + 1) == Some(&b'*') => Some(
            bytes[i + 2..]
                .windows(2)
                .position(|w| w == b"*/")
                .map(|p| i + 2 + p + 2)
                .unwrap_or(bytes.len()),
        ),
        _ => None,
    }
}

/// Whether byte `pos` sits inside a string literal or comment.
fn in_non_code(text: &str, pos: usize) -> bool {
    let bytes = text.as_bytes();
    let mut i = 0;
    while i < pos {
        match skip_non_code(bytes, i) {
            Some(next) if next > pos => return true,
            Some(next) => i = next,
            None => i += 1,
        }
    }
    false
}

/// Index of the bracket closing the one opened at `open`.
pub fn matching_close(text: &str, open: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    if !matches!(bytes.get(open), Some(b'(' | b'[' | b'{')) {
        return None;
    }
    let mut depth = 0usize;
    let mut i = open;
    while i < bytes.len() {
        if let Some(next) = skip_non_code(bytes, i) {
            i = next;
            continue;
        }
        match bytes[i] {
            b'(' | b'[' | b'{' => depth += 1,
            b')' | b']' | b'}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}

/// Split the inside of a bracketed literal on depth-0 commas.
///
/// `literal` starts with its opening bracket; text after the matching close
/// is ignored. Empty pieces (trailing commas) are dropped.
pub fn split_top_level(literal: &str) -> Vec<&str> {
    let literal = literal.trim_start();
    let Some(close) = matching_close(literal, 0) else {
        return Vec::new();
    };
    let inner = &literal[1..close];
    let bytes = inner.as_bytes();
    let mut pieces = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    let mut i = 0;
    while i < bytes.len() {
        if let Some(next) = skip_non_code(bytes, i) {
            i = next;
            continue;
        }
        match bytes[i] {
            b'(' | b'[' | b'{' => depth += 1,
            b')' | b']' | b'}' => depth = depth.saturating_sub(1),
            b',' if depth == 0 => {
                pieces.push(&inner[start..i]);
                start = i + 1;
            }
            _ => {}
        }
        i += 1;
    }
    pieces.push(&inner[start..]);
    pieces
        .into_iter()
        .map(strip_comments_trim)
        .filter(|piece| !piece.is_empty())
        .collect()
}

fn strip_comments_trim(piece: &str) -> &str {
    let mut rest = piece.trim();
    loop {
        if rest.starts_with("//") {
            rest = rest.find('\n').map(|idx| rest[idx..].trim()).unwrap_or("");
        } else if rest.starts_with("/*") {
            rest = rest.find("*/").map(|idx| rest[idx + 2..].trim()).unwrap_or("");
        } else {
            return rest;
        }
    }
}

/// `text` without leading or trailing comments and whitespace.
fn code_only(text: &str) -> &str {
    let text = strip_comments_trim(text);
    let bytes = text.as_bytes();
    let mut end = 0;
    let mut i = 0;
    while i < bytes.len() {
        let comment = bytes[i] == b'/' && matches!(bytes.get(i + 1), Some(b'/' | b'*'));
        if let Some(next) = skip_non_code(bytes, i) {
            if !comment {
                end = next;
            }
            i = next;
            continue;
        }
        if !bytes[i].is_ascii_whitespace() {
            end = i + 1;
        }
        i += 1;
    }
    &text[..end]
}

/// Depth-0 `name: value` entries of an object literal, in source order.
///
/// Shorthand properties and spreads are skipped.
pub fn object_entries(literal: &str) -> Vec<(String, &str)> {
    if !literal.trim_start().starts_with('{') {
        return Vec::new();
    }
    let mut entries = Vec::new();
    for piece in split_top_level(literal) {
        let bytes = piece.as_bytes();
        let mut i = 0;
        let mut colon = None;
        while i < bytes.len() {
            if let Some(next) = skip_non_code(bytes, i) {
                i = next;
                continue;
            }
            if bytes[i] == b':' {
                colon = Some(i);
                break;
            }
            i += 1;
        }
        let Some(colon) = colon else {
            continue;
        };
        let name = unquote(piece[..colon].trim());
        entries.push((name.to_string(), code_only(&piece[colon + 1..])));
    }
    entries
}

/// Value text of a depth-0 field of an object literal.
pub fn object_field<'a>(literal: &'a str, name: &str) -> Option<&'a str> {
    object_entries(literal)
        .into_iter()
        .find(|(field, _)| field == name)
        .map(|(_, value)| value)
}

/// Field value as a string when it is a string or numeric literal.
pub fn string_field(literal: &str, name: &str) -> Option<String> {
    object_field(literal, name).and_then(scalar_value)
}

/// Interpret a value as a string or numeric literal.
pub fn scalar_value(value: &str) -> Option<String> {
    let value = value.trim();
    let value = value.strip_suffix("as const").map(str::trim).unwrap_or(value);
    let bytes = value.as_bytes();
    if bytes.len() >= 2 {
        let first = bytes[0];
        if matches!(first, b'\'' | b'"' | b'`') && bytes[bytes.len() - 1] == first {
            return Some(value[1..value.len() - 1].to_string());
        }
    }
    if !value.is_empty()
        && value.chars().all(|ch| ch.is_ascii_digit() || ch == '.')
        && value.chars().next().is_some_and(|ch| ch.is_ascii_digit())
    {
        return Some(value.to_string());
    }
    None
}

fn unquote(name: &str) -> &str {
    let bytes = name.as_bytes();
    if bytes.len() >= 2 && matches!(bytes[0], b'\'' | b'"') && bytes[bytes.len() - 1] == bytes[0] {
        &name[1..name.len() - 1]
    } else {
        name
    }
}

/// The object holding identity fields: `meta` when present, else the object itself.
pub fn identity_object(object: &str) -> &str {
    object_field(object, "meta")
        .filter(|meta| meta.starts_with('{'))
        .unwrap_or(object)
}

/// Byte offset of `inner` within `outer` when `inner` is a subslice of it.
pub fn subslice_offset(outer: &str, inner: &str) -> Option<usize> {
    let start = (inner.as_ptr() as usize).checked_sub(outer.as_ptr() as usize)?;
    (start + inner.len() <= outer.len()).then_some(start)
}

/// Element texts of an array literal; empty when `value` is not an array.
pub fn array_elements(value: &str) -> Vec<&str> {
    if !value.trim_start().starts_with('[') {
        return Vec::new();
    }
    split_top_level(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
import { defineCommand } from '@contracts/lib';

// defineEvent({ meta: { key: 'commented.out' } })
export const Charge = defineCommand({
  meta: {
    key: 'billing.charge',
    version: 2,
    description: "Charges (a customer), with {braces}",
  },
  io: { input: ChargeInput },
});

export const Charged = defineEvent<Payload>({ meta: { key: "billing.charged", version: '1' } });
"#;

    #[test]
    fn define_blocks_skips_comments_and_strings() {
        let blocks = define_blocks(SAMPLE);
        let kinds: Vec<&str> = blocks.iter().map(|block| block.kind).collect();
        assert_eq!(kinds, vec!["Command", "Event"]);
        assert!(blocks.iter().all(|block| block.object.is_some()));
    }

    #[test]
    fn nested_object_fields_are_reachable() {
        let blocks = define_blocks(SAMPLE);
        let object = blocks[0].object.unwrap();
        let meta = object_field(object, "meta").unwrap();
        assert_eq!(string_field(meta, "key").as_deref(), Some("billing.charge"));
        assert_eq!(string_field(meta, "version").as_deref(), Some("2"));
        assert!(string_field(meta, "description")
            .unwrap()
            .contains("{braces}"));
        assert_eq!(string_field(object, "key"), None);
    }

    #[test]
    fn array_elements_split_on_top_level_commas_only() {
        let value = "[ { key: 'a', version: '1' }, // trailing note\n { version: 2, key: \"b\" }, ]";
        let elements = array_elements(value);
        assert_eq!(elements.len(), 2);
        assert_eq!(string_field(elements[1], "key").as_deref(), Some("b"));
    }

    #[test]
    fn matching_close_rejects_unbalanced_input() {
        assert_eq!(matching_close("{ a: [1, 2 }", 0), None);
        assert_eq!(matching_close("(a)", 0), Some(2));
        assert_eq!(matching_close("x", 0), None);
    }

    #[test]
    fn subslice_offset_locates_borrowed_pieces() {
        let value = "[{ key: 'a' }, { key: 'b' }]";
        let elements = array_elements(value);
        assert_eq!(subslice_offset(value, elements[1]), Some(15));
        let copy = elements[1].to_string();
        assert_eq!(subslice_offset(value, &copy), None);
    }

    #[test]
    fn scalar_value_handles_numbers_and_quotes() {
        assert_eq!(scalar_value("'1.0'").as_deref(), Some("1.0"));
        assert_eq!(scalar_value("3").as_deref(), Some("3"));
        assert_eq!(scalar_value("'beta' as const").as_deref(), Some("beta"));
        assert_eq!(scalar_value("SOME_CONST"), None);
    }

    #[test]
    fn trailing_comment_after_last_field_is_ignored() {
        let meta = "{ key: 'billing.charge', version: '2' // bumped for v2 payload\n }";
        assert_eq!(string_field(meta, "version").as_deref(), Some("2"));
        let block = "{ key: 'a', version: 3 /* was 2 */ }";
        assert_eq!(string_field(block, "version").as_deref(), Some("3"));
    }

    #[test]
    fn non_ascii_trailing_comment_does_not_split_characters() {
        let feature = "{ operations: [{ key: 'a', version: '1' }] // café\n}";
        let operations = object_field(feature, "operations").unwrap();
        assert_eq!(operations, "[{ key: 'a', version: '1' }]");
        let elements = array_elements("[{ key: 'a' }] // café");
        assert_eq!(elements, vec!["{ key: 'a' }"]);
        assert!(array_elements("[{ key: 'a' } // café").is_empty());
    }
}

//! Extraction of the JSON blobs YouTube embeds in its HTML pages.

use serde_json::Value;

/// Return the balanced `{...}` object that starts at the first `{` at or after `from`.
///
/// Braces inside JSON strings are ignored.
pub fn balanced_object(source: &str, from: usize) -> Option<&str> {
    let rest = source.get(from..)?;
    let open = rest.find('{')?;
    let bytes = rest.as_bytes();

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate().skip(open) {
        if in_string {
            match b {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return rest.get(open..=i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Find every JSON object assigned to `name` (`name = {...}` or `"name": {...}`)
/// and return the first one accepted by `accept`.
fn find_assigned(html: &str, name: &str, accept: impl Fn(&Value) -> bool) -> Option<Value> {
    let mut search_from = 0;
    while let Some(pos) = html.get(search_from..).and_then(|s| s.find(name)) {
        let anchor_end = search_from + pos + name.len();
        search_from = anchor_end;

        // Only assignment punctuation may sit between the name and the object.
        let gap_ok = html
            .get(anchor_end..)
            .map(|rest| {
                rest.chars()
                    .take_while(|c| *c != '{')
                    .all(|c| matches!(c, '=' | ':' | '"' | '\'' | ']') || c.is_whitespace())
            })
            .unwrap_or(false);
        if !gap_ok {
            continue;
        }

        if let Some(raw) = balanced_object(html, anchor_end) {
            if let Ok(value) = serde_json::from_str::<Value>(raw) {
                if accept(&value) {
                    return Some(value);
                }
            }
        }
    }
    None
}

/// `ytInitialData`, present on playlist, search and channel pages.
pub fn initial_data(html: &str) -> Option<Value> {
    find_assigned(html, "ytInitialData", |v| v.is_object())
}

/// `ytInitialPlayerResponse`, present on watch pages.
pub fn player_response(html: &str) -> Option<Value> {
    find_assigned(html, "ytInitialPlayerResponse", |v| {
        v.get("videoDetails").is_some() || v.get("captions").is_some()
    })
}

/// Text from a `{simpleText}` or `{runs:[{text}]}` node.
pub fn text_from_runs(node: &Value) -> String {
    if let Some(simple) = node.get("simpleText").and_then(Value::as_str) {
        return simple.to_string();
    }
    node.get("runs")
        .and_then(Value::as_array)
        .map(|runs| {
            runs.iter()
                .filter_map(|r| r.get("text").and_then(Value::as_str))
                .collect()
        })
        .unwrap_or_default()
}

/// Collect every value stored under `key`, depth first.
pub fn find_key<'a>(value: &'a Value, key: &str) -> Vec<&'a Value> {
    let mut found = Vec::new();
    collect_key(value, key, &mut found);
    found
}

fn collect_key<'a>(value: &'a Value, key: &str, out: &mut Vec<&'a Value>) {
    match value {
        Value::Object(map) => {
            if let Some(v) = map.get(key) {
                out.push(v);
            }
            for v in map.values() {
                collect_key(v, key, out);
            }
        }
        Value::Array(items) => {
            for v in items {
                collect_key(v, key, out);
            }
        }
        _ => {}
    }
}

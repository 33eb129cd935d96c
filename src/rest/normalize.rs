/*
 * Copyright (c) 2025 Craig Hamilton and Contributors.
 * Licensed under either of
 *  - Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0> OR
 *  - MIT license <http://opensource.org/licenses/MIT>
 *  at your option.
 */
use serde_json::{Map, Value};

// Flickr wraps plain values in single-key `{"_content": ...}` envelopes so
// they can carry attributes elsewhere in the tree.
const CONTENT_KEY: &str = "_content";
const TEXT_KEY: &str = "text";

/// Cleans out recursively the `_content` envelopes coming from the JSON
/// response.
///
/// An object whose only key is `_content` is replaced by its value. In any
/// other object a `_content` key is renamed to `text`. Arrays are cleaned
/// element-wise and scalars pass through unchanged. The transform is
/// idempotent.
pub fn clean_content(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            if map.len() == 1 && map.contains_key(CONTENT_KEY) {
                let inner = map.into_iter().next().map(|(_, v)| v);
                return match inner {
                    Some(v) => clean_content(v),
                    None => Value::Null,
                };
            }
            let mut cleaned = Map::new();
            for (k, v) in map {
                let k = if k == CONTENT_KEY {
                    TEXT_KEY.to_string()
                } else {
                    k
                };
                cleaned.insert(k, clean_content(v));
            }
            Value::Object(cleaned)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(clean_content).collect()),
        scalar => scalar,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn collapses_lone_content_envelope() {
        assert_eq!(clean_content(json!({"_content": "hello"})), json!("hello"));
        assert_eq!(clean_content(json!({"_content": 42})), json!(42));
    }

    #[test]
    fn collapses_nested_envelopes() {
        let v = json!({"_content": {"_content": "deep"}});
        assert_eq!(clean_content(v), json!("deep"));
    }

    #[test]
    fn renames_content_key_next_to_siblings() {
        let v = json!({"_content": "a title", "id": 3});
        assert_eq!(clean_content(v), json!({"text": "a title", "id": 3}));
    }

    #[test]
    fn cleans_arrays_preserving_order() {
        let v = json!([{"_content": 1}, {"_content": 2}, "x"]);
        assert_eq!(clean_content(v), json!([1, 2, "x"]));
    }

    #[test]
    fn scalars_pass_through() {
        assert_eq!(clean_content(json!(null)), json!(null));
        assert_eq!(clean_content(json!(true)), json!(true));
        assert_eq!(clean_content(json!("s")), json!("s"));
        assert_eq!(clean_content(json!(1.5)), json!(1.5));
    }

    #[test]
    fn cleaning_is_idempotent() {
        let v = json!({
            "photos": {
                "photo": [
                    {"title": {"_content": "one"}, "visibility": {"_content": 1, "public": true}},
                    {"title": {"_content": "two"}}
                ],
                "total": {"_content": 2}
            }
        });
        let once = clean_content(v);
        let twice = clean_content(once.clone());
        assert_eq!(once, twice);
        assert_eq!(once["photos"]["photo"][0]["title"], json!("one"));
        assert_eq!(
            once["photos"]["photo"][0]["visibility"],
            json!({"text": 1, "public": true})
        );
        assert_eq!(once["photos"]["total"], json!(2));
    }
}

//! `application/x-www-form-urlencoded` with bracketed keys.
//!
//! Keys may nest with brackets: `user[name]=a` decodes to `{"user": {"name": "a"}}`
//! and `tag[]=a&tag[]=b` to `{"tag": ["a", "b"]}`. A repeated plain key keeps the
//! last value. Encoding reverses this, writing arrays with numeric indexes.

use serde_json::{Map, Value};

use crate::protocol::MessageError;

/// A decoded parameter tree.
pub type Params = Map<String, Value>;

/// Decode a form-urlencoded string.
pub fn parse_form(input: &str) -> Result<Params, MessageError> {
    let pairs: Vec<(String, String)> = serde_urlencoded::from_str(input).map_err(MessageError::deserialize)?;

    let mut params = Params::new();
    for (key, value) in pairs {
        let (base, segments) = split_key(&key);
        if base.is_empty() {
            continue;
        }

        let slot = params.entry(base).or_insert(Value::Null);
        insert_value(slot, &segments, value);
    }

    Ok(params)
}

fn split_key(key: &str) -> (&str, Vec<&str>) {
    let Some(open) = key.find('[') else {
        return (key, Vec::new());
    };

    let mut segments = Vec::new();
    let mut rest = &key[open..];
    while let Some(stripped) = rest.strip_prefix('[') {
        let Some(close) = stripped.find(']') else {
            break;
        };
        segments.push(&stripped[..close]);
        rest = &stripped[close + 1..];
    }

    (&key[..open], segments)
}

/// One past the largest integer key of `map`, or 0 when it has none.
fn next_index(map: &Map<String, Value>) -> u64 {
    map.keys()
        .filter_map(|key| key.parse::<u64>().ok().filter(|index| index.to_string() == *key))
        .max()
        .map_or(0, |index| index + 1)
}

fn insert_value(slot: &mut Value, segments: &[&str], value: String) {
    let Some((segment, rest)) = segments.split_first() else {
        *slot = Value::String(value);
        return;
    };

    match slot {
        Value::Array(items) if !segment.is_empty() => {
            let map = std::mem::take(items).into_iter().enumerate().map(|(index, item)| (index.to_string(), item)).collect();
            *slot = Value::Object(map);
        }
        Value::Array(_) | Value::Object(_) => {}
        _ if segment.is_empty() => *slot = Value::Array(Vec::new()),
        _ => *slot = Value::Object(Map::new()),
    }

    let child = match slot {
        Value::Array(items) => {
            items.push(Value::Null);
            items.last_mut()
        }
        Value::Object(map) => {
            let key = if segment.is_empty() { next_index(map).to_string() } else { (*segment).to_string() };
            Some(map.entry(key).or_insert(Value::Null))
        }
        _ => None,
    };

    if let Some(child) = child {
        insert_value(child, rest, value);
    }
}

/// Encode a parameter tree. Nulls are skipped, booleans become `1` and `0`.
pub fn build_form(params: &Params) -> Result<String, MessageError> {
    let mut pairs = Vec::new();
    for (key, value) in params {
        flatten(key.clone(), value, &mut pairs);
    }
    serde_urlencoded::to_string(pairs).map_err(MessageError::encode)
}

fn flatten(prefix: String, value: &Value, pairs: &mut Vec<(String, String)>) {
    match value {
        Value::Null => {}
        Value::Bool(b) => pairs.push((prefix, if *b { "1" } else { "0" }.to_string())),
        Value::Number(n) => pairs.push((prefix, n.to_string())),
        Value::String(s) => pairs.push((prefix, s.clone())),
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                flatten(format!("{prefix}[{index}]"), item, pairs);
            }
        }
        Value::Object(map) => {
            for (key, item) in map {
                flatten(format!("{prefix}[{key}]"), item, pairs);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(input: &str) -> Value {
        Value::Object(parse_form(input).unwrap())
    }

    #[test]
    fn test_flat_pairs() {
        assert_eq!(parse("name=Capsule&version=1.1&empty="), json!({"name": "Capsule", "version": "1.1", "empty": ""}));
        assert_eq!(parse("greeting=hello+world%21"), json!({"greeting": "hello world!"}));
        assert_eq!(parse(""), json!({}));
    }

    #[test]
    fn test_last_value_wins() {
        assert_eq!(parse("a=1&a=2"), json!({"a": "2"}));
    }

    #[test]
    fn test_nested_keys() {
        assert_eq!(
            parse("user[name]=Ada&user[roles][]=admin&user[roles][]=dev&tags[]=x"),
            json!({"user": {"name": "Ada", "roles": ["admin", "dev"]}, "tags": ["x"]})
        );
        assert_eq!(parse("user%5Bname%5D=Ada"), json!({"user": {"name": "Ada"}}));
    }

    #[test]
    fn test_mixed_keys() {
        assert_eq!(parse("a[]=x&a[key]=y"), json!({"a": {"0": "x", "key": "y"}}));
        assert_eq!(parse("a[key]=y&a[]=x"), json!({"a": {"key": "y", "0": "x"}}));
        assert_eq!(parse("a[1]=x&a[]=y"), json!({"a": {"1": "x", "2": "y"}}));
        assert_eq!(parse("a[]=x&a[5]=y&a[]=z"), json!({"a": {"0": "x", "5": "y", "6": "z"}}));
        assert_eq!(parse("a[01]=x&a[]=y"), json!({"a": {"01": "x", "0": "y"}}));
        assert_eq!(parse("a=plain&a[b]=nested"), json!({"a": {"b": "nested"}}));
    }

    #[test]
    fn test_keys_without_base_are_skipped() {
        assert_eq!(parse("[x]=1&=2&ok=3"), json!({"ok": "3"}));
    }

    #[test]
    fn test_build_form() {
        let params = json!({
            "name": "Capsule",
            "active": true,
            "count": 3,
            "missing": null,
            "tags": ["a", "b"],
            "owner": {"name": "Ada Lovelace"}
        });
        let Value::Object(params) = params else { unreachable!() };

        let encoded = build_form(&params).unwrap();
        assert_eq!(
            encoded,
            "name=Capsule&active=1&count=3&tags%5B0%5D=a&tags%5B1%5D=b&owner%5Bname%5D=Ada+Lovelace"
        );

        assert_eq!(
            parse(&encoded),
            json!({"name": "Capsule", "active": "1", "count": "3", "tags": {"0": "a", "1": "b"}, "owner": {"name": "Ada Lovelace"}})
        );
    }
}

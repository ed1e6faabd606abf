//! Walks a JSON schema and produces a random value that conforms to it.

use base64::Engine;
use chrono::{DateTime, SecondsFormat};
use rand::seq::IndexedRandom;
use rand::Rng;
use serde_json::{Map, Number, Value};
use swagger_faker_spec::ApiDocument;

use crate::constraints::Constraints;
use crate::error::GenerateError;

/// Nesting depth after which the walker emits `null` (breaks recursive
/// schemas such as trees).
const MAX_DEPTH: usize = 8;

/// Unique-item arrays give up after this many draws per requested item.
const UNIQUE_ATTEMPTS_PER_ITEM: usize = 10;

/// Hard ceiling on generated array lengths, whatever the constraints ask for.
pub const MAX_ARRAY_ITEMS: i64 = 1000;

/// Hard ceiling on generated string lengths, in bytes.
pub const MAX_STRING_LENGTH: i64 = 64 * 1024;

/// 2000-01-01T00:00:00Z .. 2030-01-01T00:00:00Z
const EARLIEST_TIMESTAMP: i64 = 946_684_800;
const LATEST_TIMESTAMP: i64 = 1_893_456_000;

const WORDS: &[&str] = &[
    "lorem", "ipsum", "dolor", "sit", "amet", "consectetur", "adipiscing", "elit", "sed", "do",
    "eiusmod", "tempor", "incididunt", "ut", "labore", "et", "dolore", "magna", "aliqua", "enim",
    "ad", "minim", "veniam", "quis", "nostrud", "exercitation", "ullamco", "laboris", "nisi",
    "aliquip", "ex", "ea", "commodo", "consequat", "duis", "aute", "irure", "in", "voluptate",
];

const TLDS: &[&str] = &["com", "net", "org", "io"];

const ALPHANUMERIC: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// A schema walker bound to one document, one constraint record and one RNG.
pub struct Faker<'a, R> {
    document: &'a ApiDocument,
    constraints: &'a Constraints,
    rng: R,
}

impl<'a, R: Rng> Faker<'a, R> {
    pub fn new(document: &'a ApiDocument, constraints: &'a Constraints, rng: R) -> Self {
        Self {
            document,
            constraints,
            rng,
        }
    }

    /// Generate a value for `schema`.
    pub fn fake(&mut self, schema: &Value) -> Result<Value, GenerateError> {
        self.walk(schema, 0)
    }

    fn walk(&mut self, schema: &Value, depth: usize) -> Result<Value, GenerateError> {
        if depth > MAX_DEPTH {
            return Ok(Value::Null);
        }
        let Some(obj) = schema.as_object() else {
            return Ok(Value::Null);
        };

        if let Some(reference) = obj.get("$ref").and_then(Value::as_str) {
            let target = self.document.resolve_ref(reference)?;
            return self.walk(target, depth + 1);
        }

        if let Some(choices) = obj.get("enum").and_then(Value::as_array) {
            if let Some(choice) = choices.choose(&mut self.rng) {
                return Ok(choice.clone());
            }
        }

        if let Some(parts) = obj.get("allOf").and_then(Value::as_array) {
            return self.all_of(parts, depth);
        }

        for keyword in ["oneOf", "anyOf"] {
            if let Some(branches) = obj.get(keyword).and_then(Value::as_array) {
                if let Some(branch) = branches.choose(&mut self.rng) {
                    return self.walk(branch, depth + 1);
                }
            }
        }

        match schema_type(obj) {
            "object" => self.object(obj, depth),
            "array" => self.array(obj, depth),
            "integer" => Ok(Value::from(self.integer(obj))),
            "number" => Ok(self.number(obj)),
            "boolean" => Ok(Value::Bool(self.rng.random())),
            "null" => Ok(Value::Null),
            _ => Ok(Value::String(self.string(obj))),
        }
    }

    /// Merge the members of every object-producing part; a non-object part
    /// wins only when no part produces an object.
    fn all_of(&mut self, parts: &[Value], depth: usize) -> Result<Value, GenerateError> {
        let mut merged: Option<Map<String, Value>> = None;
        let mut last = Value::Null;

        for part in parts {
            match self.walk(part, depth + 1)? {
                Value::Object(members) => merged.get_or_insert_with(Map::new).extend(members),
                other => last = other,
            }
        }

        Ok(merged.map(Value::Object).unwrap_or(last))
    }

    fn object(&mut self, obj: &Map<String, Value>, depth: usize) -> Result<Value, GenerateError> {
        let mut out = Map::new();
        let Some(properties) = obj.get("properties").and_then(Value::as_object) else {
            return Ok(Value::Object(out));
        };

        let required: Vec<&str> = obj
            .get("required")
            .and_then(Value::as_array)
            .map(|names| names.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default();
        let chance = self.constraints.chance_required.clamp(0, 100);

        for (name, property) in properties {
            let include =
                required.contains(&name.as_str()) || self.rng.random_range(0..100) < chance;
            if include {
                out.insert(name.clone(), self.walk(property, depth + 1)?);
            }
        }

        Ok(Value::Object(out))
    }

    fn array(&mut self, obj: &Map<String, Value>, depth: usize) -> Result<Value, GenerateError> {
        let lower = int_keyword(obj, "minItems")
            .unwrap_or(0)
            .max(self.constraints.min_items)
            .clamp(0, MAX_ARRAY_ITEMS);
        let upper = int_keyword(obj, "maxItems")
            .map_or(self.constraints.max_items, |max| max.min(self.constraints.max_items))
            .clamp(lower, MAX_ARRAY_ITEMS);
        let count = usize::try_from(self.rng.random_range(lower..=upper)).unwrap_or(0);

        let unique = obj.get("uniqueItems").and_then(Value::as_bool).unwrap_or(false)
            || self.constraints.unique_items;

        let default_items = Value::Object(Map::new());
        let items = obj.get("items").unwrap_or(&default_items);

        let mut out: Vec<Value> = Vec::new();
        let mut attempts = count.saturating_mul(UNIQUE_ATTEMPTS_PER_ITEM);
        while out.len() < count {
            let item = self.walk(items, depth + 1)?;
            if unique && out.contains(&item) {
                if attempts == 0 {
                    break;
                }
                attempts -= 1;
                continue;
            }
            out.push(item);
        }

        Ok(Value::Array(out))
    }

    fn integer(&mut self, obj: &Map<String, Value>) -> i64 {
        let (minimum, maximum) = self.numeric_bounds(obj);
        let mut minimum = minimum.ceil() as i64;
        let mut maximum = maximum.floor() as i64;
        if exclusive(obj, "exclusiveMinimum", "minimum") {
            minimum = minimum.saturating_add(1);
        }
        if exclusive(obj, "exclusiveMaximum", "maximum") {
            maximum = maximum.saturating_sub(1);
        }
        if maximum < minimum {
            return minimum;
        }

        let step = int_keyword(obj, "multipleOf")
            .unwrap_or(self.constraints.multiple_of)
            .max(1);
        let low = div_ceil(minimum, step);
        let high = maximum.div_euclid(step);
        if high < low {
            return minimum;
        }

        self.rng.random_range(low..=high).saturating_mul(step)
    }

    fn number(&mut self, obj: &Map<String, Value>) -> Value {
        let (minimum, maximum) = self.numeric_bounds(obj);
        let value = if maximum > minimum && (maximum - minimum).is_finite() {
            self.rng.random_range(minimum..=maximum)
        } else {
            minimum
        };

        let value = match obj.get("multipleOf").and_then(Value::as_f64) {
            Some(step) if step > 0.0 => {
                let snapped = (value / step).floor() * step;
                if snapped < minimum { snapped + step } else { snapped }
            }
            _ => (value * 100.0).round() / 100.0,
        };

        Number::from_f64(value).map_or(Value::Null, Value::Number)
    }

    /// Schema bounds where present, constraint bounds otherwise. The
    /// OpenAPI 3.1 numeric form of `exclusiveMinimum`/`exclusiveMaximum`
    /// counts as a bound too.
    fn numeric_bounds(&self, obj: &Map<String, Value>) -> (f64, f64) {
        let minimum = obj
            .get("minimum")
            .or_else(|| obj.get("exclusiveMinimum").filter(|v| v.is_number()))
            .and_then(Value::as_f64)
            .unwrap_or(self.constraints.minimum as f64);
        let maximum = obj
            .get("maximum")
            .or_else(|| obj.get("exclusiveMaximum").filter(|v| v.is_number()))
            .and_then(Value::as_f64)
            .unwrap_or(self.constraints.maximum as f64);
        (minimum, maximum)
    }

    fn string(&mut self, obj: &Map<String, Value>) -> String {
        match obj.get("format").and_then(Value::as_str) {
            Some("date-time") => self
                .timestamp()
                .to_rfc3339_opts(SecondsFormat::Secs, true),
            Some("date") => self.timestamp().format("%Y-%m-%d").to_string(),
            Some("email") => format!(
                "{}.{}@example.{}",
                self.word(),
                self.word(),
                self.pick(TLDS)
            ),
            Some("uuid") => uuid::Builder::from_random_bytes(self.rng.random())
                .into_uuid()
                .to_string(),
            Some("uri") | Some("url") => {
                format!("https://{}.example.com/{}", self.word(), self.word())
            }
            Some("hostname") => format!("{}.example.{}", self.word(), self.pick(TLDS)),
            Some("ipv4") => {
                let octets: [u8; 4] = self.rng.random();
                std::net::Ipv4Addr::from(octets).to_string()
            }
            Some("ipv6") => {
                let segments: [u16; 8] = self.rng.random();
                std::net::Ipv6Addr::from(segments).to_string()
            }
            Some("byte") => {
                let bytes: [u8; 12] = self.rng.random();
                base64::engine::general_purpose::STANDARD.encode(bytes)
            }
            Some("password") => {
                let len = self.string_length(obj).max(8);
                (0..len)
                    .map(|_| char::from(*self.pick(ALPHANUMERIC)))
                    .collect()
            }
            _ => {
                let len = self.string_length(obj);
                self.text(len)
            }
        }
    }

    /// Target length inside both the schema's and the constraint's bounds.
    fn string_length(&mut self, obj: &Map<String, Value>) -> usize {
        let lower = int_keyword(obj, "minLength")
            .unwrap_or(0)
            .max(self.constraints.min_length)
            .clamp(0, MAX_STRING_LENGTH);
        let upper = int_keyword(obj, "maxLength")
            .map_or(self.constraints.max_length, |max| {
                max.min(self.constraints.max_length)
            })
            .clamp(lower, MAX_STRING_LENGTH);
        usize::try_from(self.rng.random_range(lower..=upper)).unwrap_or(0)
    }

    /// Lorem text of exactly `len` ASCII characters, never ending in a space.
    fn text(&mut self, len: usize) -> String {
        let mut text = String::new();
        while text.len() < len {
            if !text.is_empty() {
                text.push(' ');
            }
            let word = self.word();
            text.push_str(word);
        }
        text.truncate(len);
        if text.ends_with(' ') {
            text.pop();
            text.push('a');
        }
        text
    }

    fn timestamp(&mut self) -> DateTime<chrono::Utc> {
        let secs = self.rng.random_range(EARLIEST_TIMESTAMP..LATEST_TIMESTAMP);
        DateTime::from_timestamp(secs, 0).unwrap_or_default()
    }

    fn word(&mut self) -> &'static str {
        *self.pick(WORDS)
    }

    fn pick<T>(&mut self, items: &'static [T]) -> &'static T {
        // Callers only pass non-empty constant tables.
        &items[self.rng.random_range(0..items.len())]
    }
}

/// The schema's `type`, inferring `object`/`array` from `properties`/`items`
/// when absent. For a type list (`["string", "null"]`) the first non-null
/// entry wins.
fn schema_type(obj: &Map<String, Value>) -> &str {
    match obj.get("type") {
        Some(Value::String(ty)) => ty.as_str(),
        Some(Value::Array(types)) => types
            .iter()
            .filter_map(Value::as_str)
            .find(|ty| *ty != "null")
            .unwrap_or("null"),
        _ if obj.contains_key("properties") => "object",
        _ if obj.contains_key("items") => "array",
        _ => "string",
    }
}

fn int_keyword(obj: &Map<String, Value>, keyword: &str) -> Option<i64> {
    let value = obj.get(keyword)?;
    value
        .as_i64()
        .or_else(|| value.as_f64().map(|f| f as i64))
}

/// Whether the bound named by `inclusive` is exclusive: either the boolean
/// form (Swagger 2.0, OpenAPI 3.0) or the numeric form (OpenAPI 3.1) standing
/// in for a missing inclusive bound.
fn exclusive(obj: &Map<String, Value>, keyword: &str, inclusive: &str) -> bool {
    match obj.get(keyword) {
        Some(Value::Bool(flag)) => *flag,
        Some(value) if value.is_number() => !obj.contains_key(inclusive),
        _ => false,
    }
}

fn div_ceil(value: i64, step: i64) -> i64 {
    let quotient = value.div_euclid(step);
    if value.rem_euclid(step) == 0 {
        quotient
    } else {
        quotient + 1
    }
}

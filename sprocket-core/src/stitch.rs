use crate::Value;
use std::collections::HashMap;

/// Key of a parent or child, normalized so that the same number read through
/// different integral types matches.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeyValue {
    Integer(i128),
    Text(String),
    Uuid(uuid::Uuid),
    Boolean(bool),
    /// Any other non null value, by its text form.
    Other(String),
}

impl KeyValue {
    /// `None` for nulls, which never match anything.
    pub fn from_value(value: &Value) -> Option<KeyValue> {
        if value.is_null() {
            return None;
        }
        if let Some(v) = value.as_i128() {
            return Some(KeyValue::Integer(v));
        }
        Some(match value {
            Value::Varchar(Some(v)) => KeyValue::Text(v.clone()),
            Value::Uuid(Some(v)) => KeyValue::Uuid(*v),
            Value::Boolean(Some(v)) => KeyValue::Boolean(*v),
            v => KeyValue::Other(v.to_string()),
        })
    }
}

/// Attaches `children` to `parents`.
///
/// Children are grouped by foreign key keeping the order they were read in, each
/// parent receives the group matching its key through `assign`, or an empty
/// collection. Children without a parent are dropped. When several parents share a
/// key the first one takes the group.
pub fn stitch<P, C>(
    parents: &mut [P],
    parent_key: impl Fn(&P) -> Option<Value>,
    children: Vec<C>,
    foreign_key: impl Fn(&C) -> Option<Value>,
    mut assign: impl FnMut(&mut P, Vec<C>),
) {
    let total = children.len();
    let mut groups: HashMap<KeyValue, Vec<C>> = HashMap::new();
    let mut unkeyed = 0;
    for child in children {
        match foreign_key(&child).as_ref().and_then(KeyValue::from_value) {
            Some(key) => groups.entry(key).or_default().push(child),
            None => unkeyed += 1,
        }
    }
    for parent in parents.iter_mut() {
        let group = parent_key(parent)
            .as_ref()
            .and_then(KeyValue::from_value)
            .and_then(|key| groups.remove(&key))
            .unwrap_or_default();
        assign(parent, group);
    }
    let orphans = unkeyed + groups.values().map(Vec::len).sum::<usize>();
    if orphans > 0 {
        log::debug!("{orphans} of {total} children have no matching parent and were dropped");
    }
}

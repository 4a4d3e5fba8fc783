//! Unit tests for ck-core primitives.

#[cfg(test)]
mod ids {
    use crate::EntityAllocator;

    #[test]
    fn monotonic_until_recycled() {
        let mut alloc = EntityAllocator::new();
        let a = alloc.alloc();
        let b = alloc.alloc();
        assert!(a.0 < b.0);

        alloc.despawn(a);
        let c = alloc.alloc();
        // Not recycled yet: c is fresh, not a's old id.
        assert_ne!(c, a);

        alloc.recycle();
        let d = alloc.alloc();
        assert_eq!(d, a);
    }

    #[test]
    fn ids_start_at_one() {
        let mut alloc = EntityAllocator::new();
        assert_eq!(alloc.alloc().0, 1);
    }
}

#[cfg(test)]
mod value {
    use crate::value::{value_from_json, value_to_json};
    use crate::Value;

    #[test]
    fn json_roundtrip() {
        let j = serde_json::json!({
            "a": 1,
            "b": [1, 2.5, "x", null, true],
            "c": {"nested": "yes"}
        });
        let v = value_from_json(&j);
        let back = value_to_json(&v);
        assert_eq!(j, back);
    }

    #[test]
    fn map_accessors() {
        let v = Value::object([("x", Value::Int(1)), ("y", Value::Int(2))]);
        assert_eq!(v.get("x").and_then(Value::as_i64), Some(1));
        assert_eq!(v.get("z"), None);
    }

    #[test]
    fn type_names() {
        assert_eq!(Value::Null.type_name(), "null");
        assert_eq!(Value::Seq(vec![]).type_name(), "array");
    }
}

#[cfg(test)]
mod time {
    use crate::Turn;

    #[test]
    fn turn_advances() {
        let t = Turn::ZERO;
        assert_eq!(t.next(), Turn(1));
    }
}

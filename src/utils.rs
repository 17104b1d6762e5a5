use serde::Serializer;
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

#[inline]
pub fn next_trace_id() -> String {
    if cfg!(feature = "__testing") {
        counted_id("trace")
    } else {
        Uuid::new_v4().to_string()
    }
}

#[inline]
pub fn next_span_id() -> String {
    if cfg!(feature = "__testing") {
        counted_id("span")
    } else {
        Uuid::new_v4().to_string()
    }
}

// Deterministic ids for integration tests: trace_1, span_1, span_2, ...
fn counted_id(kind: &'static str) -> String {
    use std::cell::RefCell;
    use std::collections::HashMap;

    thread_local! {
        static COUNTS: RefCell<HashMap<&'static str, u32>> = RefCell::new(HashMap::new());
    }

    COUNTS.with(|counts| {
        let mut counts = counts.borrow_mut();
        let count = counts.entry(kind).or_insert(0);
        *count += 1;
        format!("{}_{}", kind, count)
    })
}

#[inline]
pub fn now() -> SystemTime {
    if cfg!(feature = "__testing") {
        UNIX_EPOCH
    } else {
        SystemTime::now()
    }
}

#[inline]
pub fn serialize_millis<S>(time: &SystemTime, s: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    if let Ok(duration) = time.duration_since(UNIX_EPOCH) {
        s.serialize_u64(duration.as_millis() as u64)
    } else {
        s.serialize_none()
    }
}

//! Compact JSON encoding for embedding values in rendered output

use crate::types::{ReportError, Result};
use serde::Serialize;

/// Encode a value as compact JSON, or return an empty string if it cannot be encoded
pub fn to_json<T: Serialize + ?Sized>(value: &T) -> String {
    match serde_json::to_string(value) {
        Ok(json) => json,
        Err(e) => {
            log::warn!("JSON encoding failed, substituting empty string: {}", e);
            String::new()
        }
    }
}

/// Encode a value as compact JSON, reporting encoding failures
pub fn try_to_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(|e| ReportError::JsonEncode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Bucket;
    use std::collections::HashMap;

    #[test]
    fn test_to_json_compact() {
        assert_eq!(to_json(&Bucket::new(0.5, 3)), r#"{"Mark":0.5,"Count":3}"#);
        assert_eq!(to_json(&vec![1, 2, 3]), "[1,2,3]");
        assert_eq!(to_json("a\"b"), r#""a\"b""#);
    }

    #[test]
    fn test_unencodable_value_degrades_to_empty() {
        // Map keys must serialize to strings
        let map: HashMap<(u8, u8), u8> = HashMap::from([((1, 2), 3)]);
        assert_eq!(to_json(&map), "");
    }

    #[test]
    fn test_strict_encoding_reports_error() {
        let map: HashMap<(u8, u8), u8> = HashMap::from([((1, 2), 3)]);
        assert!(matches!(try_to_json(&map), Err(ReportError::JsonEncode(_))));
        assert_eq!(try_to_json(&Some(1)).unwrap(), "1");
    }
}

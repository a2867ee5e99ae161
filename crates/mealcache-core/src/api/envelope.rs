//! NEIS response envelope normalisation.
//!
//! Success looks like `{ "<endpoint>": [ {"head": [...]}, {"row": [...]} ] }`.
//! Empty results and errors come back as `{ "RESULT": { "CODE", "MESSAGE" } }`,
//! sometimes with a head-only block.

use serde::Deserialize;
use serde_json::Value;

/// The `RESULT` object NEIS attaches to empty or failed responses.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ResultInfo {
    #[serde(rename = "CODE", default)]
    pub code: String,
    #[serde(rename = "MESSAGE", default)]
    pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    /// `None` when the endpoint block is missing entirely
    pub rows: Option<Vec<Value>>,
    pub result: Option<ResultInfo>,
}

impl Envelope {
    /// Rows, with "no block" and "no row part" both meaning no data.
    pub fn into_rows(self) -> Vec<Value> {
        self.rows.unwrap_or_default()
    }
}

pub fn parse_rows(payload: &Value, key: &str) -> Envelope {
    let Some(obj) = payload.as_object() else {
        return Envelope { rows: None, result: None };
    };

    let result = obj
        .get("RESULT")
        .and_then(|r| serde_json::from_value::<ResultInfo>(r.clone()).ok());

    let Some(block) = obj.get(key).and_then(Value::as_array) else {
        return Envelope { rows: None, result };
    };

    let rows = block
        .iter()
        .find_map(|part| part.get("row").and_then(Value::as_array))
        .cloned()
        .unwrap_or_default();

    Envelope {
        rows: Some(rows),
        result,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_envelope() {
        let payload = json!({
            "schoolInfo": [
                {"head": [{"list_total_count": 2}, {"RESULT": {"CODE": "INFO-000", "MESSAGE": "정상 처리되었습니다."}}]},
                {"row": [{"SCHUL_NM": "a"}, {"SCHUL_NM": "b"}]}
            ]
        });
        let env = parse_rows(&payload, "schoolInfo");
        assert_eq!(env.rows.as_ref().map(Vec::len), Some(2));
        assert_eq!(env.result, None);
    }

    #[test]
    fn test_result_only_envelope_is_empty() {
        let payload = json!({"RESULT": {"CODE": "INFO-200", "MESSAGE": "해당하는 데이터가 없습니다."}});
        let env = parse_rows(&payload, "mealServiceDietInfo");
        assert_eq!(env.rows, None);
        assert_eq!(env.result.as_ref().map(|r| r.code.as_str()), Some("INFO-200"));
        assert!(env.into_rows().is_empty());
    }

    #[test]
    fn test_head_only_block() {
        let payload = json!({"schoolInfo": [{"head": []}]});
        let env = parse_rows(&payload, "schoolInfo");
        assert_eq!(env.rows, Some(vec![]));
    }

    #[test]
    fn test_non_object_payload() {
        assert_eq!(parse_rows(&json!(null), "schoolInfo").rows, None);
        assert_eq!(parse_rows(&json!([1, 2]), "schoolInfo").rows, None);
        assert_eq!(parse_rows(&json!({"schoolInfo": "oops"}), "schoolInfo").rows, None);
    }
}

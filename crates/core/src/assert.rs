//! 응답 형태 단언 헬퍼
//!
//! 각 헬퍼는 실패 시 기대값과 실제값을 담은 [`AssertionFailure`]를 반환합니다.

use std::ops::RangeInclusive;

use serde_json::Value;

use crate::error::AssertionFailure;

/// 값의 JSON 타입 이름 (에러 메시지용)
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// HTTP 상태 코드가 일치하는지 확인합니다.
pub fn expect_status(context: &str, expected: u16, actual: u16) -> Result<(), AssertionFailure> {
    if expected == actual {
        Ok(())
    } else {
        Err(AssertionFailure::new(
            format!("{context} status"),
            expected.to_string(),
            actual.to_string(),
        ))
    }
}

/// 객체에 `key` 속성이 있는지 확인하고 그 값을 반환합니다.
pub fn expect_property<'a>(
    context: &str,
    body: &'a Value,
    key: &str,
) -> Result<&'a Value, AssertionFailure> {
    let object = body.as_object().ok_or_else(|| {
        AssertionFailure::new(context, "an object", json_type_name(body))
    })?;
    object.get(key).ok_or_else(|| {
        AssertionFailure::new(
            context,
            format!("property '{key}'"),
            "property missing",
        )
    })
}

/// 값이 배열인지 확인하고 그 원소를 반환합니다.
pub fn expect_array<'a>(context: &str, body: &'a Value) -> Result<&'a [Value], AssertionFailure> {
    body.as_array()
        .map(Vec::as_slice)
        .ok_or_else(|| AssertionFailure::new(context, "an array", json_type_name(body)))
}

/// 배열 길이가 정확히 `expected`인지 확인합니다.
pub fn expect_array_len<'a>(
    context: &str,
    body: &'a Value,
    expected: usize,
) -> Result<&'a [Value], AssertionFailure> {
    let items = expect_array(context, body)?;
    if items.len() == expected {
        Ok(items)
    } else {
        Err(AssertionFailure::new(
            format!("{context} length"),
            expected.to_string(),
            items.len().to_string(),
        ))
    }
}

/// 배열 길이가 `range` 안인지 확인합니다 (양 끝 포함).
pub fn expect_array_len_within<'a>(
    context: &str,
    body: &'a Value,
    range: RangeInclusive<usize>,
) -> Result<&'a [Value], AssertionFailure> {
    let items = expect_array(context, body)?;
    if range.contains(&items.len()) {
        Ok(items)
    } else {
        Err(AssertionFailure::new(
            format!("{context} length"),
            format!("within {}..={}", range.start(), range.end()),
            items.len().to_string(),
        ))
    }
}

/// 모든 원소의 `field`가 `expected`와 같은지 확인합니다.
pub fn expect_all_field_eq(
    context: &str,
    items: &[Value],
    field: &str,
    expected: &Value,
) -> Result<(), AssertionFailure> {
    for (index, item) in items.iter().enumerate() {
        let actual = item.get(field).unwrap_or(&Value::Null);
        if actual != expected {
            return Err(AssertionFailure::new(
                format!("{context}[{index}].{field}"),
                expected.to_string(),
                actual.to_string(),
            ));
        }
    }
    Ok(())
}

/// 숫자 값이 `threshold`보다 큰지 확인합니다.
pub fn expect_number_above(
    context: &str,
    value: &Value,
    threshold: f64,
) -> Result<f64, AssertionFailure> {
    let number = value
        .as_f64()
        .ok_or_else(|| AssertionFailure::new(context, "a number", json_type_name(value)))?;
    if number > threshold {
        Ok(number)
    } else {
        Err(AssertionFailure::new(
            context,
            format!("above {threshold}"),
            number.to_string(),
        ))
    }
}

/// 개수가 `threshold`보다 큰지 확인합니다.
pub fn expect_count_above(
    context: &str,
    count: usize,
    threshold: usize,
) -> Result<(), AssertionFailure> {
    if count > threshold {
        Ok(())
    } else {
        Err(AssertionFailure::new(
            context,
            format!("more than {threshold}"),
            count.to_string(),
        ))
    }
}

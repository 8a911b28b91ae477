//! 스키마 검증 -- 선언적 구조 계약으로 페이로드를 검증합니다.
//!
//! [`SchemaDescriptor`]는 필드 이름 → 기대 타입, 필수 필드, 허용 열거값을
//! 선언합니다. 검증은 descriptor를 JSON Schema 문서로 변환한 뒤
//! `jsonschema` 크레이트에 위임합니다.
//!
//! # 위반 보고
//! 첫 위반에서 멈추지 않고 페이로드 하나의 **모든** 위반을 수집합니다.
//! 각 위반은 `"<instance path>: <message>"` 형식입니다.
//!
//! # 사용 예시
//! ```
//! use serde_json::json;
//! use tradespec_core::schema::{FieldType, SchemaDescriptor};
//!
//! let schema = SchemaDescriptor::new("quote")
//!     .required("ask", FieldType::Number)
//!     .required("symbol", FieldType::String)
//!     .compile()
//!     .expect("valid schema");
//!
//! assert!(schema.validate(&json!({"ask": 1.5, "symbol": "MCH"})).is_valid());
//! assert!(!schema.validate(&json!({"ask": "1.5"})).is_valid());
//! ```

use std::fmt;
use std::sync::Arc;

use jsonschema::{Draft, JSONSchema};
use metrics::counter;
use serde_json::{Map, Value, json};

use crate::error::{ConfigError, SchemaViolation};
use crate::metrics as m;

/// 필드의 기대 타입
#[derive(Debug, Clone, PartialEq)]
pub enum FieldType {
    /// 정수 또는 실수
    Number,
    /// 정수
    Integer,
    /// 문자열
    String,
    /// 불리언
    Boolean,
    /// 임의 배열
    Array,
    /// 중첩 객체 (하위 descriptor로 검증)
    Object(SchemaDescriptor),
}

impl FieldType {
    fn to_json_schema(&self) -> Value {
        match self {
            FieldType::Number => json!({ "type": "number" }),
            FieldType::Integer => json!({ "type": "integer" }),
            FieldType::String => json!({ "type": "string" }),
            FieldType::Boolean => json!({ "type": "boolean" }),
            FieldType::Array => json!({ "type": "array" }),
            FieldType::Object(nested) => nested.to_json_schema(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct FieldSpec {
    name: String,
    kind: FieldType,
    allowed: Option<Vec<Value>>,
}

/// 선언적 구조 계약
///
/// 불변이며, 한 번 컴파일하여 모든 검증에서 읽기 전용으로 공유합니다.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaDescriptor {
    title: String,
    fields: Vec<FieldSpec>,
    required: Vec<String>,
}

impl SchemaDescriptor {
    /// 빈 객체 스키마를 생성합니다.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            fields: Vec::new(),
            required: Vec::new(),
        }
    }

    /// 선택 필드를 선언합니다 (있으면 타입을 검사).
    pub fn optional(mut self, name: impl Into<String>, kind: FieldType) -> Self {
        self.upsert(name.into(), kind, None);
        self
    }

    /// 필수 필드를 선언합니다.
    pub fn required(mut self, name: impl Into<String>, kind: FieldType) -> Self {
        let name = name.into();
        self.upsert(name.clone(), kind, None);
        self.mark_required(name);
        self
    }

    /// 필수 문자열 열거 필드를 선언합니다.
    pub fn required_enum<I, S>(mut self, name: impl Into<String>, allowed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let name = name.into();
        let allowed = allowed
            .into_iter()
            .map(|s| Value::String(s.into()))
            .collect();
        self.upsert(name.clone(), FieldType::String, Some(allowed));
        self.mark_required(name);
        self
    }

    /// 스키마 이름
    pub fn title(&self) -> &str {
        &self.title
    }

    /// 필수 필드 목록
    pub fn required_fields(&self) -> &[String] {
        &self.required
    }

    /// 선언된 필드 이름 목록 (선언 순서)
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    /// JSON Schema 문서로 변환합니다.
    pub fn to_json_schema(&self) -> Value {
        let mut properties = Map::new();
        for field in &self.fields {
            let mut spec = field.kind.to_json_schema();
            if let (Some(allowed), Some(obj)) = (&field.allowed, spec.as_object_mut()) {
                obj.insert("enum".to_owned(), Value::Array(allowed.clone()));
            }
            properties.insert(field.name.clone(), spec);
        }

        let mut schema = Map::new();
        schema.insert("title".to_owned(), Value::String(self.title.clone()));
        schema.insert("type".to_owned(), Value::String("object".to_owned()));
        schema.insert("properties".to_owned(), Value::Object(properties));
        if !self.required.is_empty() {
            schema.insert(
                "required".to_owned(),
                Value::Array(self.required.iter().cloned().map(Value::String).collect()),
            );
        }
        Value::Object(schema)
    }

    /// 검증기로 컴파일합니다.
    pub fn compile(&self) -> Result<CompiledSchema, ConfigError> {
        let document = self.to_json_schema();
        let compiled = JSONSchema::options()
            .with_draft(Draft::Draft202012)
            .compile(&document)
            .map_err(|e| ConfigError::InvalidValue {
                field: format!("schema.{}", self.title),
                reason: e.to_string(),
            })?;
        Ok(CompiledSchema {
            title: self.title.clone(),
            inner: Arc::new(compiled),
        })
    }

    fn upsert(&mut self, name: String, kind: FieldType, allowed: Option<Vec<Value>>) {
        match self.fields.iter_mut().find(|f| f.name == name) {
            Some(existing) => {
                existing.kind = kind;
                existing.allowed = allowed;
            }
            None => self.fields.push(FieldSpec {
                name,
                kind,
                allowed,
            }),
        }
    }

    fn mark_required(&mut self, name: String) {
        if !self.required.contains(&name) {
            self.required.push(name);
        }
    }
}

/// 한 페이로드의 검증 결과
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationResult {
    /// 모든 제약 충족
    Valid,
    /// 발견된 모든 위반 사항
    Invalid(Vec<String>),
}

impl ValidationResult {
    /// 유효 여부
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationResult::Valid)
    }

    /// 위반 목록 (유효하면 빈 슬라이스)
    pub fn violations(&self) -> &[String] {
        match self {
            ValidationResult::Valid => &[],
            ValidationResult::Invalid(v) => v,
        }
    }
}

/// 컴파일된 스키마
///
/// `Clone`은 같은 검증기를 공유합니다.
#[derive(Clone)]
pub struct CompiledSchema {
    title: String,
    inner: Arc<JSONSchema>,
}

impl fmt::Debug for CompiledSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledSchema")
            .field("title", &self.title)
            .finish_non_exhaustive()
    }
}

impl CompiledSchema {
    /// 스키마 이름
    pub fn title(&self) -> &str {
        &self.title
    }

    /// 페이로드 하나를 검증합니다.
    pub fn validate(&self, payload: &Value) -> ValidationResult {
        match self.inner.validate(payload) {
            Ok(()) => ValidationResult::Valid,
            Err(errors) => {
                let violations: Vec<String> = errors
                    .map(|e| {
                        let path = e.instance_path.to_string();
                        if path.is_empty() {
                            e.to_string()
                        } else {
                            format!("{path}: {e}")
                        }
                    })
                    .collect();
                counter!(m::SCHEMA_VIOLATIONS_TOTAL).increment(1);
                ValidationResult::Invalid(violations)
            }
        }
    }

    /// 모든 항목을 검증하고 첫 위반 항목을 에러로 반환합니다.
    pub fn validate_all(&self, items: &[Value]) -> Result<(), SchemaViolation> {
        for (index, item) in items.iter().enumerate() {
            if let ValidationResult::Invalid(violations) = self.validate(item) {
                tracing::debug!(
                    schema = self.title.as_str(),
                    index,
                    count = violations.len(),
                    "payload violates schema"
                );
                return Err(SchemaViolation {
                    schema: self.title.clone(),
                    index,
                    violations,
                });
            }
        }
        Ok(())
    }
}

/// 페이로드 하나를 descriptor로 검증합니다.
///
/// 여러 페이로드를 검증할 때는 [`SchemaDescriptor::compile`]로 한 번만
/// 컴파일하는 편이 낫습니다.
pub fn validate(payload: &Value, schema: &SchemaDescriptor) -> Result<ValidationResult, ConfigError> {
    Ok(schema.compile()?.validate(payload))
}

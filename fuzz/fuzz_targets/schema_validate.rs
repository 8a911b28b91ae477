#![no_main]

use libfuzzer_sys::fuzz_target;
use tradespec_core::types::{quote_schema, trade_schema};

fuzz_target!(|data: &[u8]| {
    let Ok(payload) = serde_json::from_slice::<serde_json::Value>(data) else {
        return;
    };
    for schema in [quote_schema(), trade_schema()] {
        let compiled = schema.compile().expect("built-in schemas compile");
        let result = compiled.validate(&payload);
        // 유효하지 않은 결과에는 최소 하나의 위반 사항이 있어야 함
        assert_eq!(result.is_valid(), result.violations().is_empty());
    }
});

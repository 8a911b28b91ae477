#![no_main]

use libfuzzer_sys::fuzz_target;
use tradespec_eventbus::frame::BridgeFrame;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    if let Ok(frame) = BridgeFrame::decode(text) {
        // 디코딩된 프레임은 다시 인코딩/디코딩할 수 있어야 함
        let encoded = frame.encode().expect("decoded frame must encode");
        let again = BridgeFrame::decode(&encoded).expect("encoded frame must decode");
        assert_eq!(again.kind(), frame.kind());
        let _ = frame.into_remote_error("fuzz");
    }
});

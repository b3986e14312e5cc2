#![no_main]
use libfuzzer_sys::fuzz_target;
use shape_pack::{DocumentCodec, MarkerCodec};

fuzz_target!(|data: &[u8]| {
    let codec = MarkerCodec::default();
    if let Ok(doc) = codec.decode_document(data) {
        let encoded = codec.encode_document(&doc).expect("decoded document must re-encode");
        assert_eq!(encoded, data);
    }
});

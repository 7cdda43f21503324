#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Any byte string is fair game for the decoder: it should either
    // produce a value or fail cleanly, never panic.
    if let Ok(value) = plankton_object::decode_binary(data) {
        // A value that decoded successfully must also be re-encodable:
        // the encoder has no business rejecting anything the builder
        // was willing to construct.
        let _ = plankton_object::encode_binary(&value);
    }
});

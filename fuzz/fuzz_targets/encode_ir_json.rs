#![no_main]

use fuse_sb3::ir::Script;
use fuse_sb3::uid::SequentialIds;
use fuse_sb3::{Codec, CodecOptions};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let data = if data.len() > 64 * 1024 {
        &data[..64 * 1024]
    } else {
        data
    };

    let Ok(script) = serde_json::from_slice::<Script>(data) else {
        return;
    };

    let mut codec = Codec::with_ids(CodecOptions::default(), SequentialIds::default());
    let Ok(workspace) = codec.serialize_script(&script) else {
        return;
    };
    assert!(fuse_sb3::check_workspace(&workspace).is_empty());
    let _ = codec.deserialize_script(&workspace);
});

#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let data = if data.len() > 64 * 1024 {
        &data[..64 * 1024]
    } else {
        data
    };

    let Ok(workspace) = fuse_sb3::wire::parse_workspace_json(data) else {
        return;
    };

    let _ = fuse_sb3::check_workspace(&workspace);
    let _ = fuse_sb3::deserialize_all_scripts(&workspace);
    let _ = fuse_sb3::deserialize_all_functions(&workspace);
});

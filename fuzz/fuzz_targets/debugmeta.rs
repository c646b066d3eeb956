#![no_main]

use dotsym::{metadata::cilmodule::CilModule, symbols::extract_debug_meta, File};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(file) = File::from_mem(data.to_vec()) {
        let _ = extract_debug_meta(&file, uguid::Guid::ZERO);
    }

    if let Ok(module) = CilModule::from_mem(data.to_vec()) {
        let _ = module.debug_meta();
    }
});

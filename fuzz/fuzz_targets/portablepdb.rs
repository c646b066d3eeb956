#![no_main]

use dotsym::metadata::{portablepdb::PortablePdb, token::Token};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(pdb) = PortablePdb::from_mem(data.to_vec()) {
        let _ = pdb.documents();
        for rid in 1..=8 {
            let _ = pdb.resolve(Token::new(0x0600_0000 | rid), 0x10);
        }
    }
});

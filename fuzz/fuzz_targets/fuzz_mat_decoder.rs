#![no_main]

use bioseries::extract::HierarchicalExtractor;
use bioseries::mat::MatFile;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Decoding arbitrary bytes must fail with an error, never panic
    let Ok(file) = MatFile::from_bytes(data) else {
        return;
    };

    // Whatever decoded must also survive extraction
    let record = file.into_record();
    let _ = record.outline(4);
    let _ = HierarchicalExtractor::default().extract(&record);
});

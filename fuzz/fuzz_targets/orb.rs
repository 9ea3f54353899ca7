#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: orb_lib::Orb| {
    orb_lib_fuzz::test_write_read_write(&data);
});

//! Fuzz target: host-link framing + command parsing
//!
//! Drives arbitrary byte sequences through `LineAssembler` and every
//! completed line through `parse_line`, asserting that neither panics and
//! that framed lines respect the length cap.
//!
//! cargo fuzz run fuzz_command_line

#![no_main]

use libfuzzer_sys::fuzz_target;
use mash::protocol::command::parse_line;
use mash::protocol::line::{LineAssembler, MAX_LINE_LEN};

fuzz_target!(|data: &[u8]| {
    let mut assembler = LineAssembler::new();

    for &byte in data {
        if let Some(Ok(line)) = assembler.push(byte) {
            assert!(line.len() <= MAX_LINE_LEN, "line exceeds cap");
            let _ = parse_line(&line);
        }
    }

    // The raw input as one line must also be safe to parse.
    if let Ok(text) = core::str::from_utf8(data) {
        let _ = parse_line(text);
    }
});

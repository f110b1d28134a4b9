//! Decode — incremental UTF-8 decoding across chunk boundaries.
//!
//! A multi-byte character split between two reads is held back (at most three
//! bytes) and completed by the next chunk. Malformed sequences become U+FFFD;
//! decoding never fails.

const REPLACEMENT: char = char::REPLACEMENT_CHARACTER;

#[derive(Debug, Default)]
pub struct Utf8Decoder {
    carry: [u8; 4],
    carry_len: usize,
}

impl Utf8Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes held back waiting for the rest of a character.
    pub fn pending(&self) -> usize {
        self.carry_len
    }

    /// Decode `input` and append the text to `out`.
    pub fn decode(&mut self, mut input: &[u8], out: &mut String) {
        while self.carry_len > 0 && !input.is_empty() {
            self.carry[self.carry_len] = input[0];
            self.carry_len += 1;
            input = &input[1..];
            self.resolve_carry(out);
        }
        if self.carry_len > 0 {
            return;
        }

        loop {
            match std::str::from_utf8(input) {
                Ok(s) => {
                    out.push_str(s);
                    return;
                }
                Err(e) => {
                    let valid = e.valid_up_to();
                    push_valid(out, &input[..valid]);
                    match e.error_len() {
                        Some(bad) => {
                            out.push(REPLACEMENT);
                            input = &input[valid + bad..];
                        }
                        None => {
                            // Incomplete tail: hold it for the next chunk
                            let tail = &input[valid..];
                            self.carry[..tail.len()].copy_from_slice(tail);
                            self.carry_len = tail.len();
                            return;
                        }
                    }
                }
            }
        }
    }

    /// End of input: anything still held back is malformed.
    pub fn finish(&mut self, out: &mut String) {
        if self.carry_len > 0 {
            self.carry_len = 0;
            out.push(REPLACEMENT);
        }
    }

    fn resolve_carry(&mut self, out: &mut String) {
        let held = &self.carry[..self.carry_len];
        match std::str::from_utf8(held) {
            Ok(s) => {
                out.push_str(s);
                self.carry_len = 0;
            }
            Err(e) => match e.error_len() {
                None => {} // still incomplete
                Some(bad) => {
                    let valid = e.valid_up_to();
                    push_valid(out, &held[..valid]);
                    out.push(REPLACEMENT);

                    let mut rest = [0u8; 4];
                    let rest_len = self.carry_len - valid - bad;
                    rest[..rest_len].copy_from_slice(&self.carry[valid + bad..self.carry_len]);
                    self.carry_len = 0;
                    self.decode(&rest[..rest_len], out);
                }
            },
        }
    }
}

#[inline]
fn push_valid(out: &mut String, bytes: &[u8]) {
    if !bytes.is_empty() {
        out.push_str(&String::from_utf8_lossy(bytes));
    }
}

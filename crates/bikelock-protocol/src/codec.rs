//! Tokio codec for the decimal token wire format.
//!
//! The remote controller sends one ASCII decimal integer per message. The
//! decoder follows the lenient rules of a microcontroller's serial integer
//! parser: any non-digit byte ends a token, and runs of non-digits between
//! tokens are skipped. There is no other framing.
//!
//! ```text
//! "200\n"        -> 200
//! "\r\n201\r\n"  -> 201
//! "205 7\n"      -> 205, 7
//! "x207y12z"     -> 207, 12
//! ```
//!
//! A digit run longer than any `u32` can be, or one whose value overflows
//! `u32`, is discarded as line noise and never reaches the command layer.
//!
//! An unterminated trailing run stays buffered; [`Decoder::decode_eof`]
//! flushes it. The channel calls it once the line has been idle for the
//! token timeout.
//!
//! # Usage with Tokio FramedRead
//!
//! ```
//! use bikelock_protocol::TokenCodec;
//! use futures::StreamExt;
//! use tokio_util::codec::FramedRead;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let wire: &[u8] = b"205\n7\n201";
//! let tokens: Vec<u32> = FramedRead::new(wire, TokenCodec::new())
//!     .filter_map(|token| async move { token.ok() })
//!     .collect()
//!     .await;
//! assert_eq!(tokens, vec![205, 7, 201]);
//! # }
//! ```

use bytes::{Buf, BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};
use tracing::trace;

use bikelock_core::constants::{MAX_TOKEN_DIGITS, TOKEN_TERMINATOR};
use bikelock_core::{Error, Notification, Result};

/// Decimal token codec.
///
/// Decodes `u32` tokens and encodes either raw tokens or [`Notification`]s
/// as decimal text followed by `\n`.
#[derive(Debug, Default)]
pub struct TokenCodec {
    /// Set while skipping the tail of an overlong digit run.
    discarding: bool,
}

impl TokenCodec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the codec is currently dropping an overlong digit run.
    pub fn is_discarding(&self) -> bool {
        self.discarding
    }
}

/// Parse a run of ASCII digits, rejecting anything that does not fit a `u32`.
fn parse_token(digits: &[u8]) -> Option<u32> {
    if digits.is_empty() || digits.len() > MAX_TOKEN_DIGITS {
        return None;
    }
    digits.iter().try_fold(0u32, |acc, digit| {
        acc.checked_mul(10)?.checked_add(u32::from(digit - b'0'))
    })
}

impl Decoder for TokenCodec {
    type Item = u32;
    type Error = Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<u32>> {
        loop {
            if self.discarding {
                match src.iter().position(|b| !b.is_ascii_digit()) {
                    Some(end) => {
                        src.advance(end);
                        self.discarding = false;
                    }
                    None => {
                        src.clear();
                        return Ok(None);
                    }
                }
            }

            let Some(start) = src.iter().position(|b| b.is_ascii_digit()) else {
                // Only separators left.
                src.clear();
                return Ok(None);
            };
            src.advance(start);

            let Some(len) = src.iter().position(|b| !b.is_ascii_digit()) else {
                if src.len() > MAX_TOKEN_DIGITS {
                    trace!(digits = src.len(), "Discarding overlong digit run");
                    src.clear();
                    self.discarding = true;
                }
                return Ok(None);
            };

            let digits = src.split_to(len);
            src.advance(1);
            match parse_token(&digits) {
                Some(token) => {
                    trace!(token, "Decoded token");
                    return Ok(Some(token));
                }
                None => trace!(digits = digits.len(), "Dropping out-of-range token"),
            }
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<u32>> {
        if let Some(token) = self.decode(src)? {
            return Ok(Some(token));
        }
        self.discarding = false;
        if src.is_empty() {
            return Ok(None);
        }
        // decode() leaves at most one unterminated digit run behind.
        let digits = src.split();
        let token = parse_token(&digits);
        trace!(?token, "Flushed trailing token");
        Ok(token)
    }
}

impl Encoder<u32> for TokenCodec {
    type Error = Error;

    fn encode(&mut self, token: u32, dst: &mut BytesMut) -> Result<()> {
        let text = token.to_string();
        dst.reserve(text.len() + 1);
        dst.put_slice(text.as_bytes());
        dst.put_u8(TOKEN_TERMINATOR);
        Ok(())
    }
}

impl Encoder<Notification> for TokenCodec {
    type Error = Error;

    fn encode(&mut self, item: Notification, dst: &mut BytesMut) -> Result<()> {
        Encoder::<u32>::encode(self, item.token(), dst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn decode_all(input: &[u8]) -> Vec<u32> {
        let mut codec = TokenCodec::new();
        let mut buffer = BytesMut::from(input);
        let mut tokens = Vec::new();
        while let Some(token) = codec.decode(&mut buffer).unwrap() {
            tokens.push(token);
        }
        tokens
    }

    #[rstest]
    #[case(b"200\n", vec![200])]
    #[case(b"\r\n201\r\n", vec![201])]
    #[case(b"205 7\n", vec![205, 7])]
    #[case(b"x207y12z", vec![207, 12])]
    #[case(b"0\n", vec![0])]
    #[case(b"200\n201\n206\n", vec![200, 201, 206])]
    #[case(b"hello\n", vec![])]
    #[case(b"", vec![])]
    fn test_decode_terminated_tokens(#[case] input: &[u8], #[case] expected: Vec<u32>) {
        assert_eq!(decode_all(input), expected);
    }

    #[test]
    fn test_unterminated_run_stays_buffered() {
        let mut codec = TokenCodec::new();
        let mut buffer = BytesMut::from(&b"20"[..]);
        assert_eq!(codec.decode(&mut buffer).unwrap(), None);
        assert_eq!(&buffer[..], b"20");

        buffer.extend_from_slice(b"0\n");
        assert_eq!(codec.decode(&mut buffer).unwrap(), Some(200));
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_decode_eof_flushes_trailing_run() {
        let mut codec = TokenCodec::new();
        let mut buffer = BytesMut::from(&b"  201"[..]);
        assert_eq!(codec.decode(&mut buffer).unwrap(), None);
        assert_eq!(codec.decode_eof(&mut buffer).unwrap(), Some(201));
        assert!(buffer.is_empty());
        assert_eq!(codec.decode_eof(&mut buffer).unwrap(), None);
    }

    #[test]
    fn test_overflowing_token_is_dropped() {
        // u32::MAX + 1
        assert_eq!(decode_all(b"4294967296\n201\n"), vec![201]);
        assert_eq!(decode_all(b"4294967295\n"), vec![u32::MAX]);
    }

    #[test]
    fn test_overlong_run_is_discarded_across_chunks() {
        let mut codec = TokenCodec::new();
        let mut buffer = BytesMut::from(&b"123456789012"[..]);
        assert_eq!(codec.decode(&mut buffer).unwrap(), None);
        assert!(codec.is_discarding());
        assert!(buffer.is_empty());

        buffer.extend_from_slice(b"345\n200\n");
        assert_eq!(codec.decode(&mut buffer).unwrap(), Some(200));
        assert!(!codec.is_discarding());
    }

    #[test]
    fn test_encode_notifications() {
        let mut codec = TokenCodec::new();
        let mut buffer = BytesMut::new();
        codec.encode(Notification::TamperWarning, &mut buffer).unwrap();
        codec.encode(Notification::DeleteAllAck, &mut buffer).unwrap();
        assert_eq!(&buffer[..], b"500\n100\n");
    }
}

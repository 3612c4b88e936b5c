use encoding_rs::{CoderResult, Encoder, Encoding};
use std::fmt;
use std::io::{self, Write};

/// Remembers the last byte written so textual output can end with exactly one newline.
pub struct NewlineWriter<W: Write> {
    inner: W,
    last: Option<u8>,
}

impl<W: Write> NewlineWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner, last: None }
    }

    /// Appends `\n` unless the output already ends with one, then flushes.
    pub fn finish(mut self) -> io::Result<W> {
        if self.last != Some(b'\n') {
            self.inner.write_all(b"\n")?;
        }
        self.inner.flush()?;
        Ok(self.inner)
    }
}

impl<W: Write> Write for NewlineWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let written = self.inner.write(buf)?;
        if written > 0 {
            self.last = Some(buf[written - 1]);
        }
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

impl<W: Write> fmt::Debug for NewlineWriter<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewlineWriter").field("last", &self.last).finish_non_exhaustive()
    }
}

/// Converts the UTF-8 written into it to another character encoding.
///
/// Characters the target encoding cannot represent are written as numeric character
/// references. Call [`finish`](TranscodingWriter::finish) to flush encoder state.
pub struct TranscodingWriter<W: Write> {
    inner: W,
    encoder: Encoder,
    // tail of a multi-byte character split across writes
    pending: Vec<u8>,
}

impl<W: Write> TranscodingWriter<W> {
    pub fn new(inner: W, encoding: &'static Encoding) -> Self {
        Self { inner, encoder: encoding.new_encoder(), pending: Vec::with_capacity(4) }
    }

    pub fn encoding(&self) -> &'static Encoding {
        self.encoder.encoding()
    }

    pub fn finish(mut self) -> io::Result<W> {
        self.encode_pending(true)?;
        self.inner.flush()?;
        Ok(self.inner)
    }

    fn encode_pending(&mut self, last: bool) -> io::Result<()> {
        let valid = match std::str::from_utf8(&self.pending) {
            Ok(text) => text.len(),
            Err(e) if e.error_len().is_none() && !last => e.valid_up_to(),
            Err(e) => return Err(io::Error::new(io::ErrorKind::InvalidData, e)),
        };

        let text = std::str::from_utf8(&self.pending[..valid]).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        encode_into(&mut self.encoder, &mut self.inner, text, last)?;
        self.pending.drain(..valid);
        Ok(())
    }
}

fn encode_into<W: Write>(encoder: &mut Encoder, inner: &mut W, mut text: &str, last: bool) -> io::Result<()> {
    let mut buf = [0u8; 1024];
    loop {
        let (result, read, written, _) = encoder.encode_from_utf8(text, &mut buf, last);
        inner.write_all(&buf[..written])?;
        text = &text[read..];
        if let CoderResult::InputEmpty = result {
            return Ok(());
        }
    }
}

impl<W: Write> Write for TranscodingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.pending.extend_from_slice(buf);
        self.encode_pending(false)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

impl<W: Write> fmt::Debug for TranscodingWriter<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TranscodingWriter").field("encoding", &self.encoder.encoding().name()).finish_non_exhaustive()
    }
}

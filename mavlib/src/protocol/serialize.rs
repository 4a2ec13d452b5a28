//! Byte sinks for frame and payload emission.

/// A sink for little-endian wire data.
pub trait Serializer {
    type Error;

    fn write_u8(&mut self, val: u8) -> Result<(), Self::Error>;

    // everything else can be written in terms of write_u8

    fn write_bytes(&mut self, val: &[u8]) -> Result<(), Self::Error> {
        for b in val.iter() {
            self.write_u8(*b)?;
        }
        Ok(())
    }

    fn write_i8(&mut self, val: i8) -> Result<(), Self::Error> {
        self.write_u8(val as u8)
    }

    fn write_le_u16(&mut self, val: u16) -> Result<(), Self::Error> {
        self.write_bytes(&val.to_le_bytes())
    }

    fn write_le_i16(&mut self, val: i16) -> Result<(), Self::Error> {
        self.write_le_u16(val as u16)
    }

    fn write_le_u32(&mut self, val: u32) -> Result<(), Self::Error> {
        self.write_bytes(&val.to_le_bytes())
    }

    fn write_le_i32(&mut self, val: i32) -> Result<(), Self::Error> {
        self.write_le_u32(val as u32)
    }

    fn write_le_u64(&mut self, val: u64) -> Result<(), Self::Error> {
        self.write_bytes(&val.to_le_bytes())
    }

    fn write_le_i64(&mut self, val: i64) -> Result<(), Self::Error> {
        self.write_le_u64(val as u64)
    }

    fn write_le_f32(&mut self, val: f32) -> Result<(), Self::Error> {
        self.write_le_u32(val.to_bits())
    }

    fn write_le_f64(&mut self, val: f64) -> Result<(), Self::Error> {
        self.write_le_u64(val.to_bits())
    }
}

impl<S> Serializer for &mut S
where
    S: Serializer,
{
    type Error = S::Error;

    fn write_u8(&mut self, val: u8) -> Result<(), Self::Error> {
        (*self).write_u8(val)
    }

    fn write_bytes(&mut self, val: &[u8]) -> Result<(), Self::Error> {
        (*self).write_bytes(val)
    }
}

/// A growable in-memory sink. Writes cannot fail.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SerializerVec {
    buf: Vec<u8>,
}

impl SerializerVec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn done(self) -> Vec<u8> {
        self.buf
    }
}

impl Serializer for SerializerVec {
    type Error = void::Void;

    fn write_u8(&mut self, val: u8) -> Result<(), Self::Error> {
        self.buf.push(val);
        Ok(())
    }

    fn write_bytes(&mut self, val: &[u8]) -> Result<(), Self::Error> {
        self.buf.extend_from_slice(val);
        Ok(())
    }
}

/// A serializer that also runs the frame checksum on the side.
///
/// Wrap the sink after the magic byte has been written; the checksum
/// covers everything written through the wrapper.
pub struct SerializerCrc<T> {
    digest: crc::Digest<'static, u16>,
    inner: T,
}

impl<T> SerializerCrc<T> {
    pub fn new(inner: T) -> Self {
        Self {
            digest: super::crc::digest(),
            inner,
        }
    }

    /// Fold in the message's CRC_EXTRA byte and unwrap the sink.
    pub fn finalize_with(mut self, crc_extra: u8) -> (u16, T) {
        self.digest.update(&[crc_extra]);
        (self.digest.finalize(), self.inner)
    }
}

impl<T> Serializer for SerializerCrc<T>
where
    T: Serializer,
{
    type Error = T::Error;

    fn write_u8(&mut self, val: u8) -> Result<(), Self::Error> {
        self.digest.update(&[val]);
        self.inner.write_u8(val)
    }

    fn write_bytes(&mut self, val: &[u8]) -> Result<(), Self::Error> {
        self.digest.update(val);
        self.inner.write_bytes(val)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    use void::ResultVoidExt;

    #[test]
    fn vec_sink_little_endian() {
        let mut ser = SerializerVec::new();
        ser.write_le_u16(0x0102).void_unwrap();
        ser.write_le_u32(0x0304_0506).void_unwrap();
        ser.write_le_u64(0x0708_090a_0b0c_0d0e).void_unwrap();
        ser.write_le_f32(1.0).void_unwrap();
        assert_eq!(
            ser.done(),
            vec![
                0x02, 0x01, //
                0x06, 0x05, 0x04, 0x03, //
                0x0e, 0x0d, 0x0c, 0x0b, 0x0a, 0x09, 0x08, 0x07, //
                0x00, 0x00, 0x80, 0x3f,
            ]
        );
    }

    #[test]
    fn crc_wrapper_matches_calculate() {
        let body = [0x09, 0x2a, 0x01, 0x01, 0x00, 0x06, 0x08];

        let mut ser = SerializerCrc::new(SerializerVec::new());
        ser.write_bytes(&body).void_unwrap();
        let (sum, inner) = ser.finalize_with(50);

        assert_eq!(sum, crate::protocol::crc::calculate(&body, 50));
        assert_eq!(inner.done(), body.to_vec());
    }
}

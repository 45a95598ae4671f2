use bitstream_io::{BitRead, BitReader, BitWrite, BitWriter, Endianness};

use super::ParseError;

/// Shared read/write behaviour for a piece of a DNS message.
///
/// NOTIFY queries and replies are short enough (one question, at most
/// one answer) that label compression never needs to be *followed*:
/// nothing earlier in the message could be pointed at from the
/// question section, since the question is the first variable-length
/// field after the fixed header. `read_labels` therefore only needs to
/// reject a compression pointer, not resolve one.
pub trait PacketComponent {
    fn write<E: Endianness>(
        &self,
        writer: &mut BitWriter<&mut Vec<u8>, E>,
    ) -> Result<(), ParseError>;
    fn read<E: Endianness>(&mut self, reader: &mut BitReader<&[u8], E>) -> Result<(), ParseError>;

    fn read_labels<E: Endianness>(
        &mut self,
        reader: &mut BitReader<&[u8], E>,
    ) -> Result<Vec<String>, ParseError> {
        let mut labels = Vec::new();

        loop {
            let first_byte = reader.read_var::<u8>(8)?;

            if first_byte == 0 {
                break;
            }

            if (first_byte & 0xC0) == 0xC0 {
                return Err(ParseError::InvalidLabel);
            }

            if first_byte > 63 {
                return Err(ParseError::InvalidLabel);
            }

            let mut label_buf = vec![0u8; first_byte as usize];
            reader.read_bytes(&mut label_buf)?;
            let label =
                String::from_utf8(label_buf).map_err(|_| ParseError::InvalidLabelEncoding)?;
            labels.push(label);
        }

        Ok(labels)
    }

    fn write_labels<E: Endianness>(
        &self,
        writer: &mut BitWriter<&mut Vec<u8>, E>,
        labels: &[String],
    ) -> Result<(), ParseError> {
        for label in labels {
            if label.is_empty() {
                continue;
            }
            if label.len() > 63 {
                return Err(ParseError::InvalidLabel);
            }
            writer.write_var::<u8>(8, label.len() as u8)?;
            writer.write_bytes(label.as_bytes())?;
        }

        writer.write_var::<u8>(8, 0)?;
        Ok(())
    }
}

use bitstream_io::{BitRead, BitReader, BitWrite, BitWriter, Endianness};

use super::{
    ParseError,
    common::PacketComponent,
    enums::{DNSResourceClass, DNSResourceType},
};

#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct DNSQuestion {
    pub labels: Vec<String>,
    pub qtype: DNSResourceType,
    pub qclass: DNSResourceClass,
}

impl PacketComponent for DNSQuestion {
    fn write<E: Endianness>(
        &self,
        writer: &mut BitWriter<&mut Vec<u8>, E>,
    ) -> Result<(), ParseError> {
        self.write_labels(writer, &self.labels)?;
        writer.write_var::<u16>(16, self.qtype.into())?;
        writer.write_var::<u16>(16, self.qclass.into())?;
        Ok(())
    }

    fn read<E: Endianness>(&mut self, reader: &mut BitReader<&[u8], E>) -> Result<(), ParseError> {
        let labels = self.read_labels(reader)?;
        let qtype = reader.read_var::<u16>(16)?.into();
        let qclass = reader.read_var::<u16>(16)?.into();
        *self = DNSQuestion {
            labels,
            qtype,
            qclass,
        };
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bitstream_io::BigEndian;

    #[test]
    fn round_trips_a_soa_question() {
        let question = DNSQuestion {
            labels: vec!["example".into(), "net".into()],
            qtype: DNSResourceType::SOA,
            qclass: DNSResourceClass::IN,
        };

        let mut bytes = Vec::new();
        {
            let mut writer = BitWriter::endian(&mut bytes, BigEndian);
            question.write(&mut writer).unwrap();
        }
        // 1(len)+7(example) + 1(len)+3(net) + 1(root) + 2(qtype) + 2(qclass)
        assert_eq!(bytes.len(), 8 + 4 + 1 + 2 + 2);

        let mut reader = BitReader::endian(bytes.as_slice(), BigEndian);
        let mut parsed = DNSQuestion::default();
        parsed.read(&mut reader).unwrap();
        assert_eq!(parsed, question);
    }
}

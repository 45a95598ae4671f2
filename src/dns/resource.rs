use bitstream_io::{BitRead, BitReader, BitWrite};

use super::{
    ParseError,
    common::PacketComponent,
    enums::{DNSResourceClass, DNSResourceType},
};

/// A resource record as it appears in a NOTIFY reply's answer section.
///
/// NOTIFY replies never carry more than the SOA the slave echoes back, and
/// `classify_reply` never inspects rdata or RCODE, so it's kept as raw
/// wire bytes rather than a per-type parsed struct.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct DNSResource {
    pub labels: Vec<String>,
    pub rtype: DNSResourceType,
    pub rclass: DNSResourceClass,
    pub ttl: u32,
    pub rdlength: u16,
    pub rdata: Vec<u8>,
}

impl PacketComponent for DNSResource {
    fn write<E: bitstream_io::Endianness>(
        &self,
        writer: &mut bitstream_io::BitWriter<&mut Vec<u8>, E>,
    ) -> Result<(), ParseError> {
        self.write_labels(writer, &self.labels)?;
        writer.write_var::<u16>(16, self.rtype.into())?;
        writer.write_var::<u16>(16, self.rclass.into())?;
        writer.write_var::<u32>(32, self.ttl)?;
        writer.write_var::<u16>(16, self.rdata.len() as u16)?;
        writer.write_bytes(&self.rdata)?;
        Ok(())
    }

    fn read<E: bitstream_io::Endianness>(
        &mut self,
        reader: &mut bitstream_io::BitReader<&[u8], E>,
    ) -> Result<(), ParseError> {
        self.labels = self.read_labels(reader)?;
        self.rtype = reader.read_var::<u16>(16)?.into();
        self.rclass = reader.read_var::<u16>(16)?.into();
        self.ttl = reader.read_var::<u32>(32)?;
        self.rdlength = reader.read_var::<u16>(16)?;

        if self.rdlength > 0 {
            self.rdata = vec![0u8; self.rdlength as usize];
            reader.read_bytes(&mut self.rdata)?;
        } else {
            self.rdata = Vec::new();
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bitstream_io::{BigEndian, BitWriter};

    #[test]
    fn round_trips_a_soa_answer() {
        let mut rdata = Vec::new();
        {
            let mut writer = BitWriter::<_, BigEndian>::new(&mut rdata);
            let component = DNSResource::default();
            component
                .write_labels(
                    &mut writer,
                    &["ns1".into(), "example".into(), "net".into()],
                )
                .unwrap();
            component
                .write_labels(&mut writer, &["hostmaster".into(), "example".into(), "net".into()])
                .unwrap();
            writer.write_var::<u32>(32, 2026072701).unwrap();
            writer.write_var::<u32>(32, 3600).unwrap();
            writer.write_var::<u32>(32, 900).unwrap();
            writer.write_var::<u32>(32, 1209600).unwrap();
            writer.write_var::<u32>(32, 3600).unwrap();
        }

        let resource = DNSResource {
            labels: vec!["example".into(), "net".into()],
            rtype: DNSResourceType::SOA,
            rclass: DNSResourceClass::IN,
            ttl: 3600,
            rdlength: rdata.len() as u16,
            rdata,
        };

        let mut bytes = Vec::new();
        {
            let mut writer = BitWriter::endian(&mut bytes, BigEndian);
            resource.write(&mut writer).unwrap();
        }

        let mut reader = BitReader::endian(bytes.as_slice(), BigEndian);
        let mut parsed = DNSResource::default();
        parsed.read(&mut reader).unwrap();
        assert_eq!(parsed, resource);
    }
}

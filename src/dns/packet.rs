use bitstream_io::{BigEndian, BitReader, BitWriter};

use super::{ParseError, common::PacketComponent, header::DNSHeader, question::DNSQuestion, resource::DNSResource};

/// A full DNS message: header, question, and the three resource sections.
///
/// NOTIFY queries only ever populate `questions` (one SOA question) and,
/// optionally, `answers` with the zone's current SOA. `authorities` and
/// `resources` exist because the wire format carries them regardless; a
/// NOTIFY exchange leaves both empty.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DNSPacket {
    pub header: DNSHeader,
    pub questions: Vec<DNSQuestion>,
    pub answers: Vec<DNSResource>,
    pub authorities: Vec<DNSResource>,
    pub resources: Vec<DNSResource>,
}

impl DNSPacket {
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::new();
        let mut writer = BitWriter::endian(&mut bytes, BigEndian);
        // write() only fails on bit-stream I/O errors, which never happen
        // writing into an in-memory Vec.
        self.write(&mut writer).expect("in-memory write cannot fail");
        bytes
    }

    pub fn parse(buf: &[u8]) -> Result<Self, ParseError> {
        if buf.len() < 12 {
            return Err(ParseError::TruncatedHeader);
        }

        let mut reader = BitReader::endian(buf, BigEndian);
        let mut packet = DNSPacket::default();
        packet.read(&mut reader)?;
        Ok(packet)
    }
}

impl PacketComponent for DNSPacket {
    fn write<E: bitstream_io::Endianness>(
        &self,
        writer: &mut BitWriter<&mut Vec<u8>, E>,
    ) -> Result<(), ParseError> {
        let mut header = self.header.clone();
        header.qdcount = self.questions.len() as u16;
        header.ancount = self.answers.len() as u16;
        header.nscount = self.authorities.len() as u16;
        header.arcount = self.resources.len() as u16;
        header.write(writer)?;

        for question in &self.questions {
            question.write(writer)?;
        }
        for answer in &self.answers {
            answer.write(writer)?;
        }
        for authority in &self.authorities {
            authority.write(writer)?;
        }
        for resource in &self.resources {
            resource.write(writer)?;
        }
        Ok(())
    }

    fn read<E: bitstream_io::Endianness>(
        &mut self,
        reader: &mut BitReader<&[u8], E>,
    ) -> Result<(), ParseError> {
        self.header.read(reader)?;

        self.questions = Vec::with_capacity(self.header.qdcount as usize);
        for _ in 0..self.header.qdcount {
            let mut question = DNSQuestion::default();
            question
                .read(reader)
                .map_err(|_| ParseError::TruncatedQuestion)?;
            self.questions.push(question);
        }

        self.answers = Self::read_resources(reader, self.header.ancount)?;
        self.authorities = Self::read_resources(reader, self.header.nscount)?;
        self.resources = Self::read_resources(reader, self.header.arcount)?;

        Ok(())
    }
}

impl DNSPacket {
    fn read_resources<E: bitstream_io::Endianness>(
        reader: &mut BitReader<&[u8], E>,
        count: u16,
    ) -> Result<Vec<DNSResource>, ParseError> {
        let mut resources = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let mut resource = DNSResource::default();
            resource.read(reader)?;
            resources.push(resource);
        }
        Ok(resources)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dns::enums::{DNSResourceClass, DNSResourceType};
    use crate::dns::header::OPCODE_NOTIFY;

    fn soa_question(zone: &str) -> DNSQuestion {
        DNSQuestion {
            labels: zone.split('.').map(String::from).collect(),
            qtype: DNSResourceType::SOA,
            qclass: DNSResourceClass::IN,
        }
    }

    #[test]
    fn round_trips_a_bare_notify_query() {
        let packet = DNSPacket {
            header: DNSHeader {
                id: 0x2f18,
                qr: false,
                opcode: OPCODE_NOTIFY,
                aa: true,
                rd: false,
                ..Default::default()
            },
            questions: vec![soa_question("example.net")],
            ..Default::default()
        };

        let bytes = packet.to_bytes();
        let parsed = DNSPacket::parse(&bytes).unwrap();

        assert_eq!(parsed.header.id, 0x2f18);
        assert_eq!(parsed.header.opcode, OPCODE_NOTIFY);
        assert_eq!(parsed.header.qdcount, 1);
        assert_eq!(parsed.questions, vec![soa_question("example.net")]);
        assert!(parsed.answers.is_empty());
    }

    #[test]
    fn rejects_a_buffer_shorter_than_a_header() {
        let err = DNSPacket::parse(&[0u8; 4]).unwrap_err();
        assert!(matches!(err, ParseError::TruncatedHeader));
    }
}

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use std::io::Cursor;
use std::io::Error;
use std::io::ErrorKind;
use std::io::Result;
use std::str::from_utf8;
use tokio_util::bytes::Buf;

use log::warn;

use crate::dconst::{Attr, Value};
use crate::map::{AvpMap, WireCode};

pub const AVP_FLAG_VENDOR: u8 = 0x80;
pub const AVP_FLAG_MANDATORY: u8 = 0x40;

const ZEROES: [u8; 3] = [0, 0, 0];

const AVP_MAX_LEN: usize = 0xFF_FFFF;

trait AvpHeaderWrite {
    fn write_3byte_int(&mut self, n: u32);
    fn write_avp_header(&mut self, wire: WireCode, flags: u8, len: usize) -> Result<()>;
}

impl AvpHeaderWrite for Vec<u8> {
    fn write_3byte_int(&mut self, n: u32) {
        let _ = self.write_u8((n >> 16) as u8);
        let _ = self.write_u8((n >> 8) as u8);
        let _ = self.write_u8(n as u8);
    }
    // nothing is written when the length doesn't fit the 24 bit field
    fn write_avp_header(&mut self, wire: WireCode, flags: u8, len: usize) -> Result<()> {
        let hlen = if wire.has_vendor() { 12 } else { 8 };
        let total = match len.checked_add(hlen) {
            Some(total) if total <= AVP_MAX_LEN => total as u32,
            _ => {
                return Err(Error::new(
                    ErrorKind::InvalidInput,
                    format!("avp payload of {} bytes too large", len),
                ))
            }
        };
        let _ = self.write_u32::<BigEndian>(wire.code);
        if wire.has_vendor() {
            let _ = self.write_u8(flags | AVP_FLAG_VENDOR);
            self.write_3byte_int(total);
            let _ = self.write_u32::<BigEndian>(wire.vendor);
        } else {
            let _ = self.write_u8(flags);
            self.write_3byte_int(total);
        }
        Ok(())
    }
}

fn pad(buf: &mut Vec<u8>) {
    let rem = buf.len() % 4;
    if rem != 0 {
        buf.extend_from_slice(&ZEROES[..4 - rem]);
    }
}

/// Writes AVPs tagged with the backend codes bound in an [`AvpMap`].
pub struct AvpWriter<'m> {
    map: &'m AvpMap,
    flags: u8,
    buffer: Vec<u8>,
}

impl<'m> AvpWriter<'m> {
    pub fn new(map: &'m AvpMap) -> Self {
        Self::with_capacity(map, 512)
    }
    pub fn with_capacity(map: &'m AvpMap, capacity: usize) -> Self {
        Self {
            map,
            flags: AVP_FLAG_MANDATORY,
            buffer: Vec::with_capacity(capacity),
        }
    }
    pub fn mandatory(mut self, mandatory: bool) -> Self {
        self.flags = if mandatory { AVP_FLAG_MANDATORY } else { 0 };
        self
    }

    /// Fails with `InvalidInput` if the payload doesn't fit the 24 bit length field.
    pub fn write_raw(&mut self, attr: Attr, value: &[u8]) -> Result<()> {
        self.buffer.write_avp_header(self.map.wire(attr), self.flags, value.len())?;
        self.buffer.extend_from_slice(value);
        pad(&mut self.buffer);
        Ok(())
    }
    pub fn write_str(&mut self, attr: Attr, value: &str) -> Result<()> {
        self.write_raw(attr, value.as_bytes())
    }
    pub fn write_u32(&mut self, attr: Attr, value: u32) -> Result<()> {
        self.buffer.write_avp_header(self.map.wire(attr), self.flags, 4)?;
        let _ = self.buffer.write_u32::<BigEndian>(value);
        Ok(())
    }
    /// Write the attribute owning `value`, carrying the value's backend code.
    pub fn write_value(&mut self, value: Value) -> Result<()> {
        self.write_u32(value.attr(), self.map.value_code(value))
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buffer
    }
    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }
}

#[derive(Debug)]
pub struct Avp<'a> {
    wire: WireCode,
    flags: u8,
    raw_data: &'a [u8],
}

impl Avp<'_> {
    pub fn wire(&self) -> WireCode {
        self.wire
    }
    pub fn is_mandatory(&self) -> bool {
        self.flags & AVP_FLAG_MANDATORY == AVP_FLAG_MANDATORY
    }
    pub fn as_bytes(&self) -> &[u8] {
        self.raw_data
    }
    pub fn as_str(&self) -> Result<&str> {
        from_utf8(self.raw_data).map_err(|_| Error::from(ErrorKind::InvalidData))
    }
    pub fn as_u32(&self) -> Result<u32> {
        let bytes: [u8; 4] = self
            .raw_data
            .try_into()
            .map_err(|_| Error::from(ErrorKind::InvalidData))?;
        Ok(u32::from_be_bytes(bytes))
    }
}

#[derive(Debug)]
pub struct AvpList<'a> {
    avps: Vec<Avp<'a>>,
}

impl<'a> AvpList<'a> {
    fn find(&self, map: &AvpMap, attr: Attr) -> Option<&Avp<'a>> {
        let wire = map.wire(attr);
        self.avps.iter().find(|a| a.wire == wire)
    }
    pub fn get_raw(&self, map: &AvpMap, attr: Attr) -> Option<&'a [u8]> {
        self.find(map, attr).map(|a| a.raw_data)
    }
    pub fn get_str(&self, map: &AvpMap, attr: Attr) -> Option<&'a str> {
        from_utf8(self.get_raw(map, attr)?).ok()
    }
    pub fn get_u32(&self, map: &AvpMap, attr: Attr) -> Option<u32> {
        self.find(map, attr)?.as_u32().ok()
    }
    /// Read a u32 AVP and map it back to a symbolic value of that attribute.
    pub fn get_value(&self, map: &AvpMap, attr: Attr) -> Option<Value> {
        let code = self.get_u32(map, attr)?;
        let value = map.value_for(attr, code);
        if value.is_none() {
            warn!("{} carries unknown value {}", attr, code);
        }
        value
    }
    /// Symbolic attributes present, in wire order; unknown codes are skipped.
    pub fn attrs(&self, map: &AvpMap) -> Vec<Attr> {
        self.avps.iter().filter_map(|a| map.attr_for(a.wire)).collect()
    }
    pub fn as_slice(&self) -> &[Avp<'a>] {
        self.avps.as_slice()
    }
    pub fn len(&self) -> usize {
        self.avps.len()
    }
    pub fn is_empty(&self) -> bool {
        self.avps.is_empty()
    }
}

impl<'a> IntoIterator for AvpList<'a> {
    type Item = Avp<'a>;

    type IntoIter = std::vec::IntoIter<Self::Item>;

    fn into_iter(self) -> Self::IntoIter {
        self.avps.into_iter()
    }
}

pub fn parse_avps(data: &[u8]) -> Result<AvpList<'_>> {
    let mut avps = AvpList { avps: Vec::new() };
    let mut cursor = Cursor::new(data);
    while cursor.has_remaining() {
        if cursor.remaining() < 8 {
            return Err(Error::new(ErrorKind::InvalidData, "truncated avp header"));
        }
        let code = cursor.read_u32::<BigEndian>()?;
        let flags = cursor.read_u8()?;
        let len = (cursor.read_u8()? as usize) << 16
            | (cursor.read_u8()? as usize) << 8
            | (cursor.read_u8()? as usize);
        let (vendor, hlen) = match flags & AVP_FLAG_VENDOR {
            AVP_FLAG_VENDOR => {
                if cursor.remaining() < 4 {
                    return Err(Error::new(ErrorKind::InvalidData, "truncated avp header"));
                }
                (cursor.read_u32::<BigEndian>()?, 12)
            }
            _ => (0, 8),
        };
        if len < hlen {
            return Err(Error::new(ErrorKind::InvalidData, "avp length shorter than header"));
        }
        let datalen = len - hlen;
        let padded = (datalen + 3) & !3;
        if cursor.remaining() < datalen {
            return Err(Error::new(ErrorKind::InvalidData, "truncated avp data"));
        }
        let p1 = cursor.position() as usize;
        avps.avps.push(Avp {
            wire: WireCode::with_vendor(code, vendor),
            flags,
            raw_data: &data[p1..p1 + datalen],
        });
        // last avp may come without padding
        cursor.advance(padded.min(cursor.remaining()));
    }
    Ok(avps)
}

#[cfg(test)]
mod tests {
    use std::io::ErrorKind;

    use super::{parse_avps, AvpWriter, AVP_FLAG_MANDATORY, AVP_FLAG_VENDOR};
    use crate::dconst::{Attr, Value};
    use crate::map::tests::make_map;
    use crate::map::{AvpMap, WireCode};

    fn make_vendor_map() -> AvpMap {
        AvpMap::builder()
            .vendor_id(9)
            .resolve_attrs(|name| name.parse::<Attr>().ok().map(|a| a.as_u32() + 1))
            .resolve_values(|_, name| name.parse::<Value>().ok().map(|v| v.as_u32() + 1))
            .build()
            .unwrap()
    }

    #[test]
    fn write_read_through_map() {
        let map = make_map();
        let mut w = AvpWriter::new(&map);
        w.write_str(Attr::UserName, "alice").unwrap();
        w.write_str(Attr::DigestRealm, "example.com").unwrap();
        w.write_value(Value::StatusStart).unwrap();
        w.write_u32(Attr::SipResponseCode, 200).unwrap();

        let buf = w.into_bytes();
        assert_eq!(buf.len() % 4, 0);
        let decoded = parse_avps(&buf).unwrap();
        assert_eq!(decoded.len(), 4);
        assert_eq!(decoded.get_str(&map, Attr::UserName), Some("alice"));
        assert_eq!(decoded.get_str(&map, Attr::DigestRealm), Some("example.com"));
        assert_eq!(decoded.get_value(&map, Attr::AcctStatusType), Some(Value::StatusStart));
        assert_eq!(decoded.get_u32(&map, Attr::SipResponseCode), Some(200));
        assert_eq!(decoded.get_raw(&map, Attr::SipCallId), None);
        assert_eq!(
            decoded.attrs(&map),
            vec![Attr::UserName, Attr::DigestRealm, Attr::AcctStatusType, Attr::SipResponseCode]
        );
        assert!(decoded.as_slice().iter().all(|a| a.is_mandatory()));
    }

    #[test]
    fn header_layout() {
        let map = make_map();
        let mut w = AvpWriter::new(&map).mandatory(false);
        w.write_str(Attr::UserName, "abc").unwrap();
        // code 100, no flags, length 8 + 3, one byte padding
        assert_eq!(w.as_slice(), &[0, 0, 0, 100, 0, 0, 0, 11, b'a', b'b', b'c', 0]);
    }

    #[test]
    fn vendor_attrs() {
        let map = make_vendor_map();
        let mut w = AvpWriter::new(&map);
        w.write_str(Attr::SipCallId, "abc@host").unwrap();
        let buf = w.into_bytes();
        assert_eq!(buf[4], AVP_FLAG_VENDOR | AVP_FLAG_MANDATORY);
        let decoded = parse_avps(&buf).unwrap();
        assert_eq!(decoded.as_slice()[0].wire(), WireCode::with_vendor(30, 9));
        assert_eq!(decoded.get_str(&map, Attr::SipCallId), Some("abc@host"));
        // same code without vendor is a different attribute
        assert_eq!(map.attr_for(WireCode::new(30)), None);
    }

    #[test]
    fn unknown_value_and_codes() {
        let map = make_map();
        let mut buf = AvpWriter::new(&map);
        buf.write_u32(Attr::ServiceType, 999).unwrap();
        buf.write_value(Value::CallCheck).unwrap();
        let buf = buf.into_bytes();
        let decoded = parse_avps(&buf).unwrap();
        // first Service-Type wins
        assert_eq!(decoded.get_value(&map, Attr::ServiceType), None);

        let mut foreign = AvpWriter::new(&map);
        foreign.write_str(Attr::UserName, "x").unwrap();
        let mut raw = foreign.into_bytes();
        raw[3] = 7;
        let decoded = parse_avps(&raw).unwrap();
        assert!(decoded.attrs(&map).is_empty());
        assert_eq!(decoded.as_slice()[0].as_str().unwrap(), "x");
    }

    #[test]
    fn truncated_input() {
        let map = make_map();
        let mut w = AvpWriter::new(&map);
        w.write_str(Attr::UserName, "alice").unwrap();
        let buf = w.into_bytes();
        for cut in [3, 8, 10] {
            let err = parse_avps(&buf[..cut]).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidData);
        }
        // length field smaller than the header
        let bad = [0, 0, 0, 1, 0, 0, 0, 4];
        assert_eq!(parse_avps(&bad).unwrap_err().kind(), ErrorKind::InvalidData);
        assert!(parse_avps(&[]).unwrap().is_empty());
    }

    #[test]
    fn truncated_vendor_header() {
        // vendor flag set, vendor id missing
        let bad = [0, 0, 0, 1, AVP_FLAG_VENDOR, 0, 0, 16];
        assert_eq!(parse_avps(&bad).unwrap_err().kind(), ErrorKind::InvalidData);
        let bad = [0, 0, 0, 1, AVP_FLAG_VENDOR, 0, 0, 16, 0, 0];
        assert_eq!(parse_avps(&bad).unwrap_err().kind(), ErrorKind::InvalidData);
        // vendor length shorter than the vendor header
        let bad = [0, 0, 0, 1, AVP_FLAG_VENDOR, 0, 0, 8, 0, 0, 0, 9];
        assert_eq!(parse_avps(&bad).unwrap_err().kind(), ErrorKind::InvalidData);
    }

    #[test]
    fn vendor_length_past_buffer() {
        let map = make_vendor_map();
        let mut w = AvpWriter::new(&map);
        w.write_str(Attr::SipCallId, "abc@host").unwrap();
        let mut buf = w.into_bytes();
        // claim 100 payload bytes
        buf[7] = 112;
        assert_eq!(parse_avps(&buf).unwrap_err().kind(), ErrorKind::InvalidData);
        let buf = vendor_avp_cut(&map, 14);
        assert_eq!(parse_avps(&buf).unwrap_err().kind(), ErrorKind::InvalidData);
    }

    fn vendor_avp_cut(map: &AvpMap, cut: usize) -> Vec<u8> {
        let mut w = AvpWriter::new(map);
        w.write_str(Attr::SipCallId, "abc@host").unwrap();
        let mut buf = w.into_bytes();
        buf.truncate(cut);
        buf
    }

    #[test]
    fn unpadded_last_avp() {
        let map = make_map();
        let mut w = AvpWriter::new(&map);
        w.write_str(Attr::UserName, "alice").unwrap();
        let buf = w.into_bytes();
        let decoded = parse_avps(&buf[..13]).unwrap();
        assert_eq!(decoded.get_str(&map, Attr::UserName), Some("alice"));
    }

    #[test]
    fn unpadded_middle_avp() {
        let map = make_map();
        let mut first = AvpWriter::new(&map);
        first.write_str(Attr::UserName, "alice").unwrap();
        let mut second = AvpWriter::new(&map);
        second.write_str(Attr::UserName, "abc").unwrap();

        // drop the padding of the first avp, the next header is read misaligned
        let mut buf = first.into_bytes();
        buf.truncate(13);
        buf.extend_from_slice(second.as_slice());
        assert_eq!(parse_avps(&buf).unwrap_err().kind(), ErrorKind::InvalidData);
    }

    #[test]
    fn payload_length_limit() {
        let map = make_map();
        let mut w = AvpWriter::with_capacity(&map, 0);
        let max = vec![b'a'; 0xFF_FFFF - 8];
        w.write_raw(Attr::UserName, &max).unwrap();
        let written = w.as_slice().len();
        assert_eq!(&w.as_slice()[5..8], &[0xff, 0xff, 0xff]);

        let err = w.write_raw(Attr::UserName, &vec![b'a'; 0xFF_FFFF - 7]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert_eq!(w.as_slice().len(), written);

        let buf = w.into_bytes();
        let decoded = parse_avps(&buf).unwrap();
        assert_eq!(decoded.get_raw(&map, Attr::UserName).map(|d| d.len()), Some(0xFF_FFFF - 8));
    }

    #[test]
    fn vendor_payload_length_limit() {
        let map = make_vendor_map();
        let mut w = AvpWriter::with_capacity(&map, 0);
        w.write_raw(Attr::UserName, &vec![0; 0xFF_FFFF - 12]).unwrap();
        let err = w.write_raw(Attr::UserName, &vec![0; 0xFF_FFFF - 11]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        let err = w.write_raw(Attr::UserName, &vec![0; 1 << 24]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert_eq!(parse_avps(w.as_slice()).unwrap().len(), 1);
    }
}

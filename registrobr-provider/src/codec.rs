//! Record codec for the registrar's pipe-delimited wire format.
//!
//! A wire record is `ownername|TYPE|payload`. Payload layout per type:
//!
//! | Type | Payload |
//! |------|---------|
//! | A / AAAA | address literal |
//! | CNAME | target |
//! | TXT | raw text |
//! | MX | `"{priority} {mail_server}"` |
//! | TLSA | `"{usage} {selector} {matching_type} {data}"` |
//!
//! Sub-fields are space-joined and their order is significant to the
//! registrar's parser. Form-encoding of the spaces happens at submission time.

use crate::error::{ProviderError, Result};
use crate::types::{Record, RecordData, RecordType};

const DELIMITER: char = '|';

/// Encode a record as `ownername|TYPE|payload`.
pub fn serialize(record: &Record) -> String {
    format!(
        "{}{DELIMITER}{}{DELIMITER}{}",
        record.ownername(),
        record.record_type(),
        payload(record.data())
    )
}

fn payload(data: &RecordData) -> String {
    match data {
        RecordData::A { address } | RecordData::AAAA { address } => address.clone(),
        RecordData::CNAME { target } => target.clone(),
        RecordData::TXT { text } => text.clone(),
        RecordData::MX { priority, exchange } => format!("{priority} {exchange}"),
        RecordData::TLSA {
            usage,
            selector,
            matching_type,
            data,
        } => format!(
            "{} {} {} {data}",
            usage.as_u8(),
            selector.as_u8(),
            matching_type.as_u8()
        ),
    }
}

/// Decode one wire string into a validated [`Record`].
///
/// Extra `|` characters past the second delimiter stay in the payload.
pub fn deserialize(wire: &str) -> Result<Record> {
    let mut segments = wire.splitn(3, DELIMITER);
    let (Some(ownername), Some(tag), Some(payload)) =
        (segments.next(), segments.next(), segments.next())
    else {
        return Err(ProviderError::malformed(
            wire,
            "expected 3 pipe-separated segments",
        ));
    };

    match RecordType::from_wire_tag(tag)? {
        RecordType::A => Record::a(ownername, payload),
        RecordType::Aaaa => Record::aaaa(ownername, payload),
        RecordType::Cname => Record::cname(ownername, payload),
        RecordType::Txt => Record::txt(ownername, payload),
        RecordType::Mx => {
            let [priority, exchange] = split_fields::<2>(wire, payload)?;
            Record::mx(ownername, parse_number(wire, "priority", priority)?, exchange)
        }
        RecordType::Tlsa => {
            let [usage, selector, matching_type, data] = split_fields::<4>(wire, payload)?;
            Record::tlsa(
                ownername,
                parse_number(wire, "usage", usage)?,
                parse_number(wire, "selector", selector)?,
                parse_number(wire, "matching_type", matching_type)?,
                data,
            )
        }
    }
}

/// Build a record from free-form user input, where `value` is laid out like
/// the wire payload (e.g. `"10 mail.example.com"` for MX).
pub fn from_user_input(record_type: RecordType, ownername: &str, value: &str) -> Result<Record> {
    let value = value.trim();
    match record_type {
        RecordType::A => Record::a(ownername, value),
        RecordType::Aaaa => Record::aaaa(ownername, value),
        RecordType::Cname => Record::cname(ownername, value),
        RecordType::Txt => Record::txt(ownername, value),
        RecordType::Mx | RecordType::Tlsa => {
            let collapsed = value.split_whitespace().collect::<Vec<_>>().join(" ");
            deserialize(&format!("{ownername}{DELIMITER}{record_type}{DELIMITER}{collapsed}"))
        }
    }
}

/// Split a multi-field payload on single spaces after trimming trailing
/// whitespace. The field count must match exactly.
fn split_fields<'a, const N: usize>(wire: &str, payload: &'a str) -> Result<[&'a str; N]> {
    let fields: Vec<&str> = payload.trim_end().split(' ').collect();
    let count = fields.len();
    fields.try_into().map_err(|_| {
        ProviderError::malformed(wire, format!("expected {N} payload fields, found {count}"))
    })
}

fn parse_number(wire: &str, field: &str, value: &str) -> Result<i64> {
    value
        .parse::<i64>()
        .map_err(|e| ProviderError::malformed(wire, format!("{field} '{value}' is not a number: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{TlsaMatchingType, TlsaSelector, TlsaUsage};

    fn sample_records() -> Vec<Record> {
        vec![
            Record::a("www", "1.2.3.4").unwrap(),
            Record::aaaa("", "2001:db8::1").unwrap(),
            Record::cname("blog", "example.github.io").unwrap(),
            Record::txt("_dmarc", "v=DMARC1; p=none").unwrap(),
            Record::mx("", 10, "mail.example.com.br").unwrap(),
            Record::tlsa("_443._tcp", 3, 1, 1, "d2abde240d7cd3ee6b4b28c54df034b9").unwrap(),
        ]
    }

    #[test]
    fn round_trip_every_type() {
        for record in sample_records() {
            let wire = serialize(&record);
            let back = deserialize(&wire);
            assert!(back.is_ok(), "deserialize({wire}) failed: {back:?}");
            assert_eq!(back.ok(), Some(record));
        }

        // values the wire format cannot carry are refused up front
        let unencodable = [
            Record::a("a|b", "1.2.3.4"),
            Record::mx("", 10, ""),
            Record::mx("", 10, "mail example"),
            Record::tlsa("_443._tcp", 3, 1, 1, ""),
            Record::tlsa("_443._tcp", 3, 1, 1, "ab cd"),
        ];
        for res in unencodable {
            assert!(
                matches!(&res, Err(ProviderError::MalformedRecord { .. })),
                "unexpected result: {res:?}"
            );
        }
    }

    #[test]
    fn serialize_payload_layouts() {
        let records = sample_records();
        let wires: Vec<String> = records.iter().map(serialize).collect();
        assert_eq!(
            wires,
            [
                "www|A|1.2.3.4",
                "|AAAA|2001:db8::1",
                "blog|CNAME|example.github.io",
                "_dmarc|TXT|v=DMARC1; p=none",
                "|MX|10 mail.example.com.br",
                "_443._tcp|TLSA|3 1 1 d2abde240d7cd3ee6b4b28c54df034b9",
            ]
        );
    }

    #[test]
    fn deserialize_a_record() {
        let res = deserialize("www|A|1.2.3.4");
        assert!(res.is_ok(), "expected Ok(..), got {res:?}");
        let Ok(record) = res else {
            return;
        };
        assert_eq!(record.ownername(), "www");
        assert_eq!(
            record.data(),
            &RecordData::A {
                address: "1.2.3.4".to_string()
            }
        );
    }

    #[test]
    fn tlsa_fields_survive_as_integers() {
        let res = deserialize("_25._tcp.mail|TLSA|2 0 2 abcdef  ");
        assert!(res.is_ok(), "expected Ok(..), got {res:?}");
        let Ok(record) = res else {
            return;
        };
        assert_eq!(
            record.data(),
            &RecordData::TLSA {
                usage: TlsaUsage::TrustAnchor,
                selector: TlsaSelector::FullCertificate,
                matching_type: TlsaMatchingType::Sha512,
                data: "abcdef".to_string(),
            }
        );
        assert_eq!(serialize(&record), "_25._tcp.mail|TLSA|2 0 2 abcdef");
    }

    #[test]
    fn mx_trailing_whitespace_is_trimmed() {
        let res = deserialize("|MX|5 mx.example.com \n");
        assert!(res.is_ok(), "expected Ok(..), got {res:?}");
    }

    #[test]
    fn too_few_segments_is_malformed() {
        for wire in ["", "www", "www|A"] {
            let res = deserialize(wire);
            assert!(
                matches!(&res, Err(ProviderError::MalformedRecord { .. })),
                "{wire:?}: unexpected result: {res:?}"
            );
        }
    }

    #[test]
    fn pipes_in_payload_are_kept() {
        let res = deserialize("x|TXT|a|b");
        assert!(res.is_ok(), "expected Ok(..), got {res:?}");
        let Ok(record) = res else {
            return;
        };
        assert_eq!(
            record.data(),
            &RecordData::TXT {
                text: "a|b".to_string()
            }
        );
    }

    #[test]
    fn unknown_type_is_surfaced() {
        let res = deserialize("www|SRV|0 5 5060 sip.example.com");
        assert!(
            matches!(&res, Err(ProviderError::UnknownRecordType { record_type }) if record_type == "SRV"),
            "unexpected result: {res:?}"
        );
        let lower = deserialize("www|a|1.2.3.4");
        assert!(matches!(
            &lower,
            Err(ProviderError::UnknownRecordType { .. })
        ));
    }

    #[test]
    fn non_numeric_subfields_are_malformed() {
        let mx = deserialize("|MX|ten mail.example.com");
        assert!(
            matches!(&mx, Err(ProviderError::MalformedRecord { .. })),
            "unexpected result: {mx:?}"
        );
        let tlsa = deserialize("x|TLSA|3 one 1 ab");
        assert!(
            matches!(&tlsa, Err(ProviderError::MalformedRecord { .. })),
            "unexpected result: {tlsa:?}"
        );
    }

    #[test]
    fn wrong_subfield_count_is_malformed() {
        let res = deserialize("|MX|10");
        assert!(
            matches!(&res, Err(ProviderError::MalformedRecord { .. })),
            "unexpected result: {res:?}"
        );
        let res = deserialize("x|TLSA|3 1 1");
        assert!(matches!(&res, Err(ProviderError::MalformedRecord { .. })));
    }

    #[test]
    fn out_of_range_subfields_keep_their_error() {
        let res = deserialize("|MX|0 mail.example.com");
        assert!(
            matches!(&res, Err(ProviderError::OutOfRange { .. })),
            "unexpected result: {res:?}"
        );
        let res = deserialize("x|TLSA|9 1 1 ab");
        assert!(matches!(&res, Err(ProviderError::InvalidEnum { .. })));
    }

    #[test]
    fn user_input_collapses_whitespace() {
        let res = from_user_input(RecordType::Mx, "", "  10   mail.example.com ");
        assert!(res.is_ok(), "expected Ok(..), got {res:?}");
        let Ok(record) = res else {
            return;
        };
        assert_eq!(serialize(&record), "|MX|10 mail.example.com");

        let res = from_user_input(RecordType::A, "www", "999.1.1.1");
        assert!(matches!(&res, Err(ProviderError::InvalidAddress { .. })));
    }
}

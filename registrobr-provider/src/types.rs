use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{ProviderError, Result};

// ============ Domain Types ============

/// A domain registered to the logged-in account.
///
/// Identity is the [`fqdn`](Self::fqdn). Field names follow the registrar's
/// JSON payload (`Id`, `FQDN`, `ExpirationDate`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Domain {
    /// Registrar-side identifier (sent either as a number or a string).
    #[serde(rename = "Id", deserialize_with = "string_or_number")]
    pub id: String,
    /// Fully qualified domain name (e.g., `"example.com.br"`).
    #[serde(rename = "FQDN")]
    pub fqdn: String,
    /// Expiration date as reported by the registrar.
    #[serde(rename = "ExpirationDate", default)]
    pub expiration_date: String,
    /// Registration status (e.g., `"Publicado"`).
    #[serde(rename = "Status", default)]
    pub status: String,
    /// Contact handle, if any.
    #[serde(rename = "Contact", default)]
    pub contact: Option<String>,
    /// Payment link for pending renewals, if any.
    #[serde(rename = "PayLink", default)]
    pub pay_link: Option<String>,
    /// Whether the domain is up for auction.
    #[serde(rename = "Auctionable", default, deserialize_with = "bool_or_number")]
    pub auctionable: bool,
}

impl Domain {
    /// Parse [`expiration_date`](Self::expiration_date) (`YYYY-MM-DD`, optionally
    /// followed by a time part).
    pub fn expiration(&self) -> Option<chrono::NaiveDate> {
        let date = self
            .expiration_date
            .split(['T', ' '])
            .next()
            .unwrap_or_default();
        chrono::NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()
    }
}

/// Envelope of the `user_domains` endpoint.
#[derive(Debug, Deserialize)]
pub(crate) struct DomainsResponse {
    #[serde(default)]
    pub domains: Vec<Domain>,
}

fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrNumber {
        String(String),
        I64(i64),
        U64(u64),
    }

    Ok(match StringOrNumber::deserialize(deserializer)? {
        StringOrNumber::String(s) => s,
        StringOrNumber::I64(n) => n.to_string(),
        StringOrNumber::U64(n) => n.to_string(),
    })
}

fn bool_or_number<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum BoolOrNumber {
        Bool(bool),
        Number(i64),
        Null(()),
    }

    Ok(match BoolOrNumber::deserialize(deserializer)? {
        BoolOrNumber::Bool(b) => b,
        BoolOrNumber::Number(n) => n != 0,
        BoolOrNumber::Null(()) => false,
    })
}

// ============ DNS Record Types ============

/// DNS record type tag, as it appears in the wire encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RecordType {
    /// IPv4 address record.
    A,
    /// IPv6 address record.
    Aaaa,
    /// Canonical name (alias) record.
    Cname,
    /// Text record.
    Txt,
    /// Mail exchange record.
    Mx,
    /// TLS certificate association (DANE) record.
    Tlsa,
}

impl RecordType {
    /// Every type the registrar accepts, in display order.
    pub const ALL: [Self; 6] = [
        Self::A,
        Self::Aaaa,
        Self::Cname,
        Self::Txt,
        Self::Mx,
        Self::Tlsa,
    ];

    /// Wire tag (`"A"`, `"AAAA"`, ...).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::Aaaa => "AAAA",
            Self::Cname => "CNAME",
            Self::Txt => "TXT",
            Self::Mx => "MX",
            Self::Tlsa => "TLSA",
        }
    }

    /// Resolve a wire tag. Matching is case-sensitive.
    pub fn from_wire_tag(tag: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == tag)
            .ok_or_else(|| ProviderError::UnknownRecordType {
                record_type: tag.to_string(),
            })
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Case-insensitive parse, meant for user input.
impl FromStr for RecordType {
    type Err = ProviderError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_wire_tag(&s.trim().to_ascii_uppercase())
    }
}

/// TLSA certificate usage field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum TlsaUsage {
    /// 0: CA constraint.
    Ca,
    /// 1: service certificate constraint.
    ServiceCertificate,
    /// 2: trust anchor assertion.
    TrustAnchor,
    /// 3: domain-issued certificate.
    DomainIssuedCertificate,
}

impl TlsaUsage {
    pub const ALLOWED: [u8; 4] = [0, 1, 2, 3];

    pub fn as_u8(self) -> u8 {
        match self {
            Self::Ca => 0,
            Self::ServiceCertificate => 1,
            Self::TrustAnchor => 2,
            Self::DomainIssuedCertificate => 3,
        }
    }

    /// Human-readable label, for display only.
    pub fn label(self) -> &'static str {
        match self {
            Self::Ca => "CA",
            Self::ServiceCertificate => "Service certificate",
            Self::TrustAnchor => "Trust Anchor",
            Self::DomainIssuedCertificate => "Domain-issued certificate",
        }
    }
}

impl TryFrom<u8> for TlsaUsage {
    type Error = ProviderError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(Self::Ca),
            1 => Ok(Self::ServiceCertificate),
            2 => Ok(Self::TrustAnchor),
            3 => Ok(Self::DomainIssuedCertificate),
            _ => Err(invalid_enum("usage", i64::from(value), &Self::ALLOWED)),
        }
    }
}

impl From<TlsaUsage> for u8 {
    fn from(value: TlsaUsage) -> Self {
        value.as_u8()
    }
}

/// TLSA selector field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum TlsaSelector {
    /// 0: full certificate.
    FullCertificate,
    /// 1: `SubjectPublicKeyInfo`.
    SubjectPublicKey,
}

impl TlsaSelector {
    pub const ALLOWED: [u8; 2] = [0, 1];

    pub fn as_u8(self) -> u8 {
        match self {
            Self::FullCertificate => 0,
            Self::SubjectPublicKey => 1,
        }
    }

    /// The registrar documents both selectors under the same label.
    pub fn label(self) -> &'static str {
        "Subject Public Key"
    }
}

impl TryFrom<u8> for TlsaSelector {
    type Error = ProviderError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(Self::FullCertificate),
            1 => Ok(Self::SubjectPublicKey),
            _ => Err(invalid_enum("selector", i64::from(value), &Self::ALLOWED)),
        }
    }
}

impl From<TlsaSelector> for u8 {
    fn from(value: TlsaSelector) -> Self {
        value.as_u8()
    }
}

/// TLSA matching type field. Exact match (0) is not offered by the registrar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum TlsaMatchingType {
    /// 1: SHA-256 digest.
    Sha256,
    /// 2: SHA-512 digest.
    Sha512,
}

impl TlsaMatchingType {
    pub const ALLOWED: [u8; 2] = [1, 2];

    pub fn as_u8(self) -> u8 {
        match self {
            Self::Sha256 => 1,
            Self::Sha512 => 2,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Sha256 => "SHA-256",
            Self::Sha512 => "SHA-512",
        }
    }
}

impl TryFrom<u8> for TlsaMatchingType {
    type Error = ProviderError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            1 => Ok(Self::Sha256),
            2 => Ok(Self::Sha512),
            _ => Err(invalid_enum(
                "matching_type",
                i64::from(value),
                &Self::ALLOWED,
            )),
        }
    }
}

impl From<TlsaMatchingType> for u8 {
    fn from(value: TlsaMatchingType) -> Self {
        value.as_u8()
    }
}

fn invalid_enum(field: &str, value: i64, allowed: &[u8]) -> ProviderError {
    ProviderError::InvalidEnum {
        field: field.to_string(),
        value,
        allowed: allowed.to_vec(),
    }
}

/// Narrow a caller-supplied integer into one of the TLSA enums.
fn tlsa_field<T>(field: &str, value: i64, allowed: &[u8]) -> Result<T>
where
    T: TryFrom<u8, Error = ProviderError>,
{
    u8::try_from(value)
        .map_err(|_| invalid_enum(field, value, allowed))
        .and_then(T::try_from)
}

/// Type-specific record payload.
///
/// Values of this type are unchecked; they only become part of a [`Record`]
/// through [`Record::new`], which validates them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "content")]
pub enum RecordData {
    /// A record: IPv4 address.
    A {
        /// IPv4 address (e.g., `"1.2.3.4"`).
        address: String,
    },

    /// AAAA record: IPv6 address.
    AAAA {
        /// IPv6 address (e.g., `"2001:db8::1"`).
        address: String,
    },

    /// CNAME record: alias target.
    CNAME {
        /// Target hostname.
        target: String,
    },

    /// TXT record: arbitrary text, sent unescaped.
    TXT {
        /// Text content.
        text: String,
    },

    /// MX record: mail exchange server.
    MX {
        /// Priority, `1..=65534`.
        priority: u16,
        /// Mail server hostname.
        exchange: String,
    },

    /// TLSA record: DANE certificate association.
    TLSA {
        /// Certificate usage.
        usage: TlsaUsage,
        /// Selector.
        selector: TlsaSelector,
        /// Matching type.
        matching_type: TlsaMatchingType,
        /// Certificate association data (hex digest).
        data: String,
    },
}

impl RecordData {
    /// Returns the [`RecordType`] discriminant for this payload.
    pub fn record_type(&self) -> RecordType {
        match self {
            Self::A { .. } => RecordType::A,
            Self::AAAA { .. } => RecordType::Aaaa,
            Self::CNAME { .. } => RecordType::Cname,
            Self::TXT { .. } => RecordType::Txt,
            Self::MX { .. } => RecordType::Mx,
            Self::TLSA { .. } => RecordType::Tlsa,
        }
    }
}

/// Lowest accepted MX priority.
pub const MX_PRIORITY_MIN: i64 = 1;
/// Highest accepted MX priority (65535 is rejected by the registrar).
pub const MX_PRIORITY_MAX: i64 = 65534;

/// A validated DNS record: an owner name plus a typed payload.
///
/// The owner name is relative to the zone apex and may be empty for the apex
/// itself. Construction always goes through validation, so a `Record` value is
/// never out of range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Record {
    ownername: String,
    data: RecordData,
}

/// Last sub-field of a space-joined payload: non-empty, no whitespace.
fn require_single_field(value: &str, field: &str) -> Result<()> {
    if value.is_empty() || value.contains(char::is_whitespace) {
        return Err(ProviderError::malformed(
            value,
            format!("{field} must be non-empty and contain no spaces"),
        ));
    }
    Ok(())
}

impl Record {
    /// Validate `data` and wrap it with its owner name.
    ///
    /// Values the wire format cannot carry unambiguously are rejected as
    /// [`ProviderError::MalformedRecord`]: a `|` in the owner name, and an
    /// empty or space-containing MX mail server or TLSA data.
    pub fn new(ownername: impl Into<String>, data: RecordData) -> Result<Self> {
        let ownername = ownername.into();
        if ownername.contains('|') {
            return Err(ProviderError::malformed(
                &ownername,
                "owner name must not contain '|'",
            ));
        }
        match &data {
            RecordData::A { address } => {
                address
                    .parse::<Ipv4Addr>()
                    .map_err(|e| ProviderError::InvalidAddress {
                        address: address.clone(),
                        detail: e.to_string(),
                    })?;
            }
            RecordData::AAAA { address } => {
                address
                    .parse::<Ipv6Addr>()
                    .map_err(|e| ProviderError::InvalidAddress {
                        address: address.clone(),
                        detail: e.to_string(),
                    })?;
            }
            RecordData::MX { priority, exchange } => {
                require_single_field(exchange, "mail server")?;
                let priority = i64::from(*priority);
                if !(MX_PRIORITY_MIN..=MX_PRIORITY_MAX).contains(&priority) {
                    return Err(ProviderError::OutOfRange {
                        field: "priority".to_string(),
                        value: priority,
                        min: MX_PRIORITY_MIN,
                        max: MX_PRIORITY_MAX,
                    });
                }
            }
            RecordData::TLSA { data, .. } => require_single_field(data, "certificate data")?,
            RecordData::CNAME { .. } | RecordData::TXT { .. } => {}
        }

        Ok(Self { ownername, data })
    }

    /// Creates an A record.
    pub fn a(ownername: impl Into<String>, ip: impl Into<String>) -> Result<Self> {
        Self::new(ownername, RecordData::A { address: ip.into() })
    }

    /// Creates an AAAA record.
    pub fn aaaa(ownername: impl Into<String>, ipv6: impl Into<String>) -> Result<Self> {
        Self::new(
            ownername,
            RecordData::AAAA {
                address: ipv6.into(),
            },
        )
    }

    /// Creates a CNAME record.
    pub fn cname(ownername: impl Into<String>, target: impl Into<String>) -> Result<Self> {
        Self::new(
            ownername,
            RecordData::CNAME {
                target: target.into(),
            },
        )
    }

    /// Creates a TXT record.
    pub fn txt(ownername: impl Into<String>, text: impl Into<String>) -> Result<Self> {
        Self::new(ownername, RecordData::TXT { text: text.into() })
    }

    /// Creates an MX record. `priority` must lie in `1..=65534`.
    pub fn mx(
        ownername: impl Into<String>,
        priority: i64,
        exchange: impl Into<String>,
    ) -> Result<Self> {
        let out_of_range = || ProviderError::OutOfRange {
            field: "priority".to_string(),
            value: priority,
            min: MX_PRIORITY_MIN,
            max: MX_PRIORITY_MAX,
        };
        let priority = u16::try_from(priority).map_err(|_| out_of_range())?;
        Self::new(
            ownername,
            RecordData::MX {
                priority,
                exchange: exchange.into(),
            },
        )
    }

    /// Creates a TLSA record from the numeric field values.
    pub fn tlsa(
        ownername: impl Into<String>,
        usage: i64,
        selector: i64,
        matching_type: i64,
        data: impl Into<String>,
    ) -> Result<Self> {
        Self::new(
            ownername,
            RecordData::TLSA {
                usage: tlsa_field("usage", usage, &TlsaUsage::ALLOWED)?,
                selector: tlsa_field("selector", selector, &TlsaSelector::ALLOWED)?,
                matching_type: tlsa_field(
                    "matching_type",
                    matching_type,
                    &TlsaMatchingType::ALLOWED,
                )?,
                data: data.into(),
            },
        )
    }

    pub fn ownername(&self) -> &str {
        &self.ownername
    }

    pub fn data(&self) -> &RecordData {
        &self.data
    }

    pub fn record_type(&self) -> RecordType {
        self.data.record_type()
    }

    /// Ordered `(label, value)` pairs for generic printing.
    pub fn fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = vec![("ownername", self.ownername.clone())];
        match &self.data {
            RecordData::A { address } => fields.push(("ip", address.clone())),
            RecordData::AAAA { address } => fields.push(("ipv6", address.clone())),
            RecordData::CNAME { target } => fields.push(("server", target.clone())),
            RecordData::TXT { text } => fields.push(("data", text.clone())),
            RecordData::MX { priority, exchange } => {
                fields.push(("priority", priority.to_string()));
                fields.push(("email_server", exchange.clone()));
            }
            RecordData::TLSA {
                usage,
                selector,
                matching_type,
                data,
            } => {
                fields.push(("usage", format!("{} ({})", usage.as_u8(), usage.label())));
                fields.push((
                    "selector",
                    format!("{} ({})", selector.as_u8(), selector.label()),
                ));
                fields.push((
                    "matching",
                    format!("{} ({})", matching_type.as_u8(), matching_type.label()),
                ));
                fields.push(("data", data.clone()));
            }
        }
        fields
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_RECORD(", self.record_type())?;
        for (i, (label, value)) in self.fields().iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{label}='{value}'")?;
        }
        f.write_str(")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ============ Construction & validation ============

    #[test]
    fn a_record_rejects_invalid_ipv4() {
        let res = Record::a("www", "999.1.1.1");
        assert!(
            matches!(&res, Err(ProviderError::InvalidAddress { address, .. }) if address == "999.1.1.1"),
            "unexpected result: {res:?}"
        );
    }

    #[test]
    fn a_record_accepts_valid_ipv4() {
        let res = Record::a("www", "8.8.8.8");
        assert!(res.is_ok(), "expected Ok(..), got {res:?}");
    }

    #[test]
    fn aaaa_record_rejects_ipv4_literal() {
        let res = Record::aaaa("www", "8.8.8.8");
        assert!(
            matches!(&res, Err(ProviderError::InvalidAddress { .. })),
            "unexpected result: {res:?}"
        );
        assert!(Record::aaaa("www", "2001:db8::1").is_ok());
    }

    #[test]
    fn mx_priority_bounds() {
        for bad in [0, 65535, -1, 70_000] {
            let res = Record::mx("", bad, "mail.example.com");
            assert!(
                matches!(&res, Err(ProviderError::OutOfRange { value, .. }) if *value == bad),
                "priority {bad}: unexpected result: {res:?}"
            );
        }
        assert!(Record::mx("", 1, "mail.example.com").is_ok());
        assert!(Record::mx("", 65534, "mail.example.com").is_ok());
    }

    #[test]
    fn tlsa_rejects_values_outside_closed_sets() {
        let usage = Record::tlsa("_443._tcp", 4, 1, 1, "ab");
        assert!(
            matches!(&usage, Err(ProviderError::InvalidEnum { field, .. }) if field == "usage"),
            "unexpected result: {usage:?}"
        );
        let selector = Record::tlsa("_443._tcp", 3, 2, 1, "ab");
        assert!(
            matches!(&selector, Err(ProviderError::InvalidEnum { field, .. }) if field == "selector"),
            "unexpected result: {selector:?}"
        );
        let matching = Record::tlsa("_443._tcp", 3, 1, 0, "ab");
        assert!(
            matches!(&matching, Err(ProviderError::InvalidEnum { field, .. }) if field == "matching_type"),
            "unexpected result: {matching:?}"
        );
        let negative = Record::tlsa("_443._tcp", -1, 1, 1, "ab");
        assert!(matches!(&negative, Err(ProviderError::InvalidEnum { .. })));
    }

    #[test]
    fn empty_ownername_is_apex() {
        let res = Record::txt("", "v=spf1 -all");
        assert!(res.is_ok(), "expected Ok(..), got {res:?}");
        let Ok(record) = res else {
            return;
        };
        assert_eq!(record.ownername(), "");
    }

    // ============ RecordType ============

    #[test]
    fn record_type_wire_tag_is_case_sensitive() {
        assert_eq!(RecordType::from_wire_tag("AAAA").ok(), Some(RecordType::Aaaa));
        assert!(matches!(
            RecordType::from_wire_tag("aaaa"),
            Err(ProviderError::UnknownRecordType { .. })
        ));
    }

    #[test]
    fn record_type_from_str_is_case_insensitive() {
        assert_eq!("tlsa".parse::<RecordType>().ok(), Some(RecordType::Tlsa));
        assert_eq!(" Cname ".parse::<RecordType>().ok(), Some(RecordType::Cname));
        assert!("SRV".parse::<RecordType>().is_err());
    }

    // ============ Labels & fields ============

    #[test]
    fn tlsa_labels() {
        assert_eq!(TlsaUsage::DomainIssuedCertificate.label(), "Domain-issued certificate");
        assert_eq!(TlsaSelector::FullCertificate.label(), "Subject Public Key");
        assert_eq!(TlsaMatchingType::Sha512.label(), "SHA-512");
    }

    #[test]
    fn mx_fields_in_order() {
        let res = Record::mx("", 10, "mail.example.com");
        let Ok(record) = res else {
            panic!("unexpected error: {res:?}");
        };
        let labels: Vec<_> = record.fields().into_iter().map(|(l, _)| l).collect();
        assert_eq!(labels, ["ownername", "priority", "email_server"]);
    }

    #[test]
    fn display_lists_fields() {
        let res = Record::a("www", "1.2.3.4");
        let Ok(record) = res else {
            panic!("unexpected error: {res:?}");
        };
        assert_eq!(record.to_string(), "A_RECORD(ownername='www', ip='1.2.3.4')");
    }

    #[test]
    fn tlsa_enums_serialize_as_integers() {
        let json = serde_json::to_string(&TlsaUsage::TrustAnchor).unwrap();
        assert_eq!(json, "2");
        let back: TlsaMatchingType = serde_json::from_str("2").unwrap();
        assert_eq!(back, TlsaMatchingType::Sha512);
        assert!(serde_json::from_str::<TlsaSelector>("5").is_err());
    }

    // ============ Domain ============

    #[test]
    fn domain_deserializes_registrar_payload() {
        let json = r#"{
            "Id": 123456,
            "FQDN": "example.com.br",
            "ExpirationDate": "2026-03-15",
            "Status": "Publicado",
            "Contact": "ABC123",
            "PayLink": null,
            "Auctionable": 0
        }"#;
        let res: serde_json::Result<Domain> = serde_json::from_str(json);
        assert!(res.is_ok(), "serde_json::from_str failed: {res:?}");
        let Ok(domain) = res else {
            return;
        };
        assert_eq!(domain.id, "123456");
        assert_eq!(domain.fqdn, "example.com.br");
        assert_eq!(domain.pay_link, None);
        assert!(!domain.auctionable);
        assert_eq!(
            domain.expiration(),
            chrono::NaiveDate::from_ymd_opt(2026, 3, 15)
        );
    }

    #[test]
    fn domain_expiration_with_time_part() {
        let domain = Domain {
            id: "1".into(),
            fqdn: "x.com.br".into(),
            expiration_date: "2025-01-02T00:00:00".into(),
            status: String::new(),
            contact: None,
            pay_link: None,
            auctionable: true,
        };
        assert_eq!(
            domain.expiration(),
            chrono::NaiveDate::from_ymd_opt(2025, 1, 2)
        );
    }
}

//! Attribute and value codes shared between the SIP core and the AAA backend driver.
//!
//! The numeric values are used as table indexes by backend drivers and must stay
//! in sync with the backend dictionary: don't renumber or rename an entry here
//! without updating the dictionary too.

use std::fmt;
use std::str::FromStr;

/// One past the highest attribute code.
pub const A_MAX: usize = 32;
/// One past the highest value code.
pub const V_MAX: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u32)]
pub enum Attr {
    UserName = 0,
    ServiceType = 1,
    CalledStationId = 2,
    CallingStationId = 3,
    AcctStatusType = 4,
    AcctSessionId = 5,
    SipMethod = 6,
    SipResponseCode = 7,
    SipCseq = 8,
    SipToTag = 9,
    SipFromTag = 10,
    DigestResponse = 11,
    DigestAttributes = 12,
    SipUriUser = 13,
    SipUriHost = 14,
    DigestRealm = 15,
    DigestNonce = 16,
    DigestMethod = 17,
    DigestUri = 18,
    DigestQop = 19,
    DigestAlgorithm = 20,
    DigestBodyDigest = 21,
    DigestCnonce = 22,
    DigestNonceCount = 23,
    DigestUserName = 24,
    SipGroup = 25,
    CiscoAvpair = 26,
    SipAvp = 27,
    TimeStamp = 28,
    SipCallId = 29,
    SipRequestHash = 30,
    SipSourceIpAddress = 31,
}

// (attr, legacy constant, dictionary name), indexed by code
const ATTRS: [(Attr, &str, &str); A_MAX] = [
    (Attr::UserName, "A_USER_NAME", "User-Name"),
    (Attr::ServiceType, "A_SERVICE_TYPE", "Service-Type"),
    (Attr::CalledStationId, "A_CALLED_STATION_ID", "Called-Station-Id"),
    (Attr::CallingStationId, "A_CALLING_STATION_ID", "Calling-Station-Id"),
    (Attr::AcctStatusType, "A_ACCT_STATUS_TYPE", "Acct-Status-Type"),
    (Attr::AcctSessionId, "A_ACCT_SESSION_ID", "Acct-Session-Id"),
    (Attr::SipMethod, "A_SIP_METHOD", "Sip-Method"),
    (Attr::SipResponseCode, "A_SIP_RESPONSE_CODE", "Sip-Response-Code"),
    (Attr::SipCseq, "A_SIP_CSEQ", "Sip-CSeq"),
    (Attr::SipToTag, "A_SIP_TO_TAG", "Sip-To-Tag"),
    (Attr::SipFromTag, "A_SIP_FROM_TAG", "Sip-From-Tag"),
    (Attr::DigestResponse, "A_DIGEST_RESPONSE", "Digest-Response"),
    (Attr::DigestAttributes, "A_DIGEST_ATTRIBUTES", "Digest-Attributes"),
    (Attr::SipUriUser, "A_SIP_URI_USER", "Sip-URI-User"),
    (Attr::SipUriHost, "A_SIP_URI_HOST", "Sip-URI-Host"),
    (Attr::DigestRealm, "A_DIGEST_REALM", "Digest-Realm"),
    (Attr::DigestNonce, "A_DIGEST_NONCE", "Digest-Nonce"),
    (Attr::DigestMethod, "A_DIGEST_METHOD", "Digest-Method"),
    (Attr::DigestUri, "A_DIGEST_URI", "Digest-URI"),
    (Attr::DigestQop, "A_DIGEST_QOP", "Digest-QOP"),
    (Attr::DigestAlgorithm, "A_DIGEST_ALGORITHM", "Digest-Algorithm"),
    (Attr::DigestBodyDigest, "A_DIGEST_BODY_DIGEST", "Digest-Body-Digest"),
    (Attr::DigestCnonce, "A_DIGEST_CNONCE", "Digest-CNonce"),
    (Attr::DigestNonceCount, "A_DIGEST_NONCE_COUNT", "Digest-Nonce-Count"),
    (Attr::DigestUserName, "A_DIGEST_USER_NAME", "Digest-User-Name"),
    (Attr::SipGroup, "A_SIP_GROUP", "Sip-Group"),
    (Attr::CiscoAvpair, "A_CISCO_AVPAIR", "Cisco-AVPair"),
    (Attr::SipAvp, "A_SIP_AVP", "SIP-AVP"),
    (Attr::TimeStamp, "A_TIME_STAMP", "Event-Timestamp"),
    (Attr::SipCallId, "A_SIP_CALL_ID", "Sip-Call-Id"),
    (Attr::SipRequestHash, "A_SIP_REQUEST_HASH", "SIP-Request-Hash"),
    (Attr::SipSourceIpAddress, "A_SIP_SOURCE_IP_ADDRESS", "SIP-Source-IP-Address"),
];

impl Attr {
    pub const COUNT: usize = A_MAX;

    /// All attributes in ascending code order.
    pub const ALL: [Attr; A_MAX] = {
        let mut all = [Attr::UserName; A_MAX];
        let mut i = 0;
        while i < A_MAX {
            all[i] = ATTRS[i].0;
            i += 1;
        }
        all
    };

    pub fn as_u32(self) -> u32 {
        self as u32
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_u32(code: u32) -> Option<Self> {
        ATTRS.get(code as usize).map(|e| e.0)
    }

    /// Name of the attribute in the backend dictionary.
    pub fn name(self) -> &'static str {
        ATTRS[self.index()].2
    }

    /// Legacy constant name, e.g. `A_USER_NAME`.
    pub fn constant(self) -> &'static str {
        ATTRS[self.index()].1
    }

    /// Digest authentication parameters (realm, nonce, qop, ...).
    pub fn is_digest(self) -> bool {
        matches!(
            self,
            Attr::DigestResponse
                | Attr::DigestAttributes
                | Attr::DigestRealm
                | Attr::DigestNonce
                | Attr::DigestMethod
                | Attr::DigestUri
                | Attr::DigestQop
                | Attr::DigestAlgorithm
                | Attr::DigestBodyDigest
                | Attr::DigestCnonce
                | Attr::DigestNonceCount
                | Attr::DigestUserName
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u32)]
pub enum Value {
    StatusStart = 0,
    StatusStop = 1,
    StatusFailed = 2,
    CallCheck = 3,
    SipSession = 4,
    GroupCheck = 5,
    SipCallerAvps = 6,
    SipCalleeAvps = 7,
    SipVerifyDestination = 8,
    SipVerifySource = 9,
}

const VALUES: [(Value, &str, &str, Attr); V_MAX] = [
    (Value::StatusStart, "V_STATUS_START", "Start", Attr::AcctStatusType),
    (Value::StatusStop, "V_STATUS_STOP", "Stop", Attr::AcctStatusType),
    (Value::StatusFailed, "V_STATUS_FAILED", "Failed", Attr::AcctStatusType),
    (Value::CallCheck, "V_CALL_CHECK", "Call-Check", Attr::ServiceType),
    (Value::SipSession, "V_SIP_SESSION", "Sip-Session", Attr::ServiceType),
    (Value::GroupCheck, "V_GROUP_CHECK", "Group-Check", Attr::ServiceType),
    (Value::SipCallerAvps, "V_SIP_CALLER_AVPS", "SIP-Caller-AVPs", Attr::ServiceType),
    (Value::SipCalleeAvps, "V_SIP_CALLEE_AVPS", "SIP-Callee-AVPs", Attr::ServiceType),
    (Value::SipVerifyDestination, "V_SIP_VERIFY_DESTINATION", "Sip-Verify-Destination", Attr::ServiceType),
    (Value::SipVerifySource, "V_SIP_VERIFY_SOURCE", "Sip-Verify-Source", Attr::ServiceType),
];

impl Value {
    pub const COUNT: usize = V_MAX;

    /// All values in ascending code order.
    pub const ALL: [Value; V_MAX] = {
        let mut all = [Value::StatusStart; V_MAX];
        let mut i = 0;
        while i < V_MAX {
            all[i] = VALUES[i].0;
            i += 1;
        }
        all
    };

    pub fn as_u32(self) -> u32 {
        self as u32
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_u32(code: u32) -> Option<Self> {
        VALUES.get(code as usize).map(|e| e.0)
    }

    /// Name of the value in the backend dictionary.
    pub fn name(self) -> &'static str {
        VALUES[self.index()].2
    }

    /// Legacy constant name, e.g. `V_STATUS_START`.
    pub fn constant(self) -> &'static str {
        VALUES[self.index()].1
    }

    /// Attribute this value is carried in.
    pub fn attr(self) -> Attr {
        VALUES[self.index()].3
    }
}

/// Numeric code outside of the defined range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnknownCode(pub u32);

impl fmt::Display for UnknownCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown code {}", self.0)
    }
}

impl std::error::Error for UnknownCode {}

/// Name not present in the dictionary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownName(pub String);

impl fmt::Display for UnknownName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown name {:?}", self.0)
    }
}

impl std::error::Error for UnknownName {}

impl TryFrom<u32> for Attr {
    type Error = UnknownCode;

    fn try_from(code: u32) -> Result<Self, Self::Error> {
        Attr::from_u32(code).ok_or(UnknownCode(code))
    }
}

impl TryFrom<u32> for Value {
    type Error = UnknownCode;

    fn try_from(code: u32) -> Result<Self, Self::Error> {
        Value::from_u32(code).ok_or(UnknownCode(code))
    }
}

impl From<Attr> for u32 {
    fn from(value: Attr) -> Self {
        value.as_u32()
    }
}

impl From<Value> for u32 {
    fn from(value: Value) -> Self {
        value.as_u32()
    }
}

// dictionary names are case insensitive
impl FromStr for Attr {
    type Err = UnknownName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ATTRS
            .iter()
            .find(|e| e.2.eq_ignore_ascii_case(s))
            .map(|e| e.0)
            .ok_or_else(|| UnknownName(s.to_owned()))
    }
}

impl FromStr for Value {
    type Err = UnknownName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        VALUES
            .iter()
            .find(|e| e.2.eq_ignore_ascii_case(s))
            .map(|e| e.0)
            .ok_or_else(|| UnknownName(s.to_owned()))
    }
}

impl fmt::Display for Attr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

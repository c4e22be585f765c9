//! Attribute and value codes shared by a SIP proxy's AAA subsystem and its
//! backend driver, plus the per-backend code map and an AVP codec keyed by them.

pub mod codec;
pub mod dconst;
pub mod map;

pub use codec::{parse_avps, Avp, AvpList, AvpWriter};
pub use dconst::{Attr, UnknownCode, UnknownName, Value, A_MAX, V_MAX};
pub use map::{AvpMap, AvpMapBuilder, WireCode};

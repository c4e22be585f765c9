use std::collections::HashMap;
use std::io::{Error, ErrorKind, Result};

use log::{debug, error};

use crate::dconst::{Attr, Value, A_MAX, V_MAX};

pub const VENDOR_NONE: u32 = 0;

/// Code and vendor a backend dictionary assigned to an attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WireCode {
    pub code: u32,
    pub vendor: u32,
}

impl WireCode {
    pub fn new(code: u32) -> Self {
        Self { code, vendor: VENDOR_NONE }
    }
    pub fn with_vendor(code: u32, vendor: u32) -> Self {
        Self { code, vendor }
    }
    pub fn has_vendor(&self) -> bool {
        self.vendor != VENDOR_NONE
    }
}

/// Fully resolved binding of every attribute and value to backend codes.
#[derive(Debug, Clone)]
pub struct AvpMap {
    attrs: [WireCode; A_MAX],
    values: [u32; V_MAX],
}

impl AvpMap {
    pub fn builder() -> AvpMapBuilder {
        AvpMapBuilder::new()
    }

    pub fn wire(&self, attr: Attr) -> WireCode {
        self.attrs[attr.index()]
    }

    pub fn value_code(&self, value: Value) -> u32 {
        self.values[value.index()]
    }

    pub fn attr_for(&self, wire: WireCode) -> Option<Attr> {
        Attr::ALL.into_iter().find(|a| self.attrs[a.index()] == wire)
    }

    /// Reverse lookup restricted to the values carried in `attr`.
    pub fn value_for(&self, attr: Attr, code: u32) -> Option<Value> {
        Value::ALL
            .into_iter()
            .find(|v| v.attr() == attr && self.values[v.index()] == code)
    }
}

pub struct AvpMapBuilder {
    vendor_id: u32,
    attrs: [Option<WireCode>; A_MAX],
    values: [Option<u32>; V_MAX],
}

impl AvpMapBuilder {
    pub fn new() -> Self {
        Self {
            vendor_id: VENDOR_NONE,
            attrs: [None; A_MAX],
            values: [None; V_MAX],
        }
    }

    /// Vendor used for attributes bound through `resolve_attrs`.
    pub fn vendor_id(mut self, vendor_id: u32) -> Self {
        self.vendor_id = vendor_id;
        self
    }

    pub fn attr(mut self, attr: Attr, wire: WireCode) -> Self {
        self.attrs[attr.index()] = Some(wire);
        self
    }

    pub fn value(mut self, value: Value, code: u32) -> Self {
        self.values[value.index()] = Some(code);
        self
    }

    /// Bind every attribute not set explicitly by looking up its dictionary name.
    pub fn resolve_attrs<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<u32>,
    {
        for a in Attr::ALL {
            if self.attrs[a.index()].is_some() {
                continue;
            }
            if let Some(code) = lookup(a.name()) {
                self.attrs[a.index()] = Some(WireCode::with_vendor(code, self.vendor_id));
            }
        }
        self
    }

    /// Bind every value not set explicitly; lookup gets (attribute name, value name).
    pub fn resolve_values<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str, &str) -> Option<u32>,
    {
        for v in Value::ALL {
            if self.values[v.index()].is_some() {
                continue;
            }
            if let Some(code) = lookup(v.attr().name(), v.name()) {
                self.values[v.index()] = Some(code);
            }
        }
        self
    }

    pub fn build(self) -> Result<AvpMap> {
        let mut missing = 0;
        let mut attrs = [WireCode::new(0); A_MAX];
        for a in Attr::ALL {
            match self.attrs[a.index()] {
                Some(w) => attrs[a.index()] = w,
                None => {
                    error!("can't get code for the {} attribute", a.name());
                    missing += 1;
                }
            }
        }
        let mut values = [0; V_MAX];
        for v in Value::ALL {
            match self.values[v.index()] {
                Some(c) => values[v.index()] = c,
                None => {
                    error!("can't get code for the {} value", v.name());
                    missing += 1;
                }
            }
        }
        if missing > 0 {
            return Err(Error::new(
                ErrorKind::NotFound,
                format!("{} names left unbound", missing),
            ));
        }

        let mut seen: HashMap<WireCode, Attr> = HashMap::with_capacity(A_MAX);
        for a in Attr::ALL {
            if let Some(prev) = seen.insert(attrs[a.index()], a) {
                return Err(Error::new(
                    ErrorKind::InvalidInput,
                    format!("{} and {} share code {:?}", prev, a, attrs[a.index()]),
                ));
            }
        }
        let mut seen: HashMap<(Attr, u32), Value> = HashMap::with_capacity(V_MAX);
        for v in Value::ALL {
            if let Some(prev) = seen.insert((v.attr(), values[v.index()]), v) {
                return Err(Error::new(
                    ErrorKind::InvalidInput,
                    format!("{} and {} share code {}", prev, v, values[v.index()]),
                ));
            }
        }
        debug!("avp map built, {} attributes, {} values", A_MAX, V_MAX);
        Ok(AvpMap { attrs, values })
    }
}

impl Default for AvpMapBuilder {
    fn default() -> Self {
        Self::new()
    }
}

//! Field keywords (`broadcast`, `ram`, `required`, ...)
//!
//! Keywords are declared per file. The nine historical keywords are always
//! present and additionally map onto a flag bit, which keeps the hash of a
//! schema that only uses them identical to the value older peers compute.

use std::fmt::{self, Write};

use crate::hash::HashGenerator;

/// Historical keyword flag bits
pub mod flags {
    pub const REQUIRED: u32 = 0x0001;
    pub const BROADCAST: u32 = 0x0002;
    pub const OWNRECV: u32 = 0x0004;
    pub const RAM: u32 = 0x0008;
    pub const DB: u32 = 0x0010;
    pub const CLSEND: u32 = 0x0020;
    pub const CLRECV: u32 = 0x0040;
    pub const OWNSEND: u32 = 0x0080;
    pub const AIRECV: u32 = 0x0100;
}

/// Name and flag bit of each historical keyword, in declaration order
pub const HISTORICAL_KEYWORDS: [(&str, u32); 9] = [
    ("required", flags::REQUIRED),
    ("broadcast", flags::BROADCAST),
    ("ownrecv", flags::OWNRECV),
    ("ram", flags::RAM),
    ("db", flags::DB),
    ("clsend", flags::CLSEND),
    ("clrecv", flags::CLRECV),
    ("ownsend", flags::OWNSEND),
    ("airecv", flags::AIRECV),
];

/// A declared keyword
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde_impls", derive(serde::Serialize, serde::Deserialize))]
pub struct Keyword {
    name: String,
    historical_flag: Option<u32>,
}

impl Keyword {
    /// Declares a keyword, recognizing the historical names.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let historical_flag = HISTORICAL_KEYWORDS
            .iter()
            .find(|(n, _)| *n == name)
            .map(|&(_, flag)| flag);
        Self {
            name,
            historical_flag,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn historical_flag(&self) -> Option<u32> {
        self.historical_flag
    }

    pub fn generate_hash(&self, hashgen: &mut HashGenerator) {
        hashgen.add_string(&self.name);
    }
}

/// Ordered, duplicate-free set of keywords attached to a field.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct KeywordList {
    keywords: Vec<Keyword>,
    flags: u32,
    has_custom: bool,
}

impl KeywordList {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a keyword, returning `false` if it was already present.
    pub fn add_keyword(&mut self, keyword: &Keyword) -> bool {
        if self.has_keyword(keyword.name()) {
            return false;
        }
        match keyword.historical_flag() {
            Some(flag) => self.flags |= flag,
            None => self.has_custom = true,
        }
        self.keywords.push(keyword.clone());
        true
    }

    pub fn clear(&mut self) {
        self.keywords.clear();
        self.flags = 0;
        self.has_custom = false;
    }

    #[must_use]
    pub fn has_keyword(&self, name: &str) -> bool {
        self.keywords.iter().any(|k| k.name() == name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.keywords.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Keyword> + '_ {
        self.keywords.iter()
    }

    /// Bitmask of the historical keywords present
    #[must_use]
    pub fn flags(&self) -> u32 {
        self.flags
    }

    #[must_use]
    pub fn has_flag(&self, flag: u32) -> bool {
        self.flags & flag != 0
    }

    /// Returns `true` if both lists hold the same keywords, in any order.
    #[must_use]
    pub fn compare_keywords(&self, other: &KeywordList) -> bool {
        self.len() == other.len() && self.keywords.iter().all(|k| other.has_keyword(k.name()))
    }

    pub fn copy_keywords(&mut self, other: &KeywordList) {
        self.clear();
        for k in &other.keywords {
            self.add_keyword(k);
        }
    }

    /// Writes each keyword preceded by a space
    pub fn output<W: Write>(&self, out: &mut W) -> fmt::Result {
        for k in &self.keywords {
            write!(out, " {}", k.name())?;
        }
        Ok(())
    }

    pub fn generate_hash(&self, hashgen: &mut HashGenerator) {
        if !self.has_custom {
            hashgen.add_int(self.flags as i64);
        } else {
            hashgen.add_int(self.keywords.len() as i64);
            for k in &self.keywords {
                k.generate_hash(hashgen);
            }
        }
    }
}

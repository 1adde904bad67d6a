use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chumsky::Parser;
use chumsky::error::Simple;
use chumsky::primitive::{filter, just};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::common::error::VnodeError;
use crate::common::parser::{CharParser, all_consuming, parse_u64};

pub type Kb = u64;
pub type ResourceFractions = u64;

pub const FRACTIONS_PER_UNIT: ResourceFractions = 10_000;
pub const FRACTIONS_MAX_DIGITS: usize = 4; // = log10(FRACTIONS_PER_UNIT)

const KB: u128 = 1024;
const WORD_BYTES: u128 = 8;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AmountKind {
    Count,
    Size,
    Float,
    String,
}

impl AmountKind {
    pub fn name(&self) -> &'static str {
        match self {
            AmountKind::Count => "count",
            AmountKind::Size => "size",
            AmountKind::Float => "float",
            AmountKind::String => "string",
        }
    }
}

/// A single resource value carved out of a vnode.
///
/// Sizes are always kept in kb, floats are fixed-point numbers with
/// [`FRACTIONS_MAX_DIGITS`] decimal digits so that arithmetic stays exact.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ResourceAmount {
    Count(u64),
    Size(Kb),
    Float(ResourceFractions),
    String(String),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AmountError {
    KindMismatch(AmountKind, AmountKind),
    Underflow,
    Overflow,
}

impl AmountError {
    pub fn into_error(self, resource: &str) -> VnodeError {
        match self {
            AmountError::KindMismatch(left, right) => VnodeError::KindMismatch {
                resource: resource.to_string(),
                left: left.name(),
                right: right.name(),
            },
            AmountError::Underflow => VnodeError::Underflow {
                resource: resource.to_string(),
            },
            AmountError::Overflow => {
                VnodeError::Parse(format!("value of resource '{resource}' is too large"))
            }
        }
    }
}

impl ResourceAmount {
    #[cfg(test)]
    pub fn float(units: u64, fractions: ResourceFractions) -> Self {
        assert!(fractions < FRACTIONS_PER_UNIT);
        ResourceAmount::Float(units * FRACTIONS_PER_UNIT + fractions)
    }

    pub fn kind(&self) -> AmountKind {
        match self {
            ResourceAmount::Count(_) => AmountKind::Count,
            ResourceAmount::Size(_) => AmountKind::Size,
            ResourceAmount::Float(_) => AmountKind::Float,
            ResourceAmount::String(_) => AmountKind::String,
        }
    }

    /// Strings describe a property of a vnode, they are never summed or subtracted.
    #[inline]
    pub fn is_consumable(&self) -> bool {
        !matches!(self, ResourceAmount::String(_))
    }

    pub fn is_zero(&self) -> bool {
        self.magnitude() == Some(0)
    }

    /// Size in kb, `None` for non-size kinds.
    pub fn as_kb(&self) -> Option<Kb> {
        match self {
            ResourceAmount::Size(kb) => Some(*kb),
            _ => None,
        }
    }

    /// Whole units of a count or float amount (fractions are truncated).
    pub fn units(&self) -> Option<u64> {
        match self {
            ResourceAmount::Count(count) => Some(*count),
            ResourceAmount::Float(value) => Some(value / FRACTIONS_PER_UNIT),
            _ => None,
        }
    }

    /// Zero of the same kind, `None` for strings.
    pub fn zero_like(&self) -> Option<ResourceAmount> {
        self.with_magnitude(0)
    }

    fn magnitude(&self) -> Option<u64> {
        match self {
            ResourceAmount::Count(v) | ResourceAmount::Size(v) | ResourceAmount::Float(v) => {
                Some(*v)
            }
            ResourceAmount::String(_) => None,
        }
    }

    fn with_magnitude(&self, value: u64) -> Option<ResourceAmount> {
        match self {
            ResourceAmount::Count(_) => Some(ResourceAmount::Count(value)),
            ResourceAmount::Size(_) => Some(ResourceAmount::Size(value)),
            ResourceAmount::Float(_) => Some(ResourceAmount::Float(value)),
            ResourceAmount::String(_) => None,
        }
    }

    fn operands(&self, other: &ResourceAmount) -> Result<(u64, u64), AmountError> {
        match (self.magnitude(), other.magnitude()) {
            (Some(a), Some(b)) if self.kind() == other.kind() => Ok((a, b)),
            _ => Err(AmountError::KindMismatch(self.kind(), other.kind())),
        }
    }

    pub fn checked_add(&self, other: &ResourceAmount) -> Result<ResourceAmount, AmountError> {
        let (a, b) = self.operands(other)?;
        let sum = a.checked_add(b).ok_or(AmountError::Overflow)?;
        Ok(self.with_magnitude(sum).unwrap_or_else(|| self.clone()))
    }

    pub fn checked_sub(&self, other: &ResourceAmount) -> Result<ResourceAmount, AmountError> {
        let (a, b) = self.operands(other)?;
        let diff = a.checked_sub(b).ok_or(AmountError::Underflow)?;
        Ok(self.with_magnitude(diff).unwrap_or_else(|| self.clone()))
    }

    /// Orders two amounts of the same numeric kind.
    pub fn compare(&self, other: &ResourceAmount) -> Result<Ordering, AmountError> {
        let (a, b) = self.operands(other)?;
        Ok(a.cmp(&b))
    }

    pub fn min<'a>(&'a self, other: &'a ResourceAmount) -> Result<&'a ResourceAmount, AmountError> {
        Ok(match self.compare(other)? {
            Ordering::Greater => other,
            _ => self,
        })
    }
}

impl fmt::Display for ResourceAmount {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ResourceAmount::Count(count) => write!(f, "{count}"),
            ResourceAmount::Size(kb) => write!(f, "{kb}kb"),
            ResourceAmount::Float(value) => {
                let fractions = value % FRACTIONS_PER_UNIT;
                write!(f, "{}", value / FRACTIONS_PER_UNIT)?;
                if fractions != 0 {
                    let num = format!("{:01$}", fractions, FRACTIONS_MAX_DIGITS);
                    write!(f, ".{}", num.trim_end_matches('0'))?;
                }
                Ok(())
            }
            ResourceAmount::String(value) => f.write_str(value),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum SizeUnit {
    Bytes,
    Kilo,
    Mega,
    Giga,
    Tera,
    Peta,
}

impl SizeUnit {
    fn parse(unit: &str) -> Option<(SizeUnit, bool)> {
        let unit = unit.to_ascii_lowercase();
        let (prefix, words) = match unit.strip_suffix('b') {
            Some(prefix) => (prefix.to_string(), false),
            None => (unit.strip_suffix('w')?.to_string(), true),
        };
        let unit = match prefix.as_str() {
            "" => SizeUnit::Bytes,
            "k" => SizeUnit::Kilo,
            "m" => SizeUnit::Mega,
            "g" => SizeUnit::Giga,
            "t" => SizeUnit::Tera,
            "p" => SizeUnit::Peta,
            _ => return None,
        };
        Some((unit, words))
    }

    fn bytes(&self) -> u128 {
        let shift = match self {
            SizeUnit::Bytes => 0,
            SizeUnit::Kilo => 1,
            SizeUnit::Mega => 2,
            SizeUnit::Giga => 3,
            SizeUnit::Tera => 4,
            SizeUnit::Peta => 5,
        };
        KB.pow(shift)
    }
}

/// Converts `whole.fraction` (fraction given with `digits` decimal places) of `unit` into kb,
/// rounding partial kilobytes up.
fn size_to_kb(whole: u64, fraction: u64, digits: u32, unit_bytes: u128) -> Option<Kb> {
    let scale = 10u128.pow(digits);
    let scaled = (whole as u128).checked_mul(scale)? + fraction as u128;
    let bytes = scaled.checked_mul(unit_bytes)?;
    let divisor = scale * KB;
    Kb::try_from(bytes.div_ceil(divisor)).ok()
}

fn parse_fraction_digits() -> impl CharParser<String> {
    just('.')
        .ignore_then(
            filter(|c: &char| c.is_ascii_digit())
                .repeated()
                .at_least(1)
                .collect::<String>(),
        )
        .labelled("fraction")
}

fn parse_unit() -> impl CharParser<String> {
    filter(|c: &char| c.is_ascii_alphabetic())
        .repeated()
        .at_least(1)
        .collect::<String>()
        .labelled("size unit")
}

/// Parses `<int>`, `<int>.<digits>` and sizes such as `2gb`, `1.5mb` or `10kw`.
fn parse_numeric_amount() -> impl CharParser<ResourceAmount> {
    parse_u64()
        .then(parse_fraction_digits().or_not())
        .then(parse_unit().or_not())
        .try_map(|((whole, fraction), unit), span| {
            let (fraction, digits) = match fraction {
                Some(digits) if digits.len() > FRACTIONS_MAX_DIGITS => {
                    return Err(Simple::custom(
                        span,
                        format!("at most {FRACTIONS_MAX_DIGITS} decimal digits are supported"),
                    ));
                }
                Some(digits) => (
                    digits.parse::<u64>().map_err(|e| Simple::custom(span.clone(), e))?,
                    digits.len() as u32,
                ),
                None => (0, 0),
            };
            match unit {
                None if digits == 0 => Ok(ResourceAmount::Count(whole)),
                None => {
                    let scale = 10u64.pow(FRACTIONS_MAX_DIGITS as u32 - digits);
                    whole
                        .checked_mul(FRACTIONS_PER_UNIT)
                        .map(|units| ResourceAmount::Float(units + fraction * scale))
                        .ok_or_else(|| Simple::custom(span, "value is too large"))
                }
                Some(unit) => {
                    let (size_unit, words) = SizeUnit::parse(&unit).ok_or_else(|| {
                        Simple::custom(span.clone(), format!("unknown size unit '{unit}'"))
                    })?;
                    let unit_bytes = if words {
                        size_unit.bytes() * WORD_BYTES
                    } else {
                        size_unit.bytes()
                    };
                    size_to_kb(whole, fraction, digits, unit_bytes)
                        .map(ResourceAmount::Size)
                        .ok_or_else(|| Simple::custom(span, "size is too large"))
                }
            }
        })
}

/// Parses a resource value as written in exec_vnode and select strings.
///
/// Values starting with a digit must be well-formed numbers or sizes, anything else
/// is kept verbatim as a string resource.
pub fn parse_amount(input: &str) -> crate::Result<ResourceAmount> {
    match input.chars().next() {
        None => Err(VnodeError::Parse("empty resource value".to_string())),
        Some(c) if c.is_ascii_digit() => all_consuming(parse_numeric_amount())
            .parse_text(input)
            .map_err(|e| VnodeError::Parse(format!("'{input}': {e}"))),
        Some(_) => Ok(ResourceAmount::String(input.to_string())),
    }
}

/// Parses a size and returns it in kb.
pub fn to_kb(input: &str) -> crate::Result<Kb> {
    let amount = parse_amount(input)?;
    amount
        .as_kb()
        .ok_or_else(|| VnodeError::Parse(format!("'{input}' is not a size")))
}

impl FromStr for ResourceAmount {
    type Err = VnodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_amount(s)
    }
}

impl Serialize for ResourceAmount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ResourceAmount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        parse_amount(&value).map_err(D::Error::custom)
    }
}

use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use smallvec::SmallVec;

use crate::common::error::VnodeError;
use crate::resources::amount::ResourceAmount;

pub const NCPUS_RESOURCE_NAME: &str = "ncpus";
pub const MEM_RESOURCE_NAME: &str = "mem";

type Entries = SmallVec<[(String, ResourceAmount); 4]>;

/// Resource name to amount mapping that remembers the order in which names were first seen.
///
/// The order is only used for rendering, equality ignores it.
#[derive(Clone, Debug, Default)]
pub struct ResourceVector {
    entries: Entries,
}

impl PartialEq for ResourceVector {
    fn eq(&self, other: &Self) -> bool {
        self.entries.len() == other.entries.len()
            && self
                .entries
                .iter()
                .all(|(name, amount)| other.get(name) == Some(amount))
    }
}

impl Eq for ResourceVector {}

impl ResourceVector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a vector from `(name, amount)` pairs, rejecting a repeated name.
    pub fn from_entries<I: IntoIterator<Item = (String, ResourceAmount)>>(
        entries: I,
    ) -> Result<Self, String> {
        let mut vector = ResourceVector::new();
        for (name, amount) in entries {
            if vector.get(&name).is_some() {
                return Err(format!("resource '{name}' is specified more than once"));
            }
            vector.entries.push((name, amount));
        }
        Ok(vector)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&ResourceAmount> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, amount)| amount)
    }

    /// Replaces the amount of an existing resource or appends a new one.
    pub fn insert(&mut self, name: &str, amount: ResourceAmount) {
        match self.entries.iter_mut().find(|(n, _)| n == name) {
            Some((_, current)) => *current = amount,
            None => self.entries.push((name.to_string(), amount)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ResourceAmount)> {
        self.entries
            .iter()
            .map(|(name, amount)| (name.as_str(), amount))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    /// Whole number of cpus, zero when `ncpus` is missing.
    pub fn ncpus(&self) -> u64 {
        self.get(NCPUS_RESOURCE_NAME)
            .and_then(|amount| amount.units())
            .unwrap_or(0)
    }

    pub fn mem_kb(&self) -> u64 {
        self.get(MEM_RESOURCE_NAME)
            .and_then(|amount| amount.as_kb())
            .unwrap_or(0)
    }

    /// True if every consumable amount is zero.
    pub fn is_zero(&self) -> bool {
        self.entries
            .iter()
            .all(|(_, amount)| !amount.is_consumable() || amount.is_zero())
    }

    /// Adds `other` into `self`. Names not yet present are appended in `other`'s order,
    /// string resources are only copied over when missing.
    pub fn add_assign(&mut self, other: &ResourceVector) -> crate::Result<()> {
        for (name, amount) in &other.entries {
            match self.entries.iter_mut().find(|(n, _)| n == name) {
                Some((_, current)) if amount.is_consumable() => {
                    *current = current
                        .checked_add(amount)
                        .map_err(|e| e.into_error(name))?;
                }
                Some(_) => {}
                None => self.entries.push((name.clone(), amount.clone())),
            }
        }
        Ok(())
    }

    /// Subtracts the consumable amounts of `other` from `self`.
    pub fn sub_assign(&mut self, other: &ResourceVector) -> crate::Result<()> {
        for (name, amount) in &other.entries {
            if !amount.is_consumable() {
                continue;
            }
            match self.entries.iter_mut().find(|(n, _)| n == name) {
                Some((_, current)) => {
                    *current = current
                        .checked_sub(amount)
                        .map_err(|e| e.into_error(name))?;
                }
                None if amount.is_zero() => {}
                None => {
                    return Err(VnodeError::Underflow {
                        resource: name.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    pub fn checked_add(&self, other: &ResourceVector) -> crate::Result<ResourceVector> {
        let mut result = self.clone();
        result.add_assign(other)?;
        Ok(result)
    }

    pub fn checked_sub(&self, other: &ResourceVector) -> crate::Result<ResourceVector> {
        let mut result = self.clone();
        result.sub_assign(other)?;
        Ok(result)
    }

    pub fn sum<'a, I: IntoIterator<Item = &'a ResourceVector>>(
        vectors: I,
    ) -> crate::Result<ResourceVector> {
        let mut total = ResourceVector::new();
        for vector in vectors {
            total.add_assign(vector)?;
        }
        Ok(total)
    }

    /// Only the consumable entries.
    pub fn consumables(&self) -> ResourceVector {
        ResourceVector {
            entries: self
                .entries
                .iter()
                .filter(|(_, amount)| amount.is_consumable())
                .cloned()
                .collect(),
        }
    }
}

/// Renders `key1=val1:key2=val2` in insertion order.
impl fmt::Display for ResourceVector {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (index, (name, amount)) in self.entries.iter().enumerate() {
            if index > 0 {
                f.write_str(":")?;
            }
            write!(f, "{name}={amount}")?;
        }
        Ok(())
    }
}

impl FromIterator<(String, ResourceAmount)> for ResourceVector {
    /// Later duplicates overwrite earlier amounts.
    fn from_iter<T: IntoIterator<Item = (String, ResourceAmount)>>(iter: T) -> Self {
        let mut vector = ResourceVector::new();
        for (name, amount) in iter {
            vector.insert(&name, amount);
        }
        vector
    }
}

impl Serialize for ResourceVector {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, amount) in &self.entries {
            map.serialize_entry(name, amount)?;
        }
        map.end()
    }
}

struct ResourceVectorVisitor;

impl<'de> Visitor<'de> for ResourceVectorVisitor {
    type Value = ResourceVector;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a map of resource names to amounts")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut vector = ResourceVector::new();
        while let Some((name, amount)) = access.next_entry::<String, ResourceAmount>()? {
            vector.insert(&name, amount);
        }
        Ok(vector)
    }
}

impl<'de> Deserialize<'de> for ResourceVector {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(ResourceVectorVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::amount::parse_amount;

    fn vector(entries: &[(&str, &str)]) -> ResourceVector {
        entries
            .iter()
            .map(|(name, value)| (name.to_string(), parse_amount(value).unwrap()))
            .collect()
    }

    #[test]
    fn test_sum_keeps_first_seen_order() {
        let a = vector(&[("mem", "1gb"), ("ncpus", "1")]);
        let b = vector(&[("ncpus", "2"), ("mpiprocs", "2")]);
        let total = ResourceVector::sum([&a, &b]).unwrap();
        assert_eq!(total.to_string(), "mem=1048576kb:ncpus=3:mpiprocs=2");
    }

    #[test]
    fn test_sub() {
        let a = vector(&[("ncpus", "8"), ("mem", "6gb")]);
        let b = vector(&[("mem", "4gb"), ("ncpus", "5")]);
        assert_eq!(a.checked_sub(&b).unwrap().to_string(), "ncpus=3:mem=2097152kb");
    }

    #[test]
    fn test_sub_underflow() {
        let a = vector(&[("ncpus", "1")]);
        let b = vector(&[("ncpus", "2")]);
        assert_eq!(
            a.checked_sub(&b),
            Err(VnodeError::Underflow {
                resource: "ncpus".to_string()
            })
        );
        let c = vector(&[("mem", "1kb")]);
        assert!(a.checked_sub(&c).is_err());
    }

    #[test]
    fn test_strings_are_not_summed() {
        let a = vector(&[("arch", "linux"), ("ncpus", "1")]);
        let b = vector(&[("arch", "linux"), ("ncpus", "1")]);
        let total = a.checked_add(&b).unwrap();
        assert_eq!(total.to_string(), "arch=linux:ncpus=2");
        assert_eq!(total.checked_sub(&b).unwrap().to_string(), "arch=linux:ncpus=1");
    }

    #[test]
    fn test_kind_mismatch_names_resource() {
        let a = vector(&[("mem", "1gb")]);
        let b = vector(&[("mem", "1")]);
        assert_eq!(
            a.checked_add(&b),
            Err(VnodeError::KindMismatch {
                resource: "mem".to_string(),
                left: "size",
                right: "count",
            })
        );
    }

    #[test]
    fn test_from_entries_rejects_duplicates() {
        let entries = vec![
            ("ncpus".to_string(), ResourceAmount::Count(1)),
            ("ncpus".to_string(), ResourceAmount::Count(2)),
        ];
        assert!(ResourceVector::from_entries(entries).is_err());
    }

    #[test]
    fn test_equality_ignores_order() {
        let a = vector(&[("ncpus", "3"), ("mem", "2gb")]);
        let b = vector(&[("mem", "2gb"), ("ncpus", "3")]);
        assert_eq!(a, b);
        assert_ne!(a, vector(&[("mem", "2gb")]));
        assert_ne!(a, vector(&[("mem", "2gb"), ("ncpus", "2")]));
    }

    #[test]
    fn test_accessors() {
        let a = vector(&[("ncpus", "3"), ("mem", "2gb")]);
        assert_eq!(a.ncpus(), 3);
        assert_eq!(a.mem_kb(), 2097152);
        assert!(!a.is_zero());
        assert!(vector(&[("ncpus", "0"), ("arch", "x86")]).is_zero());
    }

    #[test]
    fn test_serde_preserves_order() {
        let a = vector(&[("ncpus", "3"), ("mem", "2gb")]);
        let json = serde_json::to_string(&a).unwrap();
        assert_eq!(json, r#"{"ncpus":"3","mem":"2097152kb"}"#);
        let b: ResourceVector = serde_json::from_str(&json).unwrap();
        assert_eq!(a, b);
    }
}

use std::fmt;
use std::str::FromStr;

use chumsky::Parser;
use chumsky::error::Simple;
use chumsky::primitive::just;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::assignment::parser::{parse_resource, resource_vector};
use crate::common::error::VnodeError;
use crate::common::parser::{CharParser, all_consuming, parse_u64};
use crate::resources::{ResourceAmount, ResourceVector};

/// Resource that pins a select chunk to a specific mom host.
pub const HOST_RESOURCE_NAME: &str = "host";
/// Resource that pins a select chunk to a specific vnode.
pub const VNODE_RESOURCE_NAME: &str = "vnode";

/// One `N:res=val:...` term of a select specification.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SelectChunk {
    count: u32,
    resources: ResourceVector,
}

impl SelectChunk {
    pub fn new(count: u32, resources: ResourceVector) -> Self {
        assert!(count > 0);
        Self { count, resources }
    }

    #[inline]
    pub fn count(&self) -> u32 {
        self.count
    }

    /// Minimum resources of a single chunk.
    #[inline]
    pub fn resources(&self) -> &ResourceVector {
        &self.resources
    }

    pub fn required_host(&self) -> Option<&str> {
        self.string_resource(HOST_RESOURCE_NAME)
    }

    pub fn required_vnode(&self) -> Option<&str> {
        self.string_resource(VNODE_RESOURCE_NAME)
    }

    fn string_resource(&self, name: &str) -> Option<&str> {
        match self.resources.get(name) {
            Some(ResourceAmount::String(value)) => Some(value),
            _ => None,
        }
    }
}

impl fmt::Display for SelectChunk {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.count)?;
        if !self.resources.is_empty() {
            write!(f, ":{}", self.resources)?;
        }
        Ok(())
    }
}

/// A parsed select specification, e.g. `2:ncpus=3:mem=2gb+ncpus=2`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SelectSpec {
    chunks: Vec<SelectChunk>,
}

impl SelectSpec {
    pub fn new(chunks: Vec<SelectChunk>) -> Self {
        Self { chunks }
    }

    #[inline]
    pub fn chunks(&self) -> &[SelectChunk] {
        &self.chunks
    }

    /// Number of chunks once every term is repeated `count` times, `None` on overflow.
    pub fn total_chunks(&self) -> Option<u64> {
        self.chunks
            .iter()
            .try_fold(0u64, |total, chunk| total.checked_add(u64::from(chunk.count)))
    }

    /// Yields every requested chunk separately, in specification order.
    pub fn expand(&self) -> impl Iterator<Item = &SelectChunk> {
        self.chunks
            .iter()
            .flat_map(|chunk| std::iter::repeat_n(chunk, chunk.count as usize))
    }
}

impl fmt::Display for SelectSpec {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (index, chunk) in self.chunks.iter().enumerate() {
            if index > 0 {
                f.write_str("+")?;
            }
            write!(f, "{chunk}")?;
        }
        Ok(())
    }
}

fn parse_count() -> impl CharParser<u32> {
    parse_u64()
        .try_map(|count, span| match u32::try_from(count) {
            Ok(count) if count > 0 => Ok(count),
            _ => Err(Simple::custom(span, "chunk count must be a positive integer")),
        })
        .labelled("chunk count")
}

/// Parses `N`, `N:res=val(:res=val)*` or `res=val(:res=val)*`.
fn parse_select_chunk() -> impl CharParser<SelectChunk> {
    let resources = || just(':').ignore_then(parse_resource()).repeated();
    let counted = parse_count().then(resources());
    let implicit = parse_resource()
        .then(resources())
        .map(|(first, mut rest)| {
            rest.insert(0, first);
            (1, rest)
        });
    counted
        .or(implicit)
        .try_map(|(count, resources), span| {
            Ok(SelectChunk::new(count, resource_vector(resources, span)?))
        })
}

fn parse_select() -> impl CharParser<SelectSpec> {
    all_consuming(parse_select_chunk().separated_by(just('+')).at_least(1)).map(SelectSpec::new)
}

pub fn parse_select_spec(input: &str) -> crate::Result<SelectSpec> {
    parse_select()
        .parse_text(input)
        .map_err(|error| VnodeError::MalformedSelect(error.to_string()))
}

impl FromStr for SelectSpec {
    type Err = VnodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_select_spec(s)
    }
}

impl Serialize for SelectSpec {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SelectSpec {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        parse_select_spec(&value).map_err(D::Error::custom)
    }
}

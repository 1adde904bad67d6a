use std::fmt;
use std::str::FromStr;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::assignment::chunk::Chunk;
use crate::assignment::parser::parse_exec_vnode;
use crate::assignment::vnode::{HostMap, VnodeRef};
use crate::common::error::VnodeError;
use crate::common::{Map, Set};
use crate::resources::ResourceVector;

/// The full node assignment of a job, i.e. a parsed `exec_vnode` attribute.
///
/// Chunk order follows the select specification; the first vnode of the first chunk is
/// the mother superior.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExecVnodeAssignment {
    chunks: Vec<Chunk>,
    total: ResourceVector,
}

impl ExecVnodeAssignment {
    pub fn from_chunks(chunks: Vec<Chunk>) -> crate::Result<Self> {
        if chunks.is_empty() {
            return Err(VnodeError::MalformedExecVnode(
                "assignment without chunks".to_string(),
            ));
        }
        let total = ResourceVector::sum(chunks.iter().map(|chunk| chunk.total()))?;
        Ok(ExecVnodeAssignment { chunks, total })
    }

    #[inline]
    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    #[inline]
    pub fn total_resources(&self) -> &ResourceVector {
        &self.total
    }

    #[inline]
    pub fn nodect(&self) -> usize {
        self.chunks.len()
    }

    /// The mother superior vnode.
    #[inline]
    pub fn primary_vnode(&self) -> &VnodeRef {
        self.chunks[0].first()
    }

    pub fn primary_host<'a>(&'a self, hosts: &'a HostMap) -> &'a str {
        hosts.host_of(self.primary_vnode().name())
    }

    pub fn contains_vnode(&self, name: &str) -> bool {
        self.chunks.iter().any(|chunk| chunk.contains(name))
    }

    pub fn vnodes(&self) -> impl Iterator<Item = &VnodeRef> {
        self.chunks.iter().flat_map(|chunk| chunk.vnodes().iter())
    }

    /// Distinct vnode names in order of their first appearance.
    pub fn vnode_names(&self) -> Vec<&str> {
        let mut seen = Set::default();
        self.vnodes()
            .map(|vnode| vnode.name())
            .filter(|name| seen.insert(*name))
            .collect()
    }

    /// Distinct mom hosts in order of their first appearance.
    pub fn hosts<'a>(&'a self, hosts: &'a HostMap) -> Vec<&'a str> {
        let mut seen = Set::default();
        self.vnodes()
            .map(|vnode| hosts.host_of(vnode.name()))
            .filter(|host| seen.insert(*host))
            .collect()
    }

    /// Renders the `exec_host` attribute, one `host/index[*ncpus]` term per chunk.
    ///
    /// `index` counts the chunks already placed on the same host, `*ncpus` is left out
    /// when the chunk holds exactly one cpu.
    pub fn exec_host(&self, hosts: &HostMap) -> String {
        let mut slots: Map<&str, usize> = Map::default();
        let mut terms = Vec::with_capacity(self.chunks.len());
        for chunk in &self.chunks {
            let host = hosts.host_of(chunk.first().name());
            let slot = slots.entry(host).or_insert(0);
            let ncpus = chunk.total().ncpus();
            if ncpus == 1 {
                terms.push(format!("{host}/{slot}"));
            } else {
                terms.push(format!("{host}/{slot}*{ncpus}"));
            }
            *slot += 1;
        }
        terms.join("+")
    }

    /// Renders the scheduled select, one `1:<chunk total>` term per chunk.
    pub fn schedselect(&self) -> String {
        self.chunks
            .iter()
            .map(|chunk| format!("1:{}", chunk.total()))
            .collect::<Vec<_>>()
            .join("+")
    }
}

pub fn format_exec_vnode(assignment: &ExecVnodeAssignment) -> String {
    assignment.to_string()
}

impl fmt::Display for ExecVnodeAssignment {
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

impl FromStr for ExecVnodeAssignment {
    type Err = VnodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_exec_vnode(s)
    }
}

impl Serialize for ExecVnodeAssignment {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ExecVnodeAssignment {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        parse_exec_vnode(&value).map_err(D::Error::custom)
    }
}

use std::fmt;

use smallvec::SmallVec;

use crate::assignment::vnode::VnodeRef;
use crate::common::error::VnodeError;
use crate::resources::ResourceVector;

/// One parenthesized group of an exec_vnode string.
///
/// Invariant: holds at least one vnode and `total` is the sum of all vnode resources.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Chunk {
    vnodes: SmallVec<[VnodeRef; 1]>,
    total: ResourceVector,
}

impl Chunk {
    pub fn try_new<I: IntoIterator<Item = VnodeRef>>(vnodes: I) -> crate::Result<Chunk> {
        let vnodes: SmallVec<[VnodeRef; 1]> = vnodes.into_iter().collect();
        if vnodes.is_empty() {
            return Err(VnodeError::MalformedExecVnode(
                "chunk without vnodes".to_string(),
            ));
        }
        let total = ResourceVector::sum(vnodes.iter().map(|vnode| vnode.resources()))?;
        Ok(Chunk { vnodes, total })
    }

    #[inline]
    pub fn vnodes(&self) -> &[VnodeRef] {
        &self.vnodes
    }

    /// The first vnode; for the first chunk of a job this is the mother superior.
    #[inline]
    pub fn first(&self) -> &VnodeRef {
        &self.vnodes[0]
    }

    #[inline]
    pub fn total(&self) -> &ResourceVector {
        &self.total
    }

    pub fn contains(&self, name: &str) -> bool {
        self.vnodes.iter().any(|vnode| vnode.name() == name)
    }

    #[inline]
    pub fn is_super_chunk(&self) -> bool {
        self.vnodes.len() > 1
    }

    /// Returns the chunk without every occurrence of vnode `name`.
    /// `None` means the last vnode was removed and the chunk has to be dropped.
    pub fn remove_vnode(&self, name: &str) -> crate::Result<Option<Chunk>> {
        if !self.contains(name) {
            return Ok(Some(self.clone()));
        }
        let remaining: Vec<VnodeRef> = self
            .vnodes
            .iter()
            .filter(|vnode| vnode.name() != name)
            .cloned()
            .collect();
        if remaining.is_empty() {
            return Ok(None);
        }
        // Recomputed from scratch so that string resources of the removed vnode vanish.
        Chunk::try_new(remaining).map(Some)
    }
}

impl fmt::Display for Chunk {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("(")?;
        for (index, vnode) in self.vnodes.iter().enumerate() {
            if index > 0 {
                f.write_str("+")?;
            }
            write!(f, "{vnode}")?;
        }
        f.write_str(")")
    }
}

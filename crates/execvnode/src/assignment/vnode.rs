use std::fmt;

use crate::common::Map;
use crate::resources::ResourceVector;

/// One vnode of an exec_vnode chunk together with the resources the job holds on it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VnodeRef {
    name: String,
    resources: ResourceVector,
}

impl VnodeRef {
    pub fn new(name: impl Into<String>, resources: ResourceVector) -> Self {
        Self {
            name: name.into(),
            resources,
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn resources(&self) -> &ResourceVector {
        &self.resources
    }
}

impl fmt::Display for VnodeRef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.name)?;
        if !self.resources.is_empty() {
            write!(f, ":{}", self.resources)?;
        }
        Ok(())
    }
}

/// Name of the natural vnode of `vnode`: `hostA[2]` lives on `hostA`.
pub fn natural_host(vnode: &str) -> &str {
    match vnode.find('[') {
        Some(position) if vnode.ends_with(']') && position > 0 => &vnode[..position],
        _ => vnode,
    }
}

/// Resolves vnodes to the mom host that manages them.
///
/// Vnodes without an explicit entry resolve to [`natural_host`].
#[derive(Clone, Debug, Default)]
pub struct HostMap {
    hosts: Map<String, String>,
}

impl HostMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, vnode: impl Into<String>, host: impl Into<String>) {
        self.hosts.insert(vnode.into(), host.into());
    }

    pub fn host_of<'a>(&'a self, vnode: &'a str) -> &'a str {
        self.hosts
            .get(vnode)
            .map(|host| host.as_str())
            .unwrap_or_else(|| natural_host(vnode))
    }
}

impl<V: Into<String>, H: Into<String>> FromIterator<(V, H)> for HostMap {
    fn from_iter<T: IntoIterator<Item = (V, H)>>(iter: T) -> Self {
        let mut map = HostMap::new();
        for (vnode, host) in iter {
            map.insert(vnode, host);
        }
        map
    }
}

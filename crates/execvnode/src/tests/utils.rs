use derive_builder::Builder;

use crate::assignment::{HostMap, VnodeRef};
use crate::release::{JobState, JobSubstate, ReleaseContext, ReleaseOrigin, VnodeOrder};
use crate::resources::{ResourceVector, parse_amount};

pub const JOB1_EXEC_VNODE: &str = "(nA:mem=1048576kb:ncpus=1+nA2:mem=1048576kb:ncpus=1+nA3:ncpus=1)+(nB:mem=1048576kb:ncpus=1+nB2:mem=1048576kb:ncpus=1+nB3:ncpus=1)+(nC:ncpus=2:mem=2097152kb)";

/// Natural vnodes nA, nB and nC, each with two extra vnodes except nC.
pub fn job1_hosts() -> HostMap {
    [
        ("nA2", "nA"),
        ("nA3", "nA"),
        ("nB2", "nB"),
        ("nB3", "nB"),
    ]
    .into_iter()
    .collect()
}

pub fn job1_context() -> ReleaseContext {
    ContextBuilder::default().finish()
}

/// Parses `res=val:res=val`, an empty string gives an empty vector.
pub fn resources(input: &str) -> ResourceVector {
    input
        .split(':')
        .filter(|item| !item.is_empty())
        .map(|item| {
            let (name, value) = item.split_once('=').unwrap();
            (name.to_string(), parse_amount(value).unwrap())
        })
        .collect()
}

pub fn vnode(name: &str, res: &str) -> VnodeRef {
    VnodeRef::new(name, resources(res))
}

pub fn sorted_vec<T: Ord>(mut vec: Vec<T>) -> Vec<T> {
    vec.sort();
    vec
}

pub fn enable_test_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub use ContextConfigBuilder as ContextBuilder;

#[derive(Builder, Default, Clone)]
#[builder(pattern = "owned", derive(Clone))]
pub struct ContextConfig {
    #[builder(default)]
    state: JobState,
    #[builder(default)]
    substate: JobSubstate,
    #[builder(default)]
    array_parent: bool,
    #[builder(default)]
    origin: ReleaseOrigin,
    #[builder(default = "job1_hosts()")]
    hosts: HostMap,
    #[builder(default, setter(custom))]
    cray_hosts: Vec<String>,
    #[builder(default, setter(custom))]
    failed_vnodes: Vec<String>,
    #[builder(default, setter(custom))]
    failed_hosts: Vec<String>,
    #[builder(default)]
    vnode_order: VnodeOrder,
}

fn owned<'a>(names: impl IntoIterator<Item = &'a str>) -> Option<Vec<String>> {
    Some(names.into_iter().map(|name| name.to_string()).collect())
}

impl ContextConfigBuilder {
    pub fn cray_hosts<'a>(mut self, hosts: impl IntoIterator<Item = &'a str>) -> Self {
        self.cray_hosts = owned(hosts);
        self
    }

    pub fn failed_vnodes<'a>(mut self, vnodes: impl IntoIterator<Item = &'a str>) -> Self {
        self.failed_vnodes = owned(vnodes);
        self
    }

    pub fn failed_hosts<'a>(mut self, hosts: impl IntoIterator<Item = &'a str>) -> Self {
        self.failed_hosts = owned(hosts);
        self
    }

    /// Pruning context of a job that is still resolving its healthy nodes.
    pub fn node_resolution(self) -> Self {
        self.substate(JobSubstate::Prerun)
            .origin(ReleaseOrigin::NodeResolution)
    }

    pub fn finish(self) -> ReleaseContext {
        let ContextConfig {
            state,
            substate,
            array_parent,
            origin,
            hosts,
            cray_hosts,
            failed_vnodes,
            failed_hosts,
            vnode_order,
        }: ContextConfig = self.build().unwrap();
        ReleaseContext {
            state,
            substate,
            array_parent,
            origin,
            hosts,
            cray_hosts: cray_hosts.into_iter().collect(),
            failed_vnodes: failed_vnodes.into_iter().collect(),
            failed_hosts: failed_hosts.into_iter().collect(),
            vnode_order,
        }
    }
}

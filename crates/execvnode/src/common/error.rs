use thiserror::Error;

#[allow(clippy::enum_variant_names)]
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VnodeError {
    #[error("Invalid resource value: {0}")]
    Parse(String),
    #[error("Malformed exec_vnode: {0}")]
    MalformedExecVnode(String),
    #[error("Malformed select specification: {0}")]
    MalformedSelect(String),
    #[error("Resource '{resource}' mixes {left} and {right} amounts")]
    KindMismatch {
        resource: String,
        left: &'static str,
        right: &'static str,
    },
    #[error("Resource '{resource}' would become negative")]
    Underflow { resource: String },
    #[error("node(s) requested to be released not part of the job: {0}")]
    ExplicitVnodeNotAssigned(String),
    #[error("Can't free '{0}' since it's on a primary execution host")]
    PrimaryHostProtected(String),
    #[error("not currently supported on Cray X* series nodes: {0}")]
    UnsupportedPlatform(String),
    #[error("Request invalid for state of job")]
    JobNotRunning,
    #[error("Request not supported for an array job, use a subjob instead")]
    NotSupportedForArrayParent,
    #[error("Request invalid for state of job")]
    ExclusiveNonPrimaryNotReady,
    #[error("not enough healthy resources to satisfy select chunk {chunk}: {select}")]
    InsufficientHealthyResources { chunk: usize, select: String },
    #[error("No vnodes were given to release")]
    EmptyRequest,
}

impl VnodeError {
    /// Short stable name of the failure class.
    pub fn kind(&self) -> &'static str {
        match self {
            VnodeError::Parse(_) => "ParseError",
            VnodeError::MalformedExecVnode(_) => "MalformedExecVnode",
            VnodeError::MalformedSelect(_) => "MalformedSelect",
            VnodeError::KindMismatch { .. } => "KindMismatch",
            VnodeError::Underflow { .. } => "Underflow",
            VnodeError::ExplicitVnodeNotAssigned(_) => "ExplicitVnodeNotAssigned",
            VnodeError::PrimaryHostProtected(_) => "PrimaryHostProtected",
            VnodeError::UnsupportedPlatform(_) => "UnsupportedPlatform",
            VnodeError::JobNotRunning => "JobNotRunning",
            VnodeError::NotSupportedForArrayParent => "NotSupportedForArrayParent",
            VnodeError::ExclusiveNonPrimaryNotReady => "ExclusiveNonPrimaryNotReady",
            VnodeError::InsufficientHealthyResources { .. } => "InsufficientHealthyResources",
            VnodeError::EmptyRequest => "EmptyRequest",
        }
    }
}

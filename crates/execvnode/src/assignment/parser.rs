use chumsky::Parser;
use chumsky::error::Simple;
use chumsky::primitive::{filter, just};

use crate::assignment::chunk::Chunk;
use crate::assignment::execvnode::ExecVnodeAssignment;
use crate::assignment::vnode::VnodeRef;
use crate::common::error::VnodeError;
use crate::common::parser::{CharParser, all_consuming};
use crate::resources::{ResourceAmount, ResourceVector, parse_amount};

/// Characters that separate tokens of exec_vnode and select strings.
#[inline]
fn is_delimiter(c: char) -> bool {
    matches!(c, '(' | ')' | '+' | ':' | '=') || c.is_whitespace()
}

fn parse_token(label: &'static str) -> impl CharParser<String> {
    filter(|c: &char| !is_delimiter(*c))
        .repeated()
        .at_least(1)
        .collect::<String>()
        .labelled(label)
}

/// Parses `name=value`.
pub(crate) fn parse_resource() -> impl CharParser<(String, ResourceAmount)> {
    parse_token("resource name")
        .then_ignore(just('='))
        .then(parse_token("resource value").try_map(|value, span| {
            parse_amount(&value).map_err(|error| Simple::custom(span, error))
        }))
}

pub(crate) fn resource_vector(
    entries: Vec<(String, ResourceAmount)>,
    span: std::ops::Range<usize>,
) -> Result<ResourceVector, Simple<char>> {
    ResourceVector::from_entries(entries).map_err(|error| Simple::custom(span, error))
}

/// Parses `name(:res=value)*`.
fn parse_vnode_entry() -> impl CharParser<VnodeRef> {
    parse_token("vnode name")
        .then(just(':').ignore_then(parse_resource()).repeated())
        .try_map(|(name, resources), span| {
            Ok(VnodeRef::new(name, resource_vector(resources, span)?))
        })
}

/// Parses `(entry(+entry)*)`.
fn parse_chunk() -> impl CharParser<Chunk> {
    parse_vnode_entry()
        .separated_by(just('+'))
        .at_least(1)
        .delimited_by(just('('), just(')'))
        .try_map(|vnodes, span| {
            Chunk::try_new(vnodes).map_err(|error| Simple::custom(span, error))
        })
        .labelled("chunk")
}

fn parse_assignment() -> impl CharParser<ExecVnodeAssignment> {
    all_consuming(parse_chunk().separated_by(just('+')).at_least(1)).try_map(|chunks, span| {
        ExecVnodeAssignment::from_chunks(chunks).map_err(|error| Simple::custom(span, error))
    })
}

/// Parses an exec_vnode string such as `(nA:ncpus=1+nA2:ncpus=1)+(nB:mem=1048576kb)`.
///
/// `+` separates vnodes inside parentheses and chunks outside of them.
pub fn parse_exec_vnode(input: &str) -> crate::Result<ExecVnodeAssignment> {
    parse_assignment()
        .parse_text(input)
        .map_err(|error| VnodeError::MalformedExecVnode(error.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format_exec_vnode;
    use crate::tests::utils::JOB1_EXEC_VNODE;

    fn roundtrip(input: &str) {
        let assignment = parse_exec_vnode(input).unwrap();
        assert_eq!(format_exec_vnode(&assignment), input);
    }

    #[test]
    fn test_roundtrip_corpus() {
        roundtrip(JOB1_EXEC_VNODE);
        roundtrip("(nA:ncpus=1)");
        roundtrip("(nA:ncpus=3:mem=2097152kb)+(nB:mem=2097152kb:ncpus=3)+(nC:ncpus=2:mem=2097152kb)");
        roundtrip("(hostA[0]:ncpus=1:mem=1048576kb+hostA[1]:ncpus=1)+(hostB[0]:ncpus=2)");
        roundtrip("(n1.example.com:ncpus=1:mpiprocs=1:ompthreads=1)");
        roundtrip("(nA:ncpus=0)+(nB:ncpus=0)+(nC:ncpus=2)");
        roundtrip("(nA)");
    }

    #[test]
    fn test_key_order_is_kept() {
        let assignment = parse_exec_vnode("(nA:ncpus=1:mem=1kb+nB:mem=1kb:ncpus=1)").unwrap();
        let chunk = &assignment.chunks()[0];
        assert_eq!(chunk.vnodes()[0].resources().to_string(), "ncpus=1:mem=1kb");
        assert_eq!(chunk.vnodes()[1].resources().to_string(), "mem=1kb:ncpus=1");
        assert_eq!(chunk.total().to_string(), "ncpus=2:mem=2kb");
    }

    #[test]
    fn test_sizes_are_normalized() {
        let assignment = parse_exec_vnode("(nA:mem=2gb:ncpus=1)").unwrap();
        assert_eq!(format_exec_vnode(&assignment), "(nA:mem=2097152kb:ncpus=1)");
    }

    #[test]
    fn test_chunks_and_super_chunks() {
        let assignment = parse_exec_vnode(JOB1_EXEC_VNODE).unwrap();
        let sizes: Vec<_> = assignment
            .chunks()
            .iter()
            .map(|chunk| chunk.vnodes().len())
            .collect();
        assert_eq!(sizes, vec![3, 3, 1]);
    }

    fn check_malformed(input: &str) {
        match parse_exec_vnode(input) {
            Err(VnodeError::MalformedExecVnode(_)) => {}
            result => panic!("{input:?} should be malformed, got {result:?}"),
        }
    }

    #[test]
    fn test_malformed() {
        check_malformed("");
        check_malformed("()");
        check_malformed("(nA:ncpus=1");
        check_malformed("nA:ncpus=1)");
        check_malformed("(nA:ncpus=1))");
        check_malformed("(nA:ncpus=1)+");
        check_malformed("(nA:ncpus=1)+()");
        check_malformed("(nA:ncpus=1+)");
        check_malformed("(nA:ncpus)");
        check_malformed("(nA:ncpus=)");
        check_malformed("(nA:ncpus=1:ncpus=2)");
        check_malformed("(nA:mem=2xb)");
        check_malformed("(nA:ncpus=1)(nB:ncpus=1)");
        check_malformed("(nA: ncpus=1)");
    }

    #[test]
    fn test_error_message_names_position() {
        let error = parse_exec_vnode("(nA:ncpus=1").unwrap_err();
        let message = error.to_string();
        assert!(message.starts_with("Malformed exec_vnode: "), "{message}");
        assert!(message.contains("unexpected end of input"), "{message}");
    }
}

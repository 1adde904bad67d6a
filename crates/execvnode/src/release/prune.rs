use std::cmp::{Ordering, Reverse};

use crate::assignment::{Chunk, ExecVnodeAssignment, HostMap, VnodeRef};
use crate::common::Map;
use crate::common::error::VnodeError;
use crate::release::request::{ReleaseContext, VnodeOrder};
use crate::resources::ResourceVector;
use crate::select::{SelectChunk, SelectSpec};

/// Healthy part of one chunk of the current assignment.
struct Candidate<'a> {
    index: usize,
    /// In consumption order; for chunk 0 the mother superior is always first.
    vnodes: Vec<&'a VnodeRef>,
}

fn order_vnodes(vnodes: &mut [&VnodeRef], order: VnodeOrder) {
    match order {
        VnodeOrder::Assigned => {}
        VnodeOrder::MostCpusFirst => {
            vnodes.sort_by_key(|vnode| Reverse(vnode.resources().ncpus()));
        }
    }
}

fn candidates<'a>(assignment: &'a ExecVnodeAssignment, ctx: &ReleaseContext) -> Vec<Candidate<'a>> {
    let primary = assignment.primary_vnode();
    assignment
        .chunks()
        .iter()
        .enumerate()
        .filter_map(|(index, chunk)| {
            let mut vnodes: Vec<&VnodeRef> = chunk
                .vnodes()
                .iter()
                .enumerate()
                .filter(|(position, vnode)| {
                    (index == 0 && *position == 0) || ctx.is_healthy(vnode.name())
                })
                .map(|(_, vnode)| vnode)
                .collect();
            if index == 0 {
                debug_assert_eq!(vnodes[0].name(), primary.name());
                order_vnodes(&mut vnodes[1..], ctx.vnode_order);
            } else {
                order_vnodes(&mut vnodes, ctx.vnode_order);
            }
            (!vnodes.is_empty()).then_some(Candidate { index, vnodes })
        })
        .collect()
}

fn matches_placement(vnode: &VnodeRef, required: &SelectChunk, hosts: &HostMap) -> bool {
    required
        .required_host()
        .is_none_or(|host| hosts.host_of(vnode.name()) == host)
        && required
            .required_vnode()
            .is_none_or(|name| vnode.name() == name)
}

/// True if the vnodes together hold at least the requested consumable amounts.
fn has_enough(vnodes: &[&VnodeRef], requested: &ResourceVector) -> crate::Result<bool> {
    for (name, need) in requested.iter() {
        let Some(mut available) = need.zero_like() else {
            continue;
        };
        for amount in vnodes.iter().filter_map(|vnode| vnode.resources().get(name)) {
            available = available
                .checked_add(amount)
                .map_err(|e| e.into_error(name))?;
        }
        if available.compare(need).map_err(|e| e.into_error(name))? == Ordering::Less {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Carves `required` out of the candidate, or returns `None` if it does not fit.
///
/// Vnodes are consumed in candidate order, each one gives at most what is still missing.
/// Only the requested resources are kept on the chosen vnodes.
fn take_chunk(
    candidate: &Candidate,
    required: &SelectChunk,
    hosts: &HostMap,
    pin_first: bool,
) -> crate::Result<Option<Chunk>> {
    let vnodes: Vec<&VnodeRef> = candidate
        .vnodes
        .iter()
        .copied()
        .filter(|vnode| matches_placement(vnode, required, hosts))
        .collect();
    if vnodes.is_empty() {
        return Ok(None);
    }
    if pin_first && vnodes[0].name() != candidate.vnodes[0].name() {
        return Ok(None);
    }

    let requested = required.resources().consumables();
    if !has_enough(&vnodes, &requested)? {
        return Ok(None);
    }

    let take_first = pin_first || requested.is_zero();
    let mut remaining = requested;
    let mut chosen = Vec::new();
    for (position, vnode) in vnodes.iter().enumerate() {
        if position > 0 && remaining.is_zero() {
            break;
        }
        let mut taken = ResourceVector::new();
        for (name, have) in vnode.resources().iter() {
            let Some(need) = remaining.get(name) else {
                continue;
            };
            let amount = have.min(need).map_err(|e| e.into_error(name))?;
            if !amount.is_zero() || need.is_zero() {
                taken.insert(name, amount.clone());
            }
        }
        if taken.is_zero() && !(position == 0 && take_first) {
            continue;
        }
        remaining.sub_assign(&taken)?;
        chosen.push(VnodeRef::new(vnode.name(), taken));
    }

    if chosen.is_empty() || !remaining.is_zero() {
        return Ok(None);
    }
    Chunk::try_new(chosen).map(Some)
}

/// Select chunks matched to candidates, `owner[slot]` is the select position served by
/// candidate `slot`.
struct Matching<'a, 'c> {
    candidates: &'c [Candidate<'a>],
    required: Vec<&'c SelectChunk>,
    hosts: &'c HostMap,
    /// Results of `take_chunk` per (select position, candidate slot).
    fits: Map<(usize, usize), Option<Chunk>>,
    owner: Vec<Option<usize>>,
}

impl<'a, 'c> Matching<'a, 'c> {
    fn new(candidates: &'c [Candidate<'a>], select: &'c SelectSpec, hosts: &'c HostMap) -> Self {
        Self {
            candidates,
            required: select.expand().collect(),
            hosts,
            fits: Map::default(),
            owner: vec![None; candidates.len()],
        }
    }

    fn fits(&mut self, position: usize, slot: usize) -> crate::Result<bool> {
        let candidate = &self.candidates[slot];
        // Assigned chunk 0 is reserved for the first select chunk.
        if (position == 0) != (candidate.index == 0) {
            return Ok(false);
        }
        let key = (position, slot);
        if !self.fits.contains_key(&key) {
            let chunk = take_chunk(candidate, self.required[position], self.hosts, position == 0)?;
            self.fits.insert(key, chunk);
        }
        Ok(matches!(self.fits.get(&key), Some(Some(_))))
    }

    /// Gives `position` the leftmost free candidate that can hold it.
    fn first_fit(&mut self, position: usize) -> crate::Result<bool> {
        for slot in 0..self.candidates.len() {
            if self.owner[slot].is_none() && self.fits(position, slot)? {
                self.owner[slot] = Some(position);
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Frees a candidate for `position` by moving already matched select chunks along an
    /// augmenting path.
    fn augment(&mut self, position: usize, visited: &mut [bool]) -> crate::Result<bool> {
        for slot in 0..self.candidates.len() {
            if visited[slot] || !self.fits(position, slot)? {
                continue;
            }
            visited[slot] = true;
            let moved = match self.owner[slot] {
                None => true,
                Some(other) => self.augment(other, visited)?,
            };
            if moved {
                self.owner[slot] = Some(position);
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Chunks in select order.
    fn into_chunks(mut self) -> Vec<Chunk> {
        let mut served: Vec<(usize, usize)> = self
            .owner
            .iter()
            .enumerate()
            .filter_map(|(slot, owner)| owner.map(|position| (position, slot)))
            .collect();
        served.sort_unstable();
        let mut chunks = Vec::with_capacity(served.len());
        for (position, slot) in served {
            log::debug!(
                "Select chunk {position} ({}) is satisfied by assigned chunk {}",
                self.required[position],
                self.candidates[slot].index
            );
            if let Some(chunk) = self.fits.remove(&(position, slot)).flatten() {
                chunks.push(chunk);
            }
        }
        chunks
    }
}

/// Term of `select` that the select chunk at `position` comes from.
fn select_chunk_at(select: &SelectSpec, position: u64) -> Option<&SelectChunk> {
    let mut end = 0u64;
    select.chunks().iter().find(|chunk| {
        end = end.saturating_add(u64::from(chunk.count()));
        position < end
    })
}

fn insufficient(position: usize, required: Option<&SelectChunk>) -> VnodeError {
    VnodeError::InsufficientHealthyResources {
        chunk: position,
        select: required.map(|chunk| chunk.to_string()).unwrap_or_default(),
    }
}

/// Shrinks the assignment to the chunks of `select`, using healthy vnodes only.
///
/// The first select chunk is always carved out of assigned chunk 0 so that the mother
/// superior keeps its role. Every following select chunk takes the first unused assigned
/// chunk that can hold it. When none is left, earlier select chunks are moved to other
/// assigned chunks if that makes room, so the request fails only when no combination of
/// healthy chunks satisfies it.
pub(crate) fn keep_select(
    assignment: &ExecVnodeAssignment,
    select: &SelectSpec,
    ctx: &ReleaseContext,
) -> crate::Result<ExecVnodeAssignment> {
    let candidates = candidates(assignment, ctx);
    debug_assert!(candidates.len() <= assignment.nodect());

    // Each assigned chunk serves at most one select chunk.
    let available = candidates.len();
    if select
        .total_chunks()
        .is_none_or(|total| total > available as u64)
    {
        log::debug!("Select {select} needs more than {available} healthy assigned chunks");
        return Err(insufficient(
            available,
            select_chunk_at(select, available as u64),
        ));
    }

    let mut matching = Matching::new(&candidates, select, &ctx.hosts);
    for position in 0..matching.required.len() {
        if matching.first_fit(position)? {
            continue;
        }
        let mut visited = vec![false; available];
        if !matching.augment(position, &mut visited)? {
            let required = matching.required[position];
            log::debug!("No healthy chunk can satisfy select chunk {position} ({required})");
            return Err(insufficient(position, Some(required)));
        }
        log::debug!("Select chunk {position} fits after moving earlier select chunks");
    }

    ExecVnodeAssignment::from_chunks(matching.into_chunks())
}

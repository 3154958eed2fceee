//! Priority request queue.
//!
//! Entries live in an arena (`Vec<Option<Node>>`) and are linked through
//! `prev`/`next` handles, so removal by id is O(1) once the handle is found
//! in the id index. Freed handles are recycled through a free list.
//!
//! Order: higher priority first, then earlier creation. A new request is
//! linked in front of the first entry it strictly outranks, so equal keys
//! keep their submission order.

use std::collections::HashMap;

use slot_types::{AllocationError, AllocationResult, Request, RequestId};

type Handle = usize;

#[derive(Clone, Debug)]
struct Node {
    request: Request,
    prev: Option<Handle>,
    next: Option<Handle>,
}

/// Pending requests, ordered for service
#[derive(Clone, Debug, Default)]
pub struct PriorityRequestQueue {
    nodes: Vec<Option<Node>>,
    free: Vec<Handle>,
    head: Option<Handle>,
    tail: Option<Handle>,
    index: HashMap<RequestId, Handle>,
}

impl PriorityRequestQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert in priority order.
    ///
    /// A request whose id is already queued is refused and the queue is
    /// left unchanged.
    pub fn enqueue(&mut self, request: Request) -> AllocationResult<()> {
        if self.index.contains_key(request.id()) {
            return Err(AllocationError::DuplicateRequest(request.id().clone()));
        }

        // first entry the new request strictly outranks
        let mut cursor = self.head;
        while let Some(handle) = cursor {
            let node = self.node(handle);
            if request.ranks_before(&node.request) {
                break;
            }
            cursor = node.next;
        }

        let id = request.id().clone();
        let handle = self.alloc(Node {
            request,
            prev: None,
            next: None,
        });
        match cursor {
            Some(before) => self.link_before(handle, before),
            None => self.link_back(handle),
        }
        self.index.insert(id, handle);
        Ok(())
    }

    /// Remove and return the highest-ranked request
    pub fn dequeue(&mut self) -> Option<Request> {
        let handle = self.head?;
        Some(self.take(handle))
    }

    /// Remove and return the lowest-ranked request
    pub fn pop_back(&mut self) -> Option<Request> {
        let handle = self.tail?;
        Some(self.take(handle))
    }

    pub fn peek(&self) -> Option<&Request> {
        self.head.map(|h| &self.node(h).request)
    }

    pub fn peek_back(&self) -> Option<&Request> {
        self.tail.map(|h| &self.node(h).request)
    }

    /// Remove a request by id
    pub fn remove(&mut self, id: &RequestId) -> Option<Request> {
        let handle = *self.index.get(id)?;
        Some(self.take(handle))
    }

    pub fn get(&self, id: &RequestId) -> Option<&Request> {
        self.index.get(id).map(|&h| &self.node(h).request)
    }

    pub fn contains(&self, id: &RequestId) -> bool {
        self.index.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Front-to-back iterator
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            queue: self,
            cursor: self.head,
        }
    }

    /// Snapshot of all pending requests, front to back
    pub fn to_ordered_list(&self) -> Vec<Request> {
        self.iter().cloned().collect()
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn node(&self, handle: Handle) -> &Node {
        self.nodes[handle]
            .as_ref()
            .unwrap_or_else(|| unreachable!("queue handle {handle} points at a free node"))
    }

    fn node_mut(&mut self, handle: Handle) -> &mut Node {
        self.nodes[handle]
            .as_mut()
            .unwrap_or_else(|| unreachable!("queue handle {handle} points at a free node"))
    }

    fn alloc(&mut self, node: Node) -> Handle {
        match self.free.pop() {
            Some(handle) => {
                self.nodes[handle] = Some(node);
                handle
            }
            None => {
                self.nodes.push(Some(node));
                self.nodes.len() - 1
            }
        }
    }

    fn link_back(&mut self, handle: Handle) {
        let old_tail = self.tail;
        self.node_mut(handle).prev = old_tail;
        match old_tail {
            Some(t) => self.node_mut(t).next = Some(handle),
            None => self.head = Some(handle),
        }
        self.tail = Some(handle);
    }

    fn link_before(&mut self, handle: Handle, before: Handle) {
        let prev = self.node(before).prev;
        {
            let node = self.node_mut(handle);
            node.prev = prev;
            node.next = Some(before);
        }
        self.node_mut(before).prev = Some(handle);
        match prev {
            Some(p) => self.node_mut(p).next = Some(handle),
            None => self.head = Some(handle),
        }
    }

    fn take(&mut self, handle: Handle) -> Request {
        let node = self.nodes[handle]
            .take()
            .unwrap_or_else(|| unreachable!("queue handle {handle} points at a free node"));
        match node.prev {
            Some(p) => self.node_mut(p).next = node.next,
            None => self.head = node.next,
        }
        match node.next {
            Some(n) => self.node_mut(n).prev = node.prev,
            None => self.tail = node.prev,
        }
        self.free.push(handle);
        self.index.remove(node.request.id());
        node.request
    }
}

/// Borrowing front-to-back iterator over a [`PriorityRequestQueue`]
pub struct Iter<'a> {
    queue: &'a PriorityRequestQueue,
    cursor: Option<Handle>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a Request;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.queue.node(self.cursor?);
        self.cursor = node.next;
        Some(&node.request)
    }
}

impl<'a> IntoIterator for &'a PriorityRequestQueue {
    type Item = &'a Request;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

use std::cmp::Ordering;
use std::collections::{BinaryHeap, VecDeque};
use std::rc::Rc;

use crate::planners::search::{Evaluation, SearchNode};
use crate::state::WorldState;

/// Open list of a graph search.
pub trait Frontier {
    fn add(&mut self, node: Rc<SearchNode>);
    fn pop(&mut self) -> Option<Rc<SearchNode>>;
    fn is_empty(&self) -> bool;
    fn len(&self) -> usize;
    fn name(&self) -> String;
}

/// First in, first out.
#[derive(Default)]
pub struct FrontierBfs {
    queue: VecDeque<Rc<SearchNode>>,
}

impl FrontierBfs {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Frontier for FrontierBfs {
    fn add(&mut self, node: Rc<SearchNode>) {
        self.queue.push_back(node);
    }

    fn pop(&mut self) -> Option<Rc<SearchNode>> {
        self.queue.pop_front()
    }

    fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    fn len(&self) -> usize {
        self.queue.len()
    }

    fn name(&self) -> String {
        "breadth-first search".to_string()
    }
}

/// Last in, first out.
#[derive(Default)]
pub struct FrontierDfs {
    stack: Vec<Rc<SearchNode>>,
}

impl FrontierDfs {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Frontier for FrontierDfs {
    fn add(&mut self, node: Rc<SearchNode>) {
        self.stack.push(node);
    }

    fn pop(&mut self) -> Option<Rc<SearchNode>> {
        self.stack.pop()
    }

    fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    fn len(&self) -> usize {
        self.stack.len()
    }

    fn name(&self) -> String {
        "depth-first search".to_string()
    }
}

struct Entry {
    f: i32,
    seq: u64,
    node: Rc<SearchNode>,
}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Min-heap on f, earliest insertion first among equals
        other.f.cmp(&self.f).then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Eq for Entry {}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.f == other.f && self.seq == other.seq
    }
}

/// Lowest `f` first, ties broken by insertion order.
pub struct FrontierBestFirst<H> {
    evaluation: Evaluation<H>,
    heap: BinaryHeap<Entry>,
    next_seq: u64,
}

impl<H> FrontierBestFirst<H>
where
    H: Fn(&WorldState) -> i32,
{
    pub fn new(evaluation: Evaluation<H>) -> Self {
        Self {
            evaluation,
            heap: BinaryHeap::new(),
            next_seq: 0,
        }
    }
}

impl<H> Frontier for FrontierBestFirst<H>
where
    H: Fn(&WorldState) -> i32,
{
    fn add(&mut self, node: Rc<SearchNode>) {
        let f = self.evaluation.f(&node);
        self.heap.push(Entry {
            f,
            seq: self.next_seq,
            node,
        });
        self.next_seq += 1;
    }

    fn pop(&mut self) -> Option<Rc<SearchNode>> {
        self.heap.pop().map(|entry| entry.node)
    }

    fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    fn len(&self) -> usize {
        self.heap.len()
    }

    fn name(&self) -> String {
        format!("best-first search using {}", self.evaluation)
    }
}

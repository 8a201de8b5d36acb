// Dweve RECMAP - Declarative Record Mapping
//
// Copyright (c) 2025 Dweve IP B.V. and individual contributors.
//
// SPDX-License-Identifier: Apache-2.0
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE file at the
// root of this repository or at: http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The layout state machine.
//!
//! A [`LayoutTree`] is the per-stream runtime shadow of a [`StreamDef`]:
//! one counter slot per definition node, indexed by the same arena ids.
//! During reading it decides which record definition each input belongs to
//! (`match_next`), classifies failures (`match_any`), and verifies minimum
//! occurrences at end of input (`check_close`).
//!
//! Sibling nodes sharing an order index form a cohort. Members of the
//! active cohort may interleave freely; the walker advances past a cohort
//! only once every member has reached its minimum, and a passed cohort is
//! frozen. Identifier-bearing records are always tried before anonymous
//! ones, so an anonymous record can never shadow an identified sibling.

use crate::context::RecordContext;
use crate::mapping::{NodeDef, StreamDef};
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
struct NodeState {
    /// Completed or started occurrences of this node.
    count: usize,
    /// Order index of the cohort currently accepting records.
    active_order: usize,
    /// The child currently consuming records, for group nodes.
    in_progress: Option<usize>,
}

/// A mid-stream ordering violation: the running node was abandoned before
/// reaching its minimum occurrences. Carries the id of the first
/// unsatisfied node, which names the expected-but-absent record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SequenceViolation {
    pub expected: usize,
}

/// Per-stream occurrence counters over a shared mapping tree.
#[derive(Debug)]
pub(crate) struct LayoutTree {
    def: Arc<StreamDef>,
    states: Vec<NodeState>,
}

impl LayoutTree {
    pub fn new(def: Arc<StreamDef>) -> Self {
        let states = vec![NodeState::default(); def.node_count()];
        Self { def, states }
    }

    fn min_occurs(&self, id: usize) -> usize {
        self.def.node(id).min_occurs()
    }

    fn under_max(&self, id: usize) -> bool {
        match self.def.node(id).max_occurs() {
            None => true,
            Some(max) => self.states[id].count < max,
        }
    }

    /// Locate the record definition the current input belongs to, updating
    /// occurrence counters along the path. Returns `Ok(None)` when the
    /// record matches nowhere reachable; the driver then classifies the
    /// failure through [`match_any`](Self::match_any).
    ///
    /// Counters are committed only on a successful match: a record that
    /// matches nowhere, or that raises a sequence violation, leaves the
    /// walker exactly where it was so the caller can keep reading.
    pub fn match_next(
        &mut self,
        ctx: &RecordContext,
    ) -> Result<Option<usize>, SequenceViolation> {
        let snapshot = self.states.clone();
        match self.advance(ctx) {
            Ok(Some(found)) => Ok(Some(found)),
            Ok(None) => {
                self.states = snapshot;
                Ok(None)
            }
            Err(violation) => {
                self.states = snapshot;
                Err(violation)
            }
        }
    }

    fn advance(&mut self, ctx: &RecordContext) -> Result<Option<usize>, SequenceViolation> {
        let root = self.def.root();
        if let Some(found) = self.match_group(root, ctx)? {
            if self.states[root].count == 0 {
                self.states[root].count = 1;
            }
            return Ok(Some(found));
        }

        // a fully satisfied layout with spare occurrences may start over
        if self.states[root].count > 0 && self.close_check(root).is_none() && self.under_max(root)
        {
            self.reset_subtree(root);
            if let Ok(Some(found)) = self.match_group(root, ctx) {
                self.states[root].count += 1;
                return Ok(Some(found));
            }
        }

        Ok(None)
    }

    fn match_group(
        &mut self,
        group: usize,
        ctx: &RecordContext,
    ) -> Result<Option<usize>, SequenceViolation> {
        let def = Arc::clone(&self.def);

        // continue the in-progress child first
        if let Some(child) = self.states[group].in_progress {
            match def.node(child) {
                NodeDef::Record(record) => {
                    if self.under_max(child) && record.matches(ctx) {
                        self.states[child].count += 1;
                        return Ok(Some(child));
                    }
                }
                NodeDef::Group(_) => {
                    if let Some(found) = self.match_group(child, ctx)? {
                        return Ok(Some(found));
                    }
                    // a complete occurrence of a repeating group may re-enter
                    if self.close_check(child).is_none() && self.under_max(child) {
                        let snapshot = self.states.clone();
                        self.reset_subtree(child);
                        if let Ok(Some(found)) = self.match_group(child, ctx) {
                            self.states[child].count += 1;
                            return Ok(Some(found));
                        }
                        self.states = snapshot;
                    }
                }
            }
            // the running child is finished; abandoning it below its
            // minimum is an ordering violation
            if let Some(expected) = self.close_check(child) {
                return Err(SequenceViolation { expected });
            }
            self.states[group].in_progress = None;
        }

        // walk cohorts from the active order; the active order only
        // advances when a match commits
        let children = match def.node(group) {
            NodeDef::Group(g) => g.children(),
            NodeDef::Record(_) => return Ok(None),
        };
        let mut cohort_orders: Vec<usize> =
            children.iter().map(|&c| def.node(c).order()).collect();
        cohort_orders.sort_unstable();
        cohort_orders.dedup();

        for &order in &cohort_orders {
            if order < self.states[group].active_order {
                continue;
            }
            let cohort: Vec<usize> = children
                .iter()
                .copied()
                .filter(|&c| def.node(c).order() == order)
                .collect();

            // identifier-bearing records and groups first, anonymous last
            for pass in 0..2 {
                for &child in &cohort {
                    let anonymous =
                        matches!(def.node(child), NodeDef::Record(r) if !r.has_identifier());
                    if (pass == 0) == anonymous {
                        continue;
                    }
                    if !self.under_max(child) {
                        continue;
                    }
                    match def.node(child) {
                        NodeDef::Record(record) => {
                            if record.matches(ctx) {
                                self.states[child].count += 1;
                                self.states[group].active_order = order;
                                self.states[group].in_progress = Some(child);
                                return Ok(Some(child));
                            }
                        }
                        NodeDef::Group(_) => {
                            let snapshot = self.states.clone();
                            self.reset_subtree(child);
                            if let Ok(Some(found)) = self.match_group(child, ctx) {
                                self.states[child].count += 1;
                                self.states[group].active_order = order;
                                self.states[group].in_progress = Some(child);
                                return Ok(Some(found));
                            }
                            self.states = snapshot;
                        }
                    }
                }
            }

            // no match here: the next cohort is reachable only once every
            // member of this one has met its minimum
            if cohort
                .iter()
                .any(|&c| self.states[c].count < self.min_occurs(c))
            {
                return Ok(None);
            }
        }

        Ok(None)
    }

    /// Exhaustive scan of every record node, ignoring order and
    /// cardinality. Used solely to pick between the unexpected and
    /// unidentified failure kinds.
    pub fn match_any(&self, ctx: &RecordContext) -> Option<usize> {
        self.def
            .records()
            .find(|(_, record)| record.matches(ctx))
            .map(|(id, _)| id)
    }

    /// End-of-input check: the first node, children before parents, whose
    /// occurrence count is below its minimum. `None` when the stream may
    /// close cleanly.
    pub fn check_close(&self) -> Option<usize> {
        self.close_check(self.def.root())
    }

    fn close_check(&self, id: usize) -> Option<usize> {
        match self.def.node(id) {
            NodeDef::Record(_) => {
                if self.states[id].count < self.min_occurs(id) {
                    Some(id)
                } else {
                    None
                }
            }
            NodeDef::Group(group) => {
                // an unentered optional group is vacuously satisfied
                if self.states[id].count == 0 && self.min_occurs(id) == 0 {
                    return None;
                }
                for &child in group.children() {
                    if let Some(unsatisfied) = self.close_check(child) {
                        return Some(unsatisfied);
                    }
                }
                if self.states[id].count < self.min_occurs(id) {
                    Some(id)
                } else {
                    None
                }
            }
        }
    }

    fn reset_subtree(&mut self, id: usize) {
        self.states[id].in_progress = None;
        self.states[id].active_order = 0;
        let children = match self.def.node(id) {
            NodeDef::Group(g) => g.children().to_vec(),
            NodeDef::Record(_) => return,
        };
        for child in children {
            self.states[child].count = 0;
            self.reset_subtree(child);
        }
    }
}

//! The Reachability Engine (§4.6): breadth-first expansion over
//! `(container, privilege)` states, starting from the external attacker
//! and feeding every emitted transition into the [`GraphAssembler`].
//!
//! Modeling state as `(container, privilege)` rather than just
//! `container` is what lets the search express privilege *escalation*
//! chains and the privileged-host pivot (§4.6 rationale): a
//! high-privilege-only vulnerability on a container the attacker already
//! holds at low privilege would otherwise never be considered.

use std::collections::{HashSet, VecDeque};

use indexmap::IndexMap;

use crate::exploitability::ContainerExploitability;
use crate::graph::GraphAssembler;
use crate::privilege::Privilege;
use crate::topology::{PrivilegedAccessMap, Topology, DOCKER_HOST, OUTSIDE};

type State = (String, Privilege);

/// Runs the breadth-first reachability search and feeds every emitted
/// transition into `assembler`.
///
/// `exploitability` holds one table per real container (never for
/// `outside` or `docker host`, which have no vulnerabilities of their
/// own); a container absent from it is treated as having none.
pub fn run(
    topology: &Topology,
    exploitability: &IndexMap<String, ContainerExploitability>,
    privileged_access: &PrivilegedAccessMap,
    assembler: &mut GraphAssembler,
) {
    let mut queue: VecDeque<State> = VecDeque::new();
    let mut visited: HashSet<State> = HashSet::new();

    let start: State = (OUTSIDE.to_string(), Privilege::Admin);
    visited.insert(start.clone());
    queue.push_back(start);

    while let Some((c, p)) = queue.pop_front() {
        let mut neighbors: Vec<String> = topology.get(&c).cloned().unwrap_or_default();
        if c != DOCKER_HOST {
            // Self as neighbor allows in-place escalation via a vuln whose
            // postcondition strictly exceeds the current privilege.
            neighbors.push(c.clone());
        }

        for n in neighbors {
            if c == DOCKER_HOST {
                // Rule 1: host -> container. A compromised docker host
                // grants full admin to every container it can reach.
                assembler.add_edge(&c, Privilege::Admin, &n, Privilege::Admin, "root access");
                enqueue(&mut queue, &mut visited, n, Privilege::Admin);
                continue;
            }

            if n == DOCKER_HOST {
                // Rule 2: container -> host, via a privileged capability.
                if privileged_access.get(&c).copied().unwrap_or(false) {
                    assembler.add_edge(&c, p, &n, Privilege::Admin, "privileged");
                    enqueue(&mut queue, &mut visited, n, Privilege::Admin);
                }
                continue;
            }

            // Rule 3: ordinary vulnerability traversal, including the
            // self-neighbor in-place escalation case (n == c).
            let Some(table) = exploitability.get(&n) else {
                continue;
            };

            for (vuln_id, &precondition) in &table.precondition {
                if p < precondition {
                    continue; // exploit gate
                }
                let postcondition = table.postcondition[vuln_id];

                let progresses = if n != c {
                    postcondition != Privilege::None
                } else {
                    postcondition > p
                };
                if !progresses {
                    continue;
                }

                assembler.add_edge(&c, p, &n, postcondition, vuln_id);
                enqueue(&mut queue, &mut visited, n.clone(), postcondition);
            }
        }
    }
}

fn enqueue(queue: &mut VecDeque<State>, visited: &mut HashSet<State>, container: String, privilege: Privilege) {
    let state = (container, privilege);
    if visited.insert(state.clone()) {
        queue.push_back(state);
    }
}

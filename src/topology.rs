//! Topology and privileged-access types (§3, §6): the two collaborator-
//! supplied maps the reachability engine consumes but never derives
//! itself. Discovering these from a `docker-compose.yml` or orchestrator
//! manifest is explicitly out of scope for this crate (§1); callers pass
//! the already-derived values in.

use indexmap::IndexMap;

/// The reserved identifier for the external attacker.
pub const OUTSIDE: &str = "outside";

/// The reserved identifier for the shared container-orchestrator host.
pub const DOCKER_HOST: &str = "docker host";

/// `container -> [neighbors]`. Stored directionally even though network
/// reachability is usually symmetric in intent (§3); callers are
/// expected to list both directions of a symmetric link explicitly.
pub type Topology = IndexMap<String, Vec<String>>;

/// `container -> bool`: true when the container holds a capability that
/// lets it escalate to full host admin, the `privileged` Docker flag or
/// (per Design Notes §9) a mounted host socket. This crate does not derive
/// the map from a compose file; it only consumes whatever a collaborator
/// already built.
pub type PrivilegedAccessMap = IndexMap<String, bool>;

/// Every container name mentioned anywhere in `topology` or
/// `privileged_access`, for the "unknown container" validation of §7
/// kind 2. A name is *declared* only by appearing as a key of `topology`.
pub fn referenced_containers<'a>(
    topology: &'a Topology,
    privileged_access: &'a PrivilegedAccessMap,
) -> impl Iterator<Item = (&'a str, &'static str)> {
    let from_neighbors = topology
        .iter()
        .flat_map(|(_, neighbors)| neighbors.iter().map(|n| (n.as_str(), "topology")));
    let from_privileged = privileged_access
        .keys()
        .map(|c| (c.as_str(), "privileged_access map"));
    from_neighbors.chain(from_privileged)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn referenced_containers_includes_neighbors_and_privileged_keys() {
        let mut topology = Topology::new();
        topology.insert("outside".to_string(), vec!["c1".to_string()]);
        topology.insert("c1".to_string(), vec!["c2".to_string()]);
        let mut privileged = PrivilegedAccessMap::new();
        privileged.insert("c1".to_string(), true);

        let referenced: Vec<_> = referenced_containers(&topology, &privileged).collect();
        assert!(referenced.contains(&("c1", "topology")));
        assert!(referenced.contains(&("c2", "topology")));
        assert!(referenced.contains(&("c1", "privileged_access map")));
    }
}

//! The friend-network reachability engine: who is directly connected to a
//! user, and who lies within N hops of them.

use std::collections::HashSet;

use futures::future::try_join_all;

use crate::{
	core::MAX_REACHABILITY_DEGREE,
	db::PersistenceHandle,
	entity::profile,
	error::{Error, Result},
};


/// Answers reachability questions against an injected store handle. Carries
/// no state of its own; every query reads the connection table as it is at
/// that moment.
pub struct FriendGraph<'a, P> {
	store: &'a P,
}

impl<'a, P> FriendGraph<'a, P>
where
	P: PersistenceHandle + Sync,
{
	pub fn new(store: &'a P) -> Self { Self { store } }

	/// Everyone at exactly one hop: the other endpoint of each accepted
	/// connection. No duplicates, never the user itself.
	pub async fn direct_friends(&self, user_id: i64) -> Result<Vec<profile::Model>> {
		Ok(self.store.direct_friend_profiles(user_id).await?)
	}

	/// Collects all profile ids within `max_degree` hops of accepted
	/// connections, excluding the starting user.
	///
	/// The traversal is a worklist BFS. The visited set is mandatory: the
	/// graph is undirected and cyclic, and the set is the only thing that
	/// bounds the work. Newly discovered ids are marked visited at discovery
	/// time, so a node reached from two parents in the same hop is expanded
	/// only once. Peers with a blocked row against the starting user are
	/// seeded into the visited set, which cuts every path through them.
	pub async fn reachable_within_degree(
		&self, user_id: i64, max_degree: u32,
	) -> Result<HashSet<i64>> {
		if max_degree < 1 || max_degree > MAX_REACHABILITY_DEGREE {
			return Err(Error::Input(format!(
				"degree must lie between 1 and {}",
				MAX_REACHABILITY_DEGREE
			)));
		}

		let blocked = self.store.blocked_peer_ids(user_id).await?;
		let mut visited = HashSet::with_capacity(blocked.len() + 1);
		visited.insert(user_id);
		visited.extend(blocked.iter().copied());

		let mut frontier = vec![user_id];
		for _ in 0..max_degree {
			// The adjacency reads of one hop are independent, fan them out.
			let expansions = try_join_all(
				frontier
					.iter()
					.map(|id| self.store.accepted_neighbor_ids(*id)),
			)
			.await?;

			let mut next_frontier = Vec::new();
			for neighbor in expansions.into_iter().flatten() {
				if visited.insert(neighbor) {
					next_frontier.push(neighbor);
				}
			}
			if next_frontier.is_empty() {
				break;
			}
			frontier = next_frontier;
		}

		visited.remove(&user_id);
		for peer in &blocked {
			visited.remove(peer);
		}
		Ok(visited)
	}

	pub async fn are_connected_within_degree(
		&self, user_a: i64, user_b: i64, max_degree: u32,
	) -> Result<bool> {
		Ok(self
			.reachable_within_degree(user_a, max_degree)
			.await?
			.contains(&user_b))
	}
}

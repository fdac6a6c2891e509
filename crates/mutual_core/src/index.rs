use std::collections::HashMap;

use crate::models::Profile;

/// Lookup from numeric account id to the followee's profile.
#[derive(Debug, Clone, Default)]
pub struct FriendIndex {
    by_id: HashMap<u64, Profile>,
}

impl FriendIndex {
    /// Duplicate ids keep the last profile seen.
    pub fn build(friends: &[Profile]) -> Self {
        let mut by_id = HashMap::with_capacity(friends.len());
        for friend in friends {
            by_id.insert(friend.id, friend.clone());
        }
        Self { by_id }
    }

    pub fn get(&self, id: u64) -> Option<&Profile> {
        self.by_id.get(&id)
    }

    pub fn contains(&self, id: u64) -> bool {
        self.by_id.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

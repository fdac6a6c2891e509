use crate::client::ListingClient;
use crate::errors::ApiError;
use crate::index::FriendIndex;
use crate::models::MutualPair;
use crate::paginate::fetch_all_friend_ids;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Visible,
    /// The account's followee list could not be read (protected or otherwise denied).
    Private,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub account: String,
    pub pairs: Vec<MutualPair>,
    pub access: Access,
}

impl Resolution {
    pub fn is_private(&self) -> bool {
        self.access == Access::Private
    }
}

/// Pairs `account` with every indexed profile whose id appears in `ids`,
/// in the order of `ids`. Self-matches are kept.
pub fn intersect(account: &str, ids: &[u64], index: &FriendIndex) -> Vec<MutualPair> {
    ids.iter()
        .filter_map(|id| index.get(*id))
        .map(|profile| MutualPair::new(account, profile.screen_name.as_str()))
        .collect()
}

/// Fetches the followee ids of `account` and intersects them with `index`.
///
/// An authorization denial yields an empty [`Access::Private`] resolution;
/// every other failure is returned to the caller.
pub async fn resolve_mutuals<C>(
    client: &C,
    account: &str,
    index: &FriendIndex,
) -> Result<Resolution, ApiError>
where
    C: ListingClient + ?Sized,
{
    let ids = match fetch_all_friend_ids(client, account).await {
        Ok(ids) => ids,
        Err(err) if err.is_authorization_denied() => {
            tracing::warn!(account, error = %err, "followee list is private, skipping");
            return Ok(Resolution {
                account: account.to_string(),
                pairs: Vec::new(),
                access: Access::Private,
            });
        }
        Err(err) => return Err(err),
    };

    let pairs = intersect(account, &ids, index);
    tracing::info!(account, mutual = pairs.len(), "resolved mutual followees");
    Ok(Resolution {
        account: account.to_string(),
        pairs,
        access: Access::Visible,
    })
}

use std::collections::HashSet;
use std::future::Future;

use crate::client::{ClientOptions, ListingClient, MAX_FRIENDS_PAGE_SIZE, MAX_IDS_PAGE_SIZE};
use crate::errors::ApiError;
use crate::models::{Cursor, Page, Profile};

/// Which listing a paginated run walks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMode {
    Profiles,
    Ids,
}

impl FetchMode {
    pub fn label(self) -> &'static str {
        match self {
            FetchMode::Profiles => "profiles",
            FetchMode::Ids => "ids",
        }
    }

    /// Requested page size, clamped to what the listing accepts. Profile pages
    /// are heavy, id pages are light.
    pub fn page_size(self, options: &ClientOptions) -> u32 {
        match self {
            FetchMode::Profiles => options.friends_page_size.clamp(1, MAX_FRIENDS_PAGE_SIZE),
            FetchMode::Ids => options.ids_page_size.clamp(1, MAX_IDS_PAGE_SIZE),
        }
    }
}

/// Walks a cursored listing from [`Cursor::start`] until the end sentinel,
/// concatenating items in page-arrival order.
///
/// Any error from `fetch_page` is returned as-is. A non-end cursor that was
/// already requested in this walk (a stall or a cycle) is a protocol error.
pub async fn paginate<T, F, Fut>(mut fetch_page: F) -> Result<(Vec<T>, usize), ApiError>
where
    F: FnMut(Cursor) -> Fut,
    Fut: Future<Output = Result<Page<T>, ApiError>>,
{
    let mut items = Vec::new();
    let mut pages = 0usize;
    let mut cursor = Cursor::start();
    let mut seen = HashSet::new();
    loop {
        seen.insert(cursor.clone());
        let page = fetch_page(cursor.clone()).await?;
        pages += 1;
        items.extend(page.items);
        if page.next_cursor.is_end() {
            break;
        }
        if seen.contains(&page.next_cursor) {
            return Err(ApiError::protocol(format!(
                "cursor {} after {cursor} was already visited",
                page.next_cursor
            )));
        }
        cursor = page.next_cursor;
    }
    Ok((items, pages))
}

pub async fn fetch_all_friends<C>(client: &C, account: &str) -> Result<Vec<Profile>, ApiError>
where
    C: ListingClient + ?Sized,
{
    let (friends, pages) =
        paginate(move |cursor| client.list_friends_page(account, cursor)).await?;
    log_fetched(FetchMode::Profiles, account, friends.len(), pages);
    Ok(friends)
}

pub async fn fetch_all_friend_ids<C>(client: &C, account: &str) -> Result<Vec<u64>, ApiError>
where
    C: ListingClient + ?Sized,
{
    let (ids, pages) =
        paginate(move |cursor| client.list_friend_ids_page(account, cursor)).await?;
    log_fetched(FetchMode::Ids, account, ids.len(), pages);
    Ok(ids)
}

fn log_fetched(mode: FetchMode, account: &str, count: usize, pages: usize) {
    tracing::debug!(
        mode = mode.label(),
        account,
        count,
        pages,
        "listing fetched"
    );
}

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Builder;

use crate::client::{
    ClientOptions, ListingClient, TwitterClient, MAX_FRIENDS_PAGE_SIZE, MAX_IDS_PAGE_SIZE,
};
use crate::credentials::Credentials;
use crate::csv_utils::{
    following_csv_path, friends_csv_path, remove_stale_export, write_following_list,
    write_friends,
};
use crate::errors::{ApiError, MutualError, RunError};
use crate::index::FriendIndex;
use crate::models::{MutualPair, Profile};
use crate::paginate::fetch_all_friends;
use crate::resolver::resolve_mutuals;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportProgress {
    FriendsFetched {
        account: String,
        count: usize,
    },
    FriendResolved {
        position: usize,
        total: usize,
        account: String,
        mutual_count: usize,
    },
    FriendPrivate {
        position: usize,
        total: usize,
        account: String,
    },
}

pub type ProgressCallback = Arc<dyn Fn(ExportProgress) + Send + Sync + 'static>;

#[derive(Clone)]
pub struct ExportOptions {
    pub account: String,
    pub output_dir: PathBuf,
    pub encoding: String,
    pub credentials: Credentials,
    pub timeout_secs: u64,
    pub base_url: Option<String>,
    pub friends_page_size: u32,
    pub ids_page_size: u32,
    pub progress_callback: Option<ProgressCallback>,
}

impl ExportOptions {
    pub fn new<T: Into<String>>(account: T, credentials: Credentials) -> Self {
        Self {
            account: account.into(),
            output_dir: PathBuf::from("."),
            encoding: "utf-8".to_string(),
            credentials,
            timeout_secs: 30,
            base_url: None,
            friends_page_size: MAX_FRIENDS_PAGE_SIZE,
            ids_page_size: MAX_IDS_PAGE_SIZE,
            progress_callback: None,
        }
    }

    fn client_options(&self) -> ClientOptions {
        ClientOptions {
            timeout: Duration::from_secs(self.timeout_secs),
            base_url: self.base_url.clone(),
            friends_page_size: self.friends_page_size,
            ids_page_size: self.ids_page_size,
            ..ClientOptions::default()
        }
    }
}

/// Everything derived for one target account.
#[derive(Debug, Clone, Default)]
pub struct MutualGraph {
    pub friends: Vec<Profile>,
    pub pairs: Vec<MutualPair>,
    pub private_accounts: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ExportResult {
    pub account: String,
    pub friends_csv_path: PathBuf,
    pub following_csv_path: PathBuf,
    pub graph: MutualGraph,
}

/// Resolves mutual followees for every friend of `account`, strictly in fetch order.
///
/// Only authorization denials on a friend's id listing are absorbed; anything
/// else stops the run.
pub async fn build_mutual_graph<C>(
    client: &C,
    account: &str,
    progress: Option<&ProgressCallback>,
) -> Result<MutualGraph, MutualError>
where
    C: ListingClient + ?Sized,
{
    let friends = fetch_friends(client, account, progress).await?;
    resolve_friends(client, friends, progress).await
}

async fn fetch_friends<C>(
    client: &C,
    account: &str,
    progress: Option<&ProgressCallback>,
) -> Result<Vec<Profile>, ApiError>
where
    C: ListingClient + ?Sized,
{
    let friends = fetch_all_friends(client, account).await?;
    report(
        progress,
        ExportProgress::FriendsFetched {
            account: account.to_string(),
            count: friends.len(),
        },
    );
    Ok(friends)
}

async fn resolve_friends<C>(
    client: &C,
    friends: Vec<Profile>,
    progress: Option<&ProgressCallback>,
) -> Result<MutualGraph, MutualError>
where
    C: ListingClient + ?Sized,
{
    let index = FriendIndex::build(&friends);
    let total = friends.len();
    let mut pairs = Vec::new();
    let mut private_accounts = Vec::new();

    for (offset, friend) in friends.iter().enumerate() {
        let position = offset + 1;
        let resolution = resolve_mutuals(client, &friend.screen_name, &index).await?;
        if resolution.is_private() {
            report(
                progress,
                ExportProgress::FriendPrivate {
                    position,
                    total,
                    account: resolution.account.clone(),
                },
            );
            private_accounts.push(resolution.account);
        } else {
            report(
                progress,
                ExportProgress::FriendResolved {
                    position,
                    total,
                    account: resolution.account,
                    mutual_count: resolution.pairs.len(),
                },
            );
        }
        pairs.extend(resolution.pairs);
    }

    Ok(MutualGraph {
        friends,
        pairs,
        private_accounts,
    })
}

pub async fn export_mutual_graph(options: ExportOptions) -> Result<ExportResult, RunError> {
    let account = options.account.clone();
    let progress = options.progress_callback.clone();
    let friends_path = friends_csv_path(&options.output_dir, &account);
    let following_path = following_csv_path(&options.output_dir, &account);

    let client = TwitterClient::new(options.credentials.clone(), options.client_options())?;

    let friends = fetch_friends(&client, &account, progress.as_ref())
        .await
        .map_err(|err| RunError::from(err).context(format!("fetching followees of {account}")))?;

    // The pair file must never outlive the friends file it was derived from.
    if remove_stale_export(&following_path).map_err(|err| {
        RunError::from(err).context(format!("removing {}", following_path.display()))
    })? {
        tracing::debug!(path = %following_path.display(), "removed previous pair export");
    }

    write_friends(&friends_path, &options.encoding, &friends).map_err(|err| {
        RunError::from(err).context(format!("writing {}", friends_path.display()))
    })?;

    let graph = resolve_friends(&client, friends, progress.as_ref()).await?;

    write_following_list(&following_path, &options.encoding, &graph.pairs).map_err(|err| {
        RunError::from(err).context(format!("writing {}", following_path.display()))
    })?;

    Ok(ExportResult {
        account,
        friends_csv_path: friends_path,
        following_csv_path: following_path,
        graph,
    })
}

pub fn export_mutual_graph_blocking(options: ExportOptions) -> Result<ExportResult, RunError> {
    let rt = Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|err| MutualError::Other(format!("failed to start tokio runtime: {err}")))?;
    rt.block_on(export_mutual_graph(options))
}

fn report(progress: Option<&ProgressCallback>, event: ExportProgress) {
    if let Some(callback) = progress {
        callback(event);
    }
}

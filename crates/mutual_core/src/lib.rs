pub mod account;
pub mod client;
pub mod credentials;
pub mod csv_utils;
pub mod errors;
pub mod export;
pub mod index;
pub mod models;
pub mod paginate;
pub mod resolver;

pub use account::parse_account;
pub use client::{ClientOptions, ListingClient, TwitterClient, DEFAULT_BASE_URL};
pub use credentials::{load_credentials, Credentials, DEFAULT_CREDENTIALS_FILE};
pub use csv_utils::{
    following_csv_path, friends_csv_path, read_csv_rows, remove_stale_export,
    write_following_list, write_friends, CsvRow, FOLLOWING_FIELDNAMES, FRIEND_FIELDNAMES,
};
pub use errors::{ApiError, ApiErrorKind, MutualError, RunError};
pub use export::{
    build_mutual_graph,
    export_mutual_graph,
    export_mutual_graph_blocking,
    ExportOptions,
    ExportProgress,
    ExportResult,
    MutualGraph,
    ProgressCallback,
};
pub use index::FriendIndex;
pub use models::{Cursor, MutualPair, Page, Profile};
pub use paginate::{fetch_all_friend_ids, fetch_all_friends, paginate, FetchMode};
pub use resolver::{intersect, resolve_mutuals, Access, Resolution};

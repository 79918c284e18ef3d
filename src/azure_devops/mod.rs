mod client;
pub mod cherry_pick;
pub mod links;
pub mod models;
pub mod policy;
#[cfg(test)]
pub(crate) mod test_server;

pub use client::{
    AzureDevOpsClient, COMMENTS_API_VERSION, JSON_PATCH, RequestOptions,
    encode_path_segment, encode_query_value,
};

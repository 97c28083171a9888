//! Whole-bucket and by-key listings.

use std::pin::Pin;

use async_stream::try_stream;
use futures_core::Stream;
use tracing::{debug, instrument};

use crate::{BlobError, BlobResult, BlobStore, ObjectSummary};

/// Stream of listed objects; ends after the first error.
pub type ObjectStream<'a> = Pin<Box<dyn Stream<Item = BlobResult<ObjectSummary>> + Send + 'a>>;

/// Lazily walk every object in the bucket.
///
/// Pages are requested only as the consumer polls, following continuation
/// tokens until the store reports the listing is no longer truncated.
pub fn list_all_objects(store: &dyn BlobStore) -> ObjectStream<'_> {
    Box::pin(try_stream! {
        let mut token: Option<String> = None;
        let mut pages = 0usize;

        loop {
            let page = store.list_page(token.as_deref()).await?;
            pages += 1;
            debug!(bucket = store.bucket(), page = pages, objects = page.objects.len(), "listing page");

            for object in page.objects {
                yield object;
            }

            if !page.is_truncated {
                break;
            }
            match page.next_token {
                Some(next) => token = Some(next),
                None => Err(BlobError::invalid("truncated listing without continuation token"))?,
            }
        }
    })
}

/// Summaries for the given keys, in the order given.
///
/// One `head` per key; the first failure aborts the whole listing.
#[instrument(skip(store, keys), fields(bucket = store.bucket(), count = keys.len()))]
pub async fn list_by_keys<S>(store: &dyn BlobStore, keys: &[S]) -> BlobResult<Vec<ObjectSummary>>
where
    S: AsRef<str> + Sync,
{
    let mut summaries = Vec::with_capacity(keys.len());
    for key in keys {
        let key = key.as_ref();
        let head = store.head(key).await?;
        summaries.push(ObjectSummary::from_head(key, &head));
    }
    Ok(summaries)
}

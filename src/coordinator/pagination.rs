//! Bucket-clear pagination
//!
//! During the bucket-clear phase every worker drains the same set of buckets.
//! Pages are handed out through a shared cursor per bucket so that no page is
//! listed twice: the listing call for a bucket's next page is made while the
//! cursor lock is held and the cursor is advanced before the lock is released.
//! Deleting the objects of a page happens outside the lock.

use crate::store::{ListPage, StoreResult};
use std::sync::{Mutex, PoisonError};

/// Where listing of one bucket stands
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BucketCursor {
    /// Continuation token for the next page, `None` before the first page
    pub token: Option<String>,
    /// The last page has been handed out
    pub exhausted: bool,
}

/// Result of asking for a bucket's next page
#[derive(Debug, PartialEq, Eq)]
pub enum PageClaim {
    /// The bucket had already been fully listed
    Exhausted,
    /// The next page, now owned by the caller
    Page(ListPage),
}

/// Shared listing state of every bucket for one clear phase
#[derive(Debug)]
pub struct PaginationState {
    cursors: Mutex<Vec<BucketCursor>>,
}

impl PaginationState {
    pub fn new(buckets: usize) -> Self {
        Self {
            cursors: Mutex::new(vec![BucketCursor::default(); buckets]),
        }
    }

    /// Claim the next page of `bucket`
    ///
    /// `list` is called with the bucket's continuation token while the lock is
    /// held. On success the token is replaced by the page's next token, and a
    /// page without one marks the bucket exhausted. A failed listing leaves
    /// the cursor untouched.
    pub fn next_page<F>(&self, bucket: usize, list: F) -> StoreResult<PageClaim>
    where
        F: FnOnce(Option<&str>) -> StoreResult<ListPage>,
    {
        let mut cursors = self.cursors.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(cursor) = cursors.get_mut(bucket) else {
            return Ok(PageClaim::Exhausted);
        };
        if cursor.exhausted {
            return Ok(PageClaim::Exhausted);
        }

        let page = list(cursor.token.as_deref())?;
        cursor.exhausted = page.next_token.is_none();
        cursor.token = page.next_token.clone();
        Ok(PageClaim::Page(page))
    }

    pub fn is_exhausted(&self, bucket: usize) -> bool {
        self.cursors
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(bucket)
            .map(|c| c.exhausted)
            .unwrap_or(true)
    }

    /// Copy of a bucket's cursor
    pub fn cursor(&self, bucket: usize) -> Option<BucketCursor> {
        self.cursors
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(bucket)
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::mock::MemoryStore;
    use crate::store::{ObjectStore, StoreError};
    use bytes::Bytes;
    use std::collections::HashSet;
    use std::thread;

    fn filled_store(objects: usize) -> MemoryStore {
        let store = MemoryStore::new();
        store.create_bucket("b").unwrap();
        for i in 0..objects {
            store
                .put_object("b", &format!("obj{:05}", i), Bytes::from_static(b"x"))
                .unwrap();
        }
        store
    }

    #[test]
    fn test_pages_until_exhausted() {
        let store = filled_store(25);
        let state = PaginationState::new(1);
        let mut sizes = Vec::new();
        loop {
            match state.next_page(0, |t| store.list_objects("b", t, 10)).unwrap() {
                PageClaim::Exhausted => break,
                PageClaim::Page(page) => sizes.push(page.objects.len()),
            }
        }
        assert_eq!(sizes, vec![10, 10, 5]);
        assert!(state.is_exhausted(0));
    }

    #[test]
    fn test_failed_listing_keeps_cursor() {
        let state = PaginationState::new(1);
        let first = ListPage {
            objects: vec![],
            next_token: Some("t1".to_string()),
        };
        state.next_page(0, |_| Ok(first)).unwrap();
        let err = state.next_page(0, |_| Err(StoreError::Request("boom".into())));
        assert!(err.is_err());
        let cursor = state.cursor(0).unwrap();
        assert_eq!(cursor.token.as_deref(), Some("t1"));
        assert!(!cursor.exhausted);
    }

    #[test]
    fn test_token_passed_to_listing() {
        let state = PaginationState::new(2);
        state
            .next_page(1, |t| {
                assert_eq!(t, None);
                Ok(ListPage {
                    objects: vec![],
                    next_token: Some("abc".to_string()),
                })
            })
            .unwrap();
        state
            .next_page(1, |t| {
                assert_eq!(t, Some("abc"));
                Ok(ListPage::default())
            })
            .unwrap();
        assert!(state.is_exhausted(1));
        assert!(!state.is_exhausted(0));
    }

    #[test]
    fn test_unknown_bucket_is_exhausted() {
        let state = PaginationState::new(1);
        assert_eq!(
            state.next_page(5, |_| Ok(ListPage::default())).unwrap(),
            PageClaim::Exhausted
        );
    }

    #[test]
    fn test_concurrent_workers_never_share_a_page() {
        let store = filled_store(437);
        let state = PaginationState::new(1);

        let mut seen: Vec<String> = Vec::new();
        thread::scope(|s| {
            let handles: Vec<_> = (0..6)
                .map(|_| {
                    s.spawn(|| {
                        let mut mine = Vec::new();
                        while let PageClaim::Page(page) =
                            state.next_page(0, |t| store.list_objects("b", t, 20)).unwrap()
                        {
                            for obj in page.objects {
                                store.delete_object("b", &obj.key).unwrap();
                                mine.push(obj.key);
                            }
                        }
                        mine
                    })
                })
                .collect();
            for handle in handles {
                seen.extend(handle.join().unwrap());
            }
        });

        assert_eq!(seen.len(), 437);
        let unique: HashSet<_> = seen.iter().collect();
        assert_eq!(unique.len(), 437);
        assert_eq!(store.object_count("b"), Some(0));
    }
}

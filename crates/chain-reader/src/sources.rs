//! Poll sources built on a [`Reader`]

use std::sync::Arc;

use async_trait::async_trait;
use solana_sdk::{clock::Slot, hash::Hash};
use tokio::sync::Mutex;

use crate::error::{ReaderError, ReaderResult};
use crate::poller::Source;
use crate::reader::Reader;
use crate::types::LatestBlockhash;

/// Emits the slot whenever it advances
pub struct SlotSource<R: Reader + ?Sized> {
    reader: Arc<R>,
    last: Mutex<Option<Slot>>,
}

impl<R: Reader + ?Sized> SlotSource<R> {
    pub fn new(reader: Arc<R>) -> Self {
        Self {
            reader,
            last: Mutex::new(None),
        }
    }
}

#[async_trait]
impl<R: Reader + ?Sized + 'static> Source for SlotSource<R> {
    type Output = Slot;

    async fn fetch(&self) -> ReaderResult<Slot> {
        let slot = self.reader.slot_height().await?;
        let mut last = self.last.lock().await;
        match *last {
            Some(seen) if slot <= seen => Err(ReaderError::NoUpdate),
            _ => {
                *last = Some(slot);
                Ok(slot)
            }
        }
    }
}

/// Emits the latest blockhash whenever it changes
pub struct BlockhashSource<R: Reader + ?Sized> {
    reader: Arc<R>,
    last: Mutex<Option<Hash>>,
}

impl<R: Reader + ?Sized> BlockhashSource<R> {
    pub fn new(reader: Arc<R>) -> Self {
        Self {
            reader,
            last: Mutex::new(None),
        }
    }
}

#[async_trait]
impl<R: Reader + ?Sized + 'static> Source for BlockhashSource<R> {
    type Output = LatestBlockhash;

    async fn fetch(&self) -> ReaderResult<LatestBlockhash> {
        let latest = self.reader.latest_blockhash().await?;
        let mut last = self.last.lock().await;
        if *last == Some(latest.blockhash) {
            return Err(ReaderError::NoUpdate);
        }
        *last = Some(latest.blockhash);
        Ok(latest)
    }
}

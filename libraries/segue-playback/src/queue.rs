//! Play queue
//!
//! Ordered, id-unique list of queue items. Insertion order is playback
//! order. There is no cursor: the current item is derived from item
//! statuses, so status changes and iteration never disagree.

use std::collections::{HashSet, VecDeque};
use std::time::Duration;

use segue_core::{SharedTrack, TrackId};
use serde::{Deserialize, Serialize};

use crate::error::{PlaybackError, Result};
use crate::types::QueueItemStatus;

/// A track placed in the queue, with its playback state
#[derive(Debug, Clone)]
pub struct QueueItem {
    id: TrackId,
    track: SharedTrack,
    status: QueueItemStatus,
    progress: Duration,
    duration: Option<Duration>,
    last_active: u64,
}

impl QueueItem {
    fn new(track: SharedTrack) -> Self {
        Self {
            id: track.id().clone(),
            duration: track.duration(),
            track,
            status: QueueItemStatus::Stopped,
            progress: Duration::ZERO,
            last_active: 0,
        }
    }

    /// Item id (the bound track's id)
    pub fn id(&self) -> &TrackId {
        &self.id
    }

    /// Bound track
    pub fn track(&self) -> &SharedTrack {
        &self.track
    }

    /// Playback status
    pub fn status(&self) -> QueueItemStatus {
        self.status
    }

    /// Last known elapsed time
    pub fn progress(&self) -> Duration {
        self.progress
    }

    /// Duration reported by the player, falling back to track metadata
    pub fn duration(&self) -> Option<Duration> {
        self.duration.or_else(|| self.track.duration())
    }
}

/// Change notification produced by the queue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueueEvent {
    /// Item inserted
    Added(TrackId),

    /// Item removed
    Removed(TrackId),

    /// Item status changed
    StatusChanged {
        /// Item id
        id: TrackId,
        /// New status
        status: QueueItemStatus,
    },
}

/// Ordered collection of queue items
#[derive(Debug, Default)]
pub struct PlayQueue {
    items: Vec<QueueItem>,
    loop_queue: bool,
    activity: u64,
    events: VecDeque<QueueEvent>,
}

impl PlayQueue {
    /// Create an empty queue
    pub fn new(loop_queue: bool) -> Self {
        Self {
            loop_queue,
            ..Self::default()
        }
    }

    /// Insert a track
    ///
    /// `position` is clamped to the queue length; `None` appends.
    pub fn add(&mut self, track: SharedTrack, position: Option<usize>) -> Result<&QueueItem> {
        if self.contains(track.id()) {
            return Err(PlaybackError::DuplicateItem(track.id().clone()));
        }

        let index = position.map_or(self.items.len(), |p| p.min(self.items.len()));
        let item = QueueItem::new(track);
        let id = item.id.clone();
        self.items.insert(index, item);

        tracing::debug!("Queued {} at position {}", id, index);
        self.events.push_back(QueueEvent::Added(id));

        Ok(&self.items[index])
    }

    /// Append a track and request it to play
    pub fn add_and_play(&mut self, track: SharedTrack) -> Result<()> {
        let id = track.id().clone();
        self.add(track, None)?;
        self.request_play(&id)
    }

    /// Remove an item
    pub fn remove(&mut self, id: &TrackId) -> Result<QueueItem> {
        let index = self
            .position_of(id)
            .ok_or_else(|| PlaybackError::ItemNotFound(id.clone()))?;
        let item = self.items.remove(index);

        tracing::debug!("Removed {} from queue", id);
        self.events.push_back(QueueEvent::Removed(id.clone()));

        Ok(item)
    }

    /// Reconcile the queue against a freshly fetched track list
    ///
    /// Items missing from `tracks` are removed. Unknown tracks are inserted
    /// at the head, keeping their relative order. Returns `(added, removed)`.
    pub fn sync_with(&mut self, tracks: &[SharedTrack]) -> (usize, usize) {
        let wanted: HashSet<&TrackId> = tracks.iter().map(|t| t.id()).collect();

        let stale: Vec<TrackId> = self
            .items
            .iter()
            .filter(|item| !wanted.contains(&item.id))
            .map(|item| item.id.clone())
            .collect();
        for id in &stale {
            let _ = self.remove(id);
        }

        let mut added = 0;
        for track in tracks {
            if self.contains(track.id()) {
                continue;
            }
            if self.add(SharedTrack::clone(track), Some(added)).is_ok() {
                added += 1;
            }
        }

        if added > 0 || !stale.is_empty() {
            tracing::info!("Queue synced: {} added, {} removed", added, stale.len());
        }

        (added, stale.len())
    }

    /// Look up an item
    pub fn get(&self, id: &TrackId) -> Option<&QueueItem> {
        self.items.iter().find(|item| &item.id == id)
    }

    /// Check if an item is queued
    pub fn contains(&self, id: &TrackId) -> bool {
        self.get(id).is_some()
    }

    /// Index of an item
    pub fn position_of(&self, id: &TrackId) -> Option<usize> {
        self.items.iter().position(|item| &item.id == id)
    }

    /// Items in playback order
    pub fn iter(&self) -> impl Iterator<Item = &QueueItem> {
        self.items.iter()
    }

    /// Number of items
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if queue is empty
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Enable or disable wrap-around
    pub fn set_loop(&mut self, loop_queue: bool) {
        self.loop_queue = loop_queue;
    }

    /// Whether navigation wraps around
    pub fn is_looping(&self) -> bool {
        self.loop_queue
    }

    /// The item being listened to
    ///
    /// Preference: playing, play requested, paused (or pause requested),
    /// then the most recently active item.
    pub fn current_item(&self) -> Option<&QueueItem> {
        self.first_with(&[QueueItemStatus::Playing])
            .or_else(|| self.first_with(&[QueueItemStatus::RequestedPlaying]))
            .or_else(|| self.first_with(&[QueueItemStatus::Paused, QueueItemStatus::RequestedPause]))
            .or_else(|| {
                self.items
                    .iter()
                    .filter(|item| item.last_active > 0)
                    .max_by_key(|item| item.last_active)
            })
    }

    /// Item following the current one
    ///
    /// With no current item this is the first item.
    pub fn next_item(&self) -> Option<&QueueItem> {
        match self.current_item() {
            Some(current) => self.next_after(&current.id),
            None => self.items.first(),
        }
    }

    /// Item following `id` in playback order
    ///
    /// Wraps to the first item when looping; a single looping item is its
    /// own successor.
    pub fn next_after(&self, id: &TrackId) -> Option<&QueueItem> {
        let index = self.position_of(id)?;

        match self.items.get(index + 1) {
            Some(item) => Some(item),
            None if self.loop_queue => self.items.first(),
            None => None,
        }
    }

    /// Whether a next item exists
    pub fn has_next_item(&self) -> bool {
        self.next_item().is_some()
    }

    /// First playing item
    pub fn playing_item(&self) -> Option<&QueueItem> {
        self.first_with(&[QueueItemStatus::Playing])
    }

    /// First paused item
    pub fn paused_item(&self) -> Option<&QueueItem> {
        self.first_with(&[QueueItemStatus::Paused])
    }

    /// Request an item to play
    pub fn request_play(&mut self, id: &TrackId) -> Result<()> {
        self.request_status(id, QueueItemStatus::RequestedPlaying)
    }

    /// Request an item to pause
    pub fn request_pause(&mut self, id: &TrackId) -> Result<()> {
        self.request_status(id, QueueItemStatus::RequestedPause)
    }

    /// Request an item to stop
    pub fn request_stop(&mut self, id: &TrackId) -> Result<()> {
        self.request_status(id, QueueItemStatus::RequestedStop)
    }

    /// Request a status change
    ///
    /// Only `Requested*` statuses are accepted; settled statuses are written
    /// by the player manager.
    pub fn request_status(&mut self, id: &TrackId, status: QueueItemStatus) -> Result<()> {
        if !status.is_request() {
            return Err(PlaybackError::InvalidStatusRequest(status));
        }
        self.set_status(id, status)
    }

    /// Rewind an item and request it to play
    pub fn restart(&mut self, id: &TrackId) -> Result<()> {
        self.set_progress(id, Duration::ZERO)?;
        self.request_play(id)
    }

    /// Take the pending change notifications
    pub fn drain_events(&mut self) -> Vec<QueueEvent> {
        self.events.drain(..).collect()
    }

    /// Whether change notifications are pending
    pub fn has_events(&self) -> bool {
        !self.events.is_empty()
    }

    /// Write a status; emits a change event only when it differs
    pub(crate) fn set_status(&mut self, id: &TrackId, status: QueueItemStatus) -> Result<()> {
        self.activity += 1;
        let activity = self.activity;
        let item = self.item_mut(id)?;

        if item.status == status {
            return Ok(());
        }

        item.status = status;
        if status.is_engaged() {
            item.last_active = activity;
        }

        self.events.push_back(QueueEvent::StatusChanged {
            id: id.clone(),
            status,
        });
        Ok(())
    }

    pub(crate) fn set_progress(&mut self, id: &TrackId, progress: Duration) -> Result<()> {
        self.item_mut(id)?.progress = progress;
        Ok(())
    }

    pub(crate) fn set_duration(&mut self, id: &TrackId, duration: Duration) -> Result<()> {
        self.item_mut(id)?.duration = Some(duration);
        Ok(())
    }

    fn item_mut(&mut self, id: &TrackId) -> Result<&mut QueueItem> {
        self.items
            .iter_mut()
            .find(|item| &item.id == id)
            .ok_or_else(|| PlaybackError::ItemNotFound(id.clone()))
    }

    fn first_with(&self, statuses: &[QueueItemStatus]) -> Option<&QueueItem> {
        self.items
            .iter()
            .find(|item| statuses.contains(&item.status))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use segue_core::{ProviderKind, Track};

    fn track(id: &str) -> SharedTrack {
        Track::new(id, ProviderKind::Youtube).shared()
    }

    fn id(id: &str) -> TrackId {
        TrackId::new(id)
    }

    fn queue_of(ids: &[&str], loop_queue: bool) -> PlayQueue {
        let mut queue = PlayQueue::new(loop_queue);
        for item in ids {
            queue.add(track(item), None).unwrap();
        }
        queue.drain_events();
        queue
    }

    #[test]
    fn add_appends_by_default() {
        let queue = queue_of(&["a", "b", "c"], false);
        let order: Vec<&str> = queue.iter().map(|i| i.id().as_str()).collect();
        assert_eq!(order, vec!["a", "b", "c"]);
    }

    #[test]
    fn add_at_position() {
        let mut queue = queue_of(&["a", "b"], false);
        queue.add(track("head"), Some(0)).unwrap();
        queue.add(track("tail"), Some(99)).unwrap();

        let order: Vec<&str> = queue.iter().map(|i| i.id().as_str()).collect();
        assert_eq!(order, vec!["head", "a", "b", "tail"]);
        assert_eq!(
            queue.drain_events(),
            vec![QueueEvent::Added(id("head")), QueueEvent::Added(id("tail"))]
        );
    }

    #[test]
    fn duplicate_add_rejected() {
        let mut queue = queue_of(&["a"], false);
        let err = queue.add(track("a"), None).unwrap_err();
        assert!(matches!(err, PlaybackError::DuplicateItem(_)));
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn remove_emits_event() {
        let mut queue = queue_of(&["a", "b"], false);
        let removed = queue.remove(&id("a")).unwrap();
        assert_eq!(removed.id(), &id("a"));
        assert_eq!(queue.drain_events(), vec![QueueEvent::Removed(id("a"))]);

        assert!(matches!(
            queue.remove(&id("a")),
            Err(PlaybackError::ItemNotFound(_))
        ));
    }

    #[test]
    fn empty_queue_has_no_current_or_next() {
        let queue = PlayQueue::new(true);
        assert!(queue.current_item().is_none());
        assert!(queue.next_item().is_none());
        assert!(!queue.has_next_item());
    }

    #[test]
    fn next_without_current_is_first() {
        let queue = queue_of(&["a", "b"], false);
        assert_eq!(queue.next_item().unwrap().id(), &id("a"));
    }

    #[test]
    fn current_prefers_playing() {
        let mut queue = queue_of(&["a", "b", "c"], false);
        queue.set_status(&id("a"), QueueItemStatus::Paused).unwrap();
        queue.set_status(&id("c"), QueueItemStatus::Playing).unwrap();

        assert_eq!(queue.current_item().unwrap().id(), &id("c"));
        assert_eq!(queue.playing_item().unwrap().id(), &id("c"));
        assert_eq!(queue.paused_item().unwrap().id(), &id("a"));
    }

    #[test]
    fn current_falls_back_to_most_recently_active() {
        let mut queue = queue_of(&["a", "b", "c"], false);
        queue.set_status(&id("a"), QueueItemStatus::Playing).unwrap();
        queue.set_status(&id("b"), QueueItemStatus::Playing).unwrap();
        queue.set_status(&id("a"), QueueItemStatus::Ended).unwrap();
        queue.set_status(&id("b"), QueueItemStatus::Ended).unwrap();

        assert_eq!(queue.current_item().unwrap().id(), &id("b"));
        assert_eq!(queue.next_item().unwrap().id(), &id("c"));
    }

    #[test]
    fn next_stops_at_end_without_loop() {
        let mut queue = queue_of(&["a", "b"], false);
        queue.set_status(&id("b"), QueueItemStatus::Playing).unwrap();
        assert!(queue.next_item().is_none());

        queue.set_loop(true);
        assert_eq!(queue.next_item().unwrap().id(), &id("a"));
    }

    #[test]
    fn single_looping_item_is_its_own_next() {
        let mut queue = queue_of(&["a"], true);
        queue.set_status(&id("a"), QueueItemStatus::Playing).unwrap();
        assert_eq!(queue.next_item().unwrap().id(), &id("a"));

        queue.set_loop(false);
        assert!(queue.next_item().is_none());
    }

    #[test]
    fn only_requested_statuses_are_accepted() {
        let mut queue = queue_of(&["a"], false);
        let err = queue
            .request_status(&id("a"), QueueItemStatus::Playing)
            .unwrap_err();
        assert!(matches!(
            err,
            PlaybackError::InvalidStatusRequest(QueueItemStatus::Playing)
        ));

        queue.request_pause(&id("a")).unwrap();
        assert_eq!(
            queue.get(&id("a")).unwrap().status(),
            QueueItemStatus::RequestedPause
        );
    }

    #[test]
    fn status_events_only_on_change() {
        let mut queue = queue_of(&["a"], false);
        queue.request_play(&id("a")).unwrap();
        queue.request_play(&id("a")).unwrap();

        assert_eq!(
            queue.drain_events(),
            vec![QueueEvent::StatusChanged {
                id: id("a"),
                status: QueueItemStatus::RequestedPlaying
            }]
        );
    }

    #[test]
    fn add_and_play_requests_playing() {
        let mut queue = PlayQueue::new(false);
        queue.add_and_play(track("a")).unwrap();
        assert_eq!(
            queue.drain_events(),
            vec![
                QueueEvent::Added(id("a")),
                QueueEvent::StatusChanged {
                    id: id("a"),
                    status: QueueItemStatus::RequestedPlaying
                }
            ]
        );
    }

    #[test]
    fn restart_rewinds() {
        let mut queue = queue_of(&["a"], true);
        queue.set_progress(&id("a"), Duration::from_secs(42)).unwrap();
        queue.set_status(&id("a"), QueueItemStatus::Ended).unwrap();

        queue.restart(&id("a")).unwrap();
        let item = queue.get(&id("a")).unwrap();
        assert_eq!(item.progress(), Duration::ZERO);
        assert_eq!(item.status(), QueueItemStatus::RequestedPlaying);
    }

    #[test]
    fn sync_adds_new_tracks_at_head_and_drops_missing() {
        let mut queue = queue_of(&["a", "b", "c"], false);
        let (added, removed) = queue.sync_with(&[track("x"), track("b"), track("y"), track("c")]);

        assert_eq!((added, removed), (2, 1));
        let order: Vec<&str> = queue.iter().map(|i| i.id().as_str()).collect();
        assert_eq!(order, vec!["x", "y", "b", "c"]);
    }

    #[test]
    fn duration_falls_back_to_track_metadata() {
        let mut queue = PlayQueue::new(false);
        let track = Track::with_metadata(
            "a",
            ProviderKind::Youtube,
            segue_core::TrackMetadata {
                duration: Some(Duration::from_secs(60)),
                ..Default::default()
            },
        )
        .shared();
        queue.add(track, None).unwrap();
        assert_eq!(
            queue.get(&id("a")).unwrap().duration(),
            Some(Duration::from_secs(60))
        );

        queue.set_duration(&id("a"), Duration::from_secs(61)).unwrap();
        assert_eq!(
            queue.get(&id("a")).unwrap().duration(),
            Some(Duration::from_secs(61))
        );
    }
}

use tracing::{debug, info, warn};

use super::controller::RoomInner;
use crate::event::RoomEvent;
use crate::media::{MediaKind, MediaTrack, ParticipantSession};
use crate::shared::{ProducerId, SessionId};

impl RoomInner {
    pub(crate) async fn add_track(
        &self,
        session_id: SessionId,
        producer_id: ProducerId,
        track: MediaTrack,
    ) {
        let kind = track.kind();

        {
            let mut state = self.state.write().await;
            if state.producer_tracks.contains_key(&producer_id) {
                warn!(room_id = %self.id, producer_id = %producer_id, "Track already attached for producer");
                return;
            }
            state.producer_tracks.insert(producer_id.clone(), track.clone());

            let session = state
                .participants
                .entry(session_id.clone())
                .or_insert_with(|| ParticipantSession::new(session_id.clone()));
            session.add_track(track.clone());

            if kind == MediaKind::Video {
                // Single slot: the most recent video track takes it over
                state.active_screen_share = Some(session_id.clone());
            }
        }

        debug!(
            room_id = %self.id,
            session_id = %session_id,
            producer_id = %producer_id,
            kind = %kind,
            "Track attached"
        );

        match kind {
            MediaKind::Audio => self.playback.route(&producer_id, &track),
            MediaKind::Video => self.emit(RoomEvent::ScreenShareStarted { session_id }),
        }
    }

    pub(crate) async fn remove_track(&self, session_id: &SessionId, producer_id: &ProducerId) {
        let mut events = Vec::new();

        {
            let mut state = self.state.write().await;
            let Some(track) = state.producer_tracks.remove(producer_id) else {
                debug!(room_id = %self.id, producer_id = %producer_id, "No track for producer");
                return;
            };

            self.playback.unroute(producer_id);
            if let Some(consumer) = state.consumers.remove(producer_id) {
                consumer.close();
            }

            let owner = match state.participants.get(session_id) {
                Some(session) if session.has_track(&track) => Some(session_id.clone()),
                _ => state
                    .participants
                    .iter()
                    .find(|(_, session)| session.has_track(&track))
                    .map(|(id, _)| id.clone()),
            };
            let Some(owner) = owner else {
                warn!(room_id = %self.id, producer_id = %producer_id, "Track had no owning session");
                return;
            };
            if &owner != session_id {
                warn!(
                    room_id = %self.id,
                    session_id = %session_id,
                    owner = %owner,
                    "Producer removal named the wrong session"
                );
            }

            let emptied = match state.participants.get_mut(&owner) {
                Some(session) => {
                    session.remove_track(&track);
                    !session.has_tracks()
                }
                None => false,
            };

            if track.kind() == MediaKind::Video && state.active_screen_share.as_ref() == Some(&owner) {
                state.active_screen_share = None;
                events.push(RoomEvent::ScreenShareClosed {
                    session_id: owner.clone(),
                });
            }

            if emptied {
                state.participants.remove(&owner);
                if state.active_screen_share.as_ref() == Some(&owner) {
                    state.active_screen_share = None;
                }

                let name = state.display_name(&owner);
                state.roster.retain(|entry| entry.session_id != owner);

                info!(room_id = %self.id, session_id = %owner, "Session closed");
                events.push(RoomEvent::SessionClosed {
                    session_id: owner,
                    name,
                });
            }
        }

        for event in events {
            self.emit(event);
        }
    }
}

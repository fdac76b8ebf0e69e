use huddle::{
    protocol::RtpParameters, ConsumerId, MediaKind, ProducerId, ServerMessage, SessionId,
};
use serde_json::json;

use super::setup::TestSetup;

// ============================================================================
// Server-Side Actions
// ============================================================================

impl TestSetup {
    pub fn server_producer_added(&self, session_id: &str, producer_id: &str) {
        self.server.push(ServerMessage::ProducerAdded {
            session_id: SessionId::from(session_id),
            producer_id: ProducerId::from(producer_id),
        });
    }

    pub fn server_consumed(&self, id: &str, producer_id: &str, session_id: &str, kind: MediaKind) {
        self.server.push(ServerMessage::Consumed {
            id: ConsumerId::from(id),
            producer_id: ProducerId::from(producer_id),
            session_id: SessionId::from(session_id),
            kind,
            rtp_parameters: RtpParameters(json!({ "codecs": [] })),
        });
    }

    pub fn server_producer_removed(&self, session_id: &str, producer_id: &str) {
        self.server.push(ServerMessage::ProducerRemoved {
            session_id: SessionId::from(session_id),
            producer_id: ProducerId::from(producer_id),
        });
    }

    pub fn server_new_comer(&self, session_id: &str, name: &str, just_joined: bool) {
        self.server.push(ServerMessage::NewComer {
            session_id: SessionId::from(session_id),
            name: name.to_string(),
            just_joined,
        });
    }

    pub fn server_text(&self, sender_id: &str, text: &str) {
        self.server.push(ServerMessage::Text {
            sender_id: SessionId::from(sender_id),
            text: text.to_string(),
        });
    }

    /// Full remote publish: announce, then answer the client's Consume
    pub async fn remote_publishes(
        &self,
        session_id: &str,
        producer_id: &str,
        consumer_id: &str,
        kind: MediaKind,
    ) {
        let consumes_before = self.count_sent("Consume");
        self.server_producer_added(session_id, producer_id);
        self.wait_for_sent_count("Consume", consumes_before + 1).await;

        let resumes_before = self.count_sent("ConsumerResume");
        self.server_consumed(consumer_id, producer_id, session_id, kind);
        self.wait_for_sent_count("ConsumerResume", resumes_before + 1).await;

        let session = SessionId::from(session_id);
        let track_id = format!("track-{}", consumer_id);
        let room = self.room.clone();
        self.wait_until(move || {
            let room = room.clone();
            let session = session.clone();
            let track_id = track_id.clone();
            async move {
                room.participant_stream(&session)
                    .await
                    .is_some_and(|stream| stream.tracks().iter().any(|t| t.id() == track_id))
            }
        })
        .await;
    }
}

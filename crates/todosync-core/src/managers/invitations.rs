// ── Project sharing invitations ──
//
// No local state: the resulting collaborator records arrive with the
// next sync.

use serde_json::Value;

use super::{Manager, field_map};
use crate::command::Command;
use crate::model::EntityId;
use crate::transport::Transport;

/// Marker for invitation commands.
pub struct Invitations;

impl<T: Transport> Manager<'_, T, Invitations> {
    pub fn accept(&mut self, invitation_id: &EntityId, secret: &str) {
        self.answer("accept_invitation", invitation_id, secret);
    }

    pub fn reject(&mut self, invitation_id: &EntityId, secret: &str) {
        self.answer("reject_invitation", invitation_id, secret);
    }

    /// Withdraw an invitation this user sent.
    pub fn delete(&mut self, invitation_id: &EntityId) {
        self.session.enqueue(Command::new(
            "delete_invitation",
            field_map([("invitation_id", invitation_id.to_value())]),
        ));
    }

    fn answer(&mut self, kind: &str, invitation_id: &EntityId, secret: &str) {
        self.session.enqueue(Command::new(
            kind,
            field_map([
                ("invitation_id", invitation_id.to_value()),
                ("invitation_secret", Value::from(secret)),
            ]),
        ));
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use crate::config::SessionConfig;
    use crate::model::EntityId;
    use crate::session::Session;
    use crate::transport::mock::MockTransport;

    #[tokio::test]
    async fn invitation_answers_are_queued_and_committed() {
        let mut s =
            Session::with_transport(SessionConfig::new("t".to_owned()), MockTransport::default());
        s.invitations().accept(&EntityId::from(11), "s3cret");
        s.invitations().reject(&EntityId::from(12), "other");
        s.invitations().delete(&EntityId::from(13));

        let cmds = s.queue().commands();
        assert_eq!(cmds[0].kind(), "accept_invitation");
        assert_eq!(
            cmds[0].args(),
            json!({"invitation_id": 11, "invitation_secret": "s3cret"}).as_object().unwrap()
        );
        assert_eq!(cmds[1].kind(), "reject_invitation");
        assert_eq!(cmds[2].kind(), "delete_invitation");
        assert!(cmds[2].args().get("invitation_secret").is_none());

        s.transport().reply(json!({"sync_token": "t1"}));
        assert!(s.commit(true).await.unwrap().unwrap().is_ok());
        assert_eq!(s.transport().sent()[0].commands.len(), 3);
    }
}

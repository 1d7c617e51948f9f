//! Chat session state: the active chat list, message list, and in-flight
//! flags.
//!
//! All mutation goes through `ChatSession::apply` on a single owner — either
//! directly, or via a `SessionHandle` whose reducer task drains an action
//! channel. Two concurrent regenerate flows therefore cannot interleave
//! their truncate-then-append sequences; actions are applied whole, in
//! arrival order.

#![allow(dead_code)]

use tokio::sync::{mpsc, watch};
use uuid::Uuid;

use crate::models::chat::{ChatRow, MessageRow};

#[derive(Debug, Clone, Default)]
pub struct ChatSession {
    pub chats: Vec<ChatRow>,
    pub current_chat_id: Option<Uuid>,
    pub messages: Vec<MessageRow>,
    pub is_loading: bool,
    pub loading_status: Option<String>,
    pub editing_message_id: Option<Uuid>,
}

#[derive(Debug, Clone)]
pub enum ChatAction {
    SetChats(Vec<ChatRow>),
    SetCurrentChat(Option<Uuid>),
    SetMessages(Vec<MessageRow>),
    AddMessage(MessageRow),
    UpdateMessageContent { id: Uuid, content: String },
    /// Drops the message with the given id and everything after it — the
    /// regenerate/edit path.
    RemoveMessagesFrom(Uuid),
    SetLoading(bool),
    SetLoadingStatus(Option<String>),
    SetEditingMessage(Option<Uuid>),
}

impl ChatSession {
    pub fn apply(&mut self, action: ChatAction) {
        match action {
            ChatAction::SetChats(chats) => self.chats = chats,
            ChatAction::SetCurrentChat(id) => self.current_chat_id = id,
            ChatAction::SetMessages(messages) => self.messages = messages,
            ChatAction::AddMessage(message) => self.messages.push(message),
            ChatAction::UpdateMessageContent { id, content } => {
                if let Some(message) = self.messages.iter_mut().find(|m| m.id == id) {
                    message.content = content;
                }
            }
            ChatAction::RemoveMessagesFrom(id) => {
                if let Some(index) = self.messages.iter().position(|m| m.id == id) {
                    self.messages.truncate(index);
                }
            }
            ChatAction::SetLoading(loading) => self.is_loading = loading,
            ChatAction::SetLoadingStatus(status) => self.loading_status = status,
            ChatAction::SetEditingMessage(id) => self.editing_message_id = id,
        }
    }
}

/// Owner of a `ChatSession` behind an action channel. Cloneable; all clones
/// feed the same reducer task, and snapshots are observed via a watch
/// channel.
#[derive(Clone)]
pub struct SessionHandle {
    tx: mpsc::UnboundedSender<ChatAction>,
    snapshot: watch::Receiver<ChatSession>,
}

impl SessionHandle {
    pub fn spawn() -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<ChatAction>();
        let (snapshot_tx, snapshot_rx) = watch::channel(ChatSession::default());

        tokio::spawn(async move {
            let mut session = ChatSession::default();
            while let Some(action) = rx.recv().await {
                session.apply(action);
                if snapshot_tx.send(session.clone()).is_err() {
                    break; // all observers dropped
                }
            }
        });

        Self {
            tx,
            snapshot: snapshot_rx,
        }
    }

    /// Queues an action for the reducer. Returns false once the reducer has
    /// shut down.
    pub fn dispatch(&self, action: ChatAction) -> bool {
        self.tx.send(action).is_ok()
    }

    pub fn snapshot(&self) -> ChatSession {
        self.snapshot.borrow().clone()
    }

    /// Waits until the reducer has published a state satisfying `predicate`.
    pub async fn wait_for(&mut self, predicate: impl Fn(&ChatSession) -> bool) -> ChatSession {
        loop {
            {
                let current = self.snapshot.borrow();
                if predicate(&current) {
                    return current.clone();
                }
            }
            if self.snapshot.changed().await.is_err() {
                return self.snapshot.borrow().clone();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn message(content: &str) -> MessageRow {
        MessageRow {
            id: Uuid::new_v4(),
            chat_id: Uuid::new_v4(),
            role: "user".to_string(),
            content: content.to_string(),
            attachments: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn add_and_update_message() {
        let mut session = ChatSession::default();
        let m = message("draft");
        let id = m.id;
        session.apply(ChatAction::AddMessage(m));
        session.apply(ChatAction::UpdateMessageContent {
            id,
            content: "final".to_string(),
        });
        assert_eq!(session.messages.len(), 1);
        assert_eq!(session.messages[0].content, "final");
    }

    #[test]
    fn remove_messages_from_truncates_at_the_target() {
        let mut session = ChatSession::default();
        let messages: Vec<MessageRow> = (0..4).map(|i| message(&format!("m{i}"))).collect();
        let third = messages[2].id;
        session.apply(ChatAction::SetMessages(messages));
        session.apply(ChatAction::RemoveMessagesFrom(third));
        assert_eq!(session.messages.len(), 2);
        assert_eq!(session.messages[1].content, "m1");
    }

    #[test]
    fn remove_messages_from_unknown_id_is_a_noop() {
        let mut session = ChatSession::default();
        session.apply(ChatAction::SetMessages(vec![message("keep")]));
        session.apply(ChatAction::RemoveMessagesFrom(Uuid::new_v4()));
        assert_eq!(session.messages.len(), 1);
    }

    #[test]
    fn overlapping_regenerates_apply_whole_never_interleaved() {
        // Two regenerate flows race: each truncates at its target and appends
        // its own replacement. Serialized through one reducer, the second
        // flow's truncate sees the first flow's append — the message list is
        // whatever the last-applied flow produced, with no duplicated or
        // half-applied turn.
        let mut session = ChatSession::default();
        let history: Vec<MessageRow> = (0..3).map(|i| message(&format!("m{i}"))).collect();
        let first_target = history[1].id;
        session.apply(ChatAction::SetMessages(history));

        // Flow A regenerates from m1
        session.apply(ChatAction::RemoveMessagesFrom(first_target));
        let a_reply = message("a-reply");
        let a_reply_id = a_reply.id;
        session.apply(ChatAction::AddMessage(a_reply));

        // Flow B regenerates from A's reply
        session.apply(ChatAction::RemoveMessagesFrom(a_reply_id));
        session.apply(ChatAction::AddMessage(message("b-reply")));

        let contents: Vec<&str> = session.messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["m0", "b-reply"]);
    }

    #[tokio::test]
    async fn handle_serializes_actions_from_multiple_dispatchers() {
        let handle = SessionHandle::spawn();
        let base = message("base");
        let base_id = base.id;
        handle.dispatch(ChatAction::SetMessages(vec![base]));

        let writer_a = handle.clone();
        let writer_b = handle.clone();
        let reply = message("regen");
        let reply_id = reply.id;
        writer_a.dispatch(ChatAction::AddMessage(reply));
        writer_b.dispatch(ChatAction::RemoveMessagesFrom(reply_id));
        writer_b.dispatch(ChatAction::AddMessage(message("fresh")));

        let mut observer = handle.clone();
        let settled = observer
            .wait_for(|s| s.messages.len() == 2 && s.messages[1].content == "fresh")
            .await;

        assert_eq!(settled.messages[0].id, base_id);
        assert_eq!(settled.messages[1].content, "fresh");
    }

    #[test]
    fn loading_flags_are_independent_of_messages() {
        let mut session = ChatSession::default();
        session.apply(ChatAction::SetLoading(true));
        session.apply(ChatAction::SetLoadingStatus(Some("Thinking...".to_string())));
        assert!(session.is_loading);
        assert_eq!(session.loading_status.as_deref(), Some("Thinking..."));
        assert!(session.messages.is_empty());
    }
}

// Conversation state for one terminal view: the transcript, the unsent draft
// and the bookkeeping for replies that have not arrived yet.

use anyhow::Result;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use tracing::{debug, warn};

use crate::persona::{self, Profile};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Body posted to the relay endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<Message>,
}

/// Body returned by the relay endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatReply {
    pub message: String,
}

/// Proof that a submission is still unsettled. Consumed by
/// [`ChatSession::settle`], so each submission settles once.
#[derive(Debug, PartialEq, Eq)]
pub struct Ticket(u64);

impl Ticket {
    pub fn id(&self) -> u64 {
        self.0
    }
}

/// One accepted submission, ready to be sent.
#[derive(Debug)]
pub struct OutboundRequest {
    ticket: Ticket,
    body: ChatRequest,
}

impl OutboundRequest {
    pub fn ticket(&self) -> &Ticket {
        &self.ticket
    }

    pub fn body(&self) -> &ChatRequest {
        &self.body
    }

    pub fn into_parts(self) -> (Ticket, ChatRequest) {
        (self.ticket, self.body)
    }
}

#[derive(Debug)]
pub struct ChatSession {
    preamble: String,
    fallback: String,
    transcript: Vec<Message>,
    input: String,
    in_flight: usize,
    next_ticket: u64,
}

impl ChatSession {
    /// Starts a session whose transcript holds only `welcome`.
    pub fn new(
        preamble: impl Into<String>,
        welcome: impl Into<String>,
        fallback: impl Into<String>,
    ) -> Self {
        Self {
            preamble: preamble.into(),
            fallback: fallback.into(),
            transcript: vec![Message::assistant(welcome)],
            input: String::new(),
            in_flight: 0,
            next_ticket: 0,
        }
    }

    /// Builds the preamble, welcome and fallback for `profile`. `today` is
    /// fixed for the lifetime of the session.
    pub fn from_profile(profile: &Profile, today: NaiveDate) -> Result<Self> {
        Ok(Self::new(
            persona::build_persona_preamble(profile, today)?,
            persona::welcome_message(profile)?,
            persona::fallback_message(profile),
        ))
    }

    pub fn transcript(&self) -> &[Message] {
        &self.transcript
    }

    pub fn preamble(&self) -> &str {
        &self.preamble
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    pub fn push_input(&mut self, c: char) {
        self.input.push(c);
    }

    pub fn pop_input(&mut self) {
        self.input.pop();
    }

    pub fn is_awaiting_reply(&self) -> bool {
        self.in_flight > 0
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Submits the pending draft.
    pub fn submit(&mut self) -> Option<OutboundRequest> {
        let draft = std::mem::take(&mut self.input);
        let request = self.submit_text(&draft);
        if request.is_none() {
            // Blank drafts stay as typed.
            self.input = draft;
        }
        request
    }

    /// Appends `text` as a user message and returns the request to send.
    /// Blank text is ignored and leaves the session untouched.
    pub fn submit_text(&mut self, text: &str) -> Option<OutboundRequest> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }

        self.transcript.push(Message::user(text));
        self.input.clear();
        self.in_flight += 1;

        let ticket = Ticket(self.next_ticket);
        self.next_ticket += 1;
        debug!(ticket = ticket.0, in_flight = self.in_flight, "Submission accepted");

        Some(OutboundRequest {
            ticket,
            body: ChatRequest {
                messages: self.outbound_messages(),
            },
        })
    }

    /// The message list sent to the relay: preamble first, then the transcript.
    pub fn outbound_messages(&self) -> Vec<Message> {
        std::iter::once(Message::system(self.preamble.clone()))
            .chain(self.transcript.iter().cloned())
            .collect()
    }

    /// Records the outcome of a submission. Failures become the fallback reply.
    pub fn settle<E: Display>(&mut self, ticket: Ticket, reply: Result<String, E>) {
        let content = match reply {
            Ok(text) => text,
            Err(e) => {
                warn!(ticket = ticket.0, error = %e, "Reply failed, using fallback");
                self.fallback.clone()
            }
        };
        self.transcript.push(Message::assistant(content));
        self.in_flight = self.in_flight.saturating_sub(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> ChatSession {
        ChatSession::new("be me", "Welcome!", "Please email me at me@example.com")
    }

    #[test]
    fn test_starts_with_single_welcome() {
        let session = session();
        assert_eq!(session.transcript(), &[Message::assistant("Welcome!")]);
        assert_eq!(session.input(), "");
        assert!(!session.is_awaiting_reply());
    }

    #[test]
    fn test_from_profile_seeds_welcome() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();
        let session = ChatSession::from_profile(&Profile::default(), today).unwrap();
        assert_eq!(session.transcript().len(), 1);
        assert_eq!(session.transcript()[0].role, Role::Assistant);
        assert!(session.transcript()[0].content.starts_with("Welcome to My Portfolio"));
        assert!(session.preamble().contains("October 18, 2026"));
    }

    #[test]
    fn test_blank_submissions_are_ignored() {
        let mut session = session();
        assert!(session.submit_text("").is_none());
        assert!(session.submit_text("   ").is_none());

        session.set_input("  \t ");
        assert!(session.submit().is_none());
        assert_eq!(session.input(), "  \t ");
        assert_eq!(session.transcript().len(), 1);
        assert!(!session.is_awaiting_reply());
    }

    #[test]
    fn test_submit_appends_trimmed_user_message() {
        let mut session = session();
        session.set_input("  Hello ");
        let request = session.submit().unwrap();

        assert_eq!(session.transcript().len(), 2);
        assert_eq!(session.transcript()[1], Message::user("Hello"));
        assert_eq!(session.input(), "");
        assert!(session.is_awaiting_reply());

        let messages = &request.body().messages;
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0], Message::system("be me"));
        assert_eq!(&messages[1..], session.transcript());
    }

    #[test]
    fn test_submit_text_clears_pending_draft() {
        let mut session = session();
        session.set_input("half typed");
        assert!(session.submit_text("Hello").is_some());
        assert_eq!(session.input(), "");
    }

    #[test]
    fn test_settle_success_and_failure() {
        let mut session = session();

        let (ticket, _) = session.submit_text("Hello").unwrap().into_parts();
        session.settle::<String>(ticket, Ok("Hi there".to_string()));
        assert_eq!(session.transcript().len(), 3);
        assert_eq!(session.transcript()[2], Message::assistant("Hi there"));
        assert!(!session.is_awaiting_reply());

        let (ticket, _) = session.submit_text("Again").unwrap().into_parts();
        session.settle(ticket, Err("connection refused"));
        assert_eq!(session.transcript().len(), 5);
        assert_eq!(
            session.transcript()[4],
            Message::assistant("Please email me at me@example.com")
        );
        assert!(!session.is_awaiting_reply());
    }

    #[test]
    fn test_system_message_never_in_transcript() {
        let mut session = session();
        let (ticket, _) = session.submit_text("Hello").unwrap().into_parts();
        session.settle::<String>(ticket, Ok("Hi".to_string()));
        assert!(session.transcript().iter().all(|m| m.role != Role::System));
    }

    #[test]
    fn test_overlapping_submissions_settle_in_arrival_order() {
        let mut session = session();
        let (first, _) = session.submit_text("one").unwrap().into_parts();
        let (second, body) = session.submit_text("two").unwrap().into_parts();

        // The second request carries the first, still unanswered, question.
        assert_eq!(body.messages.len(), 4);
        assert_ne!(first.id(), second.id());
        assert_eq!(session.in_flight(), 2);

        session.settle::<String>(second, Ok("reply two".to_string()));
        assert!(session.is_awaiting_reply());
        session.settle::<String>(first, Ok("reply one".to_string()));
        assert!(!session.is_awaiting_reply());

        let contents: Vec<&str> = session.transcript().iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["Welcome!", "one", "two", "reply two", "reply one"]);
    }

    #[test]
    fn test_wire_format() {
        let request = ChatRequest {
            messages: vec![Message::system("p"), Message::user("q")],
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"messages": [
                {"role": "system", "content": "p"},
                {"role": "user", "content": "q"}
            ]})
        );

        let reply: ChatReply = serde_json::from_str(r#"{"message": "hi"}"#).unwrap();
        assert_eq!(reply.message, "hi");
        assert!(serde_json::from_str::<ChatReply>(r#"{"text": "hi"}"#).is_err());
    }
}

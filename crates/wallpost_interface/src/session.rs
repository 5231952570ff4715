//! Bot session iteration primitives.
//!
//! The credential lifecycle manager and the resource-key cache both scan the
//! currently connected chat-bot sessions with an early-exit callback, without
//! knowing anything about the underlying transport.

/// A live chat-bot session.
pub trait BotSession: Send + Sync {
    /// Current browser-style session credential for a domain, empty when the
    /// session cannot report one.
    fn current_credential(&self, domain: &str) -> String;

    /// Raw upstream resource-key report payload, empty when unsupported.
    fn raw_resource_key_report(&self) -> String;

    /// Send a text message to a channel.
    fn send_message(&self, channel: i64, text: &str);
}

/// Iterable set of live bot sessions.
pub trait SessionProvider: Send + Sync {
    /// Visit each connected session; the callback returns `false` to stop.
    fn for_each_session(&self, f: &mut dyn FnMut(&dyn BotSession) -> bool);
}

/// Session provider with no sessions, for deployments where the chat-bot
/// transport is absent.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptySessionProvider;

impl SessionProvider for EmptySessionProvider {
    fn for_each_session(&self, _f: &mut dyn FnMut(&dyn BotSession) -> bool) {}
}
